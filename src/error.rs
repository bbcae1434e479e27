use thiserror::Error;
use tokio::task::JoinError;

use crate::remote::BusyReason;

pub type SomfyResult<T> = Result<T, SomfyError>;

#[derive(Debug, Error)]
pub enum SomfyError {
  #[error("invalid channel index {0} (must be 0-4)")]
  InvalidChannel(u8),
  #[error("{0} is not configured")]
  NotConfigured(&'static str),
  #[error("device busy ({0})")]
  Busy(BusyReason),
  #[error("anchor channel not reached after {0} presses")]
  SelectionExhausted(u8),
  #[error("unrecognised command {0:?}")]
  InvalidCommand(String),
  #[error(transparent)]
  #[cfg(feature = "arm")]
  Gpio(#[from] rppal::gpio::Error),
  #[cfg(not(feature = "arm"))]
  #[error(transparent)]
  Gpio(#[from] crate::mock_gpio::Error),
  #[error(transparent)]
  MqttClient(#[from] rumqttc::ClientError),
  #[error(transparent)]
  MqttConnection(#[from] rumqttc::ConnectionError),
  #[error("the MQTT client has been closed")]
  MqttClosed,
  #[error(transparent)]
  JoinError(#[from] JoinError),
  #[error(transparent)]
  Io(#[from] std::io::Error),
  #[error(transparent)]
  Config(#[from] toml::de::Error),
}
