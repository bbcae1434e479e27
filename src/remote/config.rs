use std::time::Duration;

use serde::Deserialize;
use serde_with::{serde_as, DurationMilliSeconds};

use super::DEFAULT_PRESS_DURATION;
use crate::config::gpio::GpioPin;

fn default_press_duration() -> Duration {
  DEFAULT_PRESS_DURATION
}

fn default_delayed_on() -> Duration {
  Duration::from_millis(100)
}

#[serde_as]
#[derive(Debug, Deserialize)]
pub struct RemoteConfig {
  /// The name of the MQTT topic commands are received on
  pub command_topic: String,

  /// The MQTT topic `ON`/`OFF` readiness is published to, if desired
  pub ready_topic: Option<String>,

  /// The MQTT topic the believed channel is published to, if desired
  pub channel_topic: Option<String>,

  pub buttons: ButtonPins,

  /// The indicator lights, needed to select channels
  pub lights: Option<LightPins>,

  #[serde_as(as = "DurationMilliSeconds<u64>")]
  #[serde(default = "default_press_duration")]
  /// How long each button is held down for
  pub button_press_duration: Duration,

  /// If set, the channel the remote is assumed to be on at startup
  pub initial_channel: Option<u8>,
}

#[derive(Debug, Deserialize)]
pub struct ButtonPins {
  pub select: GpioPin,
  pub up: GpioPin,
  pub down: GpioPin,
  pub my: GpioPin,
}

#[serde_as]
#[derive(Debug, Deserialize)]
pub struct LightPins {
  /// Lit only on the anchor channel
  pub a: GpioPin,
  /// Lit only on the channel after the anchor
  pub b: GpioPin,

  #[serde_as(as = "DurationMilliSeconds<u64>")]
  #[serde(default = "default_delayed_on")]
  /// How long a light must stay on before it counts as on
  pub delayed_on: Duration,

  #[serde_as(as = "DurationMilliSeconds<u64>")]
  #[serde(default)]
  /// How long a light must stay off before it counts as off
  pub delayed_off: Duration,
}
