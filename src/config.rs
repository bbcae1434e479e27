use std::{env, fs, path::Path};

use serde::Deserialize;

use crate::{error::SomfyResult, mqtt_client::MqttClientConfig, remote::RemoteConfig};

pub mod gpio;

pub const DEFAULT_CONFIG_FILE: &str = "somfy-config.toml";

#[derive(Debug, Deserialize)]
pub struct Config {
  /// The MQTT configuration
  pub mqtt_client: MqttClientConfig,
  /// The remote's wiring and topics
  pub remote: RemoteConfig,
}

impl Config {
  pub fn load(path: impl AsRef<Path>) -> SomfyResult<Config> {
    let config = fs::read_to_string(path)?;
    Ok(toml::from_str(&config)?)
  }

  /// Where the config lives, `SOMFY_CONFIG` if set
  pub fn path() -> String {
    env::var("SOMFY_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string())
  }
}
