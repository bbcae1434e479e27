pub mod config;
pub mod error;
#[cfg(not(feature = "arm"))]
mod mock_gpio;
pub mod mqtt_client;
pub mod remote;
