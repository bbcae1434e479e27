use rumqttc::{AsyncClient, LastWill, MqttOptions, QoS};
use serde::Deserialize;
use tokio::sync::mpsc;

use self::{
  receiver::MqttReceiver,
  sender::{MqttSender, PublishSender},
};

pub mod receiver;
pub mod sender;

/// Capacity of rumqttc's request queue
const REQUEST_CAPACITY: usize = 16;

#[derive(Debug, Deserialize)]
pub struct MqttClientConfig {
  pub broker_domain: String,
  pub broker_port: u16,
  pub client_id: String,
  pub username: Option<String>,
  pub password: Option<String>,
  /// Topic our online/offline state is published to
  pub availability_topic: String,
  pub online_availability: String,
  pub offline_availability: String,
}

/// A message to be published, or one that was received
#[derive(Debug, Clone)]
pub struct MqttPublish {
  pub topic: String,
  pub qos: QoS,
  pub retain: bool,
  pub payload: String,
}

pub struct MqttClient {
  pub receiver: MqttReceiver,
  pub sender: MqttSender,
}

impl MqttClient {
  /// Create the client, along with a channel anything can use to publish messages
  pub fn with_config(config: &MqttClientConfig) -> (PublishSender, MqttClient) {
    let mut options = MqttOptions::new(&config.client_id, &config.broker_domain, config.broker_port);
    options.set_last_will(LastWill::new(
      &config.availability_topic,
      config.offline_availability.as_bytes(),
      QoS::AtLeastOnce,
      true,
    ));
    if let (Some(username), Some(password)) = (&config.username, &config.password) {
      options.set_credentials(username, password);
    }

    let (client, event_loop) = AsyncClient::new(options, REQUEST_CAPACITY);
    let (send_channel, receive_channel) = mpsc::unbounded_channel();

    log::info!(
      "Connecting to MQTT broker {}:{} as {}",
      config.broker_domain,
      config.broker_port,
      config.client_id
    );
    let client = MqttClient {
      receiver: MqttReceiver::new(client.clone(), event_loop),
      sender: MqttSender::new(
        client,
        receive_channel,
        config.availability_topic.clone(),
        config.online_availability.clone(),
      ),
    };
    (send_channel, client)
  }
}
