use rumqttc::{AsyncClient, QoS};
use tokio::sync::mpsc;

use super::MqttPublish;
use crate::error::SomfyResult;

pub type PublishSender = mpsc::UnboundedSender<MqttPublish>;

pub struct MqttSender {
  client: AsyncClient,
  /// The channel with which messages to send to MQTT are received on
  send_channel: mpsc::UnboundedReceiver<MqttPublish>,
  availability_topic: String,
  online_availability: String,
}

impl MqttSender {
  pub fn new(
    client: AsyncClient,
    send_channel: mpsc::UnboundedReceiver<MqttPublish>,
    availability_topic: String,
    online_availability: String,
  ) -> Self {
    MqttSender {
      client,
      send_channel,
      availability_topic,
      online_availability,
    }
  }

  pub async fn publish(&self, publish: MqttPublish) -> SomfyResult<()> {
    self
      .client
      .publish(publish.topic, publish.qos, publish.retain, publish.payload)
      .await?;
    Ok(())
  }

  /// Announce our availability
  pub async fn announce(&self) -> SomfyResult<()> {
    self
      .publish(MqttPublish {
        topic: self.availability_topic.clone(),
        qos: QoS::AtLeastOnce,
        retain: true,
        payload: self.online_availability.clone(),
      })
      .await
  }

  /// Publishes queued messages until every sender has gone
  pub async fn send_messages(&mut self) -> SomfyResult<()> {
    while let Some(publish) = self.send_channel.recv().await {
      self.publish(publish).await?;
    }
    Ok(())
  }
}
