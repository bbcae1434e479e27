use std::collections::HashMap;

use rumqttc::{AsyncClient, Event, EventLoop, Packet, QoS};
use tokio::sync::mpsc;

use super::MqttPublish;
use crate::error::{SomfyError, SomfyResult};

pub type PublishReceiver = mpsc::UnboundedReceiver<MqttPublish>;

/// Drives the MQTT connection, handing incoming messages to whoever subscribed to their topic
pub struct MqttReceiver {
  client: AsyncClient,
  event_loop: EventLoop,
  subscribers: HashMap<String, mpsc::UnboundedSender<MqttPublish>>,
}

impl MqttReceiver {
  pub fn new(client: AsyncClient, event_loop: EventLoop) -> Self {
    MqttReceiver {
      client,
      event_loop,
      subscribers: HashMap::new(),
    }
  }

  pub async fn subscribe(&mut self, topic: String, qos: QoS) -> SomfyResult<PublishReceiver> {
    log::debug!("Subscribing to {topic}");
    self.client.subscribe(topic.clone(), qos).await?;
    let (tx, rx) = mpsc::unbounded_channel();
    self.subscribers.insert(topic, tx);
    Ok(rx)
  }

  /// Runs until the connection fails
  pub async fn receive_messages(&mut self) -> SomfyResult<()> {
    loop {
      if let Event::Incoming(Packet::Publish(publish)) = self.event_loop.poll().await? {
        let Some(subscriber) = self.subscribers.get(&publish.topic)
        else {
          continue;
        };

        let message = MqttPublish {
          payload: String::from_utf8_lossy(&publish.payload).into_owned(),
          topic: publish.topic,
          qos: publish.qos,
          retain: publish.retain,
        };
        if subscriber.send(message).is_err() {
          return Err(SomfyError::MqttClosed);
        }
      }
    }
  }
}
