//! Reporting the remote's state over MQTT.

use rumqttc::QoS;
use serde::Serialize;

use super::{line::ReadinessObserver, Channel};
use crate::mqtt_client::{sender::PublishSender, MqttPublish};

/// Publishes readiness as a binary sensor, `ON` when ready
#[derive(Debug)]
pub struct ReadinessPublisher {
  topic: String,
  send_channel: PublishSender,
}

impl ReadinessPublisher {
  pub fn new(topic: String, send_channel: PublishSender) -> Self {
    ReadinessPublisher { topic, send_channel }
  }
}

impl ReadinessObserver for ReadinessPublisher {
  fn readiness_changed(&mut self, ready: bool) {
    let publish = MqttPublish {
      topic: self.topic.clone(),
      qos: QoS::AtLeastOnce,
      retain: true,
      payload: if ready { "ON" } else { "OFF" }.to_string(),
    };
    if self.send_channel.send(publish).is_err() {
      log::warn!("MQTT sender closed, readiness not published");
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChannelState {
  pub channel: u8,
  /// The channel as numbered on the remote itself
  pub remote_cover: u8,
  pub ready: bool,
}

impl ChannelState {
  pub fn new(channel: Channel, ready: bool) -> Self {
    ChannelState {
      channel: channel.index(),
      remote_cover: channel.index() + 1,
      ready,
    }
  }
}

/// Publishes the channel belief whenever it (or readiness) changes
#[derive(Debug)]
pub struct ChannelReporter {
  topic: Option<String>,
  send_channel: PublishSender,
  last: Option<ChannelState>,
}

impl ChannelReporter {
  pub fn new(topic: Option<String>, send_channel: PublishSender) -> Self {
    ChannelReporter {
      topic,
      send_channel,
      last: None,
    }
  }

  pub fn report(&mut self, state: ChannelState) {
    let Some(topic) = &self.topic
    else {
      return;
    };
    if self.last == Some(state) {
      return;
    }

    match serde_json::to_string(&state) {
      Ok(payload) => {
        let publish = MqttPublish {
          topic: topic.clone(),
          qos: QoS::AtLeastOnce,
          retain: true,
          payload,
        };
        if self.send_channel.send(publish).is_err() {
          log::warn!("MQTT sender closed, channel not published");
          return;
        }
        self.last = Some(state);
      }
      Err(err) => log::error!("Failed to serialise channel state: {err}"),
    }
  }
}
