#![warn(rust_2018_idioms)]

use std::time::Duration;

use mqtt_somfy::{
  config::Config,
  error::{SomfyError, SomfyResult},
  mqtt_client::MqttClient,
  remote::{
    hardware,
    mqtt::{ChannelReporter, ChannelState, ReadinessPublisher},
    Command, ReadinessObserver,
  },
};
use rumqttc::QoS;
use simple_logger::SimpleLogger;
use tokio::time::{self, sleep, MissedTickBehavior};

/// How often the remote is ticked
const TICK_INTERVAL: Duration = Duration::from_millis(10);

#[tokio::main]
async fn main() {
  SimpleLogger::new()
    .with_level(log::LevelFilter::Info)
    .with_module_level("rumqttc", log::LevelFilter::Warn)
    .env()
    .init()
    .unwrap();

  loop {
    if let Err(err) = run().await {
      log::error!("Error occurred, restarting in 5 seconds: {:?}", err);
    }
    // wait some time for the broker to come back online
    sleep(Duration::from_secs(5)).await;
  }
}

/// Run the MQTT receiver and sender and drive the remote
/// Runs forever unless an error occurs
async fn run() -> SomfyResult<()> {
  let path = Config::path();
  log::info!("Loading {path}");
  let config = Config::load(&path)?;

  let (send_channel, client) = MqttClient::with_config(&config.mqtt_client);
  let MqttClient {
    mut receiver,
    mut sender,
  } = client;
  let mut commands = receiver
    .subscribe(config.remote.command_topic.clone(), QoS::AtLeastOnce)
    .await?;

  let observer = config
    .remote
    .ready_topic
    .clone()
    .map(|topic| Box::new(ReadinessPublisher::new(topic, send_channel.clone())) as Box<dyn ReadinessObserver>);
  let mut remote = hardware::build(&config.remote, observer)?;
  let mut reporter = ChannelReporter::new(config.remote.channel_topic.clone(), send_channel);

  sender.announce().await?;
  let mut receive = tokio::spawn(async move { receiver.receive_messages().await });
  let mut send = tokio::spawn(async move { sender.send_messages().await });

  let mut ticker = time::interval(TICK_INTERVAL);
  ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

  // the MQTT tasks will only end if an error occurs (most likely MQTT broker disconnection)
  let finished = loop {
    tokio::select! {
      _ = ticker.tick() => {
        remote.tick();
        reporter.report(ChannelState::new(remote.current_channel_belief(), remote.is_ready()));
      }
      message = commands.recv() => {
        let Some(message) = message
        else {
          break Ok(Err(SomfyError::MqttClosed));
        };
        log::info!("Received command {:?}", message.payload);
        let result = message.payload.parse::<Command>().and_then(|command| remote.execute(command));
        if let Err(err) = result {
          log::warn!("Command {:?} failed: {err}", message.payload);
        }
      }
      result = &mut receive => break result,
      result = &mut send => break result,
    }
  };

  // neither task may outlive this connection
  receive.abort();
  send.abort();
  finished?
}
