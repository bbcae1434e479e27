//! Wiring the configured GPIO pins to a [`Remote`].

#[cfg(feature = "arm")]
use rppal::gpio::{Gpio, IoPin, Level, Mode};

use super::{
  config::RemoteConfig,
  light::DebouncedLight,
  line::{DigitalLine, LineMode, Millis, ReadinessObserver, SystemClock},
  Remote, RemoteWiring,
};
use crate::{config::gpio::GpioPin, error::SomfyResult};
#[cfg(not(feature = "arm"))]
use crate::mock_gpio::{Gpio, IoPin, Level, Mode};

pub type HardwareRemote = Remote<GpioLine, DebouncedLight<GpioLine>, SystemClock>;

/// A GPIO pin used as a bidirectional line
#[derive(Debug)]
pub struct GpioLine {
  pin: IoPin,
}

impl GpioLine {
  /// Claims `pin`, starting out floating
  pub fn new(gpio: &Gpio, pin: GpioPin) -> SomfyResult<Self> {
    let pin = gpio.get(pin.bcm_number())?.into_io(Mode::Input);
    Ok(GpioLine { pin })
  }
}

impl DigitalLine for GpioLine {
  fn set_mode(&mut self, mode: LineMode) {
    self.pin.set_mode(match mode {
      LineMode::Input => Mode::Input,
      LineMode::Output => Mode::Output,
    });
  }

  fn write(&mut self, high: bool) {
    self.pin.write(if high { Level::High } else { Level::Low });
  }

  fn read(&self) -> bool {
    self.pin.read() == Level::High
  }
}

/// Build a remote from its configuration
pub fn build(config: &RemoteConfig, observer: Option<Box<dyn ReadinessObserver>>) -> SomfyResult<HardwareRemote> {
  let gpio = Gpio::new()?;
  let line = |pin: GpioPin| -> SomfyResult<Option<GpioLine>> {
    log::info!("  Claiming {pin}");
    Ok(Some(GpioLine::new(&gpio, pin)?))
  };

  let mut wiring = RemoteWiring {
    select: line(config.buttons.select)?,
    up: line(config.buttons.up)?,
    down: line(config.buttons.down)?,
    my: line(config.buttons.my)?,
    press_duration: config.button_press_duration,
    observer,
    ..Default::default()
  };

  // each light pin can only be claimed once, so it goes to the debounced sensor, which also exposes the raw reading
  if let Some(lights) = &config.lights {
    let delayed_on = lights.delayed_on.as_millis() as Millis;
    let delayed_off = lights.delayed_off.as_millis() as Millis;
    wiring.sensor_a = line(lights.a)?.map(|line| DebouncedLight::new(line, delayed_on, delayed_off));
    wiring.sensor_b = line(lights.b)?.map(|line| DebouncedLight::new(line, delayed_on, delayed_off));
  }

  let mut remote = Remote::init(wiring, SystemClock::new())?;
  if let Some(channel) = config.initial_channel {
    remote.calibrate(channel)?;
  }
  Ok(remote)
}
