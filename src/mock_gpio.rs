//! Mimics rppal's API without the need to compile to ARM and use physical hardware
//!
//! Input levels are read from `<bcm number>.pin` files in the working directory, containing `1` or `0`.

pub use std::fmt::Error;
use std::fs;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
  Low,
  High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
  Input,
  Output,
}

pub struct Gpio;

impl Gpio {
  pub fn new() -> Result<Gpio, Error> {
    Ok(Gpio)
  }

  pub fn get(&self, pin: u8) -> Result<Pin, Error> {
    Ok(Pin(pin))
  }
}

#[derive(Debug)]
pub struct Pin(u8);

impl Pin {
  pub fn into_io(self, mode: Mode) -> IoPin {
    IoPin {
      pin: self.0,
      mode,
      level: Level::Low,
    }
  }
}

#[derive(Debug)]
pub struct IoPin {
  pin: u8,
  mode: Mode,
  level: Level,
}

impl IoPin {
  pub fn set_mode(&mut self, mode: Mode) {
    self.mode = mode;
    match mode {
      Mode::Output => log::debug!("GPIO{} driving {:?}", self.pin, self.level),
      Mode::Input => log::debug!("GPIO{} floating", self.pin),
    }
  }

  pub fn write(&mut self, level: Level) {
    self.level = level;
  }

  pub fn read(&self) -> Level {
    if self.mode == Mode::Output {
      return self.level;
    }

    fs::read_to_string(format!("{}.pin", self.pin))
      .ok()
      .map(|value| if value.trim() == "1" { Level::High } else { Level::Low })
      // unconnected lines float high
      .unwrap_or(Level::High)
  }
}
