//! The hardware-facing collaborators the remote is driven through.
//!
//! Implemented by the rppal/mock GPIO wrappers in `hardware` and by the simulated lines in the tests.

use std::time::Instant;

/// Milliseconds on a monotonic clock
pub type Millis = u64;

/// Direction of a bidirectional line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineMode {
  /// High impedance, the line floats and can be read
  Input,
  /// The line drives its latched level
  Output,
}

/// A GPIO-like line that can be switched between input and output.
pub trait DigitalLine {
  fn set_mode(&mut self, mode: LineMode);

  /// Latch a level. Only driven onto the line while in output mode.
  fn write(&mut self, high: bool);

  /// Read the level. Only meaningful while in input mode.
  fn read(&self) -> bool;
}

/// A debounced observer of an indicator light
pub trait StabilitySensor {
  /// Feed the sensor. Called once at the start of every tick.
  fn sample(&mut self, _now: Millis) {}

  /// `true` if the light is considered on
  fn filtered_state(&self) -> bool;

  /// The unfiltered reading, if the sensor can see it
  fn raw_reading(&self) -> Option<bool> {
    None
  }
}

pub trait Clock {
  fn now(&self) -> Millis;
}

/// Told whenever the remote goes from busy to ready or back
pub trait ReadinessObserver {
  fn readiness_changed(&mut self, ready: bool);
}

impl<F: FnMut(bool)> ReadinessObserver for F {
  fn readiness_changed(&mut self, ready: bool) {
    self(ready)
  }
}

/// Wall clock measured from when it was created
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
  start: Instant,
}

impl SystemClock {
  pub fn new() -> Self {
    SystemClock { start: Instant::now() }
  }
}

impl Default for SystemClock {
  fn default() -> Self {
    SystemClock::new()
  }
}

impl Clock for SystemClock {
  fn now(&self) -> Millis {
    self.start.elapsed().as_millis() as Millis
  }
}
