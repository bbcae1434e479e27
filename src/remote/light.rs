use super::{
  channel::LightPattern,
  line::{DigitalLine, Millis, StabilitySensor},
};

/// Reads an indicator light line, which is pulled low while the light is on
pub fn light_is_on<L: DigitalLine>(line: &L) -> bool {
  !line.read()
}

/// The two indicator lights, read together
#[derive(Debug)]
pub struct LightSensors<S> {
  pub a: S,
  pub b: S,
}

impl<S: StabilitySensor> LightSensors<S> {
  pub fn new(a: S, b: S) -> Self {
    LightSensors { a, b }
  }

  pub fn sample(&mut self, now: Millis) {
    self.a.sample(now);
    self.b.sample(now);
  }

  pub fn pattern(&self) -> LightPattern {
    LightPattern::from_lights(self.a.filtered_state(), self.b.filtered_state())
  }
}

/// Filters a raw light line so brief flickers are ignored.
///
/// A change of the raw reading only comes through once it has held for `delayed_on` (turning on) or `delayed_off`
/// (turning off).
#[derive(Debug)]
pub struct DebouncedLight<L> {
  line: L,
  delayed_on: Millis,
  delayed_off: Millis,
  raw: bool,
  raw_since: Millis,
  state: bool,
}

impl<L: DigitalLine> DebouncedLight<L> {
  pub fn new(line: L, delayed_on: Millis, delayed_off: Millis) -> Self {
    DebouncedLight {
      line,
      delayed_on,
      delayed_off,
      raw: false,
      raw_since: 0,
      state: false,
    }
  }
}

impl<L: DigitalLine> StabilitySensor for DebouncedLight<L> {
  fn sample(&mut self, now: Millis) {
    let raw = light_is_on(&self.line);
    if raw != self.raw {
      self.raw = raw;
      self.raw_since = now;
    }

    let delay = if raw { self.delayed_on } else { self.delayed_off };
    if raw != self.state && now.saturating_sub(self.raw_since) >= delay {
      self.state = raw;
    }
  }

  fn filtered_state(&self) -> bool {
    self.state
  }

  fn raw_reading(&self) -> Option<bool> {
    Some(light_is_on(&self.line))
  }
}
