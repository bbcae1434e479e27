//! Simulated lines, lights and clock shared by the unit tests.

use std::{
  cell::{Cell, RefCell},
  rc::Rc,
};

use super::line::{Clock, DigitalLine, LineMode, Millis, StabilitySensor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEvent {
  Write(bool),
  Mode(LineMode),
}

#[derive(Debug)]
pub struct LineState {
  pub mode: LineMode,
  pub level: bool,
  pub events: Vec<LineEvent>,
}

/// A line that records everything done to it
#[derive(Debug, Clone)]
pub struct SimLine(pub Rc<RefCell<LineState>>);

impl SimLine {
  pub fn new() -> SimLine {
    SimLine(Rc::new(RefCell::new(LineState {
      mode: LineMode::Input,
      level: true,
      events: Vec::new(),
    })))
  }

  pub fn mode(&self) -> LineMode {
    self.0.borrow().mode
  }

  pub fn events(&self) -> Vec<LineEvent> {
    self.0.borrow().events.clone()
  }

  /// Number of times the line was switched to output, i.e. pressed
  pub fn presses(&self) -> usize {
    self
      .0
      .borrow()
      .events
      .iter()
      .filter(|event| **event == LineEvent::Mode(LineMode::Output))
      .count()
  }

  pub fn set_level(&self, level: bool) {
    self.0.borrow_mut().level = level;
  }
}

impl DigitalLine for SimLine {
  fn set_mode(&mut self, mode: LineMode) {
    let mut state = self.0.borrow_mut();
    state.mode = mode;
    state.events.push(LineEvent::Mode(mode));
  }

  fn write(&mut self, high: bool) {
    self.0.borrow_mut().events.push(LineEvent::Write(high));
  }

  fn read(&self) -> bool {
    self.0.borrow().level
  }
}

/// An already-filtered light the test switches directly
#[derive(Debug, Clone, Default)]
pub struct SimLight(pub Rc<Cell<bool>>);

impl SimLight {
  pub fn set(&self, on: bool) {
    self.0.set(on);
  }
}

impl StabilitySensor for SimLight {
  fn filtered_state(&self) -> bool {
    self.0.get()
  }
}

#[derive(Debug, Clone, Default)]
pub struct ManualClock(pub Rc<Cell<Millis>>);

impl ManualClock {
  pub fn set(&self, now: Millis) {
    self.0.set(now);
  }

  pub fn advance(&self, by: Millis) {
    self.0.set(self.0.get() + by);
  }
}

impl Clock for ManualClock {
  fn now(&self) -> Millis {
    self.0.get()
  }
}
