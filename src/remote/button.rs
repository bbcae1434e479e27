use std::{fmt, str::FromStr};

/// The four buttons wired up on the remote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
  /// Cycles the remote to its next channel
  Select,
  Up,
  Down,
  My,
}

impl Button {
  pub const ALL: [Button; 4] = [Button::Select, Button::Up, Button::Down, Button::My];

  pub(crate) fn index(self) -> usize {
    match self {
      Button::Select => 0,
      Button::Up => 1,
      Button::Down => 2,
      Button::My => 3,
    }
  }

  pub fn name(self) -> &'static str {
    match self {
      Button::Select => "select cover",
      Button::Up => "up",
      Button::Down => "down",
      Button::My => "my",
    }
  }
}

impl fmt::Display for Button {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

impl FromStr for Button {
  type Err = ();

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "select" => Ok(Button::Select),
      "up" => Ok(Button::Up),
      "down" => Ok(Button::Down),
      "my" => Ok(Button::My),
      _ => Err(()),
    }
  }
}

/// What to do to a cover once its channel is selected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverAction {
  Open,
  Close,
  Stop,
}

impl CoverAction {
  pub fn button(self) -> Button {
    match self {
      CoverAction::Open => Button::Up,
      CoverAction::Close => Button::Down,
      CoverAction::Stop => Button::My,
    }
  }
}

impl fmt::Display for CoverAction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      CoverAction::Open => write!(f, "open"),
      CoverAction::Close => write!(f, "close"),
      CoverAction::Stop => write!(f, "stop"),
    }
  }
}

/// Why the remote isn't accepting new operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusyReason {
  Selection,
  ButtonPress,
  Ready,
}

impl BusyReason {
  pub fn as_str(self) -> &'static str {
    match self {
      BusyReason::Selection => "selection in progress",
      BusyReason::ButtonPress => "button press in progress",
      BusyReason::Ready => "ready",
    }
  }
}

impl fmt::Display for BusyReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}
