use std::fmt;

use crate::error::{SomfyError, SomfyResult};

/// One of the remote's channels, each bound to a single cover.
///
/// The remote cannot report which channel it is on, so any `Channel` held by the
/// controller is a belief that may drift if the remote is used by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Channel(u8);

impl Channel {
  /// Number of channels the remote cycles through
  pub const COUNT: u8 = 5;

  /// The only channel the indicator lights identify unambiguously
  pub const ANCHOR: Channel = Channel(2);

  /// Belief held at startup and restored by a plain calibration
  pub const DEFAULT: Channel = Channel(3);

  pub fn new(index: u8) -> SomfyResult<Channel> {
    if index < Self::COUNT {
      Ok(Channel(index))
    }
    else {
      Err(SomfyError::InvalidChannel(index))
    }
  }

  pub fn index(self) -> u8 {
    self.0
  }

  /// The channel a single press of SELECT moves to
  pub fn next(self) -> Channel {
    Channel((self.0 + 1) % Self::COUNT)
  }

  /// How many SELECT presses it takes to get from `from` to this channel
  pub fn presses_from(self, from: Channel) -> u8 {
    (self.0 + Self::COUNT - from.0) % Self::COUNT
  }
}

impl TryFrom<u8> for Channel {
  type Error = SomfyError;

  fn try_from(index: u8) -> Result<Self, Self::Error> {
    Channel::new(index)
  }
}

impl fmt::Display for Channel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    // the remote itself labels its channels from 1
    write!(f, "remote cover {} (index {})", self.0 + 1, self.0)
  }
}

/// Interpretation of the two indicator lights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightPattern {
  /// Light A on, light B off
  Anchor,
  /// Light A off, light B on
  AfterAnchor,
  /// Both off, one of three channels the lights can't tell apart
  Dark,
  /// Both on, a sensor or wiring fault
  Erratic,
}

impl LightPattern {
  pub fn from_lights(a_on: bool, b_on: bool) -> LightPattern {
    match (a_on, b_on) {
      (true, false) => LightPattern::Anchor,
      (false, true) => LightPattern::AfterAnchor,
      (false, false) => LightPattern::Dark,
      (true, true) => LightPattern::Erratic,
    }
  }

  /// The channel this pattern pins down, if any
  pub fn channel(self) -> Option<Channel> {
    match self {
      LightPattern::Anchor => Some(Channel::ANCHOR),
      LightPattern::AfterAnchor => Some(Channel::ANCHOR.next()),
      LightPattern::Dark | LightPattern::Erratic => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn rejects_out_of_range_indices() {
    for index in 0..Channel::COUNT {
      assert_eq!(Channel::new(index).unwrap().index(), index);
    }
    assert!(matches!(Channel::new(5), Err(SomfyError::InvalidChannel(5))));
    assert!(matches!(Channel::try_from(7), Err(SomfyError::InvalidChannel(7))));
  }

  #[test]
  fn next_wraps_around() {
    assert_eq!(Channel::new(4).unwrap().next(), Channel::new(0).unwrap());
    assert_eq!(Channel::ANCHOR.next(), Channel::DEFAULT);
  }

  #[test]
  fn presses_from_anchor_follow_modular_distance() {
    let expected = [3, 4, 0, 1, 2];
    for (target, presses) in expected.into_iter().enumerate() {
      let target = Channel::new(target as u8).unwrap();
      assert_eq!(target.presses_from(Channel::ANCHOR), presses, "target {target}");
      assert_eq!(presses, (target.index() + 5 - 2) % 5);
    }
  }

  #[test]
  fn light_patterns_map_to_channels() {
    assert_eq!(LightPattern::from_lights(true, false).channel(), Some(Channel::ANCHOR));
    assert_eq!(LightPattern::from_lights(false, true).channel(), Some(Channel::DEFAULT));
    assert_eq!(LightPattern::from_lights(false, false), LightPattern::Dark);
    assert_eq!(LightPattern::Dark.channel(), None);
    assert_eq!(LightPattern::from_lights(true, true), LightPattern::Erratic);
    assert_eq!(LightPattern::Erratic.channel(), None);
  }
}
