//! Driving the remote to a given channel.
//!
//! The remote only has a "next channel" button and two indicator lights, and only the anchor channel lights them
//! unambiguously. A selection therefore first presses SELECT until the lights confirm the anchor (the reset phase),
//! then presses it a known number of times to count on to the target (the selection phase).
//!
//! [`SelectionSession::advance`] holds no hardware; it reports the presses and belief changes for the
//! [`Remote`](super::Remote) to carry out.

use log::{debug, info, warn};

use super::{
  channel::{Channel, LightPattern},
  line::Millis,
  sequencer::PressOrigin,
};

/// How long the indicator lights take to follow a channel change
pub const LIGHT_RESPONSE_TIME: Millis = 100;
/// Delay added by the light sensors' debounce filter
pub const FILTER_DELAY: Millis = 100;
pub const STABILITY_MARGIN: Millis = 100;
/// Wait after a reset press is released before trusting the lights
pub const ANCHOR_SETTLE_DELAY: Millis = LIGHT_RESPONSE_TIME + FILTER_DELAY + STABILITY_MARGIN;
/// Gap added on top of the press duration between selection presses
pub const SELECTION_PRESS_MARGIN: Millis = 50;
/// Reset presses to make before giving up on finding the anchor
pub const MAX_RESET_PRESSES: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionTiming {
  pub press_duration: Millis,
  pub anchor_settle_delay: Millis,
  pub press_margin: Millis,
  pub max_reset_presses: u8,
}

impl SelectionTiming {
  pub fn new(press_duration: Millis) -> Self {
    SelectionTiming {
      press_duration,
      anchor_settle_delay: ANCHOR_SETTLE_DELAY,
      press_margin: SELECTION_PRESS_MARGIN,
      max_reset_presses: MAX_RESET_PRESSES,
    }
  }

  /// Minimum time between the release of one selection press and the next
  pub fn press_interval(&self) -> Millis {
    self.press_duration + self.press_margin
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
  /// A reset press is held
  ResettingToAnchor,
  /// Reset press released, giving the lights time to settle
  WaitingAnchorStable,
  /// About to read the lights
  CheckingAnchor,
  /// A selection press is held
  WaitingReleaseDuringSelection,
  /// Pausing before the next selection press
  WaitingBetweenSelectionPresses,
}

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOutcome {
  Completed(Channel),
  /// The anchor never showed up
  Exhausted { presses: u8 },
}

/// What the remote has to do after advancing a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepEffects {
  /// New channel belief
  pub channel: Option<Channel>,
  /// Start a SELECT press
  pub press: Option<PressOrigin>,
  /// The session is over
  pub outcome: Option<SelectionOutcome>,
}

impl StepEffects {
  fn press(origin: PressOrigin) -> Self {
    StepEffects {
      press: Some(origin),
      ..Default::default()
    }
  }
}

/// A channel selection in flight
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionSession {
  target: Channel,
  presses_remaining: u8,
  presses_made: u8,
  reset_presses: u8,
  phase: Phase,
  phase_started_at: Millis,
}

impl SelectionSession {
  /// Starts with the reset phase; the caller makes the first reset press.
  pub fn resetting(target: Channel, now: Millis) -> Self {
    SelectionSession {
      target,
      presses_remaining: target.presses_from(Channel::ANCHOR),
      presses_made: 0,
      reset_presses: 1,
      phase: Phase::ResettingToAnchor,
      phase_started_at: now,
    }
  }

  /// Starts from a confirmed anchor; the caller makes the first selection press.
  pub fn selecting(target: Channel, now: Millis) -> Self {
    SelectionSession {
      target,
      presses_remaining: target.presses_from(Channel::ANCHOR),
      presses_made: 0,
      reset_presses: 0,
      phase: Phase::WaitingReleaseDuringSelection,
      phase_started_at: now,
    }
  }

  pub fn target(&self) -> Channel {
    self.target
  }

  pub fn phase(&self) -> Phase {
    self.phase
  }

  pub fn presses_remaining(&self) -> u8 {
    self.presses_remaining
  }

  pub fn presses_made(&self) -> u8 {
    self.presses_made
  }

  pub fn reset_presses(&self) -> u8 {
    self.reset_presses
  }

  fn enter(&mut self, phase: Phase, now: Millis) {
    self.phase = phase;
    self.phase_started_at = now;
  }

  fn elapsed(&self, now: Millis) -> Millis {
    now.saturating_sub(self.phase_started_at)
  }

  /// Moves the session on by at most one phase.
  ///
  /// `press_held` is whether the sequencer still holds a press, `lights` is only read when checking for the anchor.
  pub fn advance(
    &mut self,
    now: Millis,
    press_held: bool,
    timing: &SelectionTiming,
    lights: impl FnOnce() -> LightPattern,
  ) -> StepEffects {
    match self.phase {
      Phase::ResettingToAnchor => {
        if !press_held {
          debug!(
            "Reset press #{} released, waiting for the lights to settle",
            self.reset_presses
          );
          self.enter(Phase::WaitingAnchorStable, now);
        }
        StepEffects::default()
      }

      Phase::WaitingAnchorStable => {
        if self.elapsed(now) >= timing.anchor_settle_delay {
          self.enter(Phase::CheckingAnchor, now);
        }
        StepEffects::default()
      }

      Phase::CheckingAnchor => {
        if lights() == LightPattern::Anchor {
          info!(
            "Reached anchor {} after {} reset presses",
            Channel::ANCHOR,
            self.reset_presses
          );
          if self.presses_remaining == 0 {
            return StepEffects {
              channel: Some(Channel::ANCHOR),
              outcome: Some(SelectionOutcome::Completed(self.target)),
              ..Default::default()
            };
          }

          info!(
            "Selecting {}: {} presses from the anchor",
            self.target, self.presses_remaining
          );
          self.enter(Phase::WaitingReleaseDuringSelection, now);
          StepEffects {
            channel: Some(Channel::ANCHOR),
            press: Some(PressOrigin::Selection),
            ..Default::default()
          }
        }
        else if self.reset_presses >= timing.max_reset_presses {
          warn!(
            "Giving up on {} after {} reset presses without the anchor lighting up",
            self.target, self.reset_presses
          );
          StepEffects {
            outcome: Some(SelectionOutcome::Exhausted {
              presses: self.reset_presses,
            }),
            ..Default::default()
          }
        }
        else {
          self.reset_presses += 1;
          debug!("Reset press #{}", self.reset_presses);
          self.enter(Phase::ResettingToAnchor, now);
          StepEffects::press(PressOrigin::Reset)
        }
      }

      Phase::WaitingReleaseDuringSelection => {
        if press_held {
          return StepEffects::default();
        }

        self.presses_made += 1;
        self.presses_remaining = self.presses_remaining.saturating_sub(1);
        debug!("Selection press done, {} remaining", self.presses_remaining);

        if self.presses_remaining == 0 {
          info!("Selected {} after {} selection presses", self.target, self.presses_made);
          StepEffects {
            channel: Some(self.target),
            outcome: Some(SelectionOutcome::Completed(self.target)),
            ..Default::default()
          }
        }
        else {
          self.enter(Phase::WaitingBetweenSelectionPresses, now);
          StepEffects::default()
        }
      }

      Phase::WaitingBetweenSelectionPresses => {
        if self.elapsed(now) >= timing.press_interval() {
          self.enter(Phase::WaitingReleaseDuringSelection, now);
          StepEffects::press(PressOrigin::Selection)
        }
        else {
          StepEffects::default()
        }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const TIMING: SelectionTiming = SelectionTiming {
    press_duration: 500,
    anchor_settle_delay: ANCHOR_SETTLE_DELAY,
    press_margin: SELECTION_PRESS_MARGIN,
    max_reset_presses: MAX_RESET_PRESSES,
  };

  fn channel(index: u8) -> Channel {
    Channel::new(index).unwrap()
  }

  fn unread() -> LightPattern {
    panic!("lights read outside of the anchor check")
  }

  #[test]
  fn settle_delay_covers_light_response_and_filter() {
    assert_eq!(ANCHOR_SETTLE_DELAY, 300);
    assert_eq!(TIMING.press_interval(), 550);
  }

  #[test]
  fn reset_phase_waits_for_release_then_settles() {
    let mut session = SelectionSession::resetting(channel(0), 0);
    assert_eq!(session.presses_remaining(), 3);

    assert_eq!(session.advance(100, true, &TIMING, unread), StepEffects::default());
    assert_eq!(session.phase(), Phase::ResettingToAnchor);

    session.advance(500, false, &TIMING, unread);
    assert_eq!(session.phase(), Phase::WaitingAnchorStable);

    session.advance(799, false, &TIMING, unread);
    assert_eq!(session.phase(), Phase::WaitingAnchorStable);
    session.advance(800, false, &TIMING, unread);
    assert_eq!(session.phase(), Phase::CheckingAnchor);
  }

  #[test]
  fn dark_lights_trigger_another_reset_press() {
    let mut session = SelectionSession::resetting(channel(0), 0);
    session.advance(500, false, &TIMING, unread);
    session.advance(800, false, &TIMING, unread);

    let effects = session.advance(810, false, &TIMING, || LightPattern::Dark);
    assert_eq!(effects.press, Some(PressOrigin::Reset));
    assert_eq!(effects.channel, None);
    assert_eq!(session.reset_presses(), 2);
    assert_eq!(session.phase(), Phase::ResettingToAnchor);
  }

  #[test]
  fn anchor_starts_selection_phase() {
    let mut session = SelectionSession::resetting(channel(4), 0);
    session.advance(500, false, &TIMING, unread);
    session.advance(800, false, &TIMING, unread);

    let effects = session.advance(810, false, &TIMING, || LightPattern::Anchor);
    assert_eq!(effects.channel, Some(Channel::ANCHOR));
    assert_eq!(effects.press, Some(PressOrigin::Selection));
    assert_eq!(effects.outcome, None);
    assert_eq!(session.phase(), Phase::WaitingReleaseDuringSelection);
  }

  #[test]
  fn anchor_target_completes_at_the_check() {
    let mut session = SelectionSession::resetting(Channel::ANCHOR, 0);
    session.advance(500, false, &TIMING, unread);
    session.advance(800, false, &TIMING, unread);

    let effects = session.advance(810, false, &TIMING, || LightPattern::Anchor);
    assert_eq!(effects.channel, Some(Channel::ANCHOR));
    assert_eq!(effects.press, None);
    assert_eq!(effects.outcome, Some(SelectionOutcome::Completed(Channel::ANCHOR)));
  }

  #[test]
  fn reset_presses_are_bounded() {
    let mut session = SelectionSession::resetting(channel(1), 0);
    let mut now = 0;
    let mut presses = 1;

    let outcome = loop {
      now += 500;
      session.advance(now, false, &TIMING, unread);
      now += ANCHOR_SETTLE_DELAY;
      session.advance(now, false, &TIMING, unread);
      let effects = session.advance(now, false, &TIMING, || LightPattern::Erratic);
      if let Some(outcome) = effects.outcome {
        break outcome;
      }
      assert_eq!(effects.press, Some(PressOrigin::Reset));
      presses += 1;
    };

    assert_eq!(presses, MAX_RESET_PRESSES);
    assert_eq!(outcome, SelectionOutcome::Exhausted { presses: MAX_RESET_PRESSES });
  }

  #[test]
  fn selection_presses_are_spaced_and_counted() {
    let mut session = SelectionSession::selecting(channel(0), 0);
    assert_eq!(session.presses_remaining(), 3);

    // first press released
    assert_eq!(session.advance(510, false, &TIMING, unread), StepEffects::default());
    assert_eq!(session.phase(), Phase::WaitingBetweenSelectionPresses);
    assert_eq!(session.presses_remaining(), 2);

    assert_eq!(session.advance(1_059, false, &TIMING, unread).press, None);
    assert_eq!(
      session.advance(1_060, false, &TIMING, unread).press,
      Some(PressOrigin::Selection)
    );

    // second press
    session.advance(1_570, false, &TIMING, unread);
    session.advance(2_120, false, &TIMING, unread);

    // third and last press
    let effects = session.advance(2_630, false, &TIMING, unread);
    assert_eq!(effects.channel, Some(channel(0)));
    assert_eq!(effects.outcome, Some(SelectionOutcome::Completed(channel(0))));
    assert_eq!(session.presses_made(), 3);
    assert_eq!(session.presses_remaining(), 0);
  }
}
