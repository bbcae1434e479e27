use log::{debug, warn};

use super::{
  button::{BusyReason, Button},
  line::{DigitalLine, LineMode, Millis},
};
use crate::error::{SomfyError, SomfyResult};

/// Who asked for a press, which decides how the sequencer treats it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressOrigin {
  /// Requested from outside, refused while another press is held
  Manual,
  /// SELECT press made while looking for the anchor channel
  Reset,
  /// SELECT press counted towards the target channel
  Selection,
}

impl PressOrigin {
  pub fn bypasses_busy_check(self) -> bool {
    !matches!(self, PressOrigin::Manual)
  }

  /// Whether releasing the press moves the remote on by one channel in our books
  pub fn advances_channel(self) -> bool {
    matches!(self, PressOrigin::Selection)
  }
}

/// The one press currently being held down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivePress {
  pub button: Button,
  pub started_at: Millis,
  pub origin: PressOrigin,
}

/// Emulates momentary presses on the remote's button lines without blocking.
///
/// A pressed line sinks current (output, low) and an idle line floats (input), so a line is never driven high.
#[derive(Debug)]
pub struct ButtonSequencer<L> {
  lines: [Option<L>; 4],
  press_duration: Millis,
  active: Option<ActivePress>,
}

impl<L: DigitalLine> ButtonSequencer<L> {
  /// `lines` are indexed in [`Button::ALL`] order
  pub fn new(lines: [Option<L>; 4], press_duration: Millis) -> Self {
    ButtonSequencer {
      lines,
      press_duration,
      active: None,
    }
  }

  pub fn press_duration(&self) -> Millis {
    self.press_duration
  }

  pub fn is_configured(&self, button: Button) -> bool {
    self.lines[button.index()].is_some()
  }

  pub fn active(&self) -> Option<&ActivePress> {
    self.active.as_ref()
  }

  pub fn is_active(&self) -> bool {
    self.active.is_some()
  }

  /// Float every configured line
  pub fn release_all(&mut self) {
    for line in self.lines.iter_mut().flatten() {
      line.set_mode(LineMode::Input);
    }
    self.active = None;
  }

  pub fn start_press(&mut self, button: Button, origin: PressOrigin, now: Millis) -> SomfyResult<()> {
    if !self.is_configured(button) {
      warn!("Attempted to press {button} but its line is not configured");
      return Err(SomfyError::NotConfigured(button.name()));
    }

    if let Some(active) = self.active {
      if !origin.bypasses_busy_check() {
        warn!("{} button still held, ignoring {button} press", active.button);
        return Err(SomfyError::Busy(BusyReason::ButtonPress));
      }
      // a line must never be left sinking, so let go of whatever is still held
      warn!("Releasing {} button early for {button} press", active.button);
      self.force_release(active.button);
    }

    debug!("Pressing {button} button");
    if let Some(line) = self.lines[button.index()].as_mut() {
      // latch low before switching to output so the line never pulses high
      line.write(false);
      line.set_mode(LineMode::Output);
    }

    self.active = Some(ActivePress {
      button,
      started_at: now,
      origin,
    });
    Ok(())
  }

  /// Releases the held press once it has lasted long enough, returning it.
  pub fn poll_release(&mut self, now: Millis) -> Option<ActivePress> {
    let active = self.active?;
    if now.saturating_sub(active.started_at) < self.press_duration {
      return None;
    }

    if let Some(line) = self.lines[active.button.index()].as_mut() {
      line.set_mode(LineMode::Input);
    }
    debug!("{} button released", active.button);
    self.active.take()
  }

  /// Immediately lets go of `button` if it's the one being held.
  ///
  /// Returns the aborted press.
  pub fn force_release(&mut self, button: Button) -> Option<ActivePress> {
    match self.active {
      Some(active) if active.button == button => {
        if let Some(line) = self.lines[button.index()].as_mut() {
          line.set_mode(LineMode::Input);
        }
        debug!("{button} button released early");
        self.active.take()
      }
      _ => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::remote::testing::{LineEvent, SimLine};

  fn sequencer() -> (ButtonSequencer<SimLine>, [SimLine; 4]) {
    let lines = [SimLine::new(), SimLine::new(), SimLine::new(), SimLine::new()];
    let sequencer = ButtonSequencer::new(lines.clone().map(Some), 500);
    (sequencer, lines)
  }

  #[test]
  fn press_latches_low_before_switching_to_output() {
    let (mut sequencer, lines) = sequencer();
    sequencer.start_press(Button::Up, PressOrigin::Manual, 0).unwrap();

    assert_eq!(
      lines[Button::Up.index()].events(),
      vec![LineEvent::Write(false), LineEvent::Mode(LineMode::Output)]
    );
    assert!(lines[Button::Down.index()].events().is_empty());
    assert!(sequencer.is_active());
  }

  #[test]
  fn release_happens_once_duration_elapsed() {
    let (mut sequencer, lines) = sequencer();
    sequencer.start_press(Button::My, PressOrigin::Manual, 1_000).unwrap();

    for now in (1_000..1_500).step_by(10) {
      assert_eq!(sequencer.poll_release(now), None, "released early at {now}");
      assert_eq!(lines[Button::My.index()].mode(), LineMode::Output);
    }

    let released = sequencer.poll_release(1_500).unwrap();
    assert_eq!(released.button, Button::My);
    assert_eq!(lines[Button::My.index()].mode(), LineMode::Input);
    assert_eq!(
      lines[Button::My.index()].events(),
      vec![
        LineEvent::Write(false),
        LineEvent::Mode(LineMode::Output),
        LineEvent::Mode(LineMode::Input)
      ]
    );

    // idempotent once nothing is held
    assert_eq!(sequencer.poll_release(5_000), None);
    assert_eq!(lines[Button::My.index()].events().len(), 3);
  }

  #[test]
  fn manual_press_is_refused_while_busy() {
    let (mut sequencer, lines) = sequencer();
    sequencer.start_press(Button::Up, PressOrigin::Manual, 0).unwrap();

    let err = sequencer.start_press(Button::Down, PressOrigin::Manual, 10).unwrap_err();
    assert!(matches!(err, SomfyError::Busy(BusyReason::ButtonPress)));
    assert!(lines[Button::Down.index()].events().is_empty());
    assert_eq!(sequencer.active().unwrap().button, Button::Up);
  }

  #[test]
  fn protocol_press_takes_over_without_leaving_a_line_held() {
    let (mut sequencer, lines) = sequencer();
    sequencer.start_press(Button::Up, PressOrigin::Manual, 0).unwrap();
    sequencer.start_press(Button::Select, PressOrigin::Reset, 10).unwrap();

    assert_eq!(lines[Button::Up.index()].mode(), LineMode::Input);
    assert_eq!(lines[Button::Select.index()].mode(), LineMode::Output);
    assert_eq!(sequencer.active().unwrap().origin, PressOrigin::Reset);
  }

  #[test]
  fn missing_line_is_not_configured() {
    let line = SimLine::new();
    let mut sequencer = ButtonSequencer::new([Some(line), None, None, None], 500);

    let err = sequencer.start_press(Button::Up, PressOrigin::Manual, 0).unwrap_err();
    assert!(matches!(err, SomfyError::NotConfigured("up")));
    assert!(!sequencer.is_active());
  }

  #[test]
  fn force_release_only_touches_the_held_button() {
    let (mut sequencer, lines) = sequencer();
    sequencer.start_press(Button::Select, PressOrigin::Selection, 0).unwrap();

    assert_eq!(sequencer.force_release(Button::Up), None);
    assert!(sequencer.is_active());

    let aborted = sequencer.force_release(Button::Select).unwrap();
    assert_eq!(aborted.origin, PressOrigin::Selection);
    assert_eq!(lines[Button::Select.index()].mode(), LineMode::Input);
    assert!(!sequencer.is_active());
  }

  #[test]
  fn only_selection_presses_advance_the_channel() {
    assert!(PressOrigin::Selection.advances_channel());
    assert!(!PressOrigin::Reset.advances_channel());
    assert!(!PressOrigin::Manual.advances_channel());
    assert!(!PressOrigin::Manual.bypasses_busy_check());
    assert!(PressOrigin::Reset.bypasses_busy_check());
  }
}
