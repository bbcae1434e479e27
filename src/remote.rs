use std::{fmt, time::Duration};

use log::{debug, info, warn};

pub use self::{
  button::{BusyReason, Button, CoverAction},
  channel::{Channel, LightPattern},
  command::Command,
  config::RemoteConfig,
  line::{Clock, DigitalLine, LineMode, Millis, ReadinessObserver, StabilitySensor, SystemClock},
  selection::{Phase, SelectionOutcome},
  sequencer::{ActivePress, PressOrigin},
};
use self::{
  light::{light_is_on, LightSensors},
  selection::{SelectionSession, SelectionTiming, StepEffects},
  sequencer::ButtonSequencer,
};
use crate::error::{SomfyError, SomfyResult};

mod button;
mod channel;
pub mod command;
pub mod config;
pub mod hardware;
pub mod light;
mod line;
pub mod mqtt;
pub mod selection;
pub mod sequencer;
#[cfg(test)]
pub(crate) mod testing;

/// Minimum time between passive resyncs from the lights
pub const SYNC_INTERVAL: Millis = 2_000;
/// Time after a selection before the lights are trusted for a passive resync
pub const SYNC_DELAY_AFTER_SELECTION: Millis = 2_000;
/// How often the channel belief is logged
pub const CHANNEL_LOG_INTERVAL: Millis = 5_000;
pub const DEFAULT_PRESS_DURATION: Duration = Duration::from_millis(500);

/// Everything the remote is connected to
pub struct RemoteWiring<L, S> {
  pub select: Option<L>,
  pub up: Option<L>,
  pub down: Option<L>,
  pub my: Option<L>,
  /// Raw indicator light lines, only used for diagnostics
  pub light_a: Option<L>,
  pub light_b: Option<L>,
  /// Filtered indicator lights, needed to select a channel
  pub sensor_a: Option<S>,
  pub sensor_b: Option<S>,
  pub press_duration: Duration,
  pub observer: Option<Box<dyn ReadinessObserver>>,
}

impl<L, S> Default for RemoteWiring<L, S> {
  fn default() -> Self {
    RemoteWiring {
      select: None,
      up: None,
      down: None,
      my: None,
      light_a: None,
      light_b: None,
      sensor_a: None,
      sensor_b: None,
      press_duration: DEFAULT_PRESS_DURATION,
      observer: None,
    }
  }
}

/// A multi-channel Somfy style remote whose buttons are pressed through GPIO lines.
///
/// All work happens in [`Remote::tick`], which must be called regularly and never blocks. Operations only start
/// things off; their progress shows up through [`Remote::is_ready`] and [`Remote::current_channel_belief`].
pub struct Remote<L, S, C> {
  sequencer: ButtonSequencer<L>,
  light_lines: Option<(L, L)>,
  lights: Option<LightSensors<S>>,
  clock: C,
  observer: Option<Box<dyn ReadinessObserver>>,
  timing: SelectionTiming,
  channel: Channel,
  session: Option<SelectionSession>,
  pending_action: Option<CoverAction>,
  last_outcome: Option<SelectionOutcome>,
  last_ready: bool,
  last_sync_at: Millis,
  last_selection_completed_at: Millis,
  last_channel_log_at: Millis,
  /// When the SELECT line was last let go, the lights lag behind it
  last_select_release_at: Option<Millis>,
}

impl<L, S, C> fmt::Debug for Remote<L, S, C> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Remote")
      .field("channel", &self.channel)
      .field("session", &self.session)
      .field("pending_action", &self.pending_action)
      .finish_non_exhaustive()
  }
}

impl<L, S, C> Remote<L, S, C>
where
  L: DigitalLine,
  S: StabilitySensor,
  C: Clock,
{
  pub fn init(wiring: RemoteWiring<L, S>, clock: C) -> SomfyResult<Self> {
    info!("Setting up remote");
    let RemoteWiring {
      select,
      up,
      down,
      my,
      light_a,
      light_b,
      sensor_a,
      sensor_b,
      press_duration,
      observer,
    } = wiring;

    let lines = [select, up, down, my];
    for button in Button::ALL {
      if lines[button.index()].is_none() {
        warn!("Required {button} line not configured");
        return Err(SomfyError::NotConfigured(button.name()));
      }
    }

    let press_duration = press_duration.as_millis() as Millis;
    let mut sequencer = ButtonSequencer::new(lines, press_duration);
    // idle lines float so no current flows back into the remote
    sequencer.release_all();
    info!("  Button press duration: {press_duration} ms");

    let light_lines = match (light_a, light_b) {
      (Some(mut a), Some(mut b)) => {
        a.set_mode(LineMode::Input);
        b.set_mode(LineMode::Input);
        info!("  Raw light lines configured");
        Some((a, b))
      }
      (None, None) => None,
      _ => {
        warn!("Only one raw light line configured, ignoring it");
        None
      }
    };

    let lights = match (sensor_a, sensor_b) {
      (Some(a), Some(b)) => Some(LightSensors::new(a, b)),
      (None, None) => {
        info!("  No light sensors, channel selection unavailable");
        None
      }
      _ => {
        warn!("Only one light sensor configured, channel selection unavailable");
        None
      }
    };

    let now = clock.now();
    let mut remote = Remote {
      sequencer,
      light_lines,
      lights,
      clock,
      observer,
      timing: SelectionTiming::new(press_duration),
      channel: Channel::DEFAULT,
      session: None,
      pending_action: None,
      last_outcome: None,
      last_ready: true,
      last_sync_at: now,
      last_selection_completed_at: now,
      last_channel_log_at: now,
      last_select_release_at: None,
    };

    info!("  Initial channel: {}", remote.channel);
    if let Some(observer) = remote.observer.as_mut() {
      observer.readiness_changed(true);
    }
    Ok(remote)
  }

  /// Advance everything in flight. Call once per scheduler pass.
  pub fn tick(&mut self) {
    let now = self.clock.now();

    if let Some(lights) = self.lights.as_mut() {
      lights.sample(now);
    }

    if now.saturating_sub(self.last_channel_log_at) >= CHANNEL_LOG_INTERVAL {
      debug!("Current channel: {}", self.channel);
      self.last_channel_log_at = now;
    }

    if self.session.is_none()
      && !self.sequencer.is_active()
      && self.lights.is_some()
      && now.saturating_sub(self.last_sync_at) >= SYNC_INTERVAL
      && now.saturating_sub(self.last_selection_completed_at) >= SYNC_DELAY_AFTER_SELECTION
      && self.lights_settled(now)
    {
      if let Err(err) = self.sync_from_lights() {
        warn!("Passive sync failed: {err}");
      }
      self.last_sync_at = now;
    }

    self.step_selection(now);

    if let Some(released) = self.sequencer.poll_release(now) {
      if released.button == Button::Select {
        self.last_select_release_at = Some(now);
      }
      if released.origin.advances_channel() {
        self.channel = self.channel.next();
        debug!("Channel advanced to {}", self.channel);
      }
    }

    self.report_readiness();
  }

  fn step_selection(&mut self, now: Millis) {
    let Some(session) = self.session.as_mut()
    else {
      return;
    };

    let lights = &self.lights;
    let effects = session.advance(now, self.sequencer.is_active(), &self.timing, || {
      lights
        .as_ref()
        .map(LightSensors::pattern)
        .unwrap_or(LightPattern::Dark)
    });
    self.apply(effects, now);
  }

  fn apply(&mut self, effects: StepEffects, now: Millis) {
    if let Some(channel) = effects.channel {
      self.channel = channel;
    }

    if let Some(origin) = effects.press {
      if let Err(err) = self.sequencer.start_press(Button::Select, origin, now) {
        warn!("Selection press failed: {err}");
      }
    }

    match effects.outcome {
      Some(SelectionOutcome::Completed(target)) => {
        self.session = None;
        self.last_selection_completed_at = now;
        self.last_outcome = Some(SelectionOutcome::Completed(target));
        self.run_pending_action(target);
      }
      Some(SelectionOutcome::Exhausted { presses }) => {
        self.session = None;
        self.last_outcome = Some(SelectionOutcome::Exhausted { presses });
        warn!("Channel selection failed: {}", SomfyError::SelectionExhausted(presses));
        if let Some(action) = self.pending_action.take() {
          warn!("Dropping pending {action} after failed selection");
        }
      }
      None => {}
    }
  }

  fn report_readiness(&mut self) {
    let ready = self.is_ready();
    if ready == self.last_ready {
      return;
    }

    info!(
      "Ready state changed: {} -> {} ({})",
      if self.last_ready { "READY" } else { "BUSY" },
      if ready { "READY" } else { "BUSY" },
      self.get_busy_reason()
    );
    self.last_ready = ready;
    if let Some(observer) = self.observer.as_mut() {
      observer.readiness_changed(ready);
    }
  }

  fn press(&mut self, button: Button) -> SomfyResult<()> {
    if !self.is_ready() {
      let reason = self.get_busy_reason();
      warn!("Device busy ({reason}), ignoring {button} press");
      return Err(SomfyError::Busy(reason));
    }
    let now = self.clock.now();
    self.sequencer.start_press(button, PressOrigin::Manual, now)
  }

  pub fn press_select(&mut self) -> SomfyResult<()> {
    self.press(Button::Select)
  }

  pub fn press_up(&mut self) -> SomfyResult<()> {
    self.press(Button::Up)
  }

  pub fn press_down(&mut self) -> SomfyResult<()> {
    self.press(Button::Down)
  }

  pub fn press_my(&mut self) -> SomfyResult<()> {
    self.press(Button::My)
  }

  pub fn press_button(&mut self, button: Button) -> SomfyResult<()> {
    self.press(button)
  }

  /// Start moving the remote to `target`, cancelling any selection already in flight.
  pub fn select_cover(&mut self, target: u8) -> SomfyResult<()> {
    let target = Channel::new(target).map_err(|err| {
      warn!("Not selecting: {err}");
      err
    })?;
    if let Some(action) = self.pending_action.take() {
      debug!("Dropping pending {action}, superseded by a plain selection");
    }
    self.begin_selection(target)
  }

  fn cancel_selection(&mut self) {
    if self.session.take().is_none() {
      return;
    }

    info!("Cancelling previous channel selection");
    let Some(aborted) = self.sequencer.force_release(Button::Select)
    else {
      return;
    };
    // the line still went low then floated, which the remote counts as a full press
    self.last_select_release_at = Some(self.clock.now());
    if aborted.origin.advances_channel() {
      self.channel = self.channel.next();
      debug!("Channel advanced to {} by the aborted press", self.channel);
    }
  }

  /// Whether the lights have caught up with the last SELECT release
  fn lights_settled(&self, now: Millis) -> bool {
    self
      .last_select_release_at
      .map_or(true, |at| now.saturating_sub(at) >= self.timing.anchor_settle_delay)
  }

  fn begin_selection(&mut self, target: Channel) -> SomfyResult<()> {
    self.cancel_selection();

    if !self.is_ready() {
      let reason = self.get_busy_reason();
      warn!("Device busy ({reason}), cannot select {target}");
      return Err(SomfyError::Busy(reason));
    }

    if self.channel == target {
      info!("Already at {target}, no selection needed");
      self.run_pending_action(target);
      return Ok(());
    }

    let Some(lights) = self.lights.as_ref()
    else {
      warn!("Cannot select {target} without light sensors");
      return Err(SomfyError::NotConfigured("light sensors"));
    };

    let now = self.clock.now();
    if self.lights_settled(now) && lights.pattern() == LightPattern::Anchor {
      info!("Lights already show {}, skipping reset phase", Channel::ANCHOR);
      self.channel = Channel::ANCHOR;

      if target == Channel::ANCHOR {
        self.last_selection_completed_at = now;
        self.last_outcome = Some(SelectionOutcome::Completed(target));
        self.run_pending_action(target);
        return Ok(());
      }

      let session = SelectionSession::selecting(target, now);
      info!("Selecting {target}: {} presses from the anchor", session.presses_remaining());
      self.sequencer.start_press(Button::Select, PressOrigin::Selection, now)?;
      self.session = Some(session);
    }
    else {
      let session = SelectionSession::resetting(target, now);
      info!(
        "Resetting to {} then selecting {target} ({} presses from the anchor)",
        Channel::ANCHOR,
        session.presses_remaining()
      );
      self.sequencer.start_press(Button::Select, PressOrigin::Reset, now)?;
      self.session = Some(session);
    }

    Ok(())
  }

  fn run_pending_action(&mut self, channel: Channel) {
    if let Some(action) = self.pending_action.take() {
      info!("Executing pending {action} for {channel}");
      if let Err(err) = self.press(action.button()) {
        warn!("Pending {action} for {channel} failed: {err}");
      }
    }
  }

  fn cover_action(&mut self, action: CoverAction, channel: u8) -> SomfyResult<()> {
    let target = Channel::new(channel).map_err(|err| {
      warn!("Not running {action}: {err}");
      err
    })?;

    if self.channel == target && self.session.is_none() {
      info!("Already at {target}, pressing {}", action.button());
      return self.press(action.button());
    }

    info!("{action} {target}: selecting channel first");
    self.pending_action = Some(action);
    let result = self.begin_selection(target);
    if result.is_err() {
      self.pending_action = None;
    }
    result
  }

  /// Select `channel` then press UP
  pub fn cover_open(&mut self, channel: u8) -> SomfyResult<()> {
    self.cover_action(CoverAction::Open, channel)
  }

  /// Select `channel` then press DOWN
  pub fn cover_close(&mut self, channel: u8) -> SomfyResult<()> {
    self.cover_action(CoverAction::Close, channel)
  }

  /// Select `channel` then press MY
  pub fn cover_stop(&mut self, channel: u8) -> SomfyResult<()> {
    self.cover_action(CoverAction::Stop, channel)
  }

  /// Overwrite the channel belief without pressing anything
  pub fn calibrate(&mut self, channel: u8) -> SomfyResult<()> {
    let channel = Channel::new(channel)?;
    self.channel = channel;
    info!("Channel calibrated to {channel}");
    Ok(())
  }

  /// Re-derive the channel belief from the filtered lights where they are unambiguous.
  pub fn sync_from_lights(&mut self) -> SomfyResult<LightPattern> {
    let pattern = self
      .lights
      .as_ref()
      .map(LightSensors::pattern)
      .ok_or(SomfyError::NotConfigured("light sensors"))?;

    match pattern.channel() {
      Some(detected) if detected != self.channel => {
        info!("Syncing channel from lights: {} -> {detected}", self.channel);
        self.channel = detected;
      }
      Some(_) => {}
      None if pattern == LightPattern::Erratic => {
        warn!("Both lights on, erratic reading, not syncing channel");
      }
      None => {
        debug!("Lights off, channel could be 0, 1 or 4, keeping {}", self.channel);
      }
    }
    Ok(pattern)
  }

  pub fn current_channel_belief(&self) -> Channel {
    self.channel
  }

  pub fn is_ready(&self) -> bool {
    self.session.is_none() && !self.sequencer.is_active()
  }

  pub fn get_busy_reason(&self) -> BusyReason {
    if self.session.is_some() {
      BusyReason::Selection
    }
    else if self.sequencer.is_active() {
      BusyReason::ButtonPress
    }
    else {
      BusyReason::Ready
    }
  }

  pub fn pending_action(&self) -> Option<CoverAction> {
    self.pending_action
  }

  pub fn selection_phase(&self) -> Option<Phase> {
    self.session.as_ref().map(SelectionSession::phase)
  }

  pub fn selection(&self) -> Option<&SelectionSession> {
    self.session.as_ref()
  }

  pub fn last_selection_outcome(&self) -> Option<SelectionOutcome> {
    self.last_outcome
  }

  pub fn active_press(&self) -> Option<&ActivePress> {
    self.sequencer.active()
  }

  /// Unfiltered reading of the light lines, `(a, b)`
  ///
  /// Taken from the raw light lines if wired, otherwise from the sensors when they expose their raw readings.
  pub fn raw_light_states(&self) -> Option<(bool, bool)> {
    if let Some((a, b)) = &self.light_lines {
      return Some((light_is_on(a), light_is_on(b)));
    }
    let lights = self.lights.as_ref()?;
    Some((lights.a.raw_reading()?, lights.b.raw_reading()?))
  }

  /// Carry out a command received from outside
  pub fn execute(&mut self, command: Command) -> SomfyResult<()> {
    match command {
      Command::Open(channel) => self.cover_open(channel),
      Command::Close(channel) => self.cover_close(channel),
      Command::Stop(channel) => self.cover_stop(channel),
      Command::Select(channel) => self.select_cover(channel),
      Command::Calibrate(channel) => self.calibrate(channel.unwrap_or(Channel::DEFAULT.index())),
      Command::Sync => self.sync_from_lights().map(|_| ()),
      Command::Press(button) => self.press_button(button),
    }
  }
}
