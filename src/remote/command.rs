use std::str::FromStr;

use super::button::Button;
use crate::error::SomfyError;

/// A command received on the remote's command topic.
///
/// Payloads are words separated by whitespace, in any case, e.g. `open 2`, `press my` or `calibrate`.
/// Channel indices are range checked when the command is carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
  Open(u8),
  Close(u8),
  Stop(u8),
  Select(u8),
  /// Set the channel belief, to the default channel if none is given
  Calibrate(Option<u8>),
  /// Resync the channel belief from the lights now
  Sync,
  Press(Button),
}

impl FromStr for Command {
  type Err = SomfyError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let invalid = || SomfyError::InvalidCommand(s.to_string());
    let words: Vec<String> = s.split_whitespace().map(str::to_ascii_lowercase).collect();
    let words: Vec<&str> = words.iter().map(String::as_str).collect();
    let channel = |word: &str| word.parse::<u8>().map_err(|_| invalid());

    match words.as_slice() {
      ["open", index] => Ok(Command::Open(channel(*index)?)),
      ["close", index] => Ok(Command::Close(channel(*index)?)),
      ["stop", index] => Ok(Command::Stop(channel(*index)?)),
      ["select", index] => Ok(Command::Select(channel(*index)?)),
      ["calibrate"] => Ok(Command::Calibrate(None)),
      ["calibrate", index] => Ok(Command::Calibrate(Some(channel(*index)?))),
      ["sync"] => Ok(Command::Sync),
      ["press", button] => Ok(Command::Press(Button::from_str(*button).map_err(|_| invalid())?)),
      _ => Err(invalid()),
    }
  }
}
