use std::{fmt, str::FromStr};

use serde::Deserialize;

/// A Raspberry Pi GPIO line, named by its BCM number as on https://pinout.xyz/ (e.g. `"Gpio17"`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct GpioPin(u8);

impl GpioPin {
  /// Highest BCM line on the 40 pin header
  const MAX_BCM: u8 = 27;

  /// Get the BCM number for this GPIO pin
  pub fn bcm_number(&self) -> u8 {
    self.0
  }
}

impl FromStr for GpioPin {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let number = s
      .strip_prefix("Gpio")
      .or_else(|| s.strip_prefix("GPIO"))
      .and_then(|number| number.parse::<u8>().ok())
      .ok_or_else(|| format!("expected a pin name like \"Gpio17\", got {s:?}"))?;

    if number <= Self::MAX_BCM {
      Ok(GpioPin(number))
    }
    else {
      Err(format!("{s} is not on the GPIO header"))
    }
  }
}

impl TryFrom<String> for GpioPin {
  type Error = String;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

impl fmt::Display for GpioPin {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "GPIO{}", self.0)
  }
}
