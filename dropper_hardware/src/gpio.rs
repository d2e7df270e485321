//! GPIO input lines (Raspberry Pi via rppal).

use dropper_traits::DigitalInput;
use rppal::gpio::{Gpio, InputPin};

use crate::error::{HwError, Result};

/// A sensor or button line. `active_low` inverts the reading so callers
/// always see "asserted" as high.
pub struct GpioInput {
    pin: InputPin,
    active_low: bool,
}

impl GpioInput {
    pub fn new(pin: u8, active_low: bool) -> Result<Self> {
        let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
        let pin = gpio
            .get(pin)
            .map_err(|e| HwError::Gpio(e.to_string()))?
            .into_input();
        tracing::debug!(pin = pin.pin(), active_low, "gpio input ready");
        Ok(Self { pin, active_low })
    }
}

impl DigitalInput for GpioInput {
    #[inline]
    fn is_high(&mut self) -> bool {
        self.pin.is_high() != self.active_low
    }
}
