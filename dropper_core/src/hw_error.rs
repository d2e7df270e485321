//! Maps `Box<dyn Error>` from trait boundaries to typed `DropperError`.
//!
//! The traits in `dropper_traits` use `Box<dyn Error + Send + Sync>` so any
//! backend can plug in; this module converts those to our typed error enum,
//! with an optional feature-gated path for `dropper_hardware::HwError`.

use crate::error::DropperError;

/// Map a trait-boundary error to a typed `DropperError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> DropperError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<dropper_hardware::error::HwError>() {
            return match hw {
                dropper_hardware::error::HwError::Gpio(_)
                | dropper_hardware::error::HwError::Pwm(_) => {
                    DropperError::HardwareFault(hw.to_string())
                }
                other => DropperError::Hardware(other.to_string()),
            };
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("fault") {
        DropperError::HardwareFault(s)
    } else {
        DropperError::Hardware(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_errors_fall_back_to_string_mapping() {
        let io = std::io::Error::other("servo fault detected");
        assert!(matches!(map_hw_error(&io), DropperError::HardwareFault(_)));
        let io = std::io::Error::other("bus busy");
        assert!(matches!(map_hw_error(&io), DropperError::Hardware(_)));
    }
}
