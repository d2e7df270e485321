//! Runtime configuration types for the controller.
//!
//! Separate from the TOML-deserialized config in `dropper_config`; see
//! `conversions` for the mapping.

/// How the two rotation sensors are turned into periods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorCfg {
    /// Multiplier from one measured light-sensor (half) cycle to a full round.
    pub light_factor: u32,
    /// Measure both light-sensor transitions (duty cycle must be ~50 %).
    pub light_half_cycles: bool,
    /// Multiplier from one measured hall-sensor cycle to a full round.
    pub hall_factor: u32,
    pub hall_half_cycles: bool,
}

impl Default for MonitorCfg {
    fn default() -> Self {
        // Six light cycles per round measured per half cycle, one hall cycle per round.
        Self {
            light_factor: 12,
            light_half_cycles: true,
            hall_factor: 1,
            hall_half_cycles: false,
        }
    }
}
