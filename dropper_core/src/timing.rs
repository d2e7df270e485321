//! Fixed timing constants of the release mechanism (microseconds).
//!
//! These are properties of the physical build and are deliberately not part
//! of the runtime configuration.

/// Time the object needs to fall from the actuator to the turntable's target
/// point, including actuator response lag.
///
/// 391 ms is the free-fall time derived from the drop height; the 28.125 ms
/// on top was found by binary search over [391 ms, 491 ms] on the real rig.
pub const FALL_TRANSIT_TIME_US: u64 = 391_000 + 28_125;

/// Rotation periods above this mean the turntable is stopped or the
/// measurement is invalid.
pub const MAX_VALID_PERIOD_US: u64 = 8_000_000;

/// Period difference between consecutive samples that counts as a speed change.
pub const SPEED_CHANGE_TOLERANCE_US: u64 = 10_000;

/// Full rounds release stays inhibited after a speed change.
pub const COOLDOWN_ROUNDS: u8 = 2;

/// Pause after closing the actuator so the next object has fallen through.
pub const FALL_THROUGH_WAIT_US: u64 = 400_000;

/// Actuator settle time after moving to pre-armed.
pub const PRE_ARM_WAIT_US: u64 = 200_000;

/// Hold time in the released position before closing.
pub const RELEASE_HOLD_US: u64 = 200_000;

/// Upper bound on extrapolation steps per release calculation.
pub const MAX_EXTRAPOLATION_STEPS: u32 = 256;
