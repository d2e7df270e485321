//! Speed stability gate.
//!
//! Period samples arrive more often than full rounds (light sensor, several
//! per round) so speed changes are noticed quickly even when a round takes
//! seconds. The cool-down itself is counted in full rounds (hall sensor),
//! because the release calculation is expressed in full rounds and needs a
//! stable hall measurement.

use crate::timing::{COOLDOWN_ROUNDS, SPEED_CHANGE_TOLERANCE_US};

/// Answers whether release is currently vetoed.
pub trait InhibitionSource {
    fn is_inhibited(&self) -> bool;
}

#[derive(Debug, Default, Clone)]
pub struct StabilityGate {
    /// Last period sample, baseline for the next comparison. The first
    /// sample only establishes the baseline.
    last_period_us: Option<u64>,
    /// Full rounds left before release is allowed again.
    cooldown_rounds: u8,
}

impl StabilityGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a period sample; a jump beyond tolerance restarts the cool-down.
    pub fn on_period_sample(&mut self, period_us: u64) {
        if let Some(previous_us) = self.last_period_us
            && period_us.abs_diff(previous_us) > SPEED_CHANGE_TOLERANCE_US
        {
            if self.cooldown_rounds == 0 {
                tracing::debug!(
                    previous_us,
                    period_us,
                    "speed change detected, inhibiting release"
                );
            }
            self.cooldown_rounds = COOLDOWN_ROUNDS;
        }
        self.last_period_us = Some(period_us);
    }

    /// Count down one full round of cool-down.
    pub fn on_round_complete(&mut self) {
        self.cooldown_rounds = self.cooldown_rounds.saturating_sub(1);
    }

    pub fn is_inhibited(&self) -> bool {
        self.cooldown_rounds != 0
    }

    pub fn cooldown_rounds(&self) -> u8 {
        self.cooldown_rounds
    }

    pub fn last_period_us(&self) -> Option<u64> {
        self.last_period_us
    }
}

impl InhibitionSource for StabilityGate {
    fn is_inhibited(&self) -> bool {
        StabilityGate::is_inhibited(self)
    }
}

impl InhibitionSource for bool {
    fn is_inhibited(&self) -> bool {
        *self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sample_only_sets_baseline() {
        let mut gate = StabilityGate::new();
        gate.on_period_sample(1_000_000);
        assert!(!gate.is_inhibited());
        assert_eq!(gate.last_period_us(), Some(1_000_000));
    }

    #[test]
    fn round_complete_never_underflows() {
        let mut gate = StabilityGate::new();
        gate.on_round_complete();
        assert_eq!(gate.cooldown_rounds(), 0);
    }

    #[test]
    fn boundary_difference_is_tolerated() {
        let mut gate = StabilityGate::new();
        gate.on_period_sample(100_000);
        gate.on_period_sample(100_000 + SPEED_CHANGE_TOLERANCE_US);
        assert!(!gate.is_inhibited());
        gate.on_period_sample(100_000 + SPEED_CHANGE_TOLERANCE_US - 10_001);
        assert!(gate.is_inhibited());
    }
}
