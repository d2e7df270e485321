//! Release wait calculation.
//!
//! Walks the extrapolated round periods forward from "now" until enough time
//! has accumulated for the object to fall, then returns the surplus: the time
//! to wait before releasing so the fall ends exactly as the hole arrives.

use crate::error::NotComputable;
use crate::extrapolator::next_period;
use crate::timing::{FALL_TRANSIT_TIME_US, MAX_EXTRAPOLATION_STEPS, MAX_VALID_PERIOD_US};

/// Outcome of a successful calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseWait {
    /// Microseconds to wait from now before releasing.
    pub wait_us: u64,
    /// Number of extrapolated periods consumed (hole passages looked ahead).
    pub rounds: u32,
}

/// Running extrapolation cursor; lives for one calculation only.
#[derive(Debug, Clone, Copy)]
struct PredictionState {
    period_us: u64,
    /// Time until the hole reaches the release point, net of time already
    /// elapsed in the current round. Starts negative.
    accumulated_us: i64,
}

#[derive(Debug, Clone, Copy)]
pub struct ReleaseTimeCalculator {
    max_steps: u32,
}

impl Default for ReleaseTimeCalculator {
    fn default() -> Self {
        Self {
            max_steps: MAX_EXTRAPOLATION_STEPS,
        }
    }
}

impl ReleaseTimeCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different iteration cap (at least 1).
    pub fn with_max_steps(max_steps: u32) -> Self {
        Self {
            max_steps: max_steps.max(1),
        }
    }

    /// Compute the wait before release.
    ///
    /// `last_period_us` is the duration of the last completed round,
    /// `elapsed_in_round_us` the time since the hole last passed the release point.
    pub fn compute(
        &self,
        last_period_us: u64,
        elapsed_in_round_us: u64,
    ) -> Result<ReleaseWait, NotComputable> {
        if last_period_us > MAX_VALID_PERIOD_US {
            return Err(NotComputable::PeriodOutOfRange {
                period_us: last_period_us,
            });
        }

        let fall = FALL_TRANSIT_TIME_US as i64;
        let mut state = PredictionState {
            period_us: last_period_us,
            accumulated_us: -i64::try_from(elapsed_in_round_us).unwrap_or(i64::MAX),
        };

        for step in 1..=self.max_steps {
            state.period_us = next_period(state.period_us);
            state.accumulated_us = state
                .accumulated_us
                .saturating_add(i64::try_from(state.period_us).unwrap_or(i64::MAX));
            tracing::trace!(
                step,
                next_period_us = state.period_us,
                accumulated_us = state.accumulated_us,
                "extrapolated round"
            );

            if state.accumulated_us >= fall {
                let wait_us = (state.accumulated_us - fall) as u64;
                tracing::debug!(
                    last_period_us,
                    elapsed_in_round_us,
                    rounds = step,
                    wait_us,
                    "release wait computed"
                );
                return Ok(ReleaseWait {
                    wait_us,
                    rounds: step,
                });
            }
        }

        Err(NotComputable::NoConvergence {
            steps: self.max_steps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stopped_turntable_is_not_computable() {
        let calc = ReleaseTimeCalculator::new();
        assert_eq!(
            calc.compute(MAX_VALID_PERIOD_US + 1, 0),
            Err(NotComputable::PeriodOutOfRange {
                period_us: MAX_VALID_PERIOD_US + 1
            })
        );
    }

    #[test]
    fn single_round_is_enough_for_slow_turntable() {
        // Next round ~1.0065 s, so the hole passes once more before the fall completes.
        let calc = ReleaseTimeCalculator::new();
        let w = calc.compute(1_000_000, 100_000).unwrap();
        assert_eq!(w.rounds, 1);
        assert_eq!(w.wait_us, 1_006_532 - 100_000 - FALL_TRANSIT_TIME_US);
    }

    #[test]
    fn fast_turntable_looks_several_rounds_ahead() {
        let calc = ReleaseTimeCalculator::new();
        let w = calc.compute(100_000, 0).unwrap();
        assert!(w.rounds >= 4, "rounds = {}", w.rounds);
    }

    #[test]
    fn exhausted_cap_is_not_computable() {
        // Tiny periods need many rounds to cover the fall transit time.
        let calc = ReleaseTimeCalculator::with_max_steps(2);
        assert_eq!(
            calc.compute(1_000, 0),
            Err(NotComputable::NoConvergence { steps: 2 })
        );
    }
}
