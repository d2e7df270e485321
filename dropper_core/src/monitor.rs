//! Rotation period measurement from sensor transitions.

/// Last round period plus how far into the current round we are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RoundSnapshot {
    pub period_us: u64,
    pub elapsed_us: u64,
}

/// Provides the inputs of a release calculation.
pub trait PeriodSource {
    fn snapshot(&self, now_us: u64) -> RoundSnapshot;
}

impl PeriodSource for RoundSnapshot {
    fn snapshot(&self, _now_us: u64) -> RoundSnapshot {
        *self
    }
}

/// Measures the time between transitions of a sensor line.
///
/// Full-cycle mode measures high-to-low to high-to-low. Half-cycle mode
/// measures every transition and should only be used for a duty cycle near
/// 50 %. Raw durations are multiplied by `factor` so the result is always
/// a full-round period.
#[derive(Debug, Clone)]
pub struct PeriodMonitor {
    factor: u32,
    half_cycles: bool,
    last_level: bool,
    last_measurement_us: u64,
    period_us: u64,
}

impl PeriodMonitor {
    pub fn new(factor: u32, half_cycles: bool) -> Self {
        Self {
            factor: factor.max(1),
            half_cycles,
            last_level: false,
            last_measurement_us: 0,
            period_us: 0,
        }
    }

    /// Full-cycle monitor for a sensor with one cycle per round.
    pub fn per_round() -> Self {
        Self::new(1, false)
    }

    /// Feed a sampled level; returns the new period when a measurement completes.
    pub fn observe(&mut self, level: bool, now_us: u64) -> Option<u64> {
        if level == self.last_level {
            return None;
        }
        self.last_level = level;
        if !(self.half_cycles || !level) {
            return None;
        }
        let raw = now_us.saturating_sub(self.last_measurement_us);
        self.period_us = raw.saturating_mul(u64::from(self.factor));
        self.last_measurement_us = now_us;
        tracing::trace!(period_us = self.period_us, "period measured");
        Some(self.period_us)
    }

    /// Last measured period; zero before the first measurement.
    pub fn period_us(&self) -> u64 {
        self.period_us
    }

    /// Timestamp of the last measurement.
    pub fn last_measurement_us(&self) -> u64 {
        self.last_measurement_us
    }

    pub fn elapsed_us(&self, now_us: u64) -> u64 {
        now_us.saturating_sub(self.last_measurement_us)
    }
}

impl PeriodSource for PeriodMonitor {
    fn snapshot(&self, now_us: u64) -> RoundSnapshot {
        RoundSnapshot {
            period_us: self.period_us,
            elapsed_us: self.elapsed_us(now_us),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_cycle_measures_on_falling_edge_only() {
        let mut m = PeriodMonitor::per_round();
        assert_eq!(m.observe(true, 100), None);
        assert_eq!(m.observe(false, 600), Some(600));
        assert_eq!(m.observe(true, 900), None);
        assert_eq!(m.observe(false, 1_600), Some(1_000));
        assert_eq!(m.elapsed_us(1_700), 100);
    }

    #[test]
    fn half_cycles_are_scaled_by_factor() {
        let mut m = PeriodMonitor::new(12, true);
        m.observe(true, 1_000);
        assert_eq!(m.observe(false, 1_500), Some(6_000));
        assert_eq!(m.period_us(), 6_000);
    }

    #[test]
    fn repeated_levels_are_ignored() {
        let mut m = PeriodMonitor::new(2, true);
        assert_eq!(m.observe(false, 10), None);
        assert_eq!(m.observe(true, 20), Some(40));
        assert_eq!(m.observe(true, 30), None);
        assert_eq!(m.snapshot(50).elapsed_us, 30);
    }
}
