//! Rotation period extrapolation.
//!
//! The turntable coasts and decelerates nonlinearly. The duration of the next
//! round is approximated from the last one by a regression curve fitted to
//! measured round times: a second-order polynomial below 2 s and a
//! fourth-order polynomial from 2 s upwards, where deceleration changes
//! character at low speed.

/// Period at which the high-speed curve hands over to the low-speed curve.
/// The boundary belongs to the low-speed (degree 4) branch.
pub const BRANCH_THRESHOLD_US: u64 = 2_000_000;

/// Coefficients for periods below [`BRANCH_THRESHOLD_US`], highest order first.
pub const FAST_COEFFS: [f64; 3] = [1.28978803947511e-8, 0.9910487474, 2585.5449062138];

/// Coefficients for periods at or above [`BRANCH_THRESHOLD_US`], highest order first.
pub const SLOW_COEFFS: [f64; 5] = [
    3.10525846921924e-21,
    -3.96812534603555e-14,
    2.19266935692185e-7,
    0.5422132849,
    343733.782110879,
];

/// Evaluate the fast-branch polynomial at `x` microseconds.
#[inline]
pub fn fast_curve(x: f64) -> f64 {
    let [a2, a1, a0] = FAST_COEFFS;
    a2 * x.powf(2.0) + a1 * x + a0
}

/// Evaluate the slow-branch polynomial at `x` microseconds.
#[inline]
pub fn slow_curve(x: f64) -> f64 {
    let [a4, a3, a2, a1, a0] = SLOW_COEFFS;
    a4 * x.powf(4.0) + a3 * x.powf(3.0) + a2 * x.powf(2.0) + a1 * x + a0
}

/// Predict the next round period from the last one.
///
/// Pure: the result depends on `period_us` only. The curve value is
/// truncated toward zero to whole microseconds; values outside `u64`
/// saturate. No range checking is done here.
#[inline]
pub fn next_period(period_us: u64) -> u64 {
    let x = period_us as f64;
    let y = if period_us < BRANCH_THRESHOLD_US {
        fast_curve(x)
    } else {
        slow_curve(x)
    };
    y as u64
}

/// Stateless handle over [`next_period`], for callers that want a value to pass around.
#[derive(Debug, Default, Clone, Copy)]
pub struct RotationPeriodExtrapolator;

impl RotationPeriodExtrapolator {
    pub fn next(&self, period_us: u64) -> u64 {
        next_period(period_us)
    }

    /// Successive predicted periods starting after `period_us` (the input itself is not yielded).
    pub fn project(&self, period_us: u64) -> impl Iterator<Item = u64> + use<> {
        std::iter::successors(Some(period_us), |&p| Some(next_period(p))).skip(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_uses_slow_branch() {
        let at = next_period(BRANCH_THRESHOLD_US);
        let expected = slow_curve(BRANCH_THRESHOLD_US as f64);
        assert!((at as f64 - expected).abs() <= 1.0, "{at} vs {expected}");
        let below = next_period(BRANCH_THRESHOLD_US - 1);
        let expected_fast = fast_curve((BRANCH_THRESHOLD_US - 1) as f64);
        assert!((below as f64 - expected_fast).abs() <= 1.0);
    }

    #[test]
    fn fast_branch_reference_value() {
        // 1.28978803947511e-8 * 1e12 + 0.9910487474 * 1e6 + 2585.5449...
        assert_eq!(next_period(1_000_000), 1_006_532);
    }

    #[test]
    fn projection_feeds_back_its_own_output() {
        let ex = RotationPeriodExtrapolator;
        let first: Vec<u64> = ex.project(900_000).take(3).collect();
        assert_eq!(first[0], next_period(900_000));
        assert_eq!(first[1], next_period(first[0]));
        assert_eq!(first[2], next_period(first[1]));
    }

    #[test]
    fn curve_slows_the_turntable_down() {
        for p in [100_000u64, 500_000, 1_500_000, 2_000_000, 4_000_000, 8_000_000] {
            assert!(next_period(p) > p, "period {p} did not grow");
        }
    }
}
