#![no_main]
use dropper_core::timing::{FALL_TRANSIT_TIME_US, MAX_VALID_PERIOD_US};
use dropper_core::{NotComputable, ReleaseTimeCalculator, RotationPeriodExtrapolator};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (u64, u64)| {
    let (period, elapsed) = input;
    match ReleaseTimeCalculator::new().compute(period, elapsed) {
        Ok(w) => {
            assert!(period <= MAX_VALID_PERIOD_US);
            let periods: Vec<u64> = RotationPeriodExtrapolator
                .project(period)
                .take(w.rounds as usize)
                .collect();
            // Accumulation saturates near i64::MAX; only exact sums are checked.
            if elapsed > i64::MAX as u64 || periods.iter().any(|&p| p > i64::MAX as u64 / 2) {
                return;
            }
            let projected: u128 = periods.into_iter().map(u128::from).sum();
            assert_eq!(
                projected,
                u128::from(elapsed) + u128::from(w.wait_us) + u128::from(FALL_TRANSIT_TIME_US)
            );
        }
        Err(NotComputable::PeriodOutOfRange { period_us }) => {
            assert_eq!(period_us, period);
            assert!(period > MAX_VALID_PERIOD_US);
        }
        Err(NotComputable::NoConvergence { .. }) => {}
    }
});
