//! `predict`: one release calculation from the command line.

use dropper_core::timing::FALL_TRANSIT_TIME_US;
use dropper_core::{ReleaseTimeCalculator, RotationPeriodExtrapolator};
use serde_json::json;

pub fn print_prediction(period_us: u64, elapsed_us: u64, json: bool) {
    match ReleaseTimeCalculator::new().compute(period_us, elapsed_us) {
        Ok(w) => {
            let projected: Vec<u64> = RotationPeriodExtrapolator
                .project(period_us)
                .take(w.rounds as usize)
                .collect();
            if json {
                println!(
                    "{}",
                    json!({
                        "period_us": period_us,
                        "elapsed_us": elapsed_us,
                        "wait_us": w.wait_us,
                        "rounds": w.rounds,
                        "landing_in_us": w.wait_us + FALL_TRANSIT_TIME_US,
                        "projected_periods_us": projected,
                        "not_computable": serde_json::Value::Null,
                    })
                );
            } else {
                println!(
                    "release in {} us, lands {} us from now ({} round(s) ahead)",
                    w.wait_us,
                    w.wait_us + FALL_TRANSIT_TIME_US,
                    w.rounds
                );
                for (i, p) in projected.iter().enumerate() {
                    println!("  round {}: {p} us", i + 1);
                }
            }
        }
        Err(e) => {
            if json {
                println!(
                    "{}",
                    json!({
                        "period_us": period_us,
                        "elapsed_us": elapsed_us,
                        "wait_us": serde_json::Value::Null,
                        "not_computable": e.to_string(),
                    })
                );
            } else {
                println!("not computable: {e}");
            }
        }
    }
}
