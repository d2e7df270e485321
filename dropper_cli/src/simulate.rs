//! `simulate`: a full release cycle against the simulated turntable.

use std::cell::RefCell;
use std::rc::Rc;

use dropper_core::timing::{FALL_TRANSIT_TIME_US, MAX_VALID_PERIOD_US};
use dropper_core::{MonitorCfg, TickStatus, build_controller, next_period};
use dropper_hardware::{Disturbance, SimActuator, SimChannel, SimInput, SimTrigger, SimTurntable};
use dropper_traits::clock::ManualClock;
use serde_json::json;

#[derive(Debug, Clone)]
pub struct SimParams {
    pub initial_period_us: u64,
    pub duration_us: u64,
    pub trigger_at_us: u64,
    pub trigger_hold_us: u64,
    pub tick_us: u64,
    pub disturbance: Option<Disturbance>,
}

impl SimParams {
    pub fn from_config(cfg: &dropper_config::SimulationCfg) -> Self {
        Self {
            initial_period_us: cfg.initial_period_us,
            duration_us: cfg.duration_ms.saturating_mul(1_000),
            trigger_at_us: cfg.trigger_at_ms.saturating_mul(1_000),
            trigger_hold_us: cfg.trigger_hold_ms.saturating_mul(1_000),
            tick_us: cfg.tick_us,
            disturbance: cfg.disturbance.map(|d| Disturbance {
                at_us: d.at_ms.saturating_mul(1_000),
                factor: d.factor,
            }),
        }
    }

    /// Re-check values that command line overrides may have changed.
    pub fn check(&self) -> eyre::Result<()> {
        use dropper_core::DropperError;
        let bad = |msg: &str| eyre::Report::new(DropperError::Config(msg.to_string()));
        if self.initial_period_us == 0 || self.initial_period_us > MAX_VALID_PERIOD_US {
            return Err(bad("initial period must be in (0, 8000000] us"));
        }
        if self.duration_us == 0 {
            return Err(bad("duration must be > 0"));
        }
        if self.trigger_hold_us == 0 {
            return Err(bad("trigger hold time must be > 0"));
        }
        if let Some(d) = self.disturbance
            && !(d.factor.is_finite() && d.factor > 0.0)
        {
            return Err(bad("disturbance factor must be finite and > 0"));
        }
        Ok(())
    }
}

/// One release and where it landed relative to the hole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseReport {
    pub release_us: u64,
    pub landing_us: u64,
    pub passage_us: u64,
    /// Landing minus passage: positive lands after the hole passed.
    pub miss_us: i64,
}

#[derive(Debug, Clone, Default)]
pub struct SimSummary {
    pub releases: Vec<ReleaseReport>,
    pub aborted: u32,
    pub skipped: u32,
    pub rounds: u64,
    pub polls: u64,
    pub stopped: bool,
}

pub fn run_simulation(monitor: MonitorCfg, params: &SimParams) -> eyre::Result<SimSummary> {
    let clock = ManualClock::new();
    let mut table = SimTurntable::new(
        Box::new(next_period),
        params.initial_period_us,
        MAX_VALID_PERIOD_US,
    );
    if let Some(d) = params.disturbance {
        table = table.with_disturbance(d);
    }
    let table = Rc::new(RefCell::new(table));

    let mut light = SimInput::new(Rc::clone(&table), clock.clone(), SimChannel::Light);
    let mut hall = SimInput::new(Rc::clone(&table), clock.clone(), SimChannel::Hall);
    let mut trigger = SimTrigger::new(
        clock.clone(),
        params.trigger_at_us,
        params.trigger_at_us.saturating_add(params.trigger_hold_us),
    );
    let actuator = SimActuator::new(clock.clone());
    let mut controller = build_controller(actuator.clone(), monitor, Some(Box::new(clock.clone())))?;

    tracing::info!(
        initial_period_us = params.initial_period_us,
        duration_us = params.duration_us,
        trigger_at_us = params.trigger_at_us,
        disturbance = ?params.disturbance,
        "simulation start"
    );

    let mut summary = SimSummary::default();
    let tick = params.tick_us.max(1);
    while clock.elapsed_us() < params.duration_us {
        clock.advance_us(tick);
        match controller.poll_inputs(&mut light, &mut hall, &mut trigger)? {
            TickStatus::Aborted => summary.aborted += 1,
            TickStatus::Skipped(_) => summary.skipped += 1,
            TickStatus::Waiting | TickStatus::Advanced(_) => {}
        }
        summary.polls += 1;
    }
    summary.rounds = controller.rounds_completed();

    let mut table = table.borrow_mut();
    for release_us in actuator.releases() {
        let landing_us = release_us + FALL_TRANSIT_TIME_US;
        // Make sure the passage after the landing exists.
        let horizon = landing_us.saturating_add(table.period_us());
        table.advance_to(horizon);
        if let Some((passage_us, miss_us)) = table.nearest_passage(landing_us) {
            summary.releases.push(ReleaseReport {
                release_us,
                landing_us,
                passage_us,
                miss_us,
            });
        }
    }
    summary.stopped = table.is_stopped();
    tracing::info!(
        releases = summary.releases.len(),
        aborted = summary.aborted,
        skipped = summary.skipped,
        "simulation done"
    );
    Ok(summary)
}

fn ms(us: u64) -> f64 {
    us as f64 / 1_000.0
}

pub fn print_summary(summary: &SimSummary, json: bool) {
    for (i, r) in summary.releases.iter().enumerate() {
        if json {
            println!(
                "{}",
                json!({
                    "event": "release",
                    "release_us": r.release_us,
                    "landing_us": r.landing_us,
                    "passage_us": r.passage_us,
                    "miss_us": r.miss_us,
                })
            );
        } else {
            println!(
                "release #{} at {:.3} ms, lands {:.3} ms, hole at {:.3} ms, miss {:+} us",
                i + 1,
                ms(r.release_us),
                ms(r.landing_us),
                ms(r.passage_us),
                r.miss_us
            );
        }
    }
    if json {
        println!(
            "{}",
            json!({
                "event": "summary",
                "releases": summary.releases.len(),
                "aborted": summary.aborted,
                "skipped": summary.skipped,
                "rounds": summary.rounds,
                "polls": summary.polls,
                "stopped": summary.stopped,
            })
        );
    } else {
        println!(
            "summary: {} release(s), {} aborted, {} skipped, {} rounds{}",
            summary.releases.len(),
            summary.aborted,
            summary.skipped,
            summary.rounds,
            if summary.stopped { ", turntable stopped" } else { "" }
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> SimParams {
        SimParams::from_config(&dropper_config::SimulationCfg::default())
    }

    #[test]
    fn default_scenario_hits_the_hole() {
        let mut p = params();
        p.duration_us = 6_000_000;
        let s = run_simulation(MonitorCfg::default(), &p).unwrap();
        assert_eq!(s.releases.len(), 1);
        assert!(s.releases[0].miss_us.abs() < 1_000, "{:?}", s.releases[0]);
        assert_eq!(s.aborted, 0);
        assert!(!s.stopped);
    }

    #[test]
    fn trigger_after_the_end_releases_nothing() {
        let mut p = params();
        p.duration_us = 1_000_000;
        p.trigger_at_us = 2_000_000;
        let s = run_simulation(MonitorCfg::default(), &p).unwrap();
        assert!(s.releases.is_empty());
        assert_eq!(s.polls, 10_000);
    }

    #[test]
    fn check_rejects_out_of_range_period() {
        let mut p = params();
        p.initial_period_us = MAX_VALID_PERIOD_US + 1;
        assert!(p.check().is_err());
    }
}
