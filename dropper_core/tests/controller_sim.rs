use std::cell::RefCell;
use std::rc::Rc;

use dropper_core::timing::FALL_TRANSIT_TIME_US;
use dropper_core::{DropController, MonitorCfg, Stage, TickStatus, build_controller, next_period};
use dropper_hardware::{Disturbance, SimActuator, SimChannel, SimInput, SimTrigger, SimTurntable};
use dropper_traits::clock::ManualClock;
use rstest::rstest;

const TICK_US: u64 = 100;
/// Sampling every 100 us keeps the landing error well under a millisecond.
const MAX_MISS_US: i64 = 1_000;

struct Rig {
    clock: ManualClock,
    table: Rc<RefCell<SimTurntable>>,
    light: SimInput,
    hall: SimInput,
    trigger: SimTrigger,
    actuator: SimActuator,
    controller: DropController<SimActuator>,
    aborted: usize,
}

impl Rig {
    fn new(initial_period_us: u64, trigger: (u64, u64), disturbance: Option<Disturbance>) -> Self {
        let clock = ManualClock::new();
        let mut table = SimTurntable::new(Box::new(next_period), initial_period_us, 8_000_000);
        if let Some(d) = disturbance {
            table = table.with_disturbance(d);
        }
        let table = Rc::new(RefCell::new(table));
        let actuator = SimActuator::new(clock.clone());
        let controller = build_controller(
            actuator.clone(),
            MonitorCfg::default(),
            Some(Box::new(clock.clone())),
        )
        .unwrap();
        Self {
            light: SimInput::new(Rc::clone(&table), clock.clone(), SimChannel::Light),
            hall: SimInput::new(Rc::clone(&table), clock.clone(), SimChannel::Hall),
            trigger: SimTrigger::new(clock.clone(), trigger.0, trigger.1),
            clock,
            table,
            actuator,
            controller,
            aborted: 0,
        }
    }

    fn run_until(&mut self, end_us: u64) {
        while self.clock.elapsed_us() < end_us {
            self.clock.advance_us(TICK_US);
            let status = self
                .controller
                .poll_inputs(&mut self.light, &mut self.hall, &mut self.trigger)
                .unwrap();
            if status == TickStatus::Aborted {
                self.aborted += 1;
            }
        }
    }

    fn landing_misses(&self) -> Vec<i64> {
        let table = self.table.borrow();
        self.actuator
            .releases()
            .iter()
            .map(|&r| {
                let (_, miss) = table
                    .nearest_passage(r + FALL_TRANSIT_TIME_US)
                    .expect("table has passages");
                miss
            })
            .collect()
    }
}

#[rstest]
#[case(150_000, 2_000_000)]
#[case(600_000, 3_000_000)]
#[case(2_500_000, 10_000_000)]
fn triggered_release_lands_on_the_hole(#[case] initial_period_us: u64, #[case] trigger_at: u64) {
    let mut rig = Rig::new(initial_period_us, (trigger_at, trigger_at + 50_000), None);
    rig.run_until(trigger_at + 3 * initial_period_us + 1_000_000);

    let misses = rig.landing_misses();
    assert_eq!(misses.len(), 1, "expected one release, got {misses:?}");
    assert!(misses[0].abs() < MAX_MISS_US, "missed by {} us", misses[0]);
    assert_eq!(rig.aborted, 0);
}

#[test]
fn reaches_idle_armed_after_start_waits() {
    let mut rig = Rig::new(600_000, (u64::MAX - 1, u64::MAX), None);
    rig.run_until(400_000);
    assert_eq!(rig.controller.stage(), Stage::ObjectFalling);
    rig.run_until(700_000);
    assert_eq!(rig.controller.stage(), Stage::IdleArmed);
    rig.run_until(2_000_000);
    assert!(rig.controller.rounds_completed() >= 3);
    assert!(!rig.controller.is_inhibited());
    assert!(rig.actuator.releases().is_empty());
}

#[test]
fn disturbance_aborts_countdown_and_rearms_after_cooldown() {
    let disturbance = Disturbance {
        at_us: 2_500_000,
        factor: 1.2,
    };
    let mut rig = Rig::new(600_000, (3_000_000, 4_600_000), Some(disturbance));

    rig.run_until(3_001_000);
    assert_eq!(rig.controller.stage(), Stage::Countdown);
    rig.run_until(3_200_000);
    assert_eq!(rig.aborted, 1);
    assert!(rig.controller.is_inhibited());
    assert!(rig.actuator.releases().is_empty());

    rig.run_until(7_000_000);
    let releases = rig.actuator.releases();
    assert_eq!(releases.len(), 1, "{releases:?}");
    // Re-armed only after two full rounds at the new speed.
    assert!(releases[0] > 4_400_000, "released at {}", releases[0]);
    let misses = rig.landing_misses();
    assert!(misses[0].abs() < MAX_MISS_US, "missed by {} us", misses[0]);
}

#[test]
fn short_trigger_during_disturbance_is_lost() {
    let disturbance = Disturbance {
        at_us: 2_500_000,
        factor: 1.2,
    };
    let mut rig = Rig::new(600_000, (3_000_000, 3_050_000), Some(disturbance));
    rig.run_until(8_000_000);
    assert_eq!(rig.aborted, 1);
    assert!(rig.actuator.releases().is_empty());
    assert_eq!(rig.controller.stage(), Stage::IdleArmed);
}
