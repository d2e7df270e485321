//! Simulated turntable, sensors, trigger and actuator.
//!
//! Everything runs on a shared `ManualClock`, so a whole release cycle can
//! be replayed deterministically in microseconds of CPU time.

use std::cell::RefCell;
use std::rc::Rc;

use dropper_traits::clock::ManualClock;
use dropper_traits::{Actuator, ActuatorPosition, DigitalInput};

/// Next-round period as a function of the current one.
pub type PeriodModel = Box<dyn Fn(u64) -> u64>;

/// One-off speed change: from the first round starting at or after `at_us`,
/// the round period is multiplied by `factor`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Disturbance {
    pub at_us: u64,
    pub factor: f64,
}

/// Light-sensor cycles per round.
pub const LIGHT_CYCLES_PER_ROUND: u32 = 6;

/// A coasting turntable.
///
/// The hole passes the release point at every round boundary, which is also
/// where the hall sensor goes from high to low (high during the second half
/// of a round). The light sensor toggles `2 * LIGHT_CYCLES_PER_ROUND` times
/// per round; segment lengths ramp linearly towards the next round's period
/// so consecutive samples change smoothly as the table slows down.
pub struct SimTurntable {
    model: PeriodModel,
    round_start_us: u64,
    period_us: u64,
    next_period_us: u64,
    stop_above_us: u64,
    disturbance: Option<Disturbance>,
    passages: Vec<u64>,
    stopped: bool,
}

impl core::fmt::Debug for SimTurntable {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SimTurntable")
            .field("round_start_us", &self.round_start_us)
            .field("period_us", &self.period_us)
            .field("stopped", &self.stopped)
            .finish()
    }
}

impl SimTurntable {
    /// First round starts at t = 0 with `initial_period_us`. Rounds slower
    /// than `stop_above_us` mean the table has stopped.
    pub fn new(model: PeriodModel, initial_period_us: u64, stop_above_us: u64) -> Self {
        let period_us = initial_period_us.max(1);
        let next_period_us = model(period_us);
        Self {
            model,
            round_start_us: 0,
            period_us,
            next_period_us,
            stop_above_us,
            disturbance: None,
            passages: vec![0],
            stopped: false,
        }
    }

    pub fn with_disturbance(mut self, disturbance: Disturbance) -> Self {
        self.disturbance = Some(disturbance);
        self
    }

    /// Roll the simulation forward to `now_us`. Time must not go backwards.
    pub fn advance_to(&mut self, now_us: u64) {
        while !self.stopped && now_us >= self.round_start_us + self.period_us {
            self.round_start_us += self.period_us;
            self.passages.push(self.round_start_us);
            self.period_us = self.next_period_us;
            if let Some(d) = self.disturbance
                && self.round_start_us >= d.at_us
            {
                self.period_us = ((self.period_us as f64) * d.factor).max(1.0) as u64;
                self.disturbance = None;
                tracing::debug!(at_us = self.round_start_us, period_us = self.period_us, "disturbance");
            }
            self.next_period_us = (self.model)(self.period_us);
            if self.period_us > self.stop_above_us {
                self.stopped = true;
                tracing::debug!(at_us = self.round_start_us, "turntable stopped");
            }
        }
    }

    fn position_us(&self, now_us: u64) -> Option<u64> {
        if self.stopped {
            return None;
        }
        Some(now_us.saturating_sub(self.round_start_us).min(self.period_us - 1))
    }

    pub fn hall_level(&self, now_us: u64) -> bool {
        self.position_us(now_us)
            .is_some_and(|pos| pos * 2 >= self.period_us)
    }

    pub fn light_level(&self, now_us: u64) -> bool {
        let Some(pos) = self.position_us(now_us) else {
            return false;
        };
        let segments = i64::from(2 * LIGHT_CYCLES_PER_ROUND);
        let p = self.period_us as i64;
        let slope = self.next_period_us as i64 - p;
        let mid = (segments - 1) as f64 / 2.0;
        let mut end = 0.0f64;
        for i in 0..segments {
            let len = p as f64 / segments as f64
                + (i as f64 - mid) * slope as f64 / (segments * segments) as f64;
            end += len;
            if (pos as f64) < end {
                return i % 2 == 1;
            }
        }
        false
    }

    /// Times at which the hole passed the release point so far.
    pub fn passages(&self) -> &[u64] {
        &self.passages
    }

    /// Passage closest to `t_us`, and the signed offset `t_us - passage`.
    pub fn nearest_passage(&self, t_us: u64) -> Option<(u64, i64)> {
        self.passages
            .iter()
            .map(|&p| (p, t_us as i64 - p as i64))
            .min_by_key(|(_, off)| off.unsigned_abs())
    }

    pub fn period_us(&self) -> u64 {
        self.period_us
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

/// Which turntable sensor a `SimInput` reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimChannel {
    Hall,
    Light,
}

/// A sensor line of a shared `SimTurntable`.
pub struct SimInput {
    table: Rc<RefCell<SimTurntable>>,
    clock: ManualClock,
    channel: SimChannel,
}

impl SimInput {
    pub fn new(table: Rc<RefCell<SimTurntable>>, clock: ManualClock, channel: SimChannel) -> Self {
        Self {
            table,
            clock,
            channel,
        }
    }
}

impl DigitalInput for SimInput {
    fn is_high(&mut self) -> bool {
        let now = self.clock.elapsed_us();
        let mut table = self.table.borrow_mut();
        table.advance_to(now);
        match self.channel {
            SimChannel::Hall => table.hall_level(now),
            SimChannel::Light => table.light_level(now),
        }
    }
}

/// Trigger button held during `[from_us, until_us)`.
#[derive(Debug, Clone)]
pub struct SimTrigger {
    clock: ManualClock,
    from_us: u64,
    until_us: u64,
}

impl SimTrigger {
    pub fn new(clock: ManualClock, from_us: u64, until_us: u64) -> Self {
        Self {
            clock,
            from_us,
            until_us,
        }
    }
}

impl DigitalInput for SimTrigger {
    fn is_high(&mut self) -> bool {
        let now = self.clock.elapsed_us();
        (self.from_us..self.until_us).contains(&now)
    }
}

/// Actuator that timestamps every command. Clones share one log.
#[derive(Debug, Clone)]
pub struct SimActuator {
    clock: ManualClock,
    log: Rc<RefCell<Vec<(u64, ActuatorPosition)>>>,
}

impl SimActuator {
    pub fn new(clock: ManualClock) -> Self {
        Self {
            clock,
            log: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn commands(&self) -> Vec<(u64, ActuatorPosition)> {
        self.log.borrow().clone()
    }

    /// Timestamps of every release command.
    pub fn releases(&self) -> Vec<u64> {
        self.log
            .borrow()
            .iter()
            .filter(|(_, p)| *p == ActuatorPosition::Released)
            .map(|(t, _)| *t)
            .collect()
    }
}

impl Actuator for SimActuator {
    fn set_position(
        &mut self,
        position: ActuatorPosition,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let now = self.clock.elapsed_us();
        tracing::debug!(t_us = now, ?position, "actuator (simulated)");
        self.log.borrow_mut().push((now, position));
        Ok(())
    }
}
