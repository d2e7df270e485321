//! Host wiring: sensors in, one sequencer tick out.
//!
//! The light sensor gives several period samples per round and feeds the
//! stability gate. The hall sensor marks round boundaries at its high-to-low
//! transition; its period and the boundary time are the release calculation
//! inputs, and each boundary counts down the gate's cool-down. The boundary
//! time comes from the edge, not the hall monitor, so half-cycle hall
//! measurement still counts elapsed time from the passage.

use std::cell::Cell;
use std::rc::Rc;

use dropper_traits::{Actuator, DigitalInput};

use crate::config::MonitorCfg;
use crate::edge::EdgeTrigger;
use crate::error::Result;
use crate::monitor::{PeriodMonitor, RoundSnapshot};
use crate::sequencer::{ReleaseSequencer, Stage, TickStatus};
use crate::stability::StabilityGate;

type RoundAction = Box<dyn FnMut()>;

pub struct DropController<A: Actuator> {
    pub(crate) light: PeriodMonitor,
    pub(crate) hall: PeriodMonitor,
    pub(crate) round_edge: EdgeTrigger<RoundAction>,
    pub(crate) pending_rounds: Rc<Cell<u32>>,
    /// Time of the last round boundary; zero before the first.
    pub(crate) round_start_us: u64,
    /// Whether the round edge has been seeded with a real hall level.
    pub(crate) seeded: bool,
    pub(crate) gate: StabilityGate,
    pub(crate) sequencer: ReleaseSequencer<A>,
    pub(crate) rounds_completed: u64,
}

impl<A: Actuator> core::fmt::Debug for DropController<A> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DropController")
            .field("stage", &self.sequencer.stage())
            .field("hall_period_us", &self.hall.period_us())
            .field("inhibited", &self.gate.is_inhibited())
            .field("rounds_completed", &self.rounds_completed)
            .finish()
    }
}

impl<A: Actuator> DropController<A> {
    pub(crate) fn assemble(monitor: &MonitorCfg, sequencer: ReleaseSequencer<A>) -> Self {
        let pending_rounds = Rc::new(Cell::new(0u32));
        let counter = Rc::clone(&pending_rounds);
        let action: RoundAction = Box::new(move || counter.set(counter.get().saturating_add(1)));
        Self {
            light: PeriodMonitor::new(monitor.light_factor, monitor.light_half_cycles),
            hall: PeriodMonitor::new(monitor.hall_factor, monitor.hall_half_cycles),
            round_edge: EdgeTrigger::new(action),
            pending_rounds,
            round_start_us: 0,
            seeded: false,
            gate: StabilityGate::new(),
            sequencer,
            rounds_completed: 0,
        }
    }

    /// One host-loop iteration with already sampled levels.
    pub fn poll(&mut self, light: bool, hall: bool, trigger: bool) -> Result<TickStatus> {
        let now = self.sequencer.now_us();

        if let Some(period_us) = self.light.observe(light, now) {
            self.gate.on_period_sample(period_us);
        }
        if let Some(period_us) = self.hall.observe(hall, now) {
            tracing::debug!(period_us, "round period");
        }
        // Round boundary is the hall high-to-low transition.
        if !self.seeded {
            self.round_edge.seed(!hall);
            self.seeded = true;
        }
        self.round_edge.observe(!hall);
        let rounds = self.pending_rounds.replace(0);
        if rounds > 0 {
            self.round_start_us = now;
        }
        for _ in 0..rounds {
            self.gate.on_round_complete();
            self.rounds_completed = self.rounds_completed.saturating_add(1);
        }

        let snap = self.round_snapshot_at(now);
        self.sequencer.tick_at(now, &snap, trigger, &self.gate)
    }

    /// Calculator inputs right now: hall period and time since the last boundary.
    pub fn round_snapshot(&self) -> RoundSnapshot {
        self.round_snapshot_at(self.sequencer.now_us())
    }

    fn round_snapshot_at(&self, now_us: u64) -> RoundSnapshot {
        RoundSnapshot {
            period_us: self.hall.period_us(),
            elapsed_us: now_us.saturating_sub(self.round_start_us),
        }
    }

    /// One host-loop iteration reading the inputs directly.
    pub fn poll_inputs<L, H, T>(&mut self, light: &mut L, hall: &mut H, trigger: &mut T) -> Result<TickStatus>
    where
        L: DigitalInput + ?Sized,
        H: DigitalInput + ?Sized,
        T: DigitalInput + ?Sized,
    {
        let (l, h, t) = (light.is_high(), hall.is_high(), trigger.is_high());
        self.poll(l, h, t)
    }

    pub fn stage(&self) -> Stage {
        self.sequencer.stage()
    }

    pub fn is_inhibited(&self) -> bool {
        self.gate.is_inhibited()
    }

    pub fn gate(&self) -> &StabilityGate {
        &self.gate
    }

    /// Last hall (full round) period; zero until the first round is measured.
    pub fn round_period_us(&self) -> u64 {
        self.hall.period_us()
    }

    /// Last light-sensor derived period.
    pub fn sample_period_us(&self) -> u64 {
        self.light.period_us()
    }

    pub fn rounds_completed(&self) -> u64 {
        self.rounds_completed
    }

    pub fn sequencer(&self) -> &ReleaseSequencer<A> {
        &self.sequencer
    }

    pub fn actuator(&self) -> &A {
        self.sequencer.actuator()
    }

    pub fn now_us(&self) -> u64 {
        self.sequencer.now_us()
    }
}
