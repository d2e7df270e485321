//! Release state machine.
//!
//! Single-cycle, non-blocking: every wait is a deadline checked on the next
//! tick, so `tick` must be called promptly and repeatedly. Timing jitter is
//! bounded by the tick interval.

use std::sync::Arc;
use std::time::Instant;

use dropper_traits::clock::Clock;
use dropper_traits::{Actuator, ActuatorPosition};
use eyre::WrapErr;

use crate::error::{NotComputable, Result};
use crate::hw_error::map_hw_error;
use crate::monitor::PeriodSource;
use crate::release_time::ReleaseTimeCalculator;
use crate::stability::InhibitionSource;
use crate::timing::{FALL_THROUGH_WAIT_US, PRE_ARM_WAIT_US, RELEASE_HOLD_US};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Close the mechanism so the next object can drop in (initial stage).
    /// Closes on the first tick, without waiting.
    AwaitingPassage,
    /// Object is dropping into the chamber; move to pre-armed afterwards.
    ObjectFalling,
    /// Actuator moving to pre-armed.
    PreArmed,
    /// Waiting for the trigger.
    IdleArmed,
    /// Release scheduled; aborted if the speed becomes unstable.
    Countdown,
    /// Actuator released; hold before closing again.
    Releasing,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::AwaitingPassage => "awaiting_passage",
            Stage::ObjectFalling => "object_falling",
            Stage::PreArmed => "pre_armed",
            Stage::IdleArmed => "idle_armed",
            Stage::Countdown => "countdown",
            Stage::Releasing => "releasing",
        }
    }
}

impl core::fmt::Display for Stage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickStatus {
    /// Nothing changed.
    Waiting,
    /// Moved to the given stage.
    Advanced(Stage),
    /// Countdown cancelled because release became inhibited; back to `IdleArmed`.
    Aborted,
    /// Trigger seen but no release could be scheduled; still `IdleArmed`.
    Skipped(NotComputable),
}

pub struct ReleaseSequencer<A: Actuator> {
    actuator: A,
    clock: Arc<dyn Clock + Send + Sync>,
    epoch: Instant,
    calculator: ReleaseTimeCalculator,
    stage: Stage,
    /// Microseconds since `epoch` at which the current timed wait ends.
    deadline_us: u64,
}

impl<A: Actuator> core::fmt::Debug for ReleaseSequencer<A> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ReleaseSequencer")
            .field("stage", &self.stage)
            .field("deadline_us", &self.deadline_us)
            .finish()
    }
}

impl<A: Actuator> ReleaseSequencer<A> {
    /// Create a sequencer in `AwaitingPassage`; the clock epoch is "now".
    pub fn new(actuator: A, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        let epoch = clock.now();
        Self {
            actuator,
            clock,
            epoch,
            calculator: ReleaseTimeCalculator::new(),
            stage: Stage::AwaitingPassage,
            deadline_us: 0,
        }
    }

    pub fn with_calculator(mut self, calculator: ReleaseTimeCalculator) -> Self {
        self.calculator = calculator;
        self
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn deadline_us(&self) -> u64 {
        self.deadline_us
    }

    /// Microseconds since the sequencer's epoch.
    pub fn now_us(&self) -> u64 {
        self.clock.us_since(self.epoch)
    }

    pub fn epoch(&self) -> Instant {
        self.epoch
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    pub fn actuator_mut(&mut self) -> &mut A {
        &mut self.actuator
    }

    /// Read the clock and advance.
    pub fn tick<P, I>(&mut self, periods: &P, trigger: bool, inhibition: &I) -> Result<TickStatus>
    where
        P: PeriodSource + ?Sized,
        I: InhibitionSource + ?Sized,
    {
        let now = self.now_us();
        self.tick_at(now, periods, trigger, inhibition)
    }

    /// Advance using a clock reading taken by the caller.
    pub fn tick_at<P, I>(
        &mut self,
        now_us: u64,
        periods: &P,
        trigger: bool,
        inhibition: &I,
    ) -> Result<TickStatus>
    where
        P: PeriodSource + ?Sized,
        I: InhibitionSource + ?Sized,
    {
        match self.stage {
            Stage::AwaitingPassage => {
                self.command(ActuatorPosition::Closed)?;
                self.wait_from(now_us, FALL_THROUGH_WAIT_US);
                Ok(self.enter(Stage::ObjectFalling))
            }
            Stage::ObjectFalling => {
                if !self.wait_done(now_us) {
                    return Ok(TickStatus::Waiting);
                }
                self.command(ActuatorPosition::PreArmed)?;
                self.wait_from(now_us, PRE_ARM_WAIT_US);
                Ok(self.enter(Stage::PreArmed))
            }
            Stage::PreArmed => {
                if !self.wait_done(now_us) {
                    return Ok(TickStatus::Waiting);
                }
                Ok(self.enter(Stage::IdleArmed))
            }
            Stage::IdleArmed => {
                if !trigger || inhibition.is_inhibited() {
                    return Ok(TickStatus::Waiting);
                }
                let snap = periods.snapshot(now_us);
                match self.calculator.compute(snap.period_us, snap.elapsed_us) {
                    Ok(w) => {
                        self.wait_from(now_us, w.wait_us);
                        tracing::info!(
                            period_us = snap.period_us,
                            elapsed_us = snap.elapsed_us,
                            wait_us = w.wait_us,
                            rounds = w.rounds,
                            "release scheduled"
                        );
                        Ok(self.enter(Stage::Countdown))
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "not releasing");
                        Ok(TickStatus::Skipped(e))
                    }
                }
            }
            Stage::Countdown => {
                if inhibition.is_inhibited() {
                    tracing::warn!(
                        remaining_us = self.deadline_us.saturating_sub(now_us),
                        "speed unstable, release aborted"
                    );
                    self.stage = Stage::IdleArmed;
                    return Ok(TickStatus::Aborted);
                }
                if !self.wait_done(now_us) {
                    return Ok(TickStatus::Waiting);
                }
                self.command(ActuatorPosition::Released)?;
                self.wait_from(now_us, RELEASE_HOLD_US);
                Ok(self.enter(Stage::Releasing))
            }
            Stage::Releasing => {
                if !self.wait_done(now_us) {
                    return Ok(TickStatus::Waiting);
                }
                Ok(self.enter(Stage::AwaitingPassage))
            }
        }
    }

    // ── Private helpers ─────────────────────────────────────────────────────

    fn enter(&mut self, next: Stage) -> TickStatus {
        tracing::info!(from = %self.stage, to = %next, deadline_us = self.deadline_us, "stage");
        self.stage = next;
        TickStatus::Advanced(next)
    }

    #[inline]
    fn wait_from(&mut self, now_us: u64, us: u64) {
        self.deadline_us = now_us.saturating_add(us);
    }

    #[inline]
    fn wait_done(&self, now_us: u64) -> bool {
        now_us >= self.deadline_us
    }

    fn command(&mut self, position: ActuatorPosition) -> Result<()> {
        self.actuator
            .set_position(position)
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err_with(|| format!("actuator {position:?}"))
    }
}
