//! Type-state builder for `DropController` and generic `build_controller` constructor.
//!
//! The builder enforces at compile time that an actuator is provided before
//! `build()` is available. `try_build()` is always available for dynamic checks.

use std::marker::PhantomData;
use std::sync::Arc;

use dropper_traits::Actuator;
use dropper_traits::clock::{Clock, MonotonicClock};

use crate::config::MonitorCfg;
use crate::controller::DropController;
use crate::error::{BuildError, Result};
use crate::release_time::ReleaseTimeCalculator;
use crate::sequencer::ReleaseSequencer;

/// Controller with a boxed actuator, as produced by the builder.
pub type DynDropController = DropController<Box<dyn Actuator>>;

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

/// Builder for `DropController`. All fields are validated on `build()`.
pub struct DropControllerBuilder<A> {
    actuator: Option<Box<dyn Actuator>>,
    monitor: Option<MonitorCfg>,
    clock: Option<Box<dyn Clock + Send + Sync>>,
    calculator: Option<ReleaseTimeCalculator>,
    _a: PhantomData<A>,
}

impl Default for DropControllerBuilder<Missing> {
    fn default() -> Self {
        Self {
            actuator: None,
            monitor: None,
            clock: None,
            calculator: None,
            _a: PhantomData,
        }
    }
}

impl DropController<Box<dyn Actuator>> {
    /// Start building a controller.
    pub fn builder() -> DropControllerBuilder<Missing> {
        DropControllerBuilder::default()
    }
}

/// Validate configuration and construct a controller.
///
/// Single source of truth for validation, shared by the builder and
/// `build_controller()`.
fn validate_and_build<A: Actuator>(
    actuator: A,
    monitor: MonitorCfg,
    clock: Option<Box<dyn Clock + Send + Sync>>,
    calculator: ReleaseTimeCalculator,
) -> Result<DropController<A>> {
    if monitor.light_factor == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "light_factor must be > 0",
        )));
    }
    if monitor.hall_factor == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "hall_factor must be > 0",
        )));
    }

    let clock: Arc<dyn Clock + Send + Sync> = match clock {
        Some(b) => Arc::from(b),
        None => Arc::new(MonotonicClock::new()),
    };
    let sequencer = ReleaseSequencer::new(actuator, clock).with_calculator(calculator);
    Ok(DropController::assemble(&monitor, sequencer))
}

impl<A> DropControllerBuilder<A> {
    /// Fallible build available in any type-state; returns detailed error for missing pieces.
    pub fn try_build(self) -> Result<DynDropController> {
        let actuator = self
            .actuator
            .ok_or_else(|| eyre::Report::new(BuildError::MissingActuator))?;
        validate_and_build(
            actuator,
            self.monitor.unwrap_or_default(),
            self.clock,
            self.calculator.unwrap_or_default(),
        )
    }

    pub fn with_actuator(self, actuator: impl Actuator + 'static) -> DropControllerBuilder<Set> {
        DropControllerBuilder {
            actuator: Some(Box::new(actuator)),
            monitor: self.monitor,
            clock: self.clock,
            calculator: self.calculator,
            _a: PhantomData,
        }
    }

    pub fn with_monitor(mut self, monitor: MonitorCfg) -> Self {
        self.monitor = Some(monitor);
        self
    }

    /// Inject a clock (manual clocks make the sequencer deterministic in tests).
    pub fn with_clock(mut self, clock: Box<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_calculator(mut self, calculator: ReleaseTimeCalculator) -> Self {
        self.calculator = Some(calculator);
        self
    }
}

impl DropControllerBuilder<Set> {
    pub fn build(self) -> Result<DynDropController> {
        self.try_build()
    }
}

/// Generic constructor with static dispatch on the actuator.
pub fn build_controller<A: Actuator>(
    actuator: A,
    monitor: MonitorCfg,
    clock: Option<Box<dyn Clock + Send + Sync>>,
) -> Result<DropController<A>> {
    validate_and_build(actuator, monitor, clock, ReleaseTimeCalculator::default())
}
