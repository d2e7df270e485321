pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};

/// Mechanical positions of the release actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActuatorPosition {
    /// Fully closed; lets the next object drop into the release chamber.
    Closed,
    /// Holding the object just short of release.
    PreArmed,
    /// Object released.
    Released,
}

pub trait Actuator {
    fn set_position(
        &mut self,
        position: ActuatorPosition,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// A sampled binary signal (sensor line, trigger button).
pub trait DigitalInput {
    fn is_high(&mut self) -> bool;
}

impl<A: Actuator + ?Sized> Actuator for Box<A> {
    fn set_position(
        &mut self,
        position: ActuatorPosition,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).set_position(position)
    }
}

impl<I: DigitalInput + ?Sized> DigitalInput for Box<I> {
    fn is_high(&mut self) -> bool {
        (**self).is_high()
    }
}
