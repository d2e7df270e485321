//! Hardware backends for the dropper: a deterministic simulation and, with
//! the `hardware` feature, Raspberry Pi GPIO inputs and a PWM servo.

pub mod error;
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod gpio;
pub mod servo;
pub mod sim;

pub use servo::{ServoAngles, ServoPwm};
pub use sim::{Disturbance, SimActuator, SimChannel, SimInput, SimTrigger, SimTurntable};

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub use gpio::GpioInput;
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub use servo::ServoActuator;
