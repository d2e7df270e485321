//! Hobby-servo position mapping and the GPIO servo actuator.

use std::time::Duration;

use dropper_traits::ActuatorPosition;

use crate::error::{HwError, Result};

/// Servo angles (degrees) for the three actuator positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServoAngles {
    pub closed: u16,
    pub pre_armed: u16,
    pub released: u16,
}

impl Default for ServoAngles {
    fn default() -> Self {
        Self {
            closed: 0,
            pre_armed: 17,
            released: 30,
        }
    }
}

impl ServoAngles {
    pub fn angle_for(&self, position: ActuatorPosition) -> u16 {
        match position {
            ActuatorPosition::Closed => self.closed,
            ActuatorPosition::PreArmed => self.pre_armed,
            ActuatorPosition::Released => self.released,
        }
    }
}

/// PWM timing of the servo signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServoPwm {
    pub period: Duration,
    /// Pulse width at 0 degrees.
    pub min_pulse: Duration,
    /// Pulse width at 180 degrees.
    pub max_pulse: Duration,
}

impl Default for ServoPwm {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(20),
            min_pulse: Duration::from_micros(544),
            max_pulse: Duration::from_micros(2400),
        }
    }
}

impl ServoPwm {
    /// Linear angle to pulse width mapping.
    pub fn pulse_for(&self, angle: u16) -> Result<Duration> {
        if angle > 180 {
            return Err(HwError::Angle(angle));
        }
        let min = self.min_pulse.as_micros() as u64;
        let max = self.max_pulse.as_micros() as u64;
        let span = max.saturating_sub(min);
        Ok(Duration::from_micros(min + span * u64::from(angle) / 180))
    }
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub use gpio_servo::ServoActuator;

#[cfg(all(feature = "hardware", target_os = "linux"))]
mod gpio_servo {
    use dropper_traits::{Actuator, ActuatorPosition};
    use rppal::gpio::{Gpio, OutputPin};

    use super::{ServoAngles, ServoPwm};
    use crate::error::{HwError, Result};

    /// Servo driven by software PWM on a GPIO pin.
    pub struct ServoActuator {
        pin: OutputPin,
        angles: ServoAngles,
        pwm: ServoPwm,
    }

    impl ServoActuator {
        pub fn new(pin: u8, angles: ServoAngles, pwm: ServoPwm) -> Result<Self> {
            let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
            let pin = gpio
                .get(pin)
                .map_err(|e| HwError::Gpio(e.to_string()))?
                .into_output_low();
            Ok(Self { pin, angles, pwm })
        }
    }

    impl Actuator for ServoActuator {
        fn set_position(
            &mut self,
            position: ActuatorPosition,
        ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
            let angle = self.angles.angle_for(position);
            let pulse = self.pwm.pulse_for(angle)?;
            self.pin
                .set_pwm(self.pwm.period, pulse)
                .map_err(|e| HwError::Pwm(e.to_string()))?;
            tracing::debug!(?position, angle, pulse_us = pulse.as_micros() as u64, "servo");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pulse_spans_configured_range() {
        let pwm = ServoPwm::default();
        assert_eq!(pwm.pulse_for(0).unwrap(), Duration::from_micros(544));
        assert_eq!(pwm.pulse_for(180).unwrap(), Duration::from_micros(2400));
        assert_eq!(pwm.pulse_for(90).unwrap(), Duration::from_micros(1472));
    }

    #[test]
    fn rejects_angles_past_half_turn() {
        assert!(matches!(ServoPwm::default().pulse_for(181), Err(HwError::Angle(181))));
    }

    #[test]
    fn default_angles_are_ordered() {
        let a = ServoAngles::default();
        assert!(a.angle_for(ActuatorPosition::Closed) < a.angle_for(ActuatorPosition::PreArmed));
        assert!(a.angle_for(ActuatorPosition::PreArmed) < a.angle_for(ActuatorPosition::Released));
    }
}
