use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("gpio error: {0}")]
    Gpio(String),
    #[error("servo pwm error: {0}")]
    Pwm(String),
    #[error("servo angle {0} out of range 0..=180")]
    Angle(u16),
}

pub type Result<T> = std::result::Result<T, HwError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_failing_part() {
        assert_eq!(HwError::Gpio("pin 17 busy".into()).to_string(), "gpio error: pin 17 busy");
        assert_eq!(HwError::Pwm("period".into()).to_string(), "servo pwm error: period");
        assert_eq!(HwError::Angle(200).to_string(), "servo angle 200 out of range 0..=180");
    }
}
