use std::error::Error;

use dropper_core::error::DropperError;
use dropper_core::{DropController, Stage};
use dropper_hardware::error::HwError;
use dropper_traits::clock::ManualClock;
use dropper_traits::{Actuator, ActuatorPosition};

/// A servo that accepts `ok_count` commands, then fails with the given error.
struct FlakyServo {
    ok_count: usize,
    make_err: fn() -> Box<dyn Error + Send + Sync>,
}
impl Actuator for FlakyServo {
    fn set_position(&mut self, _position: ActuatorPosition) -> Result<(), Box<dyn Error + Send + Sync>> {
        if self.ok_count == 0 {
            Err((self.make_err)())
        } else {
            self.ok_count -= 1;
            Ok(())
        }
    }
}

fn drive(servo: FlakyServo) -> eyre::Report {
    let clock = ManualClock::new();
    let mut c = DropController::builder()
        .with_actuator(servo)
        .with_clock(Box::new(clock.clone()))
        .build()
        .unwrap();
    // Closed succeeds, PreArmed is the second command.
    for _ in 0..5 {
        clock.advance_us(200_000);
        if let Err(e) = c.poll(false, false, false) {
            assert_eq!(c.stage(), Stage::ObjectFalling);
            return e;
        }
    }
    panic!("expected the pre-arm command to fail");
}

#[test]
fn pwm_errors_map_to_hardware_fault() {
    let err = drive(FlakyServo {
        ok_count: 1,
        make_err: || Box::new(HwError::Pwm("channel busy".into())),
    });
    match err.downcast_ref::<DropperError>() {
        Some(DropperError::HardwareFault(msg)) => assert!(msg.contains("channel busy")),
        other => panic!("unexpected error variant: {other:?}"),
    }
}

#[test]
fn other_errors_map_to_hardware() {
    let err = drive(FlakyServo {
        ok_count: 1,
        make_err: || "servo timeout".into(),
    });
    match err.downcast_ref::<DropperError>() {
        Some(DropperError::Hardware(_)) => {}
        other => panic!("unexpected error variant: {other:?}"),
    }
}

