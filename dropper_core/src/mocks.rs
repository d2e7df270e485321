//! Test and helper mocks for dropper_core

use std::sync::{Arc, Mutex};

use dropper_traits::{Actuator, ActuatorPosition};

/// Actuator that accepts every command and does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopActuator;

impl Actuator for NoopActuator {
    fn set_position(
        &mut self,
        _position: ActuatorPosition,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
}

/// Actuator that records every command. Clones share one log, so a test can
/// keep a handle after moving the actuator into a controller.
#[derive(Debug, Default, Clone)]
pub struct RecordingActuator {
    log: Arc<Mutex<Vec<ActuatorPosition>>>,
}

impl RecordingActuator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> Vec<ActuatorPosition> {
        self.log.lock().map(|g| g.clone()).unwrap_or_default()
    }

    pub fn last(&self) -> Option<ActuatorPosition> {
        self.log.lock().ok().and_then(|g| g.last().copied())
    }

    pub fn count(&self, position: ActuatorPosition) -> usize {
        self.commands().iter().filter(|p| **p == position).count()
    }
}

impl Actuator for RecordingActuator {
    fn set_position(
        &mut self,
        position: ActuatorPosition,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if let Ok(mut g) = self.log.lock() {
            g.push(position);
        }
        Ok(())
    }
}

/// Actuator whose every command fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingActuator;

impl Actuator for FailingActuator {
    fn set_position(
        &mut self,
        _position: ActuatorPosition,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Err(Box::new(std::io::Error::other("servo not attached")))
    }
}
