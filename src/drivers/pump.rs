//! Fill pump relay driver.
//!
//! The vibratory pump that refills the boiler sits behind a single relay
//! output.  This driver is a dumb actuator; the fill verifier decides when
//! it runs.

use embedded_hal::digital::OutputPin;
use log::warn;

use crate::error::{ActuatorError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpState {
    Stopped,
    Running,
}

pub struct PumpDriver<P> {
    pin: P,
    state: PumpState,
}

impl<P: OutputPin> PumpDriver<P> {
    /// Take the relay pin and force it off.
    pub fn new(mut pin: P) -> Self {
        if pin.set_low().is_err() {
            warn!("pump: initial relay write failed");
        }
        Self {
            pin,
            state: PumpState::Stopped,
        }
    }

    pub fn on(&mut self) -> Result<()> {
        self.pin.set_high().map_err(|_| ActuatorError::GpioWriteFailed)?;
        self.state = PumpState::Running;
        Ok(())
    }

    /// Stop the pump.  The state is recorded as stopped even if the write
    /// fails, so a retry is always attempted on the next call.
    pub fn off(&mut self) -> Result<()> {
        self.state = PumpState::Stopped;
        self.pin.set_low().map_err(|_| ActuatorError::GpioWriteFailed)?;
        Ok(())
    }

    pub fn state(&self) -> PumpState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == PumpState::Running
    }
}
