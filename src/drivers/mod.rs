//! Actuator drivers and the task watchdog.

pub mod heater;
pub mod pump;
pub mod watchdog;
