//! Application core: boiler control logic, zero direct I/O.
//!
//! The [`controller`] orchestrates the mode machine, safety checks, fill
//! verifier and PID.  All interaction with hardware happens through
//! **port traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod commands;
pub mod controller;
pub mod events;
pub mod ports;
