//! Espresso boiler controller firmware library.
//!
//! Exposes the control logic for integration testing and host simulation.
//! All ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module; everything else builds and tests on the host.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod control;
pub mod error;
pub mod fill_check;
pub mod fsm;
pub mod safety;
pub mod time;

pub mod adapters;
pub mod drivers;
pub mod sensors;
