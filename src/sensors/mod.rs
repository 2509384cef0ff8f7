//! Sensor drivers: boiler RTD front-end and reservoir load cell.
//!
//! Both are written against `embedded-hal` 1.0 traits, so they build for
//! the host (tests drive them through fakes) as well as for ESP-IDF.

pub mod reservoir;
pub mod rtd;
