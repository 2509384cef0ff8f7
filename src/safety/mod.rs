//! Safety supervisor.
//!
//! The supervisor runs **every tick before the mode state machine** and
//! turns raw readings into boiler faults:
//!
//! 1. RTD fault code non-zero, or a non-finite reading → `RtdFault`.
//! 2. Temperature above the high limit → `OverTemp`.
//! 3. Temperature below the low limit → `RtdFault` (a boiler this cold is
//!    a broken sensor, not a thermal event).
//! 4. Control loop stalled past the control timeout → `ControlTimeout`.
//!
//! Independently of the fault path, [`SafetySupervisor::heater_cutoff`]
//! forces the heater off above the high limit plus a margin, so a missed
//! transition can never keep the element energised on an overheated
//! boiler.
//!
//! The dry-boiler heating-rate check lives in [`rate`].

pub mod rate;

use log::{error, info};

use crate::config::BoilerConfig;
use crate::error::ErrorKind;
use crate::time::{Ticks, has_elapsed};

/// Safety supervisor.
pub struct SafetySupervisor {
    limit_high_c: f32,
    limit_low_c: f32,
    cutoff_margin_c: f32,
    control_timeout_ms: Ticks,
    /// Last temperature fault reported, to log transitions only once.
    active: Option<ErrorKind>,
}

impl SafetySupervisor {
    pub fn new(config: &BoilerConfig) -> Self {
        Self {
            limit_high_c: config.temp_limit_high_c,
            limit_low_c: config.temp_limit_low_c,
            cutoff_margin_c: config.heater_cutoff_margin_c,
            control_timeout_ms: config.control_timeout_ms,
            active: None,
        }
    }

    /// Classify one RTD sample.  `rtd_fault` is the front-end fault code
    /// (0 = none).
    pub fn evaluate(&mut self, temp_c: f32, rtd_fault: u8) -> Option<ErrorKind> {
        let fault = if rtd_fault != 0 || !temp_c.is_finite() {
            Some(ErrorKind::RtdFault)
        } else if temp_c > self.limit_high_c {
            Some(ErrorKind::OverTemp)
        } else if temp_c < self.limit_low_c {
            Some(ErrorKind::RtdFault)
        } else {
            None
        };

        match (self.active, fault) {
            (None, Some(kind)) => {
                error!("SAFETY FAULT SET: {kind} (T={temp_c:.1}, rtd=0x{rtd_fault:02x})");
            }
            (Some(prev), None) => info!("SAFETY FAULT CLEARED: {prev}"),
            _ => {}
        }
        self.active = fault;
        fault
    }

    /// `true` if the loop has not completed a tick within the control
    /// timeout.  `last_tick` is `None` before the first tick.
    pub fn control_stalled(&self, last_tick: Option<Ticks>, now: Ticks) -> bool {
        last_tick.is_some_and(|last| has_elapsed(now, last, self.control_timeout_ms))
    }

    /// `true` if the heater must be forced off regardless of mode.
    pub fn heater_cutoff(&self, temp_c: f32) -> bool {
        !temp_c.is_finite() || temp_c > self.limit_high_c + self.cutoff_margin_c
    }

    /// Temperature fault seen on the latest evaluation, if any.
    pub fn active_fault(&self) -> Option<ErrorKind> {
        self.active
    }
}
