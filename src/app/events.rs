//! Outbound controller events.
//!
//! The [`BoilerController`](super::controller::BoilerController) emits
//! these through the [`EventSink`](super::ports::EventSink) port.  Adapters
//! on the other side decide what to do with them.

use serde::Serialize;

use crate::error::ErrorKind;
use crate::fill_check::{CheckReason, FillOutcome};
use crate::fsm::BoilerMode;

/// Structured events emitted by the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum BoilerEvent {
    /// Controller started (carries initial mode).
    Started(BoilerMode),

    /// The mode machine moved.
    ModeChanged { from: BoilerMode, to: BoilerMode },

    /// A fault was latched.
    FaultRaised(ErrorKind),

    /// The operator cleared the latched fault.
    ErrorCleared,

    /// A boiler fill check began pumping.
    FillCheckStarted(CheckReason),

    /// A boiler fill check resolved.
    FillCheckFinished {
        reason: CheckReason,
        outcome: FillOutcome,
    },

    /// Periodic status snapshot.
    Telemetry(BoilerStatus),
}

/// Point-in-time, read-only view of the controller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoilerStatus {
    pub mode: BoilerMode,
    pub mode_name: &'static str,
    pub error: Option<ErrorKind>,
    /// `"OK"` when no fault is latched.
    pub error_text: &'static str,
    pub actual_temp_c: f32,
    pub set_temp_c: f32,
    /// Commanded heater power (%).
    pub power_pct: f32,
    pub enabled: bool,
    pub brew_requested: bool,
    pub fill_check_active: bool,
    /// Latest average heating rate (°C/min), once enough samples exist.
    pub heating_rate_c_per_min: Option<f32>,
}

impl BoilerStatus {
    /// Compact JSON rendering for serial/telemetry consumers.
    pub fn to_json(&self) -> Option<String> {
        serde_json::to_string(self).ok()
    }
}
