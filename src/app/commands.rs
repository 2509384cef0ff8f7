//! Inbound commands to the boiler controller.
//!
//! These represent actions requested by the outside world (front panel,
//! serial console, brew-group logic) that the
//! [`BoilerController`](super::controller::BoilerController) interprets.
//! No command can force a mode directly; modes change only through the
//! controller's own transition rules.

use crate::fill_check::CheckReason;
use crate::fsm::FeedForwardSlot;

/// Commands that external adapters can send into the controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoilerCommand {
    /// Operator turns the boiler on.
    Enable,

    /// Operator turns the boiler off.  The heater is zeroed at once.
    Disable,

    /// Brew switch pressed.
    StartBrew,

    /// Brew switch released.
    StopBrew,

    /// New target temperature (°C), clamped to the high limit.
    SetTemperature(f32),

    /// Acknowledge the latched fault.
    ClearError,

    /// Run a boiler fill check.
    RequestBoilerCheck(CheckReason),

    /// Retune a per-mode feed-forward bias (%).
    SetFeedForward { slot: FeedForwardSlot, percent: f32 },

    /// Retune PID gains.
    SetPid { p: f32, i: f32, d: f32 },
}
