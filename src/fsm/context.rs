//! Inputs and outputs of the mode transition function.
//!
//! `ModeInputs` is a read-only snapshot the controller assembles each tick;
//! the transition function never sees the controller itself.  What a
//! transition *does* is described by a list of [`Effect`]s that the
//! controller applies afterwards, in order.

use crate::error::ErrorKind;
use crate::time::Ticks;

// ---------------------------------------------------------------------------
// Inputs (read-only to the transition function)
// ---------------------------------------------------------------------------

/// Thresholds the transition rules compare against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeLimits {
    /// Half-width of the "at temperature" window (°C).
    pub temp_window_c: f32,
    pub heating_timeout_ms: Ticks,
    pub ready_timeout_ms: Ticks,
    pub brew_timeout_ms: Ticks,
}

/// Everything a transition rule may look at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeInputs {
    /// Operator on/off intent.
    pub enabled: bool,
    /// Pending brew request.
    pub brew_requested: bool,
    pub set_temp_c: f32,
    pub actual_temp_c: f32,
    /// Latched fault, if any.
    pub error: Option<ErrorKind>,
    /// Time spent in the current mode.
    pub in_mode_ms: Ticks,
    pub limits: ModeLimits,
}

impl ModeInputs {
    /// Distance between set point and actual temperature.
    pub fn temp_error_c(&self) -> f32 {
        (self.set_temp_c - self.actual_temp_c).abs()
    }

    /// Inside the window (boundary inclusive).
    pub fn within_window(&self) -> bool {
        self.temp_error_c() <= self.limits.temp_window_c
    }
}

// ---------------------------------------------------------------------------
// Effects (produced by transitions; applied by the controller)
// ---------------------------------------------------------------------------

/// Which per-mode feed-forward bias to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedForwardSlot {
    Heat,
    Ready,
    Brew,
}

impl FeedForwardSlot {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Heat => "heat",
            Self::Ready => "ready",
            Self::Brew => "brew",
        }
    }
}

/// One side effect requested by a mode transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Load the given feed-forward bias into the PID.
    ApplyFeedForward(FeedForwardSlot),
    /// Zero the PID feed-forward.
    ClearFeedForward,
    /// Drop the pending brew request.
    ClearBrewRequest,
    /// Force the operator intent to "off".
    Disable,
    /// Zero the commanded heater power.
    ZeroPower,
    /// Zero the temperature set point.
    ZeroSetpoint,
    /// Latch the given fault.
    LatchError(ErrorKind),
}

/// Upper bound on effects produced by a single step.
pub const MAX_EFFECTS: usize = 8;

/// Ordered effect list (exit effects, then enter/hold effects).
pub type Effects = heapless::Vec<Effect, MAX_EFFECTS>;
