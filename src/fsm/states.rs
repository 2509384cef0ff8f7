//! Per-mode transition rules and effect lists.
//!
//! Each mode is one row: what happens on entry, on exit, on every tick it
//! stays active, and a pure rule deciding where to go next.  Rules are
//! evaluated in the priority order written in each function.
//!
//! ```text
//!            enabled
//!   OFF ─────────────▶ HEATING ──[in window]──▶ READY
//!    ▲                   │  ▲  ◀─[out of window]─ │
//!    │            [brew] │  │ [brew cleared]      │ [brew]
//!    │                   ▼  │                     │
//!    │                  BREW ◀────────────────────┘
//!    │
//!    └──[error cleared]── ERROR ◀──[any fault / mode timeout]── any
//!
//!  any non-Error mode ──[disabled]──▶ OFF
//! ```

use super::context::{Effect, FeedForwardSlot, ModeInputs};
use super::{BoilerMode, Decision};
use crate::error::ErrorKind;

/// Evaluates one mode's transition rules.
pub type RuleFn = fn(&ModeInputs) -> Decision;

/// Static descriptor for a single mode.
pub struct ModeDescriptor {
    pub mode: BoilerMode,
    pub name: &'static str,
    pub on_enter: &'static [Effect],
    pub on_exit: &'static [Effect],
    /// Applied on every tick the mode stays active.
    pub on_hold: &'static [Effect],
    pub rule: RuleFn,
}

/// The mode table, indexed by `BoilerMode as usize`.
pub static MODE_TABLE: [ModeDescriptor; BoilerMode::COUNT] = [
    ModeDescriptor {
        mode: BoilerMode::Off,
        name: "off",
        on_enter: &[],
        on_exit: &[],
        on_hold: &[],
        rule: off_rule,
    },
    ModeDescriptor {
        mode: BoilerMode::Heating,
        name: "heating",
        on_enter: &[Effect::ApplyFeedForward(FeedForwardSlot::Heat)],
        on_exit: &[Effect::ClearFeedForward],
        on_hold: &[],
        rule: heating_rule,
    },
    ModeDescriptor {
        mode: BoilerMode::Ready,
        name: "ready",
        on_enter: &[Effect::ApplyFeedForward(FeedForwardSlot::Ready)],
        on_exit: &[Effect::ClearFeedForward],
        on_hold: &[],
        rule: ready_rule,
    },
    ModeDescriptor {
        mode: BoilerMode::Brew,
        name: "brew",
        on_enter: &[Effect::ApplyFeedForward(FeedForwardSlot::Brew)],
        on_exit: &[Effect::ClearFeedForward, Effect::ClearBrewRequest],
        on_hold: &[],
        rule: brew_rule,
    },
    ModeDescriptor {
        mode: BoilerMode::Error,
        name: "error",
        on_enter: &[
            Effect::ClearFeedForward,
            Effect::Disable,
            Effect::ZeroPower,
            Effect::ZeroSetpoint,
        ],
        on_exit: &[],
        on_hold: &[Effect::Disable, Effect::ZeroPower, Effect::ZeroSetpoint],
        rule: error_rule,
    },
];

// ═══════════════════════════════════════════════════════════════════════════
//  Rules
// ═══════════════════════════════════════════════════════════════════════════

fn off_rule(inputs: &ModeInputs) -> Decision {
    if inputs.enabled {
        return Decision::Goto(BoilerMode::Heating);
    }
    Decision::Stay
}

fn heating_rule(inputs: &ModeInputs) -> Decision {
    if !inputs.enabled {
        return Decision::Goto(BoilerMode::Off);
    }
    if inputs.brew_requested {
        return Decision::Goto(BoilerMode::Brew);
    }
    if inputs.within_window() {
        return Decision::Goto(BoilerMode::Ready);
    }
    if inputs.in_mode_ms >= inputs.limits.heating_timeout_ms {
        return Decision::Fault(ErrorKind::TimeoutHeating);
    }
    Decision::Stay
}

fn ready_rule(inputs: &ModeInputs) -> Decision {
    if !inputs.enabled {
        return Decision::Goto(BoilerMode::Off);
    }
    if inputs.brew_requested {
        return Decision::Goto(BoilerMode::Brew);
    }
    // Runs every tick, so a moved set point is picked up on the next one.
    if !inputs.within_window() {
        return Decision::Goto(BoilerMode::Heating);
    }
    if inputs.in_mode_ms >= inputs.limits.ready_timeout_ms {
        return Decision::Fault(ErrorKind::ReadyTimeout);
    }
    Decision::Stay
}

fn brew_rule(inputs: &ModeInputs) -> Decision {
    if !inputs.enabled {
        return Decision::Goto(BoilerMode::Off);
    }
    if !inputs.brew_requested {
        return Decision::Goto(BoilerMode::Heating);
    }
    if inputs.in_mode_ms >= inputs.limits.brew_timeout_ms {
        return Decision::Fault(ErrorKind::TimeoutBrew);
    }
    Decision::Stay
}

fn error_rule(inputs: &ModeInputs) -> Decision {
    if inputs.error.is_none() {
        return Decision::Goto(BoilerMode::Off);
    }
    Decision::Stay
}
