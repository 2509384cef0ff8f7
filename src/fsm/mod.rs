//! Table-driven boiler mode state machine.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  MODE_TABLE                                                  │
//! │  ┌─────────┬──────────┬─────────┬──────────┬──────────────┐  │
//! │  │ Mode    │ on_enter │ on_exit │ on_hold  │ rule         │  │
//! │  ├─────────┼──────────┼─────────┼──────────┼──────────────┤  │
//! │  │ Off     │ []       │ []      │ []       │ fn -> Decision│ │
//! │  │ Heating │ [FF]     │ [-FF]   │ []       │ fn -> Decision│ │
//! │  │ Ready   │ [FF]     │ [-FF]   │ []       │ fn -> Decision│ │
//! │  │ Brew    │ [FF]     │ [-FF,..]│ []       │ fn -> Decision│ │
//! │  │ Error   │ [safe..] │ []      │ [safe..] │ fn -> Decision│ │
//! │  └─────────┴──────────┴─────────┴──────────┴──────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The rules never touch hardware or controller state.  [`transition`] is a
//! pure function from `(mode, inputs)` to a [`Step`]: the next mode plus
//! the ordered list of [`Effect`]s the controller must apply.  A latched
//! error sends every mode except `Error` straight to `Error`.
//!
//! [`Fsm`] wraps the pure function with the only state the machine owns:
//! the current mode and the tick at which it was entered.

pub mod context;
pub mod states;

use log::info;

pub use context::{Effect, Effects, FeedForwardSlot, ModeInputs, ModeLimits};
use states::MODE_TABLE;

use crate::error::ErrorKind;
use crate::time::{Ticks, time_difference};

// ---------------------------------------------------------------------------
// Mode identity
// ---------------------------------------------------------------------------

/// Boiler operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum BoilerMode {
    Off = 0,
    Heating = 1,
    Ready = 2,
    Brew = 3,
    Error = 4,
}

impl BoilerMode {
    pub const COUNT: usize = 5;

    pub const ALL: [Self; Self::COUNT] = [Self::Off, Self::Heating, Self::Ready, Self::Brew, Self::Error];

    pub fn name(self) -> &'static str {
        MODE_TABLE[self as usize].name
    }
}

impl core::fmt::Display for BoilerMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Transition result
// ---------------------------------------------------------------------------

/// What a mode rule decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Stay,
    Goto(BoilerMode),
    /// Raise a fault and go to `Error`.
    Fault(ErrorKind),
}

/// Outcome of one evaluation of the state machine.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub from: BoilerMode,
    pub to: BoilerMode,
    pub effects: Effects,
}

impl Step {
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

/// Evaluate the rules for `mode` against `inputs`.
pub fn transition(mode: BoilerMode, inputs: &ModeInputs) -> Step {
    let decision = if mode != BoilerMode::Error && inputs.error.is_some() {
        Decision::Goto(BoilerMode::Error)
    } else {
        (MODE_TABLE[mode as usize].rule)(inputs)
    };

    let mut effects = Effects::new();
    let to = match decision {
        Decision::Stay => {
            extend(&mut effects, MODE_TABLE[mode as usize].on_hold);
            mode
        }
        Decision::Goto(next) => {
            extend(&mut effects, MODE_TABLE[mode as usize].on_exit);
            extend(&mut effects, MODE_TABLE[next as usize].on_enter);
            next
        }
        Decision::Fault(kind) => {
            push(&mut effects, Effect::LatchError(kind));
            extend(&mut effects, MODE_TABLE[mode as usize].on_exit);
            extend(&mut effects, MODE_TABLE[BoilerMode::Error as usize].on_enter);
            BoilerMode::Error
        }
    };

    Step {
        from: mode,
        to,
        effects,
    }
}

fn extend(effects: &mut Effects, list: &[Effect]) {
    for &effect in list {
        push(effects, effect);
    }
}

fn push(effects: &mut Effects, effect: Effect) {
    // Table rows are short; an overflow is a table bug.
    let pushed = effects.push(effect);
    debug_assert!(pushed.is_ok(), "effect list overflow");
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Current mode plus the tick it was entered.
pub struct Fsm {
    mode: BoilerMode,
    entered_at: Ticks,
}

impl Fsm {
    pub fn new(initial: BoilerMode, now: Ticks) -> Self {
        Self {
            mode: initial,
            entered_at: now,
        }
    }

    pub fn mode(&self) -> BoilerMode {
        self.mode
    }

    /// Milliseconds spent in the current mode.
    pub fn time_in_mode(&self, now: Ticks) -> Ticks {
        time_difference(now, self.entered_at)
    }

    /// Run one evaluation and commit the resulting mode.
    pub fn step(&mut self, inputs: &ModeInputs, now: Ticks) -> Step {
        let step = transition(self.mode, inputs);
        if step.changed() {
            info!("FSM transition: {} -> {}", step.from, step.to);
            self.mode = step.to;
            self.entered_at = now;
        }
        step
    }
}
