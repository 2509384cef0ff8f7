//! Boiler fill verifier.
//!
//! Pumps water for a short probe and watches the reservoir weight.  If the
//! reservoir barely moves, the boiler was already full.  If it drops, the
//! boiler took water, so another probe is run from a fresh baseline.  A
//! hard ceiling, measured from the start of the check, bounds the total
//! pumping time so a stuck load cell can never pump forever.
//!
//! ```text
//!           request (idle, not brewing)
//!   IDLE ───────────────────────────────▶ FILLING ──┐ probe done,
//!    ▲                                       │  ▲   │ drop >= threshold
//!    │   drop < threshold  /  ceiling hit     │  └───┘ (new baseline)
//!    └───────────────────────────────────────┘
//! ```

use log::{debug, info, warn};

use crate::app::ports::{ActuatorPort, SensorPort};
use crate::config::BoilerConfig;
use crate::time::{Ticks, has_elapsed};

/// Why a fill check was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckReason {
    /// Power-on check.
    Startup,
    /// Before the machine goes to sleep.
    PreSleep,
    /// After a brew drew water from the boiler.
    PostBrew,
    /// Dry boiler suspected.
    Emergency,
}

impl CheckReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Startup => "startup",
            Self::PreSleep => "pre-sleep",
            Self::PostBrew => "post-brew",
            Self::Emergency => "emergency",
        }
    }
}

impl core::fmt::Display for CheckReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a fill check resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillOutcome {
    /// Boiler is full.  `refill_probes` counts the probes that moved water
    /// (0 = it was already full).
    Full { refill_probes: u16 },
    /// Ceiling hit before the boiler was judged full.
    Incomplete,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Idle,
    Filling {
        reason: CheckReason,
        started_at: Ticks,
        probe_started_at: Ticks,
        baseline_g: f32,
        refill_probes: u16,
    },
}

/// The verifier.  Owned by the controller; one check at a time.
pub struct FillCheck {
    phase: Phase,
    probe_ms: Ticks,
    max_ms: Ticks,
    threshold_g: f32,
}

impl FillCheck {
    pub fn new(config: &BoilerConfig) -> Self {
        Self {
            phase: Phase::Idle,
            probe_ms: config.fill_probe_ms,
            max_ms: config.fill_max_ms,
            threshold_g: config.fill_threshold_g,
        }
    }

    pub fn in_progress(&self) -> bool {
        matches!(self.phase, Phase::Filling { .. })
    }

    /// Start a check.  Dropped (returns `false`) while another check runs
    /// or while brewing.
    pub fn request(
        &mut self,
        reason: CheckReason,
        brewing: bool,
        hw: &mut (impl SensorPort + ActuatorPort),
        now: Ticks,
    ) -> bool {
        if self.in_progress() {
            debug!("FILL: {reason} check dropped, one already running");
            return false;
        }
        if brewing {
            debug!("FILL: {reason} check dropped while brewing");
            return false;
        }

        let baseline_g = hw.reservoir_weight();
        self.phase = Phase::Filling {
            reason,
            started_at: now,
            probe_started_at: now,
            baseline_g,
            refill_probes: 0,
        };
        hw.pump_on();
        info!("FILL: {reason} check started (reservoir {baseline_g:.0} g)");
        true
    }

    /// Advance a running check.  Returns the resolution once the check
    /// finishes; the pump is off whenever this returns `Some`.
    pub fn process(
        &mut self,
        hw: &mut (impl SensorPort + ActuatorPort),
        now: Ticks,
    ) -> Option<(CheckReason, FillOutcome)> {
        let Phase::Filling {
            reason,
            started_at,
            probe_started_at,
            baseline_g,
            refill_probes,
        } = self.phase
        else {
            return None;
        };

        if has_elapsed(now, started_at, self.max_ms) {
            hw.pump_off();
            self.phase = Phase::Idle;
            return Some((reason, FillOutcome::Incomplete));
        }

        if !has_elapsed(now, probe_started_at, self.probe_ms) {
            return None;
        }

        hw.pump_off();
        let weight_g = hw.reservoir_weight();
        let drop_g = baseline_g - weight_g;

        if drop_g < self.threshold_g {
            self.phase = Phase::Idle;
            return Some((reason, FillOutcome::Full { refill_probes }));
        }

        debug!("FILL: probe moved {drop_g:.0} g, probing again");
        self.phase = Phase::Filling {
            reason,
            started_at,
            probe_started_at: now,
            baseline_g: weight_g,
            refill_probes: refill_probes.saturating_add(1),
        };
        hw.pump_on();
        None
    }
}

/// Per-reason outcome reporting.  Observational only.
pub fn report_outcome(reason: CheckReason, outcome: FillOutcome) {
    match (reason, outcome) {
        (_, FillOutcome::Incomplete) => {
            warn!("FILL: {reason} check hit the pumping ceiling, boiler may not be full");
        }
        (CheckReason::Emergency, FillOutcome::Full { refill_probes: 0 }) => {
            warn!("FILL: emergency check found boiler full, dry verdict was a false alarm");
        }
        (CheckReason::Emergency, FillOutcome::Full { refill_probes }) => {
            warn!("FILL: boiler was low, refilled in {refill_probes} probe(s) after dry verdict");
        }
        (_, FillOutcome::Full { refill_probes: 0 }) => {
            info!("FILL: {reason} check ok, boiler full");
        }
        (_, FillOutcome::Full { refill_probes }) => {
            info!("FILL: {reason} check: boiler was low, refilled in {refill_probes} probe(s)");
        }
    }
}
