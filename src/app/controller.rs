//! Boiler controller: the hexagonal core.
//!
//! [`BoilerController`] owns the mode machine, safety supervisor, heating
//! rate monitor, fill verifier and PID.  It exposes a hardware-agnostic
//! API; all I/O flows through port traits injected at call sites, so the
//! whole controller runs against mock adapters on the host.
//!
//! ```text
//!  SensorPort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                 │       BoilerController        │
//! ActuatorPort ◀──│ FSM · Safety · Rate · Fill ·  │
//! WatchdogPort ◀──│ PID                           │
//!                 └──────────────────────────────┘
//! ```
//!
//! One call to [`BoilerController::tick`] is one control tick, always in
//! this order:
//!
//! 1. read temperature, acknowledge RTD faults
//! 2. absolute limits
//! 3. dry-boiler rate check
//! 4. control-loop stall check
//! 5. mode transition rules
//! 6. fill verifier
//! 7. PID
//! 8. over-temperature heater cutoff
//! 9. heater output (zero unless enabled and not in `Error`)
//! 10. watchdog

use log::{debug, error, info, warn};

use crate::config::BoilerConfig;
use crate::control::pid::PidController;
use crate::error::{ErrorKind, error_text};
use crate::fill_check::{CheckReason, FillCheck, report_outcome};
use crate::fsm::{BoilerMode, Effect, FeedForwardSlot, Fsm, ModeInputs, ModeLimits, Step};
use crate::safety::SafetySupervisor;
use crate::safety::rate::{RateVerdict, TempRateMonitor};
use crate::time::{Ticks, has_elapsed};

use super::commands::BoilerCommand;
use super::events::{BoilerEvent, BoilerStatus};
use super::ports::{ActuatorPort, BoilerHardware, EventSink, SensorPort};

/// Per-mode feed-forward biases (%).
#[derive(Debug, Clone, Copy, PartialEq)]
struct FeedForward {
    heat: f32,
    ready: f32,
    brew: f32,
}

impl FeedForward {
    fn get(&self, slot: FeedForwardSlot) -> f32 {
        match slot {
            FeedForwardSlot::Heat => self.heat,
            FeedForwardSlot::Ready => self.ready,
            FeedForwardSlot::Brew => self.brew,
        }
    }

    fn set(&mut self, slot: FeedForwardSlot, percent: f32) {
        match slot {
            FeedForwardSlot::Heat => self.heat = percent,
            FeedForwardSlot::Ready => self.ready = percent,
            FeedForwardSlot::Brew => self.brew = percent,
        }
    }
}

/// Feed-forward slot in effect for a mode.
fn active_slot(mode: BoilerMode) -> Option<FeedForwardSlot> {
    match mode {
        BoilerMode::Heating => Some(FeedForwardSlot::Heat),
        BoilerMode::Ready => Some(FeedForwardSlot::Ready),
        BoilerMode::Brew => Some(FeedForwardSlot::Brew),
        BoilerMode::Off | BoilerMode::Error => None,
    }
}

// ───────────────────────────────────────────────────────────────
// BoilerController
// ───────────────────────────────────────────────────────────────

/// The boiler controller.
pub struct BoilerController {
    config: BoilerConfig,
    fsm: Fsm,
    safety: SafetySupervisor,
    rate: TempRateMonitor,
    fill: FillCheck,
    pid: PidController,
    feed_forward: FeedForward,

    enabled: bool,
    brew_requested: bool,
    set_temp_c: f32,
    actual_temp_c: f32,
    /// Commanded heater power (%), as last written to the heater.
    power_pct: f32,
    /// Latched fault.  Set only on the way into `Error`.
    error: Option<ErrorKind>,

    last_control: Option<Ticks>,
    last_telemetry: Option<Ticks>,
    tick_count: u64,
}

impl BoilerController {
    /// Construct the controller from configuration.
    ///
    /// Starts in `Off`, disabled, with a zero set point.  Call
    /// [`start`](Self::start) before the first tick.
    pub fn new(config: BoilerConfig) -> Self {
        let mut pid = PidController::new(
            config.pid_kp,
            config.pid_ki,
            config.pid_kd,
            config.pid_sample_interval_ms,
        );
        pid.set_output_limits(0.0, 100.0);
        pid.set_windup_limits(config.windup_min_pct, config.windup_max_pct);

        Self {
            fsm: Fsm::new(BoilerMode::Off, 0),
            safety: SafetySupervisor::new(&config),
            rate: TempRateMonitor::new(&config),
            fill: FillCheck::new(&config),
            pid,
            feed_forward: FeedForward {
                heat: config.ff_heat_pct,
                ready: config.ff_ready_pct,
                brew: config.ff_brew_pct,
            },
            enabled: false,
            brew_requested: false,
            set_temp_c: 0.0,
            actual_temp_c: 0.0,
            power_pct: 0.0,
            error: None,
            last_control: None,
            last_telemetry: None,
            tick_count: 0,
            config,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Arm the PID, zero the heater and anchor the mode timer to `now`.
    pub fn start(&mut self, hw: &mut impl BoilerHardware, sink: &mut impl EventSink) {
        let now = hw.now_ms();
        self.fsm = Fsm::new(BoilerMode::Off, now);
        self.pid.start();
        hw.set_heater_power(0.0);
        hw.pump_off();
        sink.emit(&BoilerEvent::Started(self.fsm.mode()));
        info!("BoilerController started in {}", self.fsm.mode());
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one full control tick.
    pub fn tick(&mut self, hw: &mut impl BoilerHardware, sink: &mut impl EventSink) {
        self.tick_count += 1;
        let now = hw.now_ms();

        // 1. Temperature
        let temp_c = hw.read_temperature();
        let rtd_fault = hw.rtd_fault();
        if rtd_fault != 0 {
            hw.clear_rtd_fault();
        }
        self.actual_temp_c = temp_c;

        // 2. Absolute limits (and RTD fault classification)
        if let Some(kind) = self.safety.evaluate(temp_c, rtd_fault) {
            self.raise(kind, sink);
        }

        // 3. Dry boiler
        self.check_heating_rate(hw, now, sink);

        // 4. Control loop stall
        if self.enabled && self.safety.control_stalled(self.last_control, now) {
            self.raise(ErrorKind::ControlTimeout, sink);
        }

        // 5. Mode rules
        let inputs = self.mode_inputs(now);
        let step = self.fsm.step(&inputs, now);
        self.commit_step(&step, sink);

        // 6. Fill verifier
        if let Some((reason, outcome)) = self.fill.process(hw, now) {
            report_outcome(reason, outcome);
            sink.emit(&BoilerEvent::FillCheckFinished { reason, outcome });
        }

        // 7. PID
        let mut power = if self.heater_allowed() {
            let out = self.pid.compute(self.set_temp_c, self.actual_temp_c, now);
            if out.is_finite() {
                out
            } else {
                warn!("PID produced non-finite output, forcing 0 %");
                0.0
            }
        } else {
            self.pid.reset();
            0.0
        };

        // 8. Over-temperature cutoff
        if self.safety.heater_cutoff(self.actual_temp_c) {
            if power > 0.0 {
                debug!("heater cutoff at {:.1} C", self.actual_temp_c);
            }
            power = 0.0;
        }

        // 9. Heater
        self.apply_heater(power, hw);

        // 10. Watchdog
        hw.feed();
        self.last_control = Some(now);

        self.maybe_emit_telemetry(now, sink);
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command.
    pub fn handle_command(
        &mut self,
        cmd: BoilerCommand,
        hw: &mut impl BoilerHardware,
        sink: &mut impl EventSink,
    ) {
        match cmd {
            BoilerCommand::Enable => self.enable(),
            BoilerCommand::Disable => self.disable(hw),
            BoilerCommand::StartBrew => self.request_brew(),
            BoilerCommand::StopBrew => self.clear_brew(),
            BoilerCommand::SetTemperature(t) => self.set_temperature(t),
            BoilerCommand::ClearError => self.clear_error(sink),
            BoilerCommand::RequestBoilerCheck(reason) => {
                let now = hw.now_ms();
                self.request_boiler_check(reason, hw, now, sink);
            }
            BoilerCommand::SetFeedForward { slot, percent } => self.set_feed_forward(slot, percent),
            BoilerCommand::SetPid { p, i, d } => self.set_pid(p, i, d),
        }
    }

    /// Operator turns the boiler on.  Ignored while a fault is latched.
    pub fn enable(&mut self) {
        if let Some(kind) = self.error {
            warn!("enable ignored, fault {kind} latched");
            return;
        }
        if !self.enabled {
            info!("boiler enabled");
        }
        self.enabled = true;
    }

    /// Operator turns the boiler off.  The heater is zeroed immediately.
    pub fn disable(&mut self, hw: &mut impl ActuatorPort) {
        if self.enabled {
            info!("boiler disabled");
        }
        self.enabled = false;
        self.apply_heater(0.0, hw);
    }

    pub fn request_brew(&mut self) {
        self.brew_requested = true;
    }

    pub fn clear_brew(&mut self) {
        self.brew_requested = false;
    }

    /// New set point, clamped to `[0, temp_limit_high_c]`.  Non-finite
    /// values are rejected.  `Ready` re-tests the window against it on the
    /// next tick.
    pub fn set_temperature(&mut self, temp_c: f32) {
        if !temp_c.is_finite() {
            warn!("set temperature rejected: {temp_c}");
            return;
        }
        let clamped = temp_c.clamp(0.0, self.config.temp_limit_high_c);
        self.set_temp_c = clamped;
        info!("set temperature {clamped:.1} C");
    }

    /// Clear the latched fault.  `Error` returns to `Off` on the next tick.
    pub fn clear_error(&mut self, sink: &mut impl EventSink) {
        if let Some(kind) = self.error.take() {
            info!("fault {kind} cleared by operator");
            sink.emit(&BoilerEvent::ErrorCleared);
        }
    }

    /// Start a boiler fill check.  Dropped while one runs or while brewing.
    pub fn request_boiler_check(
        &mut self,
        reason: CheckReason,
        hw: &mut (impl SensorPort + ActuatorPort),
        now: Ticks,
        sink: &mut impl EventSink,
    ) {
        let brewing = self.fsm.mode() == BoilerMode::Brew;
        if self.fill.request(reason, brewing, hw, now) {
            sink.emit(&BoilerEvent::FillCheckStarted(reason));
        }
    }

    /// Retune a feed-forward bias (clamped to 0–100 %).  Takes effect at
    /// once if `slot` belongs to the active mode.
    pub fn set_feed_forward(&mut self, slot: FeedForwardSlot, percent: f32) {
        if !percent.is_finite() {
            warn!("feed-forward {} rejected: {percent}", slot.as_str());
            return;
        }
        let percent = percent.clamp(0.0, 100.0);
        self.feed_forward.set(slot, percent);
        if active_slot(self.fsm.mode()) == Some(slot) {
            self.pid.set_feed_forward(percent);
        }
        info!("feed-forward {} = {percent:.1} %", slot.as_str());
    }

    /// Retune PID gains.  Negative or non-finite gains are rejected.
    pub fn set_pid(&mut self, p: f32, i: f32, d: f32) {
        if [p, i, d].iter().any(|g| !g.is_finite() || *g < 0.0) {
            warn!("PID gains rejected: P={p} I={i} D={d}");
            return;
        }
        self.pid.set_coefficients(p, i, d);
        info!("PID gains P={p} I={i} D={d}");
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn mode(&self) -> BoilerMode {
        self.fsm.mode()
    }

    pub fn error(&self) -> Option<ErrorKind> {
        self.error
    }

    /// Latched fault text, `"OK"` when none.
    pub fn error_text(&self) -> &'static str {
        error_text(self.error)
    }

    pub fn actual_temperature(&self) -> f32 {
        self.actual_temp_c
    }

    pub fn set_point(&self) -> f32 {
        self.set_temp_c
    }

    /// Commanded heater power (%).
    pub fn power(&self) -> f32 {
        self.power_pct
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn brew_requested(&self) -> bool {
        self.brew_requested
    }

    pub fn fill_check_in_progress(&self) -> bool {
        self.fill.in_progress()
    }

    /// Feed-forward currently loaded into the PID.
    pub fn active_feed_forward(&self) -> f32 {
        self.pid.feed_forward()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn config(&self) -> &BoilerConfig {
        &self.config
    }

    /// Build a read-only snapshot.
    pub fn status(&self) -> BoilerStatus {
        let mode = self.fsm.mode();
        BoilerStatus {
            mode,
            mode_name: mode.name(),
            error: self.error,
            error_text: self.error_text(),
            actual_temp_c: self.actual_temp_c,
            set_temp_c: self.set_temp_c,
            power_pct: self.power_pct,
            enabled: self.enabled,
            brew_requested: self.brew_requested,
            fill_check_active: self.fill.in_progress(),
            heating_rate_c_per_min: self.rate.average(),
        }
    }

    // ── Internal ──────────────────────────────────────────────

    /// Latch `kind` unless a fault is already latched.
    fn raise(&mut self, kind: ErrorKind, sink: &mut impl EventSink) {
        if self.error.is_some() {
            return;
        }
        error!("FAULT: {kind} in {}", self.fsm.mode());
        self.error = Some(kind);
        sink.emit(&BoilerEvent::FaultRaised(kind));
    }

    fn check_heating_rate(
        &mut self,
        hw: &mut (impl SensorPort + ActuatorPort),
        now: Ticks,
        sink: &mut impl EventSink,
    ) {
        let brewing = self.fsm.mode() == BoilerMode::Brew;
        if !self.enabled || brewing || self.error.is_some() {
            self.rate.suspend();
            return;
        }
        if let RateVerdict::DrySuspected { avg_c_per_min } = self.rate.update(self.actual_temp_c, now) {
            warn!(
                "dry boiler suspected: {avg_c_per_min:.1} C/min at {:.1} C",
                self.actual_temp_c
            );
            self.request_boiler_check(CheckReason::Emergency, hw, now, sink);
            self.raise(ErrorKind::DryBoiler, sink);
        }
    }

    fn mode_inputs(&self, now: Ticks) -> ModeInputs {
        ModeInputs {
            enabled: self.enabled,
            brew_requested: self.brew_requested,
            set_temp_c: self.set_temp_c,
            actual_temp_c: self.actual_temp_c,
            error: self.error,
            in_mode_ms: self.fsm.time_in_mode(now),
            limits: ModeLimits {
                temp_window_c: self.config.temp_window_c,
                heating_timeout_ms: self.config.heating_timeout_ms,
                ready_timeout_ms: self.config.ready_timeout_ms,
                brew_timeout_ms: self.config.brew_timeout_ms,
            },
        }
    }

    fn commit_step(&mut self, step: &Step, sink: &mut impl EventSink) {
        for effect in &step.effects {
            self.apply_effect(*effect, sink);
        }
        if step.changed() {
            sink.emit(&BoilerEvent::ModeChanged {
                from: step.from,
                to: step.to,
            });
        }
    }

    fn apply_effect(&mut self, effect: Effect, sink: &mut impl EventSink) {
        match effect {
            Effect::ApplyFeedForward(slot) => self.pid.set_feed_forward(self.feed_forward.get(slot)),
            Effect::ClearFeedForward => self.pid.set_feed_forward(0.0),
            Effect::ClearBrewRequest => self.brew_requested = false,
            Effect::Disable => self.enabled = false,
            Effect::ZeroPower => {
                self.power_pct = 0.0;
                self.pid.reset();
            }
            Effect::ZeroSetpoint => self.set_temp_c = 0.0,
            Effect::LatchError(kind) => self.raise(kind, sink),
        }
    }

    fn heater_allowed(&self) -> bool {
        self.enabled && self.fsm.mode() != BoilerMode::Error
    }

    /// Single exit point for heater power.
    fn apply_heater(&mut self, power: f32, hw: &mut impl ActuatorPort) {
        let power = if self.heater_allowed() && power.is_finite() {
            power.clamp(0.0, 100.0)
        } else {
            0.0
        };
        self.power_pct = power;
        hw.set_heater_power(power);
    }

    fn maybe_emit_telemetry(&mut self, now: Ticks, sink: &mut impl EventSink) {
        let due = self
            .last_telemetry
            .is_none_or(|last| has_elapsed(now, last, self.config.telemetry_interval_ms));
        if due {
            self.last_telemetry = Some(now);
            sink.emit(&BoilerEvent::Telemetry(self.status()));
        }
    }
}
