//! Mock hardware adapter for integration tests.
//!
//! Records every actuator call so tests can assert on the full command
//! history without touching real GPIO registers.  Sensor values and the
//! clock are plain fields the test sets between ticks.

use boilerctl::app::controller::BoilerController;
use boilerctl::app::events::BoilerEvent;
use boilerctl::app::ports::{ActuatorPort, EventSink, SensorPort, WatchdogPort};
use boilerctl::config::BoilerConfig;
use boilerctl::time::{Clock, Ticks};

// ── Actuator call record ──────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum ActuatorCall {
    Heater(f32),
    PumpOn,
    PumpOff,
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    pub calls: Vec<ActuatorCall>,
    pub now: Ticks,
    pub temp_c: f32,
    pub rtd_fault: u8,
    pub rtd_fault_clears: u32,
    pub weight_g: f32,
    /// Grams the reservoir loses each time the pump stops.
    pub drain_per_pump_run_g: f32,
    pub pump: bool,
    pub feeds: u32,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            now: 0,
            temp_c: 20.0,
            rtd_fault: 0,
            rtd_fault_clears: 0,
            weight_g: 1500.0,
            drain_per_pump_run_g: 0.0,
            pump: false,
            feeds: 0,
        }
    }

    /// Last heater power written, 0 if never written.
    pub fn heater(&self) -> f32 {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                ActuatorCall::Heater(p) => Some(*p),
                _ => None,
            })
            .unwrap_or(0.0)
    }

    pub fn pump_starts(&self) -> usize {
        self.calls.iter().filter(|c| **c == ActuatorCall::PumpOn).count()
    }

    pub fn advance(&mut self, ms: Ticks) {
        self.now = self.now.wrapping_add(ms);
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for MockHardware {
    fn read_temperature(&mut self) -> f32 {
        self.temp_c
    }

    fn rtd_fault(&mut self) -> u8 {
        self.rtd_fault
    }

    fn clear_rtd_fault(&mut self) {
        self.rtd_fault_clears += 1;
        self.rtd_fault = 0;
    }

    fn reservoir_weight(&mut self) -> f32 {
        self.weight_g
    }
}

impl ActuatorPort for MockHardware {
    fn set_heater_power(&mut self, percent: f32) {
        self.calls.push(ActuatorCall::Heater(percent));
    }

    fn pump_on(&mut self) {
        self.pump = true;
        self.calls.push(ActuatorCall::PumpOn);
    }

    fn pump_off(&mut self) {
        if self.pump {
            self.weight_g -= self.drain_per_pump_run_g;
        }
        self.pump = false;
        self.calls.push(ActuatorCall::PumpOff);
    }

    fn is_pump_on(&self) -> bool {
        self.pump
    }
}

impl WatchdogPort for MockHardware {
    fn feed(&mut self) {
        self.feeds += 1;
    }
}

impl Clock for MockHardware {
    fn now_ms(&self) -> Ticks {
        self.now
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<BoilerEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events other than periodic telemetry.
    pub fn significant(&self) -> Vec<&BoilerEvent> {
        self.events
            .iter()
            .filter(|e| !matches!(e, BoilerEvent::Telemetry(_)))
            .collect()
    }

    pub fn contains(&self, event: &BoilerEvent) -> bool {
        self.events.contains(event)
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &BoilerEvent) {
        self.events.push(event.clone());
    }
}

// ── Fixture ───────────────────────────────────────────────────

pub struct Rig {
    pub ctl: BoilerController,
    pub hw: MockHardware,
    pub sink: RecordingSink,
}

#[allow(dead_code)]
impl Rig {
    pub fn new() -> Self {
        Self::with_config(BoilerConfig::default())
    }

    pub fn with_config(config: BoilerConfig) -> Self {
        let mut rig = Self {
            ctl: BoilerController::new(config),
            hw: MockHardware::new(),
            sink: RecordingSink::new(),
        };
        rig.ctl.start(&mut rig.hw, &mut rig.sink);
        rig
    }

    /// Advance the clock by `ms`, then run one control tick.
    pub fn tick_after(&mut self, ms: Ticks) {
        self.hw.advance(ms);
        self.ctl.tick(&mut self.hw, &mut self.sink);
    }

    pub fn command(&mut self, cmd: boilerctl::app::commands::BoilerCommand) {
        self.ctl.handle_command(cmd, &mut self.hw, &mut self.sink);
    }
}
