//! Fuzz target: `BoilerController` command/tick sequences
//!
//! Decodes the input as a stream of 3-byte operations (command, sensor
//! change or tick) and checks after every tick that the heater is never
//! powered while the boiler is disabled or faulted.
//!
//! cargo fuzz run fuzz_controller

#![no_main]

use boilerctl::app::commands::BoilerCommand;
use boilerctl::app::controller::BoilerController;
use boilerctl::app::events::BoilerEvent;
use boilerctl::app::ports::{ActuatorPort, EventSink, SensorPort, WatchdogPort};
use boilerctl::config::BoilerConfig;
use boilerctl::fill_check::CheckReason;
use boilerctl::fsm::{BoilerMode, FeedForwardSlot};
use boilerctl::time::{Clock, Ticks};
use libfuzzer_sys::fuzz_target;

struct Bench {
    now: Ticks,
    temp_c: f32,
    rtd_fault: u8,
    weight_g: f32,
    heater: f32,
    pump: bool,
}

impl SensorPort for Bench {
    fn read_temperature(&mut self) -> f32 {
        self.temp_c
    }
    fn rtd_fault(&mut self) -> u8 {
        self.rtd_fault
    }
    fn clear_rtd_fault(&mut self) {
        self.rtd_fault = 0;
    }
    fn reservoir_weight(&mut self) -> f32 {
        self.weight_g
    }
}

impl ActuatorPort for Bench {
    fn set_heater_power(&mut self, percent: f32) {
        self.heater = percent;
    }
    fn pump_on(&mut self) {
        self.pump = true;
    }
    fn pump_off(&mut self) {
        self.pump = false;
    }
    fn is_pump_on(&self) -> bool {
        self.pump
    }
}

impl WatchdogPort for Bench {
    fn feed(&mut self) {}
}

impl Clock for Bench {
    fn now_ms(&self) -> Ticks {
        self.now
    }
}

struct Discard;

impl EventSink for Discard {
    fn emit(&mut self, _event: &BoilerEvent) {}
}

fn reason(b: u8) -> CheckReason {
    match b % 4 {
        0 => CheckReason::Startup,
        1 => CheckReason::PreSleep,
        2 => CheckReason::PostBrew,
        _ => CheckReason::Emergency,
    }
}

fn slot(b: u8) -> FeedForwardSlot {
    match b % 3 {
        0 => FeedForwardSlot::Heat,
        1 => FeedForwardSlot::Ready,
        _ => FeedForwardSlot::Brew,
    }
}

fuzz_target!(|data: &[u8]| {
    let mut ctl = BoilerController::new(BoilerConfig::default());
    let mut hw = Bench {
        now: 0,
        temp_c: 20.0,
        rtd_fault: 0,
        weight_g: 1500.0,
        heater: 0.0,
        pump: false,
    };
    let mut sink = Discard;
    ctl.start(&mut hw, &mut sink);

    for op in data.chunks_exact(3) {
        let (kind, a, b) = (op[0], op[1], op[2]);
        let wide = u16::from_le_bytes([a, b]);
        match kind % 12 {
            0 => ctl.handle_command(BoilerCommand::Enable, &mut hw, &mut sink),
            1 => ctl.handle_command(BoilerCommand::Disable, &mut hw, &mut sink),
            2 => ctl.handle_command(BoilerCommand::StartBrew, &mut hw, &mut sink),
            3 => ctl.handle_command(BoilerCommand::StopBrew, &mut hw, &mut sink),
            4 => ctl.handle_command(BoilerCommand::ClearError, &mut hw, &mut sink),
            5 => {
                let t = f32::from(wide) / 256.0 - 20.0;
                ctl.handle_command(BoilerCommand::SetTemperature(t), &mut hw, &mut sink);
            }
            6 => {
                let cmd = BoilerCommand::RequestBoilerCheck(reason(a));
                ctl.handle_command(cmd, &mut hw, &mut sink);
            }
            7 => {
                let cmd = BoilerCommand::SetFeedForward {
                    slot: slot(a),
                    percent: f32::from(b) - 50.0,
                };
                ctl.handle_command(cmd, &mut hw, &mut sink);
            }
            8 => {
                let cmd = BoilerCommand::SetPid {
                    p: f32::from(a) / 8.0,
                    i: f32::from(b) / 64.0,
                    d: 0.0,
                };
                ctl.handle_command(cmd, &mut hw, &mut sink);
            }
            9 => hw.temp_c = f32::from(wide) / 400.0 - 10.0,
            10 => {
                hw.rtd_fault = a & b;
                hw.weight_g = f32::from(wide) / 16.0;
            }
            _ => {
                hw.now = hw.now.wrapping_add(u32::from(wide));
                ctl.tick(&mut hw, &mut sink);

                assert!((0.0..=100.0).contains(&hw.heater));
                if !ctl.is_enabled() || ctl.mode() == BoilerMode::Error {
                    assert_eq!(hw.heater, 0.0, "heater powered while disabled or faulted");
                }
                assert_eq!(ctl.error().is_some(), ctl.mode() == BoilerMode::Error);
            }
        }
    }
});
