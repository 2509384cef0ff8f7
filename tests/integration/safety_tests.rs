//! Safety limits exercised end to end.
//!
//! Whatever the mode, a limit violation must leave the heater at zero in
//! the same tick it is seen.

use boilerctl::app::commands::BoilerCommand;
use boilerctl::config::BoilerConfig;
use boilerctl::error::ErrorKind;
use boilerctl::fsm::BoilerMode;
use boilerctl::safety::SafetySupervisor;

use crate::mock_hw::{ActuatorCall, Rig};

fn enabled_at(temp_c: f32) -> Rig {
    let mut rig = Rig::new();
    rig.hw.temp_c = temp_c;
    rig.command(BoilerCommand::SetTemperature(93.0));
    rig.command(BoilerCommand::Enable);
    rig.tick_after(100);
    rig
}

#[test]
fn limits_are_exclusive() {
    let mut safety = SafetySupervisor::new(&BoilerConfig::default());
    assert_eq!(safety.evaluate(108.0, 0), None);
    assert_eq!(safety.evaluate(1.0, 0), None);
    assert_eq!(safety.evaluate(108.1, 0), Some(ErrorKind::OverTemp));
    assert_eq!(safety.evaluate(0.9, 0), Some(ErrorKind::RtdFault));
    assert_eq!(safety.active_fault(), Some(ErrorKind::RtdFault));
    assert_eq!(safety.evaluate(50.0, 0), None);
    assert_eq!(safety.active_fault(), None);
}

#[test]
fn rtd_fault_code_wins_over_temperature() {
    let mut safety = SafetySupervisor::new(&BoilerConfig::default());
    assert_eq!(safety.evaluate(150.0, 0x04), Some(ErrorKind::RtdFault));
    assert_eq!(safety.evaluate(f32::INFINITY, 0), Some(ErrorKind::RtdFault));
}

#[test]
fn cutoff_sits_above_the_fault_limit() {
    let safety = SafetySupervisor::new(&BoilerConfig::default());
    assert!(!safety.heater_cutoff(110.0));
    assert!(safety.heater_cutoff(110.5));
    assert!(safety.heater_cutoff(f32::NAN));
}

#[test]
fn stall_needs_a_previous_tick() {
    let safety = SafetySupervisor::new(&BoilerConfig::default());
    assert!(!safety.control_stalled(None, 50_000));
    assert!(!safety.control_stalled(Some(1_000), 10_999));
    assert!(safety.control_stalled(Some(1_000), 11_000));
}

#[test]
fn every_limit_zeroes_heater_in_the_same_tick() {
    let cases: [(fn(&mut Rig), ErrorKind); 4] = [
        (|rig: &mut Rig| rig.hw.temp_c = 115.0, ErrorKind::OverTemp),
        (|rig: &mut Rig| rig.hw.temp_c = -20.0, ErrorKind::RtdFault),
        (|rig: &mut Rig| rig.hw.temp_c = f32::NAN, ErrorKind::RtdFault),
        (|rig: &mut Rig| rig.hw.rtd_fault = 0x20, ErrorKind::RtdFault),
    ];

    for (inject, expected) in cases {
        let mut rig = enabled_at(40.0);
        assert!(rig.hw.heater() > 0.0);
        inject(&mut rig);
        rig.tick_after(100);
        assert_eq!(rig.ctl.error(), Some(expected));
        assert_eq!(rig.ctl.mode(), BoilerMode::Error);
        assert_eq!(rig.hw.calls.last(), Some(&ActuatorCall::Heater(0.0)));
        assert_eq!(rig.ctl.power(), 0.0);
    }
}

#[test]
fn heater_stays_off_for_whole_error_period() {
    let mut rig = enabled_at(40.0);
    rig.hw.temp_c = 112.0;
    rig.tick_after(100);
    let fault_at = rig.hw.calls.len();

    // Cooling back into range does not re-arm the heater.
    for temp in [105.0, 95.0, 80.0] {
        rig.hw.temp_c = temp;
        rig.tick_after(100);
    }
    assert!(
        rig.hw.calls[fault_at..]
            .iter()
            .all(|c| *c == ActuatorCall::Heater(0.0))
    );
}

#[test]
fn faults_while_off_latch_too() {
    let mut rig = Rig::new();
    rig.hw.temp_c = 130.0;
    rig.tick_after(100);
    assert_eq!(rig.ctl.mode(), BoilerMode::Error);
    assert_eq!(rig.ctl.error(), Some(ErrorKind::OverTemp));
    assert_eq!(rig.hw.heater(), 0.0);
}

#[test]
fn set_point_is_zeroed_by_a_fault() {
    let mut rig = enabled_at(40.0);
    assert_eq!(rig.ctl.set_point(), 93.0);
    rig.hw.rtd_fault = 0x01;
    rig.tick_after(100);
    assert_eq!(rig.ctl.set_point(), 0.0);
    assert!(!rig.ctl.is_enabled());
}
