//! BoilerController → FSM → actuators, driven tick by tick.

use boilerctl::app::commands::BoilerCommand;
use boilerctl::app::events::BoilerEvent;
use boilerctl::config::BoilerConfig;
use boilerctl::error::ErrorKind;
use boilerctl::fill_check::CheckReason;
use boilerctl::fsm::{BoilerMode, FeedForwardSlot};
use boilerctl::time::Ticks;

use crate::mock_hw::Rig;

/// Tick spacing that keeps a 1 °C/tick ramp at 20 °C/min, under the
/// dry-boiler limit.
const SLOW_TICK_MS: Ticks = 3_000;

fn heating_rig() -> Rig {
    let mut rig = Rig::new();
    rig.command(BoilerCommand::SetTemperature(93.0));
    rig.command(BoilerCommand::Enable);
    rig.tick_after(100);
    assert_eq!(rig.ctl.mode(), BoilerMode::Heating);
    rig
}

fn ready_rig() -> Rig {
    let mut rig = heating_rig();
    rig.hw.temp_c = 90.0;
    rig.tick_after(100);
    assert_eq!(rig.ctl.mode(), BoilerMode::Ready);
    rig
}

// ── Mode coverage ─────────────────────────────────────────────

#[test]
fn starts_off_and_idle() {
    let rig = Rig::new();
    assert_eq!(rig.ctl.mode(), BoilerMode::Off);
    assert_eq!(rig.ctl.error_text(), "OK");
    assert!(!rig.ctl.is_enabled());
    assert_eq!(rig.sink.events, [BoilerEvent::Started(BoilerMode::Off)]);
}

#[test]
fn off_stays_off_until_enabled() {
    let mut rig = Rig::new();
    for _ in 0..5 {
        rig.tick_after(100);
    }
    assert_eq!(rig.ctl.mode(), BoilerMode::Off);
    assert_eq!(rig.hw.heater(), 0.0);
}

#[test]
fn enable_moves_off_to_heating() {
    let rig = heating_rig();
    assert!(rig.sink.contains(&BoilerEvent::ModeChanged {
        from: BoilerMode::Off,
        to: BoilerMode::Heating,
    }));
    assert!(rig.hw.heater() > 0.0, "cold boiler must be heated");
}

#[test]
fn ready_entered_exactly_at_window_edge() {
    let mut rig = heating_rig();
    for temp in 21..=83 {
        rig.hw.temp_c = temp as f32;
        rig.tick_after(SLOW_TICK_MS);
        let expected = if temp >= 83 {
            BoilerMode::Ready
        } else {
            BoilerMode::Heating
        };
        assert_eq!(rig.ctl.mode(), expected, "at {temp} C");
    }
    assert_eq!(rig.ctl.error(), None);
}

#[test]
fn ready_falls_back_to_heating_when_set_point_moves() {
    let mut rig = ready_rig();
    rig.command(BoilerCommand::SetTemperature(105.0));
    rig.tick_after(100);
    assert_eq!(rig.ctl.mode(), BoilerMode::Heating);
}

#[test]
fn brew_from_heating_and_ready() {
    let mut rig = heating_rig();
    rig.command(BoilerCommand::StartBrew);
    rig.tick_after(100);
    assert_eq!(rig.ctl.mode(), BoilerMode::Brew);

    let mut rig = ready_rig();
    rig.command(BoilerCommand::StartBrew);
    rig.tick_after(100);
    assert_eq!(rig.ctl.mode(), BoilerMode::Brew);
}

#[test]
fn brew_applies_brew_feed_forward_and_clears_on_exit() {
    let mut rig = ready_rig();
    rig.command(BoilerCommand::StartBrew);
    rig.tick_after(100);
    assert_eq!(rig.ctl.active_feed_forward(), rig.ctl.config().ff_brew_pct);

    rig.command(BoilerCommand::StopBrew);
    rig.tick_after(100);
    assert_eq!(rig.ctl.mode(), BoilerMode::Heating);
    assert!(!rig.ctl.brew_requested());
    assert_eq!(rig.ctl.active_feed_forward(), rig.ctl.config().ff_heat_pct);

    // Still in the window: back to Ready on the next tick.
    rig.tick_after(100);
    assert_eq!(rig.ctl.mode(), BoilerMode::Ready);
}

#[test]
fn disable_returns_every_active_mode_to_off() {
    let mut rigs = [heating_rig(), ready_rig(), ready_rig()];
    rigs[2].command(BoilerCommand::StartBrew);
    rigs[2].tick_after(100);
    assert_eq!(rigs[2].ctl.mode(), BoilerMode::Brew);

    for rig in &mut rigs {
        let from = rig.ctl.mode();
        rig.command(BoilerCommand::Disable);
        assert_eq!(rig.hw.heater(), 0.0, "heater must be zeroed at once");
        rig.tick_after(100);
        assert_eq!(rig.ctl.mode(), BoilerMode::Off, "from {from}");
        assert_eq!(rig.hw.heater(), 0.0);
    }
}

// ── Timeouts ──────────────────────────────────────────────────

#[test]
fn heating_timeout_raises_fault() {
    let mut rig = Rig::with_config(BoilerConfig {
        heating_timeout_ms: 600,
        ..BoilerConfig::default()
    });
    rig.command(BoilerCommand::SetTemperature(93.0));
    rig.command(BoilerCommand::Enable);
    rig.tick_after(100);
    assert_eq!(rig.ctl.mode(), BoilerMode::Heating);

    for _ in 0..5 {
        rig.tick_after(100);
        assert_eq!(rig.ctl.mode(), BoilerMode::Heating);
    }
    rig.tick_after(100);
    assert_eq!(rig.ctl.mode(), BoilerMode::Error);
    assert_eq!(rig.ctl.error(), Some(ErrorKind::TimeoutHeating));
    assert_eq!(rig.ctl.error_text(), "TIMEOUT_HEATING");
    assert_eq!(rig.hw.heater(), 0.0);
    assert!(!rig.ctl.is_enabled());
    assert_eq!(rig.ctl.set_point(), 0.0);
}

#[test]
fn brew_timeout_raises_fault() {
    let mut rig = Rig::with_config(BoilerConfig {
        brew_timeout_ms: 1_000,
        ..BoilerConfig::default()
    });
    rig.command(BoilerCommand::SetTemperature(93.0));
    rig.command(BoilerCommand::Enable);
    rig.command(BoilerCommand::StartBrew);
    rig.hw.temp_c = 92.0;
    rig.tick_after(100);
    rig.tick_after(100);
    assert_eq!(rig.ctl.mode(), BoilerMode::Brew);
    for _ in 0..10 {
        rig.tick_after(100);
    }
    assert_eq!(rig.ctl.error(), Some(ErrorKind::TimeoutBrew));
    assert!(!rig.ctl.brew_requested());
}

#[test]
fn stalled_control_loop_raises_fault() {
    let mut rig = heating_rig();
    rig.tick_after(10_000);
    assert_eq!(rig.ctl.error(), Some(ErrorKind::ControlTimeout));
    assert_eq!(rig.ctl.mode(), BoilerMode::Error);
}

#[test]
fn long_gap_while_off_is_not_a_stall() {
    let mut rig = Rig::new();
    rig.tick_after(100);
    rig.tick_after(60_000);
    assert_eq!(rig.ctl.error(), None);
}

// ── Sensor faults ─────────────────────────────────────────────

#[test]
fn over_temperature_forces_error_in_same_tick() {
    let mut rig = heating_rig();
    rig.hw.temp_c = 109.0;
    rig.tick_after(100);
    assert_eq!(rig.ctl.mode(), BoilerMode::Error);
    assert_eq!(rig.ctl.error(), Some(ErrorKind::OverTemp));
    assert_eq!(rig.hw.heater(), 0.0);
    assert!(rig.sink.contains(&BoilerEvent::FaultRaised(ErrorKind::OverTemp)));
}

#[test]
fn rtd_fault_is_acknowledged_and_latched() {
    let mut rig = heating_rig();
    rig.hw.rtd_fault = 0x40;
    rig.tick_after(100);
    assert_eq!(rig.hw.rtd_fault_clears, 1);
    assert_eq!(rig.ctl.error(), Some(ErrorKind::RtdFault));
    assert_eq!(rig.ctl.error_text(), "RTD_ERROR");
}

#[test]
fn implausibly_cold_reading_is_sensor_fault() {
    let mut rig = heating_rig();
    rig.hw.temp_c = 0.0;
    rig.tick_after(100);
    assert_eq!(rig.ctl.error(), Some(ErrorKind::RtdFault));
}

#[test]
fn nan_reading_is_sensor_fault() {
    let mut rig = heating_rig();
    rig.hw.temp_c = f32::NAN;
    rig.tick_after(100);
    assert!(rig.ctl.actual_temperature().is_nan());
    assert_eq!(rig.ctl.error(), Some(ErrorKind::RtdFault));
    assert_eq!(rig.hw.heater(), 0.0);
}

#[test]
fn first_fault_stays_latched() {
    let mut rig = heating_rig();
    rig.hw.temp_c = 120.0;
    rig.tick_after(100);
    rig.hw.rtd_fault = 0x80;
    rig.tick_after(100);
    assert_eq!(rig.ctl.error(), Some(ErrorKind::OverTemp));
    let raised = rig
        .sink
        .events
        .iter()
        .filter(|e| matches!(e, BoilerEvent::FaultRaised(_)))
        .count();
    assert_eq!(raised, 1);
}

// ── Error recovery ────────────────────────────────────────────

#[test]
fn error_is_terminal_until_cleared() {
    let mut rig = heating_rig();
    rig.hw.temp_c = 110.0;
    rig.tick_after(100);
    rig.hw.temp_c = 90.0;
    for _ in 0..20 {
        rig.tick_after(100);
    }
    assert_eq!(rig.ctl.mode(), BoilerMode::Error);

    rig.command(BoilerCommand::Enable);
    assert!(!rig.ctl.is_enabled(), "enable refused while faulted");

    rig.command(BoilerCommand::ClearError);
    assert!(rig.sink.contains(&BoilerEvent::ErrorCleared));
    rig.tick_after(100);
    assert_eq!(rig.ctl.mode(), BoilerMode::Off);
    assert_eq!(rig.ctl.error_text(), "OK");

    rig.command(BoilerCommand::SetTemperature(93.0));
    rig.command(BoilerCommand::Enable);
    rig.tick_after(100);
    assert_eq!(rig.ctl.mode(), BoilerMode::Heating);
}

#[test]
fn clearing_while_condition_persists_faults_again() {
    let mut rig = heating_rig();
    rig.hw.temp_c = 110.0;
    rig.tick_after(100);
    rig.command(BoilerCommand::ClearError);
    rig.tick_after(100);
    assert_eq!(rig.ctl.mode(), BoilerMode::Error);
    assert_eq!(rig.ctl.error(), Some(ErrorKind::OverTemp));
}

// ── Dry boiler ────────────────────────────────────────────────

#[test]
fn fast_rise_when_hot_is_dry_boiler() {
    let mut rig = Rig::new();
    rig.hw.temp_c = 60.0;
    rig.command(BoilerCommand::SetTemperature(93.0));
    rig.command(BoilerCommand::Enable);
    rig.tick_after(1_000);
    // 1 °C per second = 60 °C/min
    for _ in 0..10 {
        rig.hw.temp_c += 1.0;
        rig.tick_after(1_000);
    }
    assert_eq!(rig.ctl.error(), Some(ErrorKind::DryBoiler));
    assert_eq!(rig.ctl.mode(), BoilerMode::Error);

    // Emergency fill was requested before the fault was latched, and it
    // keeps running in Error.
    let significant = rig.sink.significant();
    let fill_at = significant
        .iter()
        .position(|e| **e == BoilerEvent::FillCheckStarted(CheckReason::Emergency))
        .unwrap();
    let fault_at = significant
        .iter()
        .position(|e| **e == BoilerEvent::FaultRaised(ErrorKind::DryBoiler))
        .unwrap();
    assert!(fill_at < fault_at);
    assert!(rig.hw.pump);
    assert!(rig.ctl.fill_check_in_progress());
    assert_eq!(rig.hw.heater(), 0.0);
}

#[test]
fn dry_boiler_clears_without_stale_rates() {
    let mut rig = Rig::new();
    rig.hw.temp_c = 60.0;
    rig.command(BoilerCommand::SetTemperature(93.0));
    rig.command(BoilerCommand::Enable);
    rig.tick_after(1_000);
    for _ in 0..10 {
        rig.hw.temp_c += 1.0;
        rig.tick_after(1_000);
    }
    assert_eq!(rig.ctl.error(), Some(ErrorKind::DryBoiler));

    // Boiler refilled and holding steady.
    rig.hw.temp_c = 90.0;
    rig.tick_after(60_000);
    rig.command(BoilerCommand::ClearError);
    rig.tick_after(100);
    assert_eq!(rig.ctl.mode(), BoilerMode::Off);

    rig.command(BoilerCommand::SetTemperature(93.0));
    rig.command(BoilerCommand::Enable);
    rig.tick_after(100);
    assert_eq!(rig.ctl.error(), None);
    assert_eq!(rig.ctl.mode(), BoilerMode::Heating);
    assert_eq!(rig.ctl.status().heating_rate_c_per_min, None);

    for _ in 0..15 {
        rig.tick_after(1_000);
    }
    assert_eq!(rig.ctl.error(), None);
    assert_eq!(rig.ctl.mode(), BoilerMode::Ready);
}

#[test]
fn fast_rise_when_cold_is_not_dry_boiler() {
    let mut rig = Rig::new();
    rig.hw.temp_c = 20.0;
    rig.command(BoilerCommand::SetTemperature(93.0));
    rig.command(BoilerCommand::Enable);
    rig.tick_after(1_000);
    for _ in 0..25 {
        rig.hw.temp_c += 1.0;
        rig.tick_after(1_000);
    }
    assert!(rig.hw.temp_c <= 50.0);
    assert_eq!(rig.ctl.error(), None);
    assert!(rig.ctl.status().heating_rate_c_per_min.is_some());
}

#[test]
fn dry_check_suppressed_while_brewing() {
    let mut rig = Rig::new();
    rig.hw.temp_c = 85.0;
    rig.command(BoilerCommand::SetTemperature(93.0));
    rig.command(BoilerCommand::Enable);
    rig.command(BoilerCommand::StartBrew);
    rig.tick_after(1_000);
    rig.tick_after(1_000);
    assert_eq!(rig.ctl.mode(), BoilerMode::Brew);
    for _ in 0..15 {
        rig.hw.temp_c += 1.0;
        rig.tick_after(1_000);
    }
    assert_eq!(rig.ctl.error(), None);
    assert_eq!(rig.ctl.mode(), BoilerMode::Brew);
}

// ── Commands ──────────────────────────────────────────────────

#[test]
fn set_temperature_is_clamped_to_high_limit() {
    let mut rig = Rig::new();
    rig.command(BoilerCommand::SetTemperature(130.0));
    assert_eq!(rig.ctl.set_point(), 108.0);
}

#[test]
fn feed_forward_retune_takes_effect_in_active_mode() {
    let mut rig = ready_rig();
    rig.command(BoilerCommand::SetFeedForward {
        slot: FeedForwardSlot::Ready,
        percent: 5.0,
    });
    assert_eq!(rig.ctl.active_feed_forward(), 5.0);
}

#[test]
fn boiler_check_refused_while_brewing() {
    let mut rig = ready_rig();
    rig.command(BoilerCommand::StartBrew);
    rig.tick_after(100);
    rig.command(BoilerCommand::RequestBoilerCheck(CheckReason::PostBrew));
    assert!(!rig.ctl.fill_check_in_progress());
    assert!(!rig.hw.pump);
}

// ── Telemetry and liveness ────────────────────────────────────

#[test]
fn telemetry_reports_status() {
    let mut rig = heating_rig();
    rig.tick_after(1_000);
    let last = rig
        .sink
        .events
        .iter()
        .rev()
        .find_map(|e| match e {
            BoilerEvent::Telemetry(s) => Some(s.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(last.mode, BoilerMode::Heating);
    assert_eq!(last.mode_name, "heating");
    assert_eq!(last.error_text, "OK");
    assert_eq!(last.set_temp_c, 93.0);
    assert!(last.enabled);
    let json = last.to_json().unwrap();
    assert!(json.contains("\"mode\":\"heating\""));
}

#[test]
fn watchdog_fed_once_per_tick() {
    let mut rig = heating_rig();
    for _ in 0..9 {
        rig.tick_after(100);
    }
    assert_eq!(rig.hw.feeds, 10);
}

#[test]
fn runs_cleanly_across_clock_wrap() {
    let mut rig = Rig::new();
    rig.hw.now = Ticks::MAX - 5_000;
    rig.command(BoilerCommand::SetTemperature(93.0));
    rig.command(BoilerCommand::Enable);
    rig.hw.temp_c = 90.0;
    for _ in 0..100 {
        rig.tick_after(100);
    }
    assert!(rig.hw.now < 10_000, "clock wrapped");
    assert_eq!(rig.ctl.error(), None);
    assert_eq!(rig.ctl.mode(), BoilerMode::Ready);
}
