//! Boiler controller firmware: main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Adapters (outer ring)                    │
//! │                                                              │
//! │  HardwareAdapter                         LogEventSink        │
//! │  (Sensor+Actuator+Watchdog+Clock)        (EventSink)         │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ──────────────────     │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │           BoilerController (pure logic)                │  │
//! │  │  FSM · Safety · Rate · Fill check · PID                │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Pin map (ESP32-S3 controller board):
//!
//! | Signal            | GPIO |
//! |-------------------|------|
//! | MAX31865 SCLK     | 12   |
//! | MAX31865 SDI/MOSI | 11   |
//! | MAX31865 SDO/MISO | 13   |
//! | MAX31865 CS       | 10   |
//! | HX711 SCK         | 5    |
//! | HX711 DOUT        | 6    |
//! | Heater SSR        | 7    |
//! | Pump relay        | 15   |
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::delay::{Ets, FreeRtos};
use esp_idf_hal::gpio::PinDriver;
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::spi::config::Config as SpiConfig;
use esp_idf_hal::spi::{SpiDeviceDriver, SpiDriver, SpiDriverConfig};
use esp_idf_hal::units::FromValueType;
use log::{error, info, warn};

use boilerctl::adapters::hardware::HardwareAdapter;
use boilerctl::adapters::log_sink::LogEventSink;
use boilerctl::adapters::time::Esp32TimeAdapter;
use boilerctl::app::commands::BoilerCommand;
use boilerctl::app::controller::BoilerController;
use boilerctl::config::BoilerConfig;
use boilerctl::drivers::heater::HeaterSsr;
use boilerctl::drivers::pump::PumpDriver;
use boilerctl::drivers::watchdog::Watchdog;
use boilerctl::fill_check::CheckReason;
use boilerctl::sensors::reservoir::{Calibration, Hx711, Reservoir};
use boilerctl::sensors::rtd::{ConversionMode, Filter, Max31865, Wires};
use boilerctl::time::{Clock, has_elapsed};

/// Main-loop pass period.  Control ticks run on their own interval; the
/// passes in between service the SSR window and the load cell.
const LOOP_PERIOD_MS: u32 = 10;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  boilerctl v{}                    ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let config = BoilerConfig::default();
    if let Err(e) = config.validate() {
        error!("built-in configuration rejected: {e}");
        anyhow::bail!("invalid configuration: {e}");
    }

    // ── 3. Peripherals ────────────────────────────────────────
    let p = Peripherals::take()?;

    let spi = SpiDriver::new(
        p.spi2,
        p.pins.gpio12,
        p.pins.gpio11,
        Some(p.pins.gpio13),
        &SpiDriverConfig::new(),
    )?;
    let spi_dev = SpiDeviceDriver::new(
        spi,
        Some(p.pins.gpio10),
        &SpiConfig::new()
            .baudrate(1.MHz().into())
            .data_mode(embedded_hal::spi::MODE_1),
    )?;
    let mut rtd = Max31865::new(spi_dev, config.rtd_nominal_ohm, config.rtd_reference_ohm);
    if let Err(e) = rtd.begin(Wires::Two, Filter::Hz50, ConversionMode::Continuous) {
        // The controller will see the fault on its first tick.
        warn!("RTD init failed: {e}");
    }

    let hx711 = Hx711::new(
        PinDriver::output(p.pins.gpio5)?,
        PinDriver::input(p.pins.gpio6)?,
        Ets,
    );
    let reservoir = Reservoir::new(
        hx711,
        Calibration::default(),
        config.reservoir_glitch_limit_g,
        config.reservoir_capacity_g,
    );

    let heater = HeaterSsr::new(PinDriver::output(p.pins.gpio7)?);
    let pump = PumpDriver::new(PinDriver::output(p.pins.gpio15)?);
    let watchdog = Watchdog::new(config.watchdog_timeout_ms);

    let mut hw = HardwareAdapter::new(rtd, reservoir, heater, pump, watchdog, Esp32TimeAdapter::new());
    let mut sink = LogEventSink::new();

    // ── 4. Controller ─────────────────────────────────────────
    let control_interval = config.control_loop_interval_ms;
    let brew_temp = config.brew_temp_c;
    let mut controller = BoilerController::new(config);
    controller.start(&mut hw, &mut sink);

    // Give the load cell a few passes to produce a baseline before the
    // startup fill check reads it.
    for _ in 0..20 {
        hw.poll();
        FreeRtos::delay_ms(LOOP_PERIOD_MS);
    }
    info!("reservoir: {}", hw.reservoir_error_text());

    controller.handle_command(BoilerCommand::SetTemperature(brew_temp), &mut hw, &mut sink);
    controller.handle_command(BoilerCommand::Enable, &mut hw, &mut sink);
    controller.handle_command(
        BoilerCommand::RequestBoilerCheck(CheckReason::Startup),
        &mut hw,
        &mut sink,
    );

    // ── 5. Main loop ──────────────────────────────────────────
    let mut last_tick = hw.now_ms();
    loop {
        hw.poll();

        let now = hw.now_ms();
        if has_elapsed(now, last_tick, control_interval) {
            last_tick = now;
            controller.tick(&mut hw, &mut sink);
        }

        FreeRtos::delay_ms(LOOP_PERIOD_MS);
    }
}
