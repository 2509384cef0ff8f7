//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the RTD front-end, the reservoir, the heater SSR, the pump relay,
//! the task watchdog and the clock, exposing them through [`SensorPort`],
//! [`ActuatorPort`], [`WatchdogPort`] and [`Clock`].  This is the only
//! module that touches actual hardware.  Everything is generic over
//! `embedded-hal` traits, so on non-espidf targets it runs against fakes.

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiDevice;
use log::warn;

use crate::adapters::time::Esp32TimeAdapter;
use crate::app::ports::{ActuatorPort, SensorPort, WatchdogPort};
use crate::drivers::heater::HeaterSsr;
use crate::drivers::pump::PumpDriver;
use crate::drivers::watchdog::Watchdog;
use crate::sensors::reservoir::{LoadCell, Reservoir};
use crate::sensors::rtd::Max31865;
use crate::time::{Clock, Ticks};

/// Fault code reported when the RTD front-end cannot be reached at all.
pub const RTD_TRANSPORT_FAULT: u8 = 0xFF;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<SPI, H, P, C> {
    rtd: Max31865<SPI>,
    reservoir: Reservoir<C>,
    heater: HeaterSsr<H>,
    pump: PumpDriver<P>,
    watchdog: Watchdog,
    clock: Esp32TimeAdapter,
    /// Latched when an RTD transfer fails; cleared with the RTD fault.
    rtd_transport_failed: bool,
}

impl<SPI, H, P, C> HardwareAdapter<SPI, H, P, C>
where
    SPI: SpiDevice,
    H: OutputPin,
    P: OutputPin,
    C: LoadCell,
{
    pub fn new(
        rtd: Max31865<SPI>,
        reservoir: Reservoir<C>,
        heater: HeaterSsr<H>,
        pump: PumpDriver<P>,
        watchdog: Watchdog,
        clock: Esp32TimeAdapter,
    ) -> Self {
        Self {
            rtd,
            reservoir,
            heater,
            pump,
            watchdog,
            clock,
            rtd_transport_failed: false,
        }
    }

    /// Fast-path housekeeping, called on every main-loop pass between
    /// control ticks: reservoir sampling and SSR time-proportioning.
    pub fn poll(&mut self) {
        self.reservoir.poll();
        let now = self.clock.now_ms();
        if let Err(e) = self.heater.update(now) {
            warn!("heater: {e}");
        }
    }

    pub fn reservoir_error_text(&self) -> &'static str {
        self.reservoir.error_text()
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<SPI, H, P, C> SensorPort for HardwareAdapter<SPI, H, P, C>
where
    SPI: SpiDevice,
    H: OutputPin,
    P: OutputPin,
    C: LoadCell,
{
    fn read_temperature(&mut self) -> f32 {
        match self.rtd.temperature() {
            Ok(t) => t,
            Err(e) => {
                warn!("rtd: {e}");
                self.rtd_transport_failed = true;
                f32::NAN
            }
        }
    }

    fn rtd_fault(&mut self) -> u8 {
        if self.rtd_transport_failed {
            return RTD_TRANSPORT_FAULT;
        }
        self.rtd.fault().unwrap_or(RTD_TRANSPORT_FAULT)
    }

    fn clear_rtd_fault(&mut self) {
        self.rtd_transport_failed = false;
        if let Err(e) = self.rtd.clear_fault() {
            warn!("rtd: clear fault failed: {e}");
        }
    }

    fn reservoir_weight(&mut self) -> f32 {
        self.reservoir.weight()
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<SPI, H, P, C> ActuatorPort for HardwareAdapter<SPI, H, P, C>
where
    SPI: SpiDevice,
    H: OutputPin,
    P: OutputPin,
    C: LoadCell,
{
    fn set_heater_power(&mut self, percent: f32) {
        if let Err(e) = self.heater.set_power(percent) {
            warn!("heater: {e}");
        }
    }

    fn pump_on(&mut self) {
        if let Err(e) = self.pump.on() {
            warn!("pump: {e}");
        }
    }

    fn pump_off(&mut self) {
        if let Err(e) = self.pump.off() {
            warn!("pump: {e}");
        }
    }

    fn is_pump_on(&self) -> bool {
        self.pump.is_running()
    }
}

// ── WatchdogPort / Clock ──────────────────────────────────────

impl<SPI, H, P, C> WatchdogPort for HardwareAdapter<SPI, H, P, C> {
    fn feed(&mut self) {
        self.watchdog.feed();
    }
}

impl<SPI, H, P, C> Clock for HardwareAdapter<SPI, H, P, C> {
    fn now_ms(&self) -> Ticks {
        self.clock.now_ms()
    }
}
