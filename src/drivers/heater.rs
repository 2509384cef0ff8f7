//! Boiler heater SSR driver.
//!
//! A zero-cross solid-state relay cannot be PWM'd at LEDC rates, so power
//! is time-proportioned over a fixed window: at 30 % the SSR conducts for
//! the first 300 ms of every 1 s window.
//!
//! ```text
//!   power 30 %   ┌───┐       ┌───┐       ┌───┐
//!                │   │       │   │       │   │
//!            ────┘   └───────┘   └───────┘   └────
//!                |<-- 1 s -->|
//! ```
//!
//! `update()` must be called often (every main-loop pass) for the duty
//! cycle to be accurate; the control tick only changes the set power.

use embedded_hal::digital::OutputPin;
use log::warn;

use crate::error::{ActuatorError, Result};
use crate::time::{Ticks, time_difference};

/// Time-proportioning window.
pub const WINDOW_MS: Ticks = 1000;

pub struct HeaterSsr<P> {
    pin: P,
    power_pct: f32,
    window_start: Option<Ticks>,
    on: bool,
}

impl<P: OutputPin> HeaterSsr<P> {
    /// Take the SSR pin and force it off.
    pub fn new(mut pin: P) -> Self {
        if pin.set_low().is_err() {
            warn!("heater: initial SSR write failed");
        }
        Self {
            pin,
            power_pct: 0.0,
            window_start: None,
            on: false,
        }
    }

    /// Set the power level (clamped to 0–100 %).  Zero switches the SSR
    /// off at once instead of waiting for the window to end.
    pub fn set_power(&mut self, percent: f32) -> Result<()> {
        self.power_pct = if percent.is_finite() {
            percent.clamp(0.0, 100.0)
        } else {
            0.0
        };
        if self.power_pct <= 0.0 {
            self.window_start = None;
            self.drive(false)?;
        }
        Ok(())
    }

    pub fn power(&self) -> f32 {
        self.power_pct
    }

    /// Whether the SSR is conducting right now.
    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Drive the SSR for the current position in the window.
    pub fn update(&mut self, now: Ticks) -> Result<()> {
        if self.power_pct <= 0.0 {
            return self.drive(false);
        }

        let start = match self.window_start {
            Some(start) if time_difference(now, start) < WINDOW_MS => start,
            _ => {
                self.window_start = Some(now);
                now
            }
        };

        let on_ms = (self.power_pct / 100.0 * WINDOW_MS as f32) as Ticks;
        self.drive(time_difference(now, start) < on_ms)
    }

    fn drive(&mut self, on: bool) -> Result<()> {
        let res = if on { self.pin.set_high() } else { self.pin.set_low() };
        res.map_err(|_| ActuatorError::GpioWriteFailed)?;
        self.on = on;
        Ok(())
    }
}
