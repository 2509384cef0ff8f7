//! Water reservoir weight (HX711 load-cell amplifier).
//!
//! The reservoir is polled from the main loop; a reading is taken only
//! when the HX711 signals a finished conversion, so polling never blocks.
//! Raw counts pass through a deglitch filter before calibration.
//!
//! ## Deglitching
//!
//! A sample that jumps more than the glitch limit away from the accepted
//! weight is rejected, up to three times in a row.  The fourth consecutive
//! outlier is accepted, so a real step change (reservoir lifted off, refill)
//! lands after a short delay.  The very first sample is always accepted.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use log::{debug, warn};

use crate::error::{Result, SensorError};

/// Consecutive not-ready polls before the reservoir reports `NoReadings`.
pub const MAX_NOT_READY_POLLS: u32 = 50;

/// Consecutive outliers rejected before one is accepted.
const MAX_REJECTED_GLITCHES: u8 = 3;

/// Any 24-bit load-cell converter.
pub trait LoadCell {
    /// A conversion is waiting to be read.
    fn is_ready(&mut self) -> bool;

    /// Read the pending conversion (signed counts).
    fn read_raw(&mut self) -> Result<i32>;
}

// ---------------------------------------------------------------------------
// HX711
// ---------------------------------------------------------------------------

/// Bit-banged HX711 on channel A, gain 128.
pub struct Hx711<SCK, DT, D> {
    sck: SCK,
    dt: DT,
    delay: D,
}

impl<SCK: OutputPin, DT: InputPin, D: DelayNs> Hx711<SCK, DT, D> {
    pub fn new(mut sck: SCK, dt: DT, delay: D) -> Self {
        // SCK idles low; held high > 60 µs would power the chip down.
        if sck.set_low().is_err() {
            warn!("reservoir: initial HX711 SCK write failed");
        }
        Self { sck, dt, delay }
    }

    fn pulse(&mut self) -> Result<()> {
        self.sck.set_high().map_err(|_| SensorError::GpioReadFailed)?;
        self.delay.delay_us(1);
        self.sck.set_low().map_err(|_| SensorError::GpioReadFailed)?;
        self.delay.delay_us(1);
        Ok(())
    }
}

impl<SCK: OutputPin, DT: InputPin, D: DelayNs> LoadCell for Hx711<SCK, DT, D> {
    fn is_ready(&mut self) -> bool {
        self.dt.is_low().unwrap_or(false)
    }

    fn read_raw(&mut self) -> Result<i32> {
        let mut value: u32 = 0;
        for _ in 0..24 {
            self.pulse()?;
            let bit = self.dt.is_high().map_err(|_| SensorError::GpioReadFailed)?;
            value = (value << 1) | u32::from(bit);
        }
        // 25th pulse selects channel A, gain 128 for the next conversion.
        self.pulse()?;
        // Sign-extend 24 → 32 bits.
        Ok(((value << 8) as i32) >> 8)
    }
}

// ---------------------------------------------------------------------------
// Deglitch filter
// ---------------------------------------------------------------------------

/// Outlier rejection on consecutive samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Deglitcher {
    limit: f32,
    accepted: Option<f32>,
    rejected: u8,
}

impl Deglitcher {
    pub fn new(limit: f32) -> Self {
        Self {
            limit,
            accepted: None,
            rejected: 0,
        }
    }

    /// Offer a sample; returns the currently accepted value.
    pub fn filter(&mut self, sample: f32) -> f32 {
        match self.accepted {
            Some(prev) if (sample - prev).abs() > self.limit && self.rejected < MAX_REJECTED_GLITCHES => {
                self.rejected += 1;
                debug!(
                    "reservoir: deglitched {sample:.1} (accepted {prev:.1}, run {})",
                    self.rejected
                );
                prev
            }
            _ => {
                self.rejected = 0;
                self.accepted = Some(sample);
                sample
            }
        }
    }

    pub fn value(&self) -> Option<f32> {
        self.accepted
    }
}

// ---------------------------------------------------------------------------
// Reservoir
// ---------------------------------------------------------------------------

/// Reservoir fault.  Sticky once raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservoirError {
    /// Net weight above capacity + 100 g.
    OutOfRange,
    /// Net weight below −100 g.
    Negative,
    /// Load cell stopped producing conversions.
    NoReadings,
    /// Load cell read failed.
    Sensor,
}

impl ReservoirError {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OutOfRange => "OUT_OF_RANGE",
            Self::Negative => "NEGATIVE_READING",
            Self::NoReadings => "NO_READINGS",
            Self::Sensor => "SENSOR_ERROR",
        }
    }
}

/// Counts → grams.  Calibration procedures themselves live elsewhere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    /// Raw count at zero load.
    pub offset: i32,
    /// Counts per gram.
    pub scale: f32,
    /// Span trim (%).
    pub trim_pct: f32,
    /// Empty reservoir weight (g).
    pub tare_g: f32,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            offset: 0,
            scale: 420.0,
            trim_pct: 0.0,
            tare_g: 0.0,
        }
    }
}

pub struct Reservoir<C> {
    cell: C,
    calibration: Calibration,
    deglitch: Deglitcher,
    capacity_g: f32,
    weight_net_g: f32,
    not_ready_polls: u32,
    error: Option<ReservoirError>,
}

impl<C: LoadCell> Reservoir<C> {
    pub fn new(cell: C, calibration: Calibration, glitch_limit_g: f32, capacity_g: f32) -> Self {
        Self {
            cell,
            calibration,
            deglitch: Deglitcher::new(glitch_limit_g),
            capacity_g,
            weight_net_g: 0.0,
            not_ready_polls: 0,
            error: None,
        }
    }

    /// Take a reading if one is ready.  Never blocks.
    pub fn poll(&mut self) {
        self.not_ready_polls = self.not_ready_polls.saturating_add(1);
        if self.not_ready_polls > MAX_NOT_READY_POLLS {
            self.set_error(ReservoirError::NoReadings);
        }
        if !self.cell.is_ready() {
            return;
        }
        self.not_ready_polls = 0;

        let raw = match self.cell.read_raw() {
            Ok(raw) => raw,
            Err(e) => {
                warn!("reservoir: {e}");
                self.set_error(ReservoirError::Sensor);
                return;
            }
        };

        let gross = (raw - self.calibration.offset) as f32 / self.calibration.scale;
        let gross = self.deglitch.filter(gross);
        self.weight_net_g = gross / (1.0 + self.calibration.trim_pct / 100.0) - self.calibration.tare_g;

        if self.weight_net_g > self.capacity_g + 100.0 {
            self.set_error(ReservoirError::OutOfRange);
        }
        if self.weight_net_g < -100.0 {
            self.set_error(ReservoirError::Negative);
        }
    }

    /// Net weight (g) of the last accepted reading.
    pub fn weight(&self) -> f32 {
        self.weight_net_g
    }

    pub fn error(&self) -> Option<ReservoirError> {
        self.error
    }

    /// `"OK"` when healthy.
    pub fn error_text(&self) -> &'static str {
        self.error.map_or("OK", ReservoirError::as_str)
    }

    fn set_error(&mut self, error: ReservoirError) {
        if self.error != Some(error) {
            warn!("reservoir: {}", error.as_str());
        }
        self.error = Some(error);
    }
}
