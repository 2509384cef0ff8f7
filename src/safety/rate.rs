//! Heating-rate monitor (dry-boiler detection).
//!
//! A boiler with water in it heats at a bounded rate; an element running
//! dry heats far faster.  The monitor keeps the last [`RATE_WINDOW_LEN`]
//! heating-rate samples (°C/min) in a fixed ring and flags a suspected dry
//! boiler when their mean exceeds the configured limit **and** the boiler
//! is already hot.  The second condition keeps fast cold-start ramps from
//! tripping it.
//!
//! Until `min_samples` rates have been collected the monitor gives no
//! verdict at all rather than a misleading "normal".  Suspending the
//! monitor empties the window, so every verdict comes from rates measured
//! since the last resume.

use heapless::HistoryBuffer;

use crate::config::BoilerConfig;
use crate::time::{Ticks, ticks_to_secs, time_difference};

/// Capacity of the rate ring (one sample per second → a 30 s window).
pub const RATE_WINDOW_LEN: usize = 30;

/// Outcome of one monitor update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RateVerdict {
    /// Not enough samples yet.
    Insufficient,
    /// Mean heating rate is acceptable.
    Normal { avg_c_per_min: f32 },
    /// Mean heating rate exceeds the dry-boiler limit while hot.
    DrySuspected { avg_c_per_min: f32 },
}

pub struct TempRateMonitor {
    /// Ring of the most recent rate samples; `len()` is the valid count.
    rates: HistoryBuffer<f32, RATE_WINDOW_LEN>,
    /// Rate samples taken since construction (never wraps in practice).
    samples_taken: u32,
    /// Temperature and tick the next rate is measured from.
    previous: Option<(f32, Ticks)>,
    limit_c_per_min: f32,
    min_temp_c: f32,
    min_samples: usize,
    sample_interval_ms: Ticks,
}

impl TempRateMonitor {
    pub fn new(config: &BoilerConfig) -> Self {
        Self {
            rates: HistoryBuffer::new(),
            samples_taken: 0,
            previous: None,
            limit_c_per_min: config.dry_rate_limit_c_per_min,
            min_temp_c: config.dry_min_temp_c,
            min_samples: config.dry_min_samples.clamp(1, RATE_WINDOW_LEN),
            sample_interval_ms: config.rate_sample_interval_ms,
        }
    }

    /// Feed the latest temperature.  A new rate sample is recorded once at
    /// least the sample interval has passed since the previous one; the
    /// verdict is always evaluated against the current window.
    pub fn update(&mut self, temp_c: f32, now: Ticks) -> RateVerdict {
        match self.previous {
            None => self.previous = Some((temp_c, now)),
            Some((prev_temp, prev_at)) => {
                let elapsed = time_difference(now, prev_at);
                if elapsed > 0 && elapsed >= self.sample_interval_ms {
                    let rate = (temp_c - prev_temp) / ticks_to_secs(elapsed) * 60.0;
                    self.rates.write(rate);
                    self.samples_taken = self.samples_taken.saturating_add(1);
                    self.previous = Some((temp_c, now));
                }
            }
        }
        self.verdict(temp_c)
    }

    /// Drop the reference sample and the whole rate window.  Used while
    /// the monitor is suppressed (brewing, disabled, faulted): after a
    /// resume no verdict is given until `min_samples` fresh rates exist.
    pub fn suspend(&mut self) {
        self.previous = None;
        self.rates.clear();
    }

    /// Mean of the valid samples, if there are enough for a verdict.
    pub fn average(&self) -> Option<f32> {
        let window = self.rates.as_slice();
        if window.len() < self.min_samples {
            return None;
        }
        Some(window.iter().sum::<f32>() / window.len() as f32)
    }

    /// Rate samples recorded since construction.
    pub fn samples_taken(&self) -> u32 {
        self.samples_taken
    }

    /// Valid samples currently in the window (≤ [`RATE_WINDOW_LEN`]).
    pub fn window_len(&self) -> usize {
        self.rates.len()
    }

    fn verdict(&self, temp_c: f32) -> RateVerdict {
        match self.average() {
            None => RateVerdict::Insufficient,
            Some(avg) if avg > self.limit_c_per_min && temp_c > self.min_temp_c => {
                RateVerdict::DrySuspected { avg_c_per_min: avg }
            }
            Some(avg) => RateVerdict::Normal { avg_c_per_min: avg },
        }
    }
}
