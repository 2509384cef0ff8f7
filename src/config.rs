//! Boiler configuration parameters
//!
//! All tunable parameters for the boiler controller.  Temperatures are in
//! °C, durations in milliseconds, power values in percent.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::safety::rate::RATE_WINDOW_LEN;

/// Core boiler configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoilerConfig {
    // --- Temperature limits ---
    /// Set point applied at power-on
    pub brew_temp_c: f32,
    /// Half-width of the "at temperature" window around the set point
    pub temp_window_c: f32,
    /// Above this the boiler is over temperature
    pub temp_limit_high_c: f32,
    /// Below this the reading is treated as a sensor fault
    pub temp_limit_low_c: f32,
    /// Heater is forced off above `temp_limit_high_c + heater_cutoff_margin_c`
    pub heater_cutoff_margin_c: f32,

    // --- Mode timeouts ---
    /// Maximum continuous time in Heating without reaching the window
    pub heating_timeout_ms: u32,
    /// Maximum time in Ready
    pub ready_timeout_ms: u32,
    /// Maximum brew duration
    pub brew_timeout_ms: u32,
    /// Maximum gap between two control ticks while enabled
    pub control_timeout_ms: u32,

    // --- Dry-boiler detection ---
    /// Average heating rate (°C/min) above which the boiler is suspected dry
    pub dry_rate_limit_c_per_min: f32,
    /// The rate verdict only applies above this temperature
    pub dry_min_temp_c: f32,
    /// Rate samples required before any verdict is given
    pub dry_min_samples: usize,
    /// Minimum spacing between two rate samples
    pub rate_sample_interval_ms: u32,

    // --- Boiler fill check ---
    /// Length of one pump probe
    pub fill_probe_ms: u32,
    /// Hard ceiling on total pumping for one check
    pub fill_max_ms: u32,
    /// Reservoir drop (g) below which the boiler is judged full
    pub fill_threshold_g: f32,

    // --- Sensors ---
    /// RTD resistance at 0 °C (100 for PT100)
    pub rtd_nominal_ohm: f32,
    /// MAX31865 reference resistor
    pub rtd_reference_ohm: f32,
    /// Largest accepted jump between two reservoir samples (g)
    pub reservoir_glitch_limit_g: f32,
    /// Nominal reservoir capacity (g)
    pub reservoir_capacity_g: f32,

    // --- PID ---
    pub pid_kp: f32,
    pub pid_ki: f32,
    pub pid_kd: f32,
    /// PID sample interval
    pub pid_sample_interval_ms: u32,
    /// Integral term bounds (%)
    pub windup_min_pct: f32,
    pub windup_max_pct: f32,

    // --- Feed-forward per mode (0-100 %) ---
    pub ff_heat_pct: f32,
    pub ff_ready_pct: f32,
    pub ff_brew_pct: f32,

    // --- Timing ---
    /// Control loop interval
    pub control_loop_interval_ms: u32,
    /// Task watchdog timeout
    pub watchdog_timeout_ms: u32,
    /// Telemetry report interval
    pub telemetry_interval_ms: u32,
}

impl Default for BoilerConfig {
    fn default() -> Self {
        Self {
            // Temperature limits
            brew_temp_c: 93.0,
            temp_window_c: 10.0,
            temp_limit_high_c: 108.0,
            temp_limit_low_c: 1.0,
            heater_cutoff_margin_c: 2.0,

            // Mode timeouts
            heating_timeout_ms: 600_000,      // 10 min
            ready_timeout_ms: 2 * 3_600_000,  // 2 h
            brew_timeout_ms: 3 * 60_000,      // 3 min
            control_timeout_ms: 10_000,

            // Dry boiler (tuned for a 1300 W element)
            dry_rate_limit_c_per_min: 25.0,
            dry_min_temp_c: 50.0,
            dry_min_samples: 10,
            rate_sample_interval_ms: 1000,

            // Fill check
            fill_probe_ms: 5_000,
            fill_max_ms: 60_000,
            fill_threshold_g: 10.0,

            // Sensors
            rtd_nominal_ohm: 100.0,
            rtd_reference_ohm: 430.0,
            reservoir_glitch_limit_g: 20.0,
            reservoir_capacity_g: 2_000.0,

            // PID
            pid_kp: 8.0,
            pid_ki: 0.2,
            pid_kd: 0.0,
            pid_sample_interval_ms: 1000,
            windup_min_pct: -7.0,
            windup_max_pct: 7.0,

            // Feed-forward
            ff_heat_pct: 0.0,
            ff_ready_pct: 2.0,
            ff_brew_pct: 40.0,

            // Timing
            control_loop_interval_ms: 100, // 10 Hz
            watchdog_timeout_ms: 10_000,
            telemetry_interval_ms: 1_000,
        }
    }
}

/// Rejected configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Input could not be parsed.
    Malformed,
    /// A field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => write!(f, "malformed config"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

fn check(ok: bool, why: &'static str) -> Result<(), ConfigError> {
    if ok { Ok(()) } else { Err(ConfigError::ValidationFailed(why)) }
}

fn is_pct(v: f32) -> bool {
    (0.0..=100.0).contains(&v)
}

impl BoilerConfig {
    /// Range-check every field.  Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check(self.temp_window_c > 0.0, "temp_window_c must be positive")?;
        check(
            self.temp_limit_low_c < self.temp_limit_high_c,
            "temp_limit_low_c must be below temp_limit_high_c",
        )?;
        check(
            (0.0..=self.temp_limit_high_c).contains(&self.brew_temp_c),
            "brew_temp_c must lie between 0 and temp_limit_high_c",
        )?;
        check(self.heater_cutoff_margin_c >= 0.0, "heater_cutoff_margin_c must not be negative")?;
        check(self.heating_timeout_ms > 0, "heating_timeout_ms must be non-zero")?;
        check(self.ready_timeout_ms > 0, "ready_timeout_ms must be non-zero")?;
        check(self.brew_timeout_ms > 0, "brew_timeout_ms must be non-zero")?;
        check(
            self.control_loop_interval_ms > 0
                && self.control_loop_interval_ms < self.control_timeout_ms,
            "control_loop_interval_ms must be non-zero and below control_timeout_ms",
        )?;
        check(self.dry_rate_limit_c_per_min > 0.0, "dry_rate_limit_c_per_min must be positive")?;
        check(
            (1..=RATE_WINDOW_LEN).contains(&self.dry_min_samples),
            "dry_min_samples must fit the rate window",
        )?;
        check(
            self.fill_probe_ms > 0 && self.fill_probe_ms < self.fill_max_ms,
            "fill_probe_ms must be non-zero and below fill_max_ms",
        )?;
        check(self.fill_threshold_g > 0.0, "fill_threshold_g must be positive")?;
        check(
            self.rtd_nominal_ohm > 0.0 && self.rtd_reference_ohm > self.rtd_nominal_ohm,
            "rtd_reference_ohm must exceed a positive rtd_nominal_ohm",
        )?;
        check(self.reservoir_glitch_limit_g > 0.0, "reservoir_glitch_limit_g must be positive")?;
        check(self.reservoir_capacity_g > 0.0, "reservoir_capacity_g must be positive")?;
        check(
            self.pid_kp >= 0.0 && self.pid_ki >= 0.0 && self.pid_kd >= 0.0,
            "PID gains must not be negative",
        )?;
        check(self.pid_sample_interval_ms > 0, "pid_sample_interval_ms must be non-zero")?;
        check(self.windup_min_pct <= self.windup_max_pct, "windup_min_pct above windup_max_pct")?;
        check(
            is_pct(self.ff_heat_pct) && is_pct(self.ff_ready_pct) && is_pct(self.ff_brew_pct),
            "feed-forward must be within 0-100 %",
        )?;
        check(
            self.watchdog_timeout_ms > self.control_loop_interval_ms,
            "watchdog_timeout_ms must exceed the control loop interval",
        )?;
        Ok(())
    }

    /// Parse a JSON document (missing fields take defaults) and validate it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|_| ConfigError::Malformed)?;
        config.validate()?;
        Ok(config)
    }
}
