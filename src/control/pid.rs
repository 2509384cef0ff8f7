//! PID controller for boiler heater power
//!
//! Positional PID with a per-mode feed-forward bias, a bounded integral
//! term and a fixed sample interval.  Between samples the previous output
//! is held, so the controller can be called every control tick regardless
//! of the tick rate.
//!
//! ```text
//! output = clamp(Kp·e + I + Kd·de/dt + feed_forward, out_min, out_max)
//! I      = clamp(I + Ki·e·dt, windup_min, windup_max)
//! ```

use crate::time::{Ticks, ticks_to_secs, time_difference};

/// PID controller
pub struct PidController {
    kp: f32,
    ki: f32,
    kd: f32,
    sample_interval_ms: Ticks,
    output_min: f32,
    output_max: f32,
    windup_min: f32,
    windup_max: f32,
    feed_forward: f32,
    /// Accumulated integral contribution, already scaled by Ki (%).
    integral: f32,
    prev_error: Option<f32>,
    last_sample: Option<Ticks>,
    output: f32,
    running: bool,
}

impl PidController {
    pub fn new(kp: f32, ki: f32, kd: f32, sample_interval_ms: Ticks) -> Self {
        Self {
            kp,
            ki,
            kd,
            sample_interval_ms: sample_interval_ms.max(1),
            output_min: 0.0,
            output_max: 100.0,
            windup_min: f32::MIN,
            windup_max: f32::MAX,
            feed_forward: 0.0,
            integral: 0.0,
            prev_error: None,
            last_sample: None,
            output: 0.0,
            running: false,
        }
    }

    /// Update gains (integral state is kept).
    pub fn set_coefficients(&mut self, kp: f32, ki: f32, kd: f32) {
        self.kp = kp;
        self.ki = ki;
        self.kd = kd;
    }

    /// Set output limits
    pub fn set_output_limits(&mut self, min: f32, max: f32) {
        self.output_min = min;
        self.output_max = max;
        self.output = self.output.clamp(min, max);
    }

    /// Bound the integral term (%) to prevent wind-up after saturation.
    pub fn set_windup_limits(&mut self, min: f32, max: f32) {
        self.windup_min = min;
        self.windup_max = max;
        self.integral = self.integral.clamp(min, max);
    }

    /// Static bias added to the closed-loop output.
    pub fn set_feed_forward(&mut self, value: f32) {
        self.feed_forward = value;
    }

    pub fn feed_forward(&self) -> f32 {
        self.feed_forward
    }

    /// Begin computing.  Before `start` the output stays at zero.
    pub fn start(&mut self) {
        self.running = true;
    }

    /// Compute the output for the given set point and measurement.
    ///
    /// A new sample is taken only when the sample interval has passed
    /// since the previous one; otherwise the held output is returned.
    pub fn compute(&mut self, setpoint: f32, measurement: f32, now: Ticks) -> f32 {
        if !self.running {
            return self.output;
        }

        let dt_ms = match self.last_sample {
            Some(last) => {
                let dt = time_difference(now, last);
                if dt < self.sample_interval_ms {
                    return self.output;
                }
                dt
            }
            None => self.sample_interval_ms,
        };
        self.last_sample = Some(now);
        let dt = ticks_to_secs(dt_ms);

        let error = setpoint - measurement;

        // Proportional
        let p = self.kp * error;

        // Integral (bounded)
        self.integral = (self.integral + self.ki * error * dt).clamp(self.windup_min, self.windup_max);

        // Derivative (skipped on the first sample)
        let d = match self.prev_error {
            Some(prev) => self.kd * (error - prev) / dt,
            None => 0.0,
        };
        self.prev_error = Some(error);

        self.output = (p + self.integral + d + self.feed_forward).clamp(self.output_min, self.output_max);
        self.output
    }

    /// Last computed output.
    pub fn output(&self) -> f32 {
        self.output
    }

    /// Current integral contribution (%).
    pub fn integral(&self) -> f32 {
        self.integral
    }

    /// Reset controller state
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = None;
        self.last_sample = None;
        self.output = 0.0;
    }
}
