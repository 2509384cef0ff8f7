//! Port traits: the hexagonal boundary between the boiler logic and the
//! hardware around it.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ BoilerController (domain)
//! ```
//!
//! Driven adapters (RTD front-end, load cell, relays, watchdog, event
//! sinks) implement these traits.  The
//! [`BoilerController`](super::controller::BoilerController) consumes them
//! via generics, so the control core never touches hardware directly.
//!
//! ## Safety notes
//!
//! - **ActuatorPort::set_heater_power** implementations MUST treat any
//!   value outside 0–100 % as a clamp, never as a wrap.
//! - A failed RTD transfer MUST surface as a non-zero fault code, not as a
//!   plausible temperature.

pub use crate::time::Clock;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this to obtain readings.
pub trait SensorPort {
    /// Boiler temperature in °C.  May be non-finite on a broken sensor.
    fn read_temperature(&mut self) -> f32;

    /// RTD front-end fault code (0 = no fault).
    fn rtd_fault(&mut self) -> u8;

    /// Acknowledge and clear the RTD front-end fault.
    fn clear_rtd_fault(&mut self);

    /// Reservoir weight in grams, already deglitched.
    fn reservoir_weight(&mut self) -> f32;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to command actuators.
pub trait ActuatorPort {
    /// Heater power, 0–100 %.
    fn set_heater_power(&mut self, percent: f32);

    /// Start the fill pump.
    fn pump_on(&mut self);

    /// Stop the fill pump.
    fn pump_off(&mut self);

    /// Whether the pump is currently commanded on.
    fn is_pump_on(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Watchdog port
// ───────────────────────────────────────────────────────────────

/// Liveness proof, serviced once at the end of every control tick.
pub trait WatchdogPort {
    fn feed(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Composite
// ───────────────────────────────────────────────────────────────

/// Everything one control tick needs.  A single `&mut` satisfies every
/// port, avoiding a double mutable borrow in the controller.
pub trait BoilerHardware: SensorPort + ActuatorPort + WatchdogPort + Clock {}

impl<T: SensorPort + ActuatorPort + WatchdogPort + Clock> BoilerHardware for T {}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`BoilerEvent`](super::events::BoilerEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::BoilerEvent);
}
