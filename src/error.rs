//! Error types for the boiler firmware.
//!
//! Two families live here:
//!
//! - [`ErrorKind`]: the boiler fault taxonomy.  Every fault the controller
//!   detects funnels into the `Error` mode carrying exactly one of these.
//!   They are terminal until an operator clears them.
//! - [`Error`]: failures of the hardware collaborators (RTD front-end,
//!   load cell, relays), with `From` conversions so the drivers can use
//!   `?` throughout.
//!
//! All variants are `Copy` so they can be passed through the control path
//! without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Boiler fault taxonomy
// ---------------------------------------------------------------------------

/// Reason the boiler controller entered the `Error` mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(into = "&'static str")]
#[repr(u8)]
pub enum ErrorKind {
    /// RTD front-end reported a fault, the reading was not a number, or
    /// the temperature is below the plausible lower limit.
    RtdFault = 1,
    /// Boiler temperature above the high limit.
    OverTemp = 2,
    /// The control loop itself stalled past the control timeout.
    ControlTimeout = 3,
    /// Heating did not reach the temperature window in time.
    TimeoutHeating = 4,
    /// Machine sat in `Ready` for longer than allowed.
    ReadyTimeout = 5,
    /// Brew ran longer than allowed.
    TimeoutBrew = 6,
    /// Temperature rose too fast: the element is likely running dry.
    DryBoiler = 7,
}

impl ErrorKind {
    /// Every fault kind, in code order.
    pub const ALL: [Self; 7] = [
        Self::RtdFault,
        Self::OverTemp,
        Self::ControlTimeout,
        Self::TimeoutHeating,
        Self::ReadyTimeout,
        Self::TimeoutBrew,
        Self::DryBoiler,
    ];

    /// Stable text code reported to the outside world.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RtdFault => "RTD_ERROR",
            Self::OverTemp => "OVER_TEMP",
            Self::ControlTimeout => "CONTROL_TIMEOUT",
            Self::TimeoutHeating => "TIMEOUT_HEATING",
            Self::ReadyTimeout => "READY_TIMEOUT",
            Self::TimeoutBrew => "BREW_TIMEOUT",
            Self::DryBoiler => "DRY_BOILER",
        }
    }

    /// Numeric code (non-zero; zero is reserved for "no error").
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ErrorKind> for &'static str {
    fn from(kind: ErrorKind) -> Self {
        kind.as_str()
    }
}

/// Text for an optional fault: `"OK"` when no fault is latched.
pub fn error_text(error: Option<ErrorKind>) -> &'static str {
    error.map_or("OK", ErrorKind::as_str)
}

// ---------------------------------------------------------------------------
// Collaborator errors
// ---------------------------------------------------------------------------

/// Every fallible hardware operation funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sensor could not be read or returned out-of-range data.
    Sensor(SensorError),
    /// An actuator command failed.
    Actuator(ActuatorError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// SPI transaction with the RTD front-end failed.
    SpiTransfer,
    /// GPIO read returned an error.
    GpioReadFailed,
    /// The load cell had no conversion ready.
    NotReady,
    /// Reading is outside the physically plausible range.
    OutOfRange,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SpiTransfer => write!(f, "SPI transfer failed"),
            Self::GpioReadFailed => write!(f, "GPIO read failed"),
            Self::NotReady => write!(f, "conversion not ready"),
            Self::OutOfRange => write!(f, "reading out of range"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// GPIO set failed.
    GpioWriteFailed,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioWriteFailed => write!(f, "GPIO write failed"),
        }
    }
}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
