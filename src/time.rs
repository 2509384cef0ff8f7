//! Wraparound-safe elapsed-time arithmetic.
//!
//! The boiler runs off a 32-bit millisecond tick counter that wraps every
//! ~49.7 days.  Every timeout in the controller (mode timeouts, the
//! control-loop stall check, the fill-probe timer, the heating-rate sample
//! interval) is expressed through the helpers in this module, so none of
//! them misfire when the counter rolls over.
//!
//! ```text
//!   earlier                          later
//!      │◀──────── true elapsed ────────▶│
//!  ────┼────────────────────┤MAX├0──────┼────▶ ticks
//! ```
//!
//! Precondition: the two ticks being compared are less than one full clock
//! period apart.

/// Monotonic millisecond tick.  Wraps at `u32::MAX`.
pub type Ticks = u32;

/// Number of distinct tick values before the clock repeats (2^32 ms).
pub const CLOCK_PERIOD_MS: u64 = 1 << Ticks::BITS;

/// Time source port.
///
/// Implemented by the ESP32 timer adapter on target and by test doubles
/// on the host.
pub trait Clock {
    /// Current tick in milliseconds.
    fn now_ms(&self) -> Ticks;
}

/// Forward distance from `earlier` to `later`, correct across a single
/// wrap of the counter.
pub const fn time_difference(later: Ticks, earlier: Ticks) -> Ticks {
    later.wrapping_sub(earlier)
}

/// `true` once at least `timeout` ms have passed between `start` and `now`.
pub const fn has_elapsed(now: Ticks, start: Ticks, timeout: Ticks) -> bool {
    time_difference(now, start) >= timeout
}

/// Milliseconds since `start` according to `clock`.
pub fn elapsed_since(clock: &impl Clock, start: Ticks) -> Ticks {
    time_difference(clock.now_ms(), start)
}

/// `true` if `timeout` ms have passed since `start` according to `clock`.
pub fn has_timed_out(clock: &impl Clock, start: Ticks, timeout: Ticks) -> bool {
    elapsed_since(clock, start) >= timeout
}

/// Convert a tick span to seconds (for rate calculations).
pub fn ticks_to_secs(ticks: Ticks) -> f32 {
    ticks as f32 / 1000.0
}
