//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing each controller event as one
//! structured line to the ESP-IDF logger (UART / USB-CDC in production).

use log::{error, info, warn};

use crate::app::events::BoilerEvent;
use crate::app::ports::EventSink;
use crate::fill_check::FillOutcome;

/// Adapter that logs every [`BoilerEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

/// One-line rendering of an event.
pub fn format_event(event: &BoilerEvent) -> String {
    match event {
        BoilerEvent::Telemetry(t) => format!(
            "TELEM | mode={} | T={:.1}/{:.1}\u{00b0}C | P={:.0}% | en={} brew={} | fill={} | \
             rate={} | err={}",
            t.mode_name,
            t.actual_temp_c,
            t.set_temp_c,
            t.power_pct,
            u8::from(t.enabled),
            u8::from(t.brew_requested),
            u8::from(t.fill_check_active),
            t.heating_rate_c_per_min
                .map_or_else(|| "-".to_string(), |r| format!("{r:.1}C/min")),
            t.error_text,
        ),
        BoilerEvent::ModeChanged { from, to } => format!("STATE | {from} -> {to}"),
        BoilerEvent::FaultRaised(kind) => format!("FAULT | {kind} (code {})", kind.code()),
        BoilerEvent::ErrorCleared => "FAULT | cleared".to_string(),
        BoilerEvent::FillCheckStarted(reason) => format!("FILL  | {reason} started"),
        BoilerEvent::FillCheckFinished { reason, outcome } => match outcome {
            FillOutcome::Full { refill_probes } => {
                format!("FILL  | {reason} full (refill probes={refill_probes})")
            }
            FillOutcome::Incomplete => format!("FILL  | {reason} incomplete"),
        },
        BoilerEvent::Started(mode) => format!("START | initial_mode={mode}"),
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &BoilerEvent) {
        let line = format_event(event);
        match event {
            BoilerEvent::FaultRaised(_) => error!("{line}"),
            BoilerEvent::FillCheckFinished {
                outcome: FillOutcome::Incomplete,
                ..
            } => warn!("{line}"),
            _ => info!("{line}"),
        }
    }
}
