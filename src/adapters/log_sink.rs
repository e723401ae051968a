//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the logger (which goes to the serial console in production). The
//! serial and GATT adapters carry the same events to the host in their
//! own wire formats.

use log::info;

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`].
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::CarPresence { lane, present } => {
                info!("IR    | {:?} beam {}", lane, if *present { "broken" } else { "clear" });
            }
            AppEvent::AlarmRaised(kind) => {
                info!("ALARM | {:?} raised, barriers forced open", kind);
            }
            AppEvent::AlarmCleared => {
                info!("ALARM | cleared, barriers closed");
            }
            AppEvent::BarrierMoved { lane, position } => {
                info!("GATE  | {:?} -> {:?}", lane, position);
            }
            AppEvent::StatsReset => {
                info!("STATS | counters zeroed by operator");
            }
            AppEvent::Started => {
                info!("START | coordinator running");
            }
        }
    }
}
