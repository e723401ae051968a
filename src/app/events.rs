//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port. Adapters on the other
//! side decide what to do with them: the serial console turns
//! `CarPresence` into `car_in:1` lines, the GATT adapter turns it into an
//! IR-status notification, the log sink records everything.

use crate::alarm::AlarmKind;
use crate::app::state::{BarrierPosition, Lane};

/// Structured events emitted by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    /// A lane's debounced beam state changed. Emitted on every edge,
    /// alarm or not.
    CarPresence { lane: Lane, present: bool },

    /// An alarm became active (Fire from the flame sensor, Earthquake
    /// from the host).
    AlarmRaised(AlarmKind),

    /// The active alarm was cleared; barriers forced closed.
    AlarmCleared,

    /// A barrier changed position.
    BarrierMoved { lane: Lane, position: BarrierPosition },

    /// Operator long-press zeroed the statistics.
    StatsReset,

    /// The coordinator finished startup.
    Started,
}
