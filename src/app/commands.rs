//! Inbound host events from the wireless channel.
//!
//! The GATT adapter decodes characteristic writes and connection
//! lifecycle changes into these values and queues them; the main loop
//! drains the queue into
//! [`AppService::handle_host_event`](super::service::AppService::handle_host_event)
//! within the same cycle. Serial commands take the separate
//! [`SerialCommand`](crate::serial::SerialCommand) path because they
//! carry a reply channel.

use crate::app::state::MAX_DISPLAY_TEXT;
use crate::gatt::BarrierControlWrite;

/// One decoded wireless event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// Barrier-control characteristic write (already decoded; short
    /// payloads were dropped at the boundary).
    BarrierControl(BarrierControlWrite),
    /// LCD display characteristic write.
    WriteLcd(heapless::String<MAX_DISPLAY_TEXT>),
    /// OLED display characteristic write.
    WriteOled(heapless::String<MAX_DISPLAY_TEXT>),
    /// A central connected.
    Connected,
    /// The central disconnected; advertising resumes in the adapter.
    Disconnected,
}
