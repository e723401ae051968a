//! UART host link: command intake and reply/notification output.
//!
//! The host PC speaks the line protocol from [`crate::serial`] over the
//! console UART. Bytes are polled at the start of every control cycle
//! (bounded per cycle so a chatty host cannot starve the loop), replies
//! go back as single lines, and lane presence events are mirrored as the
//! `car_in:1` / `car_out:0` notification lines the host tails.

use core::fmt::Write as _;

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::serial::{LineBuffer, LineEvent};

/// Most bytes consumed per cycle; keeps the loop period predictable.
const MAX_BYTES_PER_CYCLE: usize = 50;

/// Most complete lines returned from one pump.
pub const MAX_LINES_PER_CYCLE: usize = 8;

pub struct SerialConsole {
    line: LineBuffer,
    #[cfg(not(target_os = "espidf"))]
    pending_rx: std::collections::VecDeque<u8>,
    #[cfg(not(target_os = "espidf"))]
    pub written: Vec<String>,
}

impl SerialConsole {
    /// Install the UART driver (device) or an empty simulation (host).
    pub fn new() -> crate::error::Result<Self> {
        #[cfg(target_os = "espidf")]
        {
            use esp_idf_svc::sys;
            // The console UART already runs; install the driver so
            // uart_read_bytes works without blocking the log path.
            let rc = unsafe {
                sys::uart_driver_install(
                    sys::uart_port_t_UART_NUM_0,
                    256,
                    0,
                    0,
                    core::ptr::null_mut(),
                    0,
                )
            };
            if rc != sys::ESP_OK {
                return Err(crate::error::CommsError::UartInitFailed.into());
            }
        }
        Ok(Self {
            line: LineBuffer::new(),
            #[cfg(not(target_os = "espidf"))]
            pending_rx: std::collections::VecDeque::new(),
            #[cfg(not(target_os = "espidf"))]
            written: Vec::new(),
        })
    }

    /// Drain pending receive bytes into complete line events.
    /// Bounded at [`MAX_BYTES_PER_CYCLE`] bytes per call.
    pub fn pump(&mut self) -> heapless::Vec<LineEvent, MAX_LINES_PER_CYCLE> {
        let mut events = heapless::Vec::new();
        for _ in 0..MAX_BYTES_PER_CYCLE {
            let Some(byte) = self.read_byte() else {
                break;
            };
            if let Some(event) = self.line.push(byte) {
                if events.push(event).is_err() {
                    break; // Cycle full; remaining bytes wait for the next one.
                }
            }
        }
        events
    }

    /// Send one reply or notification line to the host.
    pub fn write_line(&mut self, line: &str) {
        #[cfg(target_os = "espidf")]
        {
            // Console stdout is the host-facing UART.
            println!("{line}");
        }
        #[cfg(not(target_os = "espidf"))]
        self.written.push(line.to_string());
    }

    // ── Byte source ───────────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn read_byte(&mut self) -> Option<u8> {
        use esp_idf_svc::sys;
        let mut byte = 0u8;
        let n = unsafe {
            sys::uart_read_bytes(
                sys::uart_port_t_UART_NUM_0,
                core::ptr::from_mut(&mut byte).cast(),
                1,
                0, // No wait: polled from the control loop.
            )
        };
        (n == 1).then_some(byte)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_byte(&mut self) -> Option<u8> {
        self.pending_rx.pop_front()
    }

    /// Queue bytes as if they arrived from the host (host builds only).
    #[cfg(not(target_os = "espidf"))]
    pub fn feed(&mut self, bytes: &[u8]) {
        self.pending_rx.extend(bytes.iter().copied());
    }
}

/// Lane presence notifications are mirrored onto the serial channel as
/// the `car_in:1`-style lines the host protocol documents. All other
/// events stay on the log/GATT channels.
impl EventSink for SerialConsole {
    fn emit(&mut self, event: &AppEvent) {
        if let AppEvent::CarPresence { lane, present } = event {
            let mut line = heapless::String::<16>::new();
            let _ = write!(line, "{}:{}", lane.wire_name(), u8::from(*present));
            self.write_line(&line);
        }
    }
}

#[cfg(all(test, not(target_os = "espidf")))]
mod tests {
    use super::*;
    use crate::app::state::Lane;

    #[test]
    fn pump_assembles_lines_across_calls() {
        let mut console = SerialConsole::new().unwrap();
        console.feed(b"open");
        assert!(console.pump().is_empty());
        console.feed(b"_in\n");
        let events = console.pump();
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], LineEvent::Line(l) if l.as_str() == "open_in"));
    }

    #[test]
    fn pump_is_bounded_per_cycle() {
        let mut console = SerialConsole::new().unwrap();
        // 60 bytes queued; only 50 consumed this cycle.
        console.feed(&[b'a'; 60]);
        let _ = console.pump();
        assert_eq!(console.pending_rx.len(), 10);
    }

    #[test]
    fn presence_events_become_wire_lines() {
        let mut console = SerialConsole::new().unwrap();
        console.emit(&AppEvent::CarPresence {
            lane: Lane::Entrance,
            present: true,
        });
        console.emit(&AppEvent::CarPresence {
            lane: Lane::Exit,
            present: false,
        });
        assert_eq!(console.written, vec!["car_in:1", "car_out:0"]);
    }

    #[test]
    fn non_presence_events_are_silent() {
        let mut console = SerialConsole::new().unwrap();
        console.emit(&AppEvent::StatsReset);
        assert!(console.written.is_empty());
    }
}
