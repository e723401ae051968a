//! Line-oriented serial command protocol.
//!
//! The host PC drives the controller over a `\n`/`\r`-terminated text
//! protocol (case-sensitive, 64-byte lines). This module owns the three
//! boundary pieces: the receive line buffer with overflow recovery, the
//! command parser, and the exact `OK:`/`ERROR:` reply text. Command
//! *execution* lives in the coordinator; nothing here touches state.

use core::fmt::Write as _;

use crate::app::state::Lane;
use crate::display::MAX_RECOMMEND_LEN;
use crate::error::{CommandError, MAX_CMD_ECHO};

/// Line buffer size, terminator included.
pub const LINE_BUFFER_SIZE: usize = 64;

/// Longest reply line (`OK: Slot recommend updated: ` + 31-char text).
pub const MAX_REPLY_LEN: usize = 96;

pub type ReplyLine = heapless::String<MAX_REPLY_LEN>;

// ---------------------------------------------------------------------------
// Receive buffer
// ---------------------------------------------------------------------------

/// Outcome of feeding one received byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEvent {
    /// A complete, non-empty line arrived (terminator stripped).
    Line(heapless::String<MAX_CMD_ECHO>),
    /// The line exceeded the buffer; contents were discarded and the
    /// stream resynchronises on the next terminator.
    Overflow,
}

/// Accumulates raw UART bytes into terminated lines.
///
/// Mirrors the classic fixed-buffer pattern: bytes append until a
/// terminator produces a line, and an over-long line resets the buffer
/// (reported once) rather than wedging the channel.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: heapless::Vec<u8, LINE_BUFFER_SIZE>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one byte. Returns an event when a line completes or overflows.
    pub fn push(&mut self, byte: u8) -> Option<LineEvent> {
        match byte {
            b'\n' | b'\r' => {
                if self.buf.is_empty() {
                    return None; // Bare terminator (e.g. the \n of \r\n).
                }
                let mut line = heapless::String::new();
                for &b in &self.buf {
                    // Non-ASCII bytes cannot reach a valid command; keep the
                    // echo printable.
                    let ch = if b.is_ascii() && !b.is_ascii_control() {
                        b as char
                    } else {
                        '?'
                    };
                    let _ = line.push(ch);
                }
                self.buf.clear();
                Some(LineEvent::Line(line))
            }
            _ => {
                if self.buf.len() < LINE_BUFFER_SIZE - 1 {
                    let _ = self.buf.push(byte);
                    None
                } else {
                    // Buffer full: discard and report, keep the loop alive.
                    self.buf.clear();
                    Some(LineEvent::Overflow)
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Parsed serial command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SerialCommand {
    OpenBarrier(Lane),
    CloseBarrier(Lane),
    Earthquake,
    EarthquakeStop,
    LightOn,
    LightOff,
    SlotRecommend(heapless::String<MAX_RECOMMEND_LEN>),
    SlotCounts([u8; 3]),
    UpdateDisplay,
}

/// Parse one complete line (terminator already stripped, case-sensitive).
pub fn parse_line(line: &str) -> Result<SerialCommand, CommandError> {
    match line {
        "open_in" => return Ok(SerialCommand::OpenBarrier(Lane::Entrance)),
        "open_out" => return Ok(SerialCommand::OpenBarrier(Lane::Exit)),
        "close_in" => return Ok(SerialCommand::CloseBarrier(Lane::Entrance)),
        "close_out" => return Ok(SerialCommand::CloseBarrier(Lane::Exit)),
        "earthquake" => return Ok(SerialCommand::Earthquake),
        "earthquake_stop" => return Ok(SerialCommand::EarthquakeStop),
        "turn_on_light" => return Ok(SerialCommand::LightOn),
        "turn_off_light" => return Ok(SerialCommand::LightOff),
        "update_display" => return Ok(SerialCommand::UpdateDisplay),
        _ => {}
    }

    if let Some(text) = line.strip_prefix("slot_recommend:") {
        let mut s = heapless::String::new();
        for ch in text.chars() {
            if s.push(ch).is_err() {
                break; // Truncate to field width.
            }
        }
        return Ok(SerialCommand::SlotRecommend(s));
    }

    if let Some(fields) = line.strip_prefix("parking_num_slot:") {
        return parse_slot_counts(fields).map(SerialCommand::SlotCounts);
    }

    let mut echo = heapless::String::new();
    for ch in line.chars() {
        if echo.push(ch).is_err() {
            break;
        }
    }
    Err(CommandError::UnknownCommand(echo))
}

/// Parse `<a>,<b>,<c>` as three unsigned bytes. Exactly three fields.
fn parse_slot_counts(fields: &str) -> Result<[u8; 3], CommandError> {
    let mut counts = [0u8; 3];
    let mut n = 0;
    for field in fields.split(',') {
        if n == 3 {
            return Err(CommandError::InvalidSlotFormat);
        }
        counts[n] = field
            .trim()
            .parse::<u8>()
            .map_err(|_| CommandError::InvalidSlotFormat)?;
        n += 1;
    }
    if n != 3 {
        return Err(CommandError::InvalidSlotFormat);
    }
    Ok(counts)
}

// ---------------------------------------------------------------------------
// Replies
// ---------------------------------------------------------------------------

/// Typed acknowledgement, formatted at the channel boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SerialReply {
    BarrierOpened(Lane),
    BarrierClosed(Lane),
    EarthquakeActivated,
    EarthquakeStopped,
    LightOn,
    LightOff,
    SlotRecommendUpdated(heapless::String<MAX_RECOMMEND_LEN>),
    SlotCountsUpdated([u8; 3]),
    ReadyForDisplayData,
}

/// The documented `OK:` line for an accepted command.
pub fn reply_line(reply: &SerialReply) -> ReplyLine {
    let mut out = ReplyLine::new();
    let _ = match reply {
        SerialReply::BarrierOpened(lane) => {
            write!(out, "OK: {} barrier opened", lane.label())
        }
        SerialReply::BarrierClosed(lane) => {
            write!(out, "OK: {} barrier closed", lane.label())
        }
        SerialReply::EarthquakeActivated => write!(out, "OK: Earthquake alarm activated"),
        SerialReply::EarthquakeStopped => write!(out, "OK: Earthquake alarm stopped"),
        SerialReply::LightOn => write!(out, "OK: Light turned on"),
        SerialReply::LightOff => write!(out, "OK: Light turned off"),
        SerialReply::SlotRecommendUpdated(text) => {
            write!(out, "OK: Slot recommend updated: {text}")
        }
        SerialReply::SlotCountsUpdated([a, b, c]) => {
            write!(out, "OK: Parking slot data updated: {a},{b},{c}")
        }
        SerialReply::ReadyForDisplayData => write!(out, "OK: Ready for display data"),
    };
    out
}

/// The documented `ERROR:` line for a rejected input.
pub fn error_line(err: &CommandError) -> ReplyLine {
    let mut out = ReplyLine::new();
    let _ = match err {
        CommandError::UnknownCommand(cmd) => write!(out, "ERROR: Unknown command '{cmd}'"),
        CommandError::InvalidSlotFormat => {
            write!(out, "ERROR: Invalid parking_num_slot format")
        }
        CommandError::BufferOverflow => write!(out, "ERROR: UART buffer overflow"),
    };
    out
}
