//! Unified error types for the SmartPark firmware.
//!
//! Follows embedded best practice: a single `Error` enum that every subsystem
//! can convert into, keeping the top-level control loop's error handling uniform.
//! No error in this taxonomy is fatal; every condition is absorbed locally and
//! reported back on the channel that produced it.

use core::fmt;

/// Longest command text echoed back in an error reply.
/// One byte below the UART line buffer, leaving room for the terminator.
pub const MAX_CMD_ECHO: usize = 63;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A host command was malformed, unknown, or overflowed its buffer.
    Command(CommandError),
    /// A communication subsystem failed.
    Comms(CommsError),
    /// Peripheral initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command(e) => write!(f, "command: {e}"),
            Self::Comms(e) => write!(f, "comms: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Command errors
// ---------------------------------------------------------------------------

/// Rejections of host input, reported verbatim on the originating channel.
/// None of these mutate system state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Line did not match any known command; carries the raw text for the echo.
    UnknownCommand(heapless::String<MAX_CMD_ECHO>),
    /// `parking_num_slot:` payload did not parse as three comma-separated bytes.
    InvalidSlotFormat,
    /// Serial line exceeded the receive buffer; buffer discarded, stream resynchronises.
    BufferOverflow,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCommand(cmd) => write!(f, "unknown command '{cmd}'"),
            Self::InvalidSlotFormat => write!(f, "invalid parking_num_slot format"),
            Self::BufferOverflow => write!(f, "UART buffer overflow"),
        }
    }
}

impl From<CommandError> for Error {
    fn from(e: CommandError) -> Self {
        Self::Command(e)
    }
}

// ---------------------------------------------------------------------------
// Communications errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommsError {
    BleInitFailed,
    AdvertisingFailed,
    NotifyFailed,
    UartInitFailed,
}

impl fmt::Display for CommsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BleInitFailed => write!(f, "BLE init failed"),
            Self::AdvertisingFailed => write!(f, "BLE advertising failed"),
            Self::NotifyFailed => write!(f, "BLE notification failed"),
            Self::UartInitFailed => write!(f, "UART init failed"),
        }
    }
}

impl From<CommsError> for Error {
    fn from(e: CommsError) -> Self {
        Self::Comms(e)
    }
}

impl core::error::Error for Error {}
impl core::error::Error for CommandError {}
impl core::error::Error for CommsError {}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
