//! Wireless characteristic payload codecs.
//!
//! The GATT adapter shuttles opaque byte buffers; every wire format is
//! defined here as a tagged record with an explicit encode/decode function
//! so the core never touches raw byte offsets.
//!
//! | Characteristic   | Dir          | Payload                                |
//! |------------------|--------------|----------------------------------------|
//! | IR status        | read/notify  | `[car_in, car_out]` (0/1 each)         |
//! | Sensor status    | read/notify  | `[flame, alarm, light, reserved]`      |
//! | LCD display      | write        | raw text, ≤ 99 bytes, NUL-truncated    |
//! | OLED display     | write        | raw text, ≤ 99 bytes, NUL-truncated    |
//! | Barrier control  | write        | `[entrance_cmd, exit_cmd]`             |

use crate::app::state::{Lane, MAX_DISPLAY_TEXT, SystemState};

// ---------------------------------------------------------------------------
// Service / characteristic UUIDs
// ---------------------------------------------------------------------------

pub const SERVICE_UUID: u128 = 0x7c210001_94d6_4e8f_b2a1_3d5e8c4f9b27;
pub const CHAR_IR_STATUS: u128 = 0x7c210002_94d6_4e8f_b2a1_3d5e8c4f9b27;
pub const CHAR_SENSOR_STATUS: u128 = 0x7c210003_94d6_4e8f_b2a1_3d5e8c4f9b27;
pub const CHAR_LCD_DISPLAY: u128 = 0x7c210004_94d6_4e8f_b2a1_3d5e8c4f9b27;
pub const CHAR_OLED_DISPLAY: u128 = 0x7c210005_94d6_4e8f_b2a1_3d5e8c4f9b27;
pub const CHAR_BARRIER_CONTROL: u128 = 0x7c210006_94d6_4e8f_b2a1_3d5e8c4f9b27;

// ---------------------------------------------------------------------------
// Read / notify payloads
// ---------------------------------------------------------------------------

/// IR status: one presence byte per lane.
pub fn encode_ir_status(state: &SystemState) -> [u8; 2] {
    [
        u8::from(state.lane(Lane::Entrance).car_present),
        u8::from(state.lane(Lane::Exit).car_present),
    ]
}

/// Sensor status: flame reading, alarm flag, aux light, reserved.
pub fn encode_sensor_status(flame: bool, alarm_active: bool, light_on: bool) -> [u8; 4] {
    [
        u8::from(flame),
        u8::from(alarm_active),
        u8::from(light_on),
        0,
    ]
}

// ---------------------------------------------------------------------------
// Barrier control writes
// ---------------------------------------------------------------------------

/// Per-lane action requested by a barrier-control write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarrierAction {
    Open,
    Close,
    /// Any byte other than 0/1; the lane is left alone.
    Ignore,
}

impl BarrierAction {
    fn from_byte(byte: u8) -> Self {
        match byte {
            1 => Self::Open,
            0 => Self::Close,
            _ => Self::Ignore,
        }
    }
}

/// Decoded barrier-control write: one action per lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarrierControlWrite {
    pub entrance: BarrierAction,
    pub exit: BarrierAction,
}

impl BarrierControlWrite {
    pub fn action(&self, lane: Lane) -> BarrierAction {
        match lane {
            Lane::Entrance => self.entrance,
            Lane::Exit => self.exit,
        }
    }
}

/// Decode a barrier-control payload. Writes shorter than two bytes are
/// ignored silently (`None`); extra bytes are tolerated and unused.
pub fn decode_barrier_control(payload: &[u8]) -> Option<BarrierControlWrite> {
    if payload.len() < 2 {
        return None;
    }
    Some(BarrierControlWrite {
        entrance: BarrierAction::from_byte(payload[0]),
        exit: BarrierAction::from_byte(payload[1]),
    })
}

// ---------------------------------------------------------------------------
// Display writes
// ---------------------------------------------------------------------------

/// Decode a display-characteristic write: text up to 99 bytes,
/// NUL-truncated, non-printable bytes replaced so the buffer stays
/// renderable.
pub fn decode_display_text(payload: &[u8]) -> heapless::String<MAX_DISPLAY_TEXT> {
    let mut text = heapless::String::new();
    for &b in payload.iter().take(MAX_DISPLAY_TEXT) {
        if b == 0 {
            break;
        }
        let ch = if b.is_ascii() && !b.is_ascii_control() {
            b as char
        } else {
            '?'
        };
        if text.push(ch).is_err() {
            break;
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ir_status_reflects_lane_presence() {
        let mut state = SystemState::new([5, 5, 5]);
        state.lane_mut(Lane::Entrance).car_present = true;
        assert_eq!(encode_ir_status(&state), [1, 0]);
        state.lane_mut(Lane::Exit).car_present = true;
        assert_eq!(encode_ir_status(&state), [1, 1]);
    }

    #[test]
    fn sensor_status_layout() {
        assert_eq!(encode_sensor_status(true, false, true), [1, 0, 1, 0]);
        assert_eq!(encode_sensor_status(false, true, false), [0, 1, 0, 0]);
    }

    #[test]
    fn barrier_control_decodes_actions() {
        let w = decode_barrier_control(&[1, 0]).unwrap();
        assert_eq!(w.entrance, BarrierAction::Open);
        assert_eq!(w.exit, BarrierAction::Close);

        let w = decode_barrier_control(&[7, 1]).unwrap();
        assert_eq!(w.entrance, BarrierAction::Ignore);
        assert_eq!(w.exit, BarrierAction::Open);
    }

    #[test]
    fn short_barrier_write_is_ignored() {
        assert_eq!(decode_barrier_control(&[]), None);
        assert_eq!(decode_barrier_control(&[1]), None);
    }

    #[test]
    fn extra_barrier_bytes_tolerated() {
        let w = decode_barrier_control(&[0, 0, 42, 42]).unwrap();
        assert_eq!(w.entrance, BarrierAction::Close);
        assert_eq!(w.exit, BarrierAction::Close);
    }

    #[test]
    fn display_text_nul_truncates() {
        let text = decode_display_text(b"Zone A full\0garbage");
        assert_eq!(text.as_str(), "Zone A full");
    }

    #[test]
    fn display_text_caps_at_99_bytes() {
        let long = [b'a'; 150];
        assert_eq!(decode_display_text(&long).len(), MAX_DISPLAY_TEXT);
    }
}
