//! Shared system state threaded through the coordinator.
//!
//! `SystemState` is the single aggregate holding everything the
//! displays and host channels observe. It is owned by the
//! [`AppService`](super::service::AppService) and mutated only from the
//! main control cycle, preserving the single-writer-at-a-time contract
//! without any locking.

use crate::display::SlotBoard;
use crate::stats::OccupancyStats;

/// Longest host-supplied display text (wireless characteristic payload).
pub const MAX_DISPLAY_TEXT: usize = 99;

// ---------------------------------------------------------------------------
// Lanes and barriers
// ---------------------------------------------------------------------------

/// One of the two controlled lanes, each with one beam sensor and one
/// barrier servo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Lane {
    Entrance = 0,
    Exit = 1,
}

impl Lane {
    pub const COUNT: usize = 2;
    pub const ALL: [Lane; Lane::COUNT] = [Lane::Entrance, Lane::Exit];

    /// Array index for per-lane storage.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Human-readable name used in serial replies.
    pub fn label(self) -> &'static str {
        match self {
            Self::Entrance => "Entrance",
            Self::Exit => "Exit",
        }
    }

    /// Wire name used in host notification lines (`car_in:1` etc.).
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Entrance => "car_in",
            Self::Exit => "car_out",
        }
    }
}

/// Physical barrier position, mirroring the servo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BarrierPosition {
    Open,
    #[default]
    Closed,
}

/// Per-lane live state.
#[derive(Debug, Clone, Copy, Default)]
pub struct LaneState {
    /// Mirror of the physical barrier; mutated only via the actuator port.
    pub barrier: BarrierPosition,
    /// Latest debounced beam reading for this lane.
    pub car_present: bool,
}

// ---------------------------------------------------------------------------
// SystemState
// ---------------------------------------------------------------------------

/// Aggregate of everything the displays and host channels observe.
#[derive(Debug)]
pub struct SystemState {
    /// Both lanes, indexed by [`Lane::index`].
    pub lanes: [LaneState; Lane::COUNT],
    /// Entry/exit counters and live occupancy.
    pub stats: OccupancyStats,
    /// Zone occupancy and the recommended-zone text, host-supplied.
    pub slots: SlotBoard,
    /// Raw LCD text written over the wireless display characteristic.
    pub host_lcd_text: heapless::String<MAX_DISPLAY_TEXT>,
    /// Raw OLED text written over the wireless display characteristic.
    pub host_oled_text: heapless::String<MAX_DISPLAY_TEXT>,
    /// Auxiliary lot light, host-controlled.
    pub light_on: bool,
    /// Set by any observable mutation; cleared only after a full redraw.
    display_dirty: bool,
}

impl SystemState {
    pub fn new(slot_totals: [u8; 3]) -> Self {
        let mut host_lcd_text = heapless::String::new();
        let _ = host_lcd_text.push_str("Parking System");
        let mut host_oled_text = heapless::String::new();
        let _ = host_oled_text.push_str("Welcome!");

        Self {
            lanes: [LaneState::default(); Lane::COUNT],
            stats: OccupancyStats::new(),
            slots: SlotBoard::new(slot_totals),
            host_lcd_text,
            host_oled_text,
            light_on: false,
            // First cycle always draws.
            display_dirty: true,
        }
    }

    pub fn lane(&self, lane: Lane) -> &LaneState {
        &self.lanes[lane.index()]
    }

    pub fn lane_mut(&mut self, lane: Lane) -> &mut LaneState {
        &mut self.lanes[lane.index()]
    }

    /// Request a display recomposition at the end of the current cycle.
    pub fn mark_dirty(&mut self) {
        self.display_dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.display_dirty
    }

    /// Called by the coordinator after the frame has been rendered.
    /// Never called mid-mutation: the render reads a settled snapshot.
    pub fn clear_dirty(&mut self) {
        self.display_dirty = false;
    }
}
