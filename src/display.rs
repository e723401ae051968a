//! Display content composition.
//!
//! Derives the structured content for both panels from the current
//! [`SystemState`]: a two-line recommendation for the character LCD and
//! either an alarm banner or the three-zone occupancy table for the OLED.
//! Rendering (cursor placement, banner text, fonts) belongs to the display
//! adapter; this module only decides *what* is shown.

use core::fmt::Write as _;

use crate::app::state::SystemState;

/// Parking zones A, B, C.
pub const ZONE_COUNT: usize = 3;
/// Zone labels in table order.
pub const ZONE_LABELS: [&str; ZONE_COUNT] = ["A", "B", "C"];

/// Cap on the host-supplied recommended-zone text.
pub const MAX_RECOMMEND_LEN: usize = 31;

/// Character LCD line width.
pub const LCD_COLS: usize = 16;

// ---------------------------------------------------------------------------
// Slot board (host-supplied zone occupancy)
// ---------------------------------------------------------------------------

/// Occupancy-per-zone as reported by the host, plus the recommended-zone
/// free text. Written only by host commands, read only by the composer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotBoard {
    /// Occupied count per zone.
    pub occupied: [u8; ZONE_COUNT],
    /// Total capacity per zone (configuration).
    pub totals: [u8; ZONE_COUNT],
    /// Free-text recommendation shown on the LCD.
    pub recommend: heapless::String<MAX_RECOMMEND_LEN>,
}

impl SlotBoard {
    pub fn new(totals: [u8; ZONE_COUNT]) -> Self {
        let mut recommend = heapless::String::new();
        let _ = recommend.push_str("A0 - B0 - C0");
        Self {
            occupied: [0; ZONE_COUNT],
            totals,
            recommend,
        }
    }

    /// Replace the recommendation text, truncating to capacity.
    pub fn set_recommend(&mut self, text: &str) {
        self.recommend.clear();
        for ch in text.chars() {
            if self.recommend.push(ch).is_err() {
                break;
            }
        }
    }

    /// Free slots in one zone. Saturates at zero when the host reports
    /// more occupied slots than the zone holds.
    pub fn available(&self, zone: usize) -> u8 {
        self.totals[zone].saturating_sub(self.occupied[zone])
    }
}

// ---------------------------------------------------------------------------
// Composed frame
// ---------------------------------------------------------------------------

/// One row of the occupancy table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneRow {
    pub label: &'static str,
    pub occupied: u8,
    pub available: u8,
    pub total: u8,
}

/// The full occupancy table: one row per zone plus the aggregate row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotTable {
    pub rows: [ZoneRow; ZONE_COUNT],
    pub aggregate: ZoneRow,
}

/// Character LCD content: recommendation header + text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LcdContent {
    pub line1: heapless::String<LCD_COLS>,
    pub line2: heapless::String<LCD_COLS>,
}

/// Graphical display content. Alarm banners preempt the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OledContent {
    Earthquake,
    Fire,
    Slots(SlotTable),
}

/// Everything the display adapter needs for one redraw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayFrame {
    pub lcd: LcdContent,
    pub oled: OledContent,
}

/// Compose the frame for the current state.
///
/// The caller (coordinator) invokes this at most once per control cycle,
/// only when the dirty flag is set, and clears the flag afterwards.
pub fn compose(state: &SystemState, alarm: crate::alarm::AlarmState) -> DisplayFrame {
    let mut line1 = heapless::String::new();
    let _ = line1.push_str("Recommend:");
    let mut line2 = heapless::String::new();
    for ch in state.slots.recommend.chars().take(LCD_COLS) {
        let _ = line2.push(ch);
    }

    let oled = match alarm {
        crate::alarm::AlarmState::Earthquake => OledContent::Earthquake,
        crate::alarm::AlarmState::Fire => OledContent::Fire,
        crate::alarm::AlarmState::Normal => OledContent::Slots(slot_table(&state.slots)),
    };

    DisplayFrame {
        lcd: LcdContent { line1, line2 },
        oled,
    }
}

/// Build the occupancy table with per-zone and aggregate availability,
/// both saturating at zero.
pub fn slot_table(board: &SlotBoard) -> SlotTable {
    let mut rows = [ZoneRow {
        label: "",
        occupied: 0,
        available: 0,
        total: 0,
    }; ZONE_COUNT];

    let mut agg_occupied: u8 = 0;
    let mut agg_available: u8 = 0;
    let mut agg_total: u8 = 0;

    for zone in 0..ZONE_COUNT {
        let row = ZoneRow {
            label: ZONE_LABELS[zone],
            occupied: board.occupied[zone],
            available: board.available(zone),
            total: board.totals[zone],
        };
        agg_occupied = agg_occupied.saturating_add(row.occupied);
        agg_available = agg_available.saturating_add(row.available);
        agg_total = agg_total.saturating_add(row.total);
        rows[zone] = row;
    }

    SlotTable {
        rows,
        aggregate: ZoneRow {
            label: "ALL",
            occupied: agg_occupied,
            available: agg_available,
            total: agg_total,
        },
    }
}

/// Format one table row the way the OLED shows it.
/// Shared with the display adapter so tests can assert on exact text.
pub fn format_table_row(row: &ZoneRow) -> heapless::String<21> {
    let mut line = heapless::String::new();
    let _ = write!(
        line,
        "{:<3} {:2}   {:2}   {:2}",
        row.label, row.occupied, row.available, row.total
    );
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarm::AlarmState;

    fn state_with_slots(occupied: [u8; 3], totals: [u8; 3]) -> SystemState {
        let mut s = SystemState::new(totals);
        s.slots.occupied = occupied;
        s
    }

    #[test]
    fn table_computes_available_per_zone() {
        let s = state_with_slots([2, 1, 1], [5, 5, 5]);
        let t = slot_table(&s.slots);
        assert_eq!(t.rows[0].occupied, 2);
        assert_eq!(t.rows[0].available, 3);
        assert_eq!(t.rows[1].available, 4);
        assert_eq!(t.rows[2].available, 4);
        assert_eq!(t.aggregate.occupied, 4);
        assert_eq!(t.aggregate.available, 11);
        assert_eq!(t.aggregate.total, 15);
    }

    #[test]
    fn overfull_zone_saturates_at_zero() {
        let s = state_with_slots([9, 9, 9], [5, 5, 5]);
        let t = slot_table(&s.slots);
        for row in &t.rows {
            assert_eq!(row.available, 0);
        }
        assert_eq!(t.aggregate.available, 0);
        assert_eq!(t.aggregate.occupied, 27);
    }

    #[test]
    fn alarm_preempts_table() {
        let s = state_with_slots([1, 1, 1], [5, 5, 5]);
        assert!(matches!(
            compose(&s, AlarmState::Fire).oled,
            OledContent::Fire
        ));
        assert!(matches!(
            compose(&s, AlarmState::Earthquake).oled,
            OledContent::Earthquake
        ));
        assert!(matches!(
            compose(&s, AlarmState::Normal).oled,
            OledContent::Slots(_)
        ));
    }

    #[test]
    fn lcd_shows_recommendation() {
        let mut s = state_with_slots([0, 0, 0], [5, 5, 5]);
        s.slots.set_recommend("A2 - B1 - C0");
        let frame = compose(&s, AlarmState::Normal);
        assert_eq!(frame.lcd.line1.as_str(), "Recommend:");
        assert_eq!(frame.lcd.line2.as_str(), "A2 - B1 - C0");
    }

    #[test]
    fn lcd_line_truncates_to_width() {
        let mut s = state_with_slots([0, 0, 0], [5, 5, 5]);
        s.slots.set_recommend("A5 - B5 - C5 - OVERFLOW TEXT");
        let frame = compose(&s, AlarmState::Normal);
        assert_eq!(frame.lcd.line2.len(), LCD_COLS);
    }

    #[test]
    fn recommend_truncates_to_field_width() {
        let mut board = SlotBoard::new([5, 5, 5]);
        board.set_recommend("0123456789012345678901234567890123456789");
        assert_eq!(board.recommend.len(), MAX_RECOMMEND_LEN);
    }

    #[test]
    fn row_formatting_is_stable() {
        let row = ZoneRow {
            label: "A",
            occupied: 2,
            available: 3,
            total: 5,
        };
        assert_eq!(format_table_row(&row).as_str(), "A    2    3    5");
    }
}
