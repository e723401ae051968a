//! System configuration parameters
//!
//! All tunable parameters for the SmartPark controller.
//! Debounce thresholds are expressed in control-loop cycles (the inputs
//! are sampled once per cycle); wall-clock delays are in milliseconds.

use serde::{Deserialize, Serialize};

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Timing ---
    /// Main control loop interval (milliseconds)
    pub control_loop_interval_ms: u32,
    /// Delay between a car clearing a lane and the barrier auto-closing (milliseconds)
    pub auto_close_delay_ms: u32,

    // --- Button ---
    /// Consecutive pressed cycles before a release counts as a press at all
    pub button_debounce_cycles: u32,
    /// Held cycles at which a release classifies as a long press
    pub button_long_press_cycles: u32,

    // --- Sensor debounce ---
    /// Consecutive identical IR samples required to accept a beam transition
    pub ir_stable_samples: u8,
    /// Consecutive identical flame samples required to accept a transition
    pub flame_stable_samples: u8,

    // --- Parking zones ---
    /// Total slot capacity per zone (A, B, C)
    pub slot_totals: [u8; 3],

    // --- Buzzer ---
    /// Beep length for IR edge / button-toggle confirmations (milliseconds)
    pub edge_beep_ms: u16,
    /// Beep length acknowledging a wireless barrier write (milliseconds)
    pub ack_beep_ms: u16,
    /// Single chirp played once init completes (milliseconds)
    pub startup_beep_ms: u16,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Timing
            control_loop_interval_ms: 100, // 10 Hz
            auto_close_delay_ms: 2_000,

            // Button (cycle counts at the 100 ms loop rate)
            button_debounce_cycles: 2,   // ~200ms
            button_long_press_cycles: 10, // ~1s

            // Sensor debounce
            ir_stable_samples: 1,
            flame_stable_samples: 2,

            // Zones A/B/C
            slot_totals: [5, 5, 5],

            // Buzzer
            edge_beep_ms: 100,
            ack_beep_ms: 50,
            startup_beep_ms: 200,
        }
    }
}
