//! Alarm state machine.
//!
//! Three mutually exclusive states with a strict priority order:
//! Earthquake > Fire > Normal. The machine itself only tracks the state;
//! the coordinator applies the transition side effects (forcing barriers
//! open, cancelling auto-close deadlines, bumping the trigger counter)
//! so that every observable change happens within one control cycle.
//!
//! ```text
//!            raise_fire            raise_earthquake
//!   NORMAL ────────────▶ FIRE ──────────────────────▶ EARTHQUAKE
//!      ▲                   │                               │
//!      │                   │        raise_earthquake       │
//!      │                   └──────────────────────────────▶│
//!      │                                                   │
//!      └────────────────── clear ──────────────────────────┘
//! ```

use log::{info, warn};

/// Mutually exclusive alarm condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlarmState {
    #[default]
    Normal,
    Fire,
    Earthquake,
}

impl AlarmState {
    /// True while either alarm is active (barriers forced open,
    /// auto-close suspended).
    pub fn is_active(self) -> bool {
        self != Self::Normal
    }
}

/// Which alarm a transition raised; carried on outbound notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmKind {
    Fire,
    Earthquake,
}

// ---------------------------------------------------------------------------
// Buzzer selection
// ---------------------------------------------------------------------------

/// Earthquake pattern: short repeating beeps.
pub const EARTHQUAKE_BEEP_MS: u16 = 200;
/// Fire pattern: continuous long beeps.
pub const FIRE_BEEP_MS: u16 = 1_000;

/// Buzzer behaviour as a pure function of alarm state, re-evaluated every
/// cycle. Normal is silent here; discrete event beeps are sequenced
/// separately.
pub fn alarm_beep_ms(state: AlarmState) -> Option<u16> {
    match state {
        AlarmState::Normal => None,
        AlarmState::Fire => Some(FIRE_BEEP_MS),
        AlarmState::Earthquake => Some(EARTHQUAKE_BEEP_MS),
    }
}

// ---------------------------------------------------------------------------
// Machine
// ---------------------------------------------------------------------------

/// Latching alarm machine. All transition methods are idempotent no-ops
/// when the requested transition is not allowed from the current state,
/// and report whether a transition actually happened.
#[derive(Debug, Default)]
pub struct AlarmMachine {
    state: AlarmState,
}

impl AlarmMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> AlarmState {
        self.state
    }

    /// Normal → Fire. No-op if Fire is already active or Earthquake
    /// dominates.
    pub fn raise_fire(&mut self) -> bool {
        if self.state != AlarmState::Normal {
            return false;
        }
        self.state = AlarmState::Fire;
        warn!("ALARM: fire raised");
        true
    }

    /// Any state → Earthquake. Supersedes (and clears) an active Fire.
    pub fn raise_earthquake(&mut self) -> bool {
        if self.state == AlarmState::Earthquake {
            return false;
        }
        if self.state == AlarmState::Fire {
            warn!("ALARM: earthquake supersedes fire");
        } else {
            warn!("ALARM: earthquake raised");
        }
        self.state = AlarmState::Earthquake;
        true
    }

    /// Fire or Earthquake → Normal. No-op when already Normal.
    pub fn clear(&mut self) -> bool {
        if self.state == AlarmState::Normal {
            return false;
        }
        info!("ALARM: cleared ({:?} -> Normal)", self.state);
        self.state = AlarmState::Normal;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_normal() {
        assert_eq!(AlarmMachine::new().state(), AlarmState::Normal);
    }

    #[test]
    fn fire_raises_from_normal_only() {
        let mut m = AlarmMachine::new();
        assert!(m.raise_fire());
        assert_eq!(m.state(), AlarmState::Fire);
        // Already Fire: no second transition.
        assert!(!m.raise_fire());
    }

    #[test]
    fn earthquake_wins_over_fire() {
        let mut m = AlarmMachine::new();
        m.raise_fire();
        assert!(m.raise_earthquake());
        assert_eq!(m.state(), AlarmState::Earthquake);
        // Fire cannot displace an active earthquake.
        assert!(!m.raise_fire());
        assert_eq!(m.state(), AlarmState::Earthquake);
    }

    #[test]
    fn earthquake_is_idempotent() {
        let mut m = AlarmMachine::new();
        assert!(m.raise_earthquake());
        assert!(!m.raise_earthquake());
        assert_eq!(m.state(), AlarmState::Earthquake);
    }

    #[test]
    fn clear_returns_to_normal_from_either_alarm() {
        let mut m = AlarmMachine::new();
        m.raise_fire();
        assert!(m.clear());
        assert_eq!(m.state(), AlarmState::Normal);

        m.raise_earthquake();
        assert!(m.clear());
        assert_eq!(m.state(), AlarmState::Normal);
    }

    #[test]
    fn clear_when_normal_is_a_noop() {
        let mut m = AlarmMachine::new();
        assert!(!m.clear());
        assert_eq!(m.state(), AlarmState::Normal);
    }

    #[test]
    fn beep_selection_follows_state() {
        assert_eq!(alarm_beep_ms(AlarmState::Normal), None);
        assert_eq!(alarm_beep_ms(AlarmState::Fire), Some(FIRE_BEEP_MS));
        assert_eq!(
            alarm_beep_ms(AlarmState::Earthquake),
            Some(EARTHQUAKE_BEEP_MS)
        );
    }
}
