//! Non-blocking beep sequencing.
//!
//! Multi-pulse confirmations must not stall the control loop, so a small
//! phase-stepped engine holds the pattern: the main loop calls
//! [`BeepSequencer::tick`] once per cycle and fires whatever pulse is
//! due, with the gaps expressed as deadlines instead of sleeps.
//!
//! | Pattern     | Shape                       | Used for                  |
//! |-------------|-----------------------------|---------------------------|
//! | Single(d)   | one d-ms pulse              | edge beeps, acks, startup |
//! | Double      | 100ms, 200ms gap, 100ms     | long-press / connect      |
//! | Triple      | three 100ms, 200ms gaps     | disconnect                |

const MULTI_PULSE_MS: u16 = 100;
const MULTI_GAP_MS: u16 = 200;
const MAX_STEPS: usize = 3;

/// A requested beep shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeepPattern {
    /// One pulse of the given duration.
    Single(u16),
    /// Two short pulses.
    Double,
    /// Three short pulses.
    Triple,
}

/// One pulse and the silence that follows it.
#[derive(Debug, Clone, Copy, Default)]
struct BeepStep {
    pulse_ms: u16,
    gap_ms: u16,
}

/// Steps a [`BeepPattern`] across control cycles.
#[derive(Debug)]
pub struct BeepSequencer {
    steps: [BeepStep; MAX_STEPS],
    len: usize,
    index: usize,
    next_fire_at_ms: u64,
    active: bool,
}

impl BeepSequencer {
    pub fn new() -> Self {
        Self {
            steps: [BeepStep::default(); MAX_STEPS],
            len: 0,
            index: 0,
            next_fire_at_ms: 0,
            active: false,
        }
    }

    /// Begin a pattern, replacing any pattern still in progress.
    /// The first pulse fires on the next `tick`.
    pub fn start(&mut self, pattern: BeepPattern, now_ms: u64) {
        self.len = match pattern {
            BeepPattern::Single(pulse_ms) => {
                self.steps[0] = BeepStep { pulse_ms, gap_ms: 0 };
                1
            }
            BeepPattern::Double => {
                self.fill_multi(2);
                2
            }
            BeepPattern::Triple => {
                self.fill_multi(3);
                3
            }
        };
        self.index = 0;
        self.next_fire_at_ms = now_ms;
        self.active = true;
    }

    /// A pattern is queued or mid-flight.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Advance the sequence. Returns the pulse duration to fire now, if
    /// one is due this cycle.
    pub fn tick(&mut self, now_ms: u64) -> Option<u16> {
        if !self.active || now_ms < self.next_fire_at_ms {
            return None;
        }
        let step = self.steps[self.index];
        self.index += 1;
        if self.index >= self.len {
            self.active = false;
        } else {
            self.next_fire_at_ms = now_ms + u64::from(step.pulse_ms) + u64::from(step.gap_ms);
        }
        Some(step.pulse_ms)
    }

    fn fill_multi(&mut self, count: usize) {
        for i in 0..count {
            self.steps[i] = BeepStep {
                pulse_ms: MULTI_PULSE_MS,
                // No trailing gap after the last pulse.
                gap_ms: if i + 1 == count { 0 } else { MULTI_GAP_MS },
            };
        }
    }
}
