//! Per-lane auto-close deadlines.
//!
//! When a car clears a lane's beam the coordinator arms a deadline here;
//! once the deadline elapses the barrier is closed, provided the lane is
//! still clear and no alarm is active. A car re-entering the beam before
//! the deadline does not cancel it: the close is deferred, checked again
//! each cycle, and fires on the first cycle where the beam is clear and
//! the deadline has passed.
//!
//! The scheduler only does deadline bookkeeping against the caller's
//! monotonic clock; the eligibility rules (alarm state, beam state) live
//! in the coordinator so this stays trivially testable.

use crate::app::state::Lane;
use log::debug;

/// Deadline bookkeeping for both lanes.
#[derive(Debug)]
pub struct AutoClose {
    deadlines: [Option<u64>; Lane::COUNT],
    delay_ms: u32,
}

impl AutoClose {
    pub fn new(delay_ms: u32) -> Self {
        Self {
            deadlines: [None; Lane::COUNT],
            delay_ms,
        }
    }

    /// Arm (or re-arm) the lane's deadline at `now + delay`.
    pub fn arm(&mut self, lane: Lane, now_ms: u64) {
        let deadline = now_ms + u64::from(self.delay_ms);
        debug!("auto-close armed for {:?} at t={}ms", lane, deadline);
        self.deadlines[lane.index()] = Some(deadline);
    }

    /// Disarm one lane. Returns whether a deadline was pending.
    pub fn cancel(&mut self, lane: Lane) -> bool {
        self.deadlines[lane.index()].take().is_some()
    }

    /// Disarm both lanes (alarm activation, alarm clear).
    pub fn cancel_all(&mut self) {
        self.deadlines = [None; Lane::COUNT];
    }

    /// True when the lane has an armed deadline, elapsed or not.
    pub fn is_armed(&self, lane: Lane) -> bool {
        self.deadlines[lane.index()].is_some()
    }

    /// True when the lane's deadline exists and has elapsed.
    /// Does not consume the deadline; the caller cancels after acting.
    pub fn due(&self, lane: Lane, now_ms: u64) -> bool {
        matches!(self.deadlines[lane.index()], Some(d) if now_ms >= d)
    }

    /// The raw deadline, for diagnostics.
    pub fn deadline(&self, lane: Lane) -> Option<u64> {
        self.deadlines[lane.index()]
    }
}
