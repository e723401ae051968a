//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (sensors, actuators, displays, event sinks) implement
//! these traits. The [`AppService`](super::service::AppService) consumes
//! them via generics, so the domain core never touches hardware directly
//! and the whole coordinator runs against mocks on the host.

use crate::app::events::AppEvent;
use crate::app::state::{BarrierPosition, Lane};
use crate::display::DisplayFrame;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Raw digital line levels, sampled once per control cycle.
/// Active-low electrical details are resolved by the adapter; `true`
/// always means "condition present".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawInputs {
    /// Entrance beam interrupted.
    pub car_at_entrance: bool,
    /// Exit beam interrupted.
    pub car_at_exit: bool,
    /// Flame sensor asserting.
    pub flame: bool,
    /// Operator button held down.
    pub button_pressed: bool,
}

/// Read-side port: the domain calls this to obtain the cycle's samples.
pub trait SensorPort {
    fn read_inputs(&mut self) -> RawInputs;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: barriers, buzzer, aux light.
///
/// `set_barrier` must be idempotent: commanding a barrier into the
/// position it already holds is a no-op at the hardware level.
pub trait ActuatorPort {
    /// Drive a barrier to the requested position.
    fn set_barrier(&mut self, lane: Lane, position: BarrierPosition);

    /// Last commanded barrier position.
    fn barrier_position(&self, lane: Lane) -> BarrierPosition;

    /// Fire-and-forget buzzer pulse.
    fn pulse_buzzer(&mut self, duration_ms: u16);

    /// True when no pulse is in flight; new pulses are dropped while busy.
    fn buzzer_idle(&self) -> bool;

    /// Auxiliary lot light.
    fn set_light(&mut self, on: bool);
}

// ───────────────────────────────────────────────────────────────
// Display port (driven adapter: domain → panels)
// ───────────────────────────────────────────────────────────────

/// Render a composed frame onto both panels. Called at most once per
/// control cycle, only when the dirty flag was set.
pub trait DisplayPort {
    fn render(&mut self, frame: &DisplayFrame);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → notification channels)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`]s through this port. Adapters
/// decide where they go: the serial console prints `car_in:1`-style
/// lines, the GATT adapter raises notifications, the log sink records
/// everything.
pub trait EventSink {
    fn emit(&mut self, event: &AppEvent);
}
