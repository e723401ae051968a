//! Application service — the event-driven barrier/alarm coordinator.
//!
//! [`AppService`] owns the system state, the alarm machine, the auto-close
//! deadlines, and the debounced input trackers. Each control cycle it
//! fuses sensor edges, button presses, and queued host events into
//! actuator commands, statistics, and display content, under the fixed
//! priority order Earthquake > Fire > Normal.
//!
//! ```text
//!  SensorPort ──▶ ┌───────────────────────────────┐ ──▶ EventSink
//!  SerialCommand ─▶│          AppService           │──▶ ActuatorPort
//!  HostEvent ────▶ │ alarm · auto-close · stats    │──▶ DisplayPort
//!                  └───────────────────────────────┘
//! ```
//!
//! All methods run on the single control thread; state is mutated in
//! place with no locking, valid under the run-to-completion guarantee of
//! the main loop.

use log::info;

use crate::alarm::{self, AlarmKind, AlarmMachine, AlarmState};
use crate::autoclose::AutoClose;
use crate::config::SystemConfig;
use crate::display;
use crate::drivers::button::{ButtonPress, ButtonTracker};
use crate::drivers::buzzer::{BeepPattern, BeepSequencer};
use crate::drivers::inputs::{DebouncedInput, Edge};
use crate::gatt::{self, BarrierAction};
use crate::serial::{SerialCommand, SerialReply};

use super::commands::HostEvent;
use super::events::AppEvent;
use super::ports::{ActuatorPort, DisplayPort, EventSink, SensorPort};
use super::state::{BarrierPosition, Lane, SystemState};

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The coordinator orchestrating all domain logic.
pub struct AppService {
    config: SystemConfig,
    state: SystemState,
    alarm: AlarmMachine,
    autoclose: AutoClose,
    entrance_ir: DebouncedInput,
    exit_ir: DebouncedInput,
    flame: DebouncedInput,
    button: ButtonTracker,
    beeps: BeepSequencer,
    tick_count: u64,
}

impl AppService {
    /// Construct the service from configuration. Call [`start`] next.
    pub fn new(config: SystemConfig) -> Self {
        let state = SystemState::new(config.slot_totals);
        let autoclose = AutoClose::new(config.auto_close_delay_ms);
        let entrance_ir = DebouncedInput::new(false, config.ir_stable_samples);
        let exit_ir = DebouncedInput::new(false, config.ir_stable_samples);
        let flame = DebouncedInput::new(false, config.flame_stable_samples);
        let button = ButtonTracker::new(
            config.button_debounce_cycles,
            config.button_long_press_cycles,
        );

        Self {
            config,
            state,
            alarm: AlarmMachine::new(),
            autoclose,
            entrance_ir,
            exit_ir,
            flame,
            button,
            beeps: BeepSequencer::new(),
            tick_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Drive both barriers to their known closed position, queue the
    /// startup chirp, and announce readiness. The first `tick` renders
    /// the initial display frame (the state starts dirty).
    pub fn start(&mut self, now_ms: u64, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) {
        for lane in Lane::ALL {
            hw.set_barrier(lane, BarrierPosition::Closed);
        }
        self.beeps
            .start(BeepPattern::Single(self.config.startup_beep_ms), now_ms);
        sink.emit(&AppEvent::Started);
        info!("coordinator started, barriers closed");
    }

    // ── Per-cycle orchestration ───────────────────────────────

    /// Run one control cycle: sample inputs → classify edges → alarm
    /// priority → auto-close deadlines → buzzer → display.
    ///
    /// `now_ms` is the caller's monotonic clock; the core never reads
    /// real time, so tests drive this with synthetic timestamps.
    pub fn tick(
        &mut self,
        now_ms: u64,
        hw: &mut (impl SensorPort + ActuatorPort),
        ui: &mut impl DisplayPort,
        sink: &mut impl EventSink,
    ) {
        self.tick_count += 1;
        let inputs = hw.read_inputs();

        // 1. Operator button (may clear an alarm, so it runs first).
        if let Some(press) = self.button.update(inputs.button_pressed) {
            self.handle_button(press, now_ms, hw, sink);
        }

        // 2. Flame sensor. Only the rising edge matters: the fire alarm
        //    latches until the operator or host clears it.
        if self.flame.sample(inputs.flame) == Some(Edge::Rising) {
            self.raise_fire(hw, sink);
        }

        // 3. IR beam edges.
        if let Some(edge) = self.entrance_ir.sample(inputs.car_at_entrance) {
            self.handle_lane_edge(Lane::Entrance, edge, now_ms, sink);
        }
        if let Some(edge) = self.exit_ir.sample(inputs.car_at_exit) {
            self.handle_lane_edge(Lane::Exit, edge, now_ms, sink);
        }

        // 4. Auto-close deadlines.
        self.service_autoclose(now_ms, hw, sink);

        // 5. Buzzer: queued confirmation sequences win over the alarm
        //    pattern; a busy buzzer drops the pulse rather than blocking.
        if let Some(pulse) = self.beeps.tick(now_ms) {
            if hw.buzzer_idle() {
                hw.pulse_buzzer(pulse);
            }
        } else if let Some(pulse) = alarm::alarm_beep_ms(self.alarm.state()) {
            if hw.buzzer_idle() {
                hw.pulse_buzzer(pulse);
            }
        }

        // 6. Displays: one recomposition per cycle, over a settled state.
        if self.state.is_dirty() {
            ui.render(&display::compose(&self.state, self.alarm.state()));
            self.state.clear_dirty();
        }
    }

    // ── Serial command channel ────────────────────────────────

    /// Execute one parsed serial command and return the typed reply.
    /// Serial barrier commands are a privileged override channel: they
    /// are not alarm-gated.
    pub fn handle_serial_command(
        &mut self,
        cmd: SerialCommand,
        now_ms: u64,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) -> SerialReply {
        match cmd {
            SerialCommand::OpenBarrier(lane) => {
                self.move_barrier(lane, BarrierPosition::Open, hw, sink);
                SerialReply::BarrierOpened(lane)
            }
            SerialCommand::CloseBarrier(lane) => {
                // Manual close disarms any pending auto-close for the lane.
                self.autoclose.cancel(lane);
                self.move_barrier(lane, BarrierPosition::Closed, hw, sink);
                SerialReply::BarrierClosed(lane)
            }
            SerialCommand::Earthquake => {
                self.raise_earthquake(hw, sink);
                SerialReply::EarthquakeActivated
            }
            SerialCommand::EarthquakeStop => {
                // Idempotent: clearing an inactive alarm changes nothing
                // but still acknowledges.
                let _ = self.clear_alarm(hw, sink);
                SerialReply::EarthquakeStopped
            }
            SerialCommand::LightOn => {
                hw.set_light(true);
                self.state.light_on = true;
                SerialReply::LightOn
            }
            SerialCommand::LightOff => {
                hw.set_light(false);
                self.state.light_on = false;
                SerialReply::LightOff
            }
            SerialCommand::SlotRecommend(text) => {
                self.state.slots.recommend.clear();
                let _ = self.state.slots.recommend.push_str(&text);
                self.state.mark_dirty();
                SerialReply::SlotRecommendUpdated(text)
            }
            SerialCommand::SlotCounts(counts) => {
                self.state.slots.occupied = counts;
                self.state.mark_dirty();
                SerialReply::SlotCountsUpdated(counts)
            }
            SerialCommand::UpdateDisplay => SerialReply::ReadyForDisplayData,
        }
    }

    // ── Wireless channel ──────────────────────────────────────

    /// Apply one decoded host event from the GATT adapter.
    /// Barrier-control writes are privileged (not alarm-gated), matching
    /// the serial channel.
    pub fn handle_host_event(
        &mut self,
        event: HostEvent,
        now_ms: u64,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) {
        match event {
            HostEvent::BarrierControl(write) => {
                for lane in Lane::ALL {
                    match write.action(lane) {
                        BarrierAction::Open => {
                            self.move_barrier(lane, BarrierPosition::Open, hw, sink);
                        }
                        BarrierAction::Close => {
                            self.autoclose.cancel(lane);
                            self.move_barrier(lane, BarrierPosition::Closed, hw, sink);
                        }
                        BarrierAction::Ignore => {}
                    }
                }
                self.beeps
                    .start(BeepPattern::Single(self.config.ack_beep_ms), now_ms);
            }
            HostEvent::WriteLcd(text) => {
                self.state.host_lcd_text = text;
                self.state.mark_dirty();
            }
            HostEvent::WriteOled(text) => {
                self.state.host_oled_text = text;
                self.state.mark_dirty();
            }
            HostEvent::Connected => {
                info!("central connected");
                self.beeps.start(BeepPattern::Double, now_ms);
            }
            HostEvent::Disconnected => {
                info!("central disconnected");
                self.beeps.start(BeepPattern::Triple, now_ms);
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> &SystemState {
        &self.state
    }

    pub fn alarm_state(&self) -> AlarmState {
        self.alarm.state()
    }

    /// Debounced flame reading (for the sensor-status payload).
    pub fn flame_detected(&self) -> bool {
        self.flame.state()
    }

    /// IR characteristic payload for reads and notifications.
    pub fn ir_status_payload(&self) -> [u8; 2] {
        gatt::encode_ir_status(&self.state)
    }

    /// Sensor-status characteristic payload for reads and notifications.
    pub fn sensor_status_payload(&self) -> [u8; 4] {
        gatt::encode_sensor_status(
            self.flame.state(),
            self.alarm.state().is_active(),
            self.state.light_on,
        )
    }

    /// Whether a lane has an armed auto-close deadline.
    pub fn autoclose_armed(&self, lane: Lane) -> bool {
        self.autoclose.is_armed(lane)
    }

    /// The lane's raw auto-close deadline, if armed.
    pub fn autoclose_deadline(&self, lane: Lane) -> Option<u64> {
        self.autoclose.deadline(lane)
    }

    /// Total control cycles executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    // ── Internal: alarms ──────────────────────────────────────

    /// Flame-triggered fire alarm. A no-op while Fire is already active
    /// or Earthquake dominates; only a real transition counts against
    /// the trigger statistic.
    fn raise_fire(&mut self, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) {
        if !self.alarm.raise_fire() {
            return;
        }
        self.state.stats.record_alarm_trigger();
        self.enter_alarm(AlarmKind::Fire, hw, sink);
    }

    /// Host-declared earthquake. Supersedes Fire unconditionally and is
    /// operator-declared, so it does not bump the sensor-alarm counter.
    fn raise_earthquake(&mut self, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) {
        if !self.alarm.raise_earthquake() {
            return;
        }
        self.enter_alarm(AlarmKind::Earthquake, hw, sink);
    }

    /// Common entry effects: both lanes forced open, deadlines cancelled,
    /// display switched to the alarm banner, channels notified. All
    /// within this cycle, before the display recomposition runs.
    fn enter_alarm(
        &mut self,
        kind: AlarmKind,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) {
        for lane in Lane::ALL {
            self.move_barrier(lane, BarrierPosition::Open, hw, sink);
        }
        self.autoclose.cancel_all();
        self.state.mark_dirty();
        sink.emit(&AppEvent::AlarmRaised(kind));
    }

    /// Clear whichever alarm is active. Returns false (and does nothing)
    /// when already Normal.
    fn clear_alarm(&mut self, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) -> bool {
        if !self.alarm.clear() {
            return false;
        }
        for lane in Lane::ALL {
            self.autoclose.cancel(lane);
            self.move_barrier(lane, BarrierPosition::Closed, hw, sink);
        }
        self.state.mark_dirty();
        sink.emit(&AppEvent::AlarmCleared);
        true
    }

    // ── Internal: inputs ──────────────────────────────────────

    fn handle_button(
        &mut self,
        press: ButtonPress,
        now_ms: u64,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) {
        match press {
            ButtonPress::Short => {
                if self.alarm.state().is_active() {
                    // Alarm-aware path: a short press acknowledges and
                    // clears the alarm instead of toggling barriers.
                    let _ = self.clear_alarm(hw, sink);
                    return;
                }

                // Toggle both barriers together: open if either is
                // closed, close only when both are open.
                let both_open = Lane::ALL
                    .iter()
                    .all(|&l| self.state.lane(l).barrier == BarrierPosition::Open);
                let target = if both_open {
                    BarrierPosition::Closed
                } else {
                    BarrierPosition::Open
                };
                for lane in Lane::ALL {
                    if target == BarrierPosition::Closed {
                        self.autoclose.cancel(lane);
                    }
                    self.move_barrier(lane, target, hw, sink);
                }
                self.beeps
                    .start(BeepPattern::Single(self.config.edge_beep_ms), now_ms);
            }
            ButtonPress::Long => {
                // Zero all four statistics fields at once, in any alarm state.
                self.state.stats.reset();
                self.state.mark_dirty();
                self.beeps.start(BeepPattern::Double, now_ms);
                sink.emit(&AppEvent::StatsReset);
            }
        }
    }

    fn handle_lane_edge(
        &mut self,
        lane: Lane,
        edge: Edge,
        now_ms: u64,
        sink: &mut impl EventSink,
    ) {
        let present = edge == Edge::Rising;
        self.state.lane_mut(lane).car_present = present;

        // Presence notifications and the edge beep go out on every edge,
        // alarm or not; only the statistics are alarm-gated.
        sink.emit(&AppEvent::CarPresence { lane, present });
        self.beeps
            .start(BeepPattern::Single(self.config.edge_beep_ms), now_ms);

        if self.alarm.state().is_active() {
            return;
        }

        match edge {
            Edge::Rising => {
                match lane {
                    Lane::Entrance => self.state.stats.record_entry(),
                    Lane::Exit => self.state.stats.record_exit(),
                }
                self.state.mark_dirty();
            }
            Edge::Falling => {
                // Car cleared the beam: arm the deferred close while the
                // barrier is actually open.
                if self.state.lane(lane).barrier == BarrierPosition::Open {
                    self.autoclose.arm(lane, now_ms);
                }
            }
        }
    }

    // ── Internal: timers ──────────────────────────────────────

    /// Fire any elapsed auto-close deadline whose lane is clear. A lane
    /// that re-occupied keeps its deadline and is re-checked next cycle.
    fn service_autoclose(
        &mut self,
        now_ms: u64,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) {
        if self.alarm.state().is_active() {
            return;
        }
        for lane in Lane::ALL {
            if self.autoclose.due(lane, now_ms) && !self.state.lane(lane).car_present {
                self.move_barrier(lane, BarrierPosition::Closed, hw, sink);
                self.autoclose.cancel(lane);
            }
        }
    }

    // ── Internal: actuation ───────────────────────────────────

    /// Drive a barrier and mirror the result. Idempotent: a barrier
    /// already in position is left untouched and nothing is emitted.
    fn move_barrier(
        &mut self,
        lane: Lane,
        position: BarrierPosition,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) -> bool {
        if self.state.lane(lane).barrier == position {
            return false;
        }
        hw.set_barrier(lane, position);
        self.state.lane_mut(lane).barrier = position;
        self.state.mark_dirty();
        sink.emit(&AppEvent::BarrierMoved { lane, position });
        true
    }
}
