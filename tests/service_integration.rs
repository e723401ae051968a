//! Integration tests: AppService → alarm / auto-close / stats → actuators.
//!
//! Everything runs against mock ports with synthetic timestamps, one
//! `TICK` (100 ms) per cycle, so timing behaviour is fully deterministic.

use smartpark::alarm::AlarmState;
use smartpark::app::commands::HostEvent;
use smartpark::app::events::AppEvent;
use smartpark::app::ports::{ActuatorPort, DisplayPort, EventSink, RawInputs, SensorPort};
use smartpark::app::service::AppService;
use smartpark::app::state::{BarrierPosition, Lane};
use smartpark::config::SystemConfig;
use smartpark::display::{DisplayFrame, OledContent};
use smartpark::gatt;
use smartpark::serial::{self, SerialCommand, SerialReply};

const TICK: u64 = 100;

// ── Mock implementations ──────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActCall {
    SetBarrier(Lane, BarrierPosition),
    Pulse(u16),
    SetLight(bool),
}

struct MockHw {
    calls: Vec<ActCall>,
    barriers: [BarrierPosition; Lane::COUNT],
    inputs: RawInputs,
    light_on: bool,
}

impl MockHw {
    fn new() -> Self {
        Self {
            calls: Vec::new(),
            barriers: [BarrierPosition::Closed; Lane::COUNT],
            inputs: RawInputs::default(),
            light_on: false,
        }
    }

    fn barrier_calls(&self) -> Vec<ActCall> {
        self.calls
            .iter()
            .copied()
            .filter(|c| matches!(c, ActCall::SetBarrier(..)))
            .collect()
    }
}

impl SensorPort for MockHw {
    fn read_inputs(&mut self) -> RawInputs {
        self.inputs
    }
}

impl ActuatorPort for MockHw {
    fn set_barrier(&mut self, lane: Lane, position: BarrierPosition) {
        self.barriers[lane.index()] = position;
        self.calls.push(ActCall::SetBarrier(lane, position));
    }
    fn barrier_position(&self, lane: Lane) -> BarrierPosition {
        self.barriers[lane.index()]
    }
    fn pulse_buzzer(&mut self, duration_ms: u16) {
        self.calls.push(ActCall::Pulse(duration_ms));
    }
    fn buzzer_idle(&self) -> bool {
        true
    }
    fn set_light(&mut self, on: bool) {
        self.light_on = on;
        self.calls.push(ActCall::SetLight(on));
    }
}

#[derive(Default)]
struct RecordingUi {
    frames: Vec<DisplayFrame>,
}

impl DisplayPort for RecordingUi {
    fn render(&mut self, frame: &DisplayFrame) {
        self.frames.push(frame.clone());
    }
}

#[derive(Default)]
struct RecordingSink {
    events: Vec<AppEvent>,
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(*event);
    }
}

// ── Harness ───────────────────────────────────────────────────

struct Harness {
    app: AppService,
    hw: MockHw,
    ui: RecordingUi,
    sink: RecordingSink,
    now_ms: u64,
}

impl Harness {
    fn new() -> Self {
        let mut h = Self {
            app: AppService::new(SystemConfig::default()),
            hw: MockHw::new(),
            ui: RecordingUi::default(),
            sink: RecordingSink::default(),
            now_ms: 0,
        };
        h.app.start(h.now_ms, &mut h.hw, &mut h.sink);
        h
    }

    /// Advance one control cycle.
    fn tick(&mut self) {
        self.now_ms += TICK;
        self.app
            .tick(self.now_ms, &mut self.hw, &mut self.ui, &mut self.sink);
    }

    fn ticks(&mut self, n: usize) {
        for _ in 0..n {
            self.tick();
        }
    }

    fn serial(&mut self, cmd: SerialCommand) -> SerialReply {
        self.app
            .handle_serial_command(cmd, self.now_ms, &mut self.hw, &mut self.sink)
    }

    fn host(&mut self, event: HostEvent) {
        self.app
            .handle_host_event(event, self.now_ms, &mut self.hw, &mut self.sink);
    }

    fn barrier(&self, lane: Lane) -> BarrierPosition {
        self.app.state().lane(lane).barrier
    }
}

// ── Occupancy scenarios ───────────────────────────────────────

#[test]
fn entrance_pass_counts_and_arms_autoclose() {
    let mut h = Harness::new();
    let _ = h.serial(SerialCommand::OpenBarrier(Lane::Entrance));

    // Car breaks the beam for one cycle, then clears it.
    h.hw.inputs.car_at_entrance = true;
    h.tick();
    h.hw.inputs.car_at_entrance = false;
    h.tick();

    let stats = h.app.state().stats;
    assert_eq!(stats.total_in, 1);
    assert_eq!(stats.current_occupancy, 1);
    assert_eq!(
        h.app.autoclose_deadline(Lane::Entrance),
        Some(h.now_ms + 2_000),
        "deadline armed at clear-time + configured delay"
    );
}

#[test]
fn exit_pass_decrements_occupancy() {
    let mut h = Harness::new();
    let _ = h.serial(SerialCommand::OpenBarrier(Lane::Entrance));
    let _ = h.serial(SerialCommand::OpenBarrier(Lane::Exit));

    h.hw.inputs.car_at_entrance = true;
    h.tick();
    h.hw.inputs.car_at_entrance = false;
    h.tick();

    h.hw.inputs.car_at_exit = true;
    h.tick();
    h.hw.inputs.car_at_exit = false;
    h.tick();

    let stats = h.app.state().stats;
    assert_eq!(stats.total_in, 1);
    assert_eq!(stats.total_out, 1);
    assert_eq!(stats.current_occupancy, 0);
}

#[test]
fn occupancy_clamps_at_zero() {
    let mut h = Harness::new();
    let _ = h.serial(SerialCommand::OpenBarrier(Lane::Exit));

    for _ in 0..3 {
        h.hw.inputs.car_at_exit = true;
        h.tick();
        h.hw.inputs.car_at_exit = false;
        h.tick();
    }

    assert_eq!(h.app.state().stats.total_out, 3);
    assert_eq!(h.app.state().stats.current_occupancy, 0);
}

#[test]
fn presence_notified_but_not_counted_during_alarm() {
    let mut h = Harness::new();
    let _ = h.serial(SerialCommand::Earthquake);
    h.sink.events.clear();

    h.hw.inputs.car_at_entrance = true;
    h.tick();

    assert!(h.sink.events.contains(&AppEvent::CarPresence {
        lane: Lane::Entrance,
        present: true
    }));
    assert_eq!(h.app.state().stats.total_in, 0, "alarm traffic is not counted");
}

// ── Auto-close scenarios ──────────────────────────────────────

#[test]
fn autoclose_fires_after_delay_when_lane_clear() {
    let mut h = Harness::new();
    let _ = h.serial(SerialCommand::OpenBarrier(Lane::Entrance));

    h.hw.inputs.car_at_entrance = true;
    h.tick();
    h.hw.inputs.car_at_entrance = false;
    h.tick();

    // 2000 ms delay = 20 cycles; one cycle before the deadline nothing happens.
    h.ticks(19);
    assert_eq!(h.barrier(Lane::Entrance), BarrierPosition::Open);
    h.tick();
    assert_eq!(h.barrier(Lane::Entrance), BarrierPosition::Closed);
    assert!(!h.app.autoclose_armed(Lane::Entrance));
}

#[test]
fn autoclose_defers_while_beam_blocked() {
    let mut h = Harness::new();
    let _ = h.serial(SerialCommand::OpenBarrier(Lane::Entrance));

    h.hw.inputs.car_at_entrance = true;
    h.tick();
    h.hw.inputs.car_at_entrance = false;
    h.tick();

    // A second car re-enters the beam before the deadline.
    h.hw.inputs.car_at_entrance = true;
    h.tick();

    // Way past the deadline: the close must not fire under the car.
    h.ticks(40);
    assert_eq!(h.barrier(Lane::Entrance), BarrierPosition::Open);
    assert!(h.app.autoclose_armed(Lane::Entrance), "deferred, not cancelled");

    // First cycle with the beam clear: the close fires.
    h.hw.inputs.car_at_entrance = false;
    h.tick(); // falling edge re-arms; but the old deadline had elapsed
    h.tick();
    // Either the original or re-armed deadline closes it eventually;
    // the barrier must be closed once clear and the delay has elapsed.
    h.ticks(20);
    assert_eq!(h.barrier(Lane::Entrance), BarrierPosition::Closed);
}

#[test]
fn manual_close_cancels_deadline() {
    let mut h = Harness::new();
    let _ = h.serial(SerialCommand::OpenBarrier(Lane::Entrance));

    h.hw.inputs.car_at_entrance = true;
    h.tick();
    h.hw.inputs.car_at_entrance = false;
    h.tick();
    assert!(h.app.autoclose_armed(Lane::Entrance));

    let _ = h.serial(SerialCommand::CloseBarrier(Lane::Entrance));
    assert!(!h.app.autoclose_armed(Lane::Entrance));
    assert_eq!(h.barrier(Lane::Entrance), BarrierPosition::Closed);

    // Long after the would-be deadline, nothing re-opens or re-closes.
    let calls_before = h.hw.barrier_calls().len();
    h.ticks(40);
    assert_eq!(h.hw.barrier_calls().len(), calls_before);
}

// ── Alarm scenarios ───────────────────────────────────────────

fn trip_flame(h: &mut Harness) {
    // Default config needs two stable samples.
    h.hw.inputs.flame = true;
    h.tick();
    h.tick();
}

#[test]
fn flame_raises_fire_opens_barriers_counts_trigger() {
    let mut h = Harness::new();
    trip_flame(&mut h);

    assert_eq!(h.app.alarm_state(), AlarmState::Fire);
    assert_eq!(h.barrier(Lane::Entrance), BarrierPosition::Open);
    assert_eq!(h.barrier(Lane::Exit), BarrierPosition::Open);
    assert_eq!(h.app.state().stats.alarm_triggers, 1);
    assert!(h
        .sink
        .events
        .contains(&AppEvent::AlarmRaised(smartpark::alarm::AlarmKind::Fire)));

    // Flame still burning: no second trigger count.
    h.ticks(5);
    assert_eq!(h.app.state().stats.alarm_triggers, 1);
}

#[test]
fn earthquake_overrides_fire_and_button_clears() {
    let mut h = Harness::new();
    trip_flame(&mut h);
    assert_eq!(h.app.alarm_state(), AlarmState::Fire);

    let reply = h.serial(SerialCommand::Earthquake);
    assert_eq!(reply, SerialReply::EarthquakeActivated);
    assert_eq!(h.app.alarm_state(), AlarmState::Earthquake);

    // Flame sensor cleared; operator short-presses the button.
    h.hw.inputs.flame = false;
    h.ticks(2); // flame debounce back to quiet
    h.hw.inputs.button_pressed = true;
    h.ticks(3);
    h.hw.inputs.button_pressed = false;
    h.tick();

    assert_eq!(h.app.alarm_state(), AlarmState::Normal);
    assert_eq!(h.barrier(Lane::Entrance), BarrierPosition::Closed);
    assert_eq!(h.barrier(Lane::Exit), BarrierPosition::Closed);
    assert!(h.sink.events.contains(&AppEvent::AlarmCleared));
}

#[test]
fn alarm_cancels_armed_deadlines() {
    let mut h = Harness::new();
    let _ = h.serial(SerialCommand::OpenBarrier(Lane::Entrance));
    h.hw.inputs.car_at_entrance = true;
    h.tick();
    h.hw.inputs.car_at_entrance = false;
    h.tick();
    assert!(h.app.autoclose_armed(Lane::Entrance));

    let _ = h.serial(SerialCommand::Earthquake);
    assert!(!h.app.autoclose_armed(Lane::Entrance));

    // Barriers stay open past the old deadline.
    h.ticks(40);
    assert_eq!(h.barrier(Lane::Entrance), BarrierPosition::Open);
}

#[test]
fn earthquake_stop_when_normal_is_idempotent() {
    let mut h = Harness::new();
    let reply = h.serial(SerialCommand::EarthquakeStop);
    assert_eq!(reply, SerialReply::EarthquakeStopped);
    assert_eq!(h.app.alarm_state(), AlarmState::Normal);
    assert!(h.hw.barrier_calls().len() <= 2, "no forced movement beyond init");
}

#[test]
fn fire_banner_reaches_display() {
    let mut h = Harness::new();
    trip_flame(&mut h);
    let frame = h.ui.frames.last().expect("alarm cycle must redraw");
    assert!(matches!(frame.oled, OledContent::Fire));
}

// ── Button scenarios ──────────────────────────────────────────

fn press_cycles(h: &mut Harness, cycles: usize) {
    h.hw.inputs.button_pressed = true;
    h.ticks(cycles);
    h.hw.inputs.button_pressed = false;
    h.tick();
}

#[test]
fn short_press_opens_both_when_any_closed() {
    let mut h = Harness::new();
    let _ = h.serial(SerialCommand::OpenBarrier(Lane::Entrance));
    // Mixed state: entrance open, exit closed → press opens both.
    press_cycles(&mut h, 3);
    assert_eq!(h.barrier(Lane::Entrance), BarrierPosition::Open);
    assert_eq!(h.barrier(Lane::Exit), BarrierPosition::Open);
}

#[test]
fn short_press_closes_both_when_both_open() {
    let mut h = Harness::new();
    let _ = h.serial(SerialCommand::OpenBarrier(Lane::Entrance));
    let _ = h.serial(SerialCommand::OpenBarrier(Lane::Exit));
    press_cycles(&mut h, 3);
    assert_eq!(h.barrier(Lane::Entrance), BarrierPosition::Closed);
    assert_eq!(h.barrier(Lane::Exit), BarrierPosition::Closed);
}

#[test]
fn long_press_resets_stats_even_during_alarm() {
    let mut h = Harness::new();
    let _ = h.serial(SerialCommand::OpenBarrier(Lane::Entrance));
    h.hw.inputs.car_at_entrance = true;
    h.tick();
    h.hw.inputs.car_at_entrance = false;
    h.tick();
    trip_flame(&mut h);
    assert_eq!(h.app.state().stats.alarm_triggers, 1);

    press_cycles(&mut h, 12); // past the long-press threshold

    let stats = h.app.state().stats;
    assert_eq!(stats.total_in, 0);
    assert_eq!(stats.total_out, 0);
    assert_eq!(stats.current_occupancy, 0);
    assert_eq!(stats.alarm_triggers, 0);
    assert!(h.sink.events.contains(&AppEvent::StatsReset));
    // Long press does not clear the alarm.
    assert_eq!(h.app.alarm_state(), AlarmState::Fire);
}

// ── Serial command channel ────────────────────────────────────

#[test]
fn close_twice_is_idempotent() {
    let mut h = Harness::new();
    let _ = h.serial(SerialCommand::OpenBarrier(Lane::Entrance));
    let calls_after_open = h.hw.barrier_calls().len();

    let r1 = h.serial(SerialCommand::CloseBarrier(Lane::Entrance));
    let r2 = h.serial(SerialCommand::CloseBarrier(Lane::Entrance));
    assert_eq!(r1, r2);
    assert_eq!(h.barrier(Lane::Entrance), BarrierPosition::Closed);
    // Exactly one actuator movement for the two close commands.
    assert_eq!(h.hw.barrier_calls().len(), calls_after_open + 1);
}

#[test]
fn light_commands_drive_gpio_and_state() {
    let mut h = Harness::new();
    let r = h.serial(SerialCommand::LightOn);
    assert_eq!(r, SerialReply::LightOn);
    assert!(h.hw.light_on);
    assert!(h.app.state().light_on);

    let r = h.serial(SerialCommand::LightOff);
    assert_eq!(r, SerialReply::LightOff);
    assert!(!h.hw.light_on);
}

#[test]
fn slot_data_round_trips_to_display_table() {
    let mut h = Harness::new();
    let reply = h.serial(SerialCommand::SlotCounts([2, 1, 1]));
    assert_eq!(reply, SerialReply::SlotCountsUpdated([2, 1, 1]));
    h.tick();

    let frame = h.ui.frames.last().expect("slot update must redraw");
    let OledContent::Slots(table) = &frame.oled else {
        panic!("expected slot table");
    };
    assert_eq!(
        [table.rows[0].occupied, table.rows[1].occupied, table.rows[2].occupied],
        [2, 1, 1]
    );
    assert_eq!(
        [
            table.rows[0].available,
            table.rows[1].available,
            table.rows[2].available
        ],
        [3, 4, 4]
    );
    assert_eq!(table.aggregate.occupied, 4);
    assert_eq!(table.aggregate.available, 11);
}

#[test]
fn overfull_slot_report_saturates_at_zero() {
    let mut h = Harness::new();
    let _ = h.serial(SerialCommand::SlotCounts([9, 9, 9]));
    h.tick();
    let OledContent::Slots(table) = &h.ui.frames.last().unwrap().oled else {
        panic!("expected slot table");
    };
    assert!(table.rows.iter().all(|r| r.available == 0));
    assert_eq!(table.aggregate.available, 0);
}

#[test]
fn malformed_slot_command_changes_nothing() {
    let mut h = Harness::new();
    let _ = h.serial(SerialCommand::SlotCounts([2, 1, 1]));
    h.tick();
    let before = h.app.state().slots.clone();
    let frames_before = h.ui.frames.len();

    let err = serial::parse_line("parking_num_slot:abc").unwrap_err();
    assert_eq!(
        serial::error_line(&err).as_str(),
        "ERROR: Invalid parking_num_slot format"
    );

    // Nothing was dispatched; two idle cycles redraw nothing.
    h.ticks(2);
    assert_eq!(h.app.state().slots, before);
    assert_eq!(h.ui.frames.len(), frames_before);
}

#[test]
fn recommend_text_flows_to_lcd() {
    let mut h = Harness::new();
    let mut text = heapless::String::new();
    text.push_str("B3 - best spot").unwrap();
    let _ = h.serial(SerialCommand::SlotRecommend(text));
    h.tick();

    let frame = h.ui.frames.last().unwrap();
    assert_eq!(frame.lcd.line1.as_str(), "Recommend:");
    assert_eq!(frame.lcd.line2.as_str(), "B3 - best spot");
}

// ── Wireless channel ──────────────────────────────────────────

#[test]
fn barrier_control_write_moves_lanes() {
    let mut h = Harness::new();
    let write = gatt::decode_barrier_control(&[1, 1]).unwrap();
    h.host(HostEvent::BarrierControl(write));
    assert_eq!(h.barrier(Lane::Entrance), BarrierPosition::Open);
    assert_eq!(h.barrier(Lane::Exit), BarrierPosition::Open);

    let write = gatt::decode_barrier_control(&[0, 2]).unwrap();
    h.host(HostEvent::BarrierControl(write));
    assert_eq!(h.barrier(Lane::Entrance), BarrierPosition::Closed);
    assert_eq!(h.barrier(Lane::Exit), BarrierPosition::Open, "2 is a no-op");
}

#[test]
fn wireless_close_cancels_deadline() {
    let mut h = Harness::new();
    let _ = h.serial(SerialCommand::OpenBarrier(Lane::Exit));
    h.hw.inputs.car_at_exit = true;
    h.tick();
    h.hw.inputs.car_at_exit = false;
    h.tick();
    assert!(h.app.autoclose_armed(Lane::Exit));

    let write = gatt::decode_barrier_control(&[2, 0]).unwrap();
    h.host(HostEvent::BarrierControl(write));
    assert!(!h.app.autoclose_armed(Lane::Exit));
}

#[test]
fn wireless_barrier_control_is_not_alarm_gated() {
    let mut h = Harness::new();
    let _ = h.serial(SerialCommand::Earthquake);

    // Privileged override: host may close a lane during an alarm.
    let write = gatt::decode_barrier_control(&[0, 2]).unwrap();
    h.host(HostEvent::BarrierControl(write));
    assert_eq!(h.barrier(Lane::Entrance), BarrierPosition::Closed);
    assert_eq!(h.app.alarm_state(), AlarmState::Earthquake);
}

#[test]
fn host_display_write_stores_truncated_text() {
    let mut h = Harness::new();
    let text = gatt::decode_display_text(b"Lot status: OPEN\0trailing");
    h.host(HostEvent::WriteLcd(text));
    assert_eq!(h.app.state().host_lcd_text.as_str(), "Lot status: OPEN");
    assert!(h.app.state().is_dirty());
}

// ── Display / dirty-flag behaviour ────────────────────────────

#[test]
fn display_drains_once_per_cycle_and_only_when_dirty() {
    let mut h = Harness::new();
    h.tick(); // initial dirty state renders
    let after_first = h.ui.frames.len();
    assert_eq!(after_first, 1);

    h.ticks(5); // nothing changed
    assert_eq!(h.ui.frames.len(), after_first);

    let _ = h.serial(SerialCommand::SlotCounts([1, 0, 0]));
    h.tick();
    assert_eq!(h.ui.frames.len(), after_first + 1);
}

// ── GATT payload views ────────────────────────────────────────

#[test]
fn status_payloads_track_state() {
    let mut h = Harness::new();
    assert_eq!(h.app.ir_status_payload(), [0, 0]);

    h.hw.inputs.car_at_entrance = true;
    h.tick();
    assert_eq!(h.app.ir_status_payload(), [1, 0]);

    let _ = h.serial(SerialCommand::LightOn);
    trip_flame(&mut h);
    assert_eq!(h.app.sensor_status_payload(), [1, 1, 1, 0]);
}
