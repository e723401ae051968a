//! SmartPark Firmware — Main Entry Point
//!
//! Hexagonal architecture around a fixed-period cooperative loop:
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter    SerialConsole    BleAdapter                │
//! │  (Sensor+Actuator)  (UART cmd link)  (GATT server)             │
//! │  DisplayAdapter     LogEventSink     MonotonicClock            │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  alarm priority · auto-close · occupancy · router      │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each ~100 ms cycle: drain serial bytes → drain wireless events →
//! run the control tick → flush characteristic notifications → sleep.
#![deny(unused_must_use)]

use anyhow::Result;
use log::info;

use smartpark::adapters::ble::BleAdapter;
use smartpark::adapters::display::DisplayAdapter;
use smartpark::adapters::hardware::HardwareAdapter;
use smartpark::adapters::log_sink::LogEventSink;
use smartpark::adapters::serial_io::SerialConsole;
use smartpark::adapters::time::MonotonicClock;
use smartpark::app::commands::HostEvent;
use smartpark::app::events::AppEvent;
use smartpark::app::ports::EventSink;
use smartpark::app::service::AppService;
use smartpark::config::SystemConfig;
use smartpark::serial::{self, LineEvent};
use smartpark::CommandError;

// ── Event fan-out ─────────────────────────────────────────────
//
// One sink feeds three consumers: the log, the serial notification
// lines, and two "payload changed" flags the loop uses to push GATT
// notifications after the core releases its borrows.

struct FanoutSink<'a> {
    console: &'a mut SerialConsole,
    log: LogEventSink,
    ir_changed: &'a mut bool,
    sensor_changed: &'a mut bool,
}

impl EventSink for FanoutSink<'_> {
    fn emit(&mut self, event: &AppEvent) {
        self.log.emit(event);
        self.console.emit(event);
        match event {
            AppEvent::CarPresence { .. } => *self.ir_changed = true,
            AppEvent::AlarmRaised(_) | AppEvent::AlarmCleared => *self.sensor_changed = true,
            _ => {}
        }
    }
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("SmartPark v{} booting", env!("CARGO_PKG_VERSION"));

    let config = SystemConfig::default();
    let loop_interval_ms = config.control_loop_interval_ms;

    // ── 2. Bring up adapters ──────────────────────────────────
    let peripherals = esp_idf_hal::peripherals::Peripherals::take()?;
    let mut hw = HardwareAdapter::new()?;
    let mut ui = DisplayAdapter::new(peripherals.i2c0, peripherals.i2c1)?;
    let mut console = SerialConsole::new()?;
    let mut ble = BleAdapter::start()?;
    let clock = MonotonicClock::new();

    // ── 3. Start the coordinator ──────────────────────────────
    let mut app = AppService::new(config);
    let mut ir_changed = false;
    let mut sensor_changed = false;
    {
        let mut sink = FanoutSink {
            console: &mut console,
            log: LogEventSink::new(),
            ir_changed: &mut ir_changed,
            sensor_changed: &mut sensor_changed,
        };
        app.start(clock.now_ms(), &mut hw, &mut sink);
    }

    // ── 4. Control loop ───────────────────────────────────────
    loop {
        let now_ms = clock.now_ms();
        hw.poll(now_ms);

        // 4a. Serial command intake (bounded per cycle).
        for event in console.pump() {
            match event {
                LineEvent::Line(line) => {
                    info!("[CMD] Received: {line}");
                    match serial::parse_line(&line) {
                        Ok(cmd) => {
                            let reply = {
                                let mut sink = FanoutSink {
                                    console: &mut console,
                                    log: LogEventSink::new(),
                                    ir_changed: &mut ir_changed,
                                    sensor_changed: &mut sensor_changed,
                                };
                                app.handle_serial_command(cmd, now_ms, &mut hw, &mut sink)
                            };
                            console.write_line(&serial::reply_line(&reply));
                        }
                        Err(err) => console.write_line(&serial::error_line(&err)),
                    }
                }
                LineEvent::Overflow => {
                    console.write_line(&serial::error_line(&CommandError::BufferOverflow));
                }
            }
        }

        // 4b. Wireless intake: drain everything the radio queued.
        while let Some(event) = ble.take_event() {
            // A fresh central gets the current payloads pushed at once.
            if event == HostEvent::Connected {
                ir_changed = true;
                sensor_changed = true;
            }
            let mut sink = FanoutSink {
                console: &mut console,
                log: LogEventSink::new(),
                ir_changed: &mut ir_changed,
                sensor_changed: &mut sensor_changed,
            };
            app.handle_host_event(event, now_ms, &mut hw, &mut sink);
        }

        // 4c. Control cycle: sensors → alarm priority → actuators →
        //     deadlines → buzzer → display.
        {
            let mut sink = FanoutSink {
                console: &mut console,
                log: LogEventSink::new(),
                ir_changed: &mut ir_changed,
                sensor_changed: &mut sensor_changed,
            };
            app.tick(now_ms, &mut hw, &mut ui, &mut sink);
        }

        // 4d. Push characteristic notifications for whatever changed.
        if ir_changed {
            ble.notify_ir_status(app.ir_status_payload());
            ir_changed = false;
        }
        if sensor_changed {
            ble.notify_sensor_status(app.sensor_status_payload());
            sensor_changed = false;
        }

        esp_idf_hal::delay::FreeRtos::delay_ms(loop_interval_ms);
    }
}
