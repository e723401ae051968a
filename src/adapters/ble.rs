//! BLE GATT adapter.
//!
//! Exposes the parking service to the companion host:
//!
//! | Characteristic   | UUID                 | Perms        |
//! |------------------|----------------------|--------------|
//! | IR status        | `7c210002-…-9b27`    | Read+Notify  |
//! | Sensor status    | `7c210003-…-9b27`    | Read+Notify  |
//! | LCD display      | `7c210004-…-9b27`    | Write        |
//! | OLED display     | `7c210005-…-9b27`    | Write        |
//! | Barrier control  | `7c210006-…-9b27`    | Write        |
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: Bluedroid GATT server via raw
//!   `esp_idf_svc::sys` calls. Stack callbacks run on the Bluetooth task,
//!   so decoded writes cross to the control loop through a mutex-guarded
//!   queue and are drained synchronously at the top of the next cycle.
//! - **all other targets**: a simulation stub with the same surface plus
//!   test injectors.
//!
//! Payload layouts live in [`crate::gatt`]; this adapter never interprets
//! byte offsets itself.

use crate::app::commands::HostEvent;
use crate::gatt;
use log::{info, warn};

pub const DEVICE_NAME: &str = "SmartPark";

/// Pending host events between the radio callback and the control loop.
const EVENT_QUEUE_CAP: usize = 8;

// ───────────────────────────────────────────────────────────────
// Device implementation (Bluedroid)
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
mod esp {
    use super::*;
    use crate::error::{CommsError, Error, Result};
    use core::sync::atomic::{AtomicBool, AtomicU16, AtomicU8, Ordering};
    use esp_idf_svc::sys;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    static EVENTS: Mutex<VecDeque<HostEvent>> = Mutex::new(VecDeque::new());
    static CONNECTED: AtomicBool = AtomicBool::new(false);
    static GATTS_IF: AtomicU8 = AtomicU8::new(0xFF);
    static CONN_ID: AtomicU16 = AtomicU16::new(0);
    static SERVICE_HANDLE: AtomicU16 = AtomicU16::new(0);

    /// Characteristic value handles, filled as ADD_CHAR events arrive.
    /// Indexed by the registration order below.
    static CHAR_HANDLES: [AtomicU16; 5] = [
        AtomicU16::new(0),
        AtomicU16::new(0),
        AtomicU16::new(0),
        AtomicU16::new(0),
        AtomicU16::new(0),
    ];
    const IDX_IR: usize = 0;
    const IDX_SENSOR: usize = 1;
    const IDX_LCD: usize = 2;
    const IDX_OLED: usize = 3;
    const IDX_BARRIER: usize = 4;

    const CHAR_UUIDS: [u128; 5] = [
        gatt::CHAR_IR_STATUS,
        gatt::CHAR_SENSOR_STATUS,
        gatt::CHAR_LCD_DISPLAY,
        gatt::CHAR_OLED_DISPLAY,
        gatt::CHAR_BARRIER_CONTROL,
    ];

    /// How many characteristics have been registered so far; drives the
    /// sequential ADD_CHAR chain.
    static CHARS_ADDED: AtomicU8 = AtomicU8::new(0);

    fn uuid128_to_esp(uuid: u128) -> sys::esp_bt_uuid_t {
        let mut t: sys::esp_bt_uuid_t = unsafe { core::mem::zeroed() };
        t.len = sys::ESP_UUID_LEN_128 as u16;
        t.uuid.uuid128 = uuid.to_le_bytes();
        t
    }

    fn push_event(event: HostEvent) {
        // Mutex poisoning is unreachable here (no panics while held), but
        // the queue must never take the radio task down with it.
        let Ok(mut q) = EVENTS.lock() else { return };
        if q.len() >= EVENT_QUEUE_CAP {
            warn!("BLE: host-event queue full, dropping oldest");
            q.pop_front();
        }
        q.push_back(event);
    }

    fn start_advertising() {
        let mut params: sys::esp_ble_adv_params_t = unsafe { core::mem::zeroed() };
        params.adv_int_min = 0xA0; // 100 ms
        params.adv_int_max = 0xA0;
        params.adv_type = sys::esp_ble_adv_type_t_ADV_TYPE_IND;
        params.own_addr_type = sys::esp_ble_addr_type_t_BLE_ADDR_TYPE_PUBLIC;
        params.channel_map = sys::esp_ble_adv_channel_t_ADV_CHNL_ALL;
        params.adv_filter_policy =
            sys::esp_ble_adv_filter_t_ADV_FILTER_ALLOW_SCAN_ANY_CON_ANY;
        let rc = unsafe { sys::esp_ble_gap_start_advertising(&mut params) };
        if rc != sys::ESP_OK {
            warn!("BLE: failed to start advertising (rc={rc})");
        }
    }

    unsafe extern "C" fn gap_handler(
        event: sys::esp_gap_ble_cb_event_t,
        _param: *mut sys::esp_ble_gap_cb_param_t,
    ) {
        if event == sys::esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_DATA_SET_COMPLETE_EVT {
            start_advertising();
        }
    }

    unsafe extern "C" fn gatts_handler(
        event: sys::esp_gatts_cb_event_t,
        gatts_if: sys::esp_gatt_if_t,
        param: *mut sys::esp_ble_gatts_cb_param_t,
    ) {
        let param = unsafe { &mut *param };

        match event {
            sys::esp_gatts_cb_event_t_ESP_GATTS_REG_EVT => {
                GATTS_IF.store(gatts_if as u8, Ordering::Release);
                let mut service_id: sys::esp_gatt_srvc_id_t = unsafe { core::mem::zeroed() };
                service_id.is_primary = true;
                service_id.id.inst_id = 0;
                service_id.id.uuid = uuid128_to_esp(gatt::SERVICE_UUID);
                // 5 characteristics, each needing value + declaration
                // handles, plus two CCCDs and the service itself.
                unsafe { sys::esp_ble_gatts_create_service(gatts_if, &mut service_id, 20) };
            }

            sys::esp_gatts_cb_event_t_ESP_GATTS_CREATE_EVT => {
                let handle = unsafe { param.create.service_handle };
                SERVICE_HANDLE.store(handle, Ordering::Release);
                unsafe { sys::esp_ble_gatts_start_service(handle) };
                add_next_characteristic(handle);
            }

            sys::esp_gatts_cb_event_t_ESP_GATTS_ADD_CHAR_EVT => {
                let idx = CHARS_ADDED.load(Ordering::Acquire) as usize;
                if idx < CHAR_HANDLES.len() {
                    CHAR_HANDLES[idx]
                        .store(unsafe { param.add_char.attr_handle }, Ordering::Release);
                }
                CHARS_ADDED.store(idx as u8 + 1, Ordering::Release);
                add_next_characteristic(SERVICE_HANDLE.load(Ordering::Acquire));
            }

            sys::esp_gatts_cb_event_t_ESP_GATTS_CONNECT_EVT => {
                CONNECTED.store(true, Ordering::Release);
                CONN_ID.store(unsafe { param.connect.conn_id }, Ordering::Release);
                info!("BLE: central connected");

                // Tighten the connection interval for snappy control.
                let mut conn_params: sys::esp_ble_conn_update_params_t =
                    unsafe { core::mem::zeroed() };
                conn_params.bda = unsafe { param.connect.remote_bda };
                conn_params.min_int = 40; // 50 ms
                conn_params.max_int = 80; // 100 ms
                conn_params.latency = 0;
                conn_params.timeout = 400; // 4 s
                unsafe { sys::esp_ble_gap_update_conn_params(&mut conn_params) };

                push_event(HostEvent::Connected);
            }

            sys::esp_gatts_cb_event_t_ESP_GATTS_DISCONNECT_EVT => {
                CONNECTED.store(false, Ordering::Release);
                info!("BLE: central disconnected, advertising resumes");
                start_advertising();
                push_event(HostEvent::Disconnected);
            }

            sys::esp_gatts_cb_event_t_ESP_GATTS_WRITE_EVT => {
                let handle = unsafe { param.write.handle };
                let payload = unsafe {
                    core::slice::from_raw_parts(param.write.value, param.write.len as usize)
                };
                handle_write(handle, payload);
                if unsafe { param.write.need_rsp } {
                    unsafe {
                        sys::esp_ble_gatts_send_response(
                            gatts_if,
                            param.write.conn_id,
                            param.write.trans_id,
                            sys::esp_gatt_status_t_ESP_GATT_OK,
                            core::ptr::null_mut(),
                        )
                    };
                }
            }

            _ => {}
        }
    }

    fn add_next_characteristic(service_handle: u16) {
        let idx = CHARS_ADDED.load(Ordering::Acquire) as usize;
        if idx >= CHAR_UUIDS.len() {
            info!("BLE: GATT table complete");
            return;
        }
        let mut uuid = uuid128_to_esp(CHAR_UUIDS[idx]);
        let (perm, prop) = match idx {
            IDX_IR | IDX_SENSOR => (
                sys::ESP_GATT_PERM_READ,
                sys::ESP_GATT_CHAR_PROP_BIT_READ | sys::ESP_GATT_CHAR_PROP_BIT_NOTIFY,
            ),
            _ => (sys::ESP_GATT_PERM_WRITE, sys::ESP_GATT_CHAR_PROP_BIT_WRITE),
        };
        let rc = unsafe {
            sys::esp_ble_gatts_add_char(
                service_handle,
                &mut uuid,
                perm as u16,
                prop as u8,
                core::ptr::null_mut(),
                core::ptr::null_mut(),
            )
        };
        if rc != sys::ESP_OK {
            warn!("BLE: add_char {idx} failed (rc={rc})");
        }
    }

    /// Decode a characteristic write into a host event. Undersized
    /// barrier payloads decode to `None` and are dropped silently.
    fn handle_write(handle: u16, payload: &[u8]) {
        let handle_of = |idx: usize| CHAR_HANDLES[idx].load(Ordering::Acquire);

        if handle == handle_of(IDX_BARRIER) {
            if let Some(write) = gatt::decode_barrier_control(payload) {
                push_event(HostEvent::BarrierControl(write));
            }
        } else if handle == handle_of(IDX_LCD) {
            push_event(HostEvent::WriteLcd(gatt::decode_display_text(payload)));
        } else if handle == handle_of(IDX_OLED) {
            push_event(HostEvent::WriteOled(gatt::decode_display_text(payload)));
        }
    }

    pub struct BleAdapter {
        _private: (),
    }

    impl BleAdapter {
        /// Bring up the controller + Bluedroid stack, register the GATT
        /// service, and start advertising.
        pub fn start() -> Result<Self> {
            unsafe {
                let mut bt_cfg: sys::esp_bt_controller_config_t = core::mem::zeroed();
                bt_cfg.controller_task_stack_size = 4096;
                if sys::esp_bt_controller_init(&mut bt_cfg) != sys::ESP_OK
                    || sys::esp_bt_controller_enable(sys::esp_bt_mode_t_ESP_BT_MODE_BLE)
                        != sys::ESP_OK
                    || sys::esp_bluedroid_init() != sys::ESP_OK
                    || sys::esp_bluedroid_enable() != sys::ESP_OK
                {
                    return Err(Error::Comms(CommsError::BleInitFailed));
                }

                sys::esp_ble_gap_register_callback(Some(gap_handler));
                sys::esp_ble_gatts_register_callback(Some(gatts_handler));
                sys::esp_ble_gatts_app_register(0);

                // DEVICE_NAME is a NUL-free literal.
                if let Ok(name) = std::ffi::CString::new(DEVICE_NAME) {
                    sys::esp_ble_gap_set_device_name(name.as_ptr());
                }

                let mut adv_data: sys::esp_ble_adv_data_t = core::mem::zeroed();
                adv_data.set_scan_rsp = false;
                adv_data.include_name = true;
                adv_data.flag =
                    (sys::ESP_BLE_ADV_FLAG_GEN_DISC | sys::ESP_BLE_ADV_FLAG_BREDR_NOT_SPT) as u8;
                if sys::esp_ble_gap_config_adv_data(&mut adv_data) != sys::ESP_OK {
                    return Err(Error::Comms(CommsError::AdvertisingFailed));
                }
            }
            info!("BLE: stack up, advertising as '{DEVICE_NAME}'");
            Ok(Self { _private: () })
        }

        /// Drain one queued host event; the main loop calls this until
        /// empty at the top of each cycle.
        pub fn take_event(&mut self) -> Option<HostEvent> {
            EVENTS.lock().ok()?.pop_front()
        }

        pub fn is_connected(&self) -> bool {
            CONNECTED.load(Ordering::Acquire)
        }

        pub fn notify_ir_status(&mut self, payload: [u8; 2]) {
            self.notify(IDX_IR, &payload);
        }

        pub fn notify_sensor_status(&mut self, payload: [u8; 4]) {
            self.notify(IDX_SENSOR, &payload);
        }

        fn notify(&mut self, idx: usize, payload: &[u8]) {
            if !self.is_connected() {
                return;
            }
            let rc = unsafe {
                sys::esp_ble_gatts_send_indicate(
                    GATTS_IF.load(Ordering::Acquire) as sys::esp_gatt_if_t,
                    CONN_ID.load(Ordering::Acquire),
                    CHAR_HANDLES[idx].load(Ordering::Acquire),
                    payload.len() as u16,
                    payload.as_ptr() as *mut u8,
                    false, // notification, no ack
                )
            };
            if rc != sys::ESP_OK {
                warn!("BLE: notify failed (rc={rc})");
            }
        }
    }
}

#[cfg(target_os = "espidf")]
pub use esp::BleAdapter;

// ───────────────────────────────────────────────────────────────
// Host simulation
// ───────────────────────────────────────────────────────────────

/// Host stand-in: events are injected by tests/simulations through the
/// same decode path the device callbacks use.
#[cfg(not(target_os = "espidf"))]
pub struct BleAdapter {
    queue: std::collections::VecDeque<HostEvent>,
    connected: bool,
    pub notified_ir: Vec<[u8; 2]>,
    pub notified_sensor: Vec<[u8; 4]>,
}

#[cfg(not(target_os = "espidf"))]
impl BleAdapter {
    pub fn start() -> crate::error::Result<Self> {
        info!("BLE (sim): advertising as '{DEVICE_NAME}'");
        Ok(Self {
            queue: std::collections::VecDeque::new(),
            connected: false,
            notified_ir: Vec::new(),
            notified_sensor: Vec::new(),
        })
    }

    pub fn take_event(&mut self) -> Option<HostEvent> {
        self.queue.pop_front()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn notify_ir_status(&mut self, payload: [u8; 2]) {
        if self.connected {
            self.notified_ir.push(payload);
        }
    }

    pub fn notify_sensor_status(&mut self, payload: [u8; 4]) {
        if self.connected {
            self.notified_sensor.push(payload);
        }
    }

    // ── Test injectors (same decode path as the device callbacks) ──

    pub fn inject_barrier_write(&mut self, payload: &[u8]) {
        if let Some(write) = gatt::decode_barrier_control(payload) {
            self.push(HostEvent::BarrierControl(write));
        } else {
            warn!("BLE (sim): undersized barrier write ignored");
        }
    }

    pub fn inject_lcd_write(&mut self, payload: &[u8]) {
        self.push(HostEvent::WriteLcd(gatt::decode_display_text(payload)));
    }

    pub fn inject_oled_write(&mut self, payload: &[u8]) {
        self.push(HostEvent::WriteOled(gatt::decode_display_text(payload)));
    }

    pub fn inject_connected(&mut self) {
        self.connected = true;
        self.push(HostEvent::Connected);
    }

    pub fn inject_disconnected(&mut self) {
        self.connected = false;
        self.push(HostEvent::Disconnected);
    }

    fn push(&mut self, event: HostEvent) {
        if self.queue.len() >= EVENT_QUEUE_CAP {
            self.queue.pop_front();
        }
        self.queue.push_back(event);
    }
}
