//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements           | Connects to                     |
//! |-------------|----------------------|---------------------------------|
//! | `hardware`  | SensorPort           | IR / flame / button GPIO        |
//! |             | ActuatorPort         | servo, buzzer, light GPIO       |
//! | `ble`       | host-event source    | Bluedroid GATT server           |
//! | `serial_io` | line pump, EventSink | UART0 host link                 |
//! | `display`   | DisplayPort          | I²C character LCD + SSD1306     |
//! | `log_sink`  | EventSink            | serial log output               |
//! | `time`      | monotonic clock      | esp_timer / `std::time`         |
//!
//! Every adapter compiles on the host with a simulation stub so the
//! domain core and integration tests never need real peripherals.

pub mod ble;
pub mod display;
pub mod hardware;
pub mod log_sink;
pub mod serial_io;
pub mod time;
