#![allow(dead_code)] // Referenced only from the espidf-gated adapters.

//! GPIO / peripheral pin assignments for the SmartPark controller board.
//!
//! Single source of truth; every adapter references this module rather than
//! hard-coding pin numbers. Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// IR beam sensors (active LOW: beam broken = car present)
// ---------------------------------------------------------------------------

/// Entrance lane beam sensor.
pub const IR_ENTRANCE_GPIO: i32 = 4;
/// Exit lane beam sensor.
pub const IR_EXIT_GPIO: i32 = 5;

// ---------------------------------------------------------------------------
// Flame sensor (active LOW: flame detected)
// ---------------------------------------------------------------------------

pub const FLAME_GPIO: i32 = 6;

// ---------------------------------------------------------------------------
// Barrier servos (SG90-class, 50 Hz pulse train)
// ---------------------------------------------------------------------------

/// Entrance barrier servo signal.
pub const SERVO_ENTRANCE_GPIO: i32 = 7;
/// Exit barrier servo signal.
pub const SERVO_EXIT_GPIO: i32 = 8;

// ---------------------------------------------------------------------------
// Operator button (active LOW with pull-up)
// ---------------------------------------------------------------------------

pub const BUTTON_GPIO: i32 = 9;

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// Piezo buzzer, driven HIGH for the pulse duration.
pub const BUZZER_GPIO: i32 = 10;
/// Auxiliary lot light, host-controlled.
pub const LIGHT_GPIO: i32 = 11;

// ---------------------------------------------------------------------------
// I²C buses. The two panels sit on separate controllers so neither
// driver needs bus sharing.
// ---------------------------------------------------------------------------

/// I2C0: 16x2 character LCD behind a PCF8574 backpack.
pub const LCD_SDA_GPIO: i32 = 14;
pub const LCD_SCL_GPIO: i32 = 15;
/// PCF8574 backpack address for the character LCD.
pub const LCD_I2C_ADDR: u8 = 0x27;

/// I2C1: 128x64 SSD1306 OLED.
pub const OLED_SDA_GPIO: i32 = 12;
pub const OLED_SCL_GPIO: i32 = 13;
/// SSD1306 OLED address.
pub const OLED_I2C_ADDR: u8 = 0x3C;

// ---------------------------------------------------------------------------
// UART host link
// ---------------------------------------------------------------------------

pub const UART_TX_GPIO: i32 = 17;
pub const UART_RX_GPIO: i32 = 18;
pub const UART_BAUD: u32 = 115_200;
