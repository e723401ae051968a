//! Display adapter: renders composed frames onto the two panels.
//!
//! The domain core hands over a [`DisplayFrame`]; everything below that
//! line is presentation. Text layout is shared, host-testable code; the
//! actual panel I/O is cfg-gated:
//!
//! - **LCD** — 16x2 character module behind a PCF8574 I²C backpack on
//!   I2C0, driven with the standard HD44780 4-bit sequence.
//! - **OLED** — 128x64 SSD1306 on I2C1 via the `ssd1306` crate with
//!   `embedded-graphics` text rendering, eight 8-pixel rows.
//!
//! On the host the adapter records the formatted lines instead, which is
//! what the round-trip tests assert against.

use crate::app::ports::DisplayPort;
use crate::display::{DisplayFrame, LCD_COLS, OledContent, format_table_row};

/// OLED text column width at the 6x8 font (128 / 6).
pub const OLED_COLS: usize = 21;
/// OLED text rows at 8 px per row.
pub const OLED_ROWS: usize = 8;

pub type OledLine = heapless::String<OLED_COLS>;

/// Format the OLED text rows for a frame. Row 0 is the fixed title; the
/// remaining rows carry the alarm banner or the occupancy table.
pub fn oled_lines(content: &OledContent) -> heapless::Vec<OledLine, OLED_ROWS> {
    let mut lines: heapless::Vec<OledLine, OLED_ROWS> = heapless::Vec::new();
    let mut push = |text: &str| {
        let mut line = OledLine::new();
        for ch in text.chars().take(OLED_COLS) {
            let _ = line.push(ch);
        }
        let _ = lines.push(line);
    };

    push("PARKING SYSTEM");
    match content {
        OledContent::Earthquake => {
            push("");
            push("!! EARTHQUAKE !!");
            push("EVACUATE NOW!");
            push("Barriers OPEN");
            push("Leave immediately");
        }
        OledContent::Fire => {
            push("");
            push("!!! FIRE ALARM !!!");
            push("Barriers OPEN");
            push("Press BTN to stop");
        }
        OledContent::Slots(table) => {
            push("Slot Occ Avail Tot");
            push("-------------------");
            for row in &table.rows {
                push(&format_table_row(row));
            }
            push("-------------------");
            push(&format_table_row(&table.aggregate));
        }
    }
    lines
}

/// Format the two LCD rows, padded to the full width so stale characters
/// are overwritten without a clear.
pub fn lcd_lines(frame: &DisplayFrame) -> [heapless::String<LCD_COLS>; 2] {
    let pad = |text: &str| {
        let mut line = heapless::String::<LCD_COLS>::new();
        for ch in text.chars().take(LCD_COLS) {
            let _ = line.push(ch);
        }
        while line.len() < LCD_COLS {
            let _ = line.push(' ');
        }
        line
    };
    [pad(&frame.lcd.line1), pad(&frame.lcd.line2)]
}

// ───────────────────────────────────────────────────────────────
// Device adapter
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
mod esp {
    use super::*;
    use crate::error::{Error, Result};
    use crate::pins;
    use embedded_graphics::{
        mono_font::{MonoTextStyle, ascii::FONT_6X10},
        pixelcolor::BinaryColor,
        prelude::*,
        text::{Baseline, Text},
    };
    use esp_idf_hal::delay::{Ets, FreeRtos};
    use esp_idf_hal::gpio::AnyIOPin;
    use esp_idf_hal::i2c::{I2C0, I2C1, I2cConfig, I2cDriver};
    use esp_idf_hal::units::FromValueType;
    use ssd1306::{I2CDisplayInterface, Ssd1306, mode::BufferedGraphicsMode, prelude::*};

    type Oled = Ssd1306<
        I2CInterface<I2cDriver<'static>>,
        DisplaySize128x64,
        BufferedGraphicsMode<DisplaySize128x64>,
    >;

    // ── HD44780 over PCF8574 ──────────────────────────────────
    //
    // Backpack bit map: P0=RS, P1=RW, P2=EN, P3=backlight, P4..P7=data.

    const LCD_RS: u8 = 0x01;
    const LCD_EN: u8 = 0x04;
    const LCD_BACKLIGHT: u8 = 0x08;

    struct CharLcd {
        i2c: I2cDriver<'static>,
        addr: u8,
    }

    impl CharLcd {
        fn new(i2c: I2cDriver<'static>, addr: u8) -> Result<Self> {
            let mut lcd = Self { i2c, addr };
            FreeRtos::delay_ms(50); // Power-on settle.
            // 4-bit init handshake, then function set / display on / entry mode.
            lcd.command(0x33)?;
            lcd.command(0x32)?;
            lcd.command(0x28)?;
            lcd.command(0x0C)?;
            lcd.command(0x06)?;
            lcd.command(0x01)?;
            FreeRtos::delay_ms(2);
            Ok(lcd)
        }

        fn command(&mut self, cmd: u8) -> Result<()> {
            self.write_byte(cmd, false)
        }

        fn set_cursor(&mut self, col: u8, row: u8) -> Result<()> {
            let base = if row == 0 { 0x80 } else { 0xC0 };
            self.command(base + col)
        }

        fn print(&mut self, text: &str) -> Result<()> {
            for byte in text.bytes() {
                self.write_byte(byte, true)?;
            }
            Ok(())
        }

        fn write_byte(&mut self, byte: u8, is_data: bool) -> Result<()> {
            self.write_nibble(byte & 0xF0, is_data)?;
            self.write_nibble(byte << 4, is_data)?;
            Ok(())
        }

        fn write_nibble(&mut self, nibble: u8, is_data: bool) -> Result<()> {
            let flags = LCD_BACKLIGHT | if is_data { LCD_RS } else { 0 };
            let data = nibble | flags;
            self.raw(data | LCD_EN)?;
            Ets::delay_us(1);
            self.raw(data)?;
            Ets::delay_us(50);
            Ok(())
        }

        fn raw(&mut self, byte: u8) -> Result<()> {
            self.i2c
                .write(self.addr, &[byte], esp_idf_hal::delay::BLOCK)
                .map_err(|_| Error::Init("lcd i2c write"))
        }
    }

    // ── Adapter ───────────────────────────────────────────────

    pub struct DisplayAdapter {
        lcd: CharLcd,
        oled: Oled,
    }

    impl DisplayAdapter {
        pub fn new(
            i2c0: I2C0,
            i2c1: I2C1,
        ) -> Result<Self> {
            let cfg = I2cConfig::new().baudrate(400u32.kHz().into());

            let lcd_i2c = I2cDriver::new(
                i2c0,
                unsafe { AnyIOPin::new(pins::LCD_SDA_GPIO) },
                unsafe { AnyIOPin::new(pins::LCD_SCL_GPIO) },
                &cfg,
            )
            .map_err(|_| Error::Init("i2c0"))?;

            let oled_i2c = I2cDriver::new(
                i2c1,
                unsafe { AnyIOPin::new(pins::OLED_SDA_GPIO) },
                unsafe { AnyIOPin::new(pins::OLED_SCL_GPIO) },
                &cfg,
            )
            .map_err(|_| Error::Init("i2c1"))?;

            let lcd = CharLcd::new(lcd_i2c, pins::LCD_I2C_ADDR)?;

            let interface = I2CDisplayInterface::new_custom_address(oled_i2c, pins::OLED_I2C_ADDR);
            let mut oled = Ssd1306::new(interface, DisplaySize128x64, DisplayRotation::Rotate0)
                .into_buffered_graphics_mode();
            oled.init().map_err(|_| Error::Init("ssd1306 init"))?;

            Ok(Self { lcd, oled })
        }
    }

    impl DisplayPort for DisplayAdapter {
        fn render(&mut self, frame: &DisplayFrame) {
            // LCD: two padded rows, no clear needed.
            let rows = lcd_lines(frame);
            for (row, text) in rows.iter().enumerate() {
                if self.lcd.set_cursor(0, row as u8).is_err() {
                    log::warn!("LCD write failed, skipping redraw");
                    return;
                }
                let _ = self.lcd.print(text);
            }

            // OLED: full-buffer redraw then flush.
            let style = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);
            let _ = self.oled.clear(BinaryColor::Off);
            for (i, line) in oled_lines(&frame.oled).iter().enumerate() {
                let _ = Text::with_baseline(
                    line.as_str(),
                    Point::new(0, (i as i32) * 8),
                    style,
                    Baseline::Top,
                )
                .draw(&mut self.oled);
            }
            if self.oled.flush().is_err() {
                log::warn!("OLED flush failed");
            }
        }
    }
}

#[cfg(target_os = "espidf")]
pub use esp::DisplayAdapter;

// ───────────────────────────────────────────────────────────────
// Host simulation
// ───────────────────────────────────────────────────────────────

/// Host stand-in: keeps the formatted text of the last rendered frame.
#[cfg(not(target_os = "espidf"))]
#[derive(Default)]
pub struct DisplayAdapter {
    pub last_lcd: Vec<String>,
    pub last_oled: Vec<String>,
    pub render_count: usize,
}

#[cfg(not(target_os = "espidf"))]
impl DisplayAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(not(target_os = "espidf"))]
impl DisplayPort for DisplayAdapter {
    fn render(&mut self, frame: &DisplayFrame) {
        self.last_lcd = lcd_lines(frame).iter().map(|l| l.to_string()).collect();
        self.last_oled = oled_lines(&frame.oled)
            .iter()
            .map(|l| l.to_string())
            .collect();
        self.render_count += 1;
    }
}
