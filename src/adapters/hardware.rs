//! Hardware adapter — bridges real peripherals to the domain port traits.
//!
//! The only module that touches GPIO. On the target it owns the input
//! lines (IR beams, flame, button; all active low with pull-ups), the two
//! servo signal pins, and the buzzer/light outputs. On the host the same
//! type is an in-memory simulation with the identical port surface, so
//! the main loop and examples run unchanged.
//!
//! ## Buzzer
//!
//! Pulses are fire-and-forget: `pulse_buzzer` raises the pin and records
//! when it must drop; [`HardwareAdapter::poll`] (called once per control
//! cycle) lowers it once the deadline passes. A pulse request while one
//! is in flight is dropped, matching `buzzer_idle`.
//!
//! ## Servos
//!
//! Position changes send a short burst of frames
//! ([`PULSES_PER_MOVE`](crate::drivers::servo::PULSES_PER_MOVE)) with
//! busy-wait timing; this is the single synchronous time consumer in the
//! cycle and is bounded at a few tens of milliseconds per move.

use crate::app::ports::{ActuatorPort, RawInputs, SensorPort};
use crate::app::state::{BarrierPosition, Lane};
#[cfg(target_os = "espidf")]
use crate::drivers::servo;

#[cfg(target_os = "espidf")]
mod esp {
    use super::*;
    use crate::error::{Error, Result};
    use crate::pins;
    use esp_idf_hal::delay::Ets;
    use esp_idf_hal::gpio::{AnyInputPin, AnyOutputPin, Input, Output, PinDriver, Pull};

    pub struct HardwareAdapter {
        ir_entrance: PinDriver<'static, AnyInputPin, Input>,
        ir_exit: PinDriver<'static, AnyInputPin, Input>,
        flame: PinDriver<'static, AnyInputPin, Input>,
        button: PinDriver<'static, AnyInputPin, Input>,
        servos: [PinDriver<'static, AnyOutputPin, Output>; Lane::COUNT],
        buzzer: PinDriver<'static, AnyOutputPin, Output>,
        light: PinDriver<'static, AnyOutputPin, Output>,
        barriers: [BarrierPosition; Lane::COUNT],
        buzzer_busy_until_ms: u64,
        now_ms: u64,
    }

    fn input(gpio: i32) -> Result<PinDriver<'static, AnyInputPin, Input>> {
        // SAFETY: each GPIO number appears exactly once in `pins`, so no
        // pin is claimed twice.
        let pin = unsafe { AnyInputPin::new(gpio) };
        let mut drv = PinDriver::input(pin).map_err(|_| Error::Init("gpio input"))?;
        drv.set_pull(Pull::Up).map_err(|_| Error::Init("gpio pull"))?;
        Ok(drv)
    }

    fn output(gpio: i32) -> Result<PinDriver<'static, AnyOutputPin, Output>> {
        // SAFETY: see `input`.
        let pin = unsafe { AnyOutputPin::new(gpio) };
        PinDriver::output(pin).map_err(|_| Error::Init("gpio output"))
    }

    impl HardwareAdapter {
        /// Claim every pin and drive both barriers to the closed
        /// position so the mirror starts out true.
        pub fn new() -> Result<Self> {
            let mut hw = Self {
                ir_entrance: input(pins::IR_ENTRANCE_GPIO)?,
                ir_exit: input(pins::IR_EXIT_GPIO)?,
                flame: input(pins::FLAME_GPIO)?,
                button: input(pins::BUTTON_GPIO)?,
                servos: [
                    output(pins::SERVO_ENTRANCE_GPIO)?,
                    output(pins::SERVO_EXIT_GPIO)?,
                ],
                buzzer: output(pins::BUZZER_GPIO)?,
                light: output(pins::LIGHT_GPIO)?,
                barriers: [BarrierPosition::Closed; Lane::COUNT],
                buzzer_busy_until_ms: 0,
                now_ms: 0,
            };
            // Force both arms down regardless of where they were left.
            for lane in Lane::ALL {
                hw.send_move(lane, BarrierPosition::Closed);
            }
            Ok(hw)
        }

        /// Housekeeping once per control cycle: track time and drop the
        /// buzzer line when its pulse has elapsed.
        pub fn poll(&mut self, now_ms: u64) {
            self.now_ms = now_ms;
            if now_ms >= self.buzzer_busy_until_ms && self.buzzer.is_set_high() {
                let _ = self.buzzer.set_low();
            }
        }

        fn send_move(&mut self, lane: Lane, position: BarrierPosition) {
            let width = servo::pulse_width_us(servo::angle_for(position));
            let pin = &mut self.servos[lane.index()];
            for _ in 0..servo::PULSES_PER_MOVE {
                let _ = pin.set_high();
                Ets::delay_us(width);
                let _ = pin.set_low();
                Ets::delay_us(servo::SERVO_PERIOD_US - width);
            }
            self.barriers[lane.index()] = position;
        }
    }

    impl SensorPort for HardwareAdapter {
        fn read_inputs(&mut self) -> RawInputs {
            // All four lines are active low.
            RawInputs {
                car_at_entrance: self.ir_entrance.is_low(),
                car_at_exit: self.ir_exit.is_low(),
                flame: self.flame.is_low(),
                button_pressed: self.button.is_low(),
            }
        }
    }

    impl ActuatorPort for HardwareAdapter {
        fn set_barrier(&mut self, lane: Lane, position: BarrierPosition) {
            if self.barriers[lane.index()] == position {
                return; // Idempotent: already there, no pulse burst.
            }
            self.send_move(lane, position);
        }

        fn barrier_position(&self, lane: Lane) -> BarrierPosition {
            self.barriers[lane.index()]
        }

        fn pulse_buzzer(&mut self, duration_ms: u16) {
            if !self.buzzer_idle() {
                return;
            }
            let _ = self.buzzer.set_high();
            self.buzzer_busy_until_ms = self.now_ms + u64::from(duration_ms);
        }

        fn buzzer_idle(&self) -> bool {
            self.now_ms >= self.buzzer_busy_until_ms
        }

        fn set_light(&mut self, on: bool) {
            let _ = if on {
                self.light.set_high()
            } else {
                self.light.set_low()
            };
        }
    }
}

#[cfg(target_os = "espidf")]
pub use esp::HardwareAdapter;

// ───────────────────────────────────────────────────────────────
// Host simulation
// ───────────────────────────────────────────────────────────────

/// In-memory stand-in with the same port surface as the device adapter.
/// Input lines are plain fields so simulations can script scenarios.
#[cfg(not(target_os = "espidf"))]
pub struct HardwareAdapter {
    /// Scripted sensor lines, returned verbatim by `read_inputs`.
    pub inputs: RawInputs,
    barriers: [BarrierPosition; Lane::COUNT],
    light_on: bool,
    buzzer_busy_until_ms: u64,
    now_ms: u64,
}

#[cfg(not(target_os = "espidf"))]
impl HardwareAdapter {
    pub fn new() -> crate::error::Result<Self> {
        Ok(Self {
            inputs: RawInputs::default(),
            barriers: [BarrierPosition::Closed; Lane::COUNT],
            light_on: false,
            buzzer_busy_until_ms: 0,
            now_ms: 0,
        })
    }

    /// Mirror of the device adapter's per-cycle housekeeping.
    pub fn poll(&mut self, now_ms: u64) {
        self.now_ms = now_ms;
    }

    pub fn light_on(&self) -> bool {
        self.light_on
    }
}

#[cfg(not(target_os = "espidf"))]
impl SensorPort for HardwareAdapter {
    fn read_inputs(&mut self) -> RawInputs {
        self.inputs
    }
}

#[cfg(not(target_os = "espidf"))]
impl ActuatorPort for HardwareAdapter {
    fn set_barrier(&mut self, lane: Lane, position: BarrierPosition) {
        self.barriers[lane.index()] = position;
    }

    fn barrier_position(&self, lane: Lane) -> BarrierPosition {
        self.barriers[lane.index()]
    }

    fn pulse_buzzer(&mut self, duration_ms: u16) {
        if self.buzzer_idle() {
            self.buzzer_busy_until_ms = self.now_ms + u64::from(duration_ms);
        }
    }

    fn buzzer_idle(&self) -> bool {
        self.now_ms >= self.buzzer_busy_until_ms
    }

    fn set_light(&mut self, on: bool) {
        self.light_on = on;
    }
}
