//! Hardware-free driver logic: debouncing, press classification, beep
//! sequencing, and servo pulse math. Everything here runs identically on
//! the host and the target; GPIO access lives in `adapters`.

pub mod button;
pub mod buzzer;
pub mod inputs;
pub mod servo;
