//! GPIO (General Purpose Input/Output) Hardware Abstraction Layer.
//!
//! Lines are identified by their global number and must be requested before
//! use, the way a consumer driver borrows them from the platform's GPIO
//! subsystem.

use super::interrupt::IrqNumber;

/// Global GPIO line number.
pub type GpioNum = u32;

/// Pin logic level.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PinLevel {
    /// Logic low (0V or ground).
    Low,
    /// Logic high (VDD).
    High,
}

/// GPIO errors.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GpioError {
    /// The line number does not exist on this platform.
    InvalidPin,
    /// The line is already owned by another consumer.
    Busy,
    /// The line cannot be routed to an interrupt.
    NoIrq,
    /// Controller access failed.
    Io,
}

/// GPIO controller trait.
///
/// Every method other than [`request`](GpioController::request) assumes
/// the caller owns the line.
pub trait GpioController {
    /// Claim exclusive use of a line. `label` is shown in platform debug
    /// output.
    fn request(&mut self, pin: GpioNum, label: &'static str) -> Result<(), GpioError>;

    /// Give a line back. Freeing a line that is not held is a no-op.
    fn free(&mut self, pin: GpioNum);

    /// Configure a line as input.
    fn set_input(&mut self, pin: GpioNum) -> Result<(), GpioError>;

    /// Configure a line as output, driving `level` immediately.
    fn set_output(&mut self, pin: GpioNum, level: PinLevel) -> Result<(), GpioError>;

    /// Drive an output line.
    fn set_level(&mut self, pin: GpioNum, level: PinLevel) -> Result<(), GpioError>;

    /// Interrupt number this line raises when used as an interrupt input.
    fn to_irq(&self, pin: GpioNum) -> Result<IrqNumber, GpioError>;
}
