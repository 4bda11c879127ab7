//! Interrupt Controller Hardware Abstraction Layer.
//!
//! This module defines platform-independent traits for interrupt management.

/// Interrupt number type.
pub type IrqNumber = u32;

/// Interrupt trigger mode.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TriggerMode {
    /// Interrupt triggers on a rising edge.
    RisingEdge,
    /// Interrupt triggers on a falling edge.
    FallingEdge,
    /// Interrupt is active when the signal is low.
    LevelLow,
    /// Interrupt is active when the signal is high.
    LevelHigh,
}

impl TriggerMode {
    /// Decode the `int-type` value found in touch controller configuration
    /// blobs: 0 rising, 1 falling, 2 low, 3 high.
    pub const fn from_config(value: u8) -> Option<Self> {
        match value {
            0 => Some(TriggerMode::RisingEdge),
            1 => Some(TriggerMode::FallingEdge),
            2 => Some(TriggerMode::LevelLow),
            3 => Some(TriggerMode::LevelHigh),
            _ => None,
        }
    }
}

/// Interrupt controller errors.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum IrqError {
    /// No such interrupt line.
    InvalidIrq,
    /// The line already has a handler.
    Busy,
}

/// Interrupt controller trait.
///
/// `request` only reserves the line and routes it to the caller; the line is
/// left masked until the first `enable`.
pub trait InterruptController {
    /// Reserve `irq` with the given trigger. `name` identifies the owner.
    fn request(
        &mut self,
        irq: IrqNumber,
        trigger: TriggerMode,
        name: &'static str,
    ) -> Result<(), IrqError>;

    /// Release a line reserved with `request`. No-op if not reserved.
    fn free(&mut self, irq: IrqNumber);

    /// Enable (unmask) an interrupt line.
    fn enable(&mut self, irq: IrqNumber) -> Result<(), IrqError>;

    /// Disable (mask) an interrupt line without waiting for handlers.
    fn disable(&mut self, irq: IrqNumber) -> Result<(), IrqError>;
}
