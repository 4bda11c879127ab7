//! Register bus Hardware Abstraction Layer.
//!
//! Touch controllers and similar peripherals sit behind a narrow bus (I²C or
//! SPI) and expose a flat 16-bit register space. Timeouts and retries at the
//! transfer level belong to the bus implementation.

/// Bus transfer errors.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BusError {
    /// The device did not acknowledge its address or a data byte.
    Nack,
    /// The transfer did not complete in time.
    Timeout,
    /// Another master took the bus.
    ArbitrationLost,
    /// Any other controller failure.
    Other,
}

/// Register-addressed transport.
pub trait RegisterBus {
    /// Read `buf.len()` bytes starting at register `reg`.
    fn read(&mut self, reg: u16, buf: &mut [u8]) -> Result<(), BusError>;

    /// Write `data` starting at register `reg`.
    fn write(&mut self, reg: u16, data: &[u8]) -> Result<(), BusError>;
}
