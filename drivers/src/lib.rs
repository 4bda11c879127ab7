//! Touch Controller Driver Subsystem
//!
//! This crate is layered the same way as the rest of the driver tree:
//!
//! # Module Organization
//!
//! - [`hal`]: Platform-independent trait definitions
//! - [`peripheral`]: Peripheral drivers built only on the HAL
//!
//! # Design Principles
//!
//! 1. **Separation of Concerns**: Platform code implements the HAL; drivers consume it
//! 2. **Per-Device State**: Every attached controller owns its context, no globals
//! 3. **Type Safety**: Lifecycle states and errors are enums, not integers
//! 4. **Testability**: Every collaborator is a trait, so drivers run on the host
//!
//! # Usage Example
//!
//! ```ignore
//! use touch_drivers::peripheral::gt1x::{Gt1x, Gt1xConfig, Platform};
//!
//! let config = Gt1xConfig::new(INT_GPIO, RST_GPIO).resolution(720, 1280);
//! let touch = Gt1x::attach(config, Platform::new(bus, gpio, rails, pins, irq, input, delay))?;
//! touch.suspend()?;
//! touch.resume()?;
//! touch.detach();
//! ```

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod hal;
pub mod peripheral;

// Re-export commonly used types
pub use hal::bus::RegisterBus;
pub use hal::gpio::{GpioController, PinLevel};
pub use hal::input::InputSink;
pub use hal::interrupt::InterruptController;
pub use peripheral::gt1x::{Gt1x, Gt1xConfig, TouchError};
