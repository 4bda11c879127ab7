//! Hardware Abstraction Layer (HAL) - Platform-Independent Traits
//!
//! Everything a peripheral driver consumes from the platform is described
//! here as a trait. Platforms implement them; drivers in
//! [`crate::peripheral`] only ever see the traits.
//!
//! # Available Interfaces
//!
//! - [`bus`]: register-addressed transport (I²C/SPI)
//! - [`gpio`]: General Purpose Input/Output control
//! - [`input`]: input event sink
//! - [`interrupt`]: Interrupt controller management
//! - [`pinctrl`]: pin multiplexing states
//! - [`regulator`]: power rails
//! - [`timer`]: delays

pub mod bus;
pub mod gpio;
pub mod input;
pub mod interrupt;
pub mod pinctrl;
pub mod regulator;
pub mod timer;
