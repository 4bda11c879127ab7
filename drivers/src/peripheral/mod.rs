//! Peripheral Drivers
//!
//! Drivers for chips that sit behind a bus rather than on the SoC. They are
//! written against [`crate::hal`] only.
//!
//! # Available Peripherals
//!
//! - [`gt1x`]: Goodix GT1x capacitive touchscreen controller

pub mod gt1x;
