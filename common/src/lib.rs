//! Architecture-neutral support code shared by the driver crates.
//!
//! - [`arch`]: per-target local interrupt masking ([`arch::LocalIrq`])
//! - [`sync`]: locking primitives usable from interrupt context

#![cfg_attr(not(test), no_std)]

pub mod arch;
pub mod sync;
