//! Goodix GT1x touchscreen controller.
//!
//! # Components
//!
//! - [`gate`]: interrupt line enable/disable shared by the interrupt and
//!   control paths
//! - [`resources`]: GPIO, rail and pin-mux acquisition with rollback
//! - [`power`]: power, reset, sleep and wake sequencing
//! - [`pipeline`]: claim phase and processing phase of the interrupt
//! - [`decoder`] and [`report`]: raw reports to multi-touch input events
//! - [`device`] and [`notifier`]: the per-device context and its lifecycle
//!
//! # Usage
//!
//! ```ignore
//! let config = Gt1xConfig::new(INT_GPIO, RST_GPIO).resolution(720, 1280);
//! let platform = Platform::new(bus, gpio, regulators, pinctrl, irq, input, delay);
//! let touch = Gt1x::attach(config, platform)?;
//!
//! // interrupt handler
//! if touch.handle_irq() == IrqReturn::WakeThread { /* wake worker */ }
//! // worker
//! touch.irq_thread();
//! ```

pub mod config;
pub mod decoder;
pub mod device;
pub mod error;
pub mod features;
pub mod gate;
pub mod notifier;
pub mod pipeline;
pub mod power;
pub mod regs;
pub mod report;
pub mod resources;

#[cfg(test)]
pub(crate) mod mock;

pub use config::{Gt1xConfig, MtProtocol, PinStateNames, PowerTiming};
pub use decoder::{TouchDecoder, TouchEvent, TouchSlot};
pub use device::{DeviceLifecycleState, Gt1x, Platform, RuntimeFlags};
pub use error::{ResourceStep, TouchError};
pub use features::{Claim, FeatureContext, FeatureHandler, FeatureKind, FeatureSet};
pub use notifier::{BlankEvent, NotifyPhase};
pub use pipeline::{IrqReturn, IrqWork, Notify};
pub use power::{PowerState, ProductId};
