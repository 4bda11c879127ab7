//! Error taxonomy for the GT1x core.

use core::fmt;

use crate::hal::bus::BusError;

use super::device::DeviceLifecycleState;

/// Hardware resource involved in a failed acquisition or transition.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ResourceStep {
    PinMux,
    InterruptGpio,
    ResetGpio,
    PowerGpio,
    PowerIoGpio,
    AnalogRail,
    BusRail,
    InputDevice,
    InterruptLine,
}

impl fmt::Display for ResourceStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceStep::PinMux => "pin-mux",
            ResourceStep::InterruptGpio => "interrupt gpio",
            ResourceStep::ResetGpio => "reset gpio",
            ResourceStep::PowerGpio => "power gpio",
            ResourceStep::PowerIoGpio => "power-io gpio",
            ResourceStep::AnalogRail => "analog rail",
            ResourceStep::BusRail => "bus rail",
            ResourceStep::InputDevice => "input device",
            ResourceStep::InterruptLine => "interrupt line",
        };
        f.write_str(name)
    }
}

/// Touch controller errors.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TouchError {
    /// A GPIO, rail, pin-mux state, input device or interrupt line could not
    /// be acquired or switched. Fatal during attach.
    ResourceUnavailable(ResourceStep),
    /// Reset and verification failed on both attempts.
    DeviceUnresponsive,
    /// A single bus transfer failed.
    Transport(BusError),
    /// The report did not match its own status byte.
    ProtocolAnomaly(u8),
    InvalidConfig(&'static str),
    /// Operation not allowed in the current lifecycle state.
    InvalidState(DeviceLifecycleState),
    /// A firmware update owns the device.
    Busy,
}

impl TouchError {
    /// Errors the processing phase recovers from locally.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, TouchError::Transport(_) | TouchError::ProtocolAnomaly(_))
    }
}

impl fmt::Display for TouchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TouchError::ResourceUnavailable(step) => write!(f, "{} unavailable", step),
            TouchError::DeviceUnresponsive => f.write_str("device not responding after reset"),
            TouchError::Transport(e) => write!(f, "bus transfer failed: {:?}", e),
            TouchError::ProtocolAnomaly(status) => {
                write!(f, "malformed report (status {:#04x})", status)
            }
            TouchError::InvalidConfig(why) => write!(f, "invalid configuration: {}", why),
            TouchError::InvalidState(state) => write!(f, "not allowed while {:?}", state),
            TouchError::Busy => f.write_str("firmware update in progress"),
        }
    }
}

impl From<BusError> for TouchError {
    fn from(e: BusError) -> Self {
        TouchError::Transport(e)
    }
}
