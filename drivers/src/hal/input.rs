//! Input event sink Hardware Abstraction Layer.
//!
//! Drivers describe their capabilities once at registration and then push
//! Linux-compatible `(type, code, value)` events. A `SYN_REPORT` closes one
//! atomic frame from the consumer's point of view.

use alloc::vec::Vec;

/// Event types.
pub mod ev {
    pub const SYN: u16 = 0x00;
    pub const KEY: u16 = 0x01;
    pub const ABS: u16 = 0x03;
}

/// Synchronisation codes.
pub mod syn {
    pub const REPORT: u16 = 0;
    pub const MT_REPORT: u16 = 2;
}

/// Absolute axis codes.
pub mod abs {
    pub const MT_SLOT: u16 = 0x2f;
    pub const MT_TOUCH_MAJOR: u16 = 0x30;
    pub const MT_POSITION_X: u16 = 0x35;
    pub const MT_POSITION_Y: u16 = 0x36;
    pub const MT_TRACKING_ID: u16 = 0x39;
    pub const MT_PRESSURE: u16 = 0x3a;
}

/// Key codes used by touch panels.
pub mod key {
    pub const BTN_TOUCH: u16 = 0x14a;
    pub const KEY_BACK: u16 = 158;
    pub const KEY_HOMEPAGE: u16 = 172;
    pub const KEY_MENU: u16 = 139;
}

/// One input event.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct InputEvent {
    pub type_: u16,
    pub code: u16,
    pub value: i32,
}

impl InputEvent {
    pub const fn new(type_: u16, code: u16, value: i32) -> Self {
        Self { type_, code, value }
    }

    pub const fn abs(code: u16, value: i32) -> Self {
        Self::new(ev::ABS, code, value)
    }

    pub const fn key(code: u16, pressed: bool) -> Self {
        Self::new(ev::KEY, code, pressed as i32)
    }

    pub const fn sync() -> Self {
        Self::new(ev::SYN, syn::REPORT, 0)
    }

    pub const fn mt_sync() -> Self {
        Self::new(ev::SYN, syn::MT_REPORT, 0)
    }
}

/// Device identification, as in Linux `struct input_id`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct InputId {
    pub bustype: u16,
    pub vendor: u16,
    pub product: u16,
    pub version: u16,
}

impl InputId {
    pub const BUS_I2C: u16 = 0x18;
}

/// Range of an absolute axis.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AbsInfo {
    pub code: u16,
    pub min: i32,
    pub max: i32,
}

/// Everything a sink needs to know to register a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputDeviceInfo {
    pub name: &'static str,
    pub phys: &'static str,
    pub id: InputId,
    pub axes: Vec<AbsInfo>,
    pub keys: Vec<u16>,
    /// Number of multi-touch slots for slot-based reporting.
    pub mt_slots: Option<u8>,
    /// Direct input device (touchscreen rather than touchpad).
    pub direct: bool,
}

impl InputDeviceInfo {
    pub fn axis(&self, code: u16) -> Option<&AbsInfo> {
        self.axes.iter().find(|a| a.code == code)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InputError {
    /// The sink refused the capability set.
    Rejected,
    /// The sink is out of resources.
    NoMemory,
}

/// Registered input device, owned by its driver.
pub trait InputSink {
    fn register(&mut self, info: &InputDeviceInfo) -> Result<(), InputError>;

    /// Unregistering a device that is not registered is a no-op.
    fn unregister(&mut self);

    fn report(&mut self, event: InputEvent);

    fn sync(&mut self) {
        self.report(InputEvent::sync());
    }
}
