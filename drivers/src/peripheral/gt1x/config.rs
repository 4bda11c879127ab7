//! Board description for one GT1x instance.
//!
//! This is what the platform's device-tree (or board file) parsing hands the
//! driver. Values are plain data; [`Gt1xConfig::validate`] is the only check.

use crate::hal::gpio::GpioNum;
use crate::hal::interrupt::TriggerMode;

use super::error::TouchError;
use super::regs::{ADDR_14, ADDR_5D};

/// Upper bound for `max_touch`; slot bookkeeping uses a 16-bit mask.
pub const MAX_TOUCH_LIMIT: u8 = 16;
/// The key byte of a report has one bit per key.
pub const MAX_KEYS: usize = 8;

/// Multi-touch reporting protocol of the input sink.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MtProtocol {
    /// Anonymous contacts separated by `SYN_MT_REPORT`.
    TypeA,
    /// Slot-based reporting with tracking ids.
    TypeB,
}

/// Names of the four pin-mux states in the platform description.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PinStateNames {
    pub wakeup: &'static str,
    pub normal: &'static str,
    pub poweroff: &'static str,
    pub sleep: &'static str,
}

impl PinStateNames {
    pub const fn new() -> Self {
        Self {
            wakeup: "pmx_ts_wakeup",
            normal: "pmx_ts_normal",
            poweroff: "pmx_ts_poweroff",
            sleep: "pmx_ts_sleep",
        }
    }
}

impl Default for PinStateNames {
    fn default() -> Self {
        Self::new()
    }
}

/// Power sequencing delays, in milliseconds.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PowerTiming {
    /// Wait after switching rails before talking to the chip.
    pub settle_ms: u32,
    /// Reset held low while INT selects the bus address.
    pub reset_select_ms: u32,
    /// Wait after releasing reset.
    pub reset_release_ms: u32,
    /// INT held low after reset so the firmware latches the address.
    pub int_sync_ms: u32,
    /// Gap between product-id probes.
    pub verify_interval_ms: u32,
    /// INT high pulse that wakes the chip from sleep.
    pub wake_pulse_ms: u32,
}

impl PowerTiming {
    pub const fn new() -> Self {
        Self {
            settle_ms: 10,
            reset_select_ms: 2,
            reset_release_ms: 6,
            int_sync_ms: 50,
            verify_interval_ms: 10,
            wake_pulse_ms: 5,
        }
    }
}

impl Default for PowerTiming {
    fn default() -> Self {
        Self::new()
    }
}

/// GT1x board configuration.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Gt1xConfig {
    /// Interrupt line. Mandatory.
    pub int_gpio: Option<GpioNum>,
    /// Reset line. Mandatory.
    pub rst_gpio: Option<GpioNum>,
    /// Primary power enable line, if the board has one.
    pub pwr_gpio: Option<GpioNum>,
    /// Secondary (I/O) power enable line, if the board has one.
    pub pwr_io_gpio: Option<GpioNum>,
    /// Analog supply name.
    pub vdd_ana: &'static str,
    /// Bus I/O supply name.
    pub vcc_i2c: &'static str,
    pub pin_states: PinStateNames,
    /// 7-bit bus address; selects the INT level during reset.
    pub bus_addr: u8,
    pub trigger: TriggerMode,
    /// Panel resolution before any axis swap.
    pub abs_x_max: u16,
    pub abs_y_max: u16,
    pub swap_xy: bool,
    pub max_touch: u8,
    pub protocol: MtProtocol,
    /// Key codes for bits 0.. of the report's key byte.
    pub keys: &'static [u16],
    pub timing: PowerTiming,
    /// Product-id reads per reset before giving up.
    pub verify_attempts: u8,
}

impl Gt1xConfig {
    /// Minimal configuration: the two mandatory lines and defaults for
    /// everything else (1080x1920 panel, 10 contacts, type B, address 0x5D).
    pub const fn new(int_gpio: GpioNum, rst_gpio: GpioNum) -> Self {
        Self {
            int_gpio: Some(int_gpio),
            rst_gpio: Some(rst_gpio),
            pwr_gpio: None,
            pwr_io_gpio: None,
            vdd_ana: "vdd_ana",
            vcc_i2c: "vcc_i2c",
            pin_states: PinStateNames::new(),
            bus_addr: ADDR_5D,
            trigger: TriggerMode::FallingEdge,
            abs_x_max: 1080,
            abs_y_max: 1920,
            swap_xy: false,
            max_touch: 10,
            protocol: MtProtocol::TypeB,
            keys: &[],
            timing: PowerTiming::new(),
            verify_attempts: 3,
        }
    }

    pub fn power_gpios(mut self, pwr: GpioNum, pwr_io: GpioNum) -> Self {
        self.pwr_gpio = Some(pwr);
        self.pwr_io_gpio = Some(pwr_io);
        self
    }

    pub fn resolution(mut self, x_max: u16, y_max: u16) -> Self {
        self.abs_x_max = x_max;
        self.abs_y_max = y_max;
        self
    }

    pub fn swap_xy(mut self, swap: bool) -> Self {
        self.swap_xy = swap;
        self
    }

    pub fn max_touch(mut self, max_touch: u8) -> Self {
        self.max_touch = max_touch;
        self
    }

    pub fn protocol(mut self, protocol: MtProtocol) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn keys(mut self, keys: &'static [u16]) -> Self {
        self.keys = keys;
        self
    }

    pub fn bus_addr(mut self, addr: u8) -> Self {
        self.bus_addr = addr;
        self
    }

    pub fn trigger(mut self, trigger: TriggerMode) -> Self {
        self.trigger = trigger;
        self
    }

    pub fn timing(mut self, timing: PowerTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Axis maxima as reported to the input sink, after any swap.
    pub const fn reported_max(&self) -> (u16, u16) {
        if self.swap_xy {
            (self.abs_y_max, self.abs_x_max)
        } else {
            (self.abs_x_max, self.abs_y_max)
        }
    }

    pub fn validate(&self) -> Result<(), TouchError> {
        if self.int_gpio.is_none() || self.rst_gpio.is_none() {
            return Err(TouchError::InvalidConfig("interrupt and reset lines are required"));
        }
        if self.max_touch == 0 || self.max_touch > MAX_TOUCH_LIMIT {
            return Err(TouchError::InvalidConfig("max_touch out of range"));
        }
        if self.abs_x_max == 0 || self.abs_y_max == 0 {
            return Err(TouchError::InvalidConfig("panel resolution must be non-zero"));
        }
        if self.keys.len() > MAX_KEYS {
            return Err(TouchError::InvalidConfig("at most eight keys"));
        }
        if self.bus_addr != ADDR_14 && self.bus_addr != ADDR_5D {
            return Err(TouchError::InvalidConfig("bus address must be 0x14 or 0x5d"));
        }
        if self.verify_attempts == 0 {
            return Err(TouchError::InvalidConfig("verify_attempts must be non-zero"));
        }
        Ok(())
    }
}
