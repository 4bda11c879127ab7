//! GT1x register map and report layout.

use bitflags::bitflags;

/// Command register. A command is written as `[cmd]` here after its data
/// and checksum have been written to the two following registers.
pub const REG_CMD: u16 = 0x8040;
/// Product id, four ASCII bytes.
pub const REG_PRODUCT_ID: u16 = 0x8140;
/// Start of the coordinate (touch report) area. Writing `0` here
/// acknowledges the report and lets the controller refill the buffer.
pub const REG_COOR: u16 = 0x814E;

pub const CMD_SLEEP: u8 = 0x05;

pub const PRODUCT_ID_LEN: usize = 4;

/// Bytes fetched on every interrupt: status, first contact record and
/// two further bytes.
pub const HEADER_LEN: usize = 11;
/// Size of one contact record:
/// `[track_id, x_lo, x_hi, y_lo, y_hi, size_lo, size_hi, reserved]`.
pub const RECORD_LEN: usize = 8;
/// The status byte's count field is four bits wide.
pub const MAX_CONTACTS: usize = 0x0F;
/// Header plus the extra records for a full count field.
pub const MAX_FRAME_LEN: usize = HEADER_LEN + (MAX_CONTACTS - 1) * RECORD_LEN;

/// Bus addresses a GT1x can be strapped to during reset.
pub const ADDR_14: u8 = 0x14;
pub const ADDR_5D: u8 = 0x5D;

bitflags! {
    /// First byte of every touch report.
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct ReportStatus: u8 {
        /// Payload belongs to the cooperative sharing protocol, not to touch.
        const SHARING = 0x80;
        /// Large-area (palm) contact.
        const LARGE_TOUCH = 0x40;
        /// A key byte follows the contact records.
        const KEY = 0x10;
        /// Number of contact records.
        const COUNT = 0x0F;
    }
}

impl ReportStatus {
    pub const fn from_byte(byte: u8) -> Self {
        Self::from_bits_retain(byte)
    }

    pub const fn contacts(self) -> usize {
        (self.bits() & Self::COUNT.bits()) as usize
    }

    /// No data ready at all.
    pub const fn is_idle(self) -> bool {
        self.bits() == 0
    }

    /// Minimum frame length needed to decode this status.
    pub const fn frame_len(self) -> usize {
        let key = if self.contains(Self::KEY) { 1 } else { 0 };
        1 + self.contacts() * RECORD_LEN + key
    }
}

/// Bytes to write to `REG_CMD + 1` (data and checksum) before `cmd` itself
/// goes to `REG_CMD`.
pub const fn command_tail(cmd: u8, data: u8) -> [u8; 2] {
    [data, 0u8.wrapping_sub(cmd).wrapping_sub(data)]
}
