//! Touch report decoding.
//!
//! A frame is the status byte, `count` contact records and an optional key
//! byte (see [`super::regs`]). The decoder keeps the slot table between
//! frames so it can turn "contact no longer present" into a touch-up.

use alloc::vec::Vec;

use log::trace;

use super::config::{Gt1xConfig, MAX_KEYS, MAX_TOUCH_LIMIT};
use super::error::TouchError;
use super::regs::{RECORD_LEN, ReportStatus};

/// A contact currently down.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TouchSlot {
    pub track_id: u8,
    pub x: u16,
    pub y: u16,
    pub size: u8,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TouchEvent {
    Down { slot: u8, x: u16, y: u16, size: u8 },
    Up { slot: u8 },
    Key { code: u16, pressed: bool },
}

pub struct TouchDecoder {
    max_touch: u8,
    swap_xy: bool,
    max_x: u16,
    max_y: u16,
    keys: &'static [u16],
    slots: [Option<TouchSlot>; MAX_TOUCH_LIMIT as usize],
    key_state: u8,
}

impl TouchDecoder {
    pub fn new(config: &Gt1xConfig) -> Self {
        let (max_x, max_y) = config.reported_max();
        let keys: &'static [u16] = config.keys;
        Self {
            max_touch: config.max_touch.min(MAX_TOUCH_LIMIT),
            swap_xy: config.swap_xy,
            max_x,
            max_y,
            keys: &keys[..keys.len().min(MAX_KEYS)],
            slots: [None; MAX_TOUCH_LIMIT as usize],
            key_state: 0,
        }
    }

    pub fn slot(&self, id: u8) -> Option<TouchSlot> {
        self.slots.get(id as usize).copied().flatten()
    }

    /// Number of contacts currently down.
    pub fn held(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Decode one frame into events, slot-ascending, key changes last.
    ///
    /// A frame carrying sharing data yields nothing and leaves the slot
    /// table alone. So does a frame claiming more contacts than `max_touch`
    /// or too short for its own status byte, which is reported as
    /// [`TouchError::ProtocolAnomaly`].
    pub fn decode(&mut self, frame: &[u8]) -> Result<Vec<TouchEvent>, TouchError> {
        let Some(&first) = frame.first() else {
            return Err(TouchError::ProtocolAnomaly(0));
        };
        let status = ReportStatus::from_byte(first);
        if status.contains(ReportStatus::SHARING) {
            return Ok(Vec::new());
        }
        if status.contacts() > self.max_touch as usize || frame.len() < status.frame_len() {
            return Err(TouchError::ProtocolAnomaly(first));
        }

        let count = status.contacts();
        let mut next = [None; MAX_TOUCH_LIMIT as usize];
        let mut seen = 0u16;
        for record in frame[1..1 + count * RECORD_LEN].chunks_exact(RECORD_LEN) {
            let id = record[0];
            if id >= self.max_touch {
                trace!("gt1x: track id {} beyond max_touch, dropped", id);
                continue;
            }
            if seen & (1 << id) != 0 {
                trace!("gt1x: track id {} repeated, dropped", id);
                continue;
            }
            seen |= 1 << id;
            next[id as usize] = Some(self.contact(id, record));
        }

        let mut events = Vec::new();
        for id in 0..self.max_touch {
            match (self.slots[id as usize], next[id as usize]) {
                (_, Some(s)) => events.push(TouchEvent::Down {
                    slot: id,
                    x: s.x,
                    y: s.y,
                    size: s.size,
                }),
                (Some(_), None) => events.push(TouchEvent::Up { slot: id }),
                (None, None) => {}
            }
        }
        self.slots = next;

        let keys = if status.contains(ReportStatus::KEY) {
            frame[1 + count * RECORD_LEN]
        } else {
            0
        };
        self.update_keys(keys, &mut events);
        Ok(events)
    }

    fn contact(&self, id: u8, record: &[u8]) -> TouchSlot {
        let mut x = u16::from_le_bytes([record[1], record[2]]);
        let mut y = u16::from_le_bytes([record[3], record[4]]);
        let size = u16::from_le_bytes([record[5], record[6]]);
        if self.swap_xy {
            core::mem::swap(&mut x, &mut y);
        }
        TouchSlot {
            track_id: id,
            x: x.min(self.max_x),
            y: y.min(self.max_y),
            size: size.min(u8::MAX as u16) as u8,
        }
    }

    fn update_keys(&mut self, keys: u8, events: &mut Vec<TouchEvent>) {
        let changed = keys ^ self.key_state;
        for (bit, &code) in self.keys.iter().enumerate() {
            if changed & (1 << bit) != 0 {
                events.push(TouchEvent::Key {
                    code,
                    pressed: keys & (1 << bit) != 0,
                });
            }
        }
        self.key_state = keys;
    }

    /// Lift every held contact and key.
    pub fn release_all(&mut self) -> Vec<TouchEvent> {
        let mut events = Vec::new();
        for (id, slot) in self.slots.iter_mut().enumerate() {
            if slot.take().is_some() {
                events.push(TouchEvent::Up { slot: id as u8 });
            }
        }
        self.update_keys(0, &mut events);
        events
    }
}
