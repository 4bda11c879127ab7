//! Decoded events to input events.

use alloc::vec;

use crate::hal::input::{AbsInfo, InputDeviceInfo, InputEvent, InputId, InputSink, abs, key};

use super::config::{Gt1xConfig, MtProtocol};
use super::decoder::TouchEvent;

pub const DEVICE_NAME: &str = "goodix-ts";
pub const DEVICE_PHYS: &str = "input/ts";

/// Identity and capabilities announced when the sink is registered.
pub fn device_info(config: &Gt1xConfig) -> InputDeviceInfo {
    let (max_x, max_y) = config.reported_max();
    let range = |code, max: i32| AbsInfo { code, min: 0, max };
    let mut keys = vec![key::BTN_TOUCH];
    keys.extend_from_slice(config.keys);
    InputDeviceInfo {
        name: DEVICE_NAME,
        phys: DEVICE_PHYS,
        id: InputId {
            bustype: InputId::BUS_I2C,
            vendor: 0xDEAD,
            product: 0xBEEF,
            version: 10427,
        },
        axes: vec![
            range(abs::MT_POSITION_X, max_x as i32),
            range(abs::MT_POSITION_Y, max_y as i32),
            range(abs::MT_PRESSURE, 255),
            range(abs::MT_TOUCH_MAJOR, 255),
            range(abs::MT_TRACKING_ID, 255),
        ],
        keys,
        mt_slots: match config.protocol {
            MtProtocol::TypeB => Some(config.max_touch),
            MtProtocol::TypeA => None,
        },
        direct: true,
    }
}

/// Emit one input frame for `events`. `touching` is whether any contact is
/// still down afterwards. Nothing is emitted for an empty event list.
pub fn dispatch(
    sink: &mut dyn InputSink,
    protocol: MtProtocol,
    events: &[TouchEvent],
    touching: bool,
) {
    if events.is_empty() {
        return;
    }
    match protocol {
        MtProtocol::TypeB => slotted(sink, events),
        MtProtocol::TypeA => anonymous(sink, events, touching),
    }
    sink.report(InputEvent::key(key::BTN_TOUCH, touching));
    sink.sync();
}

fn slotted(sink: &mut dyn InputSink, events: &[TouchEvent]) {
    for event in events {
        match *event {
            TouchEvent::Down { slot, x, y, size } => {
                sink.report(InputEvent::abs(abs::MT_SLOT, slot as i32));
                sink.report(InputEvent::abs(abs::MT_TRACKING_ID, slot as i32));
                contact(sink, x, y, size);
            }
            TouchEvent::Up { slot } => {
                sink.report(InputEvent::abs(abs::MT_SLOT, slot as i32));
                sink.report(InputEvent::abs(abs::MT_TRACKING_ID, -1));
            }
            TouchEvent::Key { code, pressed } => sink.report(InputEvent::key(code, pressed)),
        }
    }
}

fn anonymous(sink: &mut dyn InputSink, events: &[TouchEvent], touching: bool) {
    let mut lifted = false;
    for event in events {
        match *event {
            TouchEvent::Down { slot, x, y, size } => {
                sink.report(InputEvent::abs(abs::MT_TRACKING_ID, slot as i32));
                contact(sink, x, y, size);
                sink.report(InputEvent::mt_sync());
            }
            TouchEvent::Up { .. } => lifted = true,
            TouchEvent::Key { code, pressed } => sink.report(InputEvent::key(code, pressed)),
        }
    }
    // Type A has no per-contact release; an empty report ends the last one.
    if lifted && !touching {
        sink.report(InputEvent::mt_sync());
    }
}

fn contact(sink: &mut dyn InputSink, x: u16, y: u16, size: u8) {
    sink.report(InputEvent::abs(abs::MT_POSITION_X, x as i32));
    sink.report(InputEvent::abs(abs::MT_POSITION_Y, y as i32));
    sink.report(InputEvent::abs(abs::MT_PRESSURE, size as i32));
    sink.report(InputEvent::abs(abs::MT_TOUCH_MAJOR, size as i32));
}
