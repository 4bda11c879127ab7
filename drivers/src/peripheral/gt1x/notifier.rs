//! Display blank/unblank notifications.
//!
//! Panel notifiers fire twice per transition. Touch must stop before the
//! panel powers down and may only start once it is back up, so power-down
//! acts on the early phase and unblank on the late one.

use log::trace;

use super::device::Gt1x;
use super::error::TouchError;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BlankEvent {
    PowerDown,
    Unblank,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NotifyPhase {
    Early,
    Late,
}

impl Gt1x {
    /// Map a blank notification to [`suspend`](Self::suspend) or
    /// [`resume`](Self::resume). Repeats are absorbed by their idempotence.
    pub fn on_blank_event(&self, phase: NotifyPhase, event: BlankEvent) -> Result<(), TouchError> {
        match (phase, event) {
            (NotifyPhase::Early, BlankEvent::PowerDown) => self.suspend(),
            (NotifyPhase::Late, BlankEvent::Unblank) => self.resume(),
            _ => {
                trace!("gt1x: {:?} {:?} ignored", phase, event);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peripheral::gt1x::device::DeviceLifecycleState;
    use crate::peripheral::gt1x::mock::{Op, Rig, attached};
    use crate::peripheral::gt1x::regs::{CMD_SLEEP, REG_CMD};

    #[test]
    fn phases_select_the_transition() {
        let rig = Rig::new();
        let dev = attached(&rig);

        dev.on_blank_event(NotifyPhase::Late, BlankEvent::PowerDown).unwrap();
        assert_eq!(dev.state(), DeviceLifecycleState::Running);
        dev.on_blank_event(NotifyPhase::Early, BlankEvent::PowerDown).unwrap();
        assert_eq!(dev.state(), DeviceLifecycleState::Suspended);

        dev.on_blank_event(NotifyPhase::Early, BlankEvent::Unblank).unwrap();
        assert_eq!(dev.state(), DeviceLifecycleState::Suspended);
        dev.on_blank_event(NotifyPhase::Late, BlankEvent::Unblank).unwrap();
        assert_eq!(dev.state(), DeviceLifecycleState::Running);
    }

    #[test]
    fn duplicate_notifications_are_absorbed() {
        let rig = Rig::new();
        let dev = attached(&rig);
        for _ in 0..3 {
            dev.on_blank_event(NotifyPhase::Early, BlankEvent::PowerDown).unwrap();
        }
        assert_eq!(rig.log.count(&Op::BusWrite(REG_CMD, vec![CMD_SLEEP])), 1);

        for _ in 0..3 {
            dev.on_blank_event(NotifyPhase::Late, BlankEvent::Unblank).unwrap();
        }
        assert_eq!(dev.state(), DeviceLifecycleState::Running);
        assert!(dev.irq_enabled());
    }
}
