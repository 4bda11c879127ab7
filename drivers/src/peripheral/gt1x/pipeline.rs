//! Two-phase interrupt handling.
//!
//! The claim phase ([`Gt1x::handle_irq`]) runs in interrupt context: it only
//! masks the line through the gate and asks for the worker. The processing
//! phase ([`Gt1x::irq_thread`]) runs on the worker, reads the report, hands
//! it to features or the decoder, acknowledges it, and always ends by
//! completing the gate.
//!
//! Platforms that do not have threaded interrupts can call
//! [`Gt1x::on_interrupt`] from the handler and [`Gt1x::run_pending`] from
//! their worker; the two meet in an [`IrqWork`] mailbox.

use core::sync::atomic::{AtomicBool, Ordering};

use log::{debug, error, trace, warn};

use super::decoder::TouchEvent;
use super::device::{Gt1x, TouchPath};
use super::error::TouchError;
use super::features::{Claim, FeatureContext, FeatureKind, FeatureSet};
use super::gate::ClaimGuard;
use super::power::Hardware;
use super::regs::{HEADER_LEN, MAX_FRAME_LEN, RECORD_LEN, ReportStatus};
use super::report;

/// Result of the claim phase.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum IrqReturn {
    /// Line already masked; the interrupt is discarded.
    Handled,
    /// Accepted; the processing phase must run.
    WakeThread,
}

/// Single-slot mailbox between the claim phase and the worker.
#[derive(Debug, Default)]
pub struct IrqWork {
    pending: AtomicBool,
}

impl IrqWork {
    pub const fn new() -> Self {
        Self {
            pending: AtomicBool::new(false),
        }
    }

    /// Returns `false` if work was already pending.
    pub fn post(&self) -> bool {
        !self.pending.swap(true, Ordering::AcqRel)
    }

    /// Take the pending work, if any.
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }
}

/// Wakes the platform worker that will call [`Gt1x::run_pending`].
pub trait Notify {
    fn notify(&self);
}

/// What the processing phase decided about the acknowledgement.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Ack {
    Send,
    Skip,
}

impl From<Claim> for Ack {
    fn from(claim: Claim) -> Self {
        match claim {
            Claim::ClaimedWithError => Ack::Skip,
            _ => Ack::Send,
        }
    }
}

/// Split the locked state into a feature context and the feature set.
pub(super) fn context<'a>(
    hw: &'a mut Hardware,
    touch: &'a mut TouchPath,
) -> (FeatureContext<'a>, &'a mut FeatureSet) {
    (
        FeatureContext {
            bus: hw.bus(),
            input: &mut *touch.input,
        },
        &mut touch.features,
    )
}

impl Gt1x {
    /// Claim phase. Never blocks and performs no I/O.
    pub fn handle_irq(&self) -> IrqReturn {
        if self.gate.try_claim() {
            IrqReturn::WakeThread
        } else {
            trace!("gt1x: interrupt while masked, discarded");
            IrqReturn::Handled
        }
    }

    /// Claim phase plus handoff: post the work and wake the worker.
    pub fn on_interrupt(&self) -> IrqReturn {
        let ret = self.handle_irq();
        if ret == IrqReturn::WakeThread {
            self.work.post();
            if let Some(notify) = &self.notify {
                notify.notify();
            }
        }
        ret
    }

    /// Worker side of [`on_interrupt`](Self::on_interrupt). Returns whether
    /// any work was pending.
    pub fn run_pending(&self) -> bool {
        if !self.work.take() {
            return false;
        }
        self.irq_thread();
        true
    }

    /// Processing phase for an interrupt accepted by
    /// [`handle_irq`](Self::handle_irq).
    pub fn irq_thread(&self) {
        let _claim = ClaimGuard(&self.gate);

        if self.flags.update_in_progress() {
            debug!("gt1x: firmware update in progress, report dropped");
            return;
        }

        let mut hw = self.hw.lock();
        let mut touch = self.touch.lock();
        let ack = self.process(&mut hw, &mut touch);
        trace!("gt1x: report processed, ack {:?}", ack);

        if ack == Ack::Send && !self.flags.rawdiff_mode() {
            if let Err(e) = hw.ack() {
                warn!("gt1x: report ack failed: {}", e);
            }
        }
    }

    fn process(&self, hw: &mut Hardware, touch: &mut TouchPath) -> Ack {
        // Gesture features run even while halted; that is how wake works.
        let claim = {
            let (mut ctx, features) = context(hw, touch);
            features.claim_interrupt(&mut ctx)
        };
        if claim.is_claimed() {
            return claim.into();
        }

        if self.flags.halted() {
            debug!("gt1x: halted, report dropped");
            return Ack::Skip;
        }

        let mut frame = [0u8; MAX_FRAME_LEN];
        if let Err(e) = hw.read_report(0, &mut frame[..HEADER_LEN]) {
            return self.read_failed(hw, "report header", e);
        }

        let status = ReportStatus::from_byte(frame[0]);
        if status.is_idle() {
            let (mut ctx, features) = context(hw, touch);
            features.request(&mut ctx);
            let events = touch.decoder.release_all();
            self.deliver(touch, &events);
            return Ack::Skip;
        }

        let sharing = status.contains(ReportStatus::SHARING);
        for kind in [FeatureKind::Sharing, FeatureKind::Proximity] {
            if kind == FeatureKind::Sharing && !sharing {
                continue;
            }
            let claim = {
                let (mut ctx, features) = context(hw, touch);
                features.offer_report(kind, &mut ctx, &frame[..HEADER_LEN])
            };
            if claim.is_claimed() {
                return claim.into();
            }
        }

        // A count beyond max_touch is left to the decoder to reject.
        let contacts = status.contacts();
        let mut len = HEADER_LEN;
        if !sharing && contacts > 1 && contacts <= self.config().max_touch as usize {
            let extra = (contacts - 1) * RECORD_LEN;
            if let Err(e) = hw.read_report(HEADER_LEN as u16, &mut frame[len..len + extra]) {
                return self.read_failed(hw, "contact records", e);
            }
            len += extra;
        }

        match touch.decoder.decode(&frame[..len]) {
            Ok(events) => {
                self.deliver(touch, &events);
                Ack::Send
            }
            Err(e) if e.is_recoverable() => {
                warn!("gt1x: {}", e);
                Ack::Send
            }
            Err(e) => {
                error!("gt1x: decode failed: {}", e);
                Ack::Skip
            }
        }
    }

    /// A report read failed. The chip is power-cycled unless an external
    /// ESD watchdog owns recovery; the report is never acknowledged.
    fn read_failed(&self, hw: &mut Hardware, what: &str, e: TouchError) -> Ack {
        error!("gt1x: {} read failed: {}", what, e);
        if !self.flags.esd_protect() {
            if let Err(e) = hw.recover() {
                error!("gt1x: recovery failed: {}", e);
            }
        }
        Ack::Skip
    }

    pub(super) fn deliver(&self, touch: &mut TouchPath, events: &[TouchEvent]) {
        let touching = touch.decoder.held() > 0;
        report::dispatch(&mut *touch.input, touch.protocol, events, touching);
    }
}
