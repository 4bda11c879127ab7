//! Interrupt gate: the enabled/disabled state of the touch interrupt line.
//!
//! Two parties mask the line. The claim phase masks it without waiting when
//! it accepts an interrupt, and the processing phase unmasks it when done.
//! The control path (suspend, resume, detach) masks it with
//! [`InterruptGate::disable`], which also waits for a processing phase that
//! is already running. The physical line is touched only when the logical bit
//! changes, so neither side can mask or unmask it twice.

use alloc::boxed::Box;
use core::sync::atomic::{AtomicBool, Ordering};

use common::arch::LocalIrq;
use common::sync::IrqSpinLock;
use log::{debug, error};

use crate::hal::interrupt::{InterruptController, IrqNumber, TriggerMode};

use super::error::{ResourceStep, TouchError};

struct Line {
    controller: Box<dyn InterruptController + Send>,
    irq: Option<IrqNumber>,
    enabled: bool,
    /// Disabled by the control path; the processing phase must not unmask.
    quiesced: bool,
}

impl Line {
    fn mask(&mut self) {
        self.enabled = false;
        if let Some(irq) = self.irq {
            if let Err(e) = self.controller.disable(irq) {
                error!("gt1x: masking irq {} failed: {:?}", irq, e);
            }
        }
    }

    fn unmask(&mut self) {
        self.enabled = true;
        if let Some(irq) = self.irq {
            if let Err(e) = self.controller.enable(irq) {
                error!("gt1x: unmasking irq {} failed: {:?}", irq, e);
            }
        }
    }
}

pub struct InterruptGate {
    line: IrqSpinLock<Line, LocalIrq>,
    /// A claim was accepted and its processing phase has not completed.
    in_flight: AtomicBool,
}

impl InterruptGate {
    /// Gate with no line attached yet; starts disabled and quiesced.
    pub fn new(controller: Box<dyn InterruptController + Send>) -> Self {
        Self {
            line: IrqSpinLock::new(Line {
                controller,
                irq: None,
                enabled: false,
                quiesced: true,
            }),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Reserve the interrupt line. It stays masked until [`enable`](Self::enable).
    pub fn request(
        &self,
        irq: IrqNumber,
        trigger: TriggerMode,
        name: &'static str,
    ) -> Result<(), TouchError> {
        let mut line = self.line.lock();
        if line.irq.is_some() {
            return Ok(());
        }
        line.controller.request(irq, trigger, name).map_err(|e| {
            error!("gt1x: request irq {} failed: {:?}", irq, e);
            TouchError::ResourceUnavailable(ResourceStep::InterruptLine)
        })?;
        line.irq = Some(irq);
        line.enabled = true;
        line.mask();
        debug!("gt1x: irq {} registered ({:?})", irq, trigger);
        Ok(())
    }

    /// Disable, wait for processing, then give the line back. Idempotent.
    pub fn release(&self) {
        self.disable();
        let mut line = self.line.lock();
        if let Some(irq) = line.irq.take() {
            line.controller.free(irq);
            debug!("gt1x: irq {} released", irq);
        }
    }

    /// Unmask the line on behalf of the control path. No-op when already
    /// enabled; deferred to the processing phase when one is running.
    pub fn enable(&self) {
        let mut line = self.line.lock();
        line.quiesced = false;
        if !line.enabled && !self.in_flight.load(Ordering::Acquire) {
            line.unmask();
        }
    }

    /// Mask the line on behalf of the control path and wait until no
    /// processing phase is running. Must not be called from the processing
    /// phase itself.
    pub fn disable(&self) {
        {
            let mut line = self.line.lock();
            line.quiesced = true;
            if line.enabled {
                line.mask();
            }
        }
        while self.in_flight.load(Ordering::Acquire) {
            core::hint::spin_loop();
        }
    }

    /// Claim-phase test-and-set: enabled becomes disabled and a processing
    /// phase is marked in flight. Returns `false` if the line was already
    /// disabled. Never blocks beyond the lock.
    pub fn try_claim(&self) -> bool {
        let mut line = self.line.lock();
        if !line.enabled {
            return false;
        }
        line.mask();
        self.in_flight.store(true, Ordering::Release);
        true
    }

    /// End of a processing phase: clear the in-flight mark and unmask unless
    /// the control path quiesced the gate meanwhile.
    pub fn complete(&self) {
        let mut line = self.line.lock();
        self.in_flight.store(false, Ordering::Release);
        if !line.quiesced && !line.enabled {
            line.unmask();
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.line.lock().enabled
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn irq(&self) -> Option<IrqNumber> {
        self.line.lock().irq
    }
}

/// Ends a claimed processing phase when dropped, on every exit path.
pub(crate) struct ClaimGuard<'a>(pub(crate) &'a InterruptGate);

impl Drop for ClaimGuard<'_> {
    fn drop(&mut self) {
        self.0.complete();
    }
}
