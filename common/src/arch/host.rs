//! Host stand-in for local interrupt control.
//!
//! There are no interrupts to mask when running under an operating system,
//! so this only tracks how deeply critical sections are nested. Tests use
//! [`HostIrq::depth`] to check that a lock really was taken IRQ-safe.

use core::sync::atomic::{AtomicUsize, Ordering};

use crate::sync::irq::IrqControl;

static DEPTH: AtomicUsize = AtomicUsize::new(0);

pub struct HostIrq;

impl HostIrq {
    /// Number of IRQ-masked sections currently open, across all threads.
    pub fn depth() -> usize {
        DEPTH.load(Ordering::Acquire)
    }
}

impl IrqControl for HostIrq {
    type State = ();

    fn disable() -> Self::State {
        DEPTH.fetch_add(1, Ordering::AcqRel);
    }

    fn restore(_state: Self::State) {
        DEPTH.fetch_sub(1, Ordering::AcqRel);
    }
}
