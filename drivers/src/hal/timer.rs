//! Timer Hardware Abstraction Layer.
//!
//! Drivers only need blocking delays; platforms either implement [`Delay`]
//! directly (sleeping the calling thread) or expose a free-running counter
//! through [`CountingTimer`] and get a busy-wait [`Delay`] for free.

/// Blocking delay source.
pub trait Delay {
    /// Block for at least `us` microseconds.
    fn delay_us(&self, us: u32);

    /// Block for at least `ms` milliseconds.
    fn delay_ms(&self, ms: u32) {
        self.delay_us(ms.saturating_mul(1000));
    }
}

/// Free-running microsecond counter.
pub trait CountingTimer {
    /// Read the current timer counter value in microseconds.
    fn now_us(&self) -> u64;
}

impl<T: CountingTimer> Delay for T {
    fn delay_us(&self, us: u32) {
        let start = self.now_us();
        let duration = us as u64;

        while self.now_us().wrapping_sub(start) < duration {
            core::hint::spin_loop();
        }
    }
}
