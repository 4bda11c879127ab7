use core::fmt::Debug;

/// Local (per-CPU) interrupt masking.
///
/// Implemented once per target in [`crate::arch`].
pub trait IrqControl {
    /// Whatever is needed to undo one `disable()`.
    type State: Copy + Debug;

    /// Mask local interrupts, returning the state to restore.
    fn disable() -> Self::State;

    /// Undo a previous `disable()`.
    fn restore(state: Self::State);
}
