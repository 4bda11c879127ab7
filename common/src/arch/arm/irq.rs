use crate::sync::irq::IrqControl;

const CPSR_I_BIT: u32 = 1 << 7;

/// IRQ masking through the CPSR `I` bit.
///
/// `disable()` reports whether IRQs were enabled before masking so that
/// nested critical sections only unmask on the outermost exit.
pub struct ArmIrq;

#[inline(always)]
fn mask_and_read_cpsr() -> u32 {
    let cpsr: u32;
    unsafe {
        core::arch::asm!(
            "mrs {0}, cpsr",
            "cpsid i",
            out(reg) cpsr,
            options(nomem, nostack)
        );
    }
    cpsr
}

impl IrqControl for ArmIrq {
    type State = bool;

    #[inline(always)]
    fn disable() -> bool {
        mask_and_read_cpsr() & CPSR_I_BIT == 0
    }

    #[inline(always)]
    fn restore(was_enabled: bool) {
        if was_enabled {
            unsafe {
                core::arch::asm!("cpsie i", options(nomem, nostack));
            }
        }
    }
}
