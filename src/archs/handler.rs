// SPDX-License-Identifier: Unlicense

//! Interface for architecture-specific exception handling.

/// Each architecture must supply the following entry points for masking
/// interrupts around translation table surgery.
pub trait HandlerTrait {
    /// Mask IRQs on this core, returning a key that restores the prior state.
    fn irq_lock(&mut self) -> u32;

    /// Restore the IRQ mask captured by `irq_lock`.
    fn irq_unlock(&mut self, key: u32);

    /// Loop forever
    fn wait_forever() -> !;
}
