// SPDX-License-Identifier: Unlicense

//! Mock implementation of an architecture to allow host tests.
//!
//! Registers are plain fields; writes are recorded so tests can check the
//! sequence the page directory drives.

#![allow(missing_docs)]

use crate::archs::{HandlerTrait, PagerTrait};
use crate::pager::{VirtAddr, VirtAddrRange};

const SCTLR_M: u32 = 1 << 0;

#[derive(Debug, Default)]
pub struct Arch {
    pub sctlr: u32,
    pub ttbr0: u32,
    pub ttbcr: u32,
    pub dacr: u32,
    pub irqs_masked: bool,
    pub tlb_invalidations: usize,
    pub translation_disables: usize,
}

impl Arch {
    pub const fn new() -> Self {
        Self {
            sctlr: 0,
            ttbr0: 0,
            ttbcr: 0,
            dacr: 0,
            irqs_masked: false,
            tlb_invalidations: 0,
            translation_disables: 0,
        }
    }

    pub const fn translation_enabled(&self) -> bool {
        self.sctlr & SCTLR_M != 0
    }
}

impl PagerTrait for Arch {
    fn text_image() -> VirtAddrRange {
        VirtAddrRange::between(VirtAddr::at(0x0010_0000), VirtAddr::at(0x0020_0000))
    }

    fn static_image() -> VirtAddrRange {
        VirtAddrRange::between(VirtAddr::at(0x0020_0000), VirtAddr::at(0x0020_4000))
    }

    fn data_image() -> VirtAddrRange {
        VirtAddrRange::between(VirtAddr::at(0x0020_4000), VirtAddr::at(0x0040_0000))
    }

    fn nocache_image() -> VirtAddrRange {
        VirtAddrRange::between(VirtAddr::at(0x0040_0000), VirtAddr::at(0x0041_0000))
    }

    fn invalidate_tlb_all(&mut self) {
        self.tlb_invalidations += 1;
    }

    fn read_sctlr(&self) -> u32 {
        self.sctlr
    }

    fn write_sctlr(&mut self, value: u32) {
        if self.translation_enabled() && value & SCTLR_M == 0 {
            assert!(
                self.irqs_masked,
                "translation disabled with interrupts unmasked"
            );
            self.translation_disables += 1;
        }
        self.sctlr = value;
    }

    fn write_ttbr0(&mut self, value: u32) {
        self.ttbr0 = value;
    }

    fn write_ttbcr(&mut self, value: u32) {
        self.ttbcr = value;
    }

    fn write_dacr(&mut self, value: u32) {
        self.dacr = value;
    }
}

impl HandlerTrait for Arch {
    fn irq_lock(&mut self) -> u32 {
        let key = self.irqs_masked as u32;
        self.irqs_masked = true;
        key
    }

    fn irq_unlock(&mut self, key: u32) {
        self.irqs_masked = key != 0;
    }

    fn wait_forever() -> ! {
        loop {
            core::hint::spin_loop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn irq_lock_nests() {
        let mut arch = Arch::new();
        let outer = arch.irq_lock();
        let inner = arch.irq_lock();
        arch.irq_unlock(inner);
        assert!(arch.irqs_masked);
        arch.irq_unlock(outer);
        assert!(!arch.irqs_masked);
    }

    #[test]
    #[should_panic]
    fn translation_off_needs_masked_irqs() {
        let mut arch = Arch::new();
        arch.write_sctlr(SCTLR_M);
        arch.write_sctlr(0);
    }

    #[test]
    fn image_ranges_are_ordered() {
        assert!(Arch::text_image().top() <= Arch::static_image().base().get() as u64);
        assert!(Arch::static_image().top() <= Arch::data_image().base().get() as u64);
        assert!(Arch::data_image().top() <= Arch::nocache_image().base().get() as u64);
    }
}
