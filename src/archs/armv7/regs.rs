// SPDX-License-Identifier: Unlicense

//! Values for the CP15 system registers that control translation.

use crate::pager::{AttributeField, Attributes, PhysAddr};
use crate::util::bitfield::{register_bitfields, Bitfield, FieldValue};

register_bitfields! {
    u32,
    pub SctlrFields [
        AFE OFFSET(29) NUMBITS(1) [],                     // Access flag enable
        TRE OFFSET(28) NUMBITS(1) [],                     // TEX remap enable
        I OFFSET(12) NUMBITS(1) [],                       // Instruction cache
        C OFFSET(2) NUMBITS(1) [],                        // Data cache
        A OFFSET(1) NUMBITS(1) [],                        // Alignment checking
        M OFFSET(0) NUMBITS(1) []                         // MMU
    ]
}

register_bitfields! {
    u32,
    pub Ttbr0Fields [
        BASE OFFSET(14) NUMBITS(18) [],
        IRGN0 OFFSET(6) NUMBITS(1) [],
        NOS OFFSET(5) NUMBITS(1) [],
        RGN OFFSET(3) NUMBITS(2) [
            NonCacheable = 0b00,
            WriteBackAlloc = 0b01,
            WriteThrough = 0b10,
            WriteBackNoAlloc = 0b11
        ],
        IMP OFFSET(2) NUMBITS(1) [],
        S OFFSET(1) NUMBITS(1) [],
        IRGN1 OFFSET(0) NUMBITS(1) []
    ]
}

register_bitfields! {
    u32,
    pub TtbcrFields [
        EAE OFFSET(31) NUMBITS(1) [],
        PD1 OFFSET(5) NUMBITS(1) [],
        PD0 OFFSET(4) NUMBITS(1) [],
        N OFFSET(0) NUMBITS(3) []
    ]
}

type Sctlr = Bitfield<u32, SctlrFields::Register>;
type Ttbr0 = Bitfield<u32, Ttbr0Fields::Register>;
type Ttbr0Mask = FieldValue<u32, Ttbr0Fields::Register>;
type Ttbcr = Bitfield<u32, TtbcrFields::Register>;

/// Every domain a client: accesses are checked against descriptor permissions.
pub const DACR_ALL_CLIENT: u32 = 0x5555_5555;

/// Short-descriptor format, TTBR0 translates the whole address space.
pub fn ttbcr_value() -> u32 {
    use TtbcrFields::*;

    Ttbcr::from(EAE::CLEAR + PD1::CLEAR + PD0::CLEAR + N.val(0)).get()
}

/// SCTLR with the MMU, alignment checks and both caches on, and with the
/// access flag and TEX remap off so descriptors are read literally.
pub fn sctlr_with_translation(current: u32) -> u32 {
    use SctlrFields::*;

    let mut sctlr = Sctlr::new(current);
    sctlr.modify(M::SET + A::SET + C::SET + I::SET + AFE::CLEAR + TRE::CLEAR);
    sctlr.get()
}

/// SCTLR with only the MMU turned off.
pub fn sctlr_without_translation(current: u32) -> u32 {
    let mut sctlr = Sctlr::new(current);
    sctlr.modify(SctlrFields::M::CLEAR);
    sctlr.get()
}

/// TTBR0 for an L1 table at `base`, walked with the cacheability and
/// shareability of the memory holding it.
pub fn ttbr0_value(base: PhysAddr, attributes: Option<Attributes>) -> u32 {
    use AttributeField::*;
    use Ttbr0Fields::*;

    let mut field: Ttbr0Mask = BASE.val(base.get() >> 14);
    if let Some(attributes) = attributes {
        if attributes.is_set(Shared) {
            field += S::SET;
        }

        if attributes.is_set(OuterWriteBackAlloc) {
            field += RGN::WriteBackAlloc;
        } else if attributes.is_set(OuterWriteThrough) {
            field += RGN::WriteThrough;
        } else if attributes.is_set(OuterWriteBackNoAlloc) {
            field += RGN::WriteBackNoAlloc;
        }

        // inner policy is split across IRGN[0] at bit 6 and IRGN[1] at bit 0
        if attributes.is_set(InnerWriteBackAlloc) {
            field += IRGN0::SET;
        } else if attributes.is_set(InnerWriteThrough) {
            field += IRGN1::SET;
        } else if attributes.is_set(InnerWriteBackNoAlloc) {
            field += IRGN0::SET + IRGN1::SET;
        }
    }
    Ttbr0::from(field).get()
}
