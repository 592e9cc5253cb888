// SPDX-License-Identifier: Unlicense

//! Short-descriptor translation table data structures.

use super::attrs::PermAttrs;
use crate::pager::{PhysAddr, VirtAddr};
use crate::util::bitfield::{register_bitfields, Bitfield, FieldValue};

use core::fmt::{Debug, Formatter};
use core::ops::{Index, IndexMut};

/// Entries in the first-level table, one per 1MB of address space.
pub const L1_ENTRIES: usize = 4096;
/// Entries in a second-level table, one per 4KB page of a 1MB region.
pub const L2_ENTRIES: usize = 256;

/// Index of the L1 entry translating an address.
pub const fn l1_index(virt_addr: VirtAddr) -> usize {
    (virt_addr.get() >> 20) as usize
}

/// Index of the L2 entry translating an address, within its table.
pub const fn l2_index(virt_addr: VirtAddr) -> usize {
    ((virt_addr.get() >> 12) & 0xff) as usize
}

// AP[1:0] holds AP[1] from the access permissions over AP[0] = 1, since the
// access flag is disabled and AP[0] must read as accessed.
const fn ap_value(acc_perms: u8) -> u32 {
    (((acc_perms & 1) << 1) | 1) as u32
}

const fn apx_value(acc_perms: u8) -> u32 {
    (acc_perms >> 1) as u32
}

register_bitfields! {
    u32,
    pub SectionFields [
        BASE OFFSET(20) NUMBITS(12) [],
        NS OFFSET(19) NUMBITS(1) [],                      // Non-secure
        SUPERSECTION OFFSET(18) NUMBITS(1) [],
        NG OFFSET(17) NUMBITS(1) [],                      // Not global
        S OFFSET(16) NUMBITS(1) [],                       // Shareable
        APX OFFSET(15) NUMBITS(1) [],                     // Disable writes
        TEX OFFSET(12) NUMBITS(3) [],
        AP OFFSET(10) NUMBITS(2) [],
        IMP OFFSET(9) NUMBITS(1) [],
        DOMAIN OFFSET(5) NUMBITS(4) [],
        XN OFFSET(4) NUMBITS(1) [],                       // Execute never
        C OFFSET(3) NUMBITS(1) [],
        B OFFSET(2) NUMBITS(1) [],
        ID OFFSET(0) NUMBITS(2) [
            Invalid = 0b00,
            PageTable = 0b01,
            Section = 0b10
        ]
    ]
}

/// A first-level entry mapping 1MB directly.
pub type SectionDescriptor = Bitfield<u32, SectionFields::Register>;
type SectionDescriptorMask = FieldValue<u32, SectionFields::Register>;

impl SectionDescriptor {
    /// Section mapping the 1MB region holding `phys_addr`.
    pub fn new_entry(phys_addr: PhysAddr, perms: &PermAttrs) -> Self {
        use SectionFields::*;

        let field: SectionDescriptorMask = BASE.val(phys_addr.get() >> 20)
            + NS.val(perms.non_sec as u32)
            + NG.val(perms.not_global as u32)
            + S.val(perms.shared as u32)
            + APX.val(apx_value(perms.acc_perms))
            + TEX.val(perms.tex as u32)
            + AP.val(ap_value(perms.acc_perms))
            + DOMAIN.val(perms.domain as u32)
            + XN.val(perms.exec_never as u32)
            + C.val(perms.cacheable as u32)
            + B.val(perms.bufferable as u32)
            + ID.val((0b10 & perms.id_mask) as u32);
        Self::from(field)
    }

    /// Attributes that would re-create this section's fields.
    pub fn perm_attrs(&self) -> PermAttrs {
        use SectionFields::*;

        PermAttrs {
            tex: self.read(TEX) as u8,
            cacheable: self.is_set(C),
            bufferable: self.is_set(B),
            shared: self.is_set(S),
            domain: self.read(DOMAIN) as u8,
            acc_perms: ((self.read(APX) << 1) | (self.read(AP) >> 1)) as u8,
            exec_never: self.is_set(XN),
            id_mask: if self.is_active() { 0b11 } else { 0b00 },
            non_sec: self.is_set(NS),
            not_global: self.is_set(NG),
        }
    }

    /// Base of the 1MB physical region.
    pub fn output_address(&self) -> PhysAddr {
        PhysAddr::at(self.read(SectionFields::BASE) << 20)
    }

    /// True if the hardware will translate through this entry.
    pub fn is_active(&self) -> bool {
        self.read(SectionFields::ID) != 0
    }
}

register_bitfields! {
    u32,
    pub PageTableFields [
        BASE OFFSET(10) NUMBITS(22) [],
        IMP OFFSET(9) NUMBITS(1) [],
        DOMAIN OFFSET(5) NUMBITS(4) [],
        SBZ OFFSET(4) NUMBITS(1) [],
        NS OFFSET(3) NUMBITS(1) [],                       // Non-secure
        PXN OFFSET(2) NUMBITS(1) [],                      // Privileged execute never
        ID OFFSET(0) NUMBITS(2) [
            PageTable = 0b01
        ]
    ]
}

/// A first-level entry referring to a second-level table.
pub type PageTableDescriptor = Bitfield<u32, PageTableFields::Register>;

impl PageTableDescriptor {
    /// Reference to the L2 table at `table_addr`.
    pub fn new_entry(table_addr: PhysAddr, domain: u8, non_sec: bool) -> Self {
        use PageTableFields::*;

        Self::from(
            BASE.val(table_addr.get() >> 10)
                + DOMAIN.val(domain as u32)
                + NS.val(non_sec as u32)
                + ID::PageTable,
        )
    }

    /// Physical address of the L2 table.
    pub fn table_address(&self) -> PhysAddr {
        PhysAddr::at(self.read(PageTableFields::BASE) << 10)
    }

    /// Domain of every page in the table.
    pub fn domain(&self) -> u8 {
        self.read(PageTableFields::DOMAIN) as u8
    }

    /// Security state of every page in the table.
    pub fn non_sec(&self) -> bool {
        self.is_set(PageTableFields::NS)
    }

    /// Replace the security state.
    pub fn set_non_sec(&mut self, non_sec: bool) {
        self.modify(PageTableFields::NS.val(non_sec as u32));
    }
}

register_bitfields! {
    u32,
    pub SmallPageFields [
        BASE OFFSET(12) NUMBITS(20) [],
        NG OFFSET(11) NUMBITS(1) [],                      // Not global
        S OFFSET(10) NUMBITS(1) [],                       // Shareable
        APX OFFSET(9) NUMBITS(1) [],                      // Disable writes
        TEX OFFSET(6) NUMBITS(3) [],
        AP OFFSET(4) NUMBITS(2) [],
        C OFFSET(3) NUMBITS(1) [],
        B OFFSET(2) NUMBITS(1) [],
        ID OFFSET(0) NUMBITS(2) []                        // Small page in bit 1, XN in bit 0
    ]
}

/// A second-level entry mapping 4KB.
pub type SmallPageDescriptor = Bitfield<u32, SmallPageFields::Register>;

impl SmallPageDescriptor {
    /// Small page mapping the 4KB page holding `phys_addr`.
    pub fn new_entry(phys_addr: PhysAddr, perms: &PermAttrs) -> Self {
        use SmallPageFields::*;

        let id = (0b10 | perms.exec_never as u8) & perms.id_mask;
        Self::from(
            BASE.val(phys_addr.get() >> 12)
                + NG.val(perms.not_global as u32)
                + S.val(perms.shared as u32)
                + APX.val(apx_value(perms.acc_perms))
                + TEX.val(perms.tex as u32)
                + AP.val(ap_value(perms.acc_perms))
                + C.val(perms.cacheable as u32)
                + B.val(perms.bufferable as u32)
                + ID.val(id as u32),
        )
    }

    /// Base of the 4KB physical page.
    pub fn output_address(&self) -> PhysAddr {
        PhysAddr::at(self.read(SmallPageFields::BASE) << 12)
    }

    /// True if the hardware will translate through this entry.
    pub fn is_active(&self) -> bool {
        self.read(SmallPageFields::ID) != 0
    }
}

/// Decoded first-level entry.
pub enum L1Kind {
    /// Faults; free for use.
    Invalid,
    /// Refers to a second-level table.
    PageTable(PageTableDescriptor),
    /// Maps 1MB, possibly with translation disabled by its permissions.
    Section(SectionDescriptor),
}

/// An entry in the first-level table.
#[derive(Copy, Clone, PartialEq, Eq)]
#[repr(transparent)]
pub struct L1Entry(u32);

impl L1Entry {
    /// The empty entry.
    pub const fn null() -> Self {
        Self(0)
    }

    /// The descriptor word.
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// True for the empty entry.
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Classify the entry.
    ///
    /// Only an all-zero word is free: a section whose type bits were masked
    /// off for lack of read permission still holds a mapping.
    pub fn kind(self) -> L1Kind {
        if self.0 == 0 {
            L1Kind::Invalid
        } else if self.0 & 0b11 == 0b01 {
            L1Kind::PageTable(PageTableDescriptor::new(self.0))
        } else {
            L1Kind::Section(SectionDescriptor::new(self.0))
        }
    }
}

impl From<SectionDescriptor> for L1Entry {
    fn from(desc: SectionDescriptor) -> Self {
        Self(desc.get())
    }
}

impl From<PageTableDescriptor> for L1Entry {
    fn from(desc: PageTableDescriptor) -> Self {
        Self(desc.get())
    }
}

impl Debug for L1Entry {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self.kind() {
            L1Kind::Invalid => write!(f, "Invalid"),
            L1Kind::PageTable(desc) => write!(
                f,
                "PageTable({:#010x}) {{ table: {:?}, domain: {}, ns: {} }}",
                self.0,
                desc.table_address(),
                desc.domain(),
                desc.non_sec()
            ),
            L1Kind::Section(desc) => write!(
                f,
                "Section({:#010x}) {{ base: {:?}, {:?} }}",
                self.0,
                desc.output_address(),
                desc.perm_attrs()
            ),
        }
    }
}

/// Decoded second-level entry.
pub enum L2Kind {
    /// Never written, or cleared by unmap.
    Blank,
    /// Maps 4KB, possibly with translation disabled by its permissions.
    SmallPage(SmallPageDescriptor),
    /// A 64KB large page, which this pager never writes.
    Unrecognized(u32),
}

/// An entry in a second-level table.
#[derive(Copy, Clone, PartialEq, Eq)]
#[repr(transparent)]
pub struct L2Entry(u32);

impl L2Entry {
    /// The empty entry.
    pub const fn null() -> Self {
        Self(0)
    }

    /// An entry holding a descriptor word written elsewhere.
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// The descriptor word.
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// True for the empty entry.
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Classify the entry.
    pub fn kind(self) -> L2Kind {
        match self.0 & 0b11 {
            _ if self.0 == 0 => L2Kind::Blank,
            0b01 => L2Kind::Unrecognized(self.0),
            _ => L2Kind::SmallPage(SmallPageDescriptor::new(self.0)),
        }
    }
}

impl From<SmallPageDescriptor> for L2Entry {
    fn from(desc: SmallPageDescriptor) -> Self {
        Self(desc.get())
    }
}

impl Debug for L2Entry {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        use SmallPageFields::*;

        match self.kind() {
            L2Kind::Blank => write!(f, "Blank"),
            L2Kind::Unrecognized(raw) => write!(f, "Unrecognized({:#010x})", raw),
            L2Kind::SmallPage(desc) => write!(
                f,
                "SmallPage({:#010x}) {{ base: {:?}, tex: {:#05b}, c: {}, b: {}, s: {}, apx: {}, ap: {:#04b}, ng: {}, id: {:#04b} }}",
                self.0,
                desc.output_address(),
                desc.read(TEX),
                desc.read(C),
                desc.read(B),
                desc.read(S),
                desc.read(APX),
                desc.read(AP),
                desc.read(NG),
                desc.read(ID)
            ),
        }
    }
}

/// The first-level table: 4096 entries, 16KB aligned for TTBR0.
#[repr(C, align(16384))]
pub struct L1Table([L1Entry; L1_ENTRIES]);

impl L1Table {
    /// A table with every entry empty.
    pub const fn new() -> Self {
        Self([L1Entry::null(); L1_ENTRIES])
    }
}

impl Index<usize> for L1Table {
    type Output = L1Entry;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl IndexMut<usize> for L1Table {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.0[index]
    }
}

/// A second-level table: 256 entries, 1KB aligned for table descriptors.
#[derive(Copy, Clone)]
#[repr(C, align(1024))]
pub struct L2Table([L2Entry; L2_ENTRIES]);

impl L2Table {
    /// A table with every entry empty.
    pub const fn new() -> Self {
        Self([L2Entry::null(); L2_ENTRIES])
    }
}

impl Index<usize> for L2Table {
    type Output = L2Entry;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl IndexMut<usize> for L2Table {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.0[index]
    }
}
