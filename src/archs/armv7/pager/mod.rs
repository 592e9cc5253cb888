// SPDX-License-Identifier: Unlicense

//! Short-descriptor page directory.
//!
//! One first-level table covers the 4GB address space in 1MB entries. A
//! first-level entry either maps a section directly or refers to one of a
//! fixed pool of second-level tables mapping 4KB small pages. Sections are
//! only written at boot; runtime requests are always page mapped, converting
//! a section into an equivalent table first if they land inside one.

pub mod attrs;
mod pool;
pub mod table;

use super::regs::{
    sctlr_with_translation, sctlr_without_translation, ttbcr_value, ttbr0_value, DACR_ALL_CLIENT,
};
use crate::archs::{HandlerTrait, PagerTrait};
use crate::pager::{
    AttributeField, Attributes, FlatRange, MapFlags, MappingRegion, PhysAddr, VirtAddr,
    VirtAddrRange, PAGESIZE_BYTES, SECTION_BYTES,
};
use crate::util::result::{Error, Result};

pub use attrs::PermAttrs;
use attrs::DOMAIN_OS;
use pool::L2TablePool;
use table::{
    l1_index, l2_index, L1Entry, L1Kind, L1Table, L2Entry, L2Kind, PageTableDescriptor,
    SectionDescriptor, SmallPageDescriptor, L1_ENTRIES, L2_ENTRIES,
};

const PAGE: u32 = PAGESIZE_BYTES as u32;
const SECTION: u32 = SECTION_BYTES as u32;

/// The translation tables and the CPU they are installed on.
pub struct PageDirectory<A, const N: usize> {
    l1: L1Table,
    pool: L2TablePool<N>,
    arch: A,
    initialised: bool,
}

impl<A, const N: usize> PageDirectory<A, N> {
    /// Empty tables, not yet installed.
    pub const fn new(arch: A) -> Self {
        Self {
            l1: L1Table::new(),
            pool: L2TablePool::new(),
            arch,
            initialised: false,
        }
    }

    /// The CPU handle.
    pub fn arch(&self) -> &A {
        &self.arch
    }

    /// The first-level entry translating an address.
    pub fn l1_entry(&self, virt_addr: VirtAddr) -> L1Entry {
        self.l1[l1_index(virt_addr)]
    }

    /// The second-level entry translating an address, if its first-level
    /// entry refers to a table.
    pub fn l2_entry(&self, virt_addr: VirtAddr) -> Option<L2Entry> {
        self.pool
            .find(l1_index(virt_addr))
            .map(|table| self.pool.table(table)[l2_index(virt_addr)])
    }

    /// Live entries in the second-level table covering an address.
    pub fn live_entries(&self, virt_addr: VirtAddr) -> Option<usize> {
        self.pool
            .find(l1_index(virt_addr))
            .map(|table| self.pool.entries(table))
    }

    /// Second-level tables available.
    pub fn free_tables(&self) -> usize {
        self.pool.free_count()
    }

    /// Second-level tables assigned.
    pub fn tables_in_use(&self) -> usize {
        self.pool.in_use()
    }

    /// Translate an address the way the hardware would.
    pub fn resolve(&self, virt_addr: VirtAddr) -> Result<PhysAddr> {
        let l1_idx = l1_index(virt_addr);
        match self.l1[l1_idx].kind() {
            L1Kind::Invalid => Err(Error::Fault),
            L1Kind::Section(section) if section.is_active() => Ok(section
                .output_address()
                .increment(virt_addr.offset_within(SECTION))),
            L1Kind::Section(_) => Err(Error::Fault),
            L1Kind::PageTable(_) => {
                let table = self.pool.find(l1_idx).ok_or(Error::Fault)?;
                match self.pool.table(table)[l2_index(virt_addr)].kind() {
                    L2Kind::SmallPage(page) if page.is_active() => Ok(page
                        .output_address()
                        .increment(virt_addr.offset_within(PAGE))),
                    _ => Err(Error::Fault),
                }
            }
        }
    }

    /// Log every live entry.
    pub fn dump(&self) {
        info!(
            "page directory: {} L2 tables in use, {} free",
            self.pool.in_use(),
            self.pool.free_count()
        );
        for l1_idx in 0..L1_ENTRIES {
            let entry = self.l1[l1_idx];
            if entry.is_null() {
                continue;
            }
            info!("{:03x}: {:?}", l1_idx, entry);
            if let (L1Kind::PageTable(_), Some(table)) = (entry.kind(), self.pool.find(l1_idx)) {
                let l2 = self.pool.table(table);
                for l2_idx in 0..L2_ENTRIES {
                    if !l2[l2_idx].is_null() {
                        info!("  {:03x}{:02x}: {:?}", l1_idx, l2_idx, l2[l2_idx]);
                    }
                }
            }
        }
    }
}

impl<A: PagerTrait + HandlerTrait, const N: usize> PageDirectory<A, N> {
    /// Map the kernel image and the platform's regions, then turn on
    /// translation through these tables.
    pub fn init(
        &mut self,
        image: impl IntoIterator<Item = FlatRange>,
        platform: &[MappingRegion],
    ) -> Result<()> {
        info!("init");

        if self.initialised {
            return Err(Error::AlreadyInitialised);
        }

        let l1_addr = PhysAddr::from_ptr(&self.l1);
        let mut l1_attrs = None;

        for range in image {
            debug!("{:?}", range);
            if range.virt_addr_range().contains(VirtAddr::identity_mapped(l1_addr)) {
                l1_attrs = Some(range.attrs);
            }
            self.map_flat(&range);
        }

        for region in platform {
            debug!("{:?}", region);
            assert!(region.base_va.is_aligned(PAGE), "{:?}", region);
            assert!(region.base_pa.is_aligned(PAGE), "{:?}", region);
            assert_eq!(0, region.size % PAGESIZE_BYTES, "{:?}", region);
            assert!(region.virt_addr_range().fits(), "{:?}", region);
            assert!(region.phys_addr_range().fits(), "{:?}", region);
            if region.phys_addr_range().contains(l1_addr) {
                l1_attrs = Some(region.attrs);
            }
            let perms = PermAttrs::from(region.attrs);
            for (i, page) in region.virt_addr_range().pages().enumerate() {
                self.map_page(page, region.base_pa.increment(i as u32 * PAGE), &perms);
            }
        }

        self.arch.invalidate_tlb_all();
        self.arch.write_ttbcr(ttbcr_value());
        self.arch.write_ttbr0(ttbr0_value(l1_addr, l1_attrs));
        self.arch.write_dacr(DACR_ALL_CLIENT);
        let sctlr = self.arch.read_sctlr();
        self.arch.write_sctlr(sctlr_with_translation(sctlr));

        self.initialised = true;
        info!("translation enabled, L1 at {:?}", l1_addr);
        Ok(())
    }

    /// Map a physical range at a virtual address with small pages.
    ///
    /// Both addresses are aligned down to their page; every page touched by
    /// `size` bytes from `virt_addr` is mapped.
    pub fn map(
        &mut self,
        virt_addr: VirtAddr,
        phys_addr: PhysAddr,
        size: usize,
        flags: MapFlags,
    ) -> Result<()> {
        let range = VirtAddrRange::new(virt_addr, size);
        let phys_base = phys_addr.align_down(PAGE);
        let phys_top = phys_base.get() as u64 + range.length_in_pages() as u64 * PAGE as u64;
        if range.is_empty() || !range.fits() || phys_top > 1u64 << 32 {
            error!("map {:?} to {:?}: invalid range", range, phys_addr);
            return Err(Error::InvalidArgument);
        }

        let perms = PermAttrs::from(Attributes::from(flags));
        trace!("map {:?} to {:?}: {:?}", range, phys_addr, perms);

        let key = self.arch.irq_lock();
        for (i, page) in range.pages().enumerate() {
            self.map_page(page, phys_base.increment(i as u32 * PAGE), &perms);
        }
        self.arch.irq_unlock(key);

        self.arch.invalidate_tlb_all();
        Ok(())
    }

    /// Remove the page mappings covering a range.
    ///
    /// Addresses without a page mapping are skipped, so guard pages and
    /// repeated calls are harmless.
    pub fn unmap(&mut self, virt_addr: VirtAddr, size: usize) -> Result<()> {
        let range = VirtAddrRange::new(virt_addr, size);
        let result = if virt_addr.is_null() || range.is_empty() || !range.fits() {
            error!("unmap {:?}: invalid range", range);
            Err(Error::InvalidArgument)
        } else {
            trace!("unmap {:?}", range);
            let key = self.arch.irq_lock();
            for page in range.pages() {
                self.unmap_page(page);
            }
            self.arch.irq_unlock(key);
            Ok(())
        };

        self.arch.invalidate_tlb_all();
        result
    }

    /// Map 1MB at boot. The entry must be free.
    fn map_section(&mut self, virt_addr: VirtAddr, phys_addr: PhysAddr, perms: &PermAttrs) {
        let l1_idx = l1_index(virt_addr);
        assert!(
            self.l1[l1_idx].is_null(),
            "section over live entry {:?} at {:?}",
            self.l1[l1_idx],
            virt_addr
        );
        let desc = SectionDescriptor::new_entry(phys_addr, perms);
        trace!("{:03x}: section {:#010x}", l1_idx, desc.get());
        self.l1[l1_idx] = desc.into();
    }

    /// Identity map a part of the kernel image, in sections where allowed.
    fn map_flat(&mut self, range: &FlatRange) {
        let perms = PermAttrs::from(range.attrs);
        let may_map_section = range.attrs.is_set(AttributeField::MayMapSection);

        let mut next = range.start.align_down(PAGE).get() as u64;
        let top = (range.end.get() as u64 + PAGE as u64 - 1) & !(PAGE as u64 - 1);
        while next < top {
            let virt_addr = VirtAddr::at(next as u32);
            let phys_addr = PhysAddr::identity_mapped(virt_addr);
            if may_map_section && top - next >= SECTION as u64 && virt_addr.is_aligned(SECTION) {
                self.map_section(virt_addr, phys_addr, &perms);
                next += SECTION as u64;
            } else {
                self.map_page(virt_addr, phys_addr, &perms);
                next += PAGE as u64;
            }
        }
    }

    /// Write one small page, creating or converting its table as needed.
    fn map_page(&mut self, virt_addr: VirtAddr, phys_addr: PhysAddr, perms: &PermAttrs) {
        let l1_idx = l1_index(virt_addr);
        let table = match self.l1[l1_idx].kind() {
            L1Kind::Invalid => {
                let table = self.pool.assign(virt_addr);
                // TODO: derive the domain from perms so device tables land in DOMAIN_DEVICE
                let desc =
                    PageTableDescriptor::new_entry(self.pool.phys_addr(table), DOMAIN_OS, perms.non_sec);
                debug!("{:03x}: assigned L2 table {} ({:#010x})", l1_idx, table, desc.get());
                self.l1[l1_idx] = desc.into();
                table
            }
            L1Kind::Section(section) => self.convert_section(virt_addr, section),
            L1Kind::PageTable(mut desc) => {
                if desc.non_sec() != perms.non_sec {
                    warn!(
                        "{:03x}: L2 table shared between secure states, now NS={}",
                        l1_idx, perms.non_sec
                    );
                    desc.set_non_sec(perms.non_sec);
                    self.l1[l1_idx] = desc.into();
                }
                self.pool
                    .find(l1_idx)
                    .expect("table reference without an L2 table")
            }
        };

        let l2_idx = l2_index(virt_addr);
        if self.pool.table(table)[l2_idx].is_null() {
            self.pool.inc(table);
        }
        let desc = SmallPageDescriptor::new_entry(phys_addr, perms);
        trace!("{:03x}{:02x}: small page {:#010x}", l1_idx, l2_idx, desc.get());
        self.pool.table_mut(table)[l2_idx] = desc.into();
    }

    /// Replace a section with a table of 256 equivalent small pages.
    ///
    /// Translation is off while the entry changes, which relies on the
    /// kernel being identity mapped.
    fn convert_section(&mut self, virt_addr: VirtAddr, section: SectionDescriptor) -> usize {
        let l1_idx = l1_index(virt_addr);
        let base_va = virt_addr.align_down(SECTION);
        let base_pa = section.output_address();
        let perms = section.perm_attrs();
        debug!("{:03x}: converting section at {:?} to L2 table", l1_idx, base_pa);

        let key = self.arch.irq_lock();
        let sctlr = self.arch.read_sctlr();
        self.arch.write_sctlr(sctlr_without_translation(sctlr));

        self.l1[l1_idx] = L1Entry::null();
        let table = self.pool.assign(base_va);
        self.l1[l1_idx] =
            PageTableDescriptor::new_entry(self.pool.phys_addr(table), perms.domain, perms.non_sec)
                .into();
        for l2_idx in 0..L2_ENTRIES {
            let offset = l2_idx as u32 * PAGE;
            let desc = SmallPageDescriptor::new_entry(base_pa.increment(offset), &perms);
            self.pool.table_mut(table)[l2_idx] = desc.into();
            self.pool.inc(table);
        }

        self.arch.invalidate_tlb_all();
        self.arch.write_sctlr(sctlr);
        self.arch.irq_unlock(key);
        table
    }

    /// Clear one small page, releasing its table with its last page.
    fn unmap_page(&mut self, virt_addr: VirtAddr) {
        let l1_idx = l1_index(virt_addr);
        let table = match (self.l1[l1_idx].kind(), self.pool.find(l1_idx)) {
            (L1Kind::PageTable(_), Some(table)) => table,
            _ => return,
        };

        let l2_idx = l2_index(virt_addr);
        match self.pool.table(table)[l2_idx].kind() {
            L2Kind::Blank => return,
            L2Kind::Unrecognized(raw) => {
                error!(
                    "unmap {:?}: unrecognised L2 entry {:#010x}, left in place",
                    virt_addr, raw
                );
                return;
            }
            L2Kind::SmallPage(_) => {}
        }

        trace!("{:03x}{:02x}: cleared", l1_idx, l2_idx);
        self.pool.table_mut(table)[l2_idx] = L2Entry::null();
        if let Some(owner) = self.pool.dec(table) {
            debug!("{:03x}: released L2 table {}", owner, table);
            self.l1[owner] = L1Entry::null();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archs::test::Arch;

    fn flat(start: u32, end: u32, attrs: Attributes) -> FlatRange {
        FlatRange {
            name: "test",
            start: VirtAddr::at(start),
            end: VirtAddr::at(end),
            attrs,
        }
    }

    #[test]
    fn flat_range_sections_and_pages() {
        crate::debug::unit_test_logging::setup();

        let mut pd = PageDirectory::<Arch, 2>::new(Arch::new());
        pd.map_flat(&flat(0x0010_0000, 0x0030_3000, Attributes::KERNEL_DATA));

        assert!(matches!(pd.l1_entry(VirtAddr::at(0x0010_0000)).kind(), L1Kind::Section(_)));
        assert!(matches!(pd.l1_entry(VirtAddr::at(0x0020_0000)).kind(), L1Kind::Section(_)));
        assert_some_eq!(pd.live_entries(VirtAddr::at(0x0030_0000)), 3);
        assert_eq!(1, pd.tables_in_use());
    }

    #[test]
    fn flat_range_without_sections() {
        let mut pd = PageDirectory::<Arch, 2>::new(Arch::new());
        let attrs = Attributes::KERNEL_DATA.clear(AttributeField::MayMapSection);
        pd.map_flat(&flat(0x0010_0000, 0x0020_0000, attrs));
        assert_some_eq!(pd.live_entries(VirtAddr::at(0x0010_0000)), 256);
    }

    #[test]
    fn flat_range_unaligned_ends() {
        let mut pd = PageDirectory::<Arch, 2>::new(Arch::new());
        pd.map_flat(&flat(0x0010_0800, 0x0010_2001, Attributes::KERNEL_RODATA));
        assert_some_eq!(pd.live_entries(VirtAddr::at(0x0010_0000)), 3);
        assert_ok_eq!(pd.resolve(VirtAddr::at(0x0010_2fff)), PhysAddr::at(0x0010_2fff));
        assert_err!(pd.resolve(VirtAddr::at(0x0010_3000)));
    }

    #[test]
    #[should_panic]
    fn section_over_live_entry() {
        let mut pd = PageDirectory::<Arch, 2>::new(Arch::new());
        let perms = PermAttrs::from(Attributes::KERNEL_DATA);
        pd.map_section(VirtAddr::at(0x0010_0000), PhysAddr::at(0x0010_0000), &perms);
        pd.map_section(VirtAddr::at(0x0010_0000), PhysAddr::at(0x0010_0000), &perms);
    }

    #[test]
    fn convert_keeps_section_attributes() {
        crate::debug::unit_test_logging::setup();

        let mut pd = PageDirectory::<Arch, 2>::new(Arch::new());
        let perms = PermAttrs::from(Attributes::DEVICE | AttributeField::NonSecure);
        pd.map_section(VirtAddr::at(0x1000_0000), PhysAddr::at(0x1000_0000), &perms);
        let section = SectionDescriptor::new(pd.l1_entry(VirtAddr::at(0x1000_0000)).raw());

        let table = pd.convert_section(VirtAddr::at(0x1000_9000), section);
        match pd.l1_entry(VirtAddr::at(0x1000_0000)).kind() {
            L1Kind::PageTable(desc) => {
                assert_eq!(1, desc.domain());
                assert!(desc.non_sec());
                assert_eq!(pd.pool.phys_addr(table), desc.table_address());
            }
            _ => panic!("not converted"),
        }
        assert_eq!(256, pd.pool.entries(table));
        for page in 0..256u32 {
            let addr = 0x1000_0000 + (page << 12);
            let expected = SmallPageDescriptor::new_entry(PhysAddr::at(addr), &perms);
            assert_some_eq!(pd.l2_entry(VirtAddr::at(addr)).map(L2Entry::raw), expected.get());
        }
        assert_eq!(1, pd.arch().tlb_invalidations);
        assert!(!pd.arch().irqs_masked);
    }

    #[test]
    fn unrecognised_entry_left_in_place() {
        crate::debug::unit_test_logging::setup();

        let mut pd = PageDirectory::<Arch, 2>::new(Arch::new());
        let va = VirtAddr::at(0x4000_0000);
        assert_ok!(pd.map(va, PhysAddr::at(0x4000_0000), 0x1000, MapFlags::PERM_RW));
        let table = pd.pool.find(0x400).unwrap();
        let large_page = 0x4000_0001;
        pd.pool.table_mut(table)[1] = L2Entry::from_raw(large_page);

        pd.unmap_page(VirtAddr::at(0x4000_1000));
        assert_eq!(large_page, pd.pool.table(table)[1].raw());
        assert_eq!(1, pd.pool.entries(table));
    }
}
