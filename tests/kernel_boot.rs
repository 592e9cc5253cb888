// SPDX-License-Identifier: Unlicense

//! The kernel-wide page directory, from boot to runtime mapping.

#[macro_use]
extern crate claim;

use libpager::archs::{arch::Arch, PagerTrait};
use libpager::pager::{self, *};
use libpager::Error;
use log::{LevelFilter, Log, Metadata, Record};

use std::sync::atomic::{AtomicUsize, Ordering};

/// Counts "init" records from the paging modules.
struct PagerInitCount(AtomicUsize);

impl Log for PagerInitCount {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if record.target().contains("pager") && format!("{}", record.args()) == "init" {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn flush(&self) {}
}

static PAGER_INITS: PagerInitCount = PagerInitCount(AtomicUsize::new(0));

const UART0: MappingRegion = MappingRegion {
    name: "uart0",
    base_pa: PhysAddr::at(0x1000_9000),
    base_va: VirtAddr::at(0x1000_9000),
    size: 0x1000,
    attrs: Attributes::DEVICE,
};

#[test]
fn boot_map_unmap() {
    assert_ok!(log::set_logger(&PAGER_INITS));
    log::set_max_level(LevelFilter::Info);

    assert_ok!(libpager::boot(&[UART0]));
    assert_eq!(1, PAGER_INITS.0.load(Ordering::SeqCst));

    // the kernel image is identity mapped
    for range in [Arch::text_image(), Arch::static_image(), Arch::data_image()] {
        let last = range.base().increment(range.length() as u32 - 4);
        assert_ok_eq!(pager::resolve(range.base()), PhysAddr::identity_mapped(range.base()));
        assert_ok_eq!(pager::resolve(last), PhysAddr::identity_mapped(last));
    }
    assert_ok_eq!(pager::resolve(VirtAddr::at(0x1000_9ffc)), PhysAddr::at(0x1000_9ffc));
    {
        let page_directory = pager::KERNEL_PAGE_DIRECTORY.lock();
        assert!(page_directory.arch().translation_enabled());
        assert_eq!(
            NUM_L2_TABLES,
            page_directory.free_tables() + page_directory.tables_in_use()
        );
    }

    let virt_addr = VirtAddr::at(0xa000_0000);
    pager::map(
        virt_addr,
        PhysAddr::at(0x6000_0000),
        0x3000,
        MapFlags::CACHE_WB | MapFlags::PERM_RW,
    );
    assert_ok_eq!(pager::resolve(virt_addr.increment(0x2010)), PhysAddr::at(0x6000_2010));

    pager::unmap(virt_addr, 0x3000);
    assert_eq!(pager::resolve(virt_addr), Err(Error::Fault));

    // logged, not fatal
    pager::unmap(VirtAddr::null(), 0x1000);

    assert_eq!(pager::init(&[]), Err(Error::AlreadyInitialised));
    pager::dump();
}

#[test]
#[should_panic]
fn map_rejects_empty_range() {
    pager::map(
        VirtAddr::at(0xb000_0000),
        PhysAddr::at(0x6000_0000),
        0,
        MapFlags::CACHE_NONE,
    );
}
