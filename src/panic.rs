// SPDX-License-Identifier: Unlicense

//! Panic handling.

#[cfg(all(not(test), target_os = "none"))]
use crate::archs::{arch::Arch, HandlerTrait};

/// Log panic information and the translation tables, then hang.
#[cfg(all(not(test), target_os = "none"))]
#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    match info.location() {
        None => error!("Panic: {}", info),
        Some(loc) => error!("Panic: {} (at {}:{})", info, loc.file(), loc.line()),
    };

    crate::pager::dump();

    Arch::wait_forever()
}
