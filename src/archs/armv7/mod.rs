// SPDX-License-Identifier: Unlicense

//! ARMv7-A with short-descriptor translation tables.

pub mod pager;
pub mod regs;

/// Live hardware abstraction layer for the target.
#[cfg(target_arch = "arm")]
mod hal;

#[cfg(target_arch = "arm")]
pub use hal::Arch;

pub use pager::PageDirectory;
