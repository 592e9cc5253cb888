// SPDX-License-Identifier: Unlicense

//! Short-descriptor translation tables for 32-bit ARMv7-A kernels.
//!
//! Identity maps the kernel image and the board's regions at boot, then maps
//! and unmaps 4KB pages on request from the kernel's memory manager.

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

#[macro_use]
extern crate log;

#[macro_use]
extern crate claim;

pub mod archs;
pub mod debug;
#[cfg(target_arch = "arm")]
mod device;
pub mod pager;
mod panic;
pub mod util;

pub use util::result::{Error, Result};

use pager::MappingRegion;

/// Bring up logging, then map the kernel and enable translation.
pub fn boot(platform: &[MappingRegion]) -> Result<()> {
    debug::init()?;
    pager::init(platform)
}
