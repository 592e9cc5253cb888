// SPDX-License-Identifier: Unlicense

//! Unifies the CPU-architecture specific code for the supported CPU's.
//!
//! The translation table logic is portable and always built, so it can be
//! unit tested on the host against a mock CPU. Only the ARMv7 target links
//! the live hardware abstraction layer.
//!
//! The target architecture for the build is usable at archs::arch

mod handler;
mod pager;

pub use handler::*;
pub use pager::*;

/// A mock architecture for use during unit testing.
#[cfg(any(test, not(target_arch = "arm")))]
pub mod test;

/// ARM architecture v7-A (32-bit), short-descriptor translation tables
pub mod armv7;

// publish the target arch at Arch
#[cfg(any(test, not(target_arch = "arm")))]
pub use test as arch;

#[cfg(all(not(test), target_arch = "arm"))]
pub use armv7 as arch;
