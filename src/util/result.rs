// SPDX-License-Identifier: Unlicense

//! Uniform structure for errors and results.

/// Specified errors.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Error {
    /// Argument is null, empty or out of the 32-bit address space
    InvalidArgument,
    /// Address has no valid translation
    Fault,
    /// Component has already been initialised
    AlreadyInitialised,
}

/// Default error type for kernel functions.
pub type Result<T> = core::result::Result<T, Error>;
