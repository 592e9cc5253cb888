// SPDX-License-Identifier: Unlicense

//! Typed views of descriptor and register words.
//!
//! A `Bitfield` is a plain integer in memory, read and written through the
//! `Field`s of a `register_bitfields!` definition rather than hand-written
//! masks and shifts.

pub use tock_registers::{fields::FieldValue, register_bitfields, UIntLike};

use tock_registers::{fields::Field, RegisterLongName};

use core::marker::PhantomData;

/// An in-memory bit struct that fits into an integer.
#[repr(transparent)]
pub struct Bitfield<T: UIntLike, R: RegisterLongName = ()> {
    value: T,
    associated_register: PhantomData<R>,
}

impl<T: UIntLike, R: RegisterLongName> Bitfield<T, R> {
    /// New bitfield with given raw value.
    pub const fn new(value: T) -> Self {
        Self {
            value,
            associated_register: PhantomData,
        }
    }

    /// Retrieve the raw value.
    #[inline]
    pub fn get(&self) -> T {
        self.value
    }

    /// Read a field.
    #[inline]
    pub fn read(&self, field: Field<T, R>) -> T {
        field.read(self.value)
    }

    /// Replace the fields named in `field`, keeping every other bit.
    #[inline]
    pub fn modify(&mut self, field: FieldValue<T, R>) {
        self.value = field.modify(self.value);
    }

    /// Determine if a field is non-zero.
    #[inline]
    pub fn is_set(&self, field: Field<T, R>) -> bool {
        self.read(field) != T::zero()
    }

    /// Determine if all of a set of specific fields hold the given values.
    #[inline]
    pub fn matches_all(&self, field: FieldValue<T, R>) -> bool {
        self.value & field.mask() == field.value
    }
}

impl<T: UIntLike, R: RegisterLongName> Clone for Bitfield<T, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: UIntLike, R: RegisterLongName> Copy for Bitfield<T, R> {}

impl<T: UIntLike, R: RegisterLongName> From<FieldValue<T, R>> for Bitfield<T, R> {
    fn from(field: FieldValue<T, R>) -> Self {
        Self::new(field.value)
    }
}
