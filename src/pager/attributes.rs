// SPDX-License-Identifier: Unlicense

use core::fmt::{Debug, Formatter};

/// Flags for page attributes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AttributeField {
    /// Strongly-ordered memory consistency
    StronglyOrdered,
    /// Device memory, ordered but bufferable
    Device,
    /// Normal memory
    Normal,
    /// Readable
    Read,
    /// Writeable
    Write,
    /// Executable
    Exec,
    /// Accessible from unprivileged mode as well
    Unprivileged,
    /// Non-secure world
    NonSecure,
    /// Translation tagged with the current ASID
    NonGlobal,
    /// Coherent between observers
    Shared,
    /// Outer cache write-back, write-allocate
    OuterWriteBackAlloc,
    /// Outer cache write-through, no write-allocate
    OuterWriteThrough,
    /// Outer cache write-back, no write-allocate
    OuterWriteBackNoAlloc,
    /// Inner cache write-back, write-allocate
    InnerWriteBackAlloc,
    /// Inner cache write-through, no write-allocate
    InnerWriteThrough,
    /// Inner cache write-back, no write-allocate
    InnerWriteBackNoAlloc,
    /// Region may use 1MB section descriptors where aligned
    MayMapSection,
}

/// Bit flags for page attributes.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Attributes(u32);

impl Debug for Attributes {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "Attributes({:017b})", self.0)
    }
}

impl Attributes {
    /// Construct empty attributes.
    pub const fn new() -> Self {
        Self(0)
    }

    /// Read the presence of a specific attribute flag.
    pub const fn is_set(self, field: AttributeField) -> bool {
        0 != (self.0 & (1 << (field as u32)))
    }

    /// Set a specific attribute flag so it will be read as present.
    pub const fn set(self, field: AttributeField) -> Self {
        Self(self.0 | (1 << (field as u32)))
    }

    /// Remove a specific attribute flag.
    pub const fn clear(self, field: AttributeField) -> Self {
        Self(self.0 & !(1 << (field as u32)))
    }
}

impl Default for Attributes {
    fn default() -> Self {
        Self::new()
    }
}

impl core::ops::BitOr<AttributeField> for Attributes {
    type Output = Self;

    fn bitor(self, field: AttributeField) -> Attributes {
        self.set(field)
    }
}

use AttributeField::*;

impl Attributes {
    /// Write-back cacheable, shared normal memory.
    pub const NORMAL_WB: Attributes = Attributes::new()
        .set(Normal)
        .set(Shared)
        .set(OuterWriteBackAlloc)
        .set(InnerWriteBackAlloc);
    /// Write-through cacheable, shared normal memory.
    pub const NORMAL_WT: Attributes = Attributes::new()
        .set(Normal)
        .set(Shared)
        .set(OuterWriteThrough)
        .set(InnerWriteThrough);
    /// For kernel data, bss and noinit
    pub const KERNEL_DATA: Attributes = Attributes::NORMAL_WB
        .set(Read)
        .set(Write)
        .set(MayMapSection);
    /// For kernel code
    pub const KERNEL_CODE: Attributes = Attributes::NORMAL_WB
        .set(Read)
        .set(Exec)
        .set(MayMapSection);
    /// For kernel read-only data
    pub const KERNEL_RODATA: Attributes = Attributes::NORMAL_WB.set(Read).set(MayMapSection);
    /// For kernel data bypassing the caches
    pub const NOCACHE_DATA: Attributes = Attributes::new()
        .set(StronglyOrdered)
        .set(Read)
        .set(Write)
        .set(MayMapSection);
    /// For memory mapped devices
    pub const DEVICE: Attributes = Attributes::new().set(Device).set(Read).set(Write);
}

/// Cache policy requested through the runtime mapping interface.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CachePolicy {
    /// Uncached device access
    None,
    /// Write-through
    WriteThrough,
    /// Write-back
    WriteBack,
}

/// Flags accepted by `pager::map`, in the layout the kernel's memory manager uses.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct MapFlags(u32);

impl Debug for MapFlags {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "MapFlags({:#x})", self.0)
    }
}

impl MapFlags {
    /// Write-back caching.
    pub const CACHE_WB: MapFlags = MapFlags(0);
    /// Write-through caching.
    pub const CACHE_WT: MapFlags = MapFlags(1);
    /// No caching.
    pub const CACHE_NONE: MapFlags = MapFlags(2);
    /// Writeable as well as readable.
    pub const PERM_RW: MapFlags = MapFlags(1 << 3);
    /// Executable.
    pub const PERM_EXEC: MapFlags = MapFlags(1 << 4);

    const CACHE_MASK: u32 = (1 << 3) - 1;

    /// Flags from their raw encoding.
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw encoding.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// True if every flag in `other` is present.
    pub const fn contains(self, other: MapFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Requested caching; unknown encodings fall back to uncached.
    pub const fn cache_policy(self) -> CachePolicy {
        match self.0 & Self::CACHE_MASK {
            0 => CachePolicy::WriteBack,
            1 => CachePolicy::WriteThrough,
            _ => CachePolicy::None,
        }
    }
}

impl core::ops::BitOr for MapFlags {
    type Output = Self;

    fn bitor(self, other: MapFlags) -> MapFlags {
        MapFlags(self.0 | other.0)
    }
}

impl From<MapFlags> for Attributes {
    /// Runtime mappings are always readable; uncached means device memory.
    fn from(flags: MapFlags) -> Self {
        let mut attributes = match flags.cache_policy() {
            CachePolicy::None => Attributes::new().set(Device),
            CachePolicy::WriteBack => Attributes::NORMAL_WB,
            CachePolicy::WriteThrough => Attributes::NORMAL_WT,
        };
        attributes = attributes.set(Read);
        if flags.contains(MapFlags::PERM_RW) {
            attributes = attributes.set(Write);
        }
        if flags.contains(MapFlags::PERM_EXEC) {
            attributes = attributes.set(Exec);
        }
        attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_clear() {
        let attributes = Attributes::new() | Read | Write;
        assert!(attributes.is_set(Read));
        assert!(attributes.is_set(Write));
        assert!(!attributes.is_set(Exec));
        assert!(!attributes.clear(Write).is_set(Write));
        assert_eq!(Attributes::default(), Attributes::new());
    }

    #[test]
    fn presets() {
        assert!(Attributes::KERNEL_CODE.is_set(Exec));
        assert!(!Attributes::KERNEL_CODE.is_set(Write));
        assert!(Attributes::KERNEL_DATA.is_set(MayMapSection));
        assert!(!Attributes::DEVICE.is_set(MayMapSection));
    }

    #[test]
    fn cache_policy() {
        assert_eq!(CachePolicy::WriteBack, MapFlags::PERM_RW.cache_policy());
        assert_eq!(CachePolicy::WriteThrough, MapFlags::CACHE_WT.cache_policy());
        assert_eq!(CachePolicy::None, MapFlags::CACHE_NONE.cache_policy());
        assert_eq!(CachePolicy::None, MapFlags::from_bits(0b111).cache_policy());
    }

    #[test]
    fn from_map_flags() {
        let data = Attributes::from(MapFlags::CACHE_WB | MapFlags::PERM_RW);
        assert_eq!(data, Attributes::NORMAL_WB.set(Read).set(Write));

        let code = Attributes::from(MapFlags::CACHE_WT | MapFlags::PERM_EXEC);
        assert_eq!(code, Attributes::NORMAL_WT.set(Read).set(Exec));

        let device = Attributes::from(MapFlags::CACHE_NONE | MapFlags::PERM_RW);
        assert_eq!(device, Attributes::DEVICE);
    }
}
