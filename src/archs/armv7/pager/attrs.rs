// SPDX-License-Identifier: Unlicense

//! Translation of requested attributes into descriptor permission fields.

use crate::pager::{AttributeField, Attributes};

/// Domain of normal memory.
pub const DOMAIN_OS: u8 = 0;
/// Domain of device and strongly-ordered memory.
pub const DOMAIN_DEVICE: u8 = 1;

/// APX: writes disabled at every privilege level.
pub const ACC_DISABLE_WRITE: u8 = 0b10;
/// AP[1]: unprivileged accesses permitted.
pub const ACC_ENABLE_PL0: u8 = 0b01;

/// Descriptor-level fields common to sections and small pages.
///
/// Produced once per mapping request and shared by every descriptor it
/// writes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PermAttrs {
    /// TEX[2:0]; bit 2 set for cacheable normal memory with the outer policy below.
    pub tex: u8,
    /// C bit.
    pub cacheable: bool,
    /// B bit.
    pub bufferable: bool,
    /// S bit.
    pub shared: bool,
    /// Domain number.
    pub domain: u8,
    /// APX in bit 1, AP[1] in bit 0.
    pub acc_perms: u8,
    /// XN bit.
    pub exec_never: bool,
    /// ANDed into the descriptor type so unreadable mappings stay invalid.
    pub id_mask: u8,
    /// NS bit.
    pub non_sec: bool,
    /// nG bit.
    pub not_global: bool,
}

/// Encoding of a cache policy in two bits, as used by TEX[1:0] and C:B.
fn policy_bits(
    attributes: Attributes,
    wb_alloc: AttributeField,
    wt: AttributeField,
    wb_no_alloc: AttributeField,
) -> u8 {
    if attributes.is_set(wb_alloc) {
        0b01
    } else if attributes.is_set(wt) {
        0b10
    } else if attributes.is_set(wb_no_alloc) {
        0b11
    } else {
        0b00
    }
}

impl From<Attributes> for PermAttrs {
    /// Panics if the attributes are contradictory.
    fn from(attributes: Attributes) -> Self {
        use AttributeField::*;

        let memory_types = [StronglyOrdered, Device, Normal]
            .iter()
            .filter(|field| attributes.is_set(**field))
            .count();
        assert_eq!(1, memory_types, "exactly one memory type: {:?}", attributes);
        assert!(
            attributes.is_set(Read) || !attributes.is_set(Write),
            "write without read: {:?}",
            attributes
        );
        assert!(
            !(attributes.is_set(Write) && attributes.is_set(Exec)),
            "write with exec: {:?}",
            attributes
        );

        let mut result = Self::default();

        if attributes.is_set(Normal) {
            let outer = policy_bits(
                attributes,
                OuterWriteBackAlloc,
                OuterWriteThrough,
                OuterWriteBackNoAlloc,
            );
            let inner = policy_bits(
                attributes,
                InnerWriteBackAlloc,
                InnerWriteThrough,
                InnerWriteBackNoAlloc,
            );
            result.tex = 0b100 | outer;
            result.cacheable = inner & 0b10 != 0;
            result.bufferable = inner & 0b01 != 0;
            result.shared = attributes.is_set(Shared);
            result.domain = DOMAIN_OS;
        } else if attributes.is_set(Device) {
            result.bufferable = true;
            result.shared = true;
            result.domain = DOMAIN_DEVICE;
        } else {
            // strongly-ordered memory is always shareable
            result.shared = true;
            result.domain = DOMAIN_DEVICE;
        }

        if !attributes.is_set(Write) {
            result.acc_perms |= ACC_DISABLE_WRITE;
        }
        if attributes.is_set(Unprivileged) {
            result.acc_perms |= ACC_ENABLE_PL0;
        }
        result.exec_never = !attributes.is_set(Exec);
        result.id_mask = if attributes.is_set(Read) { 0b11 } else { 0b00 };
        result.non_sec = attributes.is_set(NonSecure);
        result.not_global = attributes.is_set(NonGlobal);

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use AttributeField::*;

    #[test]
    fn kernel_data() {
        let perms = PermAttrs::from(Attributes::KERNEL_DATA);
        assert_eq!(0b101, perms.tex);
        assert!(!perms.cacheable);
        assert!(perms.bufferable);
        assert!(perms.shared);
        assert_eq!(DOMAIN_OS, perms.domain);
        assert_eq!(0, perms.acc_perms);
        assert!(perms.exec_never);
        assert_eq!(0b11, perms.id_mask);
    }

    #[test]
    fn kernel_code() {
        let perms = PermAttrs::from(Attributes::KERNEL_CODE);
        assert_eq!(ACC_DISABLE_WRITE, perms.acc_perms);
        assert!(!perms.exec_never);
    }

    #[test]
    fn write_through() {
        let perms = PermAttrs::from(Attributes::NORMAL_WT.set(Read));
        assert_eq!(0b110, perms.tex);
        assert!(perms.cacheable);
        assert!(!perms.bufferable);
    }

    #[test]
    fn device() {
        let perms = PermAttrs::from(Attributes::DEVICE);
        assert_eq!(0, perms.tex);
        assert!(!perms.cacheable);
        assert!(perms.bufferable);
        assert!(perms.shared);
        assert_eq!(DOMAIN_DEVICE, perms.domain);
    }

    #[test]
    fn strongly_ordered() {
        let perms = PermAttrs::from(Attributes::NOCACHE_DATA);
        assert_eq!(0, perms.tex);
        assert!(!perms.cacheable);
        assert!(!perms.bufferable);
        assert!(perms.shared);
        assert_eq!(DOMAIN_DEVICE, perms.domain);
    }

    #[test]
    fn unprivileged_non_secure() {
        let attributes = Attributes::NORMAL_WB | Read | Unprivileged | NonSecure | NonGlobal;
        let perms = PermAttrs::from(attributes);
        assert_eq!(ACC_DISABLE_WRITE | ACC_ENABLE_PL0, perms.acc_perms);
        assert!(perms.non_sec);
        assert!(perms.not_global);
    }

    #[test]
    fn no_access() {
        let perms = PermAttrs::from(Attributes::NORMAL_WB);
        assert_eq!(0, perms.id_mask);
    }

    #[test]
    #[should_panic]
    fn two_memory_types() {
        PermAttrs::from(Attributes::DEVICE | Normal);
    }

    #[test]
    #[should_panic]
    fn no_memory_type() {
        PermAttrs::from(Attributes::new() | Read);
    }

    #[test]
    #[should_panic]
    fn write_without_read() {
        PermAttrs::from(Attributes::NORMAL_WB | Write);
    }

    #[test]
    #[should_panic]
    fn write_and_exec() {
        PermAttrs::from(Attributes::KERNEL_DATA | Exec);
    }
}
