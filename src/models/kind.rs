//! Address type and scope classification.

use super::address::Address128;
use super::network::get_cidr_mask;
use serde::Serialize;
use std::fmt;

/// Well-known IPv6 address categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressType {
    Unspecified,
    Loopback,
    Ipv4Mapped,
    Multicast,
    LinkLocal,
    /// Deprecated `fec0::/10` block.
    SiteLocal,
    UniqueLocal,
    Documentation,
    GlobalUnicast,
    Reserved,
}

/// Reach of an address, following the multicast scope field where present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressScope {
    Interface,
    Link,
    Admin,
    Site,
    Organization,
    Global,
    Reserved,
}

impl fmt::Display for AddressType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            AddressType::Unspecified => "Unspecified",
            AddressType::Loopback => "Loopback",
            AddressType::Ipv4Mapped => "IPv4-Mapped",
            AddressType::Multicast => "Multicast",
            AddressType::LinkLocal => "Link-Local Unicast",
            AddressType::SiteLocal => "Site-Local Unicast (deprecated)",
            AddressType::UniqueLocal => "Unique Local Unicast",
            AddressType::Documentation => "Documentation",
            AddressType::GlobalUnicast => "Global Unicast",
            AddressType::Reserved => "Reserved",
        };
        f.write_str(name)
    }
}

impl fmt::Display for AddressScope {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            AddressScope::Interface => "Interface",
            AddressScope::Link => "Link",
            AddressScope::Admin => "Admin",
            AddressScope::Site => "Site",
            AddressScope::Organization => "Organization",
            AddressScope::Global => "Global",
            AddressScope::Reserved => "Reserved",
        };
        f.write_str(name)
    }
}

fn in_block(addr: Address128, base: u128, len: u8) -> bool {
    let mask = get_cidr_mask(len).unwrap_or(u128::MAX);
    addr.value() & mask == base
}

fn multicast_scope(addr: Address128) -> AddressScope {
    match (addr.value() >> 112) & 0xf {
        0x1 => AddressScope::Interface,
        0x2 => AddressScope::Link,
        0x4 => AddressScope::Admin,
        0x5 => AddressScope::Site,
        0x8 => AddressScope::Organization,
        0xe => AddressScope::Global,
        _ => AddressScope::Reserved,
    }
}

/// Classify an address by the first well-known block it falls in.
pub fn classify_address(addr: Address128) -> (AddressType, AddressScope) {
    match addr.value() {
        0 => return (AddressType::Unspecified, AddressScope::Interface),
        1 => return (AddressType::Loopback, AddressScope::Interface),
        _ => {}
    }
    if in_block(addr, 0xffff_0000_0000, 96) {
        (AddressType::Ipv4Mapped, AddressScope::Global)
    } else if in_block(addr, 0xff << 120, 8) {
        (AddressType::Multicast, multicast_scope(addr))
    } else if in_block(addr, 0xfe80 << 112, 10) {
        (AddressType::LinkLocal, AddressScope::Link)
    } else if in_block(addr, 0xfec0 << 112, 10) {
        (AddressType::SiteLocal, AddressScope::Site)
    } else if in_block(addr, 0xfc00 << 112, 7) {
        (AddressType::UniqueLocal, AddressScope::Site)
    } else if in_block(addr, 0x2001_0db8 << 96, 32) {
        (AddressType::Documentation, AddressScope::Global)
    } else if in_block(addr, 0x2000 << 112, 3) {
        (AddressType::GlobalUnicast, AddressScope::Global)
    } else {
        (AddressType::Reserved, AddressScope::Reserved)
    }
}
