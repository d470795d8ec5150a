//! Domain models for IPv6 overlap analysis.
//!
//! This module contains the core data structures and the codec/calculator
//! functions built on them:
//! - [`Address128`] - 128-bit address value and the text codec
//! - [`NetworkRange`] - prefix-aligned block with base, last address and mask
//! - [`AddressType`] and [`AddressScope`] - well-known block classification

mod address;
mod kind;
mod network;

// Re-export public types
pub use address::{
    compress, expand, format_compressed, format_expanded, from_integer, parse, to_integer,
    Address128, ParsedAddress, GROUP_COUNT, MAX_LENGTH,
};
pub use kind::{classify_address, AddressScope, AddressType};
pub use network::{
    compute_range, get_cidr_mask, parse_network, AddressBounds, AddressCount, AddressSpan,
    NetworkRange,
};
