//! Network range calculations for IPv6 CIDR blocks.
//!
//! Provides [`NetworkRange`] (a prefix-aligned block), [`AddressSpan`] (an
//! arbitrary inclusive interval) and [`AddressCount`] for exact sizes up to
//! and including 2^128.

use super::address::{parse, Address128, ParsedAddress, MAX_LENGTH};
use crate::error::EngineError;
use serde::de;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Exact decimal text of 2^128, the size of the whole address space.
const FULL_SPACE_DECIMAL: &str = "340282366920938463463374607431768211456";

/// Convert a prefix length to a 128-bit network mask.
///
/// # Examples
/// ```
/// use ipv6_overlap_engine::models::get_cidr_mask;
/// assert_eq!(get_cidr_mask(16).unwrap(), 0xffff << 112);
/// ```
pub fn get_cidr_mask(len: u8) -> Result<u128, EngineError> {
    if len > MAX_LENGTH {
        Err(EngineError::range(format!(
            "prefix length {len} is out of range 0-128"
        )))
    } else if len == 0 {
        Ok(0)
    } else {
        Ok(u128::MAX << (MAX_LENGTH - len))
    }
}

/// Host bits for a prefix length, i.e. `2^(128 - len) - 1`.
fn host_span(len: u8) -> u128 {
    if len == 0 {
        u128::MAX
    } else {
        (1u128 << (MAX_LENGTH - len)) - 1
    }
}

/// Exact number of addresses in a non-empty range.
///
/// Stored as `count - 1` so that the full space (2^128) is representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AddressCount {
    span: u128,
}

impl AddressCount {
    pub const ONE: AddressCount = AddressCount { span: 0 };
    pub const FULL: AddressCount = AddressCount { span: u128::MAX };

    /// Count of the inclusive interval whose `last - first` equals `span`.
    pub const fn from_span(span: u128) -> Self {
        AddressCount { span }
    }

    /// Number of addresses in a block with the given prefix length.
    pub fn from_prefix(len: u8) -> Result<Self, EngineError> {
        get_cidr_mask(len)?;
        Ok(AddressCount {
            span: host_span(len),
        })
    }

    pub fn span(&self) -> u128 {
        self.span
    }

    /// The count as an integer, `None` only for the full 2^128 space.
    pub fn get(&self) -> Option<u128> {
        self.span.checked_add(1)
    }

    /// `Some(n)` when the count is exactly `2^n`.
    pub fn log2(&self) -> Option<u32> {
        match self.get() {
            None => Some(128),
            Some(count) if count.is_power_of_two() => Some(count.trailing_zeros()),
            Some(_) => None,
        }
    }

    pub fn as_f64(&self) -> f64 {
        self.span as f64 + 1.0
    }

    /// Short display form: exact below one billion, `2^n` for large powers of
    /// two, scientific notation otherwise.
    pub fn approx(&self) -> String {
        match (self.get(), self.log2()) {
            (Some(count), _) if count < 1_000_000_000 => count.to_string(),
            (_, Some(bits)) if bits >= 32 => format!("2^{bits}"),
            _ => format!("{:.2e}", self.as_f64()),
        }
    }
}

impl fmt::Display for AddressCount {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.get() {
            Some(count) => write!(f, "{count}"),
            None => f.write_str(FULL_SPACE_DECIMAL),
        }
    }
}

impl Serialize for AddressCount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.collect_str(self)
    }
}

/// Anything with an inclusive first/last address pair can be compared.
pub trait AddressBounds: fmt::Display {
    fn first(&self) -> Address128;
    fn last(&self) -> Address128;

    fn count(&self) -> AddressCount {
        AddressCount::from_span(self.last().value().wrapping_sub(self.first().value()))
    }
}

/// Inclusive interval `[first, last]` that need not be prefix aligned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct AddressSpan {
    first: Address128,
    last: Address128,
}

impl AddressSpan {
    pub fn new(first: Address128, last: Address128) -> Result<Self, EngineError> {
        if first > last {
            return Err(EngineError::input(format!(
                "range start {first} is above range end {last}"
            )));
        }
        Ok(AddressSpan { first, last })
    }
}

impl AddressBounds for AddressSpan {
    fn first(&self) -> Address128 {
        self.first
    }

    fn last(&self) -> Address128 {
        self.last
    }
}

impl fmt::Display for AddressSpan {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}-{}", self.first, self.last)
    }
}

/// A prefix-aligned IPv6 block.
///
/// Invariants: `base = address & mask(prefix_len)` and
/// `last = base + 2^(128 - prefix_len) - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NetworkRange {
    base: Address128,
    last: Address128,
    prefix_len: u8,
}

impl NetworkRange {
    /// Build the block of length `prefix_len` that contains `addr`.
    pub fn new(addr: Address128, prefix_len: u8) -> Result<Self, EngineError> {
        let mask = get_cidr_mask(prefix_len)?;
        let base = addr.value() & mask;
        Ok(NetworkRange {
            base: Address128::new(base),
            last: Address128::new(base | !mask),
            prefix_len,
        })
    }

    pub fn base(&self) -> Address128 {
        self.base
    }

    pub fn last(&self) -> Address128 {
        self.last
    }

    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    pub fn mask(&self) -> u128 {
        get_cidr_mask(self.prefix_len).unwrap_or(0)
    }

    pub fn host_count(&self) -> AddressCount {
        AddressCount::from_span(host_span(self.prefix_len))
    }

    pub fn contains(&self, addr: Address128) -> bool {
        self.base <= addr && addr <= self.last
    }

    pub fn span(&self) -> AddressSpan {
        AddressSpan {
            first: self.base,
            last: self.last,
        }
    }
}

impl AddressBounds for NetworkRange {
    fn first(&self) -> Address128 {
        self.base
    }

    fn last(&self) -> Address128 {
        self.last
    }

    fn count(&self) -> AddressCount {
        self.host_count()
    }
}

impl fmt::Display for NetworkRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.prefix_len)
    }
}

impl FromStr for NetworkRange {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_network(s)
    }
}

impl Serialize for NetworkRange {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for NetworkRange {
    fn deserialize<D>(deserializer: D) -> Result<NetworkRange, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_network(&s).map_err(|e| de::Error::custom(format!("invalid CIDR {s}: {e}")))
    }
}

/// Compute the network range of a parsed address.
///
/// Fails with a range error when no prefix length was given.
pub fn compute_range(parsed: &ParsedAddress) -> Result<NetworkRange, EngineError> {
    let len = parsed.prefix.ok_or_else(|| {
        EngineError::range(format!("missing prefix length in {}", parsed.original.trim()))
    })?;
    NetworkRange::new(parsed.addr, len)
}

/// Parse CIDR text straight into its network range.
pub fn parse_network(text: &str) -> Result<NetworkRange, EngineError> {
    compute_range(&parse(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::to_integer;

    #[test]
    fn test_get_cidr_mask() {
        assert_eq!(get_cidr_mask(0).unwrap(), 0);
        assert_eq!(get_cidr_mask(1).unwrap(), 1u128 << 127);
        assert_eq!(get_cidr_mask(64).unwrap(), (u64::MAX as u128) << 64);
        assert_eq!(get_cidr_mask(128).unwrap(), u128::MAX);
        assert!(matches!(get_cidr_mask(129), Err(EngineError::Range(_))));
        // same as ((1 << len) - 1) << (128 - len)
        for len in 1..128u8 {
            let expected = ((1u128 << len) - 1) << (128 - len);
            assert_eq!(get_cidr_mask(len).unwrap(), expected, "mask /{len}");
        }
    }

    #[test]
    fn test_compute_range() {
        let range = parse_network("2001:db8:a::1/64").unwrap();
        assert_eq!(range.base(), to_integer("2001:db8:a::").unwrap());
        assert_eq!(range.last(), to_integer("2001:db8:a:0:ffff:ffff:ffff:ffff").unwrap());
        assert_eq!(range.prefix_len(), 64);
        assert_eq!(range.to_string(), "2001:db8:a::/64");
        assert_eq!(range.host_count().get(), Some(1u128 << 64));
        assert!(range.contains(to_integer("2001:db8:a::dead").unwrap()));
        assert!(!range.contains(to_integer("2001:db8:b::").unwrap()));
    }

    #[test]
    fn test_compute_range_edges() {
        let all = parse_network("::/0").unwrap();
        assert_eq!(all.base(), Address128::ZERO);
        assert_eq!(all.last(), Address128::MAX);
        assert_eq!(all.host_count(), AddressCount::FULL);
        assert_eq!(all.host_count().get(), None);
        assert_eq!(all.mask(), 0);

        let host = parse_network("2001:db8::7/128").unwrap();
        assert_eq!(host.base(), host.last());
        assert_eq!(host.host_count(), AddressCount::ONE);
    }

    #[test]
    fn test_compute_range_missing_prefix() {
        assert!(matches!(
            parse_network("2001:db8::1"),
            Err(EngineError::Range(_))
        ));
        assert!(matches!(
            parse_network("2001:db8::1/abc"),
            Err(EngineError::Format(_))
        ));
    }

    #[test]
    fn test_address_count_display() {
        assert_eq!(AddressCount::FULL.to_string(), FULL_SPACE_DECIMAL);
        assert_eq!(AddressCount::FULL.approx(), "2^128");
        assert_eq!(AddressCount::from_prefix(64).unwrap().approx(), "2^64");
        assert_eq!(AddressCount::from_prefix(120).unwrap().approx(), "256");
        assert_eq!(AddressCount::from_span(41).approx(), "42");
        assert_eq!(AddressCount::from_span(2_999_999_999).approx(), "3.00e9");
        assert_eq!(
            AddressCount::from_prefix(64).unwrap().to_string(),
            "18446744073709551616"
        );
        assert!(AddressCount::from_prefix(129).is_err());
    }

    #[test]
    fn test_address_span() {
        let span = AddressSpan::new(Address128::new(0), Address128::new(10)).unwrap();
        assert_eq!(span.count().get(), Some(11));
        assert_eq!(span.to_string(), "::-::a");
        assert!(matches!(
            AddressSpan::new(Address128::new(5), Address128::new(1)),
            Err(EngineError::Input(_))
        ));
    }

    #[test]
    fn test_serde_cidr() {
        let range = parse_network("2001:db8::/32").unwrap();
        let json = serde_json::to_string(&range).unwrap();
        assert_eq!(json, "\"2001:db8::/32\"");
        let back: NetworkRange = serde_json::from_str(&json).unwrap();
        assert_eq!(back, range);
        assert_eq!(
            serde_json::to_string(&AddressCount::FULL).unwrap(),
            format!("\"{FULL_SPACE_DECIMAL}\"")
        );
    }
}
