//! IPv6 address text codec.
//!
//! Provides [`Address128`] for holding a 128-bit address value, along with
//! the parse / expand / compress functions that move between the textual
//! forms and the integer form.

use crate::error::EngineError;
use itertools::Itertools;
use lazy_static::lazy_static;
use regex::Regex;
use serde::de;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

/// Maximum length for an IPv6 prefix (128 bits).
pub const MAX_LENGTH: u8 = 128;

/// Number of 16-bit groups in a fully expanded address.
pub const GROUP_COUNT: usize = 8;

lazy_static! {
    static ref HEX_GROUP: Regex = Regex::new(r"^[0-9a-fA-F]{1,4}$").expect("Invalid Regex?");
    static ref ZONE_ID: Regex = Regex::new(r"^[A-Za-z0-9_.\-]+$").expect("Invalid Regex?");
}

/// Immutable 128-bit IPv6 address value.
#[derive(Eq, PartialEq, Ord, PartialOrd, Debug, Copy, Clone, Hash, Default)]
pub struct Address128(u128);

impl Address128 {
    pub const ZERO: Address128 = Address128(0);
    pub const MAX: Address128 = Address128(u128::MAX);

    pub const fn new(value: u128) -> Self {
        Address128(value)
    }

    pub const fn value(self) -> u128 {
        self.0
    }

    /// Split into the eight 16-bit groups, most significant first.
    pub fn groups(self) -> [u16; GROUP_COUNT] {
        let mut groups = [0u16; GROUP_COUNT];
        for (i, group) in groups.iter_mut().enumerate() {
            *group = (self.0 >> (112 - 16 * i)) as u16;
        }
        groups
    }

    pub fn from_groups(groups: [u16; GROUP_COUNT]) -> Self {
        Address128(
            groups
                .iter()
                .fold(0u128, |acc, group| (acc << 16) | u128::from(*group)),
        )
    }

    pub fn checked_add(self, rhs: u128) -> Option<Self> {
        self.0.checked_add(rhs).map(Address128)
    }

    pub fn checked_sub(self, rhs: u128) -> Option<Self> {
        self.0.checked_sub(rhs).map(Address128)
    }
}

impl From<u128> for Address128 {
    fn from(value: u128) -> Self {
        Address128(value)
    }
}

impl From<Ipv6Addr> for Address128 {
    fn from(addr: Ipv6Addr) -> Self {
        Address128(u128::from(addr))
    }
}

impl From<Address128> for Ipv6Addr {
    fn from(addr: Address128) -> Self {
        Ipv6Addr::from(addr.0)
    }
}

impl fmt::Display for Address128 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&format_compressed(*self))
    }
}

impl FromStr for Address128 {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        to_integer(s)
    }
}

impl Serialize for Address128 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address128 {
    fn deserialize<D>(deserializer: D) -> Result<Address128, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        to_integer(&s).map_err(|e| de::Error::custom(format!("invalid IPv6 address {s}: {e}")))
    }
}

/// Result of parsing `<address>[%zone][/<prefix>]`, optionally bracketed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedAddress {
    /// The text exactly as supplied.
    pub original: String,
    pub addr: Address128,
    /// Prefix length (0-128) when a `/len` suffix was given.
    pub prefix: Option<u8>,
    pub zone: Option<String>,
}

/// Parse a textual IPv6 address with optional zone id, brackets and prefix.
///
/// # Examples
/// ```
/// use ipv6_overlap_engine::models::parse;
/// let parsed = parse("[fe80::1%eth0]/64").unwrap();
/// assert_eq!(parsed.prefix, Some(64));
/// assert_eq!(parsed.zone.as_deref(), Some("eth0"));
/// ```
pub fn parse(text: &str) -> Result<ParsedAddress, EngineError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(EngineError::format("empty address"));
    }

    // "[2001:db8::/64]" wraps the whole CIDR; "[2001:db8::]/64" only the address
    let (unwrapped, wrapped) = match trimmed.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        Some(inner) => (inner, true),
        None => (trimmed, false),
    };
    let (addr_part, prefix) = split_prefix(unwrapped)?;
    // only one bracket pair is allowed
    let addr_part = if wrapped {
        if addr_part.contains(|c| c == '[' || c == ']') {
            return Err(EngineError::format(format!("nested brackets in {trimmed}")));
        }
        addr_part
    } else {
        strip_brackets(addr_part)?
    };
    let (addr_text, zone) = split_zone(addr_part)?;
    let groups = parse_groups(addr_text)?;

    log::trace!("parse({text}) groups={groups:?} prefix={prefix:?} zone={zone:?}");

    Ok(ParsedAddress {
        original: text.to_string(),
        addr: Address128::from_groups(groups),
        prefix,
        zone,
    })
}

/// Expand to the canonical 8-group form, e.g. `2001:0db8:0000:0000:0000:0000:0000:0001`.
///
/// Any prefix or zone on the input is dropped.
pub fn expand(text: &str) -> Result<String, EngineError> {
    Ok(format_expanded(parse(text)?.addr))
}

/// Compress to the canonical short form.
///
/// The longest run of two or more all-zero groups becomes `::` (leftmost run
/// wins a tie); leading zeros are stripped from every group.
pub fn compress(text: &str) -> Result<String, EngineError> {
    Ok(format_compressed(parse(text)?.addr))
}

pub fn to_integer(text: &str) -> Result<Address128, EngineError> {
    Ok(parse(text)?.addr)
}

/// Render an address value in expanded form.
pub fn from_integer(addr: Address128) -> String {
    format_expanded(addr)
}

pub fn format_expanded(addr: Address128) -> String {
    addr.groups().iter().map(|g| format!("{g:04x}")).join(":")
}

pub fn format_compressed(addr: Address128) -> String {
    let groups = addr.groups();
    let (start, len) = longest_zero_run(&groups);
    if len < 2 {
        return groups.iter().map(|g| format!("{g:x}")).join(":");
    }
    let head = groups[..start].iter().map(|g| format!("{g:x}")).join(":");
    let tail = groups[start + len..]
        .iter()
        .map(|g| format!("{g:x}"))
        .join(":");
    format!("{head}::{tail}")
}

/// Start and length of the leftmost longest run of zero groups.
fn longest_zero_run(groups: &[u16; GROUP_COUNT]) -> (usize, usize) {
    let (mut best_start, mut best_len) = (0, 0);
    let mut run_start = 0;
    let mut run_len = 0;
    for (i, group) in groups.iter().enumerate() {
        if *group == 0 {
            if run_len == 0 {
                run_start = i;
            }
            run_len += 1;
            if run_len > best_len {
                best_start = run_start;
                best_len = run_len;
            }
        } else {
            run_len = 0;
        }
    }
    (best_start, best_len)
}

fn split_prefix(text: &str) -> Result<(&str, Option<u8>), EngineError> {
    let Some((addr, prefix)) = text.rsplit_once('/') else {
        return Ok((text, None));
    };
    if addr.contains('/') {
        return Err(EngineError::format(format!("more than one '/' in {text}")));
    }
    if prefix.is_empty() {
        return Err(EngineError::format("missing prefix length after '/'"));
    }
    if !prefix.chars().all(|c| c.is_ascii_digit()) {
        return Err(EngineError::format(format!(
            "invalid prefix length '{prefix}'"
        )));
    }
    let len: u32 = prefix
        .parse()
        .map_err(|_| EngineError::range(format!("prefix length {prefix} is out of range 0-128")))?;
    if len > u32::from(MAX_LENGTH) {
        return Err(EngineError::range(format!(
            "prefix length {len} is out of range 0-128"
        )));
    }
    Ok((addr, Some(len as u8)))
}

fn strip_brackets(text: &str) -> Result<&str, EngineError> {
    match text.strip_prefix('[') {
        Some(rest) => rest
            .strip_suffix(']')
            .ok_or_else(|| EngineError::format(format!("unbalanced brackets in {text}"))),
        None if text.contains(|c| c == '[' || c == ']') => Err(EngineError::format(format!(
            "unbalanced brackets in {text}"
        ))),
        None => Ok(text),
    }
}

fn split_zone(text: &str) -> Result<(&str, Option<String>), EngineError> {
    let Some((addr, zone)) = text.split_once('%') else {
        return Ok((text, None));
    };
    if zone.is_empty() {
        return Err(EngineError::format("empty zone id after '%'"));
    }
    if !ZONE_ID.is_match(zone) {
        return Err(EngineError::format(format!("malformed zone id '{zone}'")));
    }
    if zone.chars().all(|c| c.is_ascii_digit()) && zone.parse::<u32>().is_err() {
        return Err(EngineError::range(format!(
            "zone index {zone} does not fit in 32 bits"
        )));
    }
    Ok((addr, Some(zone.to_string())))
}

fn parse_groups(text: &str) -> Result<[u16; GROUP_COUNT], EngineError> {
    if text.is_empty() {
        return Err(EngineError::format("empty address"));
    }
    if text.contains(":::") {
        return Err(EngineError::format(format!("':::' is not allowed in {text}")));
    }
    if text.matches("::").count() > 1 {
        return Err(EngineError::format(format!(
            "more than one '::' in {text}"
        )));
    }

    let mut groups = [0u16; GROUP_COUNT];
    match text.split_once("::") {
        None => {
            let parsed = parse_group_list(text, true)?;
            if parsed.len() != GROUP_COUNT {
                return Err(EngineError::format(format!(
                    "expected {GROUP_COUNT} groups, found {} in {text}",
                    parsed.len()
                )));
            }
            groups.copy_from_slice(&parsed);
        }
        Some((head, tail)) => {
            let head = parse_group_list(head, false)?;
            let tail = parse_group_list(tail, true)?;
            let total = head.len() + tail.len();
            if total > GROUP_COUNT {
                return Err(EngineError::format(format!(
                    "too many groups ({total}) in {text}"
                )));
            }
            // the zero groups implied by "::" stay in between
            groups[..head.len()].copy_from_slice(&head);
            groups[GROUP_COUNT - tail.len()..].copy_from_slice(&tail);
        }
    }
    Ok(groups)
}

/// Parse colon separated hex groups. A dotted IPv4 tail counts as two groups.
fn parse_group_list(text: &str, allow_ipv4_tail: bool) -> Result<Vec<u16>, EngineError> {
    if text.is_empty() {
        return Ok(vec![]);
    }
    let parts: Vec<&str> = text.split(':').collect();
    let mut groups = Vec::with_capacity(GROUP_COUNT);
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            return Err(EngineError::format(format!("empty group in {text}")));
        }
        if part.contains('.') {
            if !allow_ipv4_tail || i != parts.len() - 1 {
                return Err(EngineError::format(format!(
                    "embedded IPv4 '{part}' must be the last part of the address"
                )));
            }
            let v4 = Ipv4Addr::from_str(part)
                .map_err(|_| EngineError::format(format!("invalid embedded IPv4 '{part}'")))?;
            let bits = u32::from(v4);
            groups.push((bits >> 16) as u16);
            groups.push(bits as u16);
        } else if HEX_GROUP.is_match(part) {
            let group = u16::from_str_radix(part, 16)
                .map_err(|_| EngineError::format(format!("invalid hex group '{part}'")))?;
            groups.push(group);
        } else {
            return Err(EngineError::format(format!("invalid hex group '{part}'")));
        }
    }
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand() {
        assert_eq!(
            expand("2001:db8::1").unwrap(),
            "2001:0db8:0000:0000:0000:0000:0000:0001"
        );
        assert_eq!(
            expand("::").unwrap(),
            "0000:0000:0000:0000:0000:0000:0000:0000"
        );
        assert_eq!(
            expand("::1").unwrap(),
            "0000:0000:0000:0000:0000:0000:0000:0001"
        );
        assert_eq!(
            expand("fe80::").unwrap(),
            "fe80:0000:0000:0000:0000:0000:0000:0000"
        );
        assert_eq!(
            expand("2001:DB8:0:0:1:0:0:1").unwrap(),
            "2001:0db8:0000:0000:0001:0000:0000:0001"
        );
        // "::" standing for zero groups is tolerated
        assert_eq!(
            expand("1:2:3:4::5:6:7:8").unwrap(),
            "0001:0002:0003:0004:0005:0006:0007:0008"
        );
    }

    #[test]
    fn test_expand_idempotent() {
        for text in ["2001:db8::1", "::", "fe80::1:2", "1:0:0:2::3", "::ffff:192.0.2.1"] {
            let once = expand(text).unwrap();
            assert_eq!(expand(&once).unwrap(), once, "expand not idempotent for {text}");
        }
    }

    #[test]
    fn test_compress() {
        assert_eq!(
            compress("2001:0db8:0000:0000:0000:0000:0000:0001").unwrap(),
            "2001:db8::1"
        );
        assert_eq!(compress("0:0:0:0:0:0:0:0").unwrap(), "::");
        assert_eq!(compress("0:0:0:0:0:0:0:1").unwrap(), "::1");
        assert_eq!(compress("1:0:0:0:0:0:0:0").unwrap(), "1::");
        // single zero group is never compressed
        assert_eq!(
            compress("2001:db8:0:1:1:1:1:1").unwrap(),
            "2001:db8:0:1:1:1:1:1"
        );
        // longest run wins
        assert_eq!(compress("1:0:0:2:0:0:0:3").unwrap(), "1:0:0:2::3");
        // leftmost run wins a tie
        assert_eq!(compress("1:0:0:2:3:0:0:4").unwrap(), "1::2:3:0:0:4");
        assert_eq!(compress("0:0:1:2:3:4:0:0").unwrap(), "::1:2:3:4:0:0");
    }

    #[test]
    fn test_round_trip() {
        for text in [
            "2001:db8::1",
            "::",
            "::1",
            "fe80::",
            "2001:db8:0:1:1:1:1:1",
            "1::2:3:0:0:4",
            "ffff:ffff:ffff:ffff:ffff:ffff:ffff:ffff",
        ] {
            let expanded = expand(text).unwrap();
            assert_eq!(compress(&expanded).unwrap(), text);
            assert_eq!(
                to_integer(&expanded).unwrap(),
                to_integer(text).unwrap(),
                "integer mismatch for {text}"
            );
        }
    }

    #[test]
    fn test_integer_conversion() {
        let addr = to_integer("2001:db8::1").unwrap();
        assert_eq!(addr.value(), 0x2001_0db8_0000_0000_0000_0000_0000_0001);
        assert_eq!(from_integer(addr), "2001:0db8:0000:0000:0000:0000:0000:0001");
        assert_eq!(from_integer(Address128::MAX), "ffff:ffff:ffff:ffff:ffff:ffff:ffff:ffff");
        assert_eq!(
            Address128::from(Ipv6Addr::from_str("2001:db8::1").unwrap()),
            addr
        );
        assert_eq!(addr.to_string(), "2001:db8::1");
    }

    #[test]
    fn test_groups() {
        let addr = to_integer("1:2:3:4:5:6:7:8").unwrap();
        assert_eq!(addr.groups(), [1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(Address128::from_groups(addr.groups()), addr);
    }

    #[test]
    fn test_parse_prefix_zone_brackets() {
        let p = parse("2001:db8::/32").unwrap();
        assert_eq!(p.prefix, Some(32));
        assert_eq!(p.zone, None);
        assert_eq!(p.original, "2001:db8::/32");

        let p = parse("fe80::1%eth0").unwrap();
        assert_eq!(p.zone.as_deref(), Some("eth0"));
        assert_eq!(p.prefix, None);

        let p = parse("[fe80::1%en0]/64").unwrap();
        assert_eq!(p.zone.as_deref(), Some("en0"));
        assert_eq!(p.prefix, Some(64));
        assert_eq!(p.addr, to_integer("fe80::1").unwrap());

        let p = parse("[2001:db8::/48]").unwrap();
        assert_eq!(p.prefix, Some(48));

        let p = parse("  ::/0 ").unwrap();
        assert_eq!(p.prefix, Some(0));
        assert_eq!(parse("::1/128").unwrap().prefix, Some(128));
    }

    #[test]
    fn test_parse_embedded_ipv4() {
        let p = parse("::ffff:192.0.2.1").unwrap();
        assert_eq!(p.addr.value(), 0xffff_c000_0201);
        assert_eq!(compress("::ffff:192.0.2.1").unwrap(), "::ffff:c000:201");
        assert!(parse("::192.0.2.1:1").is_err());
        assert!(parse("::ffff:300.0.2.1").is_err());
    }

    #[test]
    fn test_parse_format_errors() {
        for bad in [
            "",
            "not-an-ip",
            "2001:db8:::1",
            "2001::db8::1",
            "2001:db8:g::1",
            "12345::1",
            "1:2:3:4:5:6:7",
            "1:2:3:4:5:6:7:8:9",
            "1:2:3:4:5::6:7:8:9",
            ":1:2:3:4:5:6:7",
            "1:2:3:4:5:6:7:",
            "2001:db8::/",
            "2001:db8::/abc",
            "2001:db8::/-1",
            "2001:db8::/32/48",
            "fe80::1%",
            "fe80::1%eth 0",
            "[2001:db8::1",
            "2001:db8::1]",
            "[[::1]]",
            "[[2001:db8::]/64]",
        ] {
            match parse(bad) {
                Err(EngineError::Format(_)) => {}
                other => panic!("expected format error for {bad:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_parse_range_errors() {
        for bad in ["2001:db8::/129", "::/999", "::/99999999999", "fe80::1%99999999999"] {
            match parse(bad) {
                Err(EngineError::Range(_)) => {}
                other => panic!("expected range error for {bad:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_serde_string() {
        let addr = to_integer("2001:db8::1").unwrap();
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, "\"2001:db8::1\"");
        let back: Address128 = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
        assert!(serde_json::from_str::<Address128>("\"nope\"").is_err());
    }
}
