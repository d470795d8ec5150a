//! Suggest a non-conflicting block next to an anchor range.
//!
//! Tries exactly one same-size block above the anchor and, only when that
//! runs past the top of the address space, one block below it.

use super::overlap::classify;
use crate::error::EngineError;
use crate::models::{AddressCount, NetworkRange};

/// Suggest a block with the conflicting range's prefix length that sits
/// next to `anchor` without overlapping it.
///
/// Returns `Ok(None)` when neither attempt fits in the address space or the
/// candidate still overlaps the anchor.
///
/// # Examples
/// ```
/// use ipv6_overlap_engine::models::parse_network;
/// use ipv6_overlap_engine::processing::suggest;
/// let anchor = parse_network("2001:db8:a::/64").unwrap();
/// let next = suggest(&anchor, &anchor).unwrap().unwrap();
/// assert_eq!(next.to_string(), "2001:db8:a:1::/64");
/// ```
pub fn suggest(
    conflicting: &NetworkRange,
    anchor: &NetworkRange,
) -> Result<Option<NetworkRange>, EngineError> {
    let prefix_len = conflicting.prefix_len();
    // a /0 block is 2^128 wide and can never be moved
    let Some(increment) = AddressCount::from_prefix(prefix_len)?.get() else {
        log::debug!("suggest({conflicting}, {anchor}): block spans the whole space");
        return Ok(None);
    };

    let candidate_base = match anchor.base().checked_add(increment) {
        Some(base) => base,
        None => match anchor.base().checked_sub(increment) {
            Some(base) => base,
            None => {
                log::debug!("suggest({conflicting}, {anchor}): no room above or below");
                return Ok(None);
            }
        },
    };

    let candidate = NetworkRange::new(candidate_base, prefix_len)?;
    let check = classify(&candidate, anchor)?;
    if check.has_overlap {
        log::debug!(
            "suggest({conflicting}, {anchor}): candidate {candidate} still overlaps ({})",
            check.kind
        );
        return Ok(None);
    }
    log::debug!("suggest({conflicting}, {anchor}) -> {candidate}");
    Ok(Some(candidate))
}
