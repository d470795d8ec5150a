//! IPv6 address canonicalization and CIDR overlap analysis.
//!
//! Layers, leaf to root: [`models`] (address codec and network calculator),
//! [`processing`] (overlap classifier, suggestion, batch analysis), [`cache`]
//! and the [`Engine`] that ties them together for presentation layers.

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod output;
pub mod processing;

pub use engine::{validate, Engine, ValidationReport};
pub use error::EngineError;

/// Collect prefixes from line oriented input, skipping blanks and `#` comments.
pub fn read_prefix_lines(input: &str) -> Vec<String> {
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_prefix_lines() {
        let input = "# office\n2001:db8::/32\n\n  2001:db8:1::/48  \n#2001:db8:2::/48\n";
        assert_eq!(
            read_prefix_lines(input),
            vec!["2001:db8::/32", "2001:db8:1::/48"]
        );
    }
}
