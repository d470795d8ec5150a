//! The engine API consumed by presentation layers.
//!
//! [`Engine`] owns the result caches and exposes the synchronous calls a UI
//! may make: validate, check_overlap, suggest_alternative, analyze_batch and
//! the cache controls. Every call returns structured data for rendering.

use crate::cache::{CacheStats, ResultCache};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::models::{
    classify_address, compute_range, format_compressed, format_expanded, parse, parse_network,
    AddressCount, AddressScope, AddressType, NetworkRange,
};
use crate::processing::{
    analyze_with, classify_with_precision, entries_from_value, suggest, BatchReport,
    OverlapResult,
};
use chrono::Duration;
use serde::Serialize;
use std::sync::atomic::AtomicBool;

/// Everything a UI shows for one address or CIDR input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub input: String,
    pub valid: bool,
    #[serde(rename = "type")]
    pub address_type: Option<AddressType>,
    pub scope: Option<AddressScope>,
    pub expanded: Option<String>,
    pub compressed: Option<String>,
    pub prefix: Option<u8>,
    pub zone: Option<String>,
    /// Network block, when a prefix length was given.
    pub network: Option<NetworkRange>,
    pub host_count: Option<AddressCount>,
    /// Short form of `host_count` such as `2^64`.
    pub host_count_display: Option<String>,
    pub errors: Vec<EngineError>,
}

impl ValidationReport {
    fn invalid(input: &str, error: EngineError) -> Self {
        ValidationReport {
            input: input.to_string(),
            valid: false,
            address_type: None,
            scope: None,
            expanded: None,
            compressed: None,
            prefix: None,
            zone: None,
            network: None,
            host_count: None,
            host_count_display: None,
            errors: vec![error],
        }
    }
}

/// Validate one address or CIDR without any caching.
pub fn validate(text: &str) -> ValidationReport {
    let parsed = match parse(text) {
        Ok(parsed) => parsed,
        Err(e) => return ValidationReport::invalid(text, e),
    };
    let (address_type, scope) = classify_address(parsed.addr);
    let network = match parsed.prefix {
        Some(_) => compute_range(&parsed).ok(),
        None => None,
    };
    let host_count = network.map(|n| n.host_count());

    ValidationReport {
        input: text.to_string(),
        valid: true,
        address_type: Some(address_type),
        scope: Some(scope),
        expanded: Some(format_expanded(parsed.addr)),
        compressed: Some(format_compressed(parsed.addr)),
        prefix: parsed.prefix,
        zone: parsed.zone,
        network,
        host_count,
        host_count_display: host_count.map(|c| c.approx()),
        errors: vec![],
    }
}

type OverlapKey = (NetworkRange, NetworkRange, u32);

/// Owns the caches; construct once and share by reference.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    validations: ResultCache<String, ValidationReport>,
    networks: ResultCache<String, Result<NetworkRange, EngineError>>,
    overlaps: ResultCache<OverlapKey, Result<OverlapResult, EngineError>>,
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new(EngineConfig::default())
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let ttl = Duration::try_seconds(config.cache_ttl_secs).unwrap_or(Duration::MAX);
        let capacity = config.cache_capacity;
        log::debug!("Engine::new ttl={ttl} capacity={capacity}");
        Engine {
            config,
            validations: ResultCache::new(ttl, capacity),
            networks: ResultCache::new(ttl, capacity),
            overlaps: ResultCache::new(ttl, capacity),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn validate(&self, text: &str) -> ValidationReport {
        let key = text.trim().to_string();
        self.validations.memoize(key.clone(), || validate(&key))
    }

    /// Parse CIDR text into its network range, through the cache.
    pub fn network(&self, text: &str) -> Result<NetworkRange, EngineError> {
        self.networks
            .memoize(text.trim().to_string(), || parse_network(text))
    }

    fn compare(&self, a: &NetworkRange, b: &NetworkRange) -> Result<OverlapResult, EngineError> {
        let precision = self.config.percent_precision;
        self.overlaps.memoize((*a, *b, precision), || {
            classify_with_precision(a, b, precision)
        })
    }

    pub fn check_overlap(&self, cidr_a: &str, cidr_b: &str) -> Result<OverlapResult, EngineError> {
        let a = self.network(cidr_a)?;
        let b = self.network(cidr_b)?;
        self.compare(&a, &b)
    }

    /// Suggest a block of the conflicting size next to the anchor, as CIDR text.
    pub fn suggest_alternative(
        &self,
        conflicting: &str,
        anchor: &str,
    ) -> Result<Option<String>, EngineError> {
        let conflicting = self.network(conflicting)?;
        let anchor = self.network(anchor)?;
        Ok(suggest(&conflicting, &anchor)?.map(|range| range.to_string()))
    }

    pub fn analyze_batch<S: AsRef<str>>(&self, entries: &[S]) -> BatchReport {
        analyze_with(
            entries,
            |text| self.network(text),
            |a, b| self.compare(a, b),
            None,
        )
    }

    /// Like [`analyze_batch`](Self::analyze_batch), stopping early once
    /// `cancel` is set.
    pub fn analyze_batch_cancellable<S: AsRef<str>>(
        &self,
        entries: &[S],
        cancel: &AtomicBool,
    ) -> BatchReport {
        analyze_with(
            entries,
            |text| self.network(text),
            |a, b| self.compare(a, b),
            Some(cancel),
        )
    }

    /// Analyze untyped JSON input; fails only when it is not a list of strings.
    pub fn analyze_batch_value(&self, value: &serde_json::Value) -> Result<BatchReport, EngineError> {
        let entries = entries_from_value(value)?;
        Ok(self.analyze_batch(entries.as_slice()))
    }

    pub fn clear_cache(&self) {
        self.validations.clear();
        self.networks.clear();
        self.overlaps.clear();
    }

    /// Combined statistics over every cache layer.
    pub fn cache_stats(&self) -> CacheStats {
        self.validations.stats() + self.networks.stats() + self.overlaps.stats()
    }
}
