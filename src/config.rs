//! Engine configuration, read from the environment (and a `.env` file when
//! the binary loads one with `dotenv`).

use crate::cache::{DEFAULT_CAPACITY, DEFAULT_TTL_SECS};
use crate::processing::{DEFAULT_PRECISION, MAX_PRECISION};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const ENV_CACHE_TTL_SECS: &str = "IPV6_CACHE_TTL_SECS";
pub const ENV_CACHE_CAPACITY: &str = "IPV6_CACHE_CAPACITY";
pub const ENV_PERCENT_PRECISION: &str = "IPV6_PERCENT_PRECISION";
pub const ENV_OUTPUT: &str = "IPV6_OUTPUT";

/// How the binary renders a batch report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Csv,
    Json,
    #[default]
    Terminal,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            "terminal" | "term" => Ok(OutputFormat::Terminal),
            other => Err(format!("unknown output format '{other}'")),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
            OutputFormat::Terminal => "terminal",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Seconds a cached result stays valid.
    pub cache_ttl_secs: i64,
    /// Entries kept per cache layer before eviction.
    pub cache_capacity: usize,
    /// Decimal places on `percentage_of_smaller`.
    pub percent_precision: u32,
    pub output: OutputFormat,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            cache_ttl_secs: DEFAULT_TTL_SECS,
            cache_capacity: DEFAULT_CAPACITY,
            percent_precision: DEFAULT_PRECISION,
            output: OutputFormat::default(),
        }
    }
}

impl EngineConfig {
    /// Build from `IPV6_*` environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any name -> value lookup. Unparseable values are logged and
    /// replaced by the default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = EngineConfig::default();
        let config = EngineConfig {
            cache_ttl_secs: read_value(&lookup, ENV_CACHE_TTL_SECS, defaults.cache_ttl_secs)
                .max(0),
            cache_capacity: read_value(&lookup, ENV_CACHE_CAPACITY, defaults.cache_capacity)
                .max(1),
            percent_precision: read_value(
                &lookup,
                ENV_PERCENT_PRECISION,
                defaults.percent_precision,
            )
            .min(MAX_PRECISION),
            output: read_value(&lookup, ENV_OUTPUT, defaults.output),
        };
        log::debug!("EngineConfig {config:?}");
        config
    }
}

fn read_value<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + fmt::Display,
    T::Err: fmt::Display,
{
    match lookup(name) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|e| {
            log::warn!("Ignoring {name}={raw}: {e}, using default {default}");
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = EngineConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.cache_ttl_secs, 300);
        assert_eq!(config.cache_capacity, 1000);
        assert_eq!(config.percent_precision, 2);
        assert_eq!(config.output, OutputFormat::Terminal);
    }

    #[test]
    fn test_from_lookup() {
        let config = EngineConfig::from_lookup(lookup_from(&[
            (ENV_CACHE_TTL_SECS, "30"),
            (ENV_CACHE_CAPACITY, " 50 "),
            (ENV_PERCENT_PRECISION, "4"),
            (ENV_OUTPUT, "CSV"),
        ]));
        assert_eq!(config.cache_ttl_secs, 30);
        assert_eq!(config.cache_capacity, 50);
        assert_eq!(config.percent_precision, 4);
        assert_eq!(config.output, OutputFormat::Csv);
    }

    #[test]
    fn test_bad_values_fall_back() {
        let config = EngineConfig::from_lookup(lookup_from(&[
            (ENV_CACHE_TTL_SECS, "soon"),
            (ENV_CACHE_CAPACITY, "0"),
            (ENV_PERCENT_PRECISION, "12"),
            (ENV_OUTPUT, "xml"),
        ]));
        assert_eq!(config.cache_ttl_secs, 300);
        assert_eq!(config.cache_capacity, 1);
        assert_eq!(config.percent_precision, MAX_PRECISION);
        assert_eq!(config.output, OutputFormat::Terminal);
    }

    #[test]
    fn test_serde_partial() {
        let config: EngineConfig = serde_json::from_str(r#"{"output":"json"}"#).unwrap();
        assert_eq!(config.output, OutputFormat::Json);
        assert_eq!(config.cache_capacity, DEFAULT_CAPACITY);
    }
}
