//! Error taxonomy shared by every layer of the engine.
//!
//! All failures are recoverable and returned as values; nothing in the
//! engine panics on bad input.

use serde::Serialize;

/// Errors produced by the address codec, network calculator, classifier and
/// batch analyzer.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message")]
pub enum EngineError {
    /// Malformed address text (bad hex group, misplaced `::`, bad zone id).
    #[error("format error: {0}")]
    Format(String),
    /// Prefix length or zone index out of bounds, or a missing prefix.
    #[error("range error: {0}")]
    Range(String),
    /// Wrong argument shape (not a string, not a list of strings, inverted range).
    #[error("input error: {0}")]
    Input(String),
}

impl EngineError {
    pub fn format(msg: impl Into<String>) -> Self {
        EngineError::Format(msg.into())
    }

    pub fn range(msg: impl Into<String>) -> Self {
        EngineError::Range(msg.into())
    }

    pub fn input(msg: impl Into<String>) -> Self {
        EngineError::Input(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            EngineError::format("bad group 'xyz'").to_string(),
            "format error: bad group 'xyz'"
        );
        assert_eq!(
            EngineError::range("prefix 129 > 128").to_string(),
            "range error: prefix 129 > 128"
        );
    }

    #[test]
    fn test_serialize_tagged() {
        let json = serde_json::to_string(&EngineError::input("not a list")).unwrap();
        assert_eq!(json, r#"{"kind":"Input","message":"not a list"}"#);
    }
}
