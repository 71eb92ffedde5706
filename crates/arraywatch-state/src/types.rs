//! Status store records and key encoding.

use std::fmt;

use serde::{Deserialize, Serialize};

use arraywatch_core::Severity;

use crate::error::{StateError, StateResult};

/// One controller's last published status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoreEntry {
    /// Raw status code. Normally `0..=3`, see [`Severity::from_code`].
    pub status: i64,
    pub message: String,
    /// Unix timestamp (seconds) of the write that produced this status.
    pub timestamp: u64,
}

impl StoreEntry {
    pub fn new(severity: Severity, message: impl Into<String>, timestamp: u64) -> Self {
        Self {
            status: severity.code(),
            message: message.into(),
            timestamp,
        }
    }

    /// The stored status, or UNKNOWN when the code is out of range.
    pub fn severity(&self) -> Severity {
        Severity::from_code(self.status).unwrap_or(Severity::Unknown)
    }
}

/// Store key derived from a controller name.
///
/// The name is encoded as its length followed by the code point of each
/// character, all dot-separated: `"abc"` becomes `"3.97.98.99"`. The
/// encoding is injective and reversible, and the result is a valid
/// object-identifier suffix for the polling protocol.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StoreKey(String);

impl StoreKey {
    pub fn encode(name: &str) -> Self {
        let mut key = name.chars().count().to_string();
        for c in name.chars() {
            key.push('.');
            key.push_str(&(c as u32).to_string());
        }
        Self(key)
    }

    /// Recover the controller name from an encoded key.
    pub fn decode(&self) -> StateResult<String> {
        let invalid = || StateError::InvalidKey(self.0.clone());
        let mut parts = self.0.split('.');
        let len: usize = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(invalid)?;
        let name = parts
            .map(|p| p.parse::<u32>().ok().and_then(char::from_u32))
            .collect::<Option<String>>()
            .ok_or_else(invalid)?;
        if name.chars().count() != len {
            return Err(invalid());
        }
        Ok(name)
    }

    /// Wrap an already-encoded key, validating it.
    pub fn from_encoded(encoded: &str) -> StateResult<Self> {
        let key = Self(encoded.to_string());
        key.decode()?;
        Ok(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Column of a [`StoreEntry`] addressed by the polling protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusField {
    Code = 1,
    Message = 2,
    Timestamp = 3,
}

impl StatusField {
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "1" => Some(Self::Code),
            "2" => Some(Self::Message),
            "3" => Some(Self::Timestamp),
            _ => None,
        }
    }
}

/// A single column value read out of the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Integer(i64),
    Text(String),
}

impl StoreEntry {
    pub fn field(&self, field: StatusField) -> FieldValue {
        match field {
            StatusField::Code => FieldValue::Integer(self.status),
            StatusField::Message => FieldValue::Text(self.message.clone()),
            StatusField::Timestamp => FieldValue::Text(self.timestamp.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_matches_oid_layout() {
        assert_eq!(StoreKey::encode("abc").as_str(), "3.97.98.99");
        assert_eq!(StoreKey::encode("").as_str(), "0");
    }

    #[test]
    fn decode_reverses_encode() {
        for name in ["ctl1a", "sfa-12k.lab", "10.0.0.7", "ünïcode"] {
            assert_eq!(StoreKey::encode(name).decode().unwrap(), name);
        }
    }

    #[test]
    fn distinct_names_do_not_collide() {
        // Same code points, different split points.
        assert_ne!(StoreKey::encode("a1"), StoreKey::encode("a"));
        assert_ne!(StoreKey::encode("ab"), StoreKey::encode("ba"));
    }

    #[test]
    fn malformed_keys_are_rejected() {
        assert!(StoreKey::from_encoded("2.97").is_err());
        assert!(StoreKey::from_encoded("x.97").is_err());
        assert!(StoreKey::from_encoded("1.notanumber").is_err());
        assert!(StoreKey::from_encoded("1.97").is_ok());
    }

    #[test]
    fn entry_severity_falls_back_to_unknown() {
        let entry = StoreEntry {
            status: 42,
            message: String::new(),
            timestamp: 0,
        };
        assert_eq!(entry.severity(), Severity::Unknown);
        assert_eq!(
            StoreEntry::new(Severity::Warning, "x", 1).severity(),
            Severity::Warning
        );
    }
}
