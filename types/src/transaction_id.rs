//! Transaction identifier type with `TXN` prefix.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque unique identifier for one verification submission.
///
/// Generated as `TXN` + epoch milliseconds + a 9-character uppercased
/// base-36 token. Uniqueness is ultimately enforced by the store's
/// unique-key constraint, not by the generator.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(String);

impl TransactionId {
    /// The standard prefix for all geoproof transaction identifiers.
    pub const PREFIX: &'static str = "TXN";

    /// Wrap a raw string as a transaction identifier.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Return the raw identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this identifier is well-formed (prefix plus a non-empty body).
    pub fn is_valid(&self) -> bool {
        self.0.starts_with(Self::PREFIX) && self.0.len() > Self::PREFIX.len()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TransactionId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}
