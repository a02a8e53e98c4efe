//! Verification status enum.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The lifecycle status of a verification record.
///
/// The record builder only ever writes from this set. The store layer treats
/// status as an opaque string, so readback may yield values outside it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    /// Submitted through the simplified entry path; not yet confirmed.
    Pending,
    /// Submitted through the fully validated path.
    Verified,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Verified => "verified",
        }
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercase_wire_form() {
        assert_eq!(VerificationStatus::Pending.as_str(), "pending");
        assert_eq!(VerificationStatus::Verified.to_string(), "verified");
    }
}
