//! Verifier-native report types.
//!
//! These mirror what a signature verifier produces. The engine only relays
//! them; see [`crate::issue`] for the mapping into engine issues.

use serde::{Deserialize, Serialize};

use crate::types::Thumbprint;

/// Severity of a verifier finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueLevel {
    Error,
    Warning,
    Information,
}

/// Verifier issue catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifierCode {
    /// Signature does not verify against the signer certificate.
    SignatureInvalid,
    /// Signer certificate could not be decoded or is unusable.
    CertificateInvalid,
    /// Declared signing algorithm is not supported.
    UnsupportedAlgorithm,
    /// Signature bytes are structurally malformed.
    MalformedSignature,
    /// Package claims to be signed but carries no signatures.
    NoSignatures,
    /// Signature carries no signing time.
    MissingTimestamp,
    /// Claimed signing time lies in the future.
    TimestampInFuture,
    Unknown,
}

/// A single verifier finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifierIssue {
    pub level: IssueLevel,
    pub code: VerifierCode,
    pub message: String,
}

impl VerifierIssue {
    pub fn error(code: VerifierCode, message: impl Into<String>) -> Self {
        Self {
            level: IssueLevel::Error,
            code,
            message: message.into(),
        }
    }

    pub fn warning(code: VerifierCode, message: impl Into<String>) -> Self {
        Self {
            level: IssueLevel::Warning,
            code,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == IssueLevel::Error
    }
}

/// Verification findings for one signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureReport {
    /// Thumbprint of the signer this report is about.
    pub thumbprint: Option<Thumbprint>,

    /// Errors, warnings and informational findings, in verifier order.
    #[serde(default)]
    pub issues: Vec<VerifierIssue>,
}

/// Result of verifying a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyReport {
    /// Overall verdict. The engine decides on this flag alone.
    pub valid: bool,

    /// Per-signature results.
    #[serde(default)]
    pub signatures: Vec<SignatureReport>,
}

impl VerifyReport {
    pub fn valid(signatures: Vec<SignatureReport>) -> Self {
        Self {
            valid: true,
            signatures,
        }
    }

    pub fn invalid(signatures: Vec<SignatureReport>) -> Self {
        Self {
            valid: false,
            signatures,
        }
    }

    /// All issues across signatures, in report order.
    pub fn issues(&self) -> impl Iterator<Item = &VerifierIssue> {
        self.signatures.iter().flat_map(|s| s.issues.iter())
    }

    pub fn errors(&self) -> impl Iterator<Item = &VerifierIssue> {
        self.issues().filter(|i| i.level == IssueLevel::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &VerifierIssue> {
        self.issues().filter(|i| i.level == IssueLevel::Warning)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errors_and_warnings_are_split_in_order() {
        let report = VerifyReport::invalid(vec![
            SignatureReport {
                thumbprint: None,
                issues: vec![
                    VerifierIssue::warning(VerifierCode::MissingTimestamp, "no timestamp"),
                    VerifierIssue::error(VerifierCode::SignatureInvalid, "bad signature"),
                ],
            },
            SignatureReport {
                thumbprint: None,
                issues: vec![VerifierIssue::error(
                    VerifierCode::CertificateInvalid,
                    "bad certificate",
                )],
            },
        ]);

        let errors: Vec<_> = report.errors().map(|i| i.code).collect();
        assert_eq!(
            errors,
            vec![VerifierCode::SignatureInvalid, VerifierCode::CertificateInvalid]
        );
        assert_eq!(report.warnings().count(), 1);
        assert_eq!(report.issues().count(), 3);
    }
}
