//! Engine issue vocabulary and translation from verifier findings.
//!
//! Verifier codes map one-to-one onto [`IssueCode`]; messages are carried
//! through unchanged. Keeping a separate enum means consumers of validation
//! outcomes are insulated from additions to the verifier catalogue.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::report::{VerifierCode, VerifierIssue};
use crate::types::Thumbprint;

/// Issue codes attached to validation outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    /// Signer certificate is not known to the registry.
    UnrecognizedSigner,
    SignatureInvalid,
    CertificateInvalid,
    UnsupportedAlgorithm,
    MalformedSignature,
    NoSignatures,
    MissingTimestamp,
    TimestampInFuture,
    Unknown,
}

impl IssueCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnrecognizedSigner => "unrecognized_signer",
            Self::SignatureInvalid => "signature_invalid",
            Self::CertificateInvalid => "certificate_invalid",
            Self::UnsupportedAlgorithm => "unsupported_algorithm",
            Self::MalformedSignature => "malformed_signature",
            Self::NoSignatures => "no_signatures",
            Self::MissingTimestamp => "missing_timestamp",
            Self::TimestampInFuture => "timestamp_in_future",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<VerifierCode> for IssueCode {
    fn from(code: VerifierCode) -> Self {
        match code {
            VerifierCode::SignatureInvalid => Self::SignatureInvalid,
            VerifierCode::CertificateInvalid => Self::CertificateInvalid,
            VerifierCode::UnsupportedAlgorithm => Self::UnsupportedAlgorithm,
            VerifierCode::MalformedSignature => Self::MalformedSignature,
            VerifierCode::NoSignatures => Self::NoSignatures,
            VerifierCode::MissingTimestamp => Self::MissingTimestamp,
            VerifierCode::TimestampInFuture => Self::TimestampInFuture,
            VerifierCode::Unknown => Self::Unknown,
        }
    }
}

/// A reportable problem attached to a terminal outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub code: IssueCode,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// The single synthetic issue emitted when any signer is unknown.
    pub fn unrecognized_signer(unknown: &[Thumbprint]) -> Self {
        let list = unknown
            .iter()
            .map(Thumbprint::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        Self::new(
            IssueCode::UnrecognizedSigner,
            format!("package is signed by an unrecognized certificate ({list})"),
        )
    }
}

impl From<&VerifierIssue> for ValidationIssue {
    fn from(issue: &VerifierIssue) -> Self {
        Self {
            code: issue.code.into(),
            message: issue.message.clone(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}
