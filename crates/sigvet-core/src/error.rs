//! Infrastructure errors for the validation engine.
//!
//! Policy rejections are never errors; they are `Failed` outcomes.

use std::fmt;
use std::time::Duration;

use crate::outcome::ValidationState;

/// The collaborator an infrastructure failure originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collaborator {
    PackageReader,
    CertificateRegistry,
    SignatureVerifier,
    PartsExtractor,
    StatusStore,
}

impl fmt::Display for Collaborator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::PackageReader => "package reader",
            Self::CertificateRegistry => "certificate registry",
            Self::SignatureVerifier => "signature verifier",
            Self::PartsExtractor => "parts extractor",
            Self::StatusStore => "status store",
        })
    }
}

/// Validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// Package could not be read at all.
    #[error("package read failed: {message}")]
    PackageRead { message: String },

    /// Certificate registry lookup failed.
    #[error("certificate registry unavailable: {message}")]
    Registry { message: String },

    /// Verifier could not produce a report.
    #[error("signature verifier failed: {message}")]
    Verifier { message: String },

    /// Certificate chain extraction failed on the accept path.
    #[error("signature parts extraction failed: {message}")]
    Extractor { message: String },

    /// Signing status could not be persisted.
    #[error("status store write failed: {message}")]
    StatusStore { message: String },

    /// A collaborator call exceeded the configured timeout.
    #[error("{collaborator} call timed out after {after:?}")]
    Timeout {
        collaborator: Collaborator,
        after: Duration,
    },

    /// Attempted to build a non-terminal outcome that carries issues.
    #[error("{state} outcome cannot carry issues (got {issue_count})")]
    InvalidOutcome {
        state: ValidationState,
        issue_count: usize,
    },
}

impl ValidationError {
    /// Wrap a collaborator failure, keeping the full context chain.
    pub fn from_collaborator(collaborator: Collaborator, err: anyhow::Error) -> Self {
        let message = format!("{err:#}");
        match collaborator {
            Collaborator::PackageReader => Self::PackageRead { message },
            Collaborator::CertificateRegistry => Self::Registry { message },
            Collaborator::SignatureVerifier => Self::Verifier { message },
            Collaborator::PartsExtractor => Self::Extractor { message },
            Collaborator::StatusStore => Self::StatusStore { message },
        }
    }

    /// Whether re-running the whole validation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Registry { .. }
                | Self::Verifier { .. }
                | Self::Extractor { .. }
                | Self::StatusStore { .. }
                | Self::Timeout { .. }
        )
    }
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;
