//! Signature trust-decision engine for registry package ingestion.
//!
//! Every uploaded package passes through [`SignatureValidator::validate`],
//! which classifies it as unsigned, valid or invalid, records that status in a
//! [`StatusStore`] and hands a terminal [`ValidationOutcome`] back to the
//! caller.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use sigvet_core::{
//!     CertificateRegistry, PackageIdentity, PartsExtractor, SignatureValidator,
//!     SignatureVerifier, SignedPackage, StatusStore,
//! };
//!
//! # async fn example(
//! #     registry: Arc<dyn CertificateRegistry>,
//! #     verifier: Arc<dyn SignatureVerifier>,
//! #     extractor: Arc<dyn PartsExtractor>,
//! #     store: Arc<dyn StatusStore>,
//! #     package: &dyn SignedPackage,
//! # ) -> anyhow::Result<()> {
//! let validator = SignatureValidator::new(registry, verifier, extractor, store);
//! let identity = PackageIdentity::new("Contoso.Logging", "1.2.0", 42);
//!
//! let outcome = validator.validate(&identity, package).await?;
//! println!("{}: {:?}", outcome.state(), outcome.issues());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `SIGVET_COLLABORATOR_TIMEOUT_SECS` | Per-call collaborator timeout (default: none) |

pub mod collaborators;
pub mod config;
pub mod engine;
pub mod error;
pub mod issue;
pub mod outcome;
pub mod report;
pub mod types;

pub use collaborators::{
    CertificateRegistry, PartsExtractor, SignatureVerifier, SignedPackage, StatusStore,
};
pub use config::{ValidatorConfig, COLLABORATOR_TIMEOUT_ENV};
pub use engine::SignatureValidator;
pub use error::{Collaborator, ValidationError, ValidationResult};
pub use issue::{IssueCode, ValidationIssue};
pub use outcome::{ValidationOutcome, ValidationState};
pub use report::{IssueLevel, SignatureReport, VerifierCode, VerifierIssue, VerifyReport};
pub use types::{
    CertificateMetadata, KnownCertificate, PackageIdentity, PackageSignature,
    PackageSigningStatus, Thumbprint, ThumbprintError, THUMBPRINT_LEN,
};
