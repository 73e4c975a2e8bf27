//! Registry-side collaborators for the sigvet signature engine.
//!
//! This crate provides concrete implementations of the traits in
//! `sigvet_core`:
//!
//! - [`CertificateStore`]: trusted signer certificates (pinned + manifest)
//! - [`FilePackage`]: package bytes with a detached `.sig` signature file
//! - [`Ed25519Verifier`]: cryptographic verification over a DSSE-style PAE
//! - [`FsPartsExtractor`]: persists signer certificates and package records
//! - [`SqliteStatusStore`]: durable per-package signing status
//!
//! # Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use sigvet_core::{PackageIdentity, SignatureValidator};
//! use sigvet_registry::{
//!     CertificateStore, Ed25519Verifier, FilePackage, FsPartsExtractor, SqliteStatusStore,
//! };
//!
//! # async fn example() -> anyhow::Result<()> {
//! let certificates = CertificateStore::from_manifest_file(Path::new("certificates.json")).await?;
//! let validator = SignatureValidator::new(
//!     Arc::new(certificates),
//!     Arc::new(Ed25519Verifier::new()),
//!     Arc::new(FsPartsExtractor::new("parts")),
//!     Arc::new(SqliteStatusStore::open(Path::new("state.db"))?),
//! );
//!
//! let package = FilePackage::open(Path::new("Contoso.Logging.1.0.0.pkg")).await?;
//! let identity = PackageIdentity::new("Contoso.Logging", "1.0.0", 1);
//! let outcome = validator.validate(&identity, &package).await?;
//! println!("{}", outcome.state());
//! # Ok(())
//! # }
//! ```

mod digest;
pub mod error;
pub mod extract;
mod fs;
pub mod keys;
pub mod package;
pub mod state;
pub mod trust;
pub mod types;
pub mod verify;

pub use digest::content_digest;
pub use error::{RegistryError, RegistryResult};
pub use extract::{FsPartsExtractor, PackageSignatureRecord};
pub use keys::{
    certificate_der, certificate_from_public_pem, signing_key_from_pem,
    verifying_key_from_certificate, Keypair, KeypairFiles, ALGORITHM_ED25519, PRIVATE_KEY_FILE,
    PUBLIC_KEY_FILE,
};
pub use package::{
    append_signature, decode_entry, sign_package, signature_path, FilePackage,
    PAYLOAD_TYPE_PACKAGE_V1,
};
pub use state::{SigningStateRow, SqliteStatusStore, SIGNING_STATE_SCHEMA};
pub use trust::{CertificateStore, MANIFEST_VERSION};
pub use types::{
    CertificatesManifest, ManifestCertificate, SignatureEntry, SignatureFile,
    SIGNATURE_FILE_VERSION,
};
pub use verify::{Ed25519Verifier, DEFAULT_MAX_CLOCK_SKEW_SECS};
