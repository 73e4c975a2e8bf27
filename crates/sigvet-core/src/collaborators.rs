//! Capabilities the engine depends on.
//!
//! Implementations live outside this crate (see `sigvet-registry`) or in
//! tests. All of them may perform I/O and are awaited one at a time per run.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::report::VerifyReport;
use crate::types::{PackageIdentity, PackageSignature, PackageSigningStatus, Thumbprint};

/// Read access to an already-open package.
#[async_trait]
pub trait SignedPackage: Send + Sync {
    /// Whether the package carries a signature container at all.
    async fn is_signed(&self) -> anyhow::Result<bool>;

    /// All signatures in container order.
    async fn signatures(&self) -> anyhow::Result<Vec<PackageSignature>>;

    /// The signed content.
    async fn content(&self) -> anyhow::Result<Vec<u8>>;
}

/// Source of certificates the registry accepts as signers.
#[async_trait]
pub trait CertificateRegistry: Send + Sync {
    /// Snapshot of every known thumbprint.
    async fn known_thumbprints(&self) -> anyhow::Result<HashSet<Thumbprint>>;
}

/// Cryptographic verification of a package's signatures.
#[async_trait]
pub trait SignatureVerifier: Send + Sync {
    async fn verify(&self, package: &dyn SignedPackage) -> anyhow::Result<VerifyReport>;

    fn name(&self) -> &'static str;
}

/// Persists the certificate chain of an accepted signature.
///
/// Must be idempotent: extracting the same package twice is not an error and
/// does not duplicate data.
#[async_trait]
pub trait PartsExtractor: Send + Sync {
    async fn extract(
        &self,
        identity: &PackageIdentity,
        package: &dyn SignedPackage,
    ) -> anyhow::Result<()>;
}

/// Durable record of a package's signing status.
///
/// Writes must be atomic per package key; the last write wins.
#[async_trait]
pub trait StatusStore: Send + Sync {
    async fn set_status(
        &self,
        identity: &PackageIdentity,
        status: PackageSigningStatus,
    ) -> anyhow::Result<()>;
}
