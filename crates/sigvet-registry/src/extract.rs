//! Signature parts extraction to the local filesystem.
//!
//! # Layout
//!
//! ```text
//! {root}/
//!   certificates/{thumbprint}.der   # signer certificate, written once
//!   packages/{key}.json             # which certificates signed which package
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sigvet_core::{PackageIdentity, PartsExtractor, SignedPackage, Thumbprint};
use tracing::debug;

use crate::digest::content_digest;
use crate::error::{RegistryError, RegistryResult};
use crate::fs::Existing;

/// Audit record linking a package to its signer certificates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageSignatureRecord {
    pub id: String,
    pub version: String,
    pub key: i64,

    /// Content digest (sha256:...).
    pub digest: String,

    /// Signer thumbprints in signature order.
    pub thumbprints: Vec<Thumbprint>,
}

/// Writes certificate chains and package records under a root directory.
#[derive(Debug, Clone)]
pub struct FsPartsExtractor {
    root: PathBuf,
}

impl FsPartsExtractor {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn certificate_path(&self, thumbprint: &Thumbprint) -> PathBuf {
        self.root
            .join("certificates")
            .join(format!("{}.der", thumbprint))
    }

    pub fn record_path(&self, key: i64) -> PathBuf {
        self.root.join("packages").join(format!("{}.json", key))
    }

    /// Read a previously written package record.
    pub async fn read_record(&self, key: i64) -> RegistryResult<Option<PackageSignatureRecord>> {
        let path = self.record_path(key);
        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(RegistryError::Io {
                    message: format!("failed to read {}: {}", path.display(), e),
                })
            }
        };

        serde_json::from_slice(&raw)
            .map(Some)
            .map_err(|e| RegistryError::Io {
                message: format!("corrupt package record {}: {}", path.display(), e),
            })
    }

    async fn write_certificate(&self, thumbprint: &Thumbprint, der: &[u8]) -> RegistryResult<()> {
        // Same thumbprint means same bytes, so whichever writer lands first wins.
        crate::fs::write_atomic(&self.certificate_path(thumbprint), der, Existing::Keep).await?;
        debug!(%thumbprint, "stored signer certificate");
        Ok(())
    }
}

#[async_trait]
impl PartsExtractor for FsPartsExtractor {
    async fn extract(
        &self,
        identity: &PackageIdentity,
        package: &dyn SignedPackage,
    ) -> anyhow::Result<()> {
        let signatures = package.signatures().await?;
        let content = package.content().await?;

        crate::fs::create_dir_all(&self.root.join("certificates")).await?;
        crate::fs::create_dir_all(&self.root.join("packages")).await?;

        for sig in &signatures {
            self.write_certificate(&sig.thumbprint, &sig.certificate)
                .await?;
        }

        let record = PackageSignatureRecord {
            id: identity.id.clone(),
            version: identity.version.clone(),
            key: identity.key,
            digest: content_digest(&content),
            thumbprints: signatures.iter().map(|s| s.thumbprint.clone()).collect(),
        };
        let json = serde_json::to_vec_pretty(&record)?;
        crate::fs::write_atomic(&self.record_path(identity.key), &json, Existing::Replace).await?;

        debug!(package_key = identity.key, "extracted signature parts");
        Ok(())
    }
}
