//! Certificate trust store.
//!
//! Holds every certificate the registry accepts as a package signer, keyed by
//! thumbprint. Certificates can come from:
//! - Pinned registrations (added directly by the operator)
//! - A certificates manifest file

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use sigvet_core::{CertificateMetadata, CertificateRegistry, KnownCertificate, Thumbprint};
use tokio::sync::RwLock;

use crate::error::{RegistryError, RegistryResult};
use crate::types::CertificatesManifest;

/// Supported certificates manifest schema version.
pub const MANIFEST_VERSION: u8 = 1;

/// Trust store for signer certificates.
#[derive(Debug, Clone)]
pub struct CertificateStore {
    inner: Arc<RwLock<CertificateStoreInner>>,
}

#[derive(Debug, Default)]
struct CertificateStoreInner {
    /// Thumbprint -> metadata
    certificates: HashMap<Thumbprint, CertificateMetadata>,

    /// Pinned thumbprints (never removed by a manifest)
    pinned: HashSet<Thumbprint>,
}

impl CertificateStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(CertificateStoreInner::default())),
        }
    }

    /// Create a store from a manifest file.
    pub async fn from_manifest_file(path: &Path) -> RegistryResult<Self> {
        let store = Self::new();
        store.load_manifest_file(path).await?;
        Ok(store)
    }

    /// Pin a certificate by its DER encoding.
    pub async fn add_certificate(&self, der: &[u8], metadata: CertificateMetadata) -> Thumbprint {
        let thumbprint = Thumbprint::of_certificate(der);

        let mut inner = self.inner.write().await;
        inner.certificates.insert(thumbprint.clone(), metadata);
        inner.pinned.insert(thumbprint.clone());

        thumbprint
    }

    /// Read and apply a manifest file.
    pub async fn load_manifest_file(&self, path: &Path) -> RegistryResult<usize> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| RegistryError::Manifest {
                message: format!("failed to read {}: {}", path.display(), e),
            })?;

        let manifest: CertificatesManifest =
            serde_json::from_str(&raw).map_err(|e| RegistryError::Manifest {
                message: format!("failed to parse {}: {}", path.display(), e),
            })?;

        self.add_from_manifest(&manifest).await
    }

    /// Apply a manifest. Returns the number of certificates added.
    ///
    /// Malformed entries are skipped with a warning rather than failing the
    /// whole manifest. Revoked entries drop any matching non-pinned certificate.
    pub async fn add_from_manifest(&self, manifest: &CertificatesManifest) -> RegistryResult<usize> {
        if manifest.version != MANIFEST_VERSION {
            return Err(RegistryError::Manifest {
                message: format!(
                    "unsupported manifest version {} (expected {})",
                    manifest.version, MANIFEST_VERSION
                ),
            });
        }

        let mut inner = self.inner.write().await;
        let mut added = 0;

        for entry in &manifest.certificates {
            let thumbprint = match Thumbprint::parse(entry.thumbprint.clone()) {
                Ok(tp) => tp,
                Err(e) => {
                    tracing::warn!(thumbprint = %entry.thumbprint, error = %e, "malformed thumbprint, skipping");
                    continue;
                }
            };

            if entry.revoked {
                if !inner.pinned.contains(&thumbprint) {
                    inner.certificates.remove(&thumbprint);
                }
                continue;
            }

            if let Some(cert_b64) = &entry.certificate {
                match BASE64.decode(cert_b64) {
                    Ok(der) => {
                        let computed = Thumbprint::of_certificate(&der);
                        if computed != thumbprint {
                            tracing::warn!(
                                claimed = %thumbprint,
                                computed = %computed,
                                "thumbprint mismatch, skipping"
                            );
                            continue;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(thumbprint = %thumbprint, error = %e, "failed to decode certificate");
                        continue;
                    }
                }
            }

            // Don't overwrite pinned metadata
            if inner.pinned.contains(&thumbprint) {
                continue;
            }

            inner.certificates.insert(
                thumbprint,
                CertificateMetadata {
                    subject: entry.subject.clone(),
                    description: entry.description.clone(),
                    added_at: entry.added_at,
                },
            );
            added += 1;
        }

        tracing::debug!(added, total = inner.certificates.len(), "applied certificates manifest");

        Ok(added)
    }

    /// Check if a thumbprint is known.
    pub async fn is_known(&self, thumbprint: &Thumbprint) -> bool {
        self.inner.read().await.certificates.contains_key(thumbprint)
    }

    /// All known certificates, sorted by thumbprint.
    pub async fn list(&self) -> Vec<KnownCertificate> {
        let inner = self.inner.read().await;
        let mut out: Vec<KnownCertificate> = inner
            .certificates
            .iter()
            .map(|(thumbprint, metadata)| KnownCertificate {
                thumbprint: thumbprint.clone(),
                metadata: metadata.clone(),
            })
            .collect();
        out.sort_by(|a, b| a.thumbprint.cmp(&b.thumbprint));
        out
    }

    /// Get metadata for a certificate.
    pub async fn metadata(&self, thumbprint: &Thumbprint) -> Option<CertificateMetadata> {
        self.inner.read().await.certificates.get(thumbprint).cloned()
    }

}

impl Default for CertificateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CertificateRegistry for CertificateStore {
    async fn known_thumbprints(&self) -> anyhow::Result<HashSet<Thumbprint>> {
        let inner = self.inner.read().await;
        Ok(inner.certificates.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ManifestCertificate;
    use chrono::Utc;

    fn entry(der: &[u8]) -> ManifestCertificate {
        ManifestCertificate {
            thumbprint: Thumbprint::of_certificate(der).to_string(),
            certificate: Some(BASE64.encode(der)),
            subject: Some("CN=Contoso".to_string()),
            description: None,
            added_at: Some(Utc::now()),
            revoked: false,
        }
    }

    fn manifest(certificates: Vec<ManifestCertificate>) -> CertificatesManifest {
        CertificatesManifest {
            version: MANIFEST_VERSION,
            certificates,
        }
    }

    #[tokio::test]
    async fn test_empty_store() {
        let store = CertificateStore::new();
        assert!(store.known_thumbprints().await.unwrap().is_empty());
        assert!(!store.is_known(&Thumbprint::of_certificate(b"x")).await);
    }

    #[tokio::test]
    async fn test_add_certificate() {
        let store = CertificateStore::new();
        let tp = store
            .add_certificate(b"cert-a", CertificateMetadata::default())
            .await;

        assert_eq!(tp, Thumbprint::of_certificate(b"cert-a"));
        assert!(store.is_known(&tp).await);
        assert!(store.known_thumbprints().await.unwrap().contains(&tp));
    }

    #[tokio::test]
    async fn test_add_from_manifest() {
        let store = CertificateStore::new();
        let added = store
            .add_from_manifest(&manifest(vec![entry(b"a"), entry(b"b")]))
            .await
            .unwrap();

        assert_eq!(added, 2);
        assert!(store.is_known(&Thumbprint::of_certificate(b"a")).await);
        assert!(store.is_known(&Thumbprint::of_certificate(b"b")).await);

        let meta = store
            .metadata(&Thumbprint::of_certificate(b"a"))
            .await
            .unwrap();
        assert_eq!(meta.subject.as_deref(), Some("CN=Contoso"));
    }

    #[tokio::test]
    async fn test_manifest_without_certificate_bytes() {
        let store = CertificateStore::new();
        let mut e = entry(b"thumbprint-only");
        e.certificate = None;

        store.add_from_manifest(&manifest(vec![e])).await.unwrap();
        assert!(
            store
                .is_known(&Thumbprint::of_certificate(b"thumbprint-only"))
                .await
        );
    }

    #[tokio::test]
    async fn test_thumbprint_mismatch_skipped() {
        let store = CertificateStore::new();
        let mut e = entry(b"real");
        e.certificate = Some(BASE64.encode(b"impostor"));

        let added = store.add_from_manifest(&manifest(vec![e])).await.unwrap();
        assert_eq!(added, 0);
        assert!(!store.is_known(&Thumbprint::of_certificate(b"real")).await);
    }

    #[tokio::test]
    async fn test_malformed_thumbprint_skipped() {
        let store = CertificateStore::new();
        let mut bad = entry(b"bad");
        bad.thumbprint = "sha256:nope".to_string();

        let added = store
            .add_from_manifest(&manifest(vec![bad, entry(b"good")]))
            .await
            .unwrap();
        assert_eq!(added, 1);
    }

    #[tokio::test]
    async fn test_unsupported_manifest_version() {
        let store = CertificateStore::new();
        let result = store
            .add_from_manifest(&CertificatesManifest {
                version: 9,
                certificates: vec![],
            })
            .await;
        assert!(matches!(result, Err(RegistryError::Manifest { .. })));
    }

    #[tokio::test]
    async fn test_revoked_entry_removes_manifest_certificate() {
        let store = CertificateStore::new();
        store
            .add_from_manifest(&manifest(vec![entry(b"a")]))
            .await
            .unwrap();

        let mut revoked = entry(b"a");
        revoked.revoked = true;
        store
            .add_from_manifest(&manifest(vec![revoked]))
            .await
            .unwrap();

        assert!(!store.is_known(&Thumbprint::of_certificate(b"a")).await);
    }

    #[tokio::test]
    async fn test_pinned_certificate_survives_manifest() {
        let store = CertificateStore::new();
        let metadata = CertificateMetadata {
            subject: Some("CN=Pinned".to_string()),
            ..Default::default()
        };
        let tp = store.add_certificate(b"pinned", metadata).await;

        let mut revoked = entry(b"pinned");
        revoked.revoked = true;
        store
            .add_from_manifest(&manifest(vec![revoked, entry(b"pinned")]))
            .await
            .unwrap();

        assert!(store.is_known(&tp).await);
        let meta = store.metadata(&tp).await.unwrap();
        assert_eq!(meta.subject.as_deref(), Some("CN=Pinned"));
    }

    #[tokio::test]
    async fn test_list_is_sorted() {
        let store = CertificateStore::new();
        store
            .add_from_manifest(&manifest(vec![entry(b"x"), entry(b"y"), entry(b"z")]))
            .await
            .unwrap();

        let listed = store.list().await;
        assert_eq!(listed.len(), 3);
        assert!(listed
            .windows(2)
            .all(|w| w[0].thumbprint < w[1].thumbprint));
    }

    #[tokio::test]
    async fn test_from_manifest_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("certificates.json");
        std::fs::write(
            &path,
            serde_json::to_string(&manifest(vec![entry(b"file")])).unwrap(),
        )
        .unwrap();

        let store = CertificateStore::from_manifest_file(&path).await.unwrap();
        assert!(store.is_known(&Thumbprint::of_certificate(b"file")).await);

        let missing = CertificateStore::from_manifest_file(&dir.path().join("nope.json")).await;
        assert!(matches!(missing, Err(RegistryError::Manifest { .. })));
    }
}
