//! File-backed packages with detached signatures.
//!
//! # Layout
//!
//! ```text
//! Contoso.Logging.1.0.0.pkg       # package content (opaque bytes)
//! Contoso.Logging.1.0.0.pkg.sig   # SignatureFile JSON (optional)
//! ```
//!
//! A package is signed iff its signature file exists. Signatures cover the
//! DSSE pre-authentication encoding of [`PAYLOAD_TYPE_PACKAGE_V1`] and the
//! content bytes.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Utc};
use ed25519_dalek::{Signer, SigningKey};
use sigvet_core::{PackageSignature, SignedPackage};

use crate::error::{RegistryError, RegistryResult};
use crate::keys::{certificate_der, ALGORITHM_ED25519};
use crate::types::{SignatureEntry, SignatureFile, SIGNATURE_FILE_VERSION};

/// Payload type bound into every package signature.
pub const PAYLOAD_TYPE_PACKAGE_V1: &str = "application/vnd.sigvet.package;v=1";

/// Path of the detached signature file for a package.
pub fn signature_path(package: &Path) -> PathBuf {
    let mut name = OsString::from(package.as_os_str());
    name.push(".sig");
    PathBuf::from(name)
}

/// Build DSSE Pre-Authentication Encoding (PAE).
///
/// ```text
/// PAE(type, payload) = "DSSEv1" SP LEN(type) SP type SP LEN(payload) SP payload
/// ```
pub(crate) fn build_pae(payload_type: &str, payload: &[u8]) -> Vec<u8> {
    let type_len = payload_type.len().to_string();
    let payload_len = payload.len().to_string();

    let mut pae = Vec::new();
    pae.extend_from_slice(b"DSSEv1 ");
    pae.extend_from_slice(type_len.as_bytes());
    pae.push(b' ');
    pae.extend_from_slice(payload_type.as_bytes());
    pae.push(b' ');
    pae.extend_from_slice(payload_len.as_bytes());
    pae.push(b' ');
    pae.extend_from_slice(payload);
    pae
}

/// Sign package content, embedding the signer certificate.
pub fn sign_package(
    content: &[u8],
    signing_key: &SigningKey,
    signed_at: Option<DateTime<Utc>>,
) -> RegistryResult<SignatureEntry> {
    let certificate = certificate_der(&signing_key.verifying_key())?;
    let signature = signing_key.sign(&build_pae(PAYLOAD_TYPE_PACKAGE_V1, content));

    Ok(SignatureEntry {
        algorithm: ALGORITHM_ED25519.to_string(),
        certificate: BASE64.encode(certificate),
        signature: BASE64.encode(signature.to_bytes()),
        signed_at,
    })
}

impl SignatureFile {
    /// Read a signature file; `Ok(None)` if it does not exist.
    pub async fn read(path: &Path) -> RegistryResult<Option<Self>> {
        let raw = match tokio::fs::read(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(RegistryError::Io {
                    message: format!("failed to read {}: {}", path.display(), e),
                })
            }
        };

        let file: SignatureFile =
            serde_json::from_slice(&raw).map_err(|e| RegistryError::SignatureFile {
                message: format!("failed to parse {}: {}", path.display(), e),
            })?;

        if file.version != SIGNATURE_FILE_VERSION {
            return Err(RegistryError::SignatureFile {
                message: format!(
                    "unsupported signature file version {} in {}",
                    file.version,
                    path.display()
                ),
            });
        }

        Ok(Some(file))
    }

    /// Write atomically.
    pub async fn write(&self, path: &Path) -> RegistryResult<()> {
        let json = serde_json::to_vec_pretty(self).map_err(|e| RegistryError::SignatureFile {
            message: format!("failed to serialize signature file: {}", e),
        })?;
        crate::fs::write_atomic(path, &json, crate::fs::Existing::Replace).await
    }
}

/// Append a signature to a package's signature file, creating it if needed.
pub async fn append_signature(package: &Path, entry: SignatureEntry) -> RegistryResult<SignatureFile> {
    let path = signature_path(package);
    let mut file = SignatureFile::read(&path).await?.unwrap_or_default();
    file.signatures.push(entry);
    file.write(&path).await?;
    Ok(file)
}

/// Decode a signature entry into the engine's representation.
pub fn decode_entry(entry: &SignatureEntry) -> RegistryResult<PackageSignature> {
    let certificate = BASE64
        .decode(&entry.certificate)
        .map_err(|e| RegistryError::SignatureFile {
            message: format!("invalid base64 certificate: {}", e),
        })?;

    let signature = BASE64
        .decode(&entry.signature)
        .map_err(|e| RegistryError::SignatureFile {
            message: format!("invalid base64 signature: {}", e),
        })?;

    Ok(PackageSignature::new(
        entry.algorithm.clone(),
        certificate,
        signature,
        entry.signed_at,
    ))
}

/// A package read from disk together with its detached signatures.
#[derive(Debug, Clone)]
pub struct FilePackage {
    path: Option<PathBuf>,
    content: Vec<u8>,
    signature_file: Option<SignatureFile>,
}

impl FilePackage {
    /// Read a package and its signature file (if any).
    pub async fn open(path: &Path) -> RegistryResult<Self> {
        let content = tokio::fs::read(path)
            .await
            .map_err(|e| RegistryError::Io {
                message: format!("failed to read package {}: {}", path.display(), e),
            })?;
        let signature_file = SignatureFile::read(&signature_path(path)).await?;

        tracing::debug!(
            path = %path.display(),
            bytes = content.len(),
            signed = signature_file.is_some(),
            "opened package"
        );

        Ok(Self {
            path: Some(path.to_path_buf()),
            content,
            signature_file,
        })
    }

    /// Build a package from in-memory parts.
    pub fn from_parts(content: Vec<u8>, signature_file: Option<SignatureFile>) -> Self {
        Self {
            path: None,
            content,
            signature_file,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn content_bytes(&self) -> &[u8] {
        &self.content
    }

    pub fn signature_file(&self) -> Option<&SignatureFile> {
        self.signature_file.as_ref()
    }

    /// Decode every signature entry, failing on the first malformed one.
    pub fn decode_signatures(&self) -> RegistryResult<Vec<PackageSignature>> {
        self.signature_file
            .as_ref()
            .map(|f| f.signatures.iter().map(decode_entry).collect())
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

#[async_trait]
impl SignedPackage for FilePackage {
    async fn is_signed(&self) -> anyhow::Result<bool> {
        Ok(self.signature_file.is_some())
    }

    async fn signatures(&self) -> anyhow::Result<Vec<PackageSignature>> {
        Ok(self.decode_signatures()?)
    }

    async fn content(&self) -> anyhow::Result<Vec<u8>> {
        Ok(self.content.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigvet_core::Thumbprint;

    #[test]
    fn test_signature_path_appends_suffix() {
        assert_eq!(
            signature_path(Path::new("/tmp/pkg/Contoso.1.0.0.pkg")),
            PathBuf::from("/tmp/pkg/Contoso.1.0.0.pkg.sig")
        );
    }

    #[test]
    fn test_pae_layout() {
        assert_eq!(build_pae("t", b"abc"), b"DSSEv1 1 t 3 abc".to_vec());
    }

    #[test]
    fn test_sign_package_embeds_certificate() {
        let key = SigningKey::generate(&mut rand::thread_rng());
        let entry = sign_package(b"content", &key, None).unwrap();
        let decoded = decode_entry(&entry).unwrap();

        let der = certificate_der(&key.verifying_key()).unwrap();
        assert_eq!(decoded.algorithm, ALGORITHM_ED25519);
        assert_eq!(decoded.thumbprint, Thumbprint::of_certificate(&der));
        assert_eq!(decoded.signature.len(), 64);
    }

    #[test]
    fn test_decode_entry_rejects_bad_base64() {
        let entry = SignatureEntry {
            algorithm: ALGORITHM_ED25519.to_string(),
            certificate: "%%%".to_string(),
            signature: String::new(),
            signed_at: None,
        };
        assert!(matches!(
            decode_entry(&entry),
            Err(RegistryError::SignatureFile { .. })
        ));
    }

    #[tokio::test]
    async fn test_unsigned_package_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.pkg");
        std::fs::write(&path, b"payload").unwrap();

        let package = FilePackage::open(&path).await.unwrap();
        assert!(!package.is_signed().await.unwrap());
        assert!(package.signatures().await.unwrap().is_empty());
        assert_eq!(package.content().await.unwrap(), b"payload");
    }

    #[tokio::test]
    async fn test_append_signature_accumulates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.pkg");
        std::fs::write(&path, b"payload").unwrap();

        let key = SigningKey::generate(&mut rand::thread_rng());
        append_signature(&path, sign_package(b"payload", &key, None).unwrap())
            .await
            .unwrap();
        let file = append_signature(&path, sign_package(b"payload", &key, None).unwrap())
            .await
            .unwrap();
        assert_eq!(file.signatures.len(), 2);

        let package = FilePackage::open(&path).await.unwrap();
        assert!(package.is_signed().await.unwrap());
        assert_eq!(package.signatures().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_signature_file_is_signed_with_zero_signatures() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.pkg");
        std::fs::write(&path, b"payload").unwrap();
        SignatureFile::default()
            .write(&signature_path(&path))
            .await
            .unwrap();

        let package = FilePackage::open(&path).await.unwrap();
        assert!(package.is_signed().await.unwrap());
        assert!(package.signatures().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_signature_file_fails_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.pkg");
        std::fs::write(&path, b"payload").unwrap();
        std::fs::write(signature_path(&path), b"{not json").unwrap();

        let result = FilePackage::open(&path).await;
        assert!(matches!(result, Err(RegistryError::SignatureFile { .. })));
    }
}
