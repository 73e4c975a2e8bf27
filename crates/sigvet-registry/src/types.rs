//! On-disk formats: certificate manifests and detached signature files.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current signature file schema version.
pub const SIGNATURE_FILE_VERSION: u8 = 1;

/// Certificate manifest listing the certificates the registry trusts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CertificatesManifest {
    /// Schema version.
    pub version: u8,

    /// Registered certificates.
    #[serde(default)]
    pub certificates: Vec<ManifestCertificate>,
}

/// A certificate entry in the manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestCertificate {
    /// Hex SHA-256 thumbprint of the certificate DER.
    pub thumbprint: String,

    /// Certificate DER (Base64). When present the thumbprint is checked against it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<String>,

    /// Subject or owner.
    #[serde(default)]
    pub subject: Option<String>,

    /// Human-readable description.
    #[serde(default)]
    pub description: Option<String>,

    /// When the certificate was registered.
    #[serde(default)]
    pub added_at: Option<DateTime<Utc>>,

    /// Whether the certificate was withdrawn from the manifest.
    #[serde(default)]
    pub revoked: bool,
}

/// Detached signature file stored next to a package (`<package>.sig`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureFile {
    /// Schema version.
    pub version: u8,

    /// Signatures, in the order they were added.
    #[serde(default)]
    pub signatures: Vec<SignatureEntry>,
}

impl Default for SignatureFile {
    fn default() -> Self {
        Self {
            version: SIGNATURE_FILE_VERSION,
            signatures: Vec::new(),
        }
    }
}

/// One signature over a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureEntry {
    /// Signing algorithm (only "Ed25519" verifies).
    pub algorithm: String,

    /// Signer certificate (SPKI DER, Base64).
    pub certificate: String,

    /// Signature over the pre-authentication encoding (Base64).
    pub signature: String,

    /// Claimed signing time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signed_at: Option<DateTime<Utc>>,
}
