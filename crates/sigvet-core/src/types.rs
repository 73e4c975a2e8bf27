//! Package, certificate and signing-status types shared by the engine and its
//! collaborators.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Length of a hex-encoded SHA-256 thumbprint.
pub const THUMBPRINT_LEN: usize = 64;

/// Identity of the package under validation.
///
/// Supplied by the caller and never mutated by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageIdentity {
    /// Package id (e.g., "Contoso.Logging").
    pub id: String,

    /// Package version as uploaded.
    pub version: String,

    /// Registry-assigned package key.
    pub key: i64,
}

impl PackageIdentity {
    pub fn new(id: impl Into<String>, version: impl Into<String>, key: i64) -> Self {
        Self {
            id: id.into(),
            version: version.into(),
            key,
        }
    }
}

impl fmt::Display for PackageIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{} (key {})", self.id, self.version, self.key)
    }
}

/// Thumbprint parse errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ThumbprintError {
    #[error("thumbprint must be {THUMBPRINT_LEN} hex characters, got {len}")]
    InvalidLength { len: usize },

    #[error("thumbprint contains non-hex character {ch:?}")]
    InvalidCharacter { ch: char },
}

/// Hex SHA-256 digest of a certificate's DER encoding.
///
/// Equality is exact string equality. Case is preserved as supplied, so a
/// registry entry stored in upper case does not match a computed (lower case)
/// thumbprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Thumbprint(String);

impl Thumbprint {
    /// Parse a thumbprint, checking length and alphabet only.
    pub fn parse(value: impl Into<String>) -> Result<Self, ThumbprintError> {
        let value = value.into();
        if value.len() != THUMBPRINT_LEN {
            return Err(ThumbprintError::InvalidLength { len: value.len() });
        }
        if let Some(ch) = value.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(ThumbprintError::InvalidCharacter { ch });
        }
        Ok(Self(value))
    }

    /// Compute the thumbprint of a DER-encoded certificate.
    pub fn of_certificate(der: &[u8]) -> Self {
        Self(hex::encode(Sha256::digest(der)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Thumbprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Thumbprint {
    type Err = ThumbprintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Thumbprint {
    type Error = ThumbprintError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Thumbprint> for String {
    fn from(value: Thumbprint) -> Self {
        value.0
    }
}

/// A single signature read from a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSignature {
    /// Signing algorithm as declared by the package (e.g., "Ed25519").
    pub algorithm: String,

    /// Signer certificate (DER).
    pub certificate: Vec<u8>,

    /// Thumbprint derived from `certificate`.
    pub thumbprint: Thumbprint,

    /// Raw signature bytes.
    pub signature: Vec<u8>,

    /// Signing time claimed by the signer, if any.
    pub signed_at: Option<DateTime<Utc>>,
}

impl PackageSignature {
    /// Build a signature record, deriving the thumbprint from the certificate.
    pub fn new(
        algorithm: impl Into<String>,
        certificate: Vec<u8>,
        signature: Vec<u8>,
        signed_at: Option<DateTime<Utc>>,
    ) -> Self {
        let thumbprint = Thumbprint::of_certificate(&certificate);
        Self {
            algorithm: algorithm.into(),
            certificate,
            thumbprint,
            signature,
            signed_at,
        }
    }
}

/// Metadata the registry keeps about a known certificate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateMetadata {
    /// Subject or owner of the certificate.
    #[serde(default)]
    pub subject: Option<String>,

    /// Human-readable description.
    #[serde(default)]
    pub description: Option<String>,

    /// When the certificate was registered.
    #[serde(default)]
    pub added_at: Option<DateTime<Utc>>,
}

/// A certificate known to the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownCertificate {
    pub thumbprint: Thumbprint,

    #[serde(flatten)]
    pub metadata: CertificateMetadata,
}

/// Persisted signing state of a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageSigningStatus {
    Unsigned,
    Valid,
    Invalid,
}

impl PackageSigningStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unsigned => "unsigned",
            Self::Valid => "valid",
            Self::Invalid => "invalid",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "unsigned" => Some(Self::Unsigned),
            "valid" => Some(Self::Valid),
            "invalid" => Some(Self::Invalid),
            _ => None,
        }
    }
}

impl fmt::Display for PackageSigningStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thumbprint_of_certificate_is_lower_hex() {
        let tp = Thumbprint::of_certificate(b"certificate bytes");
        assert_eq!(tp.as_str().len(), THUMBPRINT_LEN);
        assert!(tp
            .as_str()
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
        assert_eq!(tp, Thumbprint::of_certificate(b"certificate bytes"));
    }

    #[test]
    fn test_thumbprint_golden_vector() {
        // sha256("abc")
        let tp = Thumbprint::of_certificate(b"abc");
        assert_eq!(
            tp.as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_thumbprint_parse_preserves_case() {
        let lower = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";
        let upper = lower.to_ascii_uppercase();

        let parsed_upper = Thumbprint::parse(upper.clone()).unwrap();
        assert_eq!(parsed_upper.as_str(), upper);
        assert_ne!(parsed_upper, Thumbprint::parse(lower).unwrap());
    }

    #[test]
    fn test_thumbprint_parse_rejects_malformed() {
        assert_eq!(
            Thumbprint::parse("abc"),
            Err(ThumbprintError::InvalidLength { len: 3 })
        );

        let bad = format!("{}z", "0".repeat(THUMBPRINT_LEN - 1));
        assert_eq!(
            Thumbprint::parse(bad),
            Err(ThumbprintError::InvalidCharacter { ch: 'z' })
        );
    }

    #[test]
    fn test_thumbprint_serde_validates() {
        let ok: Thumbprint = serde_json::from_str(&format!("\"{}\"", "a".repeat(64))).unwrap();
        assert_eq!(ok.as_str(), "a".repeat(64));

        let err = serde_json::from_str::<Thumbprint>("\"not-a-thumbprint\"");
        assert!(err.is_err());
    }

    #[test]
    fn test_package_signature_derives_thumbprint() {
        let sig = PackageSignature::new("Ed25519", b"cert".to_vec(), vec![0; 64], None);
        assert_eq!(sig.thumbprint, Thumbprint::of_certificate(b"cert"));
    }

    #[test]
    fn test_signing_status_string_roundtrip() {
        for status in [
            PackageSigningStatus::Unsigned,
            PackageSigningStatus::Valid,
            PackageSigningStatus::Invalid,
        ] {
            assert_eq!(PackageSigningStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(PackageSigningStatus::parse("pending"), None);
    }
}
