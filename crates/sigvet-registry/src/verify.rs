//! Ed25519 package signature verification.
//!
//! Per signature:
//! - declared algorithm must be Ed25519
//! - certificate must decode as an Ed25519 SPKI public key
//! - signature must be 64 bytes and verify over PAE(payload type, content)
//!
//! Missing or future-dated signing times are reported as warnings only.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use ed25519_dalek::{Signature, Verifier};
use sigvet_core::{
    PackageSignature, SignatureReport, SignatureVerifier, SignedPackage, VerifierCode,
    VerifierIssue, VerifyReport,
};

use crate::keys::{verifying_key_from_certificate, ALGORITHM_ED25519};
use crate::package::{build_pae, PAYLOAD_TYPE_PACKAGE_V1};

/// Default tolerance for signer clocks running ahead.
pub const DEFAULT_MAX_CLOCK_SKEW_SECS: i64 = 5 * 60;

/// Verifies detached Ed25519 package signatures.
#[derive(Debug, Clone)]
pub struct Ed25519Verifier {
    max_clock_skew: Duration,
}

impl Ed25519Verifier {
    pub fn new() -> Self {
        Self {
            max_clock_skew: Duration::seconds(DEFAULT_MAX_CLOCK_SKEW_SECS),
        }
    }

    /// Set the tolerated clock skew for signing times.
    pub fn with_max_clock_skew(mut self, skew: Duration) -> Self {
        self.max_clock_skew = skew;
        self
    }

    /// Verify already-read content and signatures.
    pub fn verify_signatures(
        &self,
        content: &[u8],
        signatures: &[PackageSignature],
        now: DateTime<Utc>,
    ) -> VerifyReport {
        if signatures.is_empty() {
            return VerifyReport::invalid(vec![SignatureReport {
                thumbprint: None,
                issues: vec![VerifierIssue::error(
                    VerifierCode::NoSignatures,
                    "package is marked signed but carries no signatures",
                )],
            }]);
        }

        let pae = build_pae(PAYLOAD_TYPE_PACKAGE_V1, content);
        let reports: Vec<SignatureReport> = signatures
            .iter()
            .map(|sig| SignatureReport {
                thumbprint: Some(sig.thumbprint.clone()),
                issues: self.check_signature(sig, &pae, now),
            })
            .collect();

        let valid = reports
            .iter()
            .all(|r| r.issues.iter().all(|i| !i.is_error()));

        VerifyReport {
            valid,
            signatures: reports,
        }
    }

    fn check_signature(
        &self,
        sig: &PackageSignature,
        pae: &[u8],
        now: DateTime<Utc>,
    ) -> Vec<VerifierIssue> {
        let mut issues = self.check_timestamp(sig, now);

        if sig.algorithm != ALGORITHM_ED25519 {
            issues.push(VerifierIssue::error(
                VerifierCode::UnsupportedAlgorithm,
                format!("unsupported signature algorithm: {}", sig.algorithm),
            ));
            return issues;
        }

        let key = match verifying_key_from_certificate(&sig.certificate) {
            Ok(key) => key,
            Err(e) => {
                issues.push(VerifierIssue::error(
                    VerifierCode::CertificateInvalid,
                    e.to_string(),
                ));
                return issues;
            }
        };

        let signature = match Signature::from_slice(&sig.signature) {
            Ok(signature) => signature,
            Err(e) => {
                issues.push(VerifierIssue::error(
                    VerifierCode::MalformedSignature,
                    format!("invalid signature bytes: {}", e),
                ));
                return issues;
            }
        };

        if key.verify(pae, &signature).is_err() {
            issues.push(VerifierIssue::error(
                VerifierCode::SignatureInvalid,
                "ed25519 verification failed",
            ));
        }

        issues
    }

    fn check_timestamp(&self, sig: &PackageSignature, now: DateTime<Utc>) -> Vec<VerifierIssue> {
        match sig.signed_at {
            None => vec![VerifierIssue::warning(
                VerifierCode::MissingTimestamp,
                "signature has no signing time",
            )],
            Some(at) if at > now + self.max_clock_skew => vec![VerifierIssue::warning(
                VerifierCode::TimestampInFuture,
                format!("signing time {} is in the future", at.to_rfc3339()),
            )],
            Some(_) => Vec::new(),
        }
    }
}

impl Default for Ed25519Verifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SignatureVerifier for Ed25519Verifier {
    async fn verify(&self, package: &dyn SignedPackage) -> anyhow::Result<VerifyReport> {
        let content = package.content().await?;
        let signatures = package.signatures().await?;
        Ok(self.verify_signatures(&content, &signatures, Utc::now()))
    }

    fn name(&self) -> &'static str {
        "ed25519"
    }
}
