//! Signature trust-decision engine.
//!
//! # Decision order
//!
//! 1. Unsigned packages are accepted as `Unsigned`.
//! 2. Signed packages must carry exactly one signature; otherwise `Invalid`
//!    with no issues.
//! 3. Every signer thumbprint must be known to the registry; otherwise
//!    `Invalid` with a single `UnrecognizedSigner` issue.
//! 4. The verifier must report the package valid; otherwise `Invalid` with one
//!    issue per verifier error.
//! 5. The certificate chain is extracted and the package is marked `Valid`.
//!
//! Evaluation stops at the first failing step. Each completed run writes the
//! status exactly once, before the outcome is returned.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, info, warn, Instrument};

use crate::collaborators::{
    CertificateRegistry, PartsExtractor, SignatureVerifier, SignedPackage, StatusStore,
};
use crate::config::ValidatorConfig;
use crate::error::{Collaborator, ValidationError, ValidationResult};
use crate::issue::ValidationIssue;
use crate::outcome::ValidationOutcome;
use crate::types::{PackageIdentity, PackageSignature, PackageSigningStatus, Thumbprint};

/// Status to persist together with the outcome to return.
#[derive(Debug)]
struct Decision {
    status: PackageSigningStatus,
    outcome: ValidationOutcome,
}

impl Decision {
    fn accept(status: PackageSigningStatus) -> Self {
        Self {
            status,
            outcome: ValidationOutcome::succeeded(),
        }
    }

    fn reject(outcome: ValidationOutcome) -> Self {
        Self {
            status: PackageSigningStatus::Invalid,
            outcome,
        }
    }
}

/// Decides whether a package's signature is acceptable and records the result.
///
/// Holds no mutable state; share it behind an `Arc` to validate many packages
/// concurrently.
pub struct SignatureValidator {
    registry: Arc<dyn CertificateRegistry>,
    verifier: Arc<dyn SignatureVerifier>,
    extractor: Arc<dyn PartsExtractor>,
    store: Arc<dyn StatusStore>,
    config: ValidatorConfig,
}

impl SignatureValidator {
    pub fn new(
        registry: Arc<dyn CertificateRegistry>,
        verifier: Arc<dyn SignatureVerifier>,
        extractor: Arc<dyn PartsExtractor>,
        store: Arc<dyn StatusStore>,
    ) -> Self {
        Self {
            registry,
            verifier,
            extractor,
            store,
            config: ValidatorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ValidatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Validate one package.
    ///
    /// Policy rejections come back as `Ok` with a `Failed` outcome. `Err` means
    /// a collaborator failed and nothing was persisted by this run.
    pub async fn validate(
        &self,
        identity: &PackageIdentity,
        package: &dyn SignedPackage,
    ) -> ValidationResult<ValidationOutcome> {
        let span = tracing::info_span!(
            "signature_validation",
            package_id = %identity.id,
            package_version = %identity.version,
            package_key = identity.key,
        );

        async move {
            let decision = self.decide(identity, package).await?;

            self.call(
                Collaborator::StatusStore,
                self.store.set_status(identity, decision.status),
            )
            .await?;

            info!(
                status = %decision.status,
                state = %decision.outcome.state(),
                issues = decision.outcome.issues().len(),
                "signature validation complete"
            );
            Ok(decision.outcome)
        }
        .instrument(span)
        .await
    }

    async fn decide(
        &self,
        identity: &PackageIdentity,
        package: &dyn SignedPackage,
    ) -> ValidationResult<Decision> {
        let signed = self
            .call(Collaborator::PackageReader, package.is_signed())
            .await?;
        if !signed {
            debug!("package is unsigned, no certificate trust required");
            return Ok(Decision::accept(PackageSigningStatus::Unsigned));
        }

        let signatures = self
            .call(Collaborator::PackageReader, package.signatures())
            .await?;
        if signatures.len() != 1 {
            warn!(
                signature_count = signatures.len(),
                "signed package must carry exactly one signature"
            );
            return Ok(Decision::reject(ValidationOutcome::failed()));
        }

        let unknown = self.unknown_signers(&signatures).await?;
        if !unknown.is_empty() {
            let thumbprints: Vec<&str> = unknown.iter().map(Thumbprint::as_str).collect();
            warn!(?thumbprints, "package signed by unrecognized certificate");
            return Ok(Decision::reject(ValidationOutcome::failed_with(vec![
                ValidationIssue::unrecognized_signer(&unknown),
            ])));
        }

        debug!(verifier = self.verifier.name(), "verifying package signature");
        let report = self
            .call(Collaborator::SignatureVerifier, self.verifier.verify(package))
            .await?;

        for warning in report.warnings() {
            warn!(code = ?warning.code, message = %warning.message, "verifier warning");
        }

        if !report.valid {
            let issues: Vec<ValidationIssue> = report.errors().map(ValidationIssue::from).collect();
            warn!(errors = issues.len(), "signature verification failed");
            return Ok(Decision::reject(ValidationOutcome::failed_with(issues)));
        }

        self.call(
            Collaborator::PartsExtractor,
            self.extractor.extract(identity, package),
        )
        .await?;
        debug!("signature parts extracted");

        Ok(Decision::accept(PackageSigningStatus::Valid))
    }

    /// Signer thumbprints absent from the registry, sorted and deduplicated.
    async fn unknown_signers(
        &self,
        signatures: &[PackageSignature],
    ) -> ValidationResult<Vec<Thumbprint>> {
        let known = self
            .call(
                Collaborator::CertificateRegistry,
                self.registry.known_thumbprints(),
            )
            .await?;

        let mut unknown: Vec<Thumbprint> = signatures
            .iter()
            .map(|s| &s.thumbprint)
            .filter(|t| !known.contains(*t))
            .cloned()
            .collect();
        unknown.sort();
        unknown.dedup();
        Ok(unknown)
    }

    /// Await a collaborator call, applying the configured timeout.
    async fn call<T, F>(&self, collaborator: Collaborator, fut: F) -> ValidationResult<T>
    where
        F: Future<Output = anyhow::Result<T>>,
    {
        let result = match self.config.collaborator_timeout {
            Some(after) => tokio::time::timeout(after, fut)
                .await
                .map_err(|_| ValidationError::Timeout {
                    collaborator,
                    after,
                })?,
            None => fut.await,
        };

        result.map_err(|e| ValidationError::from_collaborator(collaborator, e))
    }
}
