//! End-to-end validation with the concrete collaborators.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use ed25519_dalek::SigningKey;
use sigvet_core::{
    CertificateMetadata, IssueCode, PackageIdentity, PackageSigningStatus, SignatureValidator,
    ValidationState,
};
use sigvet_registry::{
    append_signature, certificate_der, sign_package, CertificateStore, CertificatesManifest,
    Ed25519Verifier, FilePackage, FsPartsExtractor, ManifestCertificate, SqliteStatusStore,
};
use tempfile::TempDir;

struct Pipeline {
    dir: TempDir,
    certificates: CertificateStore,
    extractor: FsPartsExtractor,
    store: SqliteStatusStore,
    validator: SignatureValidator,
}

impl Pipeline {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let certificates = CertificateStore::new();
        let extractor = FsPartsExtractor::new(dir.path().join("parts"));
        let store = SqliteStatusStore::open(&dir.path().join("state.db")).unwrap();

        let validator = SignatureValidator::new(
            Arc::new(certificates.clone()),
            Arc::new(Ed25519Verifier::new()),
            Arc::new(extractor.clone()),
            Arc::new(store.clone()),
        );

        Self {
            dir,
            certificates,
            extractor,
            store,
            validator,
        }
    }

    fn write_package(&self, name: &str, content: &[u8]) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    async fn trust(&self, key: &SigningKey) {
        let der = certificate_der(&key.verifying_key()).unwrap();
        self.certificates
            .add_certificate(&der, CertificateMetadata::default())
            .await;
    }

    async fn validate(&self, path: &Path, key: i64) -> sigvet_core::ValidationOutcome {
        let package = FilePackage::open(path).await.unwrap();
        let identity = PackageIdentity::new("Contoso.Logging", "1.0.0", key);
        self.validator.validate(&identity, &package).await.unwrap()
    }

    fn status(&self, key: i64) -> Option<PackageSigningStatus> {
        self.store.get(key).unwrap().map(|row| row.status)
    }
}

fn generate_keypair() -> SigningKey {
    SigningKey::generate(&mut rand::thread_rng())
}

async fn sign(path: &Path, key: &SigningKey) {
    let content = std::fs::read(path).unwrap();
    let entry = sign_package(&content, key, Some(Utc::now())).unwrap();
    append_signature(path, entry).await.unwrap();
}

#[tokio::test]
async fn test_unsigned_package_is_accepted() {
    let pipeline = Pipeline::new();
    let path = pipeline.write_package("a.pkg", b"payload");

    let outcome = pipeline.validate(&path, 1).await;

    assert_eq!(outcome.state(), ValidationState::Succeeded);
    assert!(outcome.issues().is_empty());
    assert_eq!(pipeline.status(1), Some(PackageSigningStatus::Unsigned));
    assert!(pipeline.extractor.read_record(1).await.unwrap().is_none());
}

#[tokio::test]
async fn test_signed_by_known_certificate_is_valid() {
    let pipeline = Pipeline::new();
    let key = generate_keypair();
    pipeline.trust(&key).await;

    let path = pipeline.write_package("a.pkg", b"payload");
    sign(&path, &key).await;

    let outcome = pipeline.validate(&path, 2).await;

    assert_eq!(outcome.state(), ValidationState::Succeeded);
    assert_eq!(pipeline.status(2), Some(PackageSigningStatus::Valid));

    let record = pipeline.extractor.read_record(2).await.unwrap().unwrap();
    assert_eq!(record.thumbprints.len(), 1);
    assert!(pipeline
        .extractor
        .certificate_path(&record.thumbprints[0])
        .exists());
}

#[tokio::test]
async fn test_unknown_signer_is_rejected() {
    let pipeline = Pipeline::new();
    let key = generate_keypair();

    let path = pipeline.write_package("a.pkg", b"payload");
    sign(&path, &key).await;

    let outcome = pipeline.validate(&path, 3).await;

    assert_eq!(outcome.state(), ValidationState::Failed);
    assert_eq!(outcome.issues().len(), 1);
    assert_eq!(outcome.issues()[0].code, IssueCode::UnrecognizedSigner);
    assert_eq!(pipeline.status(3), Some(PackageSigningStatus::Invalid));
    assert!(pipeline.extractor.read_record(3).await.unwrap().is_none());
}

#[tokio::test]
async fn test_tampered_content_is_rejected_with_issues() {
    let pipeline = Pipeline::new();
    let key = generate_keypair();
    pipeline.trust(&key).await;

    let path = pipeline.write_package("a.pkg", b"payload");
    sign(&path, &key).await;
    std::fs::write(&path, b"tampered").unwrap();

    let outcome = pipeline.validate(&path, 4).await;

    assert_eq!(outcome.state(), ValidationState::Failed);
    let codes: Vec<IssueCode> = outcome.issues().iter().map(|i| i.code).collect();
    assert_eq!(codes, vec![IssueCode::SignatureInvalid]);
    assert_eq!(pipeline.status(4), Some(PackageSigningStatus::Invalid));
}

#[tokio::test]
async fn test_two_signatures_are_rejected_without_issues() {
    let pipeline = Pipeline::new();
    let first = generate_keypair();
    let second = generate_keypair();
    pipeline.trust(&first).await;
    pipeline.trust(&second).await;

    let path = pipeline.write_package("a.pkg", b"payload");
    sign(&path, &first).await;
    sign(&path, &second).await;

    let outcome = pipeline.validate(&path, 5).await;

    assert_eq!(outcome.state(), ValidationState::Failed);
    assert!(outcome.issues().is_empty());
    assert_eq!(pipeline.status(5), Some(PackageSigningStatus::Invalid));
}

#[tokio::test]
async fn test_manifest_trusted_signer_is_valid() {
    let pipeline = Pipeline::new();
    let key = generate_keypair();
    let der = certificate_der(&key.verifying_key()).unwrap();

    let manifest = CertificatesManifest {
        version: sigvet_registry::MANIFEST_VERSION,
        certificates: vec![ManifestCertificate {
            thumbprint: sigvet_core::Thumbprint::of_certificate(&der).to_string(),
            certificate: None,
            subject: Some("Contoso".to_string()),
            description: None,
            added_at: None,
            revoked: false,
        }],
    };
    pipeline.certificates.add_from_manifest(&manifest).await.unwrap();

    let path = pipeline.write_package("a.pkg", b"payload");
    sign(&path, &key).await;

    let outcome = pipeline.validate(&path, 6).await;
    assert!(outcome.is_succeeded());
    assert_eq!(pipeline.status(6), Some(PackageSigningStatus::Valid));
}

#[tokio::test]
async fn test_revalidation_overwrites_status() {
    let pipeline = Pipeline::new();
    let key = generate_keypair();

    let path = pipeline.write_package("a.pkg", b"payload");
    sign(&path, &key).await;

    pipeline.validate(&path, 7).await;
    assert_eq!(pipeline.status(7), Some(PackageSigningStatus::Invalid));

    pipeline.trust(&key).await;
    pipeline.validate(&path, 7).await;
    assert_eq!(pipeline.status(7), Some(PackageSigningStatus::Valid));
    assert_eq!(pipeline.store.list().unwrap().len(), 1);
}
