//! `sigvet validate` - Run the signature trust decision for one package.
//!
//! Prints the outcome as JSON on stdout. Exit code: 0 succeeded, 1 failed,
//! 2 when a collaborator failed and no decision was recorded.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use sigvet_core::{
    CertificateMetadata, PackageIdentity, SignatureValidator, ValidationOutcome, ValidatorConfig,
};
use sigvet_registry::{
    certificate_from_public_pem, CertificateStore, Ed25519Verifier, FilePackage,
    FsPartsExtractor, SqliteStatusStore,
};
use tracing::{debug, warn};

use crate::cli::args::{data_dir, StateDbArgs};
use crate::exit_codes;

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Package file (signatures are read from <PACKAGE>.sig)
    pub package: PathBuf,

    /// Package id
    #[arg(long)]
    pub id: String,

    /// Package version
    #[arg(long = "version")]
    pub package_version: String,

    /// Registry package key
    #[arg(long)]
    pub key: i64,

    /// Certificates manifest (JSON) [default: <data dir>/sigvet/certificates.json]
    #[arg(long, env = "SIGVET_CERTIFICATES")]
    pub certificates: Option<PathBuf>,

    /// Additionally trust this public key (SPKI PEM); repeatable
    #[arg(long = "trust", value_name = "PEM")]
    pub trusted_keys: Vec<PathBuf>,

    /// Directory for extracted signer certificates [default: <data dir>/sigvet/parts]
    #[arg(long, env = "SIGVET_PARTS_DIR")]
    pub parts_dir: Option<PathBuf>,

    #[command(flatten)]
    pub state: StateDbArgs,
}

#[derive(Serialize)]
struct ValidateReport<'a> {
    package: &'a PackageIdentity,
    #[serde(flatten)]
    outcome: &'a ValidationOutcome,
}

pub async fn run(args: ValidateArgs) -> Result<i32> {
    let validator = match build_validator(&args).await {
        Ok(v) => v,
        Err(e) => {
            eprintln!("error: {e:#}");
            return Ok(exit_codes::INFRASTRUCTURE_ERROR);
        }
    };

    let package = match FilePackage::open(&args.package).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e:#}");
            return Ok(exit_codes::INFRASTRUCTURE_ERROR);
        }
    };

    let identity = PackageIdentity::new(args.id, args.package_version, args.key);

    match validator.validate(&identity, &package).await {
        Ok(outcome) => {
            let report = ValidateReport {
                package: &identity,
                outcome: &outcome,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);

            Ok(if outcome.is_succeeded() {
                exit_codes::SUCCESS
            } else {
                exit_codes::REJECTED
            })
        }
        Err(e) => {
            eprintln!("error: {e}");
            if e.is_retryable() {
                eprintln!("hint: the failure may be transient; retry the validation");
            }
            Ok(exit_codes::INFRASTRUCTURE_ERROR)
        }
    }
}

async fn build_validator(args: &ValidateArgs) -> Result<SignatureValidator> {
    let certificates = load_certificates(args).await?;

    let parts_dir = args
        .parts_dir
        .clone()
        .unwrap_or_else(|| data_dir().join("parts"));

    let state_db = args.state.resolve();
    if let Some(parent) = state_db.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }
    let store = SqliteStatusStore::open(&state_db)
        .with_context(|| format!("failed to open state database: {}", state_db.display()))?;

    debug!(
        state_db = %state_db.display(),
        parts_dir = %parts_dir.display(),
        "collaborators ready"
    );

    Ok(SignatureValidator::new(
        Arc::new(certificates),
        Arc::new(Ed25519Verifier::new()),
        Arc::new(FsPartsExtractor::new(parts_dir)),
        Arc::new(store),
    )
    .with_config(ValidatorConfig::from_env()))
}

async fn load_certificates(args: &ValidateArgs) -> Result<CertificateStore> {
    let store = CertificateStore::new();

    match &args.certificates {
        Some(path) => {
            store.load_manifest_file(path).await?;
        }
        None => {
            let default_path = data_dir().join("certificates.json");
            if default_path.exists() {
                store.load_manifest_file(&default_path).await?;
            } else {
                debug!(path = %default_path.display(), "no certificates manifest");
            }
        }
    }

    for path in &args.trusted_keys {
        pin_public_key(&store, path).await?;
    }

    if store.list().await.is_empty() {
        warn!("no trusted certificates configured; every signed package will be rejected");
    }

    Ok(store)
}

async fn pin_public_key(store: &CertificateStore, path: &Path) -> Result<()> {
    let pem = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read public key: {}", path.display()))?;
    let der = certificate_from_public_pem(&pem)?;

    let metadata = CertificateMetadata {
        description: Some(format!("pinned from {}", path.display())),
        ..Default::default()
    };
    let thumbprint = store.add_certificate(&der, metadata).await;
    debug!(%thumbprint, "pinned trusted key");
    Ok(())
}
