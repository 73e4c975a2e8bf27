//! `sigvet sign` - Append a detached signature to a package.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use sigvet_core::Thumbprint;
use sigvet_registry::{
    append_signature, certificate_der, sign_package, signature_path, signing_key_from_pem,
};
use std::path::PathBuf;

use crate::exit_codes;

#[derive(Args, Debug)]
pub struct SignArgs {
    /// Package file to sign
    pub package: PathBuf,

    /// Private key (PKCS#8 PEM)
    #[arg(long)]
    pub key: PathBuf,

    /// Omit the signing time from the signature entry
    #[arg(long)]
    pub no_timestamp: bool,
}

pub async fn cmd_sign(args: SignArgs) -> i32 {
    match run_sign(args).await {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            exit_codes::REJECTED
        }
    }
}

async fn run_sign(args: SignArgs) -> Result<()> {
    let pem = tokio::fs::read_to_string(&args.key)
        .await
        .with_context(|| format!("failed to read private key: {}", args.key.display()))?;
    let signing_key = signing_key_from_pem(&pem)?;

    let content = tokio::fs::read(&args.package)
        .await
        .with_context(|| format!("failed to read package: {}", args.package.display()))?;

    let signed_at = (!args.no_timestamp).then(Utc::now);
    let entry = sign_package(&content, &signing_key, signed_at)?;
    let file = append_signature(&args.package, entry).await?;

    let thumbprint = Thumbprint::of_certificate(&certificate_der(&signing_key.verifying_key())?);
    tracing::debug!(package = %args.package.display(), %thumbprint, "package signed");

    println!(
        "Signed {} ({} signature(s) in {})",
        args.package.display(),
        file.signatures.len(),
        signature_path(&args.package).display()
    );
    println!("thumbprint: {thumbprint}");

    Ok(())
}
