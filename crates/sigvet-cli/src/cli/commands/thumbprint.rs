//! `sigvet thumbprint` - Print the certificate thumbprint for a key file.

use anyhow::{Context, Result};
use clap::Args;
use sigvet_core::Thumbprint;
use sigvet_registry::{certificate_der, certificate_from_public_pem, signing_key_from_pem};
use std::path::PathBuf;

use crate::exit_codes;

#[derive(Args, Debug)]
pub struct ThumbprintArgs {
    /// Public key (SPKI PEM) or private key (PKCS#8 PEM)
    pub key: PathBuf,
}

pub fn cmd_thumbprint(args: ThumbprintArgs) -> i32 {
    match thumbprint_from_pem_file(&args.key) {
        Ok(thumbprint) => {
            println!("{thumbprint}");
            exit_codes::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e:#}");
            exit_codes::REJECTED
        }
    }
}

fn thumbprint_from_pem_file(path: &std::path::Path) -> Result<Thumbprint> {
    let pem = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read key: {}", path.display()))?;

    let der = match certificate_from_public_pem(&pem) {
        Ok(der) => der,
        Err(public_err) => {
            let signing_key = signing_key_from_pem(&pem).map_err(|_| public_err)?;
            certificate_der(&signing_key.verifying_key())?
        }
    };
    Ok(Thumbprint::of_certificate(&der))
}
