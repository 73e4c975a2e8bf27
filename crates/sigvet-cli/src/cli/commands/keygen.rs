//! `sigvet keygen` - Create a package signing keypair.

use anyhow::Result;
use clap::Args;
use sigvet_registry::{Keypair, RegistryError};
use std::path::PathBuf;

use crate::exit_codes;

#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Directory to write private_key.pem and public_key.pem into
    #[arg(long, default_value = ".")]
    pub out: PathBuf,

    /// Replace keys already present in the directory
    #[arg(long, short)]
    pub force: bool,
}

pub fn cmd_keygen(args: KeygenArgs) -> i32 {
    match run_keygen(&args) {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            exit_codes::REJECTED
        }
    }
}

fn run_keygen(args: &KeygenArgs) -> Result<()> {
    let keypair = Keypair::generate();
    let files = match keypair.write_pem_files(&args.out, args.force) {
        Err(e @ RegistryError::Exists { .. }) => {
            anyhow::bail!("{e} (use --force to overwrite)")
        }
        other => other?,
    };

    println!("private key: {}", files.private_key.display());
    println!("public key:  {}", files.public_key.display());
    println!("thumbprint: {}", keypair.thumbprint()?);
    Ok(())
}
