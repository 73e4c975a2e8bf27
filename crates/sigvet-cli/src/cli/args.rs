use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use super::commands::{keygen, sign, status, thumbprint, validate};

#[derive(Parser)]
#[command(
    name = "sigvet",
    version,
    about = "Signature trust decisions for registry package ingestion"
)]
pub struct Cli {
    /// Log output format (logs go to stderr)
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text, env = "SIGVET_LOG_FORMAT")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate an ed25519 signing keypair
    Keygen(keygen::KeygenArgs),
    /// Append a signature to a package's .sig file
    Sign(sign::SignArgs),
    /// Print the certificate thumbprint of a key
    Thumbprint(thumbprint::ThumbprintArgs),
    /// Decide whether a package's signature is acceptable and record it
    Validate(validate::ValidateArgs),
    /// Show recorded signing status
    Status(status::StatusArgs),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Location of the signing state database.
#[derive(Args, Debug, Clone)]
pub struct StateDbArgs {
    /// SQLite signing state database [default: <data dir>/sigvet/state.db]
    #[arg(long, env = "SIGVET_STATE_DB")]
    pub state_db: Option<PathBuf>,
}

impl StateDbArgs {
    pub fn resolve(&self) -> PathBuf {
        self.state_db
            .clone()
            .unwrap_or_else(|| data_dir().join("state.db"))
    }
}

/// Per-user sigvet data directory, falling back to `./.sigvet`.
pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("sigvet"))
        .unwrap_or_else(|| PathBuf::from(".sigvet"))
}
