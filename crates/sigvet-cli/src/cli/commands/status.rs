//! `sigvet status` - Show recorded signing status.

use anyhow::{Context, Result};
use clap::Args;
use sigvet_registry::SqliteStatusStore;

use crate::cli::args::StateDbArgs;
use crate::exit_codes;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Registry package key; omit to list every package
    #[arg(long)]
    pub key: Option<i64>,

    #[command(flatten)]
    pub state: StateDbArgs,
}

pub async fn run(args: StatusArgs) -> Result<i32> {
    let path = args.state.resolve();
    if !path.exists() {
        eprintln!("error: state database not found: {}", path.display());
        return Ok(exit_codes::REJECTED);
    }

    let store = SqliteStatusStore::open(&path)
        .with_context(|| format!("failed to open state database: {}", path.display()))?;

    let key = args.key;
    let json = tokio::task::spawn_blocking(move || -> Result<Option<String>> {
        Ok(match key {
            Some(key) => match store.get(key)? {
                Some(row) => Some(serde_json::to_string_pretty(&row)?),
                None => None,
            },
            None => Some(serde_json::to_string_pretty(&store.list()?)?),
        })
    })
    .await??;

    match json {
        Some(json) => {
            println!("{json}");
            Ok(exit_codes::SUCCESS)
        }
        None => {
            eprintln!("no signing status recorded for package key {}", args.key.unwrap_or_default());
            Ok(exit_codes::REJECTED)
        }
    }
}
