//! CLI subcommand implementations for the batchwise binary.

pub mod batches_cmd;
pub mod charts_cmd;
pub mod diff_cmd;
pub mod ingest_cmd;
pub mod output;
pub mod status;
pub mod table_cmd;

use crate::store::BatchStore;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Default store location: `~/.batchwise/batchwise.db`.
pub fn default_db_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".batchwise")
        .join("batchwise.db")
}

/// Open the store at `db`, creating missing parent directories first.
pub fn open_store(db: &Path) -> Result<BatchStore> {
    if let Some(parent) = db.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    Ok(BatchStore::open(db)?)
}
