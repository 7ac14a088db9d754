//! Balance Log - Recorded Balance Snapshots per Strategy Run
//!
//! Strategy runs periodically append their base/quote holdings to
//! `balances/balance_log.jsonl`. The earliest and latest entries of a run
//! stand in for its start and current balances when no live connection
//! exists.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;
use tracing::{debug, instrument};

use super::jsonl;
use crate::domain::trade::{BalanceBounds, RecordedBalance};

pub struct BalanceLog {
    log_path: PathBuf,
}

impl BalanceLog {
    /// Open the balance log under `data_dir`, creating `balances/` if needed.
    pub async fn new(data_dir: &str) -> Result<Self> {
        let dir = Path::new(data_dir).join("balances");
        fs::create_dir_all(&dir)
            .await
            .context("Failed to create balances directory")?;
        Ok(Self {
            log_path: dir.join("balance_log.jsonl"),
        })
    }

    #[instrument(skip(self, entry), fields(strategy_id = %entry.strategy_id))]
    pub async fn append_balance(&self, entry: &RecordedBalance) -> Result<()> {
        jsonl::append_record(&self.log_path, entry).await
    }

    /// All entries recorded for `strategy_id`, oldest first.
    pub async fn entries_for(&self, strategy_id: &str) -> Result<Vec<RecordedBalance>> {
        let mut entries: Vec<RecordedBalance> = jsonl::read_records::<RecordedBalance>(&self.log_path)
            .await?
            .into_iter()
            .filter(|e| e.strategy_id == strategy_id)
            .collect();
        entries.sort_by_key(|e| e.created_at_ms);
        debug!(strategy_id, count = entries.len(), "Loaded balance log entries");
        Ok(entries)
    }

    /// Earliest and latest entries of `strategy_id`.
    pub async fn bounds(&self, strategy_id: &str) -> Result<Option<BalanceBounds>> {
        let entries = self.entries_for(strategy_id).await?;
        Ok(match (entries.first(), entries.last()) {
            (Some(earliest), Some(latest)) => Some(BalanceBounds {
                earliest: earliest.clone(),
                latest: latest.clone(),
            }),
            _ => None,
        })
    }

    /// Latest entry of `strategy_id`.
    pub async fn latest(&self, strategy_id: &str) -> Result<Option<RecordedBalance>> {
        Ok(self.entries_for(strategy_id).await?.pop())
    }

    pub async fn is_healthy(&self) -> bool {
        match self.log_path.parent() {
            Some(dir) => fs::metadata(dir).await.is_ok(),
            None => false,
        }
    }
}
