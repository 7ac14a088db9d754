//! Trade Log - Append-only JSONL Fill Records
//!
//! Fills live in daily files `trades/YYYY-MM-DD.jsonl`, partitioned by
//! the fill's own timestamp. Strategy engines append; the analytics engine
//! only reads.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::DateTime;
use tokio::fs;
use tracing::{debug, instrument};

use super::jsonl;
use crate::domain::trade::TradeFill;

/// Append-only JSONL trade log with daily file rotation.
pub struct TradeLog {
    trades_dir: PathBuf,
}

impl TradeLog {
    /// Open the trade log under `data_dir`, creating `trades/` if needed.
    pub async fn new(data_dir: &str) -> Result<Self> {
        let trades_dir = Path::new(data_dir).join("trades");
        fs::create_dir_all(&trades_dir)
            .await
            .context("Failed to create trades directory")?;
        Ok(Self { trades_dir })
    }

    /// Append a fill to the file of the day it was executed.
    #[instrument(skip(self, fill), fields(market = %fill.market, symbol = %fill.symbol))]
    pub async fn append_fill(&self, fill: &TradeFill) -> Result<()> {
        let date = DateTime::from_timestamp_millis(fill.timestamp_ms)
            .with_context(|| format!("Fill timestamp out of range: {}", fill.timestamp_ms))?
            .format("%Y-%m-%d")
            .to_string();
        let path = self.trades_dir.join(format!("{date}.jsonl"));
        jsonl::append_record(&path, fill).await
    }

    /// Load every fill from every daily file, ascending by timestamp.
    #[instrument(skip(self))]
    pub async fn load_all_fills(&self) -> Result<Vec<TradeFill>> {
        let mut fills: Vec<TradeFill> = jsonl::read_dir_records(&self.trades_dir).await?;
        fills.sort_by_key(|f| f.timestamp_ms);
        debug!(count = fills.len(), "Loaded trade fills");
        Ok(fills)
    }

    /// Check that the trades directory is still present.
    pub async fn is_healthy(&self) -> bool {
        fs::metadata(&self.trades_dir)
            .await
            .is_ok_and(|meta| meta.is_dir())
    }
}
