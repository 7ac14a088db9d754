//! Persistence Adapters - JSONL-based File Storage
//!
//! Implements the `TradeRecordSource` port over append-only JSONL files:
//! daily fill files and a per-run balance log. No database dependency.

mod jsonl;

pub mod balances;
pub mod repository_impl;
pub mod trades;

pub use balances::BalanceLog;
pub use repository_impl::RepositoryImpl;
pub use trades::TradeLog;
