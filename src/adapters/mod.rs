//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! infrastructure (JSONL files, Prometheus, axum). Each sub-module groups
//! adapters by infrastructure concern.
//!
//! Adapter categories:
//! - `balances`: paper and recorded balance sources
//! - `http`: report, health and metrics endpoints
//! - `metrics`: Prometheus report metrics
//! - `oracles`: static and last-fill price oracles
//! - `persistence`: JSONL trade and balance logs
//! - `render`: console tables and JSON report documents

pub mod balances;
pub mod http;
pub mod metrics;
pub mod oracles;
pub mod persistence;
pub mod render;
