//! Use Cases Layer - Application Business Logic
//!
//! Orchestrates domain logic with port interfaces to implement the
//! analytics workflows. Each use case is a self-contained operation.
//!
//! Use cases:
//! - `WindowReporter`: Per-market performance since a start time
//! - `FullReporter`: Cross-portfolio rows over the whole history
//! - `ReportService`: Single task owning both reporters
//! - `KillSwitch`: Profitability safety cutoff

pub mod error;
pub mod full_report;
pub mod kill_switch;
pub mod report_service;
pub mod window_report;

pub use error::ReportError;
pub use full_report::FullReporter;
pub use kill_switch::{KillSwitch, KillSwitchDecision, KillSwitchMonitor};
pub use report_service::{ReportHandle, ReportRequest, ReportService};
pub use window_report::{RecentTrades, WindowReporter};
