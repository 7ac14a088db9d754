//! Report Service - Single Task Owning the Analytics Engine
//!
//! Callers never touch the reporters directly. They hold a cloneable
//! `ReportHandle` that submits `ReportRequest`s over a bounded mpsc
//! channel and awaits the answer on a oneshot. The service task handles
//! one request at a time and stops on the broadcast shutdown signal or
//! when every handle is dropped.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::domain::report::{FullReport, Report, ReportFailure};
use crate::ports::balance_source::BalanceSource;
use crate::ports::price_oracle::PriceOracle;
use crate::ports::report_metrics::{ReportKind, ReportMetrics};
use crate::ports::trade_source::TradeRecordSource;

use super::error::ReportError;
use super::full_report::FullReporter;
use super::window_report::{RecentTrades, WindowReporter};

/// A request to the report service.
#[derive(Debug)]
pub enum ReportRequest {
  Window {
    scope: Option<String>,
    start_time: DateTime<Utc>,
    reply: oneshot::Sender<Result<Report, ReportError>>,
  },
  Profitability {
    scope: Option<String>,
    start_time: DateTime<Utc>,
    reply: oneshot::Sender<Result<Option<Decimal>, ReportError>>,
  },
  RecentTrades {
    scope: Option<String>,
    start_time: DateTime<Utc>,
    max_rows: usize,
    reply: oneshot::Sender<Result<RecentTrades, ReportError>>,
  },
  Full {
    start_time: DateTime<Utc>,
    reply: oneshot::Sender<FullReport>,
  },
}

impl ReportRequest {
  fn kind(&self) -> ReportKind {
    match self {
      Self::Window { .. } => ReportKind::Window,
      Self::Profitability { .. } => ReportKind::Profitability,
      Self::RecentTrades { .. } => ReportKind::RecentTrades,
      Self::Full { .. } => ReportKind::Full,
    }
  }
}

/// Cloneable client side of the report service.
#[derive(Debug, Clone)]
pub struct ReportHandle {
  tx: mpsc::Sender<ReportRequest>,
}

impl ReportHandle {
  /// Whether the service task still accepts requests.
  pub fn is_running(&self) -> bool {
    !self.tx.is_closed()
  }

  pub async fn window_report(
    &self,
    scope: Option<String>,
    start_time: DateTime<Utc>,
  ) -> Result<Report, ReportError> {
    let (reply, rx) = oneshot::channel();
    self
      .submit(ReportRequest::Window {
        scope,
        start_time,
        reply,
      })
      .await?;
    rx.await.map_err(|_| ReportError::ServiceStopped)?
  }

  pub async fn current_profitability(
    &self,
    scope: Option<String>,
    start_time: DateTime<Utc>,
  ) -> Result<Option<Decimal>, ReportError> {
    let (reply, rx) = oneshot::channel();
    self
      .submit(ReportRequest::Profitability {
        scope,
        start_time,
        reply,
      })
      .await?;
    rx.await.map_err(|_| ReportError::ServiceStopped)?
  }

  pub async fn recent_trades(
    &self,
    scope: Option<String>,
    start_time: DateTime<Utc>,
    max_rows: usize,
  ) -> Result<RecentTrades, ReportError> {
    let (reply, rx) = oneshot::channel();
    self
      .submit(ReportRequest::RecentTrades {
        scope,
        start_time,
        max_rows,
        reply,
      })
      .await?;
    rx.await.map_err(|_| ReportError::ServiceStopped)?
  }

  /// Full report. A stopped service is reported as a failure value, like
  /// every other full-report failure.
  pub async fn full_report(&self, start_time: DateTime<Utc>) -> FullReport {
    let (reply, rx) = oneshot::channel();
    let outcome = match self.submit(ReportRequest::Full { start_time, reply }).await {
      Ok(()) => rx.await.map_err(|_| ReportError::ServiceStopped),
      Err(e) => Err(e),
    };
    outcome.unwrap_or_else(|e| {
      FullReport::Failed(ReportFailure {
        error: e.to_string(),
        trace: None,
      })
    })
  }

  async fn submit(&self, request: ReportRequest) -> Result<(), ReportError> {
    self
      .tx
      .send(request)
      .await
      .map_err(|_| ReportError::ServiceStopped)
  }
}

/// The task that owns the reporters.
pub struct ReportService<T: TradeRecordSource, B: BalanceSource, O: PriceOracle> {
  window: WindowReporter<T, B, O>,
  full: FullReporter<T>,
  metrics: Arc<dyn ReportMetrics>,
  rx: mpsc::Receiver<ReportRequest>,
  shutdown_rx: broadcast::Receiver<()>,
}

impl<T: TradeRecordSource, B: BalanceSource, O: PriceOracle> ReportService<T, B, O> {
  /// Create the service and its first handle.
  pub fn new(
    window: WindowReporter<T, B, O>,
    full: FullReporter<T>,
    metrics: Arc<dyn ReportMetrics>,
    shutdown_rx: broadcast::Receiver<()>,
    capacity: usize,
  ) -> (Self, ReportHandle) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let service = Self {
      window,
      full,
      metrics,
      rx,
      shutdown_rx,
    };
    (service, ReportHandle { tx })
  }

  /// Serve requests until shutdown or until every handle is dropped.
  #[instrument(skip(self))]
  pub async fn run(mut self) {
    info!("Report service started");
    loop {
      tokio::select! {
        _ = self.shutdown_rx.recv() => {
          info!("Shutdown signal received, stopping report service");
          break;
        }
        request = self.rx.recv() => {
          match request {
            Some(request) => self.handle(request).await,
            None => {
              debug!("All report handles dropped");
              break;
            }
          }
        }
      }
    }
  }

  async fn handle(&self, request: ReportRequest) {
    let request_id = Uuid::new_v4();
    let kind = request.kind();
    debug!(request_id = %request_id, kind = kind.as_str(), "Handling report request");
    let started = Instant::now();

    match request {
      ReportRequest::Window {
        scope,
        start_time,
        reply,
      } => {
        let result = self.window.window_report(scope.as_deref(), start_time).await;
        if let (Ok(report), Some(scope)) = (&result, scope.as_deref()) {
          self.metrics.average_return(scope, report.average_return);
        }
        self.observe(kind, started, result.as_ref().err());
        let _ = reply.send(result);
      }
      ReportRequest::Profitability {
        scope,
        start_time,
        reply,
      } => {
        let result = self
          .window
          .current_profitability(scope.as_deref(), start_time)
          .await;
        if let Some(scope) = scope.as_deref() {
          // A failed check clears the gauge instead of leaving a stale value.
          self
            .metrics
            .average_return(scope, result.as_ref().ok().copied().flatten());
        }
        self.observe(kind, started, result.as_ref().err());
        let _ = reply.send(result);
      }
      ReportRequest::RecentTrades {
        scope,
        start_time,
        max_rows,
        reply,
      } => {
        let result = self
          .window
          .recent_trades(scope.as_deref(), start_time, max_rows)
          .await;
        self.observe(kind, started, result.as_ref().err());
        let _ = reply.send(result);
      }
      ReportRequest::Full { start_time, reply } => {
        let report = self.full.full_report(start_time).await;
        if report.is_failure() {
          self.metrics.report_failed(kind, "full_report_failed");
        } else {
          self.metrics.report_completed(kind, started.elapsed());
        }
        let _ = reply.send(report);
      }
    }
  }

  fn observe(&self, kind: ReportKind, started: Instant, error: Option<&ReportError>) {
    match error {
      None => self.metrics.report_completed(kind, started.elapsed()),
      Some(e) => {
        warn!(kind = kind.as_str(), error = %e, "Report request failed");
        self.metrics.report_failed(kind, e.reason());
      }
    }
  }
}
