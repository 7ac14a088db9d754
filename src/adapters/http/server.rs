//! Report HTTP Server
//!
//! Routes:
//! - `GET /live`: liveness, always 200 while the process runs
//! - `GET /ready`: 200 while the report service accepts requests and the
//!   trade store is readable
//! - `GET /metrics`: Prometheus text format
//! - `GET /report/window?days=&precision=`: window report of the active run
//! - `GET /report/full?days=`: cross-portfolio report
//! - `GET /report/trades?days=`: newest fills of the active run

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::broadcast;
use tracing::{info, instrument};

use crate::adapters::metrics::MetricsRegistry;
use crate::adapters::persistence::RepositoryImpl;
use crate::adapters::render;
use crate::usecases::error::ReportError;
use crate::usecases::report_service::ReportHandle;

/// Shared state of every route.
#[derive(Clone)]
pub struct HttpState {
    pub handle: ReportHandle,
    pub store: Arc<RepositoryImpl>,
    pub metrics: Option<Arc<MetricsRegistry>>,
    /// Active strategy run; window routes refuse to run without one.
    pub scope: Option<String>,
    /// Default window start when `days` is absent.
    pub session_start: DateTime<Utc>,
    pub default_precision: Option<u32>,
    pub max_trades_display: usize,
}

/// Query parameters of the report routes.
#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    /// Window length in days back from now; `0` or absent uses the
    /// session start.
    pub days: Option<f64>,
    pub precision: Option<u32>,
}

impl ReportQuery {
    fn start_time(&self, session_start: DateTime<Utc>) -> DateTime<Utc> {
        crate::config::window_start(self.days.unwrap_or(0.0), session_start)
    }
}

/// Axum-based report server.
pub struct HttpServer {
    state: HttpState,
    bind_address: String,
}

impl HttpServer {
    pub fn new(state: HttpState, bind_address: String) -> Self {
        Self {
            state,
            bind_address,
        }
    }

    /// Build the router. Public for in-process tests.
    pub fn router(state: HttpState) -> Router {
        Router::new()
            .route("/live", get(Self::liveness))
            .route("/ready", get(Self::readiness))
            .route("/metrics", get(Self::metrics))
            .route("/report/window", get(Self::window_report))
            .route("/report/full", get(Self::full_report))
            .route("/report/trades", get(Self::recent_trades))
            .with_state(state)
    }

    /// Serve until the shutdown signal.
    #[instrument(skip(self, shutdown_rx))]
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) -> anyhow::Result<()> {
        let app = Self::router(self.state);
        let listener = tokio::net::TcpListener::bind(&self.bind_address).await?;
        info!(address = %self.bind_address, "Report server started");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        Ok(())
    }

    async fn liveness() -> impl IntoResponse {
        (StatusCode::OK, "OK")
    }

    async fn readiness(State(state): State<HttpState>) -> impl IntoResponse {
        if state.handle.is_running() && state.store.is_healthy().await {
            (StatusCode::OK, "READY")
        } else {
            (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
        }
    }

    async fn metrics(State(state): State<HttpState>) -> Response {
        let Some(metrics) = state.metrics else {
            return (StatusCode::NOT_FOUND, "metrics disabled").into_response();
        };
        match metrics.encode() {
            Ok(text) => (StatusCode::OK, text).into_response(),
            Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
        }
    }

    async fn window_report(
        State(state): State<HttpState>,
        Query(query): Query<ReportQuery>,
    ) -> Response {
        let start = query.start_time(state.session_start);
        let precision = query.precision.or(state.default_precision);
        match state.handle.window_report(state.scope.clone(), start).await {
            Ok(report) => Json(render::json::window_report(&report, precision)).into_response(),
            Err(e) => error_response(&e),
        }
    }

    async fn full_report(
        State(state): State<HttpState>,
        Query(query): Query<ReportQuery>,
    ) -> Response {
        let start = query.start_time(state.session_start);
        let report = state.handle.full_report(start).await;
        Json(render::json::full_report(&report)).into_response()
    }

    async fn recent_trades(
        State(state): State<HttpState>,
        Query(query): Query<ReportQuery>,
    ) -> Response {
        let start = query.start_time(state.session_start);
        match state
            .handle
            .recent_trades(state.scope.clone(), start, state.max_trades_display)
            .await
        {
            Ok(recent) => Json(render::json::recent_trades(&recent)).into_response(),
            Err(e) => error_response(&e),
        }
    }
}

fn error_response(error: &ReportError) -> Response {
    let status = match error {
        ReportError::NoActiveStrategy => StatusCode::CONFLICT,
        ReportError::NoTrades => StatusCode::NOT_FOUND,
        ReportError::NetworkTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        ReportError::BalanceUnavailable { .. } => StatusCode::BAD_GATEWAY,
        ReportError::ServiceStopped => StatusCode::SERVICE_UNAVAILABLE,
        ReportError::Source(_) | ReportError::Analytics(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let body = json!({ "error": error.to_string(), "reason": error.reason() });
    (status, Json(body)).into_response()
}
