//! Strategy Analytics — Entry Point
//!
//! Reads the trade log and reports on strategy performance. Runs a single
//! report and exits (`history`, `full-report`), or serves reports over
//! HTTP with an optional kill switch until SIGINT (`serve`).
//!
//! Wiring sequence:
//! 1. Parse CLI + load config.toml + validate
//! 2. Init tracing (JSON structured logging)
//! 3. Open the JSONL trade store (TradeRecordSource port)
//! 4. Create balance source and price oracle per config
//! 5. Create Prometheus registry (ReportMetrics port)
//! 6. Spawn ReportService (single task owning both reporters)
//! 7. Run the requested command against the ReportHandle
//! 8. Broadcast shutdown and wait for tasks to drain

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use strategy_analytics::adapters::balances::{
    ConfiguredBalanceSource, PaperBalanceSource, RecordedBalanceSource,
};
use strategy_analytics::adapters::http::{HttpServer, HttpState};
use strategy_analytics::adapters::metrics::MetricsRegistry;
use strategy_analytics::adapters::oracles::{
    FallbackOracle, LastFillPriceOracle, StaticRateOracle,
};
use strategy_analytics::adapters::persistence::RepositoryImpl;
use strategy_analytics::adapters::render;
use strategy_analytics::config::{self, AppConfig, BalanceSourceKind};
use strategy_analytics::domain::metrics::MetricCalculator;
use strategy_analytics::ports::report_metrics::{NoopReportMetrics, ReportMetrics};
use strategy_analytics::usecases::{
    FullReporter, KillSwitch, KillSwitchMonitor, ReportError, ReportHandle, ReportService,
    WindowReporter,
};

/// Performance analytics over recorded strategy fills.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Window report of the active strategy run.
    History(HistoryArgs),
    /// Cross-portfolio report over every recorded strategy run, as JSON.
    FullReport(FullReportArgs),
    /// Serve reports over HTTP until interrupted.
    Serve,
}

#[derive(Parser)]
struct HistoryArgs {
    /// Window length in days back from now; 0 covers the whole run.
    #[arg(long, default_value_t = 0.0)]
    days: f64,

    /// Display precision; magnitude-based rounding when omitted.
    #[arg(long)]
    precision: Option<u32>,

    /// Also list the newest trades of the window.
    #[arg(long)]
    verbose: bool,
}

#[derive(Parser)]
struct FullReportArgs {
    /// Window length in days back from now; 0 covers the whole history.
    #[arg(long, default_value_t = 0.0)]
    days: f64,
}

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Parse CLI + load configuration ───────────────────
    let cli = Cli::parse();
    let config = config::loader::load_config(&cli.config)
        .context("Failed to load configuration")?;

    // ── 2. Initialize structured JSON logging ───────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new(&config.bot.log_level)
                }),
        )
        .json()
        .with_writer(std::io::stderr)
        .init();

    info!(
        name = %config.bot.name,
        version = env!("CARGO_PKG_VERSION"),
        active_strategy = ?config.analytics.active_strategy,
        "Starting strategy analytics"
    );

    // ── 3. Shutdown signal channel ──────────────────────────
    let (shutdown_tx, _shutdown_rx) = broadcast::channel::<()>(1);

    // ── 4. Open the trade store ─────────────────────────────
    let store = Arc::new(
        RepositoryImpl::from_data_dir(&config.persistence.data_dir)
            .await
            .context("Failed to open trade store")?,
    );

    // ── 5. Balance source + price oracle ────────────────────
    let balances = Arc::new(match config.analytics.balance_source {
        BalanceSourceKind::Paper => {
            ConfiguredBalanceSource::Paper(PaperBalanceSource::new(&config.paper_balances))
        }
        BalanceSourceKind::Recorded => {
            ConfiguredBalanceSource::Recorded(RecordedBalanceSource::new(
                Arc::clone(&store),
                config.analytics.active_strategy.clone().unwrap_or_default(),
            ))
        }
    });
    let oracle = Arc::new(FallbackOracle::new(
        StaticRateOracle::new(config.rates.clone()),
        LastFillPriceOracle::new(Arc::clone(&store)),
    ));

    // ── 6. Metrics registry ─────────────────────────────────
    let registry = if config.metrics.enabled {
        Some(Arc::new(
            MetricsRegistry::new().context("Failed to create metrics registry")?,
        ))
    } else {
        None
    };
    let metrics: Arc<dyn ReportMetrics> = match &registry {
        Some(registry) => Arc::clone(registry) as Arc<dyn ReportMetrics>,
        None => Arc::new(NoopReportMetrics),
    };

    // ── 7. Spawn the report service ─────────────────────────
    let window = WindowReporter::new(
        Arc::clone(&store),
        balances,
        oracle,
        MetricCalculator::new(config.analytics.derivatives()),
        config.analytics.commands_timeout(),
    );
    let full = FullReporter::new(Arc::clone(&store));
    let (service, handle) = ReportService::new(
        window,
        full,
        Arc::clone(&metrics),
        shutdown_tx.subscribe(),
        config.analytics.request_queue,
    );
    let service_handle = tokio::spawn(service.run());

    // ── 8. Run the command ──────────────────────────────────
    let outcome = match cli.command {
        Commands::History(args) => run_history(&config, &handle, &args).await,
        Commands::FullReport(args) => run_full_report(&handle, &args).await,
        Commands::Serve => {
            run_serve(&config, handle.clone(), store, registry, metrics, &shutdown_tx).await
        }
    };

    // ── Shutdown ────────────────────────────────────────────
    let _ = shutdown_tx.send(());
    drop(handle);
    let _ = tokio::time::timeout(Duration::from_secs(5), service_handle).await;

    info!("Shutdown complete");
    outcome
}

/// Print the window report of the active run.
async fn run_history(config: &AppConfig, handle: &ReportHandle, args: &HistoryArgs) -> Result<()> {
    let start = config::window_start(args.days, DateTime::<Utc>::UNIX_EPOCH);
    let scope = config.analytics.active_strategy.clone();
    let precision = args.precision.or(config.analytics.default_precision);

    let report = match handle.window_report(scope.clone(), start).await {
        Ok(report) => report,
        Err(e @ (ReportError::NoActiveStrategy | ReportError::NoTrades)) => {
            println!("{e}");
            return Ok(());
        }
        Err(e) => return Err(e).context("Window report failed"),
    };
    println!("{}", render::text::window_report(&report, precision));

    if args.verbose {
        let recent = handle
            .recent_trades(scope, start, config.analytics.max_trades_display)
            .await
            .context("Failed to list recent trades")?;
        println!("\n{}", render::text::recent_trades(&recent));
    }
    Ok(())
}

/// Print the cross-portfolio report as JSON.
async fn run_full_report(handle: &ReportHandle, args: &FullReportArgs) -> Result<()> {
    let start = config::window_start(args.days, DateTime::<Utc>::UNIX_EPOCH);
    let report = handle.full_report(start).await;
    if report.is_failure() {
        warn!("Full report returned an error document");
    }
    let doc = render::json::full_report(&report);
    println!(
        "{}",
        serde_json::to_string_pretty(&doc).context("Failed to encode full report")?
    );
    Ok(())
}

/// Serve reports over HTTP; arm the kill switch when configured.
async fn run_serve(
    config: &AppConfig,
    handle: ReportHandle,
    store: Arc<RepositoryImpl>,
    registry: Option<Arc<MetricsRegistry>>,
    metrics: Arc<dyn ReportMetrics>,
    shutdown_tx: &broadcast::Sender<()>,
) -> Result<()> {
    let session_start = Utc::now();

    let kill_switch_handle = config.analytics.kill_switch_rate.map(|rate| {
        let monitor = KillSwitchMonitor::new(
            KillSwitch::from_percent(rate),
            handle.clone(),
            config.analytics.active_strategy.clone(),
            session_start,
            config.analytics.kill_switch_interval(),
            metrics,
        );
        let shutdown_rx = shutdown_tx.subscribe();
        tokio::spawn(async move { monitor.run(shutdown_rx).await })
    });
    if kill_switch_handle.is_none() {
        info!("Kill switch disabled");
    }

    let state = HttpState {
        handle,
        store,
        metrics: registry,
        scope: config.analytics.active_strategy.clone(),
        session_start,
        default_precision: config.analytics.default_precision,
        max_trades_display: config.analytics.max_trades_display,
    };
    let server = HttpServer::new(state, config.metrics.bind_address.clone());
    let server_shutdown = shutdown_tx.subscribe();
    let mut server_handle = tokio::spawn(async move {
        if let Err(e) = server.run(server_shutdown).await {
            error!(error = %e, "Report server failed");
        }
    });

    info!("All tasks spawned — serving reports");

    // ── Wait for SIGINT, server exit or kill switch ─────────
    let kill_switch = async {
        match kill_switch_handle {
            Some(task) => task.await,
            None => std::future::pending().await,
        }
    };
    let server_exited = tokio::select! {
        _ = signal::ctrl_c() => {
            info!("SIGINT received, initiating graceful shutdown");
            false
        }
        _ = &mut server_handle => {
            warn!("Report server exited");
            true
        }
        decision = kill_switch => {
            match decision {
                Ok(Some(decision)) => {
                    warn!(decision = ?decision, "Kill switch fired, stopping");
                }
                Ok(None) => info!("Kill switch disarmed"),
                Err(e) => error!(error = %e, "Kill switch task failed"),
            }
            false
        }
    };

    let _ = shutdown_tx.send(());
    // A completed JoinHandle must not be polled again.
    if !server_exited {
        let _ = tokio::time::timeout(Duration::from_secs(5), server_handle).await;
    }

    Ok(())
}
