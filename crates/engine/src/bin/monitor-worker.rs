//! monitor-worker — long-running price monitoring daemon.
//!
//! Wires the engine to its adapters (in-memory stores, HTTP catalog,
//! SMTP alerts) and drives the tick loop until SIGINT/SIGTERM. Ctrl-C
//! during a cycle lets the cycle finish before the process exits.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::Notify;
use tracing::info;

use pricewatch_catalog::HttpCatalogClient;
use pricewatch_core::config::{load_dotenv, Config};
use pricewatch_core::memory::{
    MemoryPriceHistoryStore, MemoryProductStore, MemorySubscriptionStore,
};
use pricewatch_core::{CatalogClient, EnvSettings, ProductStore};
use pricewatch_engine::{
    AlertEvaluator, AlertRateLimiter, DiscoveryRunner, MonitorEngine, PriceRecorder,
    PriceRefresher,
};
use pricewatch_notify::{AlertSender, EmailAlertSender};

// ── CLI ─────────────────────────────────────────────────────────────

/// Price monitoring worker — periodic refresh, discovery, and alerting.
#[derive(Parser, Debug)]
#[command(name = "monitor-worker", version, about)]
struct Cli {
    /// Override the tick interval in seconds.
    #[arg(long)]
    tick_interval: Option<u64>,

    /// Run a single cycle and exit instead of looping.
    #[arg(long)]
    once: bool,
}

// ── main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    load_dotenv();
    let cli = Cli::parse();
    let mut config = Config::from_env();
    if let Some(secs) = cli.tick_interval {
        config.engine.tick_interval_secs = secs;
    }
    config.log_summary();

    let products: Arc<dyn ProductStore> = Arc::new(MemoryProductStore::new());
    let history = Arc::new(MemoryPriceHistoryStore::new());
    let subscriptions = Arc::new(MemorySubscriptionStore::new());

    let catalog: Arc<dyn CatalogClient> = Arc::new(HttpCatalogClient::new(
        &config.catalog.base_url,
        config.catalog.api_key.clone(),
    ));
    let sender: Arc<dyn AlertSender> = Arc::new(EmailAlertSender::from_config(
        &config.smtp.host,
        config.smtp.port,
        config.smtp.tls,
        &config.smtp.from,
    )?);

    let call_delay = Duration::from_millis(config.engine.api_call_delay_ms);
    let refresher = PriceRefresher::new(
        catalog.clone(),
        products.clone(),
        PriceRecorder::new(history),
        config.engine.max_updates_per_run,
        call_delay,
    );
    let discovery = DiscoveryRunner::new(
        catalog,
        products.clone(),
        config.engine.search_terms.clone(),
        config.engine.max_search_terms_per_tick,
        config.engine.search_result_limit,
        call_delay,
    );
    let evaluator = AlertEvaluator::new(
        subscriptions,
        products.clone(),
        Arc::new(EnvSettings::new(config.alerts.cooldown_default_hours)),
    );

    let mut engine = MonitorEngine::new(
        products,
        refresher,
        discovery,
        evaluator,
        AlertRateLimiter::new(config.alerts.rate_limit_quota, config.alerts.rate_limit_window_secs),
        sender,
        config.engine.discovery_cadence,
        config.engine.min_product_floor,
        Duration::from_secs(config.engine.tick_interval_secs),
    );

    if cli.once {
        let summary = engine.tick(chrono::Utc::now()).await?;
        info!(?summary, "single cycle complete");
        return Ok(());
    }

    let shutdown = Arc::new(Notify::new());
    let signal_target = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("shutdown signal received, finishing current cycle");
        signal_target.notify_one();
    });

    info!("monitor-worker starting");
    engine.run(shutdown).await;
    info!("monitor-worker exited cleanly");
    Ok(())
}

/// Resolve on SIGINT or SIGTERM, whichever arrives first.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
