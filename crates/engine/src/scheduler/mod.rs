//! Tick scheduler — drives the monitoring cycle.
//!
//! One engine instance owns the whole cycle and runs it from a single
//! loop, so ticks never overlap: a slow tick delays the next one rather
//! than racing it. The first tick fires immediately on startup, then the
//! configured interval applies. Shutdown is graceful — an in-flight tick
//! always runs to completion before the loop exits.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Notify;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use pricewatch_core::{ProductStore, StoreError};
use pricewatch_notify::{AlertSender, PriceDropAlert};

use crate::alerts::AlertEvaluator;
use crate::discovery::{should_discover_this_tick, DiscoveryRunner};
use crate::ratelimit::AlertRateLimiter;
use crate::refresh::PriceRefresher;


/// Counters for one completed tick, logged and returned for inspection.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickSummary {
    /// 1-based tick sequence number within this process.
    pub tick: u64,
    pub discovery_ran: bool,
    pub discovered: usize,
    pub refreshed: usize,
    pub refresh_failures: usize,
    pub recorded: usize,
    pub alerts_sent: usize,
    pub rate_limited: usize,
    pub dispatch_failures: usize,
}

/// The monitoring engine: discovery, refresh, and alert dispatch in a
/// fixed order each tick.
pub struct MonitorEngine {
    products: Arc<dyn ProductStore>,
    refresher: PriceRefresher,
    discovery: DiscoveryRunner,
    evaluator: AlertEvaluator,
    rate_limiter: AlertRateLimiter,
    sender: Arc<dyn AlertSender>,
    discovery_cadence: u64,
    min_product_floor: usize,
    tick_interval: Duration,
    ticks: u64,
}

impl MonitorEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        products: Arc<dyn ProductStore>,
        refresher: PriceRefresher,
        discovery: DiscoveryRunner,
        evaluator: AlertEvaluator,
        rate_limiter: AlertRateLimiter,
        sender: Arc<dyn AlertSender>,
        discovery_cadence: u64,
        min_product_floor: usize,
        tick_interval: Duration,
    ) -> Self {
        Self {
            products,
            refresher,
            discovery,
            evaluator,
            rate_limiter,
            sender,
            discovery_cadence,
            min_product_floor,
            tick_interval,
            ticks: 0,
        }
    }

    /// Ticks completed so far in this process.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Run one monitoring cycle at `now`.
    ///
    /// Errors bubbling up here are store-level faults that invalidate the
    /// whole cycle; per-item failures inside a phase are absorbed by that
    /// phase and surface only in the summary counters.
    pub async fn tick(&mut self, now: DateTime<Utc>) -> Result<TickSummary, StoreError> {
        self.ticks += 1;
        let mut summary = TickSummary {
            tick: self.ticks,
            ..TickSummary::default()
        };

        let product_count = self.products.count().await?;
        if should_discover_this_tick(
            self.ticks,
            product_count,
            self.discovery_cadence,
            self.min_product_floor,
        ) {
            summary.discovery_ran = true;
            summary.discovered = self.discovery.run(now).await;
        }

        let refresh = self.refresher.refresh_due(now).await?;
        summary.refreshed = refresh.refreshed;
        summary.refresh_failures = refresh.failed;
        summary.recorded = refresh.recorded;

        for (subscription, product) in self.evaluator.due_subscriptions(now).await? {
            if !self.rate_limiter.try_consume(&subscription.recipient, now) {
                summary.rate_limited += 1;
                continue;
            }

            let alert = PriceDropAlert::from_pair(&subscription, &product, now);
            match self.sender.send_price_drop_alert(&alert).await {
                Ok(()) => {
                    self.evaluator.mark_notified(subscription.id, now).await?;
                    self.rate_limiter.record_sent(&subscription.recipient, now);
                    summary.alerts_sent += 1;
                    info!(
                        channel = self.sender.channel_name(),
                        asin = %product.asin,
                        recipient = %subscription.recipient,
                        price = product.current_price,
                        "price drop alert sent"
                    );
                }
                // Cooldown state is untouched on failure; the next tick retries.
                Err(e) => {
                    warn!(
                        channel = self.sender.channel_name(),
                        asin = %product.asin,
                        recipient = %subscription.recipient,
                        error = %e,
                        "alert dispatch failed, will retry next cycle"
                    );
                    summary.dispatch_failures += 1;
                }
            }
        }

        self.rate_limiter.sweep(now);

        info!(
            tick = summary.tick,
            products = product_count,
            discovered = summary.discovered,
            refreshed = summary.refreshed,
            refresh_failures = summary.refresh_failures,
            recorded = summary.recorded,
            alerts_sent = summary.alerts_sent,
            rate_limited = summary.rate_limited,
            dispatch_failures = summary.dispatch_failures,
            "tick complete"
        );
        Ok(summary)
    }

    /// Run the tick loop until `shutdown` is notified.
    ///
    /// The first tick runs immediately. Shutdown is only observed between
    /// ticks, so a cycle in progress always completes.
    pub async fn run(&mut self, shutdown: Arc<Notify>) {
        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(interval_secs = self.tick_interval.as_secs(), "scheduler started");
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.tick(Utc::now()).await {
                        error!(tick = self.ticks, error = %e, "tick aborted on store failure");
                    }
                }
                _ = shutdown.notified() => {
                    info!(ticks = self.ticks, "shutdown requested, scheduler stopping");
                    break;
                }
            }
        }
    }
}
