//! Price history recorder — decides whether an observation is worth persisting.
//!
//! Every real price movement produces exactly one entry, and a data point
//! is guaranteed at least every [`STALE_AFTER_HOURS`] for trend charts,
//! without letting the history grow unbounded on an unchanged price.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;
use uuid::Uuid;

use pricewatch_core::{PriceChange, PriceHistoryEntry, PriceHistoryStore, StoreError};

/// Price deltas at or below this are treated as floating-point noise,
/// not a real movement (currency units).
pub const PRICE_CHANGE_EPSILON: f64 = 0.01;

/// An unchanged price is re-recorded once this many hours have elapsed
/// since the latest entry.
pub const STALE_AFTER_HOURS: i64 = 6;

/// Appends price observations to the history store when significant.
pub struct PriceRecorder {
    history: Arc<dyn PriceHistoryStore>,
}

impl PriceRecorder {
    pub fn new(history: Arc<dyn PriceHistoryStore>) -> Self {
        Self { history }
    }

    /// Persist `observed_price` if it differs from the latest entry by
    /// more than [`PRICE_CHANGE_EPSILON`], or if the latest entry is older
    /// than [`STALE_AFTER_HOURS`]. The first observation for a product is
    /// always persisted, whatever the price — upstream validation is not
    /// this component's concern.
    ///
    /// Returns `true` if a new entry was written.
    pub async fn record_if_significant(
        &self,
        asin: &str,
        observed_price: f64,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let change = match self.history.latest(asin).await? {
            None => None,
            Some(latest) => {
                let price_changed =
                    (latest.price - observed_price).abs() > PRICE_CHANGE_EPSILON;
                let stale = now - latest.timestamp > Duration::hours(STALE_AFTER_HOURS);

                if !price_changed && !stale {
                    debug!(
                        asin = %asin,
                        price = observed_price,
                        "price unchanged within staleness window, skipping history entry"
                    );
                    return Ok(false);
                }

                let delta = observed_price - latest.price;
                let delta_pct = if latest.price.abs() > f64::EPSILON {
                    delta / latest.price * 100.0
                } else {
                    0.0
                };
                Some(PriceChange {
                    previous_price: latest.price,
                    delta,
                    delta_pct,
                })
            }
        };

        self.history
            .append(PriceHistoryEntry {
                id: Uuid::new_v4(),
                asin: asin.to_string(),
                price: observed_price,
                timestamp: now,
                change,
            })
            .await?;
        Ok(true)
    }
}
