//! Price refresh — updates a bounded batch of tracked products per tick.
//!
//! Products are refreshed oldest `last_checked` first so none starve.
//! Each product is handled independently: a catalog failure, a malformed
//! price, or a store failure skips that product and the batch continues.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::time::Duration;
use tracing::{debug, warn};

use pricewatch_core::{CatalogClient, ProductStore, StoreError};

use crate::history::PriceRecorder;

/// Per-batch refresh counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RefreshOutcome {
    /// Products whose price and extrema were updated.
    pub refreshed: usize,
    /// Products skipped due to a per-item failure.
    pub failed: usize,
    /// History entries written by the recorder.
    pub recorded: usize,
}

/// Refreshes tracked product prices through the catalog client.
pub struct PriceRefresher {
    catalog: Arc<dyn CatalogClient>,
    products: Arc<dyn ProductStore>,
    recorder: PriceRecorder,
    max_updates: usize,
    call_delay: Duration,
}

impl PriceRefresher {
    pub fn new(
        catalog: Arc<dyn CatalogClient>,
        products: Arc<dyn ProductStore>,
        recorder: PriceRecorder,
        max_updates: usize,
        call_delay: Duration,
    ) -> Self {
        Self {
            catalog,
            products,
            recorder,
            max_updates,
            call_delay,
        }
    }

    /// Refresh up to `max_updates` of the stalest products at `now`.
    pub async fn refresh_due(&self, now: DateTime<Utc>) -> Result<RefreshOutcome, StoreError> {
        let batch = self.products.stalest(self.max_updates).await?;
        let mut outcome = RefreshOutcome::default();

        for (i, mut product) in batch.into_iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.call_delay).await;
            }

            let info = match self.catalog.get_product_info(&product.asin).await {
                Ok(info) => info,
                Err(e) => {
                    warn!(asin = %product.asin, error = %e, "price refresh failed, skipping product");
                    outcome.failed += 1;
                    continue;
                }
            };

            if !info.price.is_finite() || info.price < 0.0 {
                warn!(
                    asin = %product.asin,
                    price = info.price,
                    "malformed price from catalog, excluding from persistence"
                );
                outcome.failed += 1;
                continue;
            }

            product.apply_price(info.price, now);
            if info.original_price.is_some() {
                product.original_price = info.original_price;
            }

            let asin = product.asin.clone();
            if let Err(e) = self.products.upsert(product).await {
                warn!(asin = %asin, error = %e, "failed to persist refreshed product");
                outcome.failed += 1;
                continue;
            }
            outcome.refreshed += 1;

            match self.recorder.record_if_significant(&asin, info.price, now).await {
                Ok(true) => outcome.recorded += 1,
                Ok(false) => {}
                Err(e) => warn!(asin = %asin, error = %e, "failed to record price history"),
            }
        }

        debug!(
            refreshed = outcome.refreshed,
            failed = outcome.failed,
            recorded = outcome.recorded,
            "price refresh batch complete"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;
    use pricewatch_core::memory::{MemoryPriceHistoryStore, MemoryProductStore};
    use pricewatch_core::{CatalogError, PriceHistoryStore, Product, ProductCandidate, ProductInfo};
    use std::collections::HashMap;

    /// Catalog stub with a fixed price map; unknown ASINs fail.
    struct StubCatalog {
        prices: HashMap<String, f64>,
    }

    #[async_trait]
    impl CatalogClient for StubCatalog {
        async fn get_product_info(&self, asin: &str) -> Result<ProductInfo, CatalogError> {
            match self.prices.get(asin) {
                Some(price) => Ok(ProductInfo {
                    price: *price,
                    original_price: None,
                    title: format!("Product {asin}"),
                    url: None,
                    image_url: None,
                }),
                None => Err(CatalogError::Upstream("boom".to_string())),
            }
        }

        async fn search_products(
            &self,
            _term: &str,
            _limit: usize,
        ) -> Result<Vec<ProductCandidate>, CatalogError> {
            Ok(Vec::new())
        }
    }

    fn refresher(
        prices: HashMap<String, f64>,
        products: Arc<MemoryProductStore>,
        history: Arc<MemoryPriceHistoryStore>,
        max_updates: usize,
    ) -> PriceRefresher {
        PriceRefresher::new(
            Arc::new(StubCatalog { prices }),
            products,
            PriceRecorder::new(history),
            max_updates,
            Duration::ZERO,
        )
    }

    async fn seed(products: &MemoryProductStore, asin: &str, price: f64, checked_hours_ago: i64) {
        let now = Utc::now();
        let mut p = Product::new(asin, format!("Product {asin}"), price, now);
        p.last_checked = now - ChronoDuration::hours(checked_hours_ago);
        products.upsert(p).await.unwrap();
    }

    #[tokio::test]
    async fn one_failing_product_does_not_abort_the_batch() {
        let products = Arc::new(MemoryProductStore::new());
        let history = Arc::new(MemoryPriceHistoryStore::new());
        let now = Utc::now();

        seed(&products, "B0FIRST", 30.0, 9).await;
        seed(&products, "B0BROKEN", 30.0, 8).await;
        seed(&products, "B0THIRD", 30.0, 7).await;

        // No entry for B0BROKEN: its lookup fails.
        let prices = HashMap::from([
            ("B0FIRST".to_string(), 25.0),
            ("B0THIRD".to_string(), 20.0),
        ]);

        let outcome = refresher(prices, products.clone(), history.clone(), 3)
            .refresh_due(now)
            .await
            .unwrap();

        assert_eq!(outcome.refreshed, 2);
        assert_eq!(outcome.failed, 1);
        assert_eq!(outcome.recorded, 2);

        let first = products.get("B0FIRST").await.unwrap().unwrap();
        assert_eq!(first.current_price, 25.0);
        assert_eq!(first.last_checked, now);

        let third = products.get("B0THIRD").await.unwrap().unwrap();
        assert_eq!(third.current_price, 20.0);

        // The failed product is untouched.
        let broken = products.get("B0BROKEN").await.unwrap().unwrap();
        assert_eq!(broken.current_price, 30.0);
        assert!(broken.last_checked < now);
        assert!(history.latest("B0BROKEN").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn batch_is_bounded_and_oldest_first() {
        let products = Arc::new(MemoryProductStore::new());
        let history = Arc::new(MemoryPriceHistoryStore::new());
        let now = Utc::now();

        seed(&products, "B0OLDEST", 10.0, 20).await;
        seed(&products, "B0MIDDLE", 10.0, 10).await;
        seed(&products, "B0NEWEST", 10.0, 1).await;

        let prices = HashMap::from([
            ("B0OLDEST".to_string(), 9.0),
            ("B0MIDDLE".to_string(), 9.0),
            ("B0NEWEST".to_string(), 9.0),
        ]);

        let outcome = refresher(prices, products.clone(), history, 2)
            .refresh_due(now)
            .await
            .unwrap();
        assert_eq!(outcome.refreshed, 2);

        assert_eq!(
            products.get("B0OLDEST").await.unwrap().unwrap().current_price,
            9.0
        );
        assert_eq!(
            products.get("B0MIDDLE").await.unwrap().unwrap().current_price,
            9.0
        );
        // Bounded batch never reached the freshest product.
        assert_eq!(
            products.get("B0NEWEST").await.unwrap().unwrap().current_price,
            10.0
        );
    }

    #[tokio::test]
    async fn malformed_price_is_excluded() {
        let products = Arc::new(MemoryProductStore::new());
        let history = Arc::new(MemoryPriceHistoryStore::new());
        let now = Utc::now();

        seed(&products, "B0NAN", 30.0, 9).await;
        let prices = HashMap::from([("B0NAN".to_string(), f64::NAN)]);

        let outcome = refresher(prices, products.clone(), history.clone(), 1)
            .refresh_due(now)
            .await
            .unwrap();
        assert_eq!(outcome.refreshed, 0);
        assert_eq!(outcome.failed, 1);
        assert_eq!(products.get("B0NAN").await.unwrap().unwrap().current_price, 30.0);
        assert!(history.is_empty().await);
    }

    #[tokio::test]
    async fn unchanged_price_refreshes_without_recording() {
        let products = Arc::new(MemoryProductStore::new());
        let history = Arc::new(MemoryPriceHistoryStore::new());
        let now = Utc::now();

        seed(&products, "B0SAME", 30.0, 5).await;
        let prices = HashMap::from([("B0SAME".to_string(), 30.0)]);
        let refresher = refresher(prices, products.clone(), history.clone(), 1);

        // First refresh writes the initial history entry.
        let outcome = refresher.refresh_due(now).await.unwrap();
        assert_eq!(outcome.refreshed, 1);
        assert_eq!(outcome.recorded, 1);

        // Same price an hour later: extrema/last_checked advance, no entry.
        let later = now + ChronoDuration::hours(1);
        let outcome = refresher.refresh_due(later).await.unwrap();
        assert_eq!(outcome.refreshed, 1);
        assert_eq!(outcome.recorded, 0);
        assert_eq!(history.len().await, 1);
        assert_eq!(
            products.get("B0SAME").await.unwrap().unwrap().last_checked,
            later
        );
    }
}
