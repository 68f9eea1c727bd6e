//! Alert eligibility evaluator — selects the subscriptions due for a
//! notification on this tick.
//!
//! The cooldown is a hard gate checked before anything else: a
//! subscription inside its cooldown window is skipped without evaluating
//! the price condition. The cooldown setting is re-read from the
//! [`SettingsSource`] on every invocation so it can be tuned at runtime.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use pricewatch_core::{
    AlertMode, Product, ProductStore, SettingsSource, StoreError, Subscription, SubscriptionStore,
};

/// Decides which subscriptions are due and records successful dispatches.
pub struct AlertEvaluator {
    subscriptions: Arc<dyn SubscriptionStore>,
    products: Arc<dyn ProductStore>,
    settings: Arc<dyn SettingsSource>,
}

impl AlertEvaluator {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionStore>,
        products: Arc<dyn ProductStore>,
        settings: Arc<dyn SettingsSource>,
    ) -> Self {
        Self {
            subscriptions,
            products,
            settings,
        }
    }

    /// Return every (subscription, product) pair eligible for an alert at
    /// `now`. No particular order — dispatch is independent per pair.
    ///
    /// A subscription referencing a missing product is logged and skipped,
    /// never fatal to the batch.
    pub async fn due_subscriptions(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<(Subscription, Product)>, StoreError> {
        let cooldown = Duration::hours(self.settings.cooldown_hours());

        let mut due = Vec::new();
        for subscription in self.subscriptions.all().await? {
            if let Some(last_sent) = subscription.last_alert_sent {
                if now < last_sent + cooldown {
                    continue;
                }
            }

            let product = match self.products.get(&subscription.asin).await? {
                Some(p) => p,
                None => {
                    warn!(
                        subscription = %subscription.id,
                        asin = %subscription.asin,
                        "subscription references a missing product, skipping"
                    );
                    continue;
                }
            };

            if price_eligible(&subscription, &product) {
                due.push((subscription, product));
            }
        }
        Ok(due)
    }

    /// Record a successful dispatch, starting a fresh cooldown window.
    /// Must not be called when the dispatch failed — leaving the state
    /// unchanged is what lets the next tick retry.
    pub async fn mark_notified(&self, id: Uuid, now: DateTime<Utc>) -> Result<(), StoreError> {
        self.subscriptions.set_last_alert_sent(id, now).await
    }
}

/// Evaluate the price condition for a subscription's active alert mode.
pub fn price_eligible(subscription: &Subscription, product: &Product) -> bool {
    match subscription.alert_mode() {
        AlertMode::FixedTarget(target) => product.current_price <= target,
        AlertMode::PercentageDrop(threshold_pct) => match product.original_price {
            Some(original) => {
                product.current_price <= original * (1.0 - threshold_pct / 100.0)
            }
            None => {
                // Never eligible until the catalog supplies an original price.
                debug!(
                    subscription = %subscription.id,
                    asin = %product.asin,
                    "percentage alert without original price, not eligible"
                );
                false
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricewatch_core::memory::{MemoryProductStore, MemorySubscriptionStore};
    use pricewatch_core::FixedSettings;

    const COOLDOWN_HOURS: i64 = 72;

    fn evaluator(
        products: Arc<MemoryProductStore>,
        subscriptions: Arc<MemorySubscriptionStore>,
    ) -> AlertEvaluator {
        AlertEvaluator::new(subscriptions, products, Arc::new(FixedSettings(COOLDOWN_HOURS)))
    }

    #[tokio::test]
    async fn cooldown_is_a_hard_gate() {
        let products = Arc::new(MemoryProductStore::new());
        let subscriptions = Arc::new(MemorySubscriptionStore::new());
        let now = Utc::now();

        // Price condition is satisfied either way.
        products
            .upsert(Product::new("B000TEST", "Widget", 40.0, now))
            .await
            .unwrap();

        let mut inside = Subscription::fixed("B000TEST", "a@example.com", 50.0, now);
        inside.last_alert_sent = Some(now - Duration::hours(COOLDOWN_HOURS - 1));
        let mut outside = Subscription::fixed("B000TEST", "b@example.com", 50.0, now);
        outside.last_alert_sent = Some(now - Duration::hours(COOLDOWN_HOURS + 1));

        subscriptions.insert(inside).await.unwrap();
        subscriptions.insert(outside.clone()).await.unwrap();

        let due = evaluator(products, subscriptions).due_subscriptions(now).await.unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].0.id, outside.id);
    }

    #[tokio::test]
    async fn fixed_mode_compares_against_target() {
        let products = Arc::new(MemoryProductStore::new());
        let subscriptions = Arc::new(MemorySubscriptionStore::new());
        let now = Utc::now();

        subscriptions
            .insert(Subscription::fixed("B000TEST", "a@example.com", 50.0, now))
            .await
            .unwrap();

        let eval = evaluator(products.clone(), subscriptions);

        products
            .upsert(Product::new("B000TEST", "Widget", 50.01, now))
            .await
            .unwrap();
        assert!(eval.due_subscriptions(now).await.unwrap().is_empty());

        products
            .upsert(Product::new("B000TEST", "Widget", 50.0, now))
            .await
            .unwrap();
        assert_eq!(eval.due_subscriptions(now).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn percentage_mode_compares_against_original_price() {
        let products = Arc::new(MemoryProductStore::new());
        let subscriptions = Arc::new(MemorySubscriptionStore::new());
        let now = Utc::now();

        subscriptions
            .insert(Subscription::percentage("B000TEST", "a@example.com", 20.0, now))
            .await
            .unwrap();

        let eval = evaluator(products.clone(), subscriptions);

        let mut product = Product::new("B000TEST", "Widget", 80.01, now);
        product.original_price = Some(100.0);
        products.upsert(product.clone()).await.unwrap();
        assert!(eval.due_subscriptions(now).await.unwrap().is_empty());

        product.apply_price(80.0, now);
        products.upsert(product).await.unwrap();
        assert_eq!(eval.due_subscriptions(now).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn percentage_mode_without_original_price_is_never_eligible() {
        let products = Arc::new(MemoryProductStore::new());
        let subscriptions = Arc::new(MemorySubscriptionStore::new());
        let now = Utc::now();

        // Deep discount, but no original price to measure against.
        products
            .upsert(Product::new("B000TEST", "Widget", 1.0, now))
            .await
            .unwrap();
        subscriptions
            .insert(Subscription::percentage("B000TEST", "a@example.com", 20.0, now))
            .await
            .unwrap();

        let due = evaluator(products, subscriptions).due_subscriptions(now).await.unwrap();
        assert!(due.is_empty());
    }

    #[tokio::test]
    async fn missing_product_is_skipped_not_fatal() {
        let products = Arc::new(MemoryProductStore::new());
        let subscriptions = Arc::new(MemorySubscriptionStore::new());
        let now = Utc::now();

        products
            .upsert(Product::new("B0EXISTS", "Widget", 10.0, now))
            .await
            .unwrap();
        subscriptions
            .insert(Subscription::fixed("B0MISSING", "a@example.com", 50.0, now))
            .await
            .unwrap();
        subscriptions
            .insert(Subscription::fixed("B0EXISTS", "b@example.com", 50.0, now))
            .await
            .unwrap();

        let due = evaluator(products, subscriptions).due_subscriptions(now).await.unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].0.asin, "B0EXISTS");
    }

    #[tokio::test]
    async fn mark_notified_starts_cooldown() {
        let products = Arc::new(MemoryProductStore::new());
        let subscriptions = Arc::new(MemorySubscriptionStore::new());
        let now = Utc::now();

        products
            .upsert(Product::new("B000TEST", "Widget", 40.0, now))
            .await
            .unwrap();
        let sub = Subscription::fixed("B000TEST", "a@example.com", 50.0, now);
        subscriptions.insert(sub.clone()).await.unwrap();

        let eval = evaluator(products, subscriptions);
        assert_eq!(eval.due_subscriptions(now).await.unwrap().len(), 1);

        eval.mark_notified(sub.id, now).await.unwrap();
        assert!(eval.due_subscriptions(now).await.unwrap().is_empty());

        // Due again once the cooldown has fully elapsed.
        let later = now + Duration::hours(COOLDOWN_HOURS) + Duration::minutes(1);
        assert_eq!(eval.due_subscriptions(later).await.unwrap().len(), 1);
    }
}
