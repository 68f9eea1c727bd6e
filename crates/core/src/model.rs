//! Domain types for tracked products, price history, and subscriptions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Product ───────────────────────────────────────────────────

/// A tracked catalog product with its running price extrema.
///
/// Mutated only by the price-refresh step via [`apply_price`](Product::apply_price);
/// the extrema are monotone (`lowest_price` never rises, `highest_price`
/// never falls once set) and `lowest_price <= current_price <= highest_price`
/// holds after every update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Catalog identifier (e.g., ASIN).
    pub asin: String,
    pub title: String,
    pub url: Option<String>,
    pub image_url: Option<String>,
    pub current_price: f64,
    /// List/reference price, if the catalog exposes one. Required for
    /// percentage-drop alerts.
    pub original_price: Option<f64>,
    pub lowest_price: f64,
    pub highest_price: f64,
    pub last_checked: DateTime<Utc>,
    /// True if the product was added by catalog discovery rather than an
    /// explicit tracking request.
    pub is_discovered: bool,
}

impl Product {
    /// Create a product from its first observed price.
    pub fn new(asin: impl Into<String>, title: impl Into<String>, price: f64, now: DateTime<Utc>) -> Self {
        Self {
            asin: asin.into(),
            title: title.into(),
            url: None,
            image_url: None,
            current_price: price,
            original_price: None,
            lowest_price: price,
            highest_price: price,
            last_checked: now,
            is_discovered: false,
        }
    }

    /// Apply a freshly observed price, updating the running extrema and
    /// `last_checked`.
    pub fn apply_price(&mut self, price: f64, now: DateTime<Utc>) {
        self.current_price = price;
        if price < self.lowest_price {
            self.lowest_price = price;
        }
        if price > self.highest_price {
            self.highest_price = price;
        }
        self.last_checked = now;
    }
}

// ── Price history ─────────────────────────────────────────────

/// Change metadata attached to a history entry when a previous entry exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceChange {
    pub previous_price: f64,
    /// Absolute delta (`price - previous_price`).
    pub delta: f64,
    /// Relative delta in percent of the previous price; 0 when the
    /// previous price was 0.
    pub delta_pct: f64,
}

/// An immutable, append-only price observation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceHistoryEntry {
    pub id: Uuid,
    pub asin: String,
    pub price: f64,
    pub timestamp: DateTime<Utc>,
    pub change: Option<PriceChange>,
}

// ── Subscription ──────────────────────────────────────────────

/// The alert condition a subscription evaluates. Exactly one mode is
/// active per subscription, selected by the `percentage_alert` flag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AlertMode {
    /// Alert when the current price drops to or below a fixed target.
    FixedTarget(f64),
    /// Alert when the current price drops by at least this percentage
    /// of the product's original price.
    PercentageDrop(f64),
}

/// A subscriber's interest in a tracked product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: Uuid,
    pub asin: String,
    /// Owner identity; doubles as the notification recipient.
    pub recipient: String,
    pub target_price: f64,
    pub percentage_alert: bool,
    pub percentage_threshold: Option<f64>,
    /// Timestamp of the last successfully dispatched alert; starts the
    /// cooldown window. `None` until the first alert fires.
    pub last_alert_sent: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Subscription {
    /// Create a fixed-target subscription.
    pub fn fixed(asin: impl Into<String>, recipient: impl Into<String>, target_price: f64, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            asin: asin.into(),
            recipient: recipient.into(),
            target_price,
            percentage_alert: false,
            percentage_threshold: None,
            last_alert_sent: None,
            created_at: now,
        }
    }

    /// Create a percentage-drop subscription.
    pub fn percentage(asin: impl Into<String>, recipient: impl Into<String>, threshold_pct: f64, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            asin: asin.into(),
            recipient: recipient.into(),
            target_price: 0.0,
            percentage_alert: true,
            percentage_threshold: Some(threshold_pct),
            last_alert_sent: None,
            created_at: now,
        }
    }

    /// Resolve the active alert mode from the stored flags.
    pub fn alert_mode(&self) -> AlertMode {
        if self.percentage_alert {
            AlertMode::PercentageDrop(self.percentage_threshold.unwrap_or(0.0))
        } else {
            AlertMode::FixedTarget(self.target_price)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_price_updates_extrema() {
        let now = Utc::now();
        let mut p = Product::new("B000TEST", "Widget", 50.0, now);
        assert_eq!(p.lowest_price, 50.0);
        assert_eq!(p.highest_price, 50.0);

        p.apply_price(40.0, now);
        assert_eq!(p.current_price, 40.0);
        assert_eq!(p.lowest_price, 40.0);
        assert_eq!(p.highest_price, 50.0);

        p.apply_price(80.0, now);
        assert_eq!(p.lowest_price, 40.0);
        assert_eq!(p.highest_price, 80.0);

        // Extrema never regress.
        p.apply_price(60.0, now);
        assert_eq!(p.lowest_price, 40.0);
        assert_eq!(p.highest_price, 80.0);
        assert!(p.lowest_price <= p.current_price && p.current_price <= p.highest_price);
    }

    #[test]
    fn alert_mode_is_exclusive() {
        let now = Utc::now();
        let fixed = Subscription::fixed("B000TEST", "a@example.com", 50.0, now);
        assert_eq!(fixed.alert_mode(), AlertMode::FixedTarget(50.0));

        let pct = Subscription::percentage("B000TEST", "a@example.com", 20.0, now);
        assert_eq!(pct.alert_mode(), AlertMode::PercentageDrop(20.0));
    }
}
