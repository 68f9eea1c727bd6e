//! AlertSender trait definition and shared error types.

use chrono::{DateTime, Utc};

use pricewatch_core::{AlertMode, Product, Subscription};

/// Errors that can occur during alert delivery.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("SMTP delivery failed: {0}")]
    Smtp(String),

    #[error("Template rendering failed: {0}")]
    Template(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Everything a channel needs to deliver one price-drop alert.
///
/// Built by the engine from the (subscription, product) pair the
/// evaluator returned; the engine never renders message content itself.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PriceDropAlert {
    /// Recipient identity (email address).
    pub recipient: String,
    pub asin: String,
    pub product_title: String,
    pub product_url: Option<String>,
    pub current_price: f64,
    pub original_price: Option<f64>,
    pub lowest_price: f64,
    /// Fixed-mode target, when applicable.
    pub target_price: Option<f64>,
    /// Percentage-mode threshold, when applicable.
    pub percentage_threshold: Option<f64>,
    pub triggered_at: DateTime<Utc>,
}

impl PriceDropAlert {
    /// Assemble the alert context from a due subscription and its product.
    pub fn from_pair(subscription: &Subscription, product: &Product, now: DateTime<Utc>) -> Self {
        let (target_price, percentage_threshold) = match subscription.alert_mode() {
            AlertMode::FixedTarget(target) => (Some(target), None),
            AlertMode::PercentageDrop(pct) => (None, Some(pct)),
        };
        Self {
            recipient: subscription.recipient.clone(),
            asin: product.asin.clone(),
            product_title: product.title.clone(),
            product_url: product.url.clone(),
            current_price: product.current_price,
            original_price: product.original_price,
            lowest_price: product.lowest_price,
            target_price,
            percentage_threshold,
            triggered_at: now,
        }
    }
}

/// Trait for alert dispatch channel implementations.
#[async_trait::async_trait]
pub trait AlertSender: Send + Sync {
    /// Deliver a price-drop alert to its recipient.
    async fn send_price_drop_alert(&self, alert: &PriceDropAlert) -> Result<(), NotifyError>;

    /// Human-readable name for this channel (e.g., "email").
    fn channel_name(&self) -> &str;
}
