//! Persistence ports for products, price history, and subscriptions.
//!
//! The engine only depends on these traits; the relational schema behind
//! them is an external concern. [`crate::memory`] provides in-process
//! implementations for the worker binary and for tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::StoreError;
use crate::model::{PriceHistoryEntry, Product, Subscription};

/// CRUD surface for tracked products, as needed by the engine.
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn get(&self, asin: &str) -> Result<Option<Product>, StoreError>;

    /// Insert or replace a product keyed by its ASIN.
    async fn upsert(&self, product: Product) -> Result<(), StoreError>;

    async fn count(&self) -> Result<usize, StoreError>;

    /// Up to `limit` products ordered by oldest `last_checked` first,
    /// so refresh never starves a product.
    async fn stalest(&self, limit: usize) -> Result<Vec<Product>, StoreError>;
}

/// Append-only store for price observations.
#[async_trait]
pub trait PriceHistoryStore: Send + Sync {
    async fn append(&self, entry: PriceHistoryEntry) -> Result<(), StoreError>;

    /// The most recent entry for a product, if any.
    async fn latest(&self, asin: &str) -> Result<Option<PriceHistoryEntry>, StoreError>;

    /// All entries for a product, newest first.
    async fn for_product(&self, asin: &str) -> Result<Vec<PriceHistoryEntry>, StoreError>;
}

/// Store for subscriber alert registrations.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn all(&self) -> Result<Vec<Subscription>, StoreError>;

    async fn insert(&self, subscription: Subscription) -> Result<(), StoreError>;

    /// Start a fresh cooldown window after a successful dispatch.
    async fn set_last_alert_sent(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), StoreError>;
}
