//! In-memory store implementations.
//!
//! Process-local adapters over [`tokio::sync::RwLock`] maps. These back
//! the worker binary when no external persistence is wired in, and give
//! tests deterministic, dependency-free stores.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::StoreError;
use crate::model::{PriceHistoryEntry, Product, Subscription};
use crate::store::{PriceHistoryStore, ProductStore, SubscriptionStore};

// ── Products ──────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryProductStore {
    products: RwLock<HashMap<String, Product>>,
}

impl MemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn get(&self, asin: &str) -> Result<Option<Product>, StoreError> {
        Ok(self.products.read().await.get(asin).cloned())
    }

    async fn upsert(&self, product: Product) -> Result<(), StoreError> {
        self.products
            .write()
            .await
            .insert(product.asin.clone(), product);
        Ok(())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.products.read().await.len())
    }

    async fn stalest(&self, limit: usize) -> Result<Vec<Product>, StoreError> {
        let guard = self.products.read().await;
        let mut all: Vec<Product> = guard.values().cloned().collect();
        all.sort_by_key(|p| p.last_checked);
        all.truncate(limit);
        Ok(all)
    }
}

// ── Price history ─────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryPriceHistoryStore {
    entries: RwLock<Vec<PriceHistoryEntry>>,
}

impl MemoryPriceHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of entries across all products.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl PriceHistoryStore for MemoryPriceHistoryStore {
    async fn append(&self, entry: PriceHistoryEntry) -> Result<(), StoreError> {
        self.entries.write().await.push(entry);
        Ok(())
    }

    async fn latest(&self, asin: &str) -> Result<Option<PriceHistoryEntry>, StoreError> {
        let guard = self.entries.read().await;
        Ok(guard
            .iter()
            .filter(|e| e.asin == asin)
            .max_by_key(|e| e.timestamp)
            .cloned())
    }

    async fn for_product(&self, asin: &str) -> Result<Vec<PriceHistoryEntry>, StoreError> {
        let guard = self.entries.read().await;
        let mut entries: Vec<PriceHistoryEntry> =
            guard.iter().filter(|e| e.asin == asin).cloned().collect();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(entries)
    }
}

// ── Subscriptions ─────────────────────────────────────────────

#[derive(Default)]
pub struct MemorySubscriptionStore {
    subscriptions: RwLock<HashMap<Uuid, Subscription>>,
}

impl MemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubscriptionStore for MemorySubscriptionStore {
    async fn all(&self) -> Result<Vec<Subscription>, StoreError> {
        Ok(self.subscriptions.read().await.values().cloned().collect())
    }

    async fn insert(&self, subscription: Subscription) -> Result<(), StoreError> {
        self.subscriptions
            .write()
            .await
            .insert(subscription.id, subscription);
        Ok(())
    }

    async fn set_last_alert_sent(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut guard = self.subscriptions.write().await;
        match guard.get_mut(&id) {
            Some(sub) => {
                sub.last_alert_sent = Some(at);
                Ok(())
            }
            None => Err(StoreError::SubscriptionNotFound(id.to_string())),
        }
    }
}
