//! Catalog client port and wire types.
//!
//! The engine treats every catalog failure as a per-item condition: log,
//! skip, continue the tick. No timeout policy lives here; that belongs to
//! the HTTP client behind the port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Errors surfaced by a catalog client implementation.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("product not found: {0}")]
    NotFound(String),

    #[error("catalog throttled the request{}", .retry_after_secs.map(|s| format!(" (retry after {s}s)")).unwrap_or_default())]
    Throttled { retry_after_secs: Option<u64> },

    #[error("catalog upstream error: {0}")]
    Upstream(String),

    #[error("invalid catalog response: {0}")]
    InvalidResponse(String),
}

/// Current listing data for a single product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductInfo {
    pub price: f64,
    pub original_price: Option<f64>,
    pub title: String,
    pub url: Option<String>,
    pub image_url: Option<String>,
}

/// A search hit returned by catalog discovery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCandidate {
    pub asin: String,
    pub title: String,
    pub price: f64,
    pub original_price: Option<f64>,
    pub url: Option<String>,
    pub image_url: Option<String>,
}

/// External catalog API surface used by refresh and discovery.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Fetch current listing data for a product.
    async fn get_product_info(&self, asin: &str) -> Result<ProductInfo, CatalogError>;

    /// Search the catalog for candidate products to track.
    async fn search_products(
        &self,
        term: &str,
        limit: usize,
    ) -> Result<Vec<ProductCandidate>, CatalogError>;
}
