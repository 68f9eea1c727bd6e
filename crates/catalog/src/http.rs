//! Reqwest-based implementation of the [`CatalogClient`] port.
//!
//! Talks JSON to the catalog service:
//! - `GET {base}/products/{asin}` — current listing data
//! - `GET {base}/search?q={term}&limit={n}` — discovery candidates
//!
//! Status mapping: 404 → `NotFound`, 429 → `Throttled` (honoring a
//! `Retry-After` header if present), other non-success → `Upstream`.
//! The engine treats every variant as a per-item skip.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use pricewatch_core::{CatalogClient, CatalogError, ProductCandidate, ProductInfo};

/// HTTP catalog client with optional bearer-token auth.
pub struct HttpCatalogClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<ProductCandidate>,
}

impl HttpCatalogClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }

    fn request(&self, url: String) -> reqwest::RequestBuilder {
        let mut req = self.http.get(url);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        req
    }

    fn product_url(&self, asin: &str) -> String {
        format!("{}/products/{}", self.base_url, asin)
    }

    fn search_url(&self) -> String {
        format!("{}/search", self.base_url)
    }

    /// Map a non-success response to the port's error taxonomy.
    fn map_status(status: StatusCode, retry_after: Option<u64>, context: &str) -> CatalogError {
        match status {
            StatusCode::NOT_FOUND => CatalogError::NotFound(context.to_string()),
            StatusCode::TOO_MANY_REQUESTS => CatalogError::Throttled {
                retry_after_secs: retry_after,
            },
            other => CatalogError::Upstream(format!("{context}: HTTP {other}")),
        }
    }

    fn retry_after(response: &reqwest::Response) -> Option<u64> {
        response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    async fn get_product_info(&self, asin: &str) -> Result<ProductInfo, CatalogError> {
        let response = self
            .request(self.product_url(asin))
            .send()
            .await
            .map_err(|e| CatalogError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            let retry_after = Self::retry_after(&response);
            return Err(Self::map_status(response.status(), retry_after, asin));
        }

        response
            .json::<ProductInfo>()
            .await
            .map_err(|e| CatalogError::InvalidResponse(e.to_string()))
    }

    async fn search_products(
        &self,
        term: &str,
        limit: usize,
    ) -> Result<Vec<ProductCandidate>, CatalogError> {
        let response = self
            .request(self.search_url())
            .query(&[("q", term), ("limit", &limit.to_string())])
            .send()
            .await
            .map_err(|e| CatalogError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            let retry_after = Self::retry_after(&response);
            return Err(Self::map_status(response.status(), retry_after, term));
        }

        let parsed = response
            .json::<SearchResponse>()
            .await
            .map_err(|e| CatalogError::InvalidResponse(e.to_string()))?;

        tracing::debug!(term = %term, hits = parsed.results.len(), "catalog search complete");
        Ok(parsed.results)
    }
}
