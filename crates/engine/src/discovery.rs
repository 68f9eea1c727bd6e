//! Catalog discovery — keeps the tracked-product pool populated.
//!
//! Discovery calls an external, rate-limited search API, so it runs on a
//! modulo cadence rather than every tick, except while the pool sits
//! below a minimum population floor.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use pricewatch_core::{CatalogClient, Product, ProductStore};

/// Decide whether discovery should run on this tick.
///
/// The population floor takes precedence: below `floor` tracked products,
/// discovery runs unconditionally to keep the system from starving.
/// Otherwise it runs on every `cadence`-th tick (`tick % cadence == 1`).
pub fn should_discover_this_tick(
    tick: u64,
    product_count: usize,
    cadence: u64,
    floor: usize,
) -> bool {
    if product_count < floor {
        return true;
    }
    cadence > 0 && tick % cadence == 1
}

/// Walks search terms and inserts previously-unseen candidates as
/// discovered products.
pub struct DiscoveryRunner {
    catalog: Arc<dyn CatalogClient>,
    products: Arc<dyn ProductStore>,
    terms: Vec<String>,
    max_terms_per_tick: usize,
    search_limit: usize,
    call_delay: Duration,
    /// Rotates through `terms` across ticks so every term gets a turn.
    cursor: usize,
}

impl DiscoveryRunner {
    pub fn new(
        catalog: Arc<dyn CatalogClient>,
        products: Arc<dyn ProductStore>,
        terms: Vec<String>,
        max_terms_per_tick: usize,
        search_limit: usize,
        call_delay: Duration,
    ) -> Self {
        Self {
            catalog,
            products,
            terms,
            max_terms_per_tick,
            search_limit,
            call_delay,
            cursor: 0,
        }
    }

    /// Run one discovery pass. Returns the number of products inserted.
    ///
    /// Per-term and per-candidate failures are logged and skipped; the
    /// inter-call delay keeps the external API within its rate limit.
    pub async fn run(&mut self, now: DateTime<Utc>) -> usize {
        if self.terms.is_empty() {
            return 0;
        }

        let mut inserted = 0;
        let term_count = self.terms.len().min(self.max_terms_per_tick);

        for i in 0..term_count {
            if i > 0 {
                tokio::time::sleep(self.call_delay).await;
            }
            let term = self.terms[self.cursor % self.terms.len()].clone();
            self.cursor = (self.cursor + 1) % self.terms.len();

            let candidates = match self.catalog.search_products(&term, self.search_limit).await {
                Ok(candidates) => candidates,
                Err(e) => {
                    warn!(term = %term, error = %e, "catalog search failed, skipping term");
                    continue;
                }
            };

            for candidate in candidates {
                match self.products.get(&candidate.asin).await {
                    Ok(Some(_)) => continue, // already tracked
                    Ok(None) => {}
                    Err(e) => {
                        warn!(asin = %candidate.asin, error = %e, "product lookup failed, skipping candidate");
                        continue;
                    }
                }

                let mut product = Product::new(candidate.asin, candidate.title, candidate.price, now);
                product.original_price = candidate.original_price;
                product.url = candidate.url;
                product.image_url = candidate.image_url;
                product.is_discovered = true;

                match self.products.upsert(product).await {
                    Ok(()) => inserted += 1,
                    Err(e) => warn!(error = %e, "failed to insert discovered product"),
                }
                tokio::time::sleep(self.call_delay).await;
            }
        }

        if inserted > 0 {
            info!(inserted, "catalog discovery added products");
        }
        inserted
    }
}
