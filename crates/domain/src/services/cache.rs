use std::time::Duration;

use metrics::counter;
use moka::sync::Cache;

use crate::model::{ProductId, ProductRecord};

/// Read-through cache for single product lookups. Products are only written
/// by the seeding tool, so a short TTL bounds staleness.
#[derive(Debug, Clone)]
pub struct ProductCache {
    entries: Cache<ProductId, ProductRecord>,
}

impl ProductCache {
    pub const DEFAULT_TTL: Duration = Duration::from_secs(60);
    pub const DEFAULT_CAPACITY: u64 = 10_000;

    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(ttl: Duration, capacity: u64) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Cache::builder()
                .time_to_live(ttl)
                .max_capacity(capacity)
                .build(),
        }
    }

    pub fn get(&self, id: ProductId) -> Option<ProductRecord> {
        let hit = self.entries.get(&id);
        let outcome = if hit.is_some() { "hit" } else { "miss" };
        counter!("api_product_cache_total", "outcome" => outcome).increment(1);
        hit
    }

    pub fn insert(&self, product: ProductRecord) {
        self.entries.insert(product.id, product);
    }
}

impl Default for ProductCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TTL)
    }
}
