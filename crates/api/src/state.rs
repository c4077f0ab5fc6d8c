use std::sync::Arc;

use storefront_domain::services::{cache::ProductCache, telemetry::TelemetryGuard};
use storefront_storage::SeaOrmStorage;

#[derive(Clone)]
pub struct AppState {
    storage: SeaOrmStorage,
    product_cache: Arc<ProductCache>,
    telemetry: TelemetryGuard,
}

impl AppState {
    pub fn new(
        storage: SeaOrmStorage,
        product_cache: Arc<ProductCache>,
        telemetry: TelemetryGuard,
    ) -> Self {
        Self {
            storage,
            product_cache,
            telemetry,
        }
    }

    pub fn storage(&self) -> &SeaOrmStorage {
        &self.storage
    }

    pub fn product_cache(&self) -> &ProductCache {
        self.product_cache.as_ref()
    }

    pub fn telemetry(&self) -> &TelemetryGuard {
        &self.telemetry
    }
}
