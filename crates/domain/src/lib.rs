//! Domain-level building blocks shared by the storefront API and storage
//! crates: catalogue/order models, validation, configuration loading,
//! storage contracts and telemetry wiring.

pub mod config;
pub mod model;
pub mod services;
pub mod storage;

pub use services::cache::ProductCache;
pub use storage::{CatalogStore, OrderStore, SalesReportStore};
