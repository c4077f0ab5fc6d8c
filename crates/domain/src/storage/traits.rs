use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{
    BestSeller, NewOrder, NewProduct, OrderDetail, OrderId, OrderRecord, OrderUpdate, ProductId,
    ProductRecord, ProductRevenue,
};

/// Common result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(String),
    #[error("product {0} does not exist")]
    UnknownProduct(ProductId),
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
}

impl StorageError {
    pub fn from_source(err: impl std::fmt::Display) -> Self {
        Self::Database(err.to_string())
    }
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_products(&self) -> StorageResult<Vec<ProductRecord>>;
    async fn find_product(&self, id: ProductId) -> StorageResult<Option<ProductRecord>>;
    async fn insert_product(&self, product: NewProduct) -> StorageResult<ProductRecord>;
    /// Inserts every product or none of them.
    async fn insert_products(
        &self,
        products: Vec<NewProduct>,
    ) -> StorageResult<Vec<ProductRecord>>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists the order and its line items atomically.
    async fn create_order(&self, order: NewOrder) -> StorageResult<OrderId>;
    async fn list_orders(&self) -> StorageResult<Vec<OrderRecord>>;
    async fn find_order(&self, id: OrderId) -> StorageResult<Option<OrderDetail>>;
    /// Returns `None` when the order does not exist. Line item updates that
    /// match no line of the order are skipped.
    async fn update_order(
        &self,
        id: OrderId,
        update: OrderUpdate,
        now: DateTime<Utc>,
    ) -> StorageResult<Option<OrderRecord>>;
    /// Returns `false` when nothing was deleted.
    async fn delete_order(&self, id: OrderId) -> StorageResult<bool>;
}

#[async_trait]
pub trait SalesReportStore: Send + Sync {
    async fn revenue_by_product(&self) -> StorageResult<Vec<ProductRevenue>>;
    async fn best_seller(&self) -> StorageResult<Option<BestSeller>>;
}
