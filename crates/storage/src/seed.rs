//! Catalogue seeding from a JSON array of products.
//!
//! Each entry is `{"name", "price", "description"?, "is_sale"?, "sale_price"?}`.
//! Prices may be JSON numbers or decimal strings.

use rust_decimal::Decimal;
use serde::Deserialize;
use storefront_domain::config::ConfigError;
use storefront_domain::model::{NewProduct, OrderValidationError, ProductRecord};
use storefront_domain::storage::StorageError;
use storefront_domain::CatalogStore;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid catalogue json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("entry {index} (`{name}`): {source}")]
    Validation {
        index: usize,
        name: String,
        source: OrderValidationError,
    },
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Debug, Deserialize)]
struct SeedProduct {
    name: String,
    price: Decimal,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    is_sale: bool,
    #[serde(default)]
    sale_price: Option<Decimal>,
}

impl From<SeedProduct> for NewProduct {
    fn from(seed: SeedProduct) -> Self {
        Self {
            name: seed.name,
            price: seed.price,
            description: seed.description,
            is_sale: seed.is_sale,
            sale_price: seed.sale_price,
        }
    }
}

/// Parses and validates the whole file; nothing is returned unless every
/// entry is acceptable.
pub fn parse_catalog(raw: &str) -> Result<Vec<NewProduct>, SeedError> {
    let entries: Vec<SeedProduct> = serde_json::from_str(raw)?;
    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| -> Result<NewProduct, SeedError> {
            let product = NewProduct::from(entry);
            product
                .validate()
                .map_err(|source| SeedError::Validation {
                    index,
                    name: product.name.clone(),
                    source,
                })?;
            Ok(product)
        })
        .collect()
}

/// Validates `raw` up front, then inserts it in a single transaction.
pub async fn seed_catalog<S>(store: &S, raw: &str) -> Result<Vec<ProductRecord>, SeedError>
where
    S: CatalogStore + ?Sized,
{
    let products = parse_catalog(raw)?;
    let stored = store.insert_products(products).await?;
    info!(count = stored.len(), "catalogue seeded");
    Ok(stored)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::test_support::storage;

    const SAMPLE: &str = include_str!("../../../data/products.sample.json");

    #[test]
    fn sample_file_parses_string_and_number_prices() {
        let products = parse_catalog(SAMPLE).unwrap();
        assert_eq!(products.len(), 3);
        assert_eq!(products[0].price, Decimal::from_str("8.99").unwrap());
        assert_eq!(products[1].price, Decimal::from_str("19.99").unwrap());
        assert_eq!(products[1].sale_price, Some(Decimal::from_str("14.99").unwrap()));
        assert!(products[1].is_sale);
    }

    #[test]
    fn optional_fields_default() {
        let products = parse_catalog(r#"[{"name": "Sticker Pack", "price": "3.50"}]"#).unwrap();
        assert_eq!(products[0].description, None);
        assert!(!products[0].is_sale);
        assert_eq!(products[0].sale_price, None);
    }

    #[test]
    fn invalid_entry_names_its_position() {
        let raw = r#"[
            {"name": "Mug", "price": 8.99},
            {"name": "Tee", "price": "19.99"},
            {"name": "Refund", "price": -1}
        ]"#;
        let err = parse_catalog(raw).unwrap_err();
        assert!(matches!(
            err,
            SeedError::Validation {
                index: 2,
                source: OrderValidationError::NegativeAmount { field: "price", .. },
                ..
            }
        ));
    }

    #[test]
    fn malformed_json_is_reported() {
        assert!(matches!(
            parse_catalog(r#"[{"name": "Mug"}]"#),
            Err(SeedError::Json(_))
        ));
    }

    #[tokio::test]
    async fn seeds_sample_file_into_storage() {
        let storage = storage().await;
        let stored = seed_catalog(&storage, SAMPLE).await.unwrap();
        assert_eq!(stored.len(), 3);
        assert_eq!(storage.list_products().await.unwrap(), stored);
        assert_eq!(stored[2].name, "Sticker Pack");
    }

    #[tokio::test]
    async fn rejected_file_inserts_nothing() {
        let storage = storage().await;
        let raw = r#"[
            {"name": "Mug", "price": "8.99"},
            {"name": "Tee", "price": "19.99"},
            {"name": "  ", "price": "1.00"}
        ]"#;
        let err = seed_catalog(&storage, raw).await.unwrap_err();
        assert!(matches!(
            err,
            SeedError::Validation {
                source: OrderValidationError::BlankField("name"),
                ..
            }
        ));
        assert!(storage.list_products().await.unwrap().is_empty());
    }
}
