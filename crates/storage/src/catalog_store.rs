use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, QueryOrder, Set, TransactionTrait};
use storefront_domain::model::{
    from_cents, line_total_cents, to_cents, NewProduct, ProductId, ProductRecord,
};
use storefront_domain::storage::{CatalogStore, StorageError, StorageResult};

use crate::entity::products;
use crate::SeaOrmStorage;

#[async_trait::async_trait]
impl CatalogStore for SeaOrmStorage {
    async fn list_products(&self) -> StorageResult<Vec<ProductRecord>> {
        let models = products::Entity::find()
            .order_by_asc(products::Column::Id)
            .all(self.connection())
            .await
            .map_err(StorageError::from_source)?;
        Ok(models.into_iter().map(product_to_record).collect())
    }

    async fn find_product(&self, id: ProductId) -> StorageResult<Option<ProductRecord>> {
        let maybe = products::Entity::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(StorageError::from_source)?;
        Ok(maybe.map(product_to_record))
    }

    async fn insert_product(&self, product: NewProduct) -> StorageResult<ProductRecord> {
        insert_one(self.connection(), product).await
    }

    async fn insert_products(
        &self,
        products: Vec<NewProduct>,
    ) -> StorageResult<Vec<ProductRecord>> {
        let txn = self
            .connection()
            .begin()
            .await
            .map_err(StorageError::from_source)?;
        let mut stored = Vec::with_capacity(products.len());
        for product in products {
            stored.push(insert_one(&txn, product).await?);
        }
        txn.commit().await.map_err(StorageError::from_source)?;
        Ok(stored)
    }
}

async fn insert_one<C>(conn: &C, product: NewProduct) -> StorageResult<ProductRecord>
where
    C: ConnectionTrait,
{
    let price_cents = cents(product.price)?;
    let sale_price_cents = product.sale_price.map(cents).transpose()?;
    let model = products::ActiveModel {
        name: Set(product.name),
        price_cents: Set(price_cents),
        description: Set(product.description),
        is_sale: Set(product.is_sale),
        sale_price_cents: Set(sale_price_cents),
        ..Default::default()
    };
    let created = model.insert(conn).await.map_err(StorageError::from_source)?;
    Ok(product_to_record(created))
}

pub(crate) fn cents(amount: rust_decimal::Decimal) -> StorageResult<i64> {
    to_cents(amount).map_err(|err| StorageError::InvalidAmount(err.to_string()))
}

pub(crate) fn line_total(price_cents: i64, quantity: i32) -> StorageResult<i64> {
    line_total_cents(price_cents, quantity)
        .map_err(|err| StorageError::InvalidAmount(err.to_string()))
}

fn product_to_record(model: products::Model) -> ProductRecord {
    ProductRecord {
        id: model.id,
        name: model.name,
        price: from_cents(model.price_cents),
        description: model.description,
        is_sale: model.is_sale,
        sale_price: model.sale_price_cents.map(from_cents),
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use std::str::FromStr;

    use super::*;
    use crate::test_support::{product, storage};

    #[tokio::test]
    async fn inserts_and_lists_products_in_id_order() {
        let storage = storage().await;
        let mug = product(&storage, "Mug", 899).await;
        let tee = product(&storage, "Tee", 1999).await;

        let listed = storage.list_products().await.unwrap();
        assert_eq!(listed, vec![mug.clone(), tee]);
        assert_eq!(mug.price, Decimal::from_str("8.99").unwrap());
    }

    #[tokio::test]
    async fn find_product_returns_none_when_missing() {
        let storage = storage().await;
        assert_eq!(storage.find_product(404).await.unwrap(), None);
    }

    #[tokio::test]
    async fn sale_prices_round_trip_through_cents() {
        let storage = storage().await;
        let created = storage
            .insert_product(NewProduct {
                name: "Poster".into(),
                price: Decimal::from_str("12.345").unwrap(),
                description: Some("A2, matte".into()),
                is_sale: true,
                sale_price: Some(Decimal::from_str("9.5").unwrap()),
            })
            .await
            .unwrap();

        let found = storage.find_product(created.id).await.unwrap().unwrap();
        assert_eq!(found.price, Decimal::from_str("12.35").unwrap());
        assert_eq!(found.sale_price, Some(Decimal::from_str("9.50").unwrap()));
        assert!(found.is_sale);
        assert_eq!(found.description.as_deref(), Some("A2, matte"));
    }

    #[tokio::test]
    async fn bulk_insert_is_all_or_nothing() {
        let storage = storage().await;
        let good = NewProduct {
            name: "Mug".into(),
            price: Decimal::new(899, 2),
            description: None,
            is_sale: false,
            sale_price: None,
        };
        let unstorable = NewProduct {
            name: "Priceless".into(),
            price: Decimal::MAX,
            ..good.clone()
        };

        let err = storage
            .insert_products(vec![good.clone(), unstorable])
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidAmount(_)));
        assert!(storage.list_products().await.unwrap().is_empty());

        let stored = storage.insert_products(vec![good]).await.unwrap();
        assert_eq!(storage.list_products().await.unwrap(), stored);
    }
}
