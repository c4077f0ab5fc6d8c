use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use storefront_domain::model::{
    from_cents, NewOrder, OrderDetail, OrderId, OrderItemRecord, OrderRecord, OrderUpdate,
};
use storefront_domain::storage::{OrderStore, StorageError, StorageResult};
use tracing::debug;

use crate::catalog_store::{cents, line_total};
use crate::entity::{order_items, orders, products};
use crate::SeaOrmStorage;

#[async_trait::async_trait]
impl OrderStore for SeaOrmStorage {
    async fn create_order(&self, order: NewOrder) -> StorageResult<OrderId> {
        let amount_paid_cents = cents(order.amount_paid)?;
        let lines = order
            .items
            .iter()
            .map(|item| {
                let price_cents = cents(item.price)?;
                line_total(price_cents, item.quantity)?;
                Ok((item, price_cents))
            })
            .collect::<StorageResult<Vec<_>>>()?;

        let txn = self
            .connection()
            .begin()
            .await
            .map_err(StorageError::from_source)?;

        let requested: BTreeSet<i32> = lines.iter().map(|(item, _)| item.product_id).collect();
        if !requested.is_empty() {
            let known: BTreeSet<i32> = products::Entity::find()
                .filter(products::Column::Id.is_in(requested.iter().copied()))
                .all(&txn)
                .await
                .map_err(StorageError::from_source)?
                .into_iter()
                .map(|model| model.id)
                .collect();
            if let Some((missing, _)) = lines
                .iter()
                .find(|(item, _)| !known.contains(&item.product_id))
            {
                let product_id = missing.product_id;
                txn.rollback().await.map_err(StorageError::from_source)?;
                return Err(StorageError::UnknownProduct(product_id));
            }
        }

        let created = orders::ActiveModel {
            user_id: Set(order.user_id),
            full_name: Set(order.full_name.clone()),
            email: Set(order.email.clone()),
            shipping_address: Set(order.shipping_address.clone()),
            amount_paid_cents: Set(amount_paid_cents),
            date_ordered: Set(Utc::now()),
            shipped: Set(false),
            date_shipped: Set(None),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(StorageError::from_source)?;

        for (item, price_cents) in lines {
            order_items::ActiveModel {
                order_id: Set(created.id),
                product_id: Set(item.product_id),
                user_id: Set(order.user_id),
                quantity: Set(item.quantity),
                price_cents: Set(price_cents),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(StorageError::from_source)?;
        }

        txn.commit().await.map_err(StorageError::from_source)?;
        debug!(order_id = created.id, lines = order.items.len(), "order stored");
        Ok(created.id)
    }

    async fn list_orders(&self) -> StorageResult<Vec<OrderRecord>> {
        let models = orders::Entity::find()
            .order_by_asc(orders::Column::Id)
            .all(self.connection())
            .await
            .map_err(StorageError::from_source)?;
        Ok(models.into_iter().map(order_to_record).collect())
    }

    async fn find_order(&self, id: OrderId) -> StorageResult<Option<OrderDetail>> {
        let Some(order) = orders::Entity::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(StorageError::from_source)?
        else {
            return Ok(None);
        };
        let items = order_items::Entity::find()
            .filter(order_items::Column::OrderId.eq(id))
            .order_by_asc(order_items::Column::Id)
            .all(self.connection())
            .await
            .map_err(StorageError::from_source)?;
        Ok(Some(OrderDetail {
            order: order_to_record(order),
            items: items.into_iter().map(item_to_record).collect(),
        }))
    }

    async fn update_order(
        &self,
        id: OrderId,
        update: OrderUpdate,
        now: DateTime<Utc>,
    ) -> StorageResult<Option<OrderRecord>> {
        let item_updates = update
            .items
            .iter()
            .flatten()
            .map(|item| -> StorageResult<(i32, Option<i32>, Option<i64>)> {
                let price_cents = item.price.map(cents).transpose()?;
                Ok((item.product_id, item.quantity, price_cents))
            })
            .collect::<StorageResult<Vec<_>>>()?;

        let txn = self
            .connection()
            .begin()
            .await
            .map_err(StorageError::from_source)?;

        let Some(model) = orders::Entity::find_by_id(id)
            .one(&txn)
            .await
            .map_err(StorageError::from_source)?
        else {
            return Ok(None);
        };

        let shipping = order_to_record(model.clone())
            .shipping_state()
            .apply(&update, now);
        let mut active: orders::ActiveModel = model.into();
        active.shipped = Set(shipping.shipped);
        active.date_shipped = Set(shipping.date_shipped);
        let updated = active
            .update(&txn)
            .await
            .map_err(StorageError::from_source)?;

        for (product_id, quantity, price_cents) in item_updates {
            if quantity.is_none() && price_cents.is_none() {
                continue;
            }
            let line = order_items::Entity::find()
                .filter(order_items::Column::OrderId.eq(id))
                .filter(order_items::Column::ProductId.eq(product_id))
                .order_by_asc(order_items::Column::Id)
                .one(&txn)
                .await
                .map_err(StorageError::from_source)?;
            let Some(line) = line else {
                debug!(order_id = id, product_id, "no matching line item, skipping");
                continue;
            };
            let quantity = quantity.unwrap_or(line.quantity);
            let price_cents = price_cents.unwrap_or(line.price_cents);
            if let Err(err) = line_total(price_cents, quantity) {
                txn.rollback().await.map_err(StorageError::from_source)?;
                return Err(err);
            }
            let mut active: order_items::ActiveModel = line.into();
            active.quantity = Set(quantity);
            active.price_cents = Set(price_cents);
            active
                .update(&txn)
                .await
                .map_err(StorageError::from_source)?;
        }

        txn.commit().await.map_err(StorageError::from_source)?;
        Ok(Some(order_to_record(updated)))
    }

    async fn delete_order(&self, id: OrderId) -> StorageResult<bool> {
        let txn = self
            .connection()
            .begin()
            .await
            .map_err(StorageError::from_source)?;
        order_items::Entity::delete_many()
            .filter(order_items::Column::OrderId.eq(id))
            .exec(&txn)
            .await
            .map_err(StorageError::from_source)?;
        let deleted = orders::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(StorageError::from_source)?;
        txn.commit().await.map_err(StorageError::from_source)?;
        Ok(deleted.rows_affected > 0)
    }
}

fn order_to_record(model: orders::Model) -> OrderRecord {
    OrderRecord {
        id: model.id,
        user_id: model.user_id,
        full_name: model.full_name,
        email: model.email,
        shipping_address: model.shipping_address,
        amount_paid: from_cents(model.amount_paid_cents),
        date_ordered: model.date_ordered,
        shipped: model.shipped,
        date_shipped: model.date_shipped,
    }
}

fn item_to_record(model: order_items::Model) -> OrderItemRecord {
    OrderItemRecord {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        user_id: model.user_id,
        quantity: model.quantity,
        price: from_cents(model.price_cents),
    }
}
