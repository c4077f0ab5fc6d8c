use std::collections::BTreeMap;

use sea_orm::sea_query::{Alias, Expr, Func, SimpleExpr};
use sea_orm::{
    EntityTrait, FromQueryResult, JoinType, QueryOrder, QuerySelect, RelationTrait, Select,
};
use storefront_domain::model::{from_wide_cents, BestSeller, ProductId, ProductRevenue};
use storefront_domain::storage::{SalesReportStore, StorageError, StorageResult};

use crate::entity::{order_items, products};
use crate::SeaOrmStorage;

#[derive(Debug, FromQueryResult)]
struct PricedSalesRow {
    product_id: i32,
    product_name: String,
    price_cents: i64,
    total_quantity: i64,
}

/// Line items joined to their product and grouped per product and unit price.
/// Only quantities are summed in SQL; revenue is multiplied out in `i128` so
/// totals beyond the `i64` cents range stay exact.
fn priced_sales() -> Select<order_items::Entity> {
    let quantity = Expr::col((order_items::Entity, order_items::Column::Quantity));

    order_items::Entity::find()
        .select_only()
        .column_as(products::Column::Id, "product_id")
        .column_as(products::Column::Name, "product_name")
        .column_as(order_items::Column::PriceCents, "price_cents")
        .column_as(sum_as_bigint(quantity), "total_quantity")
        .join(JoinType::InnerJoin, order_items::Relation::Product.def())
        .group_by(products::Column::Id)
        .group_by(products::Column::Name)
        .group_by(order_items::Column::PriceCents)
        .order_by_asc(products::Column::Id)
}

fn sum_as_bigint(expr: impl Into<SimpleExpr>) -> SimpleExpr {
    SimpleExpr::from(Func::cast_as(Func::sum(expr), Alias::new("BIGINT")))
}

#[derive(Debug)]
struct ProductTotals {
    product_id: ProductId,
    product_name: String,
    total_quantity: i64,
    total_revenue_cents: i128,
}

fn overflow(product_id: ProductId) -> StorageError {
    StorageError::InvalidAmount(format!("sales totals for product {product_id} overflow"))
}

impl SeaOrmStorage {
    /// Per-product quantity and revenue, ordered by product id.
    async fn product_totals(&self) -> StorageResult<Vec<ProductTotals>> {
        let rows = priced_sales()
            .into_model::<PricedSalesRow>()
            .all(self.connection())
            .await
            .map_err(StorageError::from_source)?;

        let mut totals: BTreeMap<ProductId, ProductTotals> = BTreeMap::new();
        for row in rows {
            let entry = totals.entry(row.product_id).or_insert_with(|| ProductTotals {
                product_id: row.product_id,
                product_name: row.product_name,
                total_quantity: 0,
                total_revenue_cents: 0,
            });
            let revenue = i128::from(row.price_cents) * i128::from(row.total_quantity);
            entry.total_quantity = entry
                .total_quantity
                .checked_add(row.total_quantity)
                .ok_or_else(|| overflow(row.product_id))?;
            entry.total_revenue_cents = entry
                .total_revenue_cents
                .checked_add(revenue)
                .ok_or_else(|| overflow(row.product_id))?;
        }
        Ok(totals.into_values().collect())
    }
}

fn revenue(totals: &ProductTotals) -> StorageResult<rust_decimal::Decimal> {
    from_wide_cents(totals.total_revenue_cents)
        .map_err(|err| StorageError::InvalidAmount(err.to_string()))
}

#[async_trait::async_trait]
impl SalesReportStore for SeaOrmStorage {
    async fn revenue_by_product(&self) -> StorageResult<Vec<ProductRevenue>> {
        self.product_totals()
            .await?
            .into_iter()
            .map(|totals| -> StorageResult<ProductRevenue> {
                Ok(ProductRevenue {
                    total_revenue: revenue(&totals)?,
                    product_id: totals.product_id,
                    product_name: totals.product_name,
                })
            })
            .collect()
    }

    async fn best_seller(&self) -> StorageResult<Option<BestSeller>> {
        // Totals arrive in id order, so keeping the first maximum resolves ties
        // to the lowest product id.
        let mut best: Option<ProductTotals> = None;
        for totals in self.product_totals().await? {
            if best
                .as_ref()
                .map_or(true, |current| totals.total_quantity > current.total_quantity)
            {
                best = Some(totals);
            }
        }
        best.map(|totals| -> StorageResult<BestSeller> {
            Ok(BestSeller {
                total_revenue: revenue(&totals)?,
                product_id: totals.product_id,
                product_name: totals.product_name,
                total_quantity: totals.total_quantity,
            })
        })
        .transpose()
    }
}
