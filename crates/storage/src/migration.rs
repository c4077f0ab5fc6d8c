use sea_orm::sea_query::{
    ColumnDef, Expr, ForeignKey, ForeignKeyAction, Index, IndexCreateStatement, Table,
    TableCreateStatement,
};
use sea_orm::{ConnectionTrait, DatabaseBackend, DatabaseConnection};

use crate::entity::{order_items, orders, products};
use storefront_domain::storage::{StorageError, StorageResult};

pub async fn run_migrations(db: &DatabaseConnection) -> StorageResult<()> {
    let backend = db.get_database_backend();

    let products_table = Table::create()
        .table(products::Entity)
        .col(
            ColumnDef::new(products::Column::Id)
                .integer()
                .not_null()
                .auto_increment()
                .primary_key(),
        )
        .col(ColumnDef::new(products::Column::Name).string().not_null())
        .col(
            ColumnDef::new(products::Column::PriceCents)
                .big_integer()
                .not_null(),
        )
        .col(ColumnDef::new(products::Column::Description).text().null())
        .col(
            ColumnDef::new(products::Column::IsSale)
                .boolean()
                .not_null()
                .default(false),
        )
        .col(
            ColumnDef::new(products::Column::SalePriceCents)
                .big_integer()
                .null(),
        )
        .to_owned();
    create_table(db, backend, products_table).await?;

    let orders_table = Table::create()
        .table(orders::Entity)
        .col(
            ColumnDef::new(orders::Column::Id)
                .integer()
                .not_null()
                .auto_increment()
                .primary_key(),
        )
        .col(ColumnDef::new(orders::Column::UserId).integer().null())
        .col(ColumnDef::new(orders::Column::FullName).string().not_null())
        .col(ColumnDef::new(orders::Column::Email).string().not_null())
        .col(
            ColumnDef::new(orders::Column::ShippingAddress)
                .text()
                .not_null(),
        )
        .col(
            ColumnDef::new(orders::Column::AmountPaidCents)
                .big_integer()
                .not_null(),
        )
        .col(
            ColumnDef::new(orders::Column::DateOrdered)
                .date_time()
                .not_null()
                .default(Expr::current_timestamp()),
        )
        .col(
            ColumnDef::new(orders::Column::Shipped)
                .boolean()
                .not_null()
                .default(false),
        )
        .col(ColumnDef::new(orders::Column::DateShipped).date_time().null())
        .to_owned();
    create_table(db, backend, orders_table).await?;

    let order_items_table = Table::create()
        .table(order_items::Entity)
        .col(
            ColumnDef::new(order_items::Column::Id)
                .integer()
                .not_null()
                .auto_increment()
                .primary_key(),
        )
        .col(
            ColumnDef::new(order_items::Column::OrderId)
                .integer()
                .not_null(),
        )
        .col(
            ColumnDef::new(order_items::Column::ProductId)
                .integer()
                .not_null(),
        )
        .col(ColumnDef::new(order_items::Column::UserId).integer().null())
        .col(
            ColumnDef::new(order_items::Column::Quantity)
                .integer()
                .not_null(),
        )
        .col(
            ColumnDef::new(order_items::Column::PriceCents)
                .big_integer()
                .not_null(),
        )
        .foreign_key(
            ForeignKey::create()
                .name("fk_order_items_order")
                .from(order_items::Entity, order_items::Column::OrderId)
                .to(orders::Entity, orders::Column::Id)
                .on_delete(ForeignKeyAction::Cascade),
        )
        .foreign_key(
            ForeignKey::create()
                .name("fk_order_items_product")
                .from(order_items::Entity, order_items::Column::ProductId)
                .to(products::Entity, products::Column::Id)
                .on_delete(ForeignKeyAction::Restrict),
        )
        .to_owned();
    create_table(db, backend, order_items_table).await?;

    let order_lookup = Index::create()
        .name("idx_order_items_order_id")
        .table(order_items::Entity)
        .col(order_items::Column::OrderId)
        .to_owned();
    create_index(db, backend, order_lookup).await?;

    let product_lookup = Index::create()
        .name("idx_order_items_product_id")
        .table(order_items::Entity)
        .col(order_items::Column::ProductId)
        .to_owned();
    create_index(db, backend, product_lookup).await?;

    Ok(())
}

async fn create_table(
    db: &DatabaseConnection,
    backend: DatabaseBackend,
    mut statement: TableCreateStatement,
) -> StorageResult<()> {
    statement.if_not_exists();
    db.execute(backend.build(&statement))
        .await
        .map_err(StorageError::from_source)?;
    Ok(())
}

async fn create_index(
    db: &DatabaseConnection,
    backend: DatabaseBackend,
    mut statement: IndexCreateStatement,
) -> StorageResult<()> {
    statement.if_not_exists();
    db.execute(backend.build(&statement))
        .await
        .map_err(StorageError::from_source)?;
    Ok(())
}
