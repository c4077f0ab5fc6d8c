use actix_web::{web, HttpResponse};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use storefront_domain::model::{ProductId, ProductRecord};
use storefront_domain::CatalogStore;

use crate::state::AppState;

use super::{record, track, ApiError, Endpoint, Outcome};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ProductResponse {
    pub id: ProductId,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub description: Option<String>,
    pub is_sale: bool,
    #[serde(with = "rust_decimal::serde::float_option", default)]
    pub sale_price: Option<Decimal>,
}

impl From<ProductRecord> for ProductResponse {
    fn from(product: ProductRecord) -> Self {
        Self {
            id: product.id,
            name: product.name,
            price: product.price,
            description: product.description,
            is_sale: product.is_sale,
            sale_price: product.sale_price,
        }
    }
}

pub async fn list_items_handler(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let products = track(Endpoint::ListItems, state.storage().list_products().await)?;
    record(Endpoint::ListItems, Outcome::Ok);
    let body: Vec<ProductResponse> = products.into_iter().map(ProductResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

pub async fn get_item_handler(
    state: web::Data<AppState>,
    path: web::Path<ProductId>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    if let Some(product) = state.product_cache().get(id) {
        record(Endpoint::GetItem, Outcome::Ok);
        return Ok(HttpResponse::Ok().json(ProductResponse::from(product)));
    }

    let Some(product) = track(Endpoint::GetItem, state.storage().find_product(id).await)? else {
        record(Endpoint::GetItem, Outcome::NotFound);
        return Err(ApiError::NotFound("Item not found"));
    };
    state.product_cache().insert(product.clone());
    record(Endpoint::GetItem, Outcome::Ok);
    Ok(HttpResponse::Ok().json(ProductResponse::from(product)))
}
