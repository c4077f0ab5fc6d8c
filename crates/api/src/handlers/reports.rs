use actix_web::{web, HttpResponse};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use storefront_domain::model::{BestSeller, ProductId, ProductRevenue};
use storefront_domain::SalesReportStore;

use crate::state::AppState;

use super::{record, track, ApiError, Endpoint, Outcome};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct RevenueResponse {
    #[serde(with = "rust_decimal::serde::float")]
    pub total_revenue: Decimal,
    pub product_id: ProductId,
    pub product_name: String,
}

impl From<ProductRevenue> for RevenueResponse {
    fn from(row: ProductRevenue) -> Self {
        Self {
            total_revenue: row.total_revenue,
            product_id: row.product_id,
            product_name: row.product_name,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct BestSellerResponse {
    #[serde(with = "rust_decimal::serde::float")]
    pub total_revenue: Decimal,
    pub product_id: ProductId,
    pub product_name: String,
    pub total_quantity: i64,
}

impl From<BestSeller> for BestSellerResponse {
    fn from(row: BestSeller) -> Self {
        Self {
            total_revenue: row.total_revenue,
            product_id: row.product_id,
            product_name: row.product_name,
            total_quantity: row.total_quantity,
        }
    }
}

/// Revenue per product that has at least one sold line item.
pub async fn total_revenue_handler(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let rows = track(Endpoint::TotalRevenue, state.storage().revenue_by_product().await)?;
    record(Endpoint::TotalRevenue, Outcome::Ok);
    let body: Vec<RevenueResponse> = rows.into_iter().map(RevenueResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

pub async fn highest_selling_handler(
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let Some(best) = track(Endpoint::HighestSelling, state.storage().best_seller().await)? else {
        record(Endpoint::HighestSelling, Outcome::NotFound);
        return Err(ApiError::NotFound("No sales data available"));
    };
    record(Endpoint::HighestSelling, Outcome::Ok);
    Ok(HttpResponse::Ok().json(BestSellerResponse::from(best)))
}
