pub mod health;
pub mod items;
pub mod metrics;
pub mod orders;
pub mod reports;

pub use health::{health_handler, root_handler};
pub use items::{get_item_handler, list_items_handler};
pub use metrics::metrics_handler;
pub use orders::{
    create_order_handler, delete_order_handler, get_order_handler, list_sales_handler,
    update_order_handler,
};
pub use reports::{highest_selling_handler, total_revenue_handler};

use actix_web::{error, http::StatusCode, web, HttpRequest, HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};
use strum_macros::IntoStaticStr;
use thiserror::Error;
use tracing::error;

use storefront_domain::model::OrderValidationError;
use storefront_domain::storage::{StorageError, StorageResult};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0}")]
    Validation(#[from] OrderValidationError),
    #[error("{0}")]
    Unprocessable(String),
    #[error("storage failure: {0}")]
    Storage(StorageError),
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::UnknownProduct(_) | StorageError::InvalidAmount(_) => {
                ApiError::Unprocessable(err.to_string())
            }
            StorageError::Database(_) => ApiError::Storage(err),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) | ApiError::Unprocessable(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let detail = match self {
            ApiError::Storage(err) => {
                error!(%err, "request failed in storage layer");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(ErrorBody { detail })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

#[derive(Debug, Clone, Copy, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Endpoint {
    ListItems,
    GetItem,
    TotalRevenue,
    HighestSelling,
    Sales,
    CreateOrder,
    GetOrder,
    UpdateOrder,
    DeleteOrder,
}

#[derive(Debug, Clone, Copy, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Outcome {
    Ok,
    NotFound,
    Rejected,
    Failed,
}

pub(crate) fn record(endpoint: Endpoint, outcome: Outcome) {
    let endpoint: &'static str = endpoint.into();
    let outcome: &'static str = outcome.into();
    ::metrics::counter!("api_requests_total", "endpoint" => endpoint, "status" => outcome)
        .increment(1);
}

/// Maps a storage result to the API error space, counting the failure
/// against `endpoint` before it propagates.
pub(crate) fn track<T>(endpoint: Endpoint, result: StorageResult<T>) -> Result<T, ApiError> {
    result.map_err(|err| {
        let err = ApiError::from(err);
        let outcome = match err {
            ApiError::Storage(_) => Outcome::Failed,
            _ => Outcome::Rejected,
        };
        record(endpoint, outcome);
        err
    })
}

/// Registers every public route together with the extractor configuration
/// that maps malformed input to 422 responses.
pub fn configure_public(cfg: &mut web::ServiceConfig) {
    cfg.app_data(path_config())
        .app_data(json_config())
        .route("/", web::get().to(root_handler))
        .route("/health", web::get().to(health_handler))
        .route("/items", web::get().to(list_items_handler))
        .route("/items/{item_id}", web::get().to(get_item_handler))
        .route("/ecom/totalrevenue", web::get().to(total_revenue_handler))
        .route(
            "/ecom/highest_selling",
            web::get().to(highest_selling_handler),
        )
        .route("/sales", web::get().to(list_sales_handler))
        .route("/orders", web::post().to(create_order_handler))
        .service(
            web::resource("/orders/{order_id}")
                .route(web::get().to(get_order_handler))
                .route(web::put().to(update_order_handler))
                .route(web::delete().to(delete_order_handler)),
        );
}

pub fn configure_metrics(cfg: &mut web::ServiceConfig) {
    cfg.route("/metrics", web::get().to(metrics_handler));
}

fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err: error::PathError, _req: &HttpRequest| {
        ApiError::Unprocessable(err.to_string()).into()
    })
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err: error::JsonPayloadError, _req: &HttpRequest| {
        ApiError::Unprocessable(err.to_string()).into()
    })
}
