use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use storefront_domain::model::{
    NewOrder, NewOrderItem, OrderDetail, OrderId, OrderItemRecord, OrderItemUpdate, OrderRecord,
    OrderUpdate, ProductId,
};
use storefront_domain::OrderStore;
use tracing::info;

use crate::state::AppState;

use super::{record, track, ApiError, Endpoint, Outcome};

#[derive(Debug, Deserialize, Serialize)]
pub struct OrderItemRequest {
    pub product_id: ProductId,
    pub quantity: i32,
    pub price: Decimal,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub user_id: Option<i32>,
    pub full_name: String,
    pub email: String,
    pub shipping_address: String,
    pub amount_paid: Decimal,
    #[serde(default)]
    pub items: Vec<OrderItemRequest>,
}

impl From<CreateOrderRequest> for NewOrder {
    fn from(request: CreateOrderRequest) -> Self {
        Self {
            user_id: request.user_id,
            full_name: request.full_name,
            email: request.email,
            shipping_address: request.shipping_address,
            amount_paid: request.amount_paid,
            items: request
                .items
                .into_iter()
                .map(|item| NewOrderItem {
                    product_id: item.product_id,
                    quantity: item.quantity,
                    price: item.price,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UpdateOrderItemRequest {
    pub product_id: ProductId,
    #[serde(default)]
    pub quantity: Option<i32>,
    #[serde(default)]
    pub price: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UpdateOrderRequest {
    #[serde(default)]
    pub shipped: Option<bool>,
    #[serde(default)]
    pub date_shipped: Option<DateTime<Utc>>,
    #[serde(default)]
    pub items: Option<Vec<UpdateOrderItemRequest>>,
}

impl From<UpdateOrderRequest> for OrderUpdate {
    fn from(request: UpdateOrderRequest) -> Self {
        Self {
            shipped: request.shipped,
            date_shipped: request.date_shipped,
            items: request.items.map(|items| {
                items
                    .into_iter()
                    .map(|item| OrderItemUpdate {
                        product_id: item.product_id,
                        quantity: item.quantity,
                        price: item.price,
                    })
                    .collect()
            }),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct OrderResponse {
    pub id: OrderId,
    pub user_id: Option<i32>,
    pub full_name: String,
    pub email: String,
    pub shipping_address: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount_paid: Decimal,
    pub date_ordered: DateTime<Utc>,
    pub shipped: bool,
    pub date_shipped: Option<DateTime<Utc>>,
}

impl From<OrderRecord> for OrderResponse {
    fn from(order: OrderRecord) -> Self {
        Self {
            id: order.id,
            user_id: order.user_id,
            full_name: order.full_name,
            email: order.email,
            shipping_address: order.shipping_address,
            amount_paid: order.amount_paid,
            date_ordered: order.date_ordered,
            shipped: order.shipped,
            date_shipped: order.date_shipped,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct OrderItemResponse {
    pub id: i32,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub user_id: Option<i32>,
    pub quantity: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

impl From<OrderItemRecord> for OrderItemResponse {
    fn from(item: OrderItemRecord) -> Self {
        Self {
            id: item.id,
            order_id: item.order_id,
            product_id: item.product_id,
            user_id: item.user_id,
            quantity: item.quantity,
            price: item.price,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderDetailResponse {
    #[serde(flatten)]
    pub order: OrderResponse,
    pub items: Vec<OrderItemResponse>,
}

impl From<OrderDetail> for OrderDetailResponse {
    fn from(detail: OrderDetail) -> Self {
        Self {
            order: detail.order.into(),
            items: detail.items.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderCreatedResponse {
    pub message: String,
    pub order_id: OrderId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderUpdatedResponse {
    pub message: String,
    pub order: OrderResponse,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderDeletedResponse {
    pub message: String,
}

/// Lists every order (sales transactions) without line items.
pub async fn list_sales_handler(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let orders = track(Endpoint::Sales, state.storage().list_orders().await)?;
    record(Endpoint::Sales, Outcome::Ok);
    let body: Vec<OrderResponse> = orders.into_iter().map(OrderResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

pub async fn create_order_handler(
    state: web::Data<AppState>,
    payload: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, ApiError> {
    let order = NewOrder::from(payload.into_inner());
    order.validate().inspect_err(|_| {
        record(Endpoint::CreateOrder, Outcome::Rejected);
    })?;

    let lines = order.items.len();
    let order_id = track(
        Endpoint::CreateOrder,
        state.storage().create_order(order).await,
    )?;
    record(Endpoint::CreateOrder, Outcome::Ok);
    info!(order_id, lines, "order created");

    Ok(HttpResponse::Ok().json(OrderCreatedResponse {
        message: "Order created".into(),
        order_id,
    }))
}

pub async fn get_order_handler(
    state: web::Data<AppState>,
    path: web::Path<OrderId>,
) -> Result<HttpResponse, ApiError> {
    let Some(detail) = track(
        Endpoint::GetOrder,
        state.storage().find_order(path.into_inner()).await,
    )?
    else {
        record(Endpoint::GetOrder, Outcome::NotFound);
        return Err(ApiError::NotFound("Order not found"));
    };
    record(Endpoint::GetOrder, Outcome::Ok);
    Ok(HttpResponse::Ok().json(OrderDetailResponse::from(detail)))
}

pub async fn update_order_handler(
    state: web::Data<AppState>,
    path: web::Path<OrderId>,
    payload: web::Json<UpdateOrderRequest>,
) -> Result<HttpResponse, ApiError> {
    let order_id = path.into_inner();
    let update = OrderUpdate::from(payload.into_inner());
    update.validate().inspect_err(|_| {
        record(Endpoint::UpdateOrder, Outcome::Rejected);
    })?;

    let Some(order) = track(
        Endpoint::UpdateOrder,
        state
            .storage()
            .update_order(order_id, update, Utc::now())
            .await,
    )?
    else {
        record(Endpoint::UpdateOrder, Outcome::NotFound);
        return Err(ApiError::NotFound("Order not found"));
    };
    record(Endpoint::UpdateOrder, Outcome::Ok);
    info!(order_id, shipped = order.shipped, "order updated");

    Ok(HttpResponse::Ok().json(OrderUpdatedResponse {
        message: "Order updated".into(),
        order: order.into(),
    }))
}

pub async fn delete_order_handler(
    state: web::Data<AppState>,
    path: web::Path<OrderId>,
) -> Result<HttpResponse, ApiError> {
    let order_id = path.into_inner();
    if !track(
        Endpoint::DeleteOrder,
        state.storage().delete_order(order_id).await,
    )? {
        record(Endpoint::DeleteOrder, Outcome::NotFound);
        return Err(ApiError::NotFound("Order not found"));
    }
    record(Endpoint::DeleteOrder, Outcome::Ok);
    info!(order_id, "order deleted");

    Ok(HttpResponse::Ok().json(OrderDeletedResponse {
        message: "Order deleted successfully".into(),
    }))
}
