use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::application::order_service::{DynOrderService, OrderItemInput};
use crate::domain::order::{Order, OrderId, OrderItem, OrderStatus, MAX_CUSTOMER_NAME_LEN};
use crate::errors::AppError;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderItemRequest {
    pub menu_id: i64,
    /// Must be at least 1.
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    /// Stored as given, at most 100 characters.
    pub customer_name: String,
    pub order_items: Vec<OrderItemRequest>,
}

impl CreateOrderRequest {
    fn validate(&self) -> Result<(), AppError> {
        if self.customer_name.trim().is_empty() {
            return Err(AppError::BadRequest("customer_name is required".to_string()));
        }
        if self.customer_name.chars().count() > MAX_CUSTOMER_NAME_LEN {
            return Err(AppError::BadRequest(format!(
                "customer_name must be at most {} characters",
                MAX_CUSTOMER_NAME_LEN
            )));
        }
        if self.order_items.is_empty() {
            return Err(AppError::BadRequest(
                "order_items must contain at least one item".to_string(),
            ));
        }
        if let Some(item) = self.order_items.iter().find(|i| i.quantity < 1) {
            return Err(AppError::BadRequest(format!(
                "quantity for menu {} must be at least 1",
                item.menu_id
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangeStatusRequest {
    /// One of PENDING, CONFIRMED, PREPARING, COMPLETED.
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItemResponse {
    pub menu_id: i64,
    pub menu_name: String,
    pub menu_price: i64,
    pub quantity: i32,
    pub subtotal: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub id: i64,
    pub customer_name: String,
    pub status: String,
    pub total_price: i64,
    pub ordered_at: String,
    pub order_items: Vec<OrderItemResponse>,
}

impl From<&OrderItem> for OrderItemResponse {
    fn from(item: &OrderItem) -> Self {
        Self {
            menu_id: item.menu_id(),
            menu_name: item.menu_name().to_string(),
            menu_price: item.menu_price(),
            quantity: item.quantity(),
            subtotal: item.subtotal(),
        }
    }
}

impl TryFrom<Order> for OrderResponse {
    type Error = AppError;

    fn try_from(order: Order) -> Result<Self, Self::Error> {
        let id = order
            .id()
            .ok_or_else(|| AppError::Internal("order was returned without an id".to_string()))?;
        Ok(Self {
            id,
            customer_name: order.customer_name().to_string(),
            status: order.status().to_string(),
            total_price: order.total_price(),
            ordered_at: order.ordered_at().to_rfc3339(),
            order_items: order.items().iter().map(OrderItemResponse::from).collect(),
        })
    }
}

// ── Pagination ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListOrdersParams {
    /// Page number (1-based). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: i64,
    /// Number of items per page. Defaults to 20, maximum 100.
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListOrdersResponse {
    pub items: Vec<OrderResponse>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

fn blocking_error(e: actix_web::error::BlockingError) -> AppError {
    AppError::Internal(e.to_string())
}

/// POST /orders
///
/// Places a new order. Each requested menu must exist and be available;
/// otherwise nothing is stored.
#[utoipa::path(
    post,
    path = "/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = OrderResponse),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Menu not found"),
        (status = 409, description = "Menu not available"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn create_order(
    service: web::Data<DynOrderService>,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    body.validate()?;

    let items: Vec<OrderItemInput> = body
        .order_items
        .iter()
        .map(|i| OrderItemInput {
            menu_id: i.menu_id,
            quantity: i.quantity,
        })
        .collect();

    let order = web::block(move || service.create_order(&body.customer_name, &items))
        .await
        .map_err(blocking_error)??;

    Ok(HttpResponse::Created().json(OrderResponse::try_from(order)?))
}

/// GET /orders/{id}
///
/// Returns the order together with all of its items.
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(
        ("id" = i64, Path, description = "Order id"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    service: web::Data<DynOrderService>,
    path: web::Path<OrderId>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();

    let order = web::block(move || service.get_order(order_id))
        .await
        .map_err(blocking_error)??;

    Ok(HttpResponse::Ok().json(OrderResponse::try_from(order)?))
}

/// GET /orders
///
/// Returns a page of orders, newest first.
#[utoipa::path(
    get,
    path = "/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 20, max 100)"),
    ),
    responses(
        (status = 200, description = "Paginated list of orders", body = ListOrdersResponse),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    service: web::Data<DynOrderService>,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let page = params.page.max(1);
    let limit = params
        .limit
        .clamp(1, crate::application::order_service::MAX_PAGE_SIZE);

    let result = web::block(move || service.list_orders(page, limit))
        .await
        .map_err(blocking_error)??;

    let items = result
        .items
        .into_iter()
        .map(OrderResponse::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(HttpResponse::Ok().json(ListOrdersResponse {
        items,
        total: result.total,
        page,
        limit,
    }))
}

/// PATCH /orders/{id}/status
///
/// Moves the order to the requested status. Only the next status in
/// PENDING → CONFIRMED → PREPARING → COMPLETED is accepted.
#[utoipa::path(
    patch,
    path = "/orders/{id}/status",
    params(
        ("id" = i64, Path, description = "Order id"),
    ),
    request_body = ChangeStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = OrderResponse),
        (status = 400, description = "Unknown status"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Transition not allowed"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn change_order_status(
    service: web::Data<DynOrderService>,
    path: web::Path<OrderId>,
    body: web::Json<ChangeStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let status: OrderStatus = body.status.parse()?;

    let order = web::block(move || service.change_order_status(order_id, status))
        .await
        .map_err(blocking_error)??;

    Ok(HttpResponse::Ok().json(OrderResponse::try_from(order)?))
}

/// DELETE /orders/{id}
///
/// Removes the order and all of its items.
#[utoipa::path(
    delete,
    path = "/orders/{id}",
    params(
        ("id" = i64, Path, description = "Order id"),
    ),
    responses(
        (status = 204, description = "Order deleted"),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn delete_order(
    service: web::Data<DynOrderService>,
    path: web::Path<OrderId>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();

    web::block(move || service.delete_order(order_id))
        .await
        .map_err(blocking_error)??;

    Ok(HttpResponse::NoContent().finish())
}

/// Registers the `/orders` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/orders")
            .route("", web::post().to(create_order))
            .route("", web::get().to(list_orders))
            .route("/{id}", web::get().to(get_order))
            .route("/{id}", web::delete().to(delete_order))
            .route("/{id}/status", web::patch().to(change_order_status)),
    );
}
