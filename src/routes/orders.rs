use axum::{extract::State, http::StatusCode, response::IntoResponse};
use utoipa_axum::router::OpenApiRouter;

use crate::{
    common::{
        app_error::{AppError, StdResponse},
        app_state::AppState,
        extract::{ApiJson, ApiPath, ApiQuery},
    },
    models::{OrderDetails, OrderEntity, OrderFilter, OrderSummary},
    services::orders::{self, CreateOrderReq, UpdateStatusReq},
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/orders",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(create_order))
            .routes(utoipa_axum::routes!(get_orders))
            .routes(utoipa_axum::routes!(get_order))
            .routes(utoipa_axum::routes!(update_order_status))
            .routes(utoipa_axum::routes!(cancel_order)),
    )
}

/// Checks out the user's cart. Nothing is written when the cart is empty.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Orders"],
    request_body = CreateOrderReq,
    responses(
        (status = 201, description = "Order created", body = StdResponse<OrderDetails, String>),
        (status = 400, description = "Missing fields or empty cart"),
        (status = 404, description = "User or table not found")
    )
)]
async fn create_order(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateOrderReq>,
) -> Result<impl IntoResponse, AppError> {
    let order = orders::create_order(&state, body).await?;
    Ok((
        StatusCode::CREATED,
        StdResponse::ok("Order created successfully", order),
    ))
}

/// Orders newest first, optionally filtered by status and user.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Orders"],
    params(OrderFilter),
    responses(
        (status = 200, description = "List orders", body = StdResponse<Vec<OrderSummary>, String>)
    )
)]
async fn get_orders(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<OrderFilter>,
) -> Result<impl IntoResponse, AppError> {
    let orders = orders::list_orders(&state, filter).await?;
    Ok(StdResponse::ok("Orders retrieved successfully", orders))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tags = ["Orders"],
    params(("id" = i32, Path, description = "Order ID to fetch")),
    responses(
        (status = 200, description = "Order with its lines", body = StdResponse<OrderDetails, String>),
        (status = 404, description = "Order not found")
    )
)]
async fn get_order(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<impl IntoResponse, AppError> {
    let order = orders::get_order(&state, id).await?;
    Ok(StdResponse::ok("Order retrieved successfully", order))
}

/// Moves the order to a new status according to the configured transition
/// table (`ORDER_TRANSITIONS`).
#[utoipa::path(
    put,
    path = "/{id}/status",
    tags = ["Orders"],
    params(("id" = i32, Path, description = "Order ID")),
    request_body = UpdateStatusReq,
    responses(
        (status = 200, description = "Status updated", body = StdResponse<OrderDetails, String>),
        (status = 400, description = "Invalid status or transition"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Order changed concurrently")
    )
)]
async fn update_order_status(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(body): ApiJson<UpdateStatusReq>,
) -> Result<impl IntoResponse, AppError> {
    let order = orders::update_status(&state, id, body).await?;
    Ok(StdResponse::ok("Order status updated successfully", order))
}

/// Cancels a pending order. The order is kept with status `cancelled`.
#[utoipa::path(
    delete,
    path = "/{id}",
    tags = ["Orders"],
    params(("id" = i32, Path, description = "Order ID to cancel")),
    responses(
        (status = 200, description = "Order cancelled", body = StdResponse<OrderEntity, String>),
        (status = 400, description = "Order is not pending"),
        (status = 404, description = "Order not found")
    )
)]
async fn cancel_order(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<impl IntoResponse, AppError> {
    let order = orders::cancel_order(&state, id).await?;
    Ok(StdResponse::ok("Order cancelled successfully", order))
}
