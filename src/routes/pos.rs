use axum::{extract::State, http::StatusCode, response::IntoResponse};
use utoipa_axum::router::OpenApiRouter;

use crate::{
    common::{
        app_error::{AppError, StdResponse},
        app_state::AppState,
        extract::{ApiJson, ApiPath},
    },
    models::{OrderDetails, OrderEntity, OrderSummary},
    services::pos::{self, QuickOrderReq},
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/pos",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(create_quick_order))
            .routes(utoipa_axum::routes!(get_active_orders))
            .routes(utoipa_axum::routes!(close_order)),
    )
}

/// Creates an order straight from an item list. Any missing or unavailable
/// item fails the whole order.
#[utoipa::path(
    post,
    path = "/order",
    tags = ["POS"],
    request_body = QuickOrderReq,
    responses(
        (status = 201, description = "Quick order created", body = StdResponse<OrderDetails, String>),
        (status = 400, description = "Invalid items"),
        (status = 404, description = "User not found")
    )
)]
async fn create_quick_order(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<QuickOrderReq>,
) -> Result<impl IntoResponse, AppError> {
    let order = pos::create_quick_order(&state, body).await?;
    Ok((
        StatusCode::CREATED,
        StdResponse::ok("Quick order created successfully", order),
    ))
}

#[utoipa::path(
    get,
    path = "/orders/active",
    tags = ["POS"],
    responses(
        (status = 200, description = "Orders not yet delivered or cancelled", body = StdResponse<Vec<OrderSummary>, String>)
    )
)]
async fn get_active_orders(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let orders = pos::active_orders(&state).await?;
    Ok(StdResponse::ok("Active orders retrieved successfully", orders))
}

/// Forces the order to `delivered`. Payments are not touched.
#[utoipa::path(
    put,
    path = "/orders/{id}/close",
    tags = ["POS"],
    params(("id" = i32, Path, description = "Order ID to close")),
    responses(
        (status = 200, description = "Order closed", body = StdResponse<OrderEntity, String>),
        (status = 400, description = "Order was cancelled"),
        (status = 404, description = "Order not found")
    )
)]
async fn close_order(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<impl IntoResponse, AppError> {
    let order = pos::close_order(&state, id).await?;
    Ok(StdResponse::ok(format!("Order {id} closed successfully"), order))
}
