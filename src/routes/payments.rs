use axum::{extract::State, http::StatusCode, response::IntoResponse};
use utoipa_axum::router::OpenApiRouter;

use crate::{
    common::{
        app_error::{AppError, StdResponse},
        app_state::AppState,
        extract::{ApiJson, ApiPath},
    },
    models::{PaymentEntity, PaymentSummary},
    services::payments::{self, CreatePaymentReq, UpdatePaymentStatusReq},
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/payments",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(create_payment))
            .routes(utoipa_axum::routes!(get_payments))
            .routes(utoipa_axum::routes!(get_payments_for_order))
            .routes(utoipa_axum::routes!(get_payment))
            .routes(utoipa_axum::routes!(update_payment_status)),
    )
}

/// Records a payment for an order. The amount must equal the order total.
/// When the order already has a payment, `DUPLICATE_PAYMENTS` decides:
/// `supersede` updates the latest one, `reject` answers 409.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Payments"],
    request_body = CreatePaymentReq,
    responses(
        (status = 201, description = "Payment recorded", body = StdResponse<PaymentEntity, String>),
        (status = 400, description = "Missing fields, invalid status or amount mismatch"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Order already paid and duplicates are rejected")
    )
)]
async fn create_payment(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreatePaymentReq>,
) -> Result<impl IntoResponse, AppError> {
    let payment = payments::create_payment(&state, body).await?;
    Ok((
        StatusCode::CREATED,
        StdResponse::ok("Payment recorded successfully", payment),
    ))
}

#[utoipa::path(
    get,
    path = "/",
    tags = ["Payments"],
    responses(
        (status = 200, description = "All payments", body = StdResponse<Vec<PaymentSummary>, String>)
    )
)]
async fn get_payments(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let payments = payments::list_payments(&state).await?;
    Ok(StdResponse::ok("Payments retrieved successfully", payments))
}

#[utoipa::path(
    get,
    path = "/order/{order_id}",
    tags = ["Payments"],
    params(("order_id" = i32, Path, description = "Order whose payments to list")),
    responses(
        (status = 200, description = "Payments of the order", body = StdResponse<Vec<PaymentEntity>, String>),
        (status = 404, description = "Order not found")
    )
)]
async fn get_payments_for_order(
    State(state): State<AppState>,
    ApiPath(order_id): ApiPath<i32>,
) -> Result<impl IntoResponse, AppError> {
    let payments = payments::payments_for_order(&state, order_id).await?;
    Ok(StdResponse::ok("Payments retrieved successfully", payments))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tags = ["Payments"],
    params(("id" = i32, Path, description = "Payment ID")),
    responses(
        (status = 200, description = "Payment", body = StdResponse<PaymentEntity, String>),
        (status = 404, description = "Payment not found")
    )
)]
async fn get_payment(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<impl IntoResponse, AppError> {
    let payment = payments::get_payment(&state, id).await?;
    Ok(StdResponse::ok("Payment retrieved successfully", payment))
}

#[utoipa::path(
    put,
    path = "/{id}/status",
    tags = ["Payments"],
    params(("id" = i32, Path, description = "Payment ID")),
    request_body = UpdatePaymentStatusReq,
    responses(
        (status = 200, description = "Status updated", body = StdResponse<PaymentEntity, String>),
        (status = 400, description = "Missing or invalid status"),
        (status = 404, description = "Payment not found")
    )
)]
async fn update_payment_status(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(body): ApiJson<UpdatePaymentStatusReq>,
) -> Result<impl IntoResponse, AppError> {
    let payment = payments::update_status(&state, id, body).await?;
    Ok(StdResponse::ok("Payment status updated successfully", payment))
}
