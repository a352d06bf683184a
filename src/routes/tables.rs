use axum::{extract::State, http::StatusCode, response::IntoResponse};
use utoipa_axum::router::OpenApiRouter;

use crate::{
    common::{
        app_error::{AppError, StdResponse},
        app_state::AppState,
        extract::{ApiJson, ApiPath},
    },
    models::RestaurantTableEntity,
    services::tables::{self, OccupiedReq, TableReq},
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/tables",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(create_table))
            .routes(utoipa_axum::routes!(get_tables))
            .routes(utoipa_axum::routes!(get_table))
            .routes(utoipa_axum::routes!(update_table))
            .routes(utoipa_axum::routes!(set_occupied)),
    )
}

#[utoipa::path(
    post,
    path = "/",
    tags = ["Tables"],
    request_body = TableReq,
    responses(
        (status = 201, description = "Table created", body = StdResponse<RestaurantTableEntity, String>),
        (status = 400, description = "Missing fields or seats not positive"),
        (status = 409, description = "Table number already exists")
    )
)]
async fn create_table(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<TableReq>,
) -> Result<impl IntoResponse, AppError> {
    let table = tables::create_table(&state, body).await?;
    Ok((
        StatusCode::CREATED,
        StdResponse::ok("Table created successfully", table),
    ))
}

#[utoipa::path(
    get,
    path = "/",
    tags = ["Tables"],
    responses(
        (status = 200, description = "Tables by number", body = StdResponse<Vec<RestaurantTableEntity>, String>)
    )
)]
async fn get_tables(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let tables = tables::list_tables(&state).await?;
    Ok(StdResponse::ok("Tables retrieved successfully", tables))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tags = ["Tables"],
    params(("id" = i32, Path, description = "Table ID")),
    responses(
        (status = 200, description = "Table", body = StdResponse<RestaurantTableEntity, String>),
        (status = 404, description = "Table not found")
    )
)]
async fn get_table(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<impl IntoResponse, AppError> {
    let table = tables::get_table(&state, id).await?;
    Ok(StdResponse::ok("Table retrieved successfully", table))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tags = ["Tables"],
    params(("id" = i32, Path, description = "Table ID")),
    request_body = TableReq,
    responses(
        (status = 200, description = "Table updated", body = StdResponse<RestaurantTableEntity, String>),
        (status = 400, description = "Missing fields or seats not positive"),
        (status = 404, description = "Table not found"),
        (status = 409, description = "Table number already exists")
    )
)]
async fn update_table(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(body): ApiJson<TableReq>,
) -> Result<impl IntoResponse, AppError> {
    let table = tables::update_table(&state, id, body).await?;
    Ok(StdResponse::ok("Table updated successfully", table))
}

#[utoipa::path(
    put,
    path = "/{id}/occupied",
    tags = ["Tables"],
    params(("id" = i32, Path, description = "Table ID")),
    request_body = OccupiedReq,
    responses(
        (status = 200, description = "Occupancy updated", body = StdResponse<RestaurantTableEntity, String>),
        (status = 400, description = "is_occupied missing"),
        (status = 404, description = "Table not found")
    )
)]
async fn set_occupied(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(body): ApiJson<OccupiedReq>,
) -> Result<impl IntoResponse, AppError> {
    let table = tables::set_occupied(&state, id, body).await?;
    Ok(StdResponse::ok("Table occupancy updated successfully", table))
}
