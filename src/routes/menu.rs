use axum::{extract::State, http::StatusCode, response::IntoResponse};
use utoipa_axum::router::OpenApiRouter;

use crate::{
    common::{
        app_error::{AppError, StdResponse},
        app_state::AppState,
        extract::{ApiJson, ApiPath, ApiQuery},
    },
    models::{MenuFilter, MenuItemEntity},
    services::menu::{self, MenuItemReq},
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/menu",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(create_item))
            .routes(utoipa_axum::routes!(get_items))
            .routes(utoipa_axum::routes!(get_item))
            .routes(utoipa_axum::routes!(update_item))
            .routes(utoipa_axum::routes!(delete_item)),
    )
}

#[utoipa::path(
    post,
    path = "/",
    tags = ["Menu"],
    request_body = MenuItemReq,
    responses(
        (status = 201, description = "Menu item created", body = StdResponse<MenuItemEntity, String>),
        (status = 400, description = "Missing name or price, or price not positive")
    )
)]
async fn create_item(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<MenuItemReq>,
) -> Result<impl IntoResponse, AppError> {
    let item = menu::create_item(&state, body).await?;
    Ok((
        StatusCode::CREATED,
        StdResponse::ok("Menu item created successfully", item),
    ))
}

/// Catalog newest first, optionally narrowed by category and type.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Menu"],
    params(MenuFilter),
    responses(
        (status = 200, description = "List menu items", body = StdResponse<Vec<MenuItemEntity>, String>)
    )
)]
async fn get_items(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<MenuFilter>,
) -> Result<impl IntoResponse, AppError> {
    let items = menu::list_items(&state, filter).await?;
    Ok(StdResponse::ok("Menu items retrieved successfully", items))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tags = ["Menu"],
    params(("id" = i32, Path, description = "Menu item ID")),
    responses(
        (status = 200, description = "Menu item", body = StdResponse<MenuItemEntity, String>),
        (status = 404, description = "Menu item not found")
    )
)]
async fn get_item(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<impl IntoResponse, AppError> {
    let item = menu::get_item(&state, id).await?;
    Ok(StdResponse::ok("Menu item retrieved successfully", item))
}

/// Price changes never touch lines of orders already placed.
#[utoipa::path(
    put,
    path = "/{id}",
    tags = ["Menu"],
    params(("id" = i32, Path, description = "Menu item ID")),
    request_body = MenuItemReq,
    responses(
        (status = 200, description = "Menu item updated", body = StdResponse<MenuItemEntity, String>),
        (status = 400, description = "Missing name or price, or price not positive"),
        (status = 404, description = "Menu item not found")
    )
)]
async fn update_item(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(body): ApiJson<MenuItemReq>,
) -> Result<impl IntoResponse, AppError> {
    let item = menu::update_item(&state, id, body).await?;
    Ok(StdResponse::ok("Menu item updated successfully", item))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tags = ["Menu"],
    params(("id" = i32, Path, description = "Menu item ID")),
    responses(
        (status = 200, description = "Menu item deleted"),
        (status = 404, description = "Menu item not found"),
        (status = 409, description = "Item is referenced by orders")
    )
)]
async fn delete_item(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<impl IntoResponse, AppError> {
    menu::delete_item(&state, id).await?;
    Ok(StdResponse::<(), _>::message("Menu item deleted successfully"))
}
