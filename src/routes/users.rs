use axum::{Extension, extract::State, http::StatusCode, response::IntoResponse};
use tracing::info;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    common::{
        app_error::{AppError, StdResponse},
        app_state::AppState,
        extract::{ApiJson, ApiPath},
        middleware::{self, Caller},
    },
    models::UserEntity,
    services::users::{self, UserReq},
};

/// User management. Every route requires `?userId=..&userRole=admin`.
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/users",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(create_user))
            .routes(utoipa_axum::routes!(get_users))
            .routes(utoipa_axum::routes!(get_user))
            .routes(utoipa_axum::routes!(update_user))
            .routes(utoipa_axum::routes!(delete_user))
            .route_layer(axum::middleware::from_fn(middleware::admin_authorization)),
    )
}

#[utoipa::path(
    post,
    path = "/",
    tags = ["Users"],
    security(("adminQuery" = [])),
    request_body = UserReq,
    responses(
        (status = 201, description = "User created", body = StdResponse<UserEntity, String>),
        (status = 400, description = "Missing fields or invalid email/phone"),
        (status = 401, description = "userId missing"),
        (status = 403, description = "Caller is not an admin"),
        (status = 409, description = "Email already exists")
    )
)]
async fn create_user(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiJson(body): ApiJson<UserReq>,
) -> Result<impl IntoResponse, AppError> {
    let user = users::create_user(&state, body).await?;
    info!("Admin #{} created user #{}", caller.user_id, user.id);
    Ok((
        StatusCode::CREATED,
        StdResponse::ok("User created successfully", user),
    ))
}

#[utoipa::path(
    get,
    path = "/",
    tags = ["Users"],
    security(("adminQuery" = [])),
    responses(
        (status = 200, description = "Users newest first", body = StdResponse<Vec<UserEntity>, String>),
        (status = 401, description = "userId missing"),
        (status = 403, description = "Caller is not an admin")
    )
)]
async fn get_users(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let users = users::list_users(&state).await?;
    Ok(StdResponse::ok("Users retrieved successfully", users))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tags = ["Users"],
    security(("adminQuery" = [])),
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User", body = StdResponse<UserEntity, String>),
        (status = 404, description = "User not found")
    )
)]
async fn get_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<impl IntoResponse, AppError> {
    let user = users::require_user(&state, id).await?;
    Ok(StdResponse::ok("User retrieved successfully", user))
}

/// Full overwrite, password included.
#[utoipa::path(
    put,
    path = "/{id}",
    tags = ["Users"],
    security(("adminQuery" = [])),
    params(("id" = i32, Path, description = "User ID")),
    request_body = UserReq,
    responses(
        (status = 200, description = "User updated", body = StdResponse<UserEntity, String>),
        (status = 400, description = "Missing fields or invalid email/phone"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Email already exists")
    )
)]
async fn update_user(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(body): ApiJson<UserReq>,
) -> Result<impl IntoResponse, AppError> {
    let user = users::update_user(&state, id, body).await?;
    info!("Admin #{} updated user #{}", caller.user_id, id);
    Ok(StdResponse::ok("User updated successfully", user))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tags = ["Users"],
    security(("adminQuery" = [])),
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted"),
        (status = 404, description = "User not found"),
        (status = 409, description = "User still has orders")
    )
)]
async fn delete_user(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiPath(id): ApiPath<i32>,
) -> Result<impl IntoResponse, AppError> {
    users::delete_user(&state, id).await?;
    info!("Admin #{} deleted user #{}", caller.user_id, id);
    Ok(StdResponse::<(), _>::message("User deleted successfully"))
}
