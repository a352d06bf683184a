use axum::{extract::State, response::IntoResponse};
use utoipa_axum::router::OpenApiRouter;

use crate::{
    common::{
        app_error::{AppError, StdResponse},
        app_state::AppState,
        extract::ApiJson,
    },
    models::UserEntity,
    services::users::{self, LoginReq},
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/auth",
        OpenApiRouter::new().routes(utoipa_axum::routes!(login)),
    )
}

/// Checks the credentials and returns the user. No session is issued.
#[utoipa::path(
    post,
    path = "/login",
    tags = ["Auth"],
    request_body = LoginReq,
    responses(
        (status = 200, description = "Credentials accepted", body = StdResponse<UserEntity, String>),
        (status = 400, description = "Email or password missing"),
        (status = 401, description = "Invalid password"),
        (status = 404, description = "User not found")
    )
)]
async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginReq>,
) -> Result<impl IntoResponse, AppError> {
    let user = users::login(&state, body).await?;
    Ok(StdResponse::ok("Login successful", user))
}
