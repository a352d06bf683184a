pub mod api;
pub mod common;
pub mod domain;
pub mod models;
pub mod routes;
pub mod schema;
pub mod services;
pub mod store;

use anyhow::Result;
use axum::{Router, response::IntoResponse, routing::get};

use crate::common::{app_error::StdResponse, app_state::AppState, swagger};

/// The full HTTP application: API routes, Swagger UI and the root greeting.
pub fn app(state: AppState) -> Result<Router> {
    let routes = routes::api_routes();

    let mut openapi = routes.get_openapi().clone();
    openapi.info = utoipa::openapi::InfoBuilder::new()
        .title("Restaurant OrderService API")
        .description(Some(
            "Menu, cart, checkout, POS and payments for a single restaurant.",
        ))
        .version("1.0.0")
        .build();
    let swagger_ui = swagger::create_swagger_ui(openapi)?;

    let app = Router::new()
        .route("/", get(welcome))
        .merge(routes)
        .merge(swagger_ui)
        .with_state(state);

    Ok(app)
}

async fn welcome() -> impl IntoResponse {
    StdResponse::<(), _>::message("Welcome to the restaurant ordering API")
}
