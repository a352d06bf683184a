use utoipa_axum::router::OpenApiRouter;

use crate::common::app_state::AppState;

pub mod auth;
pub mod carts;
pub mod chat;
pub mod menu;
pub mod orders;
pub mod payments;
pub mod pos;
pub mod tables;
pub mod users;

/// Every resource router, mounted under `/api`.
pub fn api_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/api",
        OpenApiRouter::new()
            .merge(auth::routes_with_openapi())
            .merge(users::routes_with_openapi())
            .merge(menu::routes_with_openapi())
            .merge(tables::routes_with_openapi())
            .merge(carts::routes_with_openapi())
            .merge(orders::routes_with_openapi())
            .merge(pos::routes_with_openapi())
            .merge(payments::routes_with_openapi())
            .merge(chat::routes_with_openapi()),
    )
}
