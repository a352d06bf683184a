use axum::{extract::Request, middleware::Next, response::Response};
use serde::Deserialize;

use crate::common::{app_error::AppError, extract::ApiQuery};

/// Identity carried on the query string (`?userId=..&userRole=..`).
#[derive(Debug, Clone)]
pub struct Caller {
    pub user_id: i32,
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct CallerParams {
    #[serde(rename = "userId")]
    user_id: Option<String>,
    #[serde(rename = "userRole")]
    user_role: Option<String>,
}

impl CallerParams {
    fn into_caller(self) -> Result<Caller, AppError> {
        let user_id = self
            .user_id
            .as_deref()
            .and_then(|id| id.trim().parse::<i32>().ok())
            .filter(|id| *id > 0)
            .ok_or_else(|| {
                AppError::Unauthenticated("userId query parameter is required".into())
            })?;

        let role = self
            .user_role
            .unwrap_or_else(|| "customer".into())
            .to_lowercase();

        Ok(Caller { user_id, role })
    }
}

/// Rejects requests that do not come from an admin.
pub async fn admin_authorization(
    ApiQuery(params): ApiQuery<CallerParams>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let caller = params.into_caller()?;
    if caller.role != "admin" {
        return Err(AppError::Forbidden("Admin access required".into()));
    }

    req.extensions_mut().insert(caller);
    Ok(next.run(req).await)
}
