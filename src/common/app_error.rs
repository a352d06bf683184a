use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use utoipa::ToSchema;

use crate::{
    domain::{MAX_LINE_QUANTITY, money},
    store::StoreError,
};

/// Errors surfaced to API clients.
///
/// Every variant renders the same envelope:
/// `{"success": false, "error": {"code", "message"}, "details"?}`.
/// Internal failures are logged and replaced by a generic message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{message}")]
    InvalidInput { message: String, details: Value },

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0} is unreachable")]
    ServiceUnreachable(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::ServiceUnreachable(_) => StatusCode::BAD_GATEWAY,
            AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) | AppError::InvalidInput { .. } => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT_ERROR",
            AppError::Unauthenticated(_) => "AUTHENTICATION_ERROR",
            AppError::Forbidden(_) => "AUTHORIZATION_ERROR",
            AppError::ServiceUnreachable(_) => "BAD_GATEWAY",
            AppError::Other(_) => "INTERNAL_ERROR",
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound(message.into())
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorBody,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        let message = match &self {
            AppError::Other(err) => {
                tracing::error!(error = ?err, "Unhandled error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        let details = match self {
            AppError::InvalidInput { details, .. } => Some(details),
            _ => None,
        };

        let body = ErrorResponse {
            success: false,
            error: ErrorBody {
                code: code.to_string(),
                message,
            },
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::EmptyCart => AppError::validation("Cart is empty"),
            StoreError::ItemUnavailable(item_id) => AppError::validation(format!(
                "Menu item with ID {item_id} not found or not available"
            )),
            StoreError::QuantityLimit(item_id) => AppError::validation(format!(
                "Quantity for menu item {item_id} cannot exceed {MAX_LINE_QUANTITY}"
            )),
            StoreError::TotalOutOfRange => AppError::validation(format!(
                "Order total cannot exceed {}",
                money::MAX_AMOUNT
            )),
            StoreError::Conflict(message) => AppError::Conflict(message),
            StoreError::Other(err) => AppError::Other(err),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidInput {
            message: "Invalid JSON body".into(),
            details: Value::String(rejection.body_text()),
        }
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::InvalidInput {
            message: "Invalid path parameter".into(),
            details: Value::String(rejection.body_text()),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidInput {
            message: "Invalid query parameters".into(),
            details: Value::String(rejection.body_text()),
        }
    }
}

/// Success envelope: `{"success": true, "message", "data"?}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct StdResponse<T, M> {
    pub success: bool,
    pub message: M,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T, M> StdResponse<T, M> {
    pub fn ok(message: M, data: T) -> Self {
        Self {
            success: true,
            message,
            data: Some(data),
        }
    }

    pub fn message(message: M) -> Self {
        Self {
            success: true,
            message,
            data: None,
        }
    }
}

impl<T: Serialize, M: Serialize> IntoResponse for StdResponse<T, M> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_and_code_line_up() {
        let cases = [
            (AppError::validation("x"), 400, "VALIDATION_ERROR"),
            (AppError::not_found("x"), 404, "NOT_FOUND"),
            (AppError::Conflict("x".into()), 409, "CONFLICT_ERROR"),
            (AppError::Unauthenticated("x".into()), 401, "AUTHENTICATION_ERROR"),
            (AppError::Forbidden("x".into()), 403, "AUTHORIZATION_ERROR"),
            (AppError::Other(anyhow::anyhow!("boom")), 500, "INTERNAL_ERROR"),
        ];
        for (err, status, code) in cases {
            assert_eq!(err.status().as_u16(), status);
            assert_eq!(err.code(), code);
        }
    }

    #[test]
    fn store_errors_map_to_client_errors() {
        let err: AppError = StoreError::EmptyCart.into();
        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert_eq!(err.to_string(), "Cart is empty");

        let err: AppError = StoreError::ItemUnavailable(5).into();
        assert_eq!(
            err.to_string(),
            "Menu item with ID 5 not found or not available"
        );
    }
}
