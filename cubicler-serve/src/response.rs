//! Maps `CubiclerError` (and the subsystem errors it wraps) to an HTTP status
//! code and a small JSON error body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use cubicler_core::dispatch::DispatchError;
use cubicler_core::webhook::WebhookError;
use cubicler_core::CubiclerError;

pub struct ApiError(pub StatusCode, pub String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(json!({ "error": self.1 }))).into_response()
    }
}

impl From<CubiclerError> for ApiError {
    fn from(err: CubiclerError) -> Self {
        let status = match &err {
            CubiclerError::NotFound { .. } => StatusCode::NOT_FOUND,
            CubiclerError::InvalidName(_) | CubiclerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            CubiclerError::Webhook(
                WebhookError::MissingSignature
                | WebhookError::InvalidSignature
                | WebhookError::MissingAuthorization
                | WebhookError::InvalidToken,
            ) => StatusCode::UNAUTHORIZED,
            CubiclerError::Webhook(WebhookError::Misconfigured(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            CubiclerError::Webhook(WebhookError::NotFound(_)) => StatusCode::NOT_FOUND,
            CubiclerError::Webhook(WebhookError::AgentNotAllowed { .. }) => StatusCode::FORBIDDEN,
            CubiclerError::Webhook(WebhookError::InvalidPayload(_)) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ApiError(status, err.to_string())
    }
}

impl From<DispatchError> for ApiError {
    fn from(err: DispatchError) -> Self {
        let status = match &err {
            DispatchError::EmptyMessages => StatusCode::BAD_REQUEST,
            DispatchError::AgentNotFound(_) => StatusCode::NOT_FOUND,
            DispatchError::NoAgentsConfigured | DispatchError::NoTransportForAgent(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        ApiError(status, err.to_string())
    }
}

impl From<WebhookError> for ApiError {
    fn from(err: WebhookError) -> Self {
        let status = match &err {
            WebhookError::NotFound(_) => StatusCode::NOT_FOUND,
            WebhookError::AgentNotAllowed { .. } => StatusCode::FORBIDDEN,
            WebhookError::MissingSignature
            | WebhookError::InvalidSignature
            | WebhookError::MissingAuthorization
            | WebhookError::InvalidToken => StatusCode::UNAUTHORIZED,
            WebhookError::Misconfigured(_) => StatusCode::INTERNAL_SERVER_ERROR,
            WebhookError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            WebhookError::Transform(_) | WebhookError::Dispatch(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ApiError(status, err.to_string())
    }
}
