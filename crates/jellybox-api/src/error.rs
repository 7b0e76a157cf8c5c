//! Error types for the HTTP API.
//!
//! [`ApiError`] maps every service failure onto a status code and a JSON
//! body of the form `{ "error": ..., "status": ..., "details": ... }` so a
//! chat front end can word the reply without parsing messages.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};

use jellybox_core::{BoxError, CatchError};

/// Errors that can occur in the API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A box operation failed.
    #[error(transparent)]
    Box(#[from] BoxError),

    /// The request itself is malformed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::Box(BoxError::UnknownStyle { .. }) => {
                StatusCode::BAD_REQUEST
            }
            Self::Box(BoxError::Catch(CatchError::CooldownActive { .. })) => {
                StatusCode::TOO_MANY_REQUESTS
            }
            Self::Box(BoxError::Catch(CatchError::BoxFull { .. } | CatchError::EmptyCatalogue)) => {
                StatusCode::CONFLICT
            }
            Self::Box(BoxError::Release(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Box(BoxError::Repository(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Box(
                BoxError::Catch(CatchError::Choice(_)) | BoxError::Choice(_) | BoxError::Inventory(_),
            ) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn details(&self) -> Value {
        match self {
            Self::Box(BoxError::Catch(CatchError::CooldownActive { remaining_seconds })) => {
                json!({ "remaining_seconds": remaining_seconds })
            }
            Self::Box(BoxError::Catch(CatchError::BoxFull {
                population,
                capacity,
            })) => json!({ "population": population, "capacity": capacity }),
            Self::Box(BoxError::Release(rejected)) => {
                serde_json::to_value(&rejected.errors).unwrap_or(Value::Null)
            }
            Self::Box(BoxError::UnknownStyle { style }) => json!({ "style": style }),
            _ => Value::Null,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "request refused");
        }

        let body = json!({
            "error": self.to_string(),
            "status": status.as_u16(),
            "details": self.details(),
        });

        (status, axum::Json(body)).into_response()
    }
}
