use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::council::CouncilError;

/// Boundary-layer error type. Every pipeline and store failure is mapped to a
/// status + machine-readable kind here so clients can branch on `error`
/// instead of scraping messages.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error(transparent)]
    Council(#[from] CouncilError),
    #[error("database error")]
    Database(#[from] sqlx::Error),
}

impl ApiError {
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "validation"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            // semantic no-result: the client should ask the user to rephrase,
            // not retry later
            ApiError::Council(CouncilError::NoItemsRecognized) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "no_items_recognized")
            }
            ApiError::Council(CouncilError::Timeout { .. }) => {
                (StatusCode::GATEWAY_TIMEOUT, "provider_timeout")
            }
            ApiError::Council(_) => (StatusCode::BAD_GATEWAY, "provider_error"),
            ApiError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();
        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        } else {
            tracing::warn!(error = %self, "request rejected");
        }
        let body = Json(json!({ "error": kind, "message": self.to_string() }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_items_maps_to_unprocessable_entity() {
        let resp = ApiError::Council(CouncilError::NoItemsRecognized).into_response();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn provider_timeout_maps_to_gateway_timeout() {
        let resp = ApiError::Council(CouncilError::Timeout {
            provider: "nutrition lookup",
        })
        .into_response();
        assert_eq!(resp.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn transport_errors_map_to_bad_gateway() {
        let resp = ApiError::Council(CouncilError::Vision("boom".into())).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn validation_maps_to_bad_request() {
        let resp = ApiError::Validation("verified_text too short".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
