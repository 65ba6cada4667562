use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use releases::ReleaseError;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Release(#[from] ReleaseError),

    #[error("general failure: {0}")]
    Failure(String),

    #[error("invalid request body: {0}")]
    JsonRejection(#[from] JsonRejection),

    #[error("invalid query: {0}")]
    QueryRejection(#[from] QueryRejection),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Release(ReleaseError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Release(ReleaseError::Conflict(_)) => StatusCode::CONFLICT,
            ApiError::Release(ReleaseError::InvalidState(_))
            | ApiError::Release(ReleaseError::InvalidFormat(_)) => StatusCode::BAD_REQUEST,
            ApiError::Release(ReleaseError::Internal(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Failure(_) | ApiError::JsonRejection(_) | ApiError::QueryRejection(_) => {
                StatusCode::BAD_REQUEST
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let error_message = match &self {
            ApiError::Release(ReleaseError::Internal(err)) => {
                error!("Request failed: {err}");
                "internal failure".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(serde_json::json!({
            "result": "failed",
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_errors_map_to_status_codes() {
        let cases = [
            (ReleaseError::NotFound("app"), StatusCode::NOT_FOUND),
            (ReleaseError::Conflict("x".into()), StatusCode::CONFLICT),
            (ReleaseError::InvalidState("x".into()), StatusCode::BAD_REQUEST),
            (ReleaseError::InvalidFormat("x".into()), StatusCode::BAD_REQUEST),
            (ReleaseError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }
}
