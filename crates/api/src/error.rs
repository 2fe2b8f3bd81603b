use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use services::{AuthError, PracticeServiceError, TimelineServiceError};
use wellness_core::model::{PathError, TimelineError};

/// Failure of a request, already classified by status.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    /// The detail is logged, never sent to the client.
    #[error("Internal server error")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(detail) = &self {
            error!(%detail, "request failed");
        }
        let status = self.status();
        let body = ErrorBody {
            success: false,
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingFields => ApiError::BadRequest("Missing required fields".into()),
            AuthError::UserExists => ApiError::BadRequest("User already exists".into()),
            AuthError::InvalidUser(invalid) => ApiError::BadRequest(invalid.to_string()),
            AuthError::InvalidCredentials => ApiError::Unauthorized("Invalid credentials".into()),
            AuthError::InvalidToken => ApiError::Unauthorized("Invalid token".into()),
            AuthError::UserNotFound => ApiError::NotFound("User not found".into()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<PracticeServiceError> for ApiError {
    fn from(err: PracticeServiceError) -> Self {
        match err {
            PracticeServiceError::NotFound => ApiError::NotFound("Practice node not found".into()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<TimelineServiceError> for ApiError {
    fn from(err: TimelineServiceError) -> Self {
        match err {
            TimelineServiceError::Timeline(invalid) => invalid.into(),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<TimelineError> for ApiError {
    fn from(err: TimelineError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<PathError> for ApiError {
    fn from(err: PathError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_errors_map_to_statuses() {
        assert_eq!(
            ApiError::from(AuthError::UserExists).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(AuthError::InvalidToken).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(PracticeServiceError::NotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(PathError::MissingField("poseId")).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn internal_detail_is_not_exposed() {
        let err = ApiError::from(AuthError::Hash("argon2 exploded".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Internal server error");
    }
}
