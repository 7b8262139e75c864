use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use hushbox_types::api::StatusResponse;

use crate::inbox::InboxError;

/// Every failure an endpoint can return. Rendered as
/// `{"success": false, "message": ...}` with the matching status code.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not Authenticated")]
    Unauthenticated,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    NotFound(String),

    #[error("User is not accepting messages")]
    NotAccepting,

    #[error("{0}")]
    Conflict(String),

    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::NotAccepting => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// A path key that cannot be decoded can never match a record, so it is
    /// reported the same way as a key that matches nothing.
    pub fn unresolvable_path(rejection: PathRejection, not_found: &str) -> Self {
        warn!("Rejected path parameter: {}", rejection.body_text());
        ApiError::NotFound(not_found.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(StatusResponse::failure(self.to_string()))).into_response()
    }
}

impl From<InboxError> for ApiError {
    fn from(err: InboxError) -> Self {
        match err {
            InboxError::InvalidInput(msg) => ApiError::InvalidInput(msg.to_string()),
            InboxError::UserNotFound | InboxError::MessageNotFound => {
                ApiError::NotFound(err.to_string())
            }
            InboxError::NotAccepting => ApiError::NotAccepting,
            InboxError::Store(e) => {
                error!("Store failure: {:#}", e);
                ApiError::Internal
            }
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        error!("Internal error: {:#}", err);
        ApiError::Internal
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!("Rejected request body: {}", rejection.body_text());
        ApiError::InvalidInput("Invalid request body".into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_status_codes() {
        assert_eq!(ApiError::Unauthenticated.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::InvalidInput("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::NotAccepting.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::Conflict("x".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(ApiError::Internal.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn store_failures_hide_internals() {
        let err = ApiError::from(InboxError::Store(anyhow::anyhow!("disk I/O error at page 7")));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Internal server error");
    }

    #[test]
    fn not_found_keeps_its_message() {
        let err = ApiError::from(InboxError::MessageNotFound);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Message not found or already deleted");
    }
}
