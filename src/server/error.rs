//! HTTP error responses.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::auth::AuthError;
use crate::checklists::ChecklistError;
use crate::store::StoreError;

/// Error body: a stable machine code plus the message clients display.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    detail: String,
}

/// An error on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, detail: impl Into<String>) -> Self {
        Self {
            status,
            code,
            detail: detail.into(),
        }
    }

    pub fn unauthorized(code: &'static str, detail: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, code, detail)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.code,
            detail: self.detail,
        });

        if self.status == StatusCode::UNAUTHORIZED {
            (self.status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response()
        } else {
            (self.status, body).into_response()
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match &e {
            StoreError::NotFound(..) => {
                tracing::warn!("Document vanished mid-request: {}", e);
                ApiError::new(StatusCode::NOT_FOUND, "not_found", e.to_string())
            }
            StoreError::Conflict(..) => {
                ApiError::new(StatusCode::CONFLICT, "conflict", e.to_string())
            }
            StoreError::Unavailable(_) => {
                tracing::error!("{}", e);
                ApiError::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "store_unavailable",
                    "The data store is unavailable, try again later",
                )
            }
            StoreError::Corrupt(_) => {
                tracing::error!("{}", e);
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error",
                )
            }
        }
    }
}

impl From<ChecklistError> for ApiError {
    fn from(e: ChecklistError) -> Self {
        match e {
            ChecklistError::NotFound(_) => {
                ApiError::new(StatusCode::NOT_FOUND, "not_found", "Checklist not found")
            }
            ChecklistError::Forbidden => {
                ApiError::new(StatusCode::FORBIDDEN, "forbidden", "Access denied")
            }
            ChecklistError::Invalid(msg) => {
                ApiError::new(StatusCode::BAD_REQUEST, "invalid_request", msg)
            }
            ChecklistError::Store(e) => e.into(),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::EmailTaken => {
                ApiError::new(StatusCode::BAD_REQUEST, "email_taken", e.to_string())
            }
            AuthError::InvalidCredentials => {
                ApiError::unauthorized("invalid_credentials", e.to_string())
            }
            AuthError::InvalidToken => ApiError::unauthorized("invalid_token", e.to_string()),
            AuthError::Validation(msg) => {
                ApiError::new(StatusCode::BAD_REQUEST, "invalid_request", msg)
            }
            AuthError::Hashing(_) => {
                tracing::error!("{}", e);
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error",
                )
            }
            AuthError::Store(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Collection;

    #[test]
    fn test_checklist_error_statuses() {
        let cases = [
            (ChecklistError::NotFound("c1".into()), StatusCode::NOT_FOUND),
            (ChecklistError::Forbidden, StatusCode::FORBIDDEN),
            (ChecklistError::Invalid("x".into()), StatusCode::BAD_REQUEST),
            (
                ChecklistError::Store(StoreError::Unavailable("down".into())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                ChecklistError::Store(StoreError::NotFound(
                    Collection::ChecklistItems,
                    "i1".into(),
                )),
                StatusCode::NOT_FOUND,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn test_unauthorized_sets_challenge_header() {
        let response = ApiError::from(AuthError::InvalidToken).into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
    }

    #[test]
    fn test_store_details_not_leaked() {
        let err = ApiError::from(StoreError::Unavailable("password=hunter2".into()));

        assert!(!err.detail.contains("hunter2"));
    }
}
