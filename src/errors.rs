use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::services::accounts::AccountError;

/// First field of a submission that failed its constraints.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PricingError {
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("offering is no longer available: {0}")]
    InactiveOffering(String),

    #[error("unknown offering: {0}")]
    UnknownOffering(String),
}

/// Everything that can end a booking submission without a confirmation.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("not authenticated")]
    Unauthenticated,

    #[error("validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),

    #[error("pricing failed: {0}")]
    PricingFailed(#[from] PricingError),

    #[error("catalog unavailable: {0}")]
    CatalogUnavailable(anyhow::Error),

    #[error("{0}")]
    PersistenceFailed(anyhow::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("conflict: {0}")]
    Conflict(String),

    /// A request body that could not be read into its type.
    #[error("invalid body: {field}: {reason}")]
    InvalidBody { field: String, reason: String },

    #[error(transparent)]
    Booking(#[from] BookingError),
}

impl From<AccountError> for AppError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::Invalid(v) => AppError::Booking(BookingError::ValidationFailed(v)),
            AccountError::EmailTaken => AppError::Conflict("email already registered".to_string()),
            AccountError::InvalidCredentials => AppError::Unauthorized,
            AccountError::Internal(e) => AppError::Internal(e),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        let text = rejection.body_text();
        let detail = match &rejection {
            JsonRejection::JsonDataError(_) => text
                .split_once("target type: ")
                .map_or(text.as_str(), |(_, rest)| rest),
            _ => text.as_str(),
        };

        // Data errors read "<path>: <message>"; anything else is about the body.
        let (field, reason) = match detail.split_once(": ") {
            Some((path, message)) if !path.is_empty() && path != "." && !path.contains(' ') => {
                (path, message)
            }
            _ => ("body", detail),
        };
        AppError::InvalidBody {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }
}

const GENERIC_FAILURE: &str = "could not complete booking";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::Database(e) => {
                tracing::error!(error = %e, "database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({ "error": "internal error" }),
                )
            }
            AppError::Internal(e) => {
                tracing::error!(error = %e, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({ "error": "internal error" }),
                )
            }
            AppError::NotFound(_) => (
                StatusCode::NOT_FOUND,
                serde_json::json!({ "error": self.to_string() }),
            ),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                serde_json::json!({ "error": "unauthorized" }),
            ),
            AppError::BadRequest(_) => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "error": self.to_string() }),
            ),
            AppError::Conflict(_) => (
                StatusCode::CONFLICT,
                serde_json::json!({ "error": self.to_string() }),
            ),
            AppError::InvalidBody { field, reason } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                serde_json::json!({
                    "error": "validation_failed",
                    "field": field,
                    "reason": reason,
                }),
            ),
            AppError::Booking(err) => booking_error_body(err),
        };

        (status, axum::Json(body)).into_response()
    }
}

fn booking_error_body(err: &BookingError) -> (StatusCode, serde_json::Value) {
    match err {
        BookingError::Unauthenticated => (
            StatusCode::UNAUTHORIZED,
            serde_json::json!({ "error": "unauthorized" }),
        ),
        BookingError::ValidationFailed(v) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            serde_json::json!({
                "error": "validation_failed",
                "field": v.field,
                "reason": v.reason,
            }),
        ),
        BookingError::PricingFailed(p) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            serde_json::json!({
                "error": "pricing_failed",
                "reason": p.to_string(),
            }),
        ),
        // The cause is logged by intake; devotees only see the generic message.
        BookingError::CatalogUnavailable(_) | BookingError::PersistenceFailed(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            serde_json::json!({ "error": GENERIC_FAILURE }),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::new("name", "letters and spaces only");
        assert_eq!(err.to_string(), "name: letters and spaces only");
    }

    #[test]
    fn test_persistence_failure_hides_cause() {
        let err = AppError::Booking(BookingError::PersistenceFailed(anyhow::anyhow!("disk full")));
        let res = err.into_response();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_validation_failure_status() {
        let err = AppError::from(BookingError::from(ValidationError::new("mobile", "bad")));
        assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_account_errors_map_to_status() {
        let cases = [
            (AccountError::EmailTaken, StatusCode::CONFLICT),
            (AccountError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (
                AccountError::Invalid(ValidationError::new("email", "bad")),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).into_response().status(), status);
        }
    }
}
