pub mod admin;
pub mod auth;
pub mod bookings;
pub mod catalog;
pub mod health;

use axum::http::HeaderMap;

use crate::errors::AppError;
use crate::models::OfferingCategory;

/// Token from an `Authorization: Bearer ...` header, if any.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Optional `?category=` filter; an unknown name is a bad request.
pub(crate) fn parse_category(raw: Option<&str>) -> Result<Option<OfferingCategory>, AppError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => OfferingCategory::parse(s)
            .map(Some)
            .ok_or_else(|| AppError::BadRequest(format!("unknown category: {s}"))),
    }
}
