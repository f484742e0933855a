use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::handlers::{bearer_token, parse_category};
use crate::models::{BookingRequest, ConfirmedBooking, Identity};
use crate::services::identity::{IdentityProvider, SessionIdentity};
use crate::services::receipt;
use crate::state::AppState;

fn session_identity(state: &AppState, headers: &HeaderMap) -> SessionIdentity {
    SessionIdentity::new(state.db.clone(), bearer_token(headers))
}

async fn require_user(state: &AppState, headers: &HeaderMap) -> Result<Identity, AppError> {
    session_identity(state, headers)
        .current_user()
        .await
        .ok_or(AppError::Unauthorized)
}

/// Only the owner may see a booking; anyone else gets a 404.
async fn own_booking(
    state: &AppState,
    user: &Identity,
    receipt_number: &str,
) -> Result<ConfirmedBooking, AppError> {
    let receipt_number = receipt_number.trim().to_ascii_uppercase();
    match state.store.find_by_receipt(&receipt_number).await? {
        Some(booking) if booking.user_id == user.id => Ok(booking),
        _ => Err(AppError::NotFound(format!("receipt {receipt_number}"))),
    }
}

// POST /api/bookings
pub async fn submit_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<BookingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ConfirmedBooking>), AppError> {
    let Json(request) = payload?;
    let identity = session_identity(&state, &headers);
    let booking = state.intake.submit(&identity, request).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub category: Option<String>,
}

// GET /api/bookings
pub async fn list_my_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<ConfirmedBooking>>, AppError> {
    let user = require_user(&state, &headers).await?;
    let category = parse_category(query.category.as_deref())?;
    let bookings = state.store.list_by_user(&user.id, category).await?;
    Ok(Json(bookings))
}

// GET /api/bookings/receipt/:receipt_number
pub async fn get_receipt(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(receipt_number): Path<String>,
) -> Result<Json<ConfirmedBooking>, AppError> {
    let user = require_user(&state, &headers).await?;
    let booking = own_booking(&state, &user, &receipt_number).await?;
    Ok(Json(booking))
}

// GET /api/bookings/receipt/:receipt_number/download
pub async fn download_receipt(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(receipt_number): Path<String>,
) -> Result<Response, AppError> {
    let user = require_user(&state, &headers).await?;
    let booking = own_booking(&state, &user, &receipt_number).await?;

    let text = receipt::render_receipt(&booking, &state.config.temple_name);
    let filename = format!("receipt-{}.txt", booking.receipt_number);

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        text,
    )
        .into_response())
}
