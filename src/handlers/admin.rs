use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;

use crate::db::{self, queries};
use crate::errors::AppError;
use crate::handlers::{bearer_token, parse_category};
use crate::models::{
    CatalogEntry, ConfirmedBooking, OfferingCategory, TempleStats, UserDetails, UserSummary,
};
use crate::services::catalog::{self, CatalogProvider};
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 500;

fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    if expected_token.is_empty() {
        tracing::warn!("admin request refused: ADMIN_TOKEN is empty");
        return Err(AppError::Unauthorized);
    }
    let token = bearer_token(headers).unwrap_or_default();
    if token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

fn parse_path_category(raw: &str) -> Result<OfferingCategory, AppError> {
    OfferingCategory::parse(raw).ok_or_else(|| AppError::NotFound(format!("category {raw}")))
}

// GET /api/admin/stats
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<TempleStats>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let stats = {
        let conn = db::lock(&state.db)?;
        queries::get_temple_stats(&conn)?
    };
    Ok(Json(stats))
}

// GET /api/admin/bookings
#[derive(Deserialize)]
pub struct BookingsQuery {
    pub category: Option<String>,
    pub limit: Option<i64>,
    /// Only bookings dated today or later, soonest first.
    #[serde(default)]
    pub upcoming: bool,
}

pub async fn get_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<Vec<ConfirmedBooking>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let category = parse_category(query.category.as_deref())?;
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let bookings = {
        let conn = db::lock(&state.db)?;
        if query.upcoming {
            queries::get_upcoming_bookings(&conn, category, state.intake.today(), limit)?
        } else {
            queries::get_all_bookings(&conn, category, limit)?
        }
    };
    Ok(Json(bookings))
}

// GET /api/admin/users
pub async fn get_users(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<UserSummary>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let users = {
        let conn = db::lock(&state.db)?;
        queries::list_users(&conn)?
    };
    Ok(Json(users.iter().map(UserSummary::from).collect()))
}

// GET /api/admin/users/:id
pub async fn get_user_details(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> Result<Json<UserDetails>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let record = {
        let conn = db::lock(&state.db)?;
        queries::get_user_by_id(&conn, &user_id)?
    }
    .ok_or_else(|| AppError::NotFound(format!("user {user_id}")))?;

    let bookings = state.store.list_by_user(&user_id, None).await?;
    Ok(Json(UserDetails::build(&record, bookings, state.intake.today())))
}

// GET /api/admin/catalog
#[derive(Deserialize)]
pub struct CatalogQuery {
    pub category: Option<String>,
}

pub async fn list_catalog(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<Vec<CatalogEntry>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let category = parse_category(query.category.as_deref())?;
    Ok(Json(state.catalog.list(category, true).await?))
}

// POST /api/admin/catalog
pub async fn create_entry(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<CatalogEntry>, JsonRejection>,
) -> Result<(StatusCode, Json<CatalogEntry>), AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let Json(entry) = payload?;

    catalog::validate_entry(&entry).map_err(AppError::BadRequest)?;
    if !state.catalog.create(&entry)? {
        return Err(AppError::Conflict(format!(
            "{} {} already exists",
            entry.category.as_str(),
            entry.id
        )));
    }

    tracing::info!(category = entry.category.as_str(), offering_id = %entry.id, "offering created");
    Ok((StatusCode::CREATED, Json(entry)))
}

// PUT /api/admin/catalog/:category/:id
pub async fn update_entry(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((category, id)): Path<(String, String)>,
    payload: Result<Json<CatalogEntry>, JsonRejection>,
) -> Result<Json<CatalogEntry>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let Json(mut entry) = payload?;

    // The path names the entry; the body cannot move it.
    entry.category = parse_path_category(&category)?;
    entry.id = id;
    catalog::validate_entry(&entry).map_err(AppError::BadRequest)?;

    if !state.catalog.update(&entry)? {
        return Err(AppError::NotFound(format!("offering {}", entry.id)));
    }
    Ok(Json(entry))
}

// POST /api/admin/catalog/:category/:id/deactivate
pub async fn deactivate_entry(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((category, id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let category = parse_path_category(&category)?;
    if !state.catalog.deactivate(category, &id)? {
        return Err(AppError::NotFound(format!("offering {id}")));
    }
    Ok(Json(serde_json::json!({ "ok": true })))
}
