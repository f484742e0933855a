use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::handlers::parse_category;
use crate::models::{CatalogEntry, OfferingCategory};
use crate::services::catalog::CatalogProvider;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CatalogQuery {
    pub category: Option<String>,
}

// GET /api/catalog
pub async fn list_catalog(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<Vec<CatalogEntry>>, AppError> {
    let category = parse_category(query.category.as_deref())?;
    let entries = state.catalog.list(category, false).await?;
    Ok(Json(entries))
}

// GET /api/catalog/:category/:id
pub async fn get_entry(
    State(state): State<Arc<AppState>>,
    Path((category, id)): Path<(String, String)>,
) -> Result<Json<CatalogEntry>, AppError> {
    let category = OfferingCategory::parse(&category)
        .ok_or_else(|| AppError::NotFound(format!("category {category}")))?;

    match state.catalog.lookup(category, &id).await? {
        Some(entry) if entry.is_active => Ok(Json(entry)),
        _ => Err(AppError::NotFound(format!("offering {id}"))),
    }
}
