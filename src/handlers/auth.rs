use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Serialize;

use crate::errors::AppError;
use crate::handlers::bearer_token;
use crate::models::{Identity, UserSummary};
use crate::services::accounts::{self, Credentials, ProfileUpdate, Registration, Session};
use crate::services::identity::{IdentityProvider, SessionIdentity};
use crate::state::AppState;

#[derive(Serialize)]
pub struct SessionResponse {
    token: String,
    user: Identity,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            token: session.token,
            user: session.identity,
        }
    }
}

// POST /api/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Registration>, JsonRejection>,
) -> Result<(StatusCode, Json<SessionResponse>), AppError> {
    let Json(body) = payload?;
    let session = accounts::register(
        &state.db,
        &state.config.session_secret,
        state.config.session_ttl_hours,
        &body,
    )?;
    Ok((StatusCode::CREATED, Json(session.into())))
}

// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<SessionResponse>, AppError> {
    let Json(body) = payload?;
    let session = accounts::login(
        &state.db,
        &state.config.session_secret,
        state.config.session_ttl_hours,
        &body,
    )?;
    Ok(Json(session.into()))
}

// POST /api/auth/logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    let token = bearer_token(&headers).ok_or(AppError::Unauthorized)?;
    if !accounts::logout(&state.db, &token)? {
        return Err(AppError::Unauthorized);
    }
    Ok(StatusCode::NO_CONTENT)
}

// PUT /api/auth/profile
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<ProfileUpdate>, JsonRejection>,
) -> Result<Json<UserSummary>, AppError> {
    let user = SessionIdentity::new(state.db.clone(), bearer_token(&headers))
        .current_user()
        .await
        .ok_or(AppError::Unauthorized)?;
    let Json(body) = payload?;

    let summary = accounts::update_profile(&state.db, &user.id, &body)?;
    Ok(Json(summary))
}
