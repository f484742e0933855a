pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod services;
pub mod state;

use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::Router;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/auth/profile", put(handlers::auth::update_profile))
        .route("/api/catalog", get(handlers::catalog::list_catalog))
        .route(
            "/api/catalog/:category/:id",
            get(handlers::catalog::get_entry),
        )
        .route(
            "/api/bookings",
            post(handlers::bookings::submit_booking).get(handlers::bookings::list_my_bookings),
        )
        .route(
            "/api/bookings/receipt/:receipt_number",
            get(handlers::bookings::get_receipt),
        )
        .route(
            "/api/bookings/receipt/:receipt_number/download",
            get(handlers::bookings::download_receipt),
        )
        .route("/api/admin/stats", get(handlers::admin::get_stats))
        .route("/api/admin/bookings", get(handlers::admin::get_bookings))
        .route("/api/admin/users", get(handlers::admin::get_users))
        .route("/api/admin/users/:id", get(handlers::admin::get_user_details))
        .route(
            "/api/admin/catalog",
            get(handlers::admin::list_catalog).post(handlers::admin::create_entry),
        )
        .route(
            "/api/admin/catalog/:category/:id",
            put(handlers::admin::update_entry),
        )
        .route(
            "/api/admin/catalog/:category/:id/deactivate",
            post(handlers::admin::deactivate_entry),
        )
        .with_state(state)
}
