use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::Db;
use crate::services::catalog::SqliteCatalog;
use crate::services::intake::IntakeService;
use crate::services::store::{BookingStore, SqliteBookingStore};

pub struct AppState {
    pub db: Db,
    pub config: AppConfig,
    pub catalog: Arc<SqliteCatalog>,
    pub store: Arc<dyn BookingStore>,
    pub intake: IntakeService,
}

impl AppState {
    /// SQLite-backed catalog and booking store over one connection.
    pub fn new(db: Db, config: AppConfig) -> Self {
        let store: Arc<dyn BookingStore> = Arc::new(SqliteBookingStore::new(db.clone()));
        Self::with_store(db, config, store)
    }

    /// Swaps in a different booking store, e.g. one that fails on save.
    pub fn with_store(db: Db, config: AppConfig, store: Arc<dyn BookingStore>) -> Self {
        let catalog = Arc::new(SqliteCatalog::new(db.clone()));
        let intake = IntakeService::new(catalog.clone(), store.clone())
            .with_mobile_profile(config.mobile_profile)
            .with_utc_offset(config.temple_offset());
        Self {
            db,
            config,
            catalog,
            store,
            intake,
        }
    }
}
