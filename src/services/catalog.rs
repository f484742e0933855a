use async_trait::async_trait;

use crate::db::{self, queries, Db};
use crate::models::{CatalogEntry, OfferingCategory};
use crate::services::pricing::{MAX_DONATION, MAX_UNIT_PRICE_PAISE};

/// Source of bookable offerings. Intake only ever reads through `lookup`.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    async fn lookup(
        &self,
        category: OfferingCategory,
        offering_id: &str,
    ) -> anyhow::Result<Option<CatalogEntry>>;

    async fn list(
        &self,
        category: Option<OfferingCategory>,
        include_inactive: bool,
    ) -> anyhow::Result<Vec<CatalogEntry>>;
}

pub struct SqliteCatalog {
    db: Db,
}

impl SqliteCatalog {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Admin create. Returns `false` if the id is taken within the category.
    pub fn create(&self, entry: &CatalogEntry) -> anyhow::Result<bool> {
        let conn = db::lock(&self.db)?;
        queries::insert_catalog_entry(&conn, entry)
    }

    pub fn update(&self, entry: &CatalogEntry) -> anyhow::Result<bool> {
        let conn = db::lock(&self.db)?;
        queries::update_catalog_entry(&conn, entry)
    }

    pub fn deactivate(&self, category: OfferingCategory, id: &str) -> anyhow::Result<bool> {
        let conn = db::lock(&self.db)?;
        let changed = queries::set_catalog_active(&conn, category, id, false)?;
        if changed {
            tracing::info!(category = category.as_str(), offering_id = id, "offering deactivated");
        }
        Ok(changed)
    }
}

#[async_trait]
impl CatalogProvider for SqliteCatalog {
    async fn lookup(
        &self,
        category: OfferingCategory,
        offering_id: &str,
    ) -> anyhow::Result<Option<CatalogEntry>> {
        let conn = db::lock(&self.db)?;
        queries::get_catalog_entry(&conn, category, offering_id)
    }

    async fn list(
        &self,
        category: Option<OfferingCategory>,
        include_inactive: bool,
    ) -> anyhow::Result<Vec<CatalogEntry>> {
        let conn = db::lock(&self.db)?;
        queries::list_catalog(&conn, category, include_inactive)
    }
}

/// Checks an admin-supplied entry before it reaches the catalog.
pub fn validate_entry(entry: &CatalogEntry) -> Result<(), String> {
    let id_ok = !entry.id.is_empty()
        && entry
            .id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if !id_ok {
        return Err("id must be lowercase letters, digits or underscores".to_string());
    }
    if entry.display_name.trim().is_empty() {
        return Err("display_name is required".to_string());
    }
    if !(0..=MAX_UNIT_PRICE_PAISE).contains(&entry.unit_price_paise) {
        return Err(format!(
            "unit_price_paise must be between 0 and {MAX_UNIT_PRICE_PAISE}"
        ));
    }
    if entry
        .suggested_amounts
        .iter()
        .any(|a| !(1..=MAX_DONATION).contains(a))
    {
        return Err(format!("suggested_amounts must be between 1 and {MAX_DONATION}"));
    }
    if entry.category != OfferingCategory::Donation && !entry.suggested_amounts.is_empty() {
        return Err("suggested_amounts only apply to donations".to_string());
    }
    if entry.category == OfferingCategory::Donation && !entry.time_slots.is_empty() {
        return Err("donations do not take time slots".to_string());
    }
    Ok(())
}
