use async_trait::async_trait;

use crate::db::{self, queries, Db};
use crate::models::{ConfirmedBooking, OfferingCategory};

/// Durable home of confirmed bookings.
///
/// `save` must only return `Ok` once the record is recorded; intake reports
/// success to the devotee on that basis alone. Retry policy, if any, lives
/// in the implementation.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn save(&self, booking: &ConfirmedBooking) -> anyhow::Result<()>;

    /// Newest first.
    async fn list_by_user(
        &self,
        user_id: &str,
        category: Option<OfferingCategory>,
    ) -> anyhow::Result<Vec<ConfirmedBooking>>;

    async fn find_by_receipt(&self, receipt_number: &str) -> anyhow::Result<Option<ConfirmedBooking>>;
}

pub struct SqliteBookingStore {
    db: Db,
}

impl SqliteBookingStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BookingStore for SqliteBookingStore {
    async fn save(&self, booking: &ConfirmedBooking) -> anyhow::Result<()> {
        let conn = db::lock(&self.db)?;
        queries::insert_booking(&conn, booking)
    }

    async fn list_by_user(
        &self,
        user_id: &str,
        category: Option<OfferingCategory>,
    ) -> anyhow::Result<Vec<ConfirmedBooking>> {
        let conn = db::lock(&self.db)?;
        queries::get_bookings_for_user(&conn, user_id, category)
    }

    async fn find_by_receipt(&self, receipt_number: &str) -> anyhow::Result<Option<ConfirmedBooking>> {
        let conn = db::lock(&self.db)?;
        queries::get_booking_by_receipt(&conn, receipt_number)
    }
}
