use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::booking::{ConfirmedBooking, Gender};
use super::offering::OfferingCategory;

/// The authenticated devotee a booking is recorded against.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Identity {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub email: String,
}

/// A registered account as stored. Credentials never leave the db layer.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub identity: Identity,
    pub gender: Option<Gender>,
    pub date_of_birth: Option<NaiveDate>,
    pub password_salt: String,
    pub password_digest: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub email: String,
    pub gender: Option<Gender>,
    pub date_of_birth: Option<NaiveDate>,
    pub registered_at: DateTime<Utc>,
}

impl From<&UserRecord> for UserSummary {
    fn from(record: &UserRecord) -> Self {
        Self {
            id: record.identity.id.clone(),
            first_name: record.identity.first_name.clone(),
            last_name: record.identity.last_name.clone(),
            phone_number: record.identity.phone_number.clone(),
            email: record.identity.email.clone(),
            gender: record.gender,
            date_of_birth: record.date_of_birth,
            registered_at: record.created_at,
        }
    }
}

/// One devotee as seen from the admin panel.
#[derive(Debug, Clone, Serialize)]
pub struct UserDetails {
    pub user: UserSummary,
    pub total_bookings: usize,
    pub donation_total: i64,
    /// On or after `today`, soonest first.
    pub upcoming: Vec<ConfirmedBooking>,
    /// Before `today`, most recent first.
    pub past: Vec<ConfirmedBooking>,
}

impl UserDetails {
    pub fn build(record: &UserRecord, bookings: Vec<ConfirmedBooking>, today: NaiveDate) -> Self {
        let total_bookings = bookings.len();
        let donation_total = bookings
            .iter()
            .filter(|b| b.category == OfferingCategory::Donation)
            .fold(0i64, |sum, b| sum.saturating_add(b.total_amount));

        let (mut upcoming, mut past): (Vec<_>, Vec<_>) =
            bookings.into_iter().partition(|b| b.date >= today);
        upcoming.sort_by(|a, b| (a.date, &a.time_slot).cmp(&(b.date, &b.time_slot)));
        past.sort_by(|a, b| b.date.cmp(&a.date));

        Self {
            user: UserSummary::from(record),
            total_bookings,
            donation_total,
            upcoming,
            past,
        }
    }
}
