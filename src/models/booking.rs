use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::offering::OfferingCategory;

/// What a devotee submits from a booking form. Consumed once by intake.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRequest {
    pub category: OfferingCategory,
    pub offering_id: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub time_slot: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub requester: RequesterDetails,
    /// Only meaningful for donations.
    #[serde(default)]
    pub donation_amount: Option<DonationAmount>,
}

fn default_quantity() -> u32 {
    1
}

/// Devotee or donor details as typed into the form.
///
/// Fields stay as raw text until validation so that malformed input is
/// reported field by field instead of failing deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RequesterDetails {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub age: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub mobile: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub pan: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub sankalp: Option<String>,
    #[serde(default)]
    pub gotra: Option<String>,
    #[serde(default)]
    pub anonymous: bool,
}

/// Accepts either a JSON string or a bare number and keeps it as text.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "MALE",
            Gender::Female => "FEMALE",
            Gender::Other => "OTHER",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MALE" => Some(Gender::Male),
            "FEMALE" => Some(Gender::Female),
            "OTHER" => Some(Gender::Other),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DonationAmount {
    /// One of the suggested amounts offered by the donation category.
    Preset { amount: i64 },
    Custom {
        #[serde(default)]
        amount: Option<i64>,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "confirmed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "confirmed" => Some(BookingStatus::Confirmed),
            _ => None,
        }
    }
}

/// A booking that has been validated, priced and durably recorded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfirmedBooking {
    pub id: String,
    pub receipt_number: String,
    pub user_id: String,
    pub category: OfferingCategory,
    pub offering_id: String,
    pub offering_name: String,
    pub date: NaiveDate,
    pub time_slot: Option<String>,
    pub quantity: u32,
    pub requester: RequesterDetails,
    pub donation_amount: Option<DonationAmount>,
    /// Whole rupees.
    pub total_amount: i64,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}
