use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum OfferingCategory {
    Darshan,
    Aarti,
    Pooja,
    Donation,
}

impl OfferingCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            OfferingCategory::Darshan => "darshan",
            OfferingCategory::Aarti => "aarti",
            OfferingCategory::Pooja => "pooja",
            OfferingCategory::Donation => "donation",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "darshan" => Some(OfferingCategory::Darshan),
            "aarti" => Some(OfferingCategory::Aarti),
            "pooja" => Some(OfferingCategory::Pooja),
            "donation" => Some(OfferingCategory::Donation),
            _ => None,
        }
    }

    /// Largest number of people a single booking may cover.
    pub fn quantity_cap(&self) -> u32 {
        match self {
            OfferingCategory::Darshan | OfferingCategory::Aarti => 10,
            OfferingCategory::Pooja | OfferingCategory::Donation => 1,
        }
    }

    pub fn requires_time_slot(&self) -> bool {
        matches!(self, OfferingCategory::Aarti | OfferingCategory::Pooja)
    }

    pub fn allows_time_slot(&self) -> bool {
        !matches!(self, OfferingCategory::Donation)
    }

    /// Darshan and aarti are charged per person; pooja and donation are flat.
    pub fn is_per_person(&self) -> bool {
        matches!(self, OfferingCategory::Darshan | OfferingCategory::Aarti)
    }
}

/// A bookable offering as published by the catalog.
///
/// Prices are kept in paise so catalog entries can carry two decimal places;
/// totals handed to devotees are whole rupees.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogEntry {
    pub id: String,
    pub category: OfferingCategory,
    pub display_name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub unit_price_paise: i64,
    /// Stored for reporting only; intake does not enforce it.
    #[serde(default)]
    pub capacity: Option<u32>,
    #[serde(default)]
    pub time_slots: Vec<String>,
    #[serde(default)]
    pub suggested_amounts: Vec<i64>,
    #[serde(default)]
    pub duration_minutes: Option<i32>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl CatalogEntry {
    pub fn accepts_slot(&self, slot: &str) -> bool {
        self.time_slots.is_empty() || self.time_slots.iter().any(|s| s == slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parse_is_case_insensitive() {
        assert_eq!(OfferingCategory::parse("AARTI"), Some(OfferingCategory::Aarti));
        assert_eq!(OfferingCategory::parse(" Pooja "), Some(OfferingCategory::Pooja));
        assert_eq!(OfferingCategory::parse("seva"), None);
    }

    #[test]
    fn test_quantity_caps() {
        assert_eq!(OfferingCategory::Darshan.quantity_cap(), 10);
        assert_eq!(OfferingCategory::Aarti.quantity_cap(), 10);
        assert_eq!(OfferingCategory::Pooja.quantity_cap(), 1);
        assert_eq!(OfferingCategory::Donation.quantity_cap(), 1);
    }

    #[test]
    fn test_entry_without_slots_accepts_any_slot() {
        let entry = CatalogEntry {
            id: "general".to_string(),
            category: OfferingCategory::Darshan,
            display_name: "General Darshan".to_string(),
            description: None,
            unit_price_paise: 0,
            capacity: None,
            time_slots: vec![],
            suggested_amounts: vec![],
            duration_minutes: None,
            is_active: true,
        };
        assert!(entry.accepts_slot("05:15"));

        let restricted = CatalogEntry {
            time_slots: vec!["06:00".to_string()],
            ..entry
        };
        assert!(restricted.accepts_slot("06:00"));
        assert!(!restricted.accepts_slot("07:00"));
    }
}
