use serde::Serialize;

/// Aggregates shown on the admin dashboard.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct TempleStats {
    pub darshan_bookings: i64,
    pub aarti_bookings: i64,
    pub pooja_bookings: i64,
    pub donation_total: i64,
    pub registered_users: i64,
}
