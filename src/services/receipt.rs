use std::fmt;

use uuid::Uuid;

use crate::models::{ConfirmedBooking, OfferingCategory};

pub const RECEIPT_PREFIX: &str = "SAI";
const RECEIPT_DIGITS: usize = 10;

/// Time-ordered booking id (UUID v7).
pub fn new_booking_id() -> String {
    Uuid::now_v7().to_string()
}

/// `SAI` followed by the last ten hex digits of the booking id, uppercased.
///
/// The tail of a v7 id is random, so two bookings in the same millisecond
/// still get different receipts.
pub fn receipt_number_for(booking_id: &str) -> String {
    let hex: String = booking_id
        .chars()
        .filter(char::is_ascii_hexdigit)
        .collect();
    let tail = &hex[hex.len().saturating_sub(RECEIPT_DIGITS)..];
    format!("{RECEIPT_PREFIX}{}", tail.to_ascii_uppercase())
}

/// Plain-text receipt as handed to the devotee after confirmation.
pub fn render_receipt(booking: &ConfirmedBooking, temple_name: &str) -> String {
    let mut out = String::new();
    // Writing into a String never fails.
    let _ = write_receipt(&mut out, booking, temple_name);
    out
}

fn write_receipt(out: &mut impl fmt::Write, booking: &ConfirmedBooking, temple_name: &str) -> fmt::Result {
    let (title, label) = match booking.category {
        OfferingCategory::Donation => ("Donation Receipt", "Donor"),
        _ => ("Booking Receipt", "Devotee"),
    };

    writeln!(out, "{temple_name}")?;
    writeln!(out, "{title}")?;
    writeln!(out, "Receipt No: {}", booking.receipt_number)?;
    writeln!(out, "Offering: {}", booking.offering_name)?;
    writeln!(out, "Date: {}", booking.date.format("%d %B %Y"))?;
    if let Some(slot) = &booking.time_slot {
        writeln!(out, "Time: {slot}")?;
    }
    if booking.category.is_per_person() {
        writeln!(out, "Devotees: {}", booking.quantity)?;
    }

    let name = booking.requester.name.as_deref().unwrap_or("Anonymous");
    writeln!(out, "{label}: {name}")?;
    if let Some(sankalp) = &booking.requester.sankalp {
        writeln!(out, "Sankalp: {sankalp}")?;
    }
    if let Some(gotra) = &booking.requester.gotra {
        writeln!(out, "Gotra: {gotra}")?;
    }
    if let Some(pan) = &booking.requester.pan {
        writeln!(out, "PAN: {pan}")?;
    }

    writeln!(out, "Amount: Rs. {}", booking.total_amount)?;
    writeln!(out, "Status: {}", booking.status.as_str().to_uppercase())?;
    writeln!(
        out,
        "Booked at: {} UTC",
        booking.created_at.format("%Y-%m-%d %H:%M:%S")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    use crate::models::{BookingStatus, DonationAmount, RequesterDetails};

    #[test]
    fn test_receipt_from_id() {
        let receipt = receipt_number_for("01890a5d-ac96-774b-bcce-b302099a8057");
        assert_eq!(receipt, "SAI02099A8057");
    }

    #[test]
    fn test_receipt_deterministic() {
        let id = new_booking_id();
        assert_eq!(receipt_number_for(&id), receipt_number_for(&id));
        assert_eq!(receipt_number_for(&id).len(), RECEIPT_PREFIX.len() + RECEIPT_DIGITS);
    }

    #[test]
    fn test_receipts_differ_across_rapid_ids() {
        let receipts: std::collections::HashSet<String> = (0..1000)
            .map(|_| receipt_number_for(&new_booking_id()))
            .collect();
        assert_eq!(receipts.len(), 1000);
    }

    #[test]
    fn test_ids_are_time_ordered() {
        let first = new_booking_id();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = new_booking_id();
        assert!(first < second);
    }

    #[test]
    fn test_render_donation_receipt() {
        let booking = ConfirmedBooking {
            id: "01890a5d-ac96-774b-bcce-b302099a8057".to_string(),
            receipt_number: "SAI02099A8057".to_string(),
            user_id: "user-1".to_string(),
            category: OfferingCategory::Donation,
            offering_id: "annadan".to_string(),
            offering_name: "Annadan (Food Donation)".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 6, 16).unwrap(),
            time_slot: None,
            quantity: 1,
            requester: RequesterDetails {
                name: Some("Anonymous".to_string()),
                anonymous: true,
                ..RequesterDetails::default()
            },
            donation_amount: Some(DonationAmount::Preset { amount: 501 }),
            total_amount: 501,
            status: BookingStatus::Confirmed,
            created_at: Utc.with_ymd_and_hms(2025, 6, 15, 9, 30, 0).unwrap(),
        };

        let text = render_receipt(&booking, "Shri Sai Mandir");
        assert!(text.contains("Donation Receipt"));
        assert!(text.contains("Receipt No: SAI02099A8057"));
        assert!(text.contains("Date: 16 June 2025"));
        assert!(text.contains("Donor: Anonymous"));
        assert!(text.contains("Amount: Rs. 501"));
        assert!(text.contains("Status: CONFIRMED"));
        assert!(!text.contains("Devotees:"));
        assert!(!text.contains("Time:"));
    }
}
