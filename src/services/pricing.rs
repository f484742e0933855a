use crate::errors::PricingError;
use crate::models::{CatalogEntry, DonationAmount, OfferingCategory};

/// Largest single donation accepted, in rupees (one crore).
pub const MAX_DONATION: i64 = 10_000_000;

/// Largest unit price a catalog entry may carry, in paise (ten lakh rupees).
pub const MAX_UNIT_PRICE_PAISE: i64 = 100_000_000;

/// Rupees from paise, rounding half up. `None` on overflow.
pub fn paise_to_rupees(paise: i64) -> Option<i64> {
    paise.checked_add(50).map(|p| p.div_euclid(100))
}

/// Total amount, in whole rupees, for a booking against `entry`.
///
/// Per-person categories multiply the unit price by `quantity`; pooja is a
/// flat unit price. Donations ignore the unit price and take the chosen
/// preset or custom amount.
pub fn compute_amount(
    entry: &CatalogEntry,
    quantity: u32,
    donation: Option<&DonationAmount>,
) -> Result<i64, PricingError> {
    if !entry.is_active {
        return Err(PricingError::InactiveOffering(entry.id.clone()));
    }

    let amount = match entry.category {
        OfferingCategory::Darshan | OfferingCategory::Aarti => entry
            .unit_price_paise
            .max(0)
            .checked_mul(i64::from(quantity))
            .and_then(paise_to_rupees)
            .ok_or_else(|| out_of_range(entry))?,
        OfferingCategory::Pooja => {
            paise_to_rupees(entry.unit_price_paise.max(0)).ok_or_else(|| out_of_range(entry))?
        }
        OfferingCategory::Donation => donation_amount(entry, donation)?,
    };

    Ok(amount.max(0))
}

fn out_of_range(entry: &CatalogEntry) -> PricingError {
    PricingError::InvalidAmount(format!("price of {} is out of range", entry.id))
}

fn donation_amount(entry: &CatalogEntry, donation: Option<&DonationAmount>) -> Result<i64, PricingError> {
    let amount = match donation {
        None => {
            return Err(PricingError::InvalidAmount(
                "select a donation amount".to_string(),
            ))
        }
        Some(DonationAmount::Preset { amount }) => {
            if *amount < 1 {
                return Err(PricingError::InvalidAmount(format!(
                    "preset amount {amount} is not positive"
                )));
            }
            if !entry.suggested_amounts.is_empty() && !entry.suggested_amounts.contains(amount) {
                return Err(PricingError::InvalidAmount(format!(
                    "{amount} is not a suggested amount for {}",
                    entry.id
                )));
            }
            *amount
        }
        Some(DonationAmount::Custom { amount: Some(amount) }) if *amount >= 1 => *amount,
        Some(DonationAmount::Custom { .. }) => {
            return Err(PricingError::InvalidAmount(
                "custom amount must be at least 1".to_string(),
            ))
        }
    };

    if amount > MAX_DONATION {
        return Err(PricingError::InvalidAmount(format!(
            "donations above {MAX_DONATION} must be made at the temple office"
        )));
    }
    Ok(amount)
}
