use crate::errors::ValidationError;
use crate::models::{Gender, OfferingCategory, RequesterDetails};

/// Which mobile-number rule a form applies.
///
/// Booking forms accept any ten digits; the account helpers also insist on an
/// Indian mobile prefix (6-9). Both are kept and chosen per deployment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MobileProfile {
    #[default]
    TenDigit,
    Indian,
}

impl MobileProfile {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ten_digit" | "tendigit" | "plain" => Some(MobileProfile::TenDigit),
            "indian" | "in" => Some(MobileProfile::Indian),
            _ => None,
        }
    }
}

pub const MIN_AGE: i64 = 1;
pub const MAX_AGE: i64 = 120;

/// Checks a devotee or donor submission, stopping at the first bad field.
///
/// Fields are checked in form order: name, age, gender, mobile, email, PAN,
/// sankalp. `is_anonymous` only has an effect on donations, where it skips
/// every personal-field check.
pub fn validate_requester_details(
    details: &RequesterDetails,
    category: OfferingCategory,
    is_anonymous: bool,
    profile: MobileProfile,
) -> Result<(), ValidationError> {
    let anonymous = is_anonymous && category == OfferingCategory::Donation;
    let collects_person = category != OfferingCategory::Donation;

    if !anonymous {
        let name = present(&details.name)
            .ok_or_else(|| ValidationError::new("name", "name is required"))?;
        if !is_valid_name(name) {
            return Err(ValidationError::new("name", "letters and spaces only"));
        }
    }

    if collects_person {
        let age = present(&details.age)
            .ok_or_else(|| ValidationError::new("age", "age is required"))?;
        let age: i64 = age
            .parse()
            .map_err(|_| ValidationError::new("age", "age must be a whole number"))?;
        if !(MIN_AGE..=MAX_AGE).contains(&age) {
            return Err(ValidationError::new("age", "age must be between 1 and 120"));
        }

        let gender = present(&details.gender)
            .ok_or_else(|| ValidationError::new("gender", "gender is required"))?;
        if Gender::parse(gender).is_none() {
            return Err(ValidationError::new(
                "gender",
                "gender must be one of MALE, FEMALE, OTHER",
            ));
        }
    }

    if !anonymous {
        let mobile = present(&details.mobile)
            .ok_or_else(|| ValidationError::new("mobile", "mobile number is required"))?;
        if !is_valid_mobile(mobile, profile) {
            let reason = match profile {
                MobileProfile::TenDigit => "mobile number must be exactly 10 digits",
                MobileProfile::Indian => "mobile number must be 10 digits starting with 6-9",
            };
            return Err(ValidationError::new("mobile", reason));
        }

        if let Some(email) = present(&details.email) {
            if !is_valid_email(email) {
                return Err(ValidationError::new("email", "email address is not valid"));
            }
        }

        if category == OfferingCategory::Donation {
            if let Some(pan) = present(&details.pan) {
                if !is_valid_pan(pan) {
                    return Err(ValidationError::new(
                        "pan",
                        "PAN must be 5 letters, 4 digits and 1 letter",
                    ));
                }
            }
        }
    }

    if category == OfferingCategory::Pooja && present(&details.sankalp).is_none() {
        return Err(ValidationError::new("sankalp", "sankalp is required for pooja"));
    }

    Ok(())
}

/// The form of the details that is stored with a confirmed booking.
///
/// Assumes the details already passed validation. Anonymous donations keep
/// nothing but the "Anonymous" label.
pub fn normalize_requester_details(
    details: &RequesterDetails,
    category: OfferingCategory,
) -> RequesterDetails {
    if category == OfferingCategory::Donation && details.anonymous {
        return RequesterDetails {
            name: Some("Anonymous".to_string()),
            anonymous: true,
            ..RequesterDetails::default()
        };
    }

    let collects_person = category != OfferingCategory::Donation;
    let keep = |v: &Option<String>| present(v).map(str::to_string);

    RequesterDetails {
        name: present(&details.name).map(collapse_whitespace),
        age: if collects_person { keep(&details.age) } else { None },
        gender: if collects_person {
            present(&details.gender)
                .and_then(Gender::parse)
                .map(|g| g.as_str().to_string())
        } else {
            None
        },
        mobile: present(&details.mobile).map(digits_only),
        email: keep(&details.email),
        pan: if category == OfferingCategory::Donation {
            present(&details.pan).map(|p| p.to_ascii_uppercase())
        } else {
            None
        },
        address: if category == OfferingCategory::Donation {
            keep(&details.address)
        } else {
            None
        },
        sankalp: if category == OfferingCategory::Pooja {
            keep(&details.sankalp)
        } else {
            None
        },
        gotra: if category == OfferingCategory::Pooja {
            keep(&details.gotra)
        } else {
            None
        },
        anonymous: false,
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub fn is_valid_name(name: &str) -> bool {
    let trimmed = name.trim();
    !trimmed.is_empty()
        && trimmed
            .chars()
            .all(|c| c.is_ascii_alphabetic() || c.is_whitespace())
}

pub fn digits_only(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

pub fn is_valid_mobile(mobile: &str, profile: MobileProfile) -> bool {
    let digits = digits_only(mobile);
    if digits.len() != 10 {
        return false;
    }
    match profile {
        MobileProfile::TenDigit => true,
        MobileProfile::Indian => matches!(digits.as_bytes()[0], b'6'..=b'9'),
    }
}

/// `local@domain.tld` with no whitespace and a dot somewhere after the `@`.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

/// Five letters, four digits, one letter. Case is ignored; storage uppercases.
pub fn is_valid_pan(pan: &str) -> bool {
    let bytes = pan.trim().as_bytes();
    bytes.len() == 10
        && bytes[..5].iter().all(u8::is_ascii_alphabetic)
        && bytes[5..9].iter().all(u8::is_ascii_digit)
        && bytes[9].is_ascii_alphabetic()
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
