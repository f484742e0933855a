use base64::Engine;
use chrono::{Duration, NaiveDate, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha1::Sha1;

use crate::db::{self, queries, Db};
use crate::errors::ValidationError;
use crate::models::{Gender, Identity, UserRecord, UserSummary};
use crate::services::validation::{self, MobileProfile};

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("invalid registration: {0}")]
    Invalid(#[from] ValidationError),

    #[error("email already registered")]
    EmailTaken,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Editable profile fields. Email is the login and cannot be changed here.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
}

/// A fresh session for a signed-in devotee.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub identity: Identity,
}

/// Base64 HMAC-SHA1 of `salt:password` keyed by the deployment secret.
pub fn digest_password(secret: &str, salt: &str, password: &str) -> anyhow::Result<String> {
    let mut mac = Hmac::<Sha1>::new_from_slice(secret.as_bytes())
        .map_err(|e| anyhow::anyhow!("invalid session secret: {e}"))?;
    mac.update(salt.as_bytes());
    mac.update(b":");
    mac.update(password.as_bytes());
    Ok(base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
}

fn verify_password(secret: &str, record: &UserRecord, password: &str) -> bool {
    let Ok(expected) = base64::engine::general_purpose::STANDARD.decode(&record.password_digest)
    else {
        return false;
    };
    let Ok(mut mac) = Hmac::<Sha1>::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(record.password_salt.as_bytes());
    mac.update(b":");
    mac.update(password.as_bytes());
    mac.verify_slice(&expected).is_ok()
}

fn validate_registration(reg: &Registration) -> Result<(), ValidationError> {
    for (field, value) in [("first_name", &reg.first_name), ("last_name", &reg.last_name)] {
        if !validation::is_valid_name(value) {
            return Err(ValidationError::new(field, "letters and spaces only"));
        }
    }
    if !validation::is_valid_email(reg.email.trim()) {
        return Err(ValidationError::new("email", "email address is not valid"));
    }
    if !validation::is_valid_mobile(&reg.phone_number, MobileProfile::TenDigit) {
        return Err(ValidationError::new(
            "phone_number",
            "phone number must be exactly 10 digits",
        ));
    }
    if reg.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::new(
            "password",
            "password must be at least 6 characters",
        ));
    }
    Ok(())
}

fn validate_profile(update: &ProfileUpdate, today: NaiveDate) -> Result<Option<Gender>, ValidationError> {
    for (field, value) in [("first_name", &update.first_name), ("last_name", &update.last_name)] {
        if !validation::is_valid_name(value) {
            return Err(ValidationError::new(field, "letters and spaces only"));
        }
    }
    if !validation::is_valid_mobile(&update.phone_number, MobileProfile::TenDigit) {
        return Err(ValidationError::new(
            "phone_number",
            "phone number must be exactly 10 digits",
        ));
    }

    let gender = match update.gender.as_deref().map(str::trim).filter(|g| !g.is_empty()) {
        None => None,
        Some(g) => Some(Gender::parse(g).ok_or_else(|| {
            ValidationError::new("gender", "gender must be one of MALE, FEMALE, OTHER")
        })?),
    };

    if let Some(dob) = update.date_of_birth {
        let earliest = NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN);
        if dob >= today || dob < earliest {
            return Err(ValidationError::new(
                "date_of_birth",
                "date of birth must be in the past",
            ));
        }
    }
    Ok(gender)
}

/// Applies a devotee's own profile edit and returns the stored result.
pub fn update_profile(
    db: &Db,
    user_id: &str,
    update: &ProfileUpdate,
) -> Result<UserSummary, AccountError> {
    let gender = validate_profile(update, Utc::now().date_naive())?;

    let conn = db::lock(db)?;
    let mut record = queries::get_user_by_id(&conn, user_id)?
        .ok_or(AccountError::InvalidCredentials)?;
    record.identity.first_name = update.first_name.trim().to_string();
    record.identity.last_name = update.last_name.trim().to_string();
    record.identity.phone_number = validation::digits_only(&update.phone_number);
    record.gender = gender;
    record.date_of_birth = update.date_of_birth;

    if !queries::update_user_profile(&conn, &record)? {
        return Err(AccountError::InvalidCredentials);
    }
    tracing::info!(user_id, "profile updated");
    Ok(UserSummary::from(&record))
}

pub fn register(
    db: &Db,
    secret: &str,
    ttl_hours: i64,
    reg: &Registration,
) -> Result<Session, AccountError> {
    validate_registration(reg)?;

    let now = Utc::now();
    let salt = uuid::Uuid::new_v4().simple().to_string();
    let record = UserRecord {
        identity: Identity {
            id: uuid::Uuid::now_v7().to_string(),
            first_name: reg.first_name.trim().to_string(),
            last_name: reg.last_name.trim().to_string(),
            phone_number: validation::digits_only(&reg.phone_number),
            email: reg.email.trim().to_ascii_lowercase(),
        },
        gender: None,
        date_of_birth: None,
        password_digest: digest_password(secret, &salt, &reg.password)?,
        password_salt: salt,
        created_at: now,
    };

    let conn = db::lock(db)?;
    if !queries::create_user(&conn, &record)? {
        return Err(AccountError::EmailTaken);
    }
    let token = open_session(&conn, &record.identity.id, ttl_hours)?;

    tracing::info!(user_id = %record.identity.id, "devotee registered");
    Ok(Session {
        token,
        identity: record.identity,
    })
}

pub fn login(
    db: &Db,
    secret: &str,
    ttl_hours: i64,
    credentials: &Credentials,
) -> Result<Session, AccountError> {
    let conn = db::lock(db)?;
    let email = credentials.email.trim().to_ascii_lowercase();
    let record = queries::get_user_by_email(&conn, &email)?.ok_or(AccountError::InvalidCredentials)?;

    if !verify_password(secret, &record, &credentials.password) {
        tracing::warn!(user_id = %record.identity.id, "failed login");
        return Err(AccountError::InvalidCredentials);
    }

    let removed = queries::expire_old_sessions(&conn, &Utc::now())?;
    if removed > 0 {
        tracing::debug!(removed, "expired sessions removed");
    }

    let token = open_session(&conn, &record.identity.id, ttl_hours)?;
    Ok(Session {
        token,
        identity: record.identity,
    })
}

pub fn logout(db: &Db, token: &str) -> anyhow::Result<bool> {
    let conn = db::lock(db)?;
    queries::delete_session(&conn, token)
}

fn open_session(conn: &rusqlite::Connection, user_id: &str, ttl_hours: i64) -> anyhow::Result<String> {
    let now = Utc::now();
    let token = uuid::Uuid::new_v4().to_string();
    queries::create_session(conn, &token, user_id, &now, &(now + Duration::hours(ttl_hours)))?;
    Ok(token)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::services::identity::{IdentityProvider, SessionIdentity};

    const SECRET: &str = "test-secret";

    fn setup_db() -> Db {
        Arc::new(Mutex::new(db::init_db(":memory:").unwrap()))
    }

    fn registration() -> Registration {
        Registration {
            first_name: "Asha".to_string(),
            last_name: "Kulkarni".to_string(),
            email: "Asha@Example.com".to_string(),
            phone_number: "98765 43210".to_string(),
            password: "om-sai-ram".to_string(),
        }
    }

    #[test]
    fn test_digest_is_salted() {
        let a = digest_password(SECRET, "salt-a", "secret").unwrap();
        let b = digest_password(SECRET, "salt-b", "secret").unwrap();
        assert_ne!(a, b);
        assert_eq!(a, digest_password(SECRET, "salt-a", "secret").unwrap());
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let db = setup_db();
        let session = register(&db, SECRET, 24, &registration()).unwrap();
        assert_eq!(session.identity.email, "asha@example.com");
        assert_eq!(session.identity.phone_number, "9876543210");

        let identity = SessionIdentity::new(db.clone(), Some(session.token.clone()))
            .current_user()
            .await
            .unwrap();
        assert_eq!(identity, session.identity);

        let creds = Credentials {
            email: "asha@example.com".to_string(),
            password: "om-sai-ram".to_string(),
        };
        let again = login(&db, SECRET, 24, &creds).unwrap();
        assert_ne!(again.token, session.token);
        assert_eq!(again.identity.id, session.identity.id);
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let db = setup_db();
        register(&db, SECRET, 24, &registration()).unwrap();
        assert!(matches!(
            register(&db, SECRET, 24, &registration()),
            Err(AccountError::EmailTaken)
        ));
    }

    #[test]
    fn test_wrong_password_rejected() {
        let db = setup_db();
        register(&db, SECRET, 24, &registration()).unwrap();
        let creds = Credentials {
            email: "asha@example.com".to_string(),
            password: "wrong-password".to_string(),
        };
        assert!(matches!(
            login(&db, SECRET, 24, &creds),
            Err(AccountError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_registration_validation() {
        let db = setup_db();
        let short = Registration {
            password: "abc".to_string(),
            ..registration()
        };
        match register(&db, SECRET, 24, &short) {
            Err(AccountError::Invalid(e)) => assert_eq!(e.field, "password"),
            other => panic!("expected validation error, got {other:?}"),
        }

        let bad_phone = Registration {
            phone_number: "12345".to_string(),
            ..registration()
        };
        assert!(matches!(
            register(&db, SECRET, 24, &bad_phone),
            Err(AccountError::Invalid(_))
        ));
    }

    #[tokio::test]
    async fn test_logout_ends_session() {
        let db = setup_db();
        let session = register(&db, SECRET, 24, &registration()).unwrap();
        assert!(logout(&db, &session.token).unwrap());

        let identity = SessionIdentity::new(db, Some(session.token)).current_user().await;
        assert!(identity.is_none());
    }

    #[tokio::test]
    async fn test_missing_token_is_anonymous() {
        let db = setup_db();
        assert!(SessionIdentity::new(db, None).current_user().await.is_none());
    }

    fn profile_update() -> ProfileUpdate {
        ProfileUpdate {
            first_name: "Asha".to_string(),
            last_name: "Deshpande".to_string(),
            phone_number: "91234 56789".to_string(),
            gender: Some("female".to_string()),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 4, 2),
        }
    }

    #[test]
    fn test_update_profile() {
        let db = setup_db();
        let session = register(&db, SECRET, 24, &registration()).unwrap();

        let summary = update_profile(&db, &session.identity.id, &profile_update()).unwrap();
        assert_eq!(summary.last_name, "Deshpande");
        assert_eq!(summary.phone_number, "9123456789");
        assert_eq!(summary.gender, Some(Gender::Female));
        assert_eq!(summary.email, "asha@example.com");

        // Password still works after the edit.
        let creds = Credentials {
            email: "asha@example.com".to_string(),
            password: "om-sai-ram".to_string(),
        };
        assert!(login(&db, SECRET, 24, &creds).is_ok());
    }

    #[test]
    fn test_update_profile_validation() {
        let db = setup_db();
        let session = register(&db, SECRET, 24, &registration()).unwrap();

        let future_birth = ProfileUpdate {
            date_of_birth: Some(Utc::now().date_naive() + Duration::days(1)),
            ..profile_update()
        };
        match update_profile(&db, &session.identity.id, &future_birth) {
            Err(AccountError::Invalid(e)) => assert_eq!(e.field, "date_of_birth"),
            other => panic!("expected date_of_birth rejection, got {other:?}"),
        }

        let bad_gender = ProfileUpdate {
            gender: Some("unknown".to_string()),
            ..profile_update()
        };
        match update_profile(&db, &session.identity.id, &bad_gender) {
            Err(AccountError::Invalid(e)) => assert_eq!(e.field, "gender"),
            other => panic!("expected gender rejection, got {other:?}"),
        }
    }
}
