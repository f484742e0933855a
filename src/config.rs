use std::env;

use chrono::{FixedOffset, Offset, Utc};

use crate::services::validation::MobileProfile;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub admin_token: String,
    pub session_secret: String,
    pub session_ttl_hours: i64,
    /// Minutes east of UTC used to decide what "today" is at the temple.
    pub utc_offset_minutes: i32,
    pub mobile_profile: MobileProfile,
    pub temple_name: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "templebook.db".to_string()),
            admin_token: env::var("ADMIN_TOKEN").unwrap_or_else(|_| "changeme".to_string()),
            session_secret: env::var("SESSION_SECRET")
                .unwrap_or_else(|_| "templebook-dev-secret".to_string()),
            session_ttl_hours: env::var("SESSION_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(24),
            utc_offset_minutes: env::var("TEMPLE_UTC_OFFSET_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(330),
            mobile_profile: env::var("MOBILE_PROFILE")
                .ok()
                .and_then(|v| MobileProfile::parse(&v))
                .unwrap_or_default(),
            temple_name: env::var("TEMPLE_NAME")
                .unwrap_or_else(|_| "Shri Sai Baba Temple".to_string()),
        }
    }

    /// Falls back to UTC when the configured offset is out of range.
    pub fn temple_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60)
            .unwrap_or_else(|| Utc.fix())
    }
}
