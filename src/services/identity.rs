use async_trait::async_trait;
use chrono::Utc;

use crate::db::{self, queries, Db};
use crate::models::Identity;

/// Who is submitting. `None` means not signed in.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn current_user(&self) -> Option<Identity>;
}

/// Resolves the bearer token of one request against the sessions table.
///
/// A storage or lock failure during the lookup is logged and reported as
/// `None`, so an outage surfaces to the caller as "not signed in" (401).
pub struct SessionIdentity {
    db: Db,
    token: Option<String>,
}

impl SessionIdentity {
    pub fn new(db: Db, token: Option<String>) -> Self {
        Self { db, token }
    }
}

#[async_trait]
impl IdentityProvider for SessionIdentity {
    async fn current_user(&self) -> Option<Identity> {
        let token = self.token.as_deref()?;
        let lookup = db::lock(&self.db)
            .and_then(|conn| queries::get_session_identity(&conn, token, &Utc::now()));

        match lookup {
            Ok(identity) => identity,
            Err(e) => {
                tracing::error!(error = %e, "failed to resolve session");
                None
            }
        }
    }
}

#[async_trait]
impl IdentityProvider for Option<Identity> {
    async fn current_user(&self) -> Option<Identity> {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[tokio::test]
    async fn test_missing_token_is_anonymous() {
        let db: Db = Arc::new(Mutex::new(db::init_db(":memory:").unwrap()));
        assert!(SessionIdentity::new(db, None).current_user().await.is_none());
    }

    #[tokio::test]
    async fn test_storage_failure_reads_as_signed_out() {
        let conn = db::init_db(":memory:").unwrap();
        conn.execute_batch("DROP TABLE sessions").unwrap();
        let db: Db = Arc::new(Mutex::new(conn));

        let identity = SessionIdentity::new(db, Some("some-token".to_string()));
        assert!(identity.current_user().await.is_none());
    }
}
