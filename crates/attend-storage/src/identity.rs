//! SQLite-backed identity gateway.
//!
//! Verifies lecturer credentials against the `lecturers` table. Secrets are
//! compared in constant time so a comparison cannot leak where the strings
//! first differ.

use crate::error::StorageResult;
use crate::repositories::{LecturerRepository, SqliteLecturerRepository};
use attend_core::{Error, Result};
use attend_engine::IdentityGateway;
use sqlx::SqlitePool;
use subtle::ConstantTimeEq;
use tracing::info;

/// Identity gateway backed by the local lecturer table.
///
/// # Examples
///
/// ```no_run
/// use attend_engine::IdentityGateway;
/// use attend_storage::connection::Database;
/// use attend_storage::identity::SqliteIdentityGateway;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let db = Database::in_memory().await?;
/// let mut identity = SqliteIdentityGateway::new(db.pool().clone());
///
/// identity.register("lecturer@example.edu", "hunter2", "Dr. Example").await?;
/// identity.authenticate("lecturer@example.edu", "hunter2").await?;
/// # Ok(())
/// # }
/// ```
pub struct SqliteIdentityGateway {
    lecturers: SqliteLecturerRepository,
    authenticated: Option<String>,
}

impl SqliteIdentityGateway {
    /// Create a gateway over the given pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            lecturers: SqliteLecturerRepository::new(pool),
            authenticated: None,
        }
    }

    /// Register a lecturer account.
    ///
    /// # Errors
    ///
    /// Returns a storage error when the insert fails (duplicate email
    /// included).
    pub async fn register(
        &self,
        email: &str,
        secret: &str,
        full_name: &str,
    ) -> StorageResult<i64> {
        self.lecturers.create(email, secret, full_name).await
    }

    /// Currently authenticated principal, if any.
    #[must_use]
    pub fn current(&self) -> Option<&str> {
        self.authenticated.as_deref()
    }
}

impl IdentityGateway for SqliteIdentityGateway {
    async fn authenticate(&mut self, principal_id: &str, secret: &str) -> Result<()> {
        let lecturer = self
            .lecturers
            .find_by_email(principal_id)
            .await
            .map_err(|e| Error::Persistence(e.to_string()))?;

        // Unknown principals and wrong secrets get the same answer.
        let matches = lecturer
            .as_ref()
            .map(|row| bool::from(row.secret.as_bytes().ct_eq(secret.as_bytes())))
            .unwrap_or(false);

        if !matches {
            return Err(Error::Auth("invalid credentials".to_string()));
        }

        self.authenticated = Some(principal_id.to_string());
        info!(lecturer = principal_id, "credentials verified");
        Ok(())
    }

    async fn deauthenticate(&mut self) -> Result<()> {
        self.authenticated = None;
        Ok(())
    }
}
