//! Storage layer for the attendance system.
//!
//! This crate provides SQLite-backed persistence for lecturers, sessions,
//! and attendance marks, and implements the engine's consumed gateway
//! traits over it.
//!
//! # Architecture
//!
//! - [`Database`] - connection pool manager with embedded migrations
//! - [`SessionRepository`], [`AttendanceRepository`], [`LecturerRepository`]
//!   - data access traits with SQLite implementations
//! - [`SqlitePersistenceGateway`] - the engine's `PersistenceGateway` over
//!   the repositories
//! - [`SqliteIdentityGateway`] - the engine's `IdentityGateway` over the
//!   lecturer table (constant-time secret comparison)
//!
//! The durable layer enforces the same replay guard as the in-memory
//! ledger: `(session_id, nonce)` is unique, and a retransmitted nonce is
//! deduplicated rather than stored twice.
//!
//! # Examples
//!
//! ```no_run
//! use attend_engine::PersistenceGateway;
//! use attend_storage::{Database, DatabaseConfig, SqlitePersistenceGateway};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new(DatabaseConfig::new("omniattend.db")).await?;
//! let gateway = SqlitePersistenceGateway::new(db.pool().clone());
//!
//! let course = attend_core::CourseId::new("CS-404")?;
//! let sessions = gateway.list_sessions(&course).await?;
//! println!("{} previous sessions", sessions.len());
//! # Ok(())
//! # }
//! ```

#![allow(async_fn_in_trait)]

pub mod connection;
pub mod error;
pub mod identity;
pub mod models;
pub mod repositories;

pub use connection::{Database, DatabaseConfig};
pub use error::{StorageError, StorageResult};
pub use identity::SqliteIdentityGateway;
pub use models::{AttendanceRow, LecturerRow, NewAttendance, SessionRow};
pub use repositories::{
    AppendOutcome, AttendanceRepository, LecturerRepository, SessionRepository,
    SqliteAttendanceRepository, SqliteLecturerRepository, SqliteSessionRepository,
};

use attend_core::{CourseId, Error, Nonce, Result, SessionId};
use attend_engine::{AttendanceRecord, PersistenceGateway, Session};
use sqlx::SqlitePool;

/// SQLite implementation of the engine's [`PersistenceGateway`].
#[derive(Debug, Clone)]
pub struct SqlitePersistenceGateway {
    sessions: SqliteSessionRepository,
    attendance: SqliteAttendanceRepository,
}

impl SqlitePersistenceGateway {
    /// Create a gateway over the given pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            sessions: SqliteSessionRepository::new(pool.clone()),
            attendance: SqliteAttendanceRepository::new(pool),
        }
    }
}

fn persistence_error(e: StorageError) -> Error {
    Error::Persistence(e.to_string())
}

impl PersistenceGateway for SqlitePersistenceGateway {
    async fn create_session(&self, session: &Session) -> Result<()> {
        self.sessions
            .create(&SessionRow::from_session(session))
            .await
            .map_err(persistence_error)
    }

    async fn append_attendance(
        &self,
        session_id: &SessionId,
        record: &AttendanceRecord,
        nonce: &Nonce,
    ) -> Result<()> {
        // AppendOutcome::DuplicateNonce is success: the durable layer
        // deduplicates retransmissions instead of erroring.
        self.attendance
            .append(&NewAttendance::from_record(
                session_id.as_str(),
                record,
                nonce.as_str(),
            ))
            .await
            .map(|_| ())
            .map_err(persistence_error)
    }

    async fn list_sessions(&self, course_id: &CourseId) -> Result<Vec<Session>> {
        let rows = self
            .sessions
            .list_by_course(course_id.as_str())
            .await
            .map_err(persistence_error)?;

        rows.into_iter()
            .map(|row| row.into_session().map_err(persistence_error))
            .collect()
    }

    async fn list_attendance(&self, session_id: &SessionId) -> Result<Vec<AttendanceRecord>> {
        let rows = self
            .attendance
            .list_for_session(session_id.as_str())
            .await
            .map_err(persistence_error)?;

        rows.into_iter()
            .map(|row| row.into_record().map_err(persistence_error))
            .collect()
    }
}
