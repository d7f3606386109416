//! Consumed collaborator seams: durable storage and identity.
//!
//! The engine validates and commits locally; durability and authentication
//! belong to external collaborators behind these traits. Both use native
//! async trait methods (Edition 2024 RPITIT); implementations are selected
//! by the application (SQLite-backed in `attend-storage`, in-memory in
//! [`memory`](crate::memory)).

use crate::ledger::AttendanceRecord;
use crate::session::Session;
use attend_core::{CourseId, Nonce, Result, SessionId};

/// Durable session/attendance storage, consulted only at commit time.
pub trait PersistenceGateway: Send + Sync {
    /// Durably create a session.
    ///
    /// # Errors
    ///
    /// Returns `Error::Persistence` when the write fails. Session creation
    /// failures are non-fatal to the capture flow: the engine continues in
    /// local mode.
    async fn create_session(&self, session: &Session) -> Result<()>;

    /// Durably append one attendance record.
    ///
    /// Implementations must reject or dedupe a nonce already recorded for
    /// the session, mirroring the in-memory replay check at the durable
    /// layer.
    ///
    /// # Errors
    ///
    /// Returns `Error::Persistence` when the write fails. The caller's
    /// in-memory commit is not rolled back on failure.
    async fn append_attendance(
        &self,
        session_id: &SessionId,
        record: &AttendanceRecord,
        nonce: &Nonce,
    ) -> Result<()>;

    /// Sessions previously run for a course, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `Error::Persistence` when the query fails.
    async fn list_sessions(&self, course_id: &CourseId) -> Result<Vec<Session>>;

    /// Attendance records stored for a session.
    ///
    /// # Errors
    ///
    /// Returns `Error::Persistence` when the query fails.
    async fn list_attendance(&self, session_id: &SessionId) -> Result<Vec<AttendanceRecord>>;
}

/// Lecturer authentication, consumed by the session controller.
///
/// The concrete identity-provider protocol is out of scope; the controller
/// only needs these two operations.
pub trait IdentityGateway: Send + Sync {
    /// Authenticate a principal.
    ///
    /// # Errors
    ///
    /// Returns `Error::Auth` on bad credentials. The session state machine
    /// does not advance on failure.
    async fn authenticate(&mut self, principal_id: &str, secret: &str) -> Result<()>;

    /// Clear the authenticated principal.
    ///
    /// # Errors
    ///
    /// Returns `Error::Auth` if sign-out fails upstream; local state is
    /// cleared regardless.
    async fn deauthenticate(&mut self) -> Result<()>;
}
