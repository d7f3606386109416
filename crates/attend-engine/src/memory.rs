//! In-memory gateway implementations for tests, development, and the demo
//! binary.
//!
//! `MemoryGateway` behaves like the durable store without the durability:
//! by-recency session listing, nonce dedupe at the "durable" layer, and a
//! scriptable failure switch for exercising the persistence-failure path.

use crate::gateway::{IdentityGateway, PersistenceGateway};
use crate::ledger::AttendanceRecord;
use crate::session::Session;
use attend_core::{CourseId, Error, Nonce, Result, SessionId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

#[derive(Debug, Default)]
struct GatewayState {
    sessions: Vec<Session>,
    attendance: HashMap<SessionId, Vec<(Nonce, AttendanceRecord)>>,
    fail_next_appends: u32,
}

/// In-memory [`PersistenceGateway`].
///
/// Clones share the same underlying store.
///
/// # Examples
///
/// ```
/// use attend_engine::{MemoryGateway, PersistenceGateway};
/// use attend_core::CourseId;
///
/// # async fn example() -> attend_core::Result<()> {
/// let gateway = MemoryGateway::new();
/// let course = CourseId::new("CS-404")?;
/// assert!(gateway.list_sessions(&course).await?.is_empty());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryGateway {
    state: Arc<Mutex<GatewayState>>,
}

impl MemoryGateway {
    /// Create an empty in-memory gateway.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, GatewayState> {
        self.state.lock().expect("gateway state poisoned")
    }

    /// Make the next `count` append calls fail with a persistence error.
    pub fn fail_next_appends(&self, count: u32) {
        self.lock().fail_next_appends = count;
    }

    /// Number of records stored for a session.
    #[must_use]
    pub fn stored_count(&self, session_id: &SessionId) -> usize {
        self.lock()
            .attendance
            .get(session_id)
            .map_or(0, Vec::len)
    }
}

impl PersistenceGateway for MemoryGateway {
    async fn create_session(&self, session: &Session) -> Result<()> {
        self.lock().sessions.push(session.clone());
        Ok(())
    }

    async fn append_attendance(
        &self,
        session_id: &SessionId,
        record: &AttendanceRecord,
        nonce: &Nonce,
    ) -> Result<()> {
        let mut state = self.lock();
        if state.fail_next_appends > 0 {
            state.fail_next_appends -= 1;
            return Err(Error::Persistence("simulated write failure".to_string()));
        }

        let records = state.attendance.entry(session_id.clone()).or_default();
        if records.iter().any(|(n, _)| n == nonce) {
            // Durable-layer dedupe: a retransmitted nonce is dropped, not
            // stored twice.
            debug!(%session_id, %nonce, "deduplicated nonce at durable layer");
            return Ok(());
        }
        records.push((nonce.clone(), record.clone()));
        Ok(())
    }

    async fn list_sessions(&self, course_id: &CourseId) -> Result<Vec<Session>> {
        let mut sessions: Vec<Session> = self
            .lock()
            .sessions
            .iter()
            .filter(|s| &s.course_id == course_id)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sessions)
    }

    async fn list_attendance(&self, session_id: &SessionId) -> Result<Vec<AttendanceRecord>> {
        Ok(self
            .lock()
            .attendance
            .get(session_id)
            .map(|records| records.iter().map(|(_, r)| r.clone()).collect())
            .unwrap_or_default())
    }
}

/// In-memory [`IdentityGateway`] with a fixed credential table.
#[derive(Debug, Default)]
pub struct MemoryIdentity {
    credentials: HashMap<String, String>,
    authenticated: Option<String>,
}

impl MemoryIdentity {
    /// Create an identity gateway with no registered principals.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a principal and its secret.
    #[must_use]
    pub fn with_principal(mut self, principal_id: &str, secret: &str) -> Self {
        self.credentials
            .insert(principal_id.to_string(), secret.to_string());
        self
    }

    /// Currently authenticated principal, if any.
    #[must_use]
    pub fn current(&self) -> Option<&str> {
        self.authenticated.as_deref()
    }
}

impl IdentityGateway for MemoryIdentity {
    async fn authenticate(&mut self, principal_id: &str, secret: &str) -> Result<()> {
        match self.credentials.get(principal_id) {
            Some(expected) if expected == secret => {
                self.authenticated = Some(principal_id.to_string());
                Ok(())
            }
            _ => Err(Error::Auth("invalid credentials".to_string())),
        }
    }

    async fn deauthenticate(&mut self) -> Result<()> {
        self.authenticated = None;
        Ok(())
    }
}
