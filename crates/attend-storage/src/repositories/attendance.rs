#![allow(async_fn_in_trait)]

use crate::error::StorageResult;
use crate::models::{AttendanceRow, NewAttendance};
use sqlx::SqlitePool;
use tracing::debug;

/// Result of appending an attendance mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// The mark was stored.
    Inserted,

    /// The nonce was already recorded for this session; nothing stored.
    ///
    /// This mirrors the engine's in-memory replay check at the durable
    /// layer: retransmission of an already committed token is idempotent.
    DuplicateNonce,
}

/// Repository trait for attendance marks.
pub trait AttendanceRepository: Send + Sync {
    /// Append one mark, deduplicating on (session, nonce).
    async fn append(&self, attendance: &NewAttendance) -> StorageResult<AppendOutcome>;

    /// All marks for a session in acceptance order.
    async fn list_for_session(&self, session_id: &str) -> StorageResult<Vec<AttendanceRow>>;

    /// Number of marks stored for a session.
    async fn count_for_session(&self, session_id: &str) -> StorageResult<i64>;

    /// Whether a nonce has been recorded for a session.
    async fn nonce_exists(&self, session_id: &str, nonce: &str) -> StorageResult<bool>;
}

/// SQLite implementation of AttendanceRepository
#[derive(Debug, Clone)]
pub struct SqliteAttendanceRepository {
    pool: SqlitePool,
}

impl SqliteAttendanceRepository {
    /// Create a new SQLite attendance repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl AttendanceRepository for SqliteAttendanceRepository {
    async fn append(&self, attendance: &NewAttendance) -> StorageResult<AppendOutcome> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance_logs (session_id, subject_id, subject_name, nonce, recorded_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (session_id, nonce) DO NOTHING
            "#,
        )
        .bind(&attendance.session_id)
        .bind(&attendance.subject_id)
        .bind(&attendance.subject_name)
        .bind(&attendance.nonce)
        .bind(attendance.recorded_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            debug!(
                session_id = %attendance.session_id,
                nonce = %attendance.nonce,
                "nonce already recorded, dropping durable write"
            );
            Ok(AppendOutcome::DuplicateNonce)
        } else {
            Ok(AppendOutcome::Inserted)
        }
    }

    async fn list_for_session(&self, session_id: &str) -> StorageResult<Vec<AttendanceRow>> {
        let rows = sqlx::query_as::<_, AttendanceRow>(
            r#"
            SELECT id, session_id, subject_id, subject_name, nonce, recorded_at
            FROM attendance_logs
            WHERE session_id = ?
            ORDER BY id
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn count_for_session(&self, session_id: &str) -> StorageResult<i64> {
        let count: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM attendance_logs
            WHERE session_id = ?
            "#,
        )
        .bind(session_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }

    async fn nonce_exists(&self, session_id: &str, nonce: &str) -> StorageResult<bool> {
        let count: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM attendance_logs
            WHERE session_id = ? AND nonce = ?
            "#,
        )
        .bind(session_id)
        .bind(nonce)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0 > 0)
    }
}
