#![allow(async_fn_in_trait)]

use crate::error::StorageResult;
use crate::models::SessionRow;
use sqlx::SqlitePool;

/// Repository trait for session metadata.
///
/// Uses native async trait methods (Edition 2024); mock implementations in
/// tests satisfy it without the async-trait crate.
pub trait SessionRepository: Send + Sync {
    /// Insert a new session row.
    async fn create(&self, session: &SessionRow) -> StorageResult<()>;

    /// Find a session by its identifier.
    async fn find_by_id(&self, session_id: &str) -> StorageResult<Option<SessionRow>>;

    /// Sessions for a course, most recent first.
    async fn list_by_course(&self, course_id: &str) -> StorageResult<Vec<SessionRow>>;
}

/// SQLite implementation of SessionRepository
#[derive(Debug, Clone)]
pub struct SqliteSessionRepository {
    pool: SqlitePool,
}

impl SqliteSessionRepository {
    /// Create a new SQLite session repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl SessionRepository for SqliteSessionRepository {
    async fn create(&self, session: &SessionRow) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sessions (session_id, course_id, name, description, date, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&session.session_id)
        .bind(&session.course_id)
        .bind(&session.name)
        .bind(&session.description)
        .bind(session.date)
        .bind(session.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, session_id: &str) -> StorageResult<Option<SessionRow>> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT session_id, course_id, name, description, date, created_at
            FROM sessions
            WHERE session_id = ?
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn list_by_course(&self, course_id: &str) -> StorageResult<Vec<SessionRow>> {
        let rows = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT session_id, course_id, name, description, date, created_at
            FROM sessions
            WHERE course_id = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
