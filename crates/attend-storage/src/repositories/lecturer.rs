#![allow(async_fn_in_trait)]

use crate::error::StorageResult;
use crate::models::LecturerRow;
use chrono::Utc;
use sqlx::SqlitePool;

/// Repository trait for lecturer accounts.
pub trait LecturerRepository: Send + Sync {
    /// Register a lecturer, returning the new row id.
    async fn create(&self, email: &str, secret: &str, full_name: &str) -> StorageResult<i64>;

    /// Find a lecturer by login email.
    async fn find_by_email(&self, email: &str) -> StorageResult<Option<LecturerRow>>;
}

/// SQLite implementation of LecturerRepository
#[derive(Debug, Clone)]
pub struct SqliteLecturerRepository {
    pool: SqlitePool,
}

impl SqliteLecturerRepository {
    /// Create a new SQLite lecturer repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl LecturerRepository for SqliteLecturerRepository {
    async fn create(&self, email: &str, secret: &str, full_name: &str) -> StorageResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO lecturers (email, secret, full_name, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(email)
        .bind(secret)
        .bind(full_name)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn find_by_email(&self, email: &str) -> StorageResult<Option<LecturerRow>> {
        let row = sqlx::query_as::<_, LecturerRow>(
            r#"
            SELECT id, email, secret, full_name, created_at
            FROM lecturers
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}
