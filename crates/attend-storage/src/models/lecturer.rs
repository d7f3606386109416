use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Row in the `lecturers` table.
///
/// The stored secret is compared in constant time during authentication;
/// see [`identity`](crate::identity).
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct LecturerRow {
    /// Auto-increment primary key.
    pub id: i64,

    /// Login email (unique).
    pub email: String,

    /// Authentication secret.
    #[serde(skip_serializing)]
    pub secret: String,

    /// Display name.
    pub full_name: String,

    /// Registration instant.
    pub created_at: DateTime<Utc>,
}
