//! The attendance token payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Producer-issued attendance token.
///
/// Field names on the wire follow the issuing device's JSON payload
/// (`subjectId`, `courseId`, ... camelCase). `issued_at` is a unix millis
/// timestamp; the issuing side rotates `nonce` periodically (every 60 s) to
/// limit the replay window before a scan occurs, but the capture side treats
/// both fields as opaque: all semantic checks happen in the validation
/// pipeline.
///
/// # Examples
///
/// ```
/// use attend_token::AttendanceToken;
/// use chrono::Utc;
///
/// let token = AttendanceToken::builder("S1", "CS-404", "Network Security")
///     .subject_name("Ada Lovelace")
///     .issued_at(Utc::now())
///     .nonce("a3f9c2e1")
///     .build();
///
/// assert_eq!(token.subject_id, "S1");
/// assert_eq!(token.nonce, "a3f9c2e1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceToken {
    /// Subject (student) identifier asserted by the presenting device.
    pub subject_id: String,

    /// Optional display name of the subject.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_name: Option<String>,

    /// Course the token was issued for.
    pub course_id: String,

    /// Display name of the course at issuance time.
    #[serde(default)]
    pub course_name: String,

    /// Issuance instant, unix milliseconds.
    #[serde(default)]
    pub issued_at: i64,

    /// Single-use anti-replay value, rotated by the producer.
    pub nonce: String,
}

impl AttendanceToken {
    /// Create a builder with the required identifying fields.
    pub fn builder(
        subject_id: impl Into<String>,
        course_id: impl Into<String>,
        course_name: impl Into<String>,
    ) -> AttendanceTokenBuilder {
        AttendanceTokenBuilder {
            subject_id: subject_id.into(),
            subject_name: None,
            course_id: course_id.into(),
            course_name: course_name.into(),
            issued_at: None,
            nonce: None,
        }
    }

    /// Issue a fresh token with a random nonce and the current timestamp.
    ///
    /// This is the producing side of the exchange. It lives here for mocks,
    /// tests, and the demo binary; real issuance happens on the presenting
    /// device.
    #[must_use]
    pub fn issue(
        subject_id: impl Into<String>,
        subject_name: Option<&str>,
        course_id: impl Into<String>,
        course_name: impl Into<String>,
    ) -> Self {
        let mut builder = Self::builder(subject_id, course_id, course_name);
        if let Some(name) = subject_name {
            builder = builder.subject_name(name);
        }
        builder.build()
    }

    /// Issuance instant as a UTC datetime, if representable.
    #[must_use]
    pub fn issued_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.issued_at)
    }
}

/// Builder for [`AttendanceToken`].
///
/// Tests and mock producers use this to pin down the nonce and issuance
/// instant; `build()` fills in a random nonce and the current time when they
/// are left unset.
#[derive(Debug, Clone)]
pub struct AttendanceTokenBuilder {
    subject_id: String,
    subject_name: Option<String>,
    course_id: String,
    course_name: String,
    issued_at: Option<DateTime<Utc>>,
    nonce: Option<String>,
}

impl AttendanceTokenBuilder {
    /// Set the subject display name.
    pub fn subject_name(mut self, name: impl Into<String>) -> Self {
        self.subject_name = Some(name.into());
        self
    }

    /// Pin the issuance instant.
    pub fn issued_at(mut self, at: DateTime<Utc>) -> Self {
        self.issued_at = Some(at);
        self
    }

    /// Pin the nonce.
    pub fn nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    /// Build the token, generating a random nonce and stamping the current
    /// time for fields left unset.
    #[must_use]
    pub fn build(self) -> AttendanceToken {
        AttendanceToken {
            subject_id: self.subject_id,
            subject_name: self.subject_name,
            course_id: self.course_id,
            course_name: self.course_name,
            issued_at: self
                .issued_at
                .unwrap_or_else(Utc::now)
                .timestamp_millis(),
            nonce: self.nonce.unwrap_or_else(|| Uuid::new_v4().simple().to_string()),
        }
    }
}
