use crate::{
    Result,
    constants::{
        DEVICE_NONCE_PREFIX, MAX_COURSE_ID_LENGTH, MAX_SUBJECT_ID_LENGTH, MIN_SUBJECT_ID_LENGTH,
    },
    error::Error,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Subject (student) identifier.
///
/// Construction normalizes the raw input the same way regardless of where it
/// came from: surrounding whitespace is trimmed and the identifier is
/// converted to ASCII uppercase, so `" s1 "` and `"S1"` are the same subject
/// for duplicate-suppression purposes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubjectId(String);

impl SubjectId {
    /// Create a new subject identifier with normalization and validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidSubjectId` if:
    /// - The normalized identifier is shorter than 2 or longer than 32 characters
    /// - The identifier contains non-ASCII characters
    pub fn new(raw: &str) -> Result<Self> {
        // Normalize: trim and uppercase
        let id = raw.trim().to_uppercase();

        let len = id.len();
        if !(MIN_SUBJECT_ID_LENGTH..=MAX_SUBJECT_ID_LENGTH).contains(&len) {
            return Err(Error::InvalidSubjectId(format!(
                "Subject ID must be {MIN_SUBJECT_ID_LENGTH}-{MAX_SUBJECT_ID_LENGTH} chars, got {len}"
            )));
        }

        if !id.is_ascii() {
            return Err(Error::InvalidSubjectId(
                "Subject ID must be ASCII".to_string(),
            ));
        }

        Ok(SubjectId(id))
    }

    /// Get the normalized identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SubjectId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        SubjectId::new(s)
    }
}

/// Course catalog identifier ("CS-404" style).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CourseId(String);

impl CourseId {
    /// Create a new course identifier with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidCourseId` if the identifier is empty, longer
    /// than 16 characters, or not ASCII.
    pub fn new(raw: &str) -> Result<Self> {
        let id = raw.trim().to_string();

        if id.is_empty() || id.len() > MAX_COURSE_ID_LENGTH {
            return Err(Error::InvalidCourseId(format!(
                "Course ID must be 1-{MAX_COURSE_ID_LENGTH} chars, got {}",
                id.len()
            )));
        }

        if !id.is_ascii() {
            return Err(Error::InvalidCourseId(
                "Course ID must be ASCII".to_string(),
            ));
        }

        Ok(CourseId(id))
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for CourseId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        CourseId::new(s)
    }
}

/// Single-use anti-replay value embedded in a token.
///
/// Producer-issued nonces are opaque random strings. Nonces synthesized for
/// raw peripheral input carry the `DEVICE-` prefix and are keyed by arrival
/// time (see [`Nonce::device`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Nonce(String);

impl Nonce {
    /// Wrap a producer-issued nonce.
    ///
    /// # Errors
    /// Returns `Error::MissingField` for an empty nonce; a token without a
    /// usable nonce cannot participate in replay prevention.
    pub fn new(raw: &str) -> Result<Self> {
        let value = raw.trim();
        if value.is_empty() {
            return Err(Error::MissingField("nonce".to_string()));
        }
        Ok(Nonce(value.to_string()))
    }

    /// Synthesize a device nonce from an arrival timestamp.
    ///
    /// The result never collides with a producer-issued nonce (the prefix is
    /// reserved) and never repeats for the same physical tap, but it does not
    /// prevent replay of the same card across time.
    #[must_use]
    pub fn device(arrival: DateTime<Utc>) -> Self {
        Nonce(format!("{DEVICE_NONCE_PREFIX}{}", arrival.timestamp_millis()))
    }

    /// Returns `true` if this nonce was synthesized for device input.
    #[must_use]
    pub fn is_device_generated(&self) -> bool {
        self.0.starts_with(DEVICE_NONCE_PREFIX)
    }

    /// Get the nonce as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Session identifier, scoping the ledger and all anti-replay state.
///
/// Generated as `<course-id>-<base36 millis>`, matching the identifiers the
/// issuing deployment already has in its durable store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Wrap an existing session identifier.
    ///
    /// # Errors
    /// Returns `Error::Config` for an empty identifier.
    pub fn new(raw: &str) -> Result<Self> {
        let id = raw.trim();
        if id.is_empty() {
            return Err(Error::Config("Session ID must not be empty".to_string()));
        }
        Ok(SessionId(id.to_string()))
    }

    /// Generate a fresh session identifier for a course.
    #[must_use]
    pub fn generate(course: &CourseId, at: DateTime<Utc>) -> Self {
        SessionId(format!(
            "{}-{}",
            course.as_str(),
            to_base36(at.timestamp_millis().max(0) as u64)
        ))
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).expect("base36 digits are ASCII")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    #[rstest]
    #[case("s1", "S1")]
    #[case("  21/0331 ", "21/0331")]
    #[case("badge-0042", "BADGE-0042")]
    fn test_subject_id_normalization(#[case] input: &str, #[case] expected: &str) {
        let id = SubjectId::new(input).unwrap();
        assert_eq!(id.as_str(), expected);
    }

    #[rstest]
    #[case("")] // empty
    #[case("a")] // too short
    #[case("x234567890123456789012345678901234")] // too long
    #[case("étudiant")] // non-ASCII
    fn test_subject_id_invalid(#[case] input: &str) {
        assert!(SubjectId::new(input).is_err());
    }

    #[test]
    fn test_subject_id_from_str() {
        let id: SubjectId = " s1 ".parse().unwrap();
        assert_eq!(id.as_str(), "S1");
    }

    #[rstest]
    #[case("CS-404")]
    #[case("ETH-101")]
    fn test_course_id_valid(#[case] input: &str) {
        let id = CourseId::new(input).unwrap();
        assert_eq!(id.as_str(), input);
    }

    #[rstest]
    #[case("")]
    #[case("THIS-COURSE-ID-IS-TOO-LONG")]
    fn test_course_id_invalid(#[case] input: &str) {
        assert!(CourseId::new(input).is_err());
    }

    #[test]
    fn test_nonce_rejects_empty() {
        assert!(Nonce::new("").is_err());
        assert!(Nonce::new("   ").is_err());
    }

    #[test]
    fn test_device_nonce_shape() {
        let at = Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap();
        let nonce = Nonce::device(at);
        assert!(nonce.is_device_generated());
        assert_eq!(
            nonce.as_str(),
            format!("DEVICE-{}", at.timestamp_millis())
        );
    }

    #[test]
    fn test_device_nonce_never_collides_with_issued() {
        let issued = Nonce::new("a3f9c2e1").unwrap();
        assert!(!issued.is_device_generated());
    }

    #[test]
    fn test_session_id_generate() {
        let course = CourseId::new("CS-404").unwrap();
        let at = Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap();
        let id = SessionId::generate(&course, at);
        assert!(id.as_str().starts_with("CS-404-"));

        // Distinct instants produce distinct identifiers
        let later = at + chrono::Duration::milliseconds(1);
        assert_ne!(id, SessionId::generate(&course, later));
    }

    #[test]
    fn test_session_id_rejects_empty() {
        assert!(SessionId::new("  ").is_err());
    }

    #[test]
    fn test_base36_round_digits() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
    }
}
