//! JSON codec for the attendance token payload.
//!
//! Decoding distinguishes two failure classes the capture UI treats
//! differently: a payload that is not well-formed JSON at all
//! ([`DecodeError::Malformed`]) and a structurally valid payload missing one
//! of the fields the validation pipeline cannot work without
//! ([`DecodeError::MissingField`]). Nothing else is checked here.

use crate::payload::AttendanceToken;
use serde::Deserialize;
use thiserror::Error;

/// Errors produced by [`decode`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The payload is not well-formed structured data.
    #[error("Malformed token payload: {0}")]
    Malformed(String),

    /// A required field is absent or empty.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}

/// Loose mirror of the wire payload.
///
/// Every field is optional so that absence surfaces as `MissingField` with
/// the field name instead of a generic parse error.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPayload {
    #[serde(default)]
    subject_id: Option<String>,
    #[serde(default)]
    subject_name: Option<String>,
    #[serde(default)]
    course_id: Option<String>,
    #[serde(default)]
    course_name: Option<String>,
    #[serde(default)]
    issued_at: Option<i64>,
    #[serde(default)]
    nonce: Option<String>,
}

fn require(value: Option<String>, field: &'static str) -> Result<String, DecodeError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(DecodeError::MissingField(field)),
    }
}

/// Decode an opaque payload string into an [`AttendanceToken`].
///
/// # Errors
///
/// Returns [`DecodeError::Malformed`] when the input is not a JSON object,
/// and [`DecodeError::MissingField`] when `subjectId`, `courseId`, or
/// `nonce` is absent or empty. `courseName` and `issuedAt` are tolerated
/// when missing; older producers did not always send them.
pub fn decode(input: &str) -> Result<AttendanceToken, DecodeError> {
    let raw: RawPayload =
        serde_json::from_str(input).map_err(|e| DecodeError::Malformed(e.to_string()))?;

    Ok(AttendanceToken {
        subject_id: require(raw.subject_id, "subjectId")?,
        subject_name: raw.subject_name.filter(|n| !n.trim().is_empty()),
        course_id: require(raw.course_id, "courseId")?,
        course_name: raw.course_name.unwrap_or_default(),
        issued_at: raw.issued_at.unwrap_or_default(),
        nonce: require(raw.nonce, "nonce")?,
    })
}

/// Encode a token into its opaque wire form.
///
/// Issuance lives on the presenting device; this exists for mock producers
/// and tests.
///
/// # Errors
///
/// Returns [`DecodeError::Malformed`] if serialization fails, which only
/// happens for non-string map keys and similar shapes this struct cannot
/// produce.
pub fn encode(token: &AttendanceToken) -> Result<String, DecodeError> {
    serde_json::to_string(token).map_err(|e| DecodeError::Malformed(e.to_string()))
}
