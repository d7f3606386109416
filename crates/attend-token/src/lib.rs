//! Attendance token payload and its wire codec.
//!
//! A token is the structured, single-use credential a presenting device
//! (student phone or biometric peripheral) hands to the capture engine. This
//! crate owns the payload shape and the JSON codec; it performs shape checks
//! only. Semantic validation (replay, course match, duplicates) lives in the
//! validation pipeline.

pub mod codec;
pub mod payload;

pub use codec::{DecodeError, decode, encode};
pub use payload::{AttendanceToken, AttendanceTokenBuilder};
