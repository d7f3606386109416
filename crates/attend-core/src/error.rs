use thiserror::Error;

/// Top-level error taxonomy for the attendance stack.
///
/// No variant is fatal to the process: every error is scoped to the
/// operation that produced it and leaves the session state machine in a
/// well-defined state.
#[derive(Error, Debug)]
pub enum Error {
    // Payload errors
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    // Identifier errors
    #[error("Invalid subject identifier: {0}")]
    InvalidSubjectId(String),

    #[error("Invalid course identifier: {0}")]
    InvalidCourseId(String),

    // Validation errors
    #[error("Nonce already consumed: {nonce}")]
    ReplayedNonce { nonce: String },

    #[error("Token issued for course {actual}, session is bound to {expected}")]
    WrongCourse { expected: String, actual: String },

    #[error("Subject already marked present: {subject_id}")]
    DuplicateSubject { subject_id: String },

    // Capture errors
    #[error("Capture source unavailable: {0}")]
    CaptureAcquisition(String),

    // Collaborator errors
    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    // State machine errors
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
