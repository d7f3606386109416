//! Repository traits and their SQLite implementations.

mod attendance;
mod lecturer;
mod session;

pub use attendance::{
    AppendOutcome, AttendanceRepository, SqliteAttendanceRepository,
};
pub use lecturer::{LecturerRepository, SqliteLecturerRepository};
pub use session::{SessionRepository, SqliteSessionRepository};
