//! Database row models.

mod attendance;
mod lecturer;
mod session;

pub use attendance::{AttendanceRow, NewAttendance};
pub use lecturer::LecturerRow;
pub use session::SessionRow;
