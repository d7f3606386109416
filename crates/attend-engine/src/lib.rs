//! Attendance engine: validation pipeline, session-scoped ledger, and the
//! session controller state machine.
//!
//! The engine consumes normalized scan events from whichever capture adapter
//! the controller has activated, decides accept/reject against the active
//! session and its ledger, and asks the persistence gateway for a durable
//! write on acceptance. The ledger is the single source of truth for
//! anti-replay and duplicate suppression; it lives exactly as long as its
//! session.

#![allow(async_fn_in_trait)]

pub mod controller;
pub mod gateway;
pub mod ledger;
pub mod memory;
pub mod messages;
pub mod pipeline;
pub mod session;

pub use controller::{CaptureStep, SessionController};
pub use gateway::{IdentityGateway, PersistenceGateway};
pub use ledger::{AttendanceRecord, Ledger};
pub use memory::{MemoryGateway, MemoryIdentity};
pub use messages::StatusMessages;
pub use pipeline::{Decision, consumed_nonce, decide};
pub use session::{Course, Session, default_catalog};
