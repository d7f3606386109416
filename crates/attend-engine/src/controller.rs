//! Session controller state machine.
//!
//! Governs lecturer authentication, course and session selection, and which
//! capture adapter is active. The controller exclusively owns the active
//! session and the single live ledger; adapters are started and stopped
//! here and nowhere else, so the ledger never has a concurrent writer.
//!
//! # States
//!
//! `Unauthenticated → CourseSelection → CourseDashboard → SessionSetup →
//! ModeSelection → {CameraCapture | DeviceCapture}`, with `SessionHistory`
//! reachable from the dashboard as a read-only side path. Forward
//! transitions are explicit user actions; "back" is table-driven per state;
//! logout resets to `Unauthenticated` from anywhere, discarding any
//! in-progress session and ledger.
//!
//! Leaving a capture state by any path deactivates the adapter and releases
//! its device before the next state is entered. Dropping the controller
//! cancels a still-running adapter task, which releases the device on its
//! next cancellation check.

use crate::gateway::{IdentityGateway, PersistenceGateway};
use crate::ledger::{AttendanceRecord, Ledger};
use crate::pipeline::{Decision, consumed_nonce, decide};
use crate::session::{Course, Session, default_catalog};
use attend_capture::devices::{AnyFrameSource, AnyKeystrokePeripheral};
use attend_capture::{CaptureEvent, FrameScanConfig, ScanEvent, SessionBinding, frame_scan, keystroke};
use attend_core::{CourseId, Error, Result, SessionId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

/// Screens of the attendance capture flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureStep {
    /// Waiting for lecturer credentials.
    Unauthenticated,

    /// Authenticated; picking a course from the catalog.
    CourseSelection,

    /// Course picked; choosing between a new session and history.
    CourseDashboard,

    /// Browsing past sessions of the selected course (read-only).
    SessionHistory,

    /// Entering metadata for a new session.
    SessionSetup,

    /// Session started; choosing the capture modality.
    ModeSelection,

    /// Frame-scan adapter active.
    CameraCapture,

    /// Keystroke adapter active.
    DeviceCapture,
}

impl fmt::Display for CaptureStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let step = match self {
            CaptureStep::Unauthenticated => "Unauthenticated",
            CaptureStep::CourseSelection => "CourseSelection",
            CaptureStep::CourseDashboard => "CourseDashboard",
            CaptureStep::SessionHistory => "SessionHistory",
            CaptureStep::SessionSetup => "SessionSetup",
            CaptureStep::ModeSelection => "ModeSelection",
            CaptureStep::CameraCapture => "CameraCapture",
            CaptureStep::DeviceCapture => "DeviceCapture",
        };
        write!(f, "{step}")
    }
}

impl CaptureStep {
    /// Check if transition to target state is valid from this state.
    ///
    /// Logout (any state to `Unauthenticated`) is always valid.
    ///
    /// # Examples
    ///
    /// ```
    /// use attend_engine::CaptureStep;
    ///
    /// assert!(CaptureStep::ModeSelection.can_transition_to(&CaptureStep::CameraCapture));
    /// assert!(!CaptureStep::CourseSelection.can_transition_to(&CaptureStep::CameraCapture));
    /// ```
    #[must_use]
    pub fn can_transition_to(&self, target: &CaptureStep) -> bool {
        // Logout resets from anywhere.
        if *target == CaptureStep::Unauthenticated {
            return true;
        }

        matches!(
            (self, target),
            // From Unauthenticated
            (CaptureStep::Unauthenticated, CaptureStep::CourseSelection)
            // From CourseSelection
            | (CaptureStep::CourseSelection, CaptureStep::CourseDashboard)
            // From CourseDashboard
            | (
                CaptureStep::CourseDashboard,
                CaptureStep::SessionSetup
                    | CaptureStep::SessionHistory
                    | CaptureStep::CourseSelection
            )
            // From SessionHistory
            | (CaptureStep::SessionHistory, CaptureStep::CourseDashboard)
            // From SessionSetup
            | (CaptureStep::SessionSetup, CaptureStep::ModeSelection | CaptureStep::CourseDashboard)
            // From ModeSelection
            | (
                CaptureStep::ModeSelection,
                CaptureStep::CameraCapture
                    | CaptureStep::DeviceCapture
                    | CaptureStep::CourseDashboard
            )
            // From capture states
            | (CaptureStep::CameraCapture, CaptureStep::ModeSelection)
            | (CaptureStep::DeviceCapture, CaptureStep::ModeSelection)
        )
    }

    /// Where "back" leads from this state, if anywhere.
    #[must_use]
    pub fn back_target(&self) -> Option<CaptureStep> {
        match self {
            CaptureStep::Unauthenticated => None,
            CaptureStep::CourseSelection => Some(CaptureStep::Unauthenticated),
            CaptureStep::CourseDashboard => Some(CaptureStep::CourseSelection),
            CaptureStep::SessionHistory => Some(CaptureStep::CourseDashboard),
            CaptureStep::SessionSetup => Some(CaptureStep::CourseDashboard),
            CaptureStep::ModeSelection => Some(CaptureStep::CourseDashboard),
            CaptureStep::CameraCapture | CaptureStep::DeviceCapture => {
                Some(CaptureStep::ModeSelection)
            }
        }
    }

    /// Returns `true` for states with an active capture adapter.
    #[must_use]
    pub fn is_capture(&self) -> bool {
        matches!(self, CaptureStep::CameraCapture | CaptureStep::DeviceCapture)
    }
}

/// The active session together with its ledger.
#[derive(Debug)]
struct ActiveCapture {
    session: Session,
    ledger: Ledger,
}

/// Owner of the attendance capture flow.
///
/// Generic over the consumed collaborators so tests run against the
/// in-memory gateways and deployments plug in the SQLite-backed ones.
///
/// # Examples
///
/// ```
/// use attend_engine::{MemoryGateway, MemoryIdentity, SessionController};
///
/// # async fn example() -> attend_core::Result<()> {
/// let identity = MemoryIdentity::new().with_principal("lecturer@example.edu", "secret");
/// let mut controller = SessionController::new(MemoryGateway::new(), identity);
///
/// controller.login("lecturer@example.edu", "secret").await?;
/// controller.select_course(&attend_core::CourseId::new("CS-404")?)?;
/// # Ok(())
/// # }
/// ```
pub struct SessionController<P, I> {
    step: CaptureStep,
    catalog: Vec<Course>,
    persistence: P,
    identity: I,
    lecturer: Option<String>,
    selected_course: Option<Course>,
    active: Option<ActiveCapture>,
    feed: Option<attend_capture::ScanFeed>,
}

impl<P, I> SessionController<P, I>
where
    P: PersistenceGateway,
    I: IdentityGateway,
{
    /// Create a controller with the built-in course catalog.
    pub fn new(persistence: P, identity: I) -> Self {
        Self::with_catalog(persistence, identity, default_catalog())
    }

    /// Create a controller with a custom course catalog.
    pub fn with_catalog(persistence: P, identity: I, catalog: Vec<Course>) -> Self {
        Self {
            step: CaptureStep::Unauthenticated,
            catalog,
            persistence,
            identity,
            lecturer: None,
            selected_course: None,
            active: None,
            feed: None,
        }
    }

    /// Current state.
    #[must_use]
    pub fn step(&self) -> CaptureStep {
        self.step
    }

    /// Authenticated lecturer, if any.
    #[must_use]
    pub fn lecturer(&self) -> Option<&str> {
        self.lecturer.as_deref()
    }

    /// The course catalog.
    #[must_use]
    pub fn courses(&self) -> &[Course] {
        &self.catalog
    }

    /// The currently selected course, if any.
    #[must_use]
    pub fn selected_course(&self) -> Option<&Course> {
        self.selected_course.as_ref()
    }

    /// The active session, if one has been started.
    #[must_use]
    pub fn active_session(&self) -> Option<&Session> {
        self.active.as_ref().map(|a| &a.session)
    }

    /// The active session's ledger, if any.
    #[must_use]
    pub fn ledger(&self) -> Option<&Ledger> {
        self.active.as_ref().map(|a| &a.ledger)
    }

    /// Running "present count" for the active session.
    #[must_use]
    pub fn present_count(&self) -> usize {
        self.ledger().map_or(0, Ledger::len)
    }

    /// Returns `true` while a capture adapter holds its device.
    #[must_use]
    pub fn is_capture_active(&self) -> bool {
        self.feed.as_ref().is_some_and(|f| f.is_active())
    }

    fn transition(&mut self, target: CaptureStep) -> Result<()> {
        if !self.step.can_transition_to(&target) {
            return Err(Error::InvalidStateTransition {
                from: self.step.to_string(),
                to: target.to_string(),
            });
        }
        debug!(from = %self.step, to = %target, "capture step transition");
        self.step = target;
        Ok(())
    }

    /// Authenticate and advance to course selection.
    ///
    /// # Errors
    ///
    /// `Error::Auth` on bad credentials (state unchanged),
    /// `Error::InvalidStateTransition` when not on the login screen.
    pub async fn login(&mut self, principal_id: &str, secret: &str) -> Result<()> {
        if self.step != CaptureStep::Unauthenticated {
            return Err(Error::InvalidStateTransition {
                from: self.step.to_string(),
                to: CaptureStep::CourseSelection.to_string(),
            });
        }
        self.identity.authenticate(principal_id, secret).await?;
        self.lecturer = Some(principal_id.to_string());
        self.transition(CaptureStep::CourseSelection)?;
        info!(lecturer = principal_id, "lecturer authenticated");
        Ok(())
    }

    /// Clear credentials and return to `Unauthenticated`, discarding any
    /// in-progress session and ledger. Valid from any state.
    ///
    /// # Errors
    ///
    /// Propagates `Error::Auth` from the identity gateway; local state is
    /// cleared regardless.
    pub async fn logout(&mut self) -> Result<()> {
        self.deactivate_adapter().await;
        let signout = self.identity.deauthenticate().await;
        self.lecturer = None;
        self.selected_course = None;
        self.active = None;
        self.step = CaptureStep::Unauthenticated;
        info!("lecturer signed out");
        signout
    }

    /// Pick a course from the catalog.
    ///
    /// # Errors
    ///
    /// `Error::Config` for an unknown course,
    /// `Error::InvalidStateTransition` outside course selection.
    pub fn select_course(&mut self, course_id: &CourseId) -> Result<()> {
        let course = self
            .catalog
            .iter()
            .find(|c| &c.course_id == course_id)
            .cloned()
            .ok_or_else(|| Error::Config(format!("Unknown course: {course_id}")))?;
        self.transition(CaptureStep::CourseDashboard)?;
        self.selected_course = Some(course);
        Ok(())
    }

    /// Move from the dashboard to the session metadata form.
    ///
    /// # Errors
    ///
    /// `Error::InvalidStateTransition` outside the dashboard.
    pub fn open_session_setup(&mut self) -> Result<()> {
        self.transition(CaptureStep::SessionSetup)
    }

    /// Start a new session: persist its metadata, replace the ledger, and
    /// advance to mode selection.
    ///
    /// A failed durable write is non-fatal: the session continues in local
    /// mode with a warning.
    ///
    /// # Errors
    ///
    /// `Error::InvalidStateTransition` outside session setup.
    pub async fn start_session(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        date: NaiveDate,
    ) -> Result<&Session> {
        if self.step != CaptureStep::SessionSetup {
            return Err(Error::InvalidStateTransition {
                from: self.step.to_string(),
                to: CaptureStep::ModeSelection.to_string(),
            });
        }
        let course = self
            .selected_course
            .as_ref()
            .ok_or_else(|| Error::Config("No course selected".to_string()))?;

        let session = Session::begin(course, name, description, date, Utc::now());

        if let Err(e) = self.persistence.create_session(&session).await {
            warn!(error = %e, "session sync skipped - local mode active");
        }

        // Starting a new session discards the prior ledger (and its nonce
        // set) entirely.
        self.active = Some(ActiveCapture {
            session,
            ledger: Ledger::new(),
        });
        self.transition(CaptureStep::ModeSelection)?;

        Ok(&self.active.as_ref().expect("just set").session)
    }

    /// Activate the frame-scan adapter and enter camera capture.
    ///
    /// # Errors
    ///
    /// `Error::InvalidStateTransition` outside mode selection.
    pub fn enter_camera_capture(&mut self, source: AnyFrameSource) -> Result<()> {
        self.enter_camera_capture_with(source, FrameScanConfig::default())
    }

    /// Activate the frame-scan adapter with a custom configuration.
    ///
    /// # Errors
    ///
    /// `Error::InvalidStateTransition` outside mode selection.
    pub fn enter_camera_capture_with(
        &mut self,
        source: AnyFrameSource,
        config: FrameScanConfig,
    ) -> Result<()> {
        self.transition(CaptureStep::CameraCapture)?;
        self.feed = Some(frame_scan::activate(source, config));
        Ok(())
    }

    /// Activate the keystroke adapter and enter device capture.
    ///
    /// The adapter is bound to the active session's course so bare
    /// identifiers become complete synthetic tokens.
    ///
    /// # Errors
    ///
    /// `Error::InvalidStateTransition` outside mode selection.
    pub fn enter_device_capture(&mut self, peripheral: AnyKeystrokePeripheral) -> Result<()> {
        let binding = self.active.as_ref().map(|a| {
            SessionBinding::new(
                a.session.course_id.as_str(),
                self.selected_course
                    .as_ref()
                    .map(|c| c.name.as_str())
                    .unwrap_or_default(),
            )
        });
        self.transition(CaptureStep::DeviceCapture)?;
        self.feed = Some(keystroke::activate(peripheral, binding));
        Ok(())
    }

    /// Table-driven back navigation.
    ///
    /// Leaving a capture state first deactivates the adapter (waiting for
    /// its device to be released) and clears the ledger's visible record
    /// list, then returns to mode selection.
    ///
    /// # Errors
    ///
    /// `Error::InvalidStateTransition` when there is nowhere to go back to.
    pub async fn back(&mut self) -> Result<CaptureStep> {
        let Some(target) = self.step.back_target() else {
            return Err(Error::InvalidStateTransition {
                from: self.step.to_string(),
                to: "back".to_string(),
            });
        };

        if self.step.is_capture() {
            self.deactivate_adapter().await;
            if let Some(active) = &mut self.active {
                active.ledger.clear_records();
            }
        }

        self.transition(target)?;
        Ok(target)
    }

    /// Browse the selected course's past sessions (read-only side path).
    ///
    /// # Errors
    ///
    /// `Error::InvalidStateTransition` outside the dashboard,
    /// `Error::Persistence` when the query fails.
    pub async fn view_history(&mut self) -> Result<Vec<Session>> {
        let course = self
            .selected_course
            .as_ref()
            .ok_or_else(|| Error::Config("No course selected".to_string()))?
            .course_id
            .clone();
        self.transition(CaptureStep::SessionHistory)?;
        self.persistence.list_sessions(&course).await
    }

    /// Load the stored attendance for one past session (details overlay;
    /// no step change).
    ///
    /// # Errors
    ///
    /// `Error::Persistence` when the query fails.
    pub async fn session_details(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<AttendanceRecord>> {
        self.persistence.list_attendance(session_id).await
    }

    /// Evaluate one scan event against the active session and commit on
    /// acceptance.
    ///
    /// The ledger is updated before the durable write; a failed write
    /// yields [`Decision::RejectedPersistenceFailure`] but the in-memory
    /// commit stands, so the subject cannot be marked twice by re-scanning.
    ///
    /// # Errors
    ///
    /// `Error::Config` when no session is active.
    pub async fn process_scan(
        &mut self,
        event: &ScanEvent,
        received_at: DateTime<Utc>,
    ) -> Result<Decision> {
        let active = self
            .active
            .as_mut()
            .ok_or_else(|| Error::Config("No active session".to_string()))?;

        let record = match decide(event, received_at, &active.session, &active.ledger) {
            Decision::Accepted(record) => record,
            rejected => {
                debug!(?rejected, "scan rejected");
                return Ok(rejected);
            }
        };

        // decide() only accepts events with a usable nonce.
        let Some(nonce) = consumed_nonce(event, received_at) else {
            return Ok(Decision::RejectedMalformed);
        };

        // Local-first: the ledger mutation is not rolled back on a failed
        // durable write.
        active.ledger.commit(record.clone(), nonce.clone());

        if let Err(e) = self
            .persistence
            .append_attendance(&active.session.session_id, &record, &nonce)
            .await
        {
            warn!(error = %e, subject = %record.subject_id, "durable write failed, local mark stands");
            return Ok(Decision::RejectedPersistenceFailure);
        }

        info!(subject = %record.subject_id, count = active.ledger.len(), "attendance recorded");
        Ok(Decision::Accepted(record))
    }

    /// Receive the next event from the active adapter and process it.
    ///
    /// Returns `Ok(None)` when the adapter has terminated and its feed is
    /// drained.
    ///
    /// # Errors
    ///
    /// `Error::Config` when no adapter is active,
    /// `Error::CaptureAcquisition` when the adapter reports a fault.
    pub async fn pump(&mut self) -> Result<Option<Decision>> {
        let Some(feed) = self.feed.as_mut() else {
            return Err(Error::Config("No active capture adapter".to_string()));
        };

        match feed.recv().await {
            None => Ok(None),
            Some(CaptureEvent::Fault { adapter, error }) => {
                Err(Error::CaptureAcquisition(format!("{adapter}: {error}")))
            }
            Some(CaptureEvent::Malformed { error }) => {
                debug!(%error, "undecodable payload");
                Ok(Some(Decision::RejectedMalformed))
            }
            Some(CaptureEvent::Scan { event, received_at }) => {
                Ok(Some(self.process_scan(&event, received_at).await?))
            }
        }
    }

    async fn deactivate_adapter(&mut self) {
        if let Some(feed) = self.feed.take() {
            feed.stop().await;
            debug!("capture adapter deactivated");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryGateway, MemoryIdentity};
    use attend_capture::mock::{MockCamera, MockWedge};
    use attend_token::{AttendanceToken, encode};
    use std::time::Duration;

    fn identity() -> MemoryIdentity {
        MemoryIdentity::new().with_principal("lecturer@example.edu", "hunter2")
    }

    async fn controller_at_mode_selection()
    -> SessionController<MemoryGateway, MemoryIdentity> {
        let mut controller = SessionController::new(MemoryGateway::new(), identity());
        controller
            .login("lecturer@example.edu", "hunter2")
            .await
            .unwrap();
        controller
            .select_course(&CourseId::new("CS-404").unwrap())
            .unwrap();
        controller.open_session_setup().unwrap();
        controller
            .start_session("Lecture: Network Security", "", Utc::now().date_naive())
            .await
            .unwrap();
        controller
    }

    fn token(subject: &str, course: &str, nonce: &str) -> AttendanceToken {
        AttendanceToken::builder(subject, course, "Network Security")
            .nonce(nonce)
            .build()
    }

    fn scan(subject: &str, course: &str, nonce: &str) -> ScanEvent {
        ScanEvent::TokenScan {
            token: token(subject, course, nonce),
        }
    }

    #[tokio::test]
    async fn test_login_bad_credentials_keeps_state() {
        let mut controller = SessionController::new(MemoryGateway::new(), identity());

        let result = controller.login("lecturer@example.edu", "wrong").await;
        assert!(matches!(result, Err(Error::Auth(_))));
        assert_eq!(controller.step(), CaptureStep::Unauthenticated);
        assert_eq!(controller.lecturer(), None);
    }

    #[tokio::test]
    async fn test_forward_flow_to_capture() {
        let mut controller = controller_at_mode_selection().await;
        assert_eq!(controller.step(), CaptureStep::ModeSelection);
        assert!(controller.active_session().is_some());

        let (camera, _handle) = MockCamera::new();
        controller
            .enter_camera_capture(AnyFrameSource::Mock(camera))
            .unwrap();
        assert_eq!(controller.step(), CaptureStep::CameraCapture);
    }

    #[tokio::test]
    async fn test_skipping_states_is_rejected() {
        let mut controller = SessionController::new(MemoryGateway::new(), identity());
        controller
            .login("lecturer@example.edu", "hunter2")
            .await
            .unwrap();

        // No course selected yet: session setup is unreachable.
        assert!(matches!(
            controller.open_session_setup(),
            Err(Error::InvalidStateTransition { .. })
        ));

        let (camera, _handle) = MockCamera::new();
        assert!(matches!(
            controller.enter_camera_capture(AnyFrameSource::Mock(camera)),
            Err(Error::InvalidStateTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_accept_then_replay_then_duplicate() {
        let mut controller = controller_at_mode_selection().await;
        let at = Utc::now();

        let first = controller
            .process_scan(&scan("S1", "CS-404", "n1"), at)
            .await
            .unwrap();
        assert!(first.is_accepted());

        let replay = controller
            .process_scan(&scan("S1", "CS-404", "n1"), at)
            .await
            .unwrap();
        assert_eq!(replay, Decision::RejectedReplay);

        let duplicate = controller
            .process_scan(&scan("S1", "CS-404", "n2"), at)
            .await
            .unwrap();
        assert_eq!(duplicate, Decision::RejectedDuplicate);

        assert_eq!(controller.present_count(), 1);
    }

    #[tokio::test]
    async fn test_wrong_course_never_accepted() {
        let mut controller = controller_at_mode_selection().await;

        let decision = controller
            .process_scan(&scan("S1", "CS-302", "n1"), Utc::now())
            .await
            .unwrap();
        assert_eq!(decision, Decision::RejectedWrongCourse);
        assert_eq!(controller.present_count(), 0);
    }

    #[tokio::test]
    async fn test_persistence_failure_keeps_local_mark() {
        let gateway = MemoryGateway::new();
        gateway.fail_next_appends(1);

        let mut controller =
            SessionController::new(gateway.clone(), identity());
        controller
            .login("lecturer@example.edu", "hunter2")
            .await
            .unwrap();
        controller
            .select_course(&CourseId::new("CS-404").unwrap())
            .unwrap();
        controller.open_session_setup().unwrap();
        controller
            .start_session("Lecture", "", Utc::now().date_naive())
            .await
            .unwrap();

        let at = Utc::now();
        let decision = controller
            .process_scan(&scan("S1", "CS-404", "n1"), at)
            .await
            .unwrap();
        assert_eq!(decision, Decision::RejectedPersistenceFailure);

        // Losing the durable write must not let the person be marked twice.
        assert_eq!(controller.present_count(), 1);
        let rescan = controller
            .process_scan(&scan("S1", "CS-404", "n2"), at)
            .await
            .unwrap();
        assert_eq!(rescan, Decision::RejectedDuplicate);
    }

    #[tokio::test]
    async fn test_back_from_camera_releases_device_and_clears_view() {
        let mut controller = controller_at_mode_selection().await;

        let decision = controller
            .process_scan(&scan("S1", "CS-404", "n1"), Utc::now())
            .await
            .unwrap();
        assert!(decision.is_accepted());

        let (camera, camera_handle) = MockCamera::new();
        controller
            .enter_camera_capture(AnyFrameSource::Mock(camera))
            .unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(controller.is_capture_active());
        assert!(camera_handle.is_acquired());

        let target = controller.back().await.unwrap();
        assert_eq!(target, CaptureStep::ModeSelection);
        assert!(!controller.is_capture_active());
        assert!(!camera_handle.is_acquired());

        // Visible list cleared, replay protection intact.
        assert_eq!(controller.present_count(), 0);
        let replay = controller
            .process_scan(&scan("S2", "CS-404", "n1"), Utc::now())
            .await
            .unwrap();
        assert_eq!(replay, Decision::RejectedReplay);
    }

    #[tokio::test]
    async fn test_logout_from_capture_releases_and_resets() {
        let mut controller = controller_at_mode_selection().await;

        let (camera, camera_handle) = MockCamera::new();
        controller
            .enter_camera_capture(AnyFrameSource::Mock(camera))
            .unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        controller.logout().await.unwrap();
        assert_eq!(controller.step(), CaptureStep::Unauthenticated);
        assert!(!camera_handle.is_acquired());
        assert!(controller.active_session().is_none());
        assert_eq!(controller.lecturer(), None);
    }

    #[tokio::test]
    async fn test_new_session_resets_replay_and_duplicate_state() {
        let mut controller = controller_at_mode_selection().await;
        let at = Utc::now();

        controller
            .process_scan(&scan("S1", "CS-404", "n1"), at)
            .await
            .unwrap();

        // Back out to the dashboard and start a fresh session.
        controller.back().await.unwrap(); // ModeSelection -> CourseDashboard
        controller.open_session_setup().unwrap();
        controller
            .start_session("Lecture 2", "", at.date_naive())
            .await
            .unwrap();

        // Same nonce and subject, fresh session: accepted.
        let decision = controller
            .process_scan(&scan("S1", "CS-404", "n1"), at)
            .await
            .unwrap();
        assert!(decision.is_accepted());
    }

    #[tokio::test]
    async fn test_pump_camera_events_end_to_end() {
        let mut controller = controller_at_mode_selection().await;

        let (camera, camera_handle) = MockCamera::new();
        controller
            .enter_camera_capture_with(
                AnyFrameSource::Mock(camera),
                FrameScanConfig {
                    poll_interval: Duration::from_millis(1),
                    cooldown: Duration::from_millis(20),
                    restart_delay: Duration::from_millis(1),
                    channel_capacity: 8,
                },
            )
            .unwrap();

        camera_handle.present_payload(encode(&token("S1", "CS-404", "n1")).unwrap());
        let decision = controller.pump().await.unwrap().unwrap();
        assert!(decision.is_accepted());

        tokio::time::sleep(Duration::from_millis(30)).await;
        camera_handle.present_payload("garbage");
        let decision = controller.pump().await.unwrap().unwrap();
        assert_eq!(decision, Decision::RejectedMalformed);

        controller.back().await.unwrap();
    }

    #[tokio::test]
    async fn test_pump_device_events_normalize_before_checks() {
        let mut controller = controller_at_mode_selection().await;

        let (wedge, wedge_handle) = MockWedge::new();
        controller
            .enter_device_capture(AnyKeystrokePeripheral::Mock(wedge))
            .unwrap();

        wedge_handle.type_line(" s1 ").await.unwrap();
        let decision = controller.pump().await.unwrap().unwrap();
        match decision {
            Decision::Accepted(record) => assert_eq!(record.subject_id.as_str(), "S1"),
            other => panic!("Expected acceptance, got {other:?}"),
        }

        // The same person, typed differently, is a duplicate. The pause
        // keeps the two arrival-keyed device nonces distinct.
        tokio::time::sleep(Duration::from_millis(5)).await;
        wedge_handle.type_line("S1").await.unwrap();
        let decision = controller.pump().await.unwrap().unwrap();
        assert_eq!(decision, Decision::RejectedDuplicate);

        controller.back().await.unwrap();
    }

    #[tokio::test]
    async fn test_history_side_path() {
        let gateway = MemoryGateway::new();
        let mut controller = SessionController::new(gateway, identity());
        controller
            .login("lecturer@example.edu", "hunter2")
            .await
            .unwrap();
        controller
            .select_course(&CourseId::new("CS-404").unwrap())
            .unwrap();
        controller.open_session_setup().unwrap();
        let session_id = controller
            .start_session("Lecture", "", Utc::now().date_naive())
            .await
            .unwrap()
            .session_id
            .clone();
        controller
            .process_scan(&scan("S1", "CS-404", "n1"), Utc::now())
            .await
            .unwrap();

        // ModeSelection -> CourseDashboard -> SessionHistory
        controller.back().await.unwrap();
        let sessions = controller.view_history().await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].session_id, session_id);

        let records = controller.session_details(&session_id).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].subject_id.as_str(), "S1");

        // Back out of history.
        let target = controller.back().await.unwrap();
        assert_eq!(target, CaptureStep::CourseDashboard);
    }

    #[test]
    fn test_back_table_is_total_except_login() {
        assert_eq!(CaptureStep::Unauthenticated.back_target(), None);
        assert_eq!(
            CaptureStep::CameraCapture.back_target(),
            Some(CaptureStep::ModeSelection)
        );
        assert_eq!(
            CaptureStep::DeviceCapture.back_target(),
            Some(CaptureStep::ModeSelection)
        );
        assert_eq!(
            CaptureStep::SessionHistory.back_target(),
            Some(CaptureStep::CourseDashboard)
        );
    }

    #[test]
    fn test_logout_allowed_from_every_state() {
        for step in [
            CaptureStep::Unauthenticated,
            CaptureStep::CourseSelection,
            CaptureStep::CourseDashboard,
            CaptureStep::SessionHistory,
            CaptureStep::SessionSetup,
            CaptureStep::ModeSelection,
            CaptureStep::CameraCapture,
            CaptureStep::DeviceCapture,
        ] {
            assert!(step.can_transition_to(&CaptureStep::Unauthenticated));
        }
    }

    #[test]
    fn test_capture_states_unreachable_without_mode_selection() {
        for step in [
            CaptureStep::Unauthenticated,
            CaptureStep::CourseSelection,
            CaptureStep::CourseDashboard,
            CaptureStep::SessionHistory,
            CaptureStep::SessionSetup,
        ] {
            assert!(!step.can_transition_to(&CaptureStep::CameraCapture));
            assert!(!step.can_transition_to(&CaptureStep::DeviceCapture));
        }
    }

    #[test]
    fn test_step_serialization() {
        let step = CaptureStep::CameraCapture;
        let serialized = serde_json::to_string(&step).unwrap();
        assert_eq!(serialized, "\"camera_capture\"");

        let deserialized: CaptureStep = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, step);
    }
}
