//! End-to-end attendance capture flows: login through capture, both
//! adapters, rejection classes, and session lifecycle resets.

use attend_capture::devices::{AnyFrameSource, AnyKeystrokePeripheral};
use attend_capture::mock::{MockCamera, MockWedge};
use attend_capture::{FrameScanConfig, ScanEvent};
use attend_core::CourseId;
use attend_engine::{
    CaptureStep, Decision, MemoryGateway, MemoryIdentity, SessionController,
};
use attend_token::{AttendanceToken, encode};
use chrono::Utc;
use std::time::Duration;

fn token(subject: &str, course: &str, nonce: &str) -> AttendanceToken {
    AttendanceToken::builder(subject, course, "Network Security")
        .subject_name(format!("Student {subject}"))
        .nonce(nonce)
        .build()
}

fn fast_camera_config() -> FrameScanConfig {
    FrameScanConfig {
        poll_interval: Duration::from_millis(1),
        cooldown: Duration::from_millis(20),
        restart_delay: Duration::from_millis(1),
        channel_capacity: 16,
    }
}

async fn authenticated_controller(
    gateway: MemoryGateway,
) -> SessionController<MemoryGateway, MemoryIdentity> {
    let identity = MemoryIdentity::new().with_principal("lecturer@example.edu", "hunter2");
    let mut controller = SessionController::new(gateway, identity);
    controller
        .login("lecturer@example.edu", "hunter2")
        .await
        .unwrap();
    controller
}

#[tokio::test]
async fn camera_flow_accepts_and_persists() {
    let gateway = MemoryGateway::new();
    let mut controller = authenticated_controller(gateway.clone()).await;

    controller
        .select_course(&CourseId::new("CS-404").unwrap())
        .unwrap();
    controller.open_session_setup().unwrap();
    let session_id = controller
        .start_session("Lecture: Network Security", "Week 7", Utc::now().date_naive())
        .await
        .unwrap()
        .session_id
        .clone();

    let (camera, camera_handle) = MockCamera::new();
    controller
        .enter_camera_capture_with(AnyFrameSource::Mock(camera), fast_camera_config())
        .unwrap();

    camera_handle.present_payload(encode(&token("S1", "CS-404", "n1")).unwrap());
    let decision = controller.pump().await.unwrap().unwrap();
    assert!(decision.is_accepted());
    assert_eq!(controller.present_count(), 1);

    // Durable copy landed too.
    assert_eq!(gateway.stored_count(&session_id), 1);

    controller.back().await.unwrap();
    assert_eq!(controller.step(), CaptureStep::ModeSelection);
}

#[tokio::test]
async fn replayed_token_is_rejected_once_accepted() {
    let gateway = MemoryGateway::new();
    let mut controller = authenticated_controller(gateway).await;

    controller
        .select_course(&CourseId::new("CS-404").unwrap())
        .unwrap();
    controller.open_session_setup().unwrap();
    controller
        .start_session("Lecture", "", Utc::now().date_naive())
        .await
        .unwrap();

    let (camera, camera_handle) = MockCamera::new();
    controller
        .enter_camera_capture_with(AnyFrameSource::Mock(camera), fast_camera_config())
        .unwrap();

    let wire = encode(&token("S1", "CS-404", "n1")).unwrap();
    camera_handle.present_payload(wire.clone());
    assert!(controller.pump().await.unwrap().unwrap().is_accepted());

    // Past the adapter cooldown, the same physical code again.
    tokio::time::sleep(Duration::from_millis(30)).await;
    camera_handle.present_payload(wire);
    assert_eq!(
        controller.pump().await.unwrap().unwrap(),
        Decision::RejectedReplay
    );

    assert_eq!(controller.present_count(), 1);
    controller.back().await.unwrap();
}

#[tokio::test]
async fn cross_course_token_is_rejected() {
    let gateway = MemoryGateway::new();
    let mut controller = authenticated_controller(gateway).await;

    controller
        .select_course(&CourseId::new("CS-404").unwrap())
        .unwrap();
    controller.open_session_setup().unwrap();
    controller
        .start_session("Lecture", "", Utc::now().date_naive())
        .await
        .unwrap();

    // Fresh nonce and subject, wrong course.
    let event = ScanEvent::TokenScan {
        token: token("S9", "CS-302", "n9"),
    };
    let decision = controller.process_scan(&event, Utc::now()).await.unwrap();
    assert_eq!(decision, Decision::RejectedWrongCourse);
    assert_eq!(controller.present_count(), 0);
}

#[tokio::test]
async fn device_flow_normalizes_and_suppresses_duplicates() {
    let gateway = MemoryGateway::new();
    let mut controller = authenticated_controller(gateway).await;

    controller
        .select_course(&CourseId::new("CS-404").unwrap())
        .unwrap();
    controller.open_session_setup().unwrap();
    controller
        .start_session("Lab session", "", Utc::now().date_naive())
        .await
        .unwrap();

    let (wedge, wedge_handle) = MockWedge::new();
    controller
        .enter_device_capture(AnyKeystrokePeripheral::Mock(wedge))
        .unwrap();

    // Lowercase with stray whitespace normalizes before any check.
    wedge_handle.type_line(" s1 ").await.unwrap();
    match controller.pump().await.unwrap().unwrap() {
        Decision::Accepted(record) => assert_eq!(record.subject_id.as_str(), "S1"),
        other => panic!("Expected acceptance, got {other:?}"),
    }

    // Pauses keep the arrival-keyed device nonces distinct.
    tokio::time::sleep(Duration::from_millis(5)).await;
    wedge_handle.type_line("S1").await.unwrap();
    assert_eq!(
        controller.pump().await.unwrap().unwrap(),
        Decision::RejectedDuplicate
    );

    // A different subject still goes through.
    tokio::time::sleep(Duration::from_millis(5)).await;
    wedge_handle.type_line("s2").await.unwrap();
    assert!(controller.pump().await.unwrap().unwrap().is_accepted());
    assert_eq!(controller.present_count(), 2);

    controller.back().await.unwrap();
}

#[tokio::test]
async fn fresh_session_clears_replay_and_duplicate_state() {
    let gateway = MemoryGateway::new();
    let mut controller = authenticated_controller(gateway).await;

    controller
        .select_course(&CourseId::new("CS-404").unwrap())
        .unwrap();
    controller.open_session_setup().unwrap();
    controller
        .start_session("Session A", "", Utc::now().date_naive())
        .await
        .unwrap();

    let event = ScanEvent::TokenScan {
        token: token("S1", "CS-404", "n1"),
    };
    let at = Utc::now();
    assert!(controller.process_scan(&event, at).await.unwrap().is_accepted());
    assert_eq!(
        controller.process_scan(&event, at).await.unwrap(),
        Decision::RejectedReplay
    );

    // Session B: the same subject/nonce pair must be accepted again.
    controller.back().await.unwrap();
    controller.open_session_setup().unwrap();
    controller
        .start_session("Session B", "", at.date_naive())
        .await
        .unwrap();

    assert!(controller.process_scan(&event, at).await.unwrap().is_accepted());
}

#[tokio::test]
async fn camera_released_on_logout_mid_capture() {
    let gateway = MemoryGateway::new();
    let mut controller = authenticated_controller(gateway).await;

    controller
        .select_course(&CourseId::new("CS-404").unwrap())
        .unwrap();
    controller.open_session_setup().unwrap();
    controller
        .start_session("Lecture", "", Utc::now().date_naive())
        .await
        .unwrap();

    let (camera, camera_handle) = MockCamera::new();
    controller
        .enter_camera_capture_with(AnyFrameSource::Mock(camera), fast_camera_config())
        .unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(camera_handle.is_acquired());

    // Abrupt navigation away, not the happy-path back action.
    controller.logout().await.unwrap();
    assert!(!camera_handle.is_acquired());
    assert!(!controller.is_capture_active());
    assert_eq!(controller.step(), CaptureStep::Unauthenticated);
}

#[tokio::test]
async fn history_reflects_previous_sessions_most_recent_first() {
    let gateway = MemoryGateway::new();
    let mut controller = authenticated_controller(gateway).await;

    controller
        .select_course(&CourseId::new("CS-404").unwrap())
        .unwrap();

    for name in ["Week 1", "Week 2"] {
        controller.open_session_setup().unwrap();
        controller
            .start_session(name, "", Utc::now().date_naive())
            .await
            .unwrap();
        controller.back().await.unwrap(); // ModeSelection -> CourseDashboard
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    let sessions = controller.view_history().await.unwrap();
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0].name, "Week 2");
    assert_eq!(sessions[1].name, "Week 1");
}
