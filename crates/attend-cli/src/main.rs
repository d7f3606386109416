//! Scripted demo of the attendance capture stack.
//!
//! Wires the session controller to an in-memory SQLite database and the
//! mock capture devices, then walks one camera session and one device
//! session end to end, printing every decision. Run with
//! `RUST_LOG=debug` for the adapter lifecycle logs.

use anyhow::Result;
use attend_capture::devices::{AnyFrameSource, AnyKeystrokePeripheral};
use attend_capture::mock::{MockCamera, MockWedge};
use attend_capture::FrameScanConfig;
use attend_core::CourseId;
use attend_engine::{Decision, SessionController, StatusMessages};
use attend_storage::{Database, SqliteIdentityGateway, SqlitePersistenceGateway};
use attend_token::{AttendanceToken, encode};
use chrono::Utc;
use std::time::Duration;
use tracing::info;

const LECTURER: &str = "lecturer@example.edu";
const SECRET: &str = "correct-horse";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let db = Database::in_memory().await?;
    let identity = SqliteIdentityGateway::new(db.pool().clone());
    identity.register(LECTURER, SECRET, "Dr. Example").await?;

    let gateway = SqlitePersistenceGateway::new(db.pool().clone());
    let mut controller = SessionController::new(gateway, identity);

    controller.login(LECTURER, SECRET).await?;
    let course_id = CourseId::new("CS-404")?;
    controller.select_course(&course_id)?;
    controller.open_session_setup()?;
    let session = controller
        .start_session("Lecture: Network Security", "Demo run", Utc::now().date_naive())
        .await?;
    info!(session = %session.session_id, "session started");

    run_camera_round(&mut controller).await?;
    run_device_round(&mut controller).await?;

    // Side path: what the durable store saw.
    controller.back().await?; // ModeSelection -> CourseDashboard
    let history = controller.view_history().await?;
    println!("\nStored sessions for {course_id}: {}", history.len());
    for past in &history {
        let records = controller.session_details(&past.session_id).await?;
        println!("  {} - {} marks", past.name, records.len());
    }

    controller.logout().await?;
    db.close().await;
    Ok(())
}

/// One camera round: a valid token, a replay of it, a burst inside the
/// cooldown, and a wrong-course token.
async fn run_camera_round(
    controller: &mut SessionController<SqlitePersistenceGateway, SqliteIdentityGateway>,
) -> Result<()> {
    println!("== Camera capture ==");

    let (camera, handle) = MockCamera::new();
    controller.enter_camera_capture_with(
        AnyFrameSource::Mock(camera),
        FrameScanConfig {
            cooldown: Duration::from_millis(150),
            poll_interval: Duration::from_millis(5),
            ..FrameScanConfig::default()
        },
    )?;

    let ada = AttendanceToken::builder("21/0331", "CS-404", "Network Security")
        .subject_name("Ada Lovelace")
        .nonce("nonce-ada-1")
        .build();
    let wrong_course = AttendanceToken::builder("21/0400", "CS-302", "Algorithms II")
        .subject_name("Grace Hopper")
        .nonce("nonce-grace-1")
        .build();

    handle.present_payload(encode(&ada)?);
    report(controller.pump().await?);

    tokio::time::sleep(Duration::from_millis(200)).await;
    handle.present_payload(encode(&ada)?); // same nonce: replay
    report(controller.pump().await?);

    tokio::time::sleep(Duration::from_millis(200)).await;
    handle.present_payload(encode(&wrong_course)?);
    report(controller.pump().await?);

    tokio::time::sleep(Duration::from_millis(200)).await;
    handle.present_payload("not a token at all");
    report(controller.pump().await?);

    controller.back().await?;
    println!("camera released: {}", !controller.is_capture_active());
    Ok(())
}

/// One device round: taps from the peripheral, including a duplicate.
async fn run_device_round(
    controller: &mut SessionController<SqlitePersistenceGateway, SqliteIdentityGateway>,
) -> Result<()> {
    println!("\n== Device capture ==");

    controller.back().await?; // ModeSelection -> CourseDashboard
    controller.open_session_setup()?;
    controller
        .start_session("Lab session", "Device demo", Utc::now().date_naive())
        .await?;

    let (wedge, handle) = MockWedge::new();
    controller.enter_device_capture(AnyKeystrokePeripheral::Mock(wedge))?;

    for line in ["21/0331", " 21/0400 ", "21/0331"] {
        handle.type_line(line).await?;
        report(controller.pump().await?);
        // Keep the arrival-keyed device nonces distinct between taps.
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    print_summary(controller);

    controller.back().await?;
    Ok(())
}

fn report(decision: Option<Decision>) {
    match decision {
        Some(decision) => println!("  -> {}", decision.status_message()),
        None => println!("  -> {}", StatusMessages::DEVICE_WAITING),
    }
}

fn print_summary(
    controller: &SessionController<SqlitePersistenceGateway, SqliteIdentityGateway>,
) {
    println!("\nPresent ({}):", controller.present_count());
    if let Some(ledger) = controller.ledger() {
        for record in ledger.recent() {
            println!(
                "  {} [{}] at {}",
                record.display_label(),
                record.subject_id,
                record.recorded_at.format("%H:%M:%S")
            );
        }
    }
}
