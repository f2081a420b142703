//! Startup version announcement

use garagelib_bot::db;
use garagelib_bot::services::announce_version;
use garagelib_bot::transport::RecordingTransport;
use garagelib_common::db::init_memory_database;
use std::time::Duration;

#[tokio::test]
async fn version_is_announced_once() {
    let pool = init_memory_database().await.unwrap();
    let transport = RecordingTransport::new();
    db::add_user(&pool, 1, "Ann").await.unwrap();
    db::add_user(&pool, 2, "Max").await.unwrap();

    let first = announce_version(&pool, &transport, "v1.2", Some("Artist cards"), Duration::ZERO)
        .await
        .unwrap();
    let second = announce_version(&pool, &transport, "v1.2", Some("Artist cards"), Duration::ZERO)
        .await
        .unwrap();

    let report = first.expect("first run announces");
    assert_eq!(report.attempted, 2);
    assert!(report.failed.is_empty());
    assert!(second.is_none());
    assert_eq!(transport.texts_to(1).await.len(), 1);
    assert_eq!(
        db::get_stored_bot_version(&pool).await.unwrap().as_deref(),
        Some("v1.2")
    );
}

#[tokio::test]
async fn new_version_is_announced_again() {
    let pool = init_memory_database().await.unwrap();
    let transport = RecordingTransport::new();
    db::add_user(&pool, 1, "Ann").await.unwrap();

    announce_version(&pool, &transport, "v1.2", None, Duration::ZERO).await.unwrap();
    let next = announce_version(&pool, &transport, "v1.3", None, Duration::ZERO)
        .await
        .unwrap();

    assert!(next.is_some());
    assert_eq!(
        transport.texts_to(1).await,
        vec![
            "🆕 GarageLib has been updated to v1.2.".to_string(),
            "🆕 GarageLib has been updated to v1.3.".to_string(),
        ]
    );
}

#[tokio::test]
async fn blocked_user_is_reported_not_fatal() {
    let pool = init_memory_database().await.unwrap();
    let transport = RecordingTransport::new().with_failing_chats([2]);
    for id in [1, 2, 3] {
        db::add_user(&pool, id, "listener").await.unwrap();
    }

    let report = announce_version(&pool, &transport, "v2.0", None, Duration::ZERO)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(report.attempted, 3);
    assert_eq!(report.failed, vec![2]);
    assert_eq!(report.delivered(), 2);
}
