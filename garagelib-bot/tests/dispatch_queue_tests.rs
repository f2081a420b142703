//! Per-user turn ordering

mod helpers;

use garagelib_bot::db;
use garagelib_bot::dispatch::UserQueues;
use helpers::{audio, callback, user, Harness};
use std::time::Duration;

#[tokio::test]
async fn turns_of_one_user_run_in_order() {
    let h = Harness::new().await;
    let queues = UserQueues::new(h.dispatcher.clone());
    let max = user(42, "Max");
    let ann = user(7, "Ann");

    for sender in [&max, &ann] {
        queues.submit(callback(sender, "add_track", format!("cb-a-{}", sender.id))).await;
    }
    for sender in [&max, &ann] {
        queues
            .submit(audio(sender, &format!("file-{}", sender.id), Some("Demo"), None))
            .await;
    }
    for sender in [&max, &ann] {
        queues.submit(callback(sender, "save_personal", format!("cb-s-{}", sender.id))).await;
    }

    queues.close().await;

    for id in [42, 7] {
        let tracks = db::list_user_tracks(&h.pool, id).await.unwrap();
        assert_eq!(tracks.len(), 1, "user {} should have one track", id);
        assert_eq!(tracks[0].title, "Demo");
    }
    assert!(h.sessions.is_empty().await);
    assert_eq!(queues.active_workers().await, 0);
}

#[tokio::test]
async fn idle_worker_retires_and_restarts() {
    let h = Harness::new().await;
    let queues = UserQueues::with_idle_timeout(h.dispatcher.clone(), Duration::from_millis(20));
    let max = user(42, "Max");

    queues.submit(callback(&max, "add_track", "cb-1".to_string())).await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(queues.active_workers().await, 0);

    queues
        .submit(audio(&max, "file-1", Some("Demo"), None))
        .await;
    queues.submit(callback(&max, "save_personal", "cb-2".to_string())).await;
    queues.close().await;

    assert_eq!(db::list_user_tracks(&h.pool, 42).await.unwrap().len(), 1);
}
