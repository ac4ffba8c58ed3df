//! End-to-end tests for the notification channel.
//!
//! Every test spins up an in-process WebSocket server on an ephemeral port,
//! so nothing external needs to be running.

mod support;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;
use spendly_link::{
    ConnectionOptions, ConnectionState, EventHandlers, NotificationClient, NotificationKind,
    StaticSession,
};
use support::{wait_for_snapshot, MockServer};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

const FAST_RECONNECT_MS: u64 = 100;

fn options(server: &MockServer) -> ConnectionOptions {
    ConnectionOptions::new()
        .with_endpoint(server.url())
        .with_reconnect_delay_ms(FAST_RECONNECT_MS)
        .with_connection_timeout_ms(2_000)
}

fn client_for(server: &MockServer, username: &str) -> NotificationClient {
    NotificationClient::builder()
        .connection_options(options(server))
        .username(username)
        .build()
        .expect("build client")
}

#[tokio::test]
async fn test_register_frame_sent_on_open() {
    let mut server = MockServer::start().await;
    let client = client_for(&server, "alice");
    let mut feed = client.subscribe();

    assert!(client.connect().unwrap());

    let mut conn = server.accept().await;
    assert_eq!(conn.expect_register().await, "alice");

    let snapshot = wait_for_snapshot(&mut feed, |s| s.is_connected()).await;
    assert_eq!(snapshot.connection_state, ConnectionState::Connected);
    assert!(snapshot.is_empty());

    client.shutdown().await;
}

#[tokio::test]
async fn test_ack_does_not_touch_store() {
    let mut server = MockServer::start().await;
    let client = client_for(&server, "alice");
    client.connect().unwrap();

    let mut conn = server.accept().await;
    conn.expect_register().await;
    conn.send_ack().await;
    // A marker event right after the ack proves the ack was processed first
    conn.send_json(json!({"type": "GENERAL", "title": "marker", "message": ""})).await;

    let mut feed = client.subscribe();
    let snapshot = wait_for_snapshot(&mut feed, |s| !s.is_empty()).await;
    assert_eq!(snapshot.notifications.len(), 1);
    assert_eq!(snapshot.notifications[0].title, "marker");

    client.shutdown().await;
}

#[tokio::test]
async fn test_event_becomes_unread_notification_and_toast() {
    let mut server = MockServer::start().await;
    let client = NotificationClient::builder()
        .connection_options(options(&server).with_toast_duration_ms(200))
        .username("alice")
        .build()
        .unwrap();
    let mut feed = client.subscribe();
    client.connect().unwrap();

    let mut conn = server.accept().await;
    conn.expect_register().await;
    conn.send_json(json!({
        "type": "GOAL_ACHIEVED",
        "title": "Goal reached",
        "message": "Emergency fund is full",
        "username": "alice",
        "timestamp": "2025-06-01T12:00:00Z"
    }))
    .await;

    let snapshot = wait_for_snapshot(&mut feed, |s| s.unread_count == 1).await;
    let n = &snapshot.notifications[0];
    assert_eq!(n.kind, NotificationKind::GoalAchieved);
    assert_eq!(n.title, "Goal reached");
    assert!(!n.read);
    assert_eq!(n.server_timestamp(), Some("2025-06-01T12:00:00Z"));
    assert_eq!(snapshot.current_toast.as_ref().map(|t| t.id), Some(n.id));

    // Toast goes away on its own, the notification stays
    let snapshot = wait_for_snapshot(&mut feed, |s| s.current_toast.is_none()).await;
    assert_eq!(snapshot.unread_count, 1);

    client.shutdown().await;
}

#[tokio::test]
async fn test_events_are_newest_first_and_store_ops_apply() {
    let mut server = MockServer::start().await;
    let client = client_for(&server, "alice");
    let mut feed = client.subscribe();
    client.connect().unwrap();

    let mut conn = server.accept().await;
    conn.expect_register().await;
    for title in ["first", "second", "third"] {
        conn.send_json(json!({"type": "BUDGET_EXCEEDED", "title": title, "message": "over"}))
            .await;
    }

    let snapshot = wait_for_snapshot(&mut feed, |s| s.notifications.len() == 3).await;
    let titles: Vec<_> = snapshot.notifications.iter().map(|n| n.title.as_str()).collect();
    assert_eq!(titles, ["third", "second", "first"]);
    assert_eq!(snapshot.current_toast.as_ref().map(|t| t.title.as_str()), Some("third"));

    let middle = snapshot.notifications[1].id;
    assert!(client.mark_as_read(middle));
    assert!(!client.mark_as_read(middle));
    assert_eq!(client.unread_count(), 2);

    assert!(client.clear_all());
    assert_eq!(client.unread_count(), 0);
    assert!(client.notifications().is_empty());

    client.shutdown().await;
}

#[tokio::test]
async fn test_malformed_frame_is_ignored() {
    let errors = Arc::new(AtomicUsize::new(0));
    let errors_seen = errors.clone();

    let mut server = MockServer::start().await;
    let client = NotificationClient::builder()
        .connection_options(options(&server))
        .username("alice")
        .event_handlers(EventHandlers::new().on_error(move |_| {
            errors_seen.fetch_add(1, Ordering::SeqCst);
        }))
        .build()
        .unwrap();
    let mut feed = client.subscribe();
    client.connect().unwrap();

    let mut conn = server.accept().await;
    conn.expect_register().await;
    conn.send_text("{not json").await;
    conn.send_text("[1,2,3]").await;
    conn.send_json(json!({"title": "no type"})).await;

    let snapshot = wait_for_snapshot(&mut feed, |s| !s.is_empty()).await;
    assert_eq!(snapshot.notifications.len(), 1);
    assert_eq!(snapshot.notifications[0].kind, NotificationKind::General);
    assert!(snapshot.is_connected());
    assert_eq!(errors.load(Ordering::SeqCst), 2);

    client.shutdown().await;
}

#[tokio::test]
async fn test_abnormal_drop_reconnects_after_delay() {
    let mut server = MockServer::start().await;
    let client = client_for(&server, "alice");
    let mut feed = client.subscribe();
    client.connect().unwrap();

    let mut conn = server.accept().await;
    conn.expect_register().await;
    wait_for_snapshot(&mut feed, |s| s.is_connected()).await;

    conn.kill();
    wait_for_snapshot(&mut feed, |s| s.connection_state == ConnectionState::Disconnected).await;

    // Exactly one new channel, and it registers again
    let mut conn = server.accept().await;
    assert_eq!(conn.expect_register().await, "alice");
    wait_for_snapshot(&mut feed, |s| s.is_connected()).await;
    assert!(!server.connects_within(Duration::from_millis(3 * FAST_RECONNECT_MS)).await);

    client.shutdown().await;
}

#[tokio::test]
async fn test_server_error_close_reconnects() {
    let mut server = MockServer::start().await;
    let client = client_for(&server, "alice");
    client.connect().unwrap();

    let mut conn = server.accept().await;
    conn.expect_register().await;
    conn.close_with(CloseCode::Error).await;

    let mut conn = server.accept().await;
    conn.expect_register().await;

    client.shutdown().await;
}

#[tokio::test]
async fn test_normal_server_close_does_not_reconnect() {
    let mut server = MockServer::start().await;
    let client = client_for(&server, "alice");
    let mut feed = client.subscribe();
    client.connect().unwrap();

    let mut conn = server.accept().await;
    conn.expect_register().await;
    wait_for_snapshot(&mut feed, |s| s.is_connected()).await;
    conn.close_with(CloseCode::Normal).await;

    wait_for_snapshot(&mut feed, |s| s.connection_state == ConnectionState::Disconnected).await;
    assert!(!server.connects_within(Duration::from_millis(5 * FAST_RECONNECT_MS)).await);

    client.shutdown().await;
}

#[tokio::test]
async fn test_server_close_gets_close_reply() {
    let mut server = MockServer::start().await;
    let client = client_for(&server, "alice");
    let mut feed = client.subscribe();
    client.connect().unwrap();

    let mut conn = server.accept().await;
    conn.expect_register().await;
    wait_for_snapshot(&mut feed, |s| s.is_connected()).await;

    assert_eq!(conn.close_expecting_reply(CloseCode::Normal).await, Some(1000));
    wait_for_snapshot(&mut feed, |s| s.connection_state == ConnectionState::Disconnected).await;

    client.shutdown().await;
}

#[tokio::test]
async fn test_disconnect_closes_normally_and_never_reconnects() {
    let disconnects = Arc::new(Mutex::new(Vec::new()));
    let seen = disconnects.clone();

    let mut server = MockServer::start().await;
    let client = NotificationClient::builder()
        .connection_options(options(&server))
        .username("alice")
        .event_handlers(EventHandlers::new().on_disconnect(move |reason| {
            seen.lock().unwrap().push(reason.code);
        }))
        .build()
        .unwrap();
    let mut feed = client.subscribe();
    client.connect().unwrap();

    let mut conn = server.accept().await;
    conn.expect_register().await;
    wait_for_snapshot(&mut feed, |s| s.is_connected()).await;

    client.disconnect().await;
    assert_eq!(conn.expect_close().await, Some(1000));
    assert_eq!(client.connection_state(), ConnectionState::Disconnected);
    assert!(!client.is_active());
    assert!(!server.connects_within(Duration::from_millis(5 * FAST_RECONNECT_MS)).await);
    assert_eq!(*disconnects.lock().unwrap(), vec![Some(1000)]);

    // Idempotent
    client.disconnect().await;
}

#[tokio::test]
async fn test_no_username_never_connects() {
    let mut server = MockServer::start().await;
    let client = NotificationClient::builder()
        .connection_options(options(&server))
        .session(Arc::new(StaticSession::anonymous()))
        .build()
        .unwrap();

    assert!(!client.connect().unwrap());
    assert!(!server.connects_within(Duration::from_millis(300)).await);
    assert_eq!(client.connection_state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_connect_twice_keeps_single_channel() {
    let mut server = MockServer::start().await;
    let client = client_for(&server, "alice");
    let mut feed = client.subscribe();
    client.connect().unwrap();

    let mut conn = server.accept().await;
    conn.expect_register().await;
    wait_for_snapshot(&mut feed, |s| s.is_connected()).await;

    assert!(client.connect().unwrap());
    assert!(client.reconnect().unwrap());
    assert!(!server.connects_within(Duration::from_millis(300)).await);

    client.shutdown().await;
}

#[tokio::test]
async fn test_manual_reconnect_skips_delay() {
    let mut server = MockServer::start().await;
    let client = NotificationClient::builder()
        .connection_options(options(&server).with_reconnect_delay_ms(60_000))
        .username("alice")
        .build()
        .unwrap();
    let mut feed = client.subscribe();
    client.connect().unwrap();

    let mut conn = server.accept().await;
    conn.expect_register().await;
    wait_for_snapshot(&mut feed, |s| s.is_connected()).await;

    conn.kill();
    wait_for_snapshot(&mut feed, |s| s.connection_state == ConnectionState::Disconnected).await;
    assert!(client.is_active(), "a reconnect should be pending");

    client.reconnect().unwrap();
    let mut conn = server.accept().await;
    conn.expect_register().await;

    client.shutdown().await;
}

#[tokio::test]
async fn test_sign_out_during_backoff_stops_reconnecting() {
    let session = Arc::new(StaticSession::new("alice"));

    let mut server = MockServer::start().await;
    let client = NotificationClient::builder()
        .connection_options(options(&server))
        .session(session.clone())
        .build()
        .unwrap();
    let mut feed = client.subscribe();
    client.connect().unwrap();

    let mut conn = server.accept().await;
    conn.expect_register().await;
    wait_for_snapshot(&mut feed, |s| s.is_connected()).await;

    session.sign_out();
    conn.kill();

    assert!(!server.connects_within(Duration::from_millis(5 * FAST_RECONNECT_MS)).await);
    assert_eq!(client.connection_state(), ConnectionState::Disconnected);

    // Signing back in and connecting registers the new user
    session.set_username("bob");
    client.connect().unwrap();
    let mut conn = server.accept().await;
    assert_eq!(conn.expect_register().await, "bob");

    client.shutdown().await;
}

#[tokio::test]
async fn test_reconnect_after_sign_out_is_refused() {
    let session = Arc::new(StaticSession::new("alice"));

    let mut server = MockServer::start().await;
    let client = NotificationClient::builder()
        .connection_options(options(&server))
        .session(session.clone())
        .build()
        .unwrap();
    let mut feed = client.subscribe();
    client.connect().unwrap();

    let mut conn = server.accept().await;
    conn.expect_register().await;
    wait_for_snapshot(&mut feed, |s| s.is_connected()).await;

    session.sign_out();
    conn.kill();
    wait_for_snapshot(&mut feed, |s| s.connection_state == ConnectionState::Disconnected).await;

    assert!(!client.connect().unwrap());
    assert!(!client.reconnect().unwrap());
    assert!(!server.connects_within(Duration::from_millis(5 * FAST_RECONNECT_MS)).await);

    client.shutdown().await;
}

#[tokio::test]
async fn test_lifecycle_hooks_fire() {
    let connects = Arc::new(AtomicUsize::new(0));
    let notifications = Arc::new(AtomicUsize::new(0));
    let sent = Arc::new(Mutex::new(Vec::<String>::new()));

    let handlers = {
        let connects = connects.clone();
        let notifications = notifications.clone();
        let sent = sent.clone();
        EventHandlers::new()
            .on_connect(move || {
                connects.fetch_add(1, Ordering::SeqCst);
            })
            .on_notification(move |_| {
                notifications.fetch_add(1, Ordering::SeqCst);
            })
            .on_send(move |raw| sent.lock().unwrap().push(raw.to_string()))
    };

    let mut server = MockServer::start().await;
    let client = NotificationClient::builder()
        .connection_options(options(&server))
        .username("alice")
        .event_handlers(handlers)
        .build()
        .unwrap();
    let mut feed = client.subscribe();
    client.connect().unwrap();

    let mut conn = server.accept().await;
    conn.expect_register().await;
    conn.send_ack().await;
    conn.send_json(json!({"type": "REPORT_READY", "title": "Report", "message": "ready"})).await;
    wait_for_snapshot(&mut feed, |s| s.unread_count == 1).await;

    assert_eq!(connects.load(Ordering::SeqCst), 1);
    assert_eq!(notifications.load(Ordering::SeqCst), 1);
    assert_eq!(
        *sent.lock().unwrap(),
        vec![r#"{"type":"register","username":"alice"}"#.to_string()]
    );

    client.shutdown().await;
}

#[tokio::test]
async fn test_failed_connect_keeps_retrying() {
    // Grab a free port and release it so nothing is listening there
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let attempts = Arc::new(AtomicUsize::new(0));
    let counted = attempts.clone();
    let client = NotificationClient::builder()
        .connection_options(
            ConnectionOptions::new()
                .with_endpoint(format!("ws://127.0.0.1:{}/ws/notifications", port))
                .with_reconnect_delay_ms(50),
        )
        .username("alice")
        .event_handlers(EventHandlers::new().on_error(move |_| {
            counted.fetch_add(1, Ordering::SeqCst);
        }))
        .build()
        .unwrap();

    client.connect().unwrap();
    tokio::time::timeout(support::TEST_TIMEOUT, async {
        while attempts.load(Ordering::SeqCst) < 3 {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("client should keep retrying");

    assert!(client.is_active());
    assert_ne!(client.connection_state(), ConnectionState::Connected);
    client.shutdown().await;
    assert!(!client.is_active());
}
