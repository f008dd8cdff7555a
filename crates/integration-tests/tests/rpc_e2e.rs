//! End-to-end over HTTP and WebSocket: real server on an ephemeral port, SDK client

mod common;

use common::{Harness, ADMIN_EMAIL, ADMIN_PASSWORD};
use queuedesk_api_rpc::{RpcContext, RpcServer, RpcServerConfig, ServerHandle, SessionRegistry};
use queuedesk_core::domain::{ChangeKind, EntryStatus, FeedFilter, QueueStatus, Session, Table};
use queuedesk_core::port::id_provider::UuidProvider;
use queuedesk_sdk::{code, JoinRequest, QueueDeskClient, StaffForm};
use std::sync::Arc;
use std::time::Duration;

async fn start(h: &Harness, rate_limit_burst: u32) -> (String, ServerHandle) {
    let sessions = Arc::new(SessionRegistry::new(
        60 * 60 * 1000,
        Arc::new(UuidProvider),
        h.clock.clone(),
    ));
    let ctx = RpcContext {
        student: h.student.clone(),
        queue_state: h.queue_state.clone(),
        staff_admin: h.staff_admin.clone(),
        auth: h.auth.clone(),
        stats: h.stats.clone(),
        maintenance: h.scheduler.clone(),
        queues: h.queue_repo.clone(),
        feed: h.feed.clone(),
    };
    let config = RpcServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        rate_limit_burst,
        rate_limit_per_sec: 1,
    };
    let (addr, handle) = RpcServer::new(config, ctx, sessions).start().await.unwrap();
    (format!("http://{}", addr), handle)
}

fn form(name: &str) -> StaffForm {
    StaffForm {
        name: name.to_string(),
        email: format!("{}@uni.edu", name.to_lowercase()),
        department: "Physics".to_string(),
    }
}

#[tokio::test]
async fn test_full_day_over_rpc() {
    let h = Harness::with_codes(&["CURIE001", "NOETHER1", "CURIE002"]).await;
    let (url, handle) = start(&h, 100).await;

    // Admin sets up two staff members
    let mut admin = QueueDeskClient::connect(&url).await.unwrap();
    admin
        .admin_signup(ADMIN_EMAIL, "Registrar", ADMIN_PASSWORD)
        .await
        .unwrap();
    let login = admin.admin_login(ADMIN_EMAIL, ADMIN_PASSWORD).await.unwrap();
    assert!(matches!(login.session, Session::Admin(_)));
    assert_eq!(login.queue_id, None);

    let curie = admin.staff_create(form("Curie")).await.unwrap();
    assert_eq!(curie.access_code.as_str(), "CURIE001");
    let noether = admin.staff_create(form("Noether")).await.unwrap();
    assert_eq!(admin.staff_list().await.unwrap().len(), 2);

    // Staff signs in with the access code and learns their queue
    let mut staff = QueueDeskClient::connect(&url).await.unwrap();
    let staff_login = staff.staff_login("curie001").await.unwrap();
    let queue_id = staff_login.queue_id.clone().unwrap();
    let whoami = staff.whoami().await.unwrap();
    assert_eq!(whoami.queue_id.as_deref(), Some(queue_id.as_str()));

    let mut feed = staff
        .subscribe(FeedFilter {
            table: Some(Table::QueueEntries),
            queue_id: Some(queue_id.clone()),
            ..Default::default()
        })
        .await
        .unwrap();

    // A student finds the queue in the directory and joins anonymously
    let student = QueueDeskClient::connect(&url).await.unwrap();
    let directory = student.directory().await.unwrap();
    assert_eq!(directory.len(), 2);
    let listing = directory
        .iter()
        .find(|q| q.staff_name == "Curie")
        .unwrap();
    assert_eq!(listing.queue_id, queue_id);

    let receipt = student
        .join(JoinRequest {
            queue_id: queue_id.clone(),
            student_name: "Ada".to_string(),
            reason: "Lab report".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(receipt.entry.queue_number, 1);
    assert_eq!(receipt.position.position, 1);

    let event = tokio::time::timeout(Duration::from_secs(2), feed.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(event.kind, ChangeKind::Insert);
    assert_eq!(event.row_id, receipt.entry.id);

    // Staff works their own queue without naming it
    let dashboard = staff.queue_entries(None).await.unwrap();
    assert_eq!(dashboard.len(), 1);

    let called = staff.call_next(None).await.unwrap();
    assert_eq!(called.entry.status, EntryStatus::Called);
    assert!(called.response_deadline.is_some());

    let event = tokio::time::timeout(Duration::from_secs(2), feed.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(event.kind, ChangeKind::Update);

    let status = student.entry_status(&receipt.entry.id).await.unwrap();
    assert_eq!(status.entry.status, EntryStatus::Called);

    let done = staff.complete(&receipt.entry.id).await.unwrap();
    assert_eq!(done.status, EntryStatus::Completed);

    let closed = staff
        .set_queue_status(None, QueueStatus::Closed)
        .await
        .unwrap();
    assert_eq!(closed.status, QueueStatus::Closed);

    // Closed queue: student gets a distinct error
    let err = student
        .join(JoinRequest {
            queue_id: queue_id.clone(),
            student_name: "Bob".to_string(),
            reason: "Question".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(code::QUEUE_CLOSED));

    // Staff cannot reach another staff member's queue
    let other_queue = directory
        .iter()
        .find(|q| q.staff_id == noether.id)
        .unwrap()
        .queue_id
        .clone();
    let err = staff.queue_entries(Some(other_queue.as_str())).await.unwrap_err();
    assert_eq!(err.code(), Some(code::FORBIDDEN));

    // A new code locks out the old one, but the signed-in session carries on
    let regenerated = admin.staff_regenerate_code(&curie.id).await.unwrap();
    assert_eq!(regenerated.access_code.as_str(), "CURIE002");
    assert!(staff.whoami().await.is_ok());
    let mut latecomer = QueueDeskClient::connect(&url).await.unwrap();
    let err = latecomer.staff_login("CURIE001").await.unwrap_err();
    assert_eq!(err.code(), Some(code::UNAUTHORIZED));
    assert!(latecomer.staff_login("CURIE002").await.is_ok());

    // Deleting the staff member ends their sessions
    admin.staff_delete(&curie.id).await.unwrap();
    let err = staff.whoami().await.unwrap_err();
    assert_eq!(err.code(), Some(code::UNAUTHORIZED));

    // Curie's queue and entries went with her
    let stats = admin.stats().await.unwrap();
    assert_eq!(stats.staff_count, 1);
    assert_eq!(stats.completed_entries, 0);

    let report = admin.maintenance(false).await.unwrap();
    assert_eq!(report.entries_deleted, 0);

    handle.stop().unwrap();
}

#[tokio::test]
async fn test_anonymous_and_bad_tokens() {
    let h = Harness::in_memory().await;
    let (url, handle) = start(&h, 100).await;

    let anonymous = QueueDeskClient::connect(&url).await.unwrap();
    let err = anonymous.queue_entries(None).await.unwrap_err();
    assert_eq!(err.code(), Some(code::UNAUTHORIZED));

    let err = anonymous.staff_list().await.unwrap_err();
    assert_eq!(err.code(), Some(code::UNAUTHORIZED));

    let forged = QueueDeskClient::connect(&url)
        .await
        .unwrap()
        .with_token("not-a-real-token");
    // Public methods ignore the token entirely
    assert!(forged.directory().await.is_ok());
    let err = forged.whoami().await.unwrap_err();
    assert_eq!(err.code(), Some(code::UNAUTHORIZED));

    let err = anonymous.entry_status("missing").await.unwrap_err();
    assert_eq!(err.code(), Some(code::NOT_FOUND));

    let mut staff = QueueDeskClient::connect(&url).await.unwrap();
    let err = staff.staff_login("nope").await.unwrap_err();
    assert_eq!(err.code(), Some(code::UNAUTHORIZED));

    handle.stop().unwrap();
}

#[tokio::test]
async fn test_logout_revokes_token() {
    let h = Harness::in_memory().await;
    let (url, handle) = start(&h, 100).await;

    let mut admin = QueueDeskClient::connect(&url).await.unwrap();
    admin
        .admin_signup(ADMIN_EMAIL, "Registrar", ADMIN_PASSWORD)
        .await
        .unwrap();
    let login = admin.admin_login(ADMIN_EMAIL, ADMIN_PASSWORD).await.unwrap();

    let revoked = admin.logout().await.unwrap();
    assert!(revoked.revoked);

    let stale = QueueDeskClient::connect(&url)
        .await
        .unwrap()
        .with_token(login.token);
    let err = stale.stats().await.unwrap_err();
    assert_eq!(err.code(), Some(code::UNAUTHORIZED));

    handle.stop().unwrap();
}

#[tokio::test]
async fn test_join_is_rate_limited() {
    let h = Harness::in_memory().await;
    let admin_session = h.admin().await;
    let (_grace, queue) = h.staff(&admin_session, "Grace").await;
    let (url, handle) = start(&h, 2).await;

    let student = QueueDeskClient::connect(&url).await.unwrap();
    let join = || JoinRequest {
        queue_id: queue.id.clone(),
        student_name: "Ada".to_string(),
        reason: "Spam".to_string(),
    };

    student.join(join()).await.unwrap();
    student.join(join()).await.unwrap();
    let err = student.join(join()).await.unwrap_err();
    assert_eq!(err.code(), Some(code::THROTTLED));

    handle.stop().unwrap();
}

#[tokio::test]
async fn test_rate_limits_are_scoped_per_queue_and_login_kind() {
    let h = Harness::in_memory().await;
    let admin_session = h.admin().await;
    let (_grace, busy_queue) = h.staff(&admin_session, "Grace").await;
    let (_alan, quiet_queue) = h.staff(&admin_session, "Alan").await;
    let (url, handle) = start(&h, 3).await;

    let join = |queue_id: &str| JoinRequest {
        queue_id: queue_id.to_string(),
        student_name: "Ada".to_string(),
        reason: "Office hours".to_string(),
    };

    // One client floods a queue until it is throttled there
    let flooder = QueueDeskClient::connect(&url).await.unwrap();
    for _ in 0..3 {
        flooder.join(join(&busy_queue.id)).await.unwrap();
    }
    let err = flooder.join(join(&busy_queue.id)).await.unwrap_err();
    assert_eq!(err.code(), Some(code::THROTTLED));

    // Another client joining another queue is unaffected
    let student = QueueDeskClient::connect(&url).await.unwrap();
    let receipt = student.join(join(&quiet_queue.id)).await.unwrap();
    assert_eq!(receipt.entry.queue_number, 1);

    // Guessing access codes exhausts only the staff login bucket
    let mut guesser = QueueDeskClient::connect(&url).await.unwrap();
    for _ in 0..3 {
        let err = guesser.staff_login("WRONG001").await.unwrap_err();
        assert_eq!(err.code(), Some(code::UNAUTHORIZED));
    }
    let err = guesser.staff_login("WRONG001").await.unwrap_err();
    assert_eq!(err.code(), Some(code::THROTTLED));

    let mut admin = QueueDeskClient::connect(&url).await.unwrap();
    let login = admin.admin_login(ADMIN_EMAIL, ADMIN_PASSWORD).await.unwrap();
    assert!(matches!(login.session, Session::Admin(_)));

    handle.stop().unwrap();
}
