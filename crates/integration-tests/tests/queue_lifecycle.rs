//! Student and staff flows over a real SQLite store

mod common;

use common::{join_request, Harness};
use queuedesk_core::application::JoinRequest;
use queuedesk_core::domain::{ChangeKind, EntryStatus, FeedFilter, QueueStatus, Table};
use queuedesk_core::error::AppError;
use std::time::Duration;

#[tokio::test]
async fn test_student_journey() {
    let h = Harness::with_codes(&["GRACE001"]).await;
    let admin = h.admin().await;
    let (_grace, queue) = h.staff(&admin, "Grace").await;
    let staff = h.auth.staff_login("grace001").await.unwrap();

    let mut feed = h.feed.subscribe(FeedFilter {
        table: Some(Table::QueueEntries),
        queue_id: Some(queue.id.clone()),
        ..Default::default()
    });

    // Ada and Bob line up
    let ada = h.student.join(join_request(&queue, "Ada")).await.unwrap();
    assert_eq!(ada.entry.queue_number, 1);
    assert_eq!(ada.position.position, 1);
    assert_eq!(ada.position.estimated_wait_minutes, 5);

    let inserted = tokio::time::timeout(Duration::from_secs(1), feed.next())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(inserted.kind, ChangeKind::Insert);
    assert_eq!(inserted.row_id, ada.entry.id);

    let bob = h.student.join(join_request(&queue, "Bob")).await.unwrap();
    assert_eq!(bob.entry.queue_number, 2);
    assert_eq!(bob.position.position, 2);
    assert_eq!(bob.position.estimated_wait_minutes, 10);

    // Grace calls Ada; a called entry still counts ahead of Bob
    h.advance_minutes(1);
    let called = h.queue_state.call_next(&staff, &queue.id).await.unwrap();
    assert_eq!(called.entry.id, ada.entry.id);
    assert_eq!(called.entry.status, EntryStatus::Called);
    assert_eq!(called.position.unwrap().position, 1);
    assert_eq!(
        called.response_deadline,
        Some(common::START_MILLIS + 60_000 + 5 * 60_000)
    );

    let bob_view = h.queue_state.entry_status(&bob.entry.id).await.unwrap();
    assert_eq!(bob_view.position.unwrap().position, 2);
    assert_eq!(bob_view.response_deadline, None);

    // Ada is done; Bob moves up
    let done = h.queue_state.complete(&staff, &ada.entry.id).await.unwrap();
    assert_eq!(done.status, EntryStatus::Completed);
    assert!(done.finished_at.is_some());

    let bob_view = h.queue_state.entry_status(&bob.entry.id).await.unwrap();
    assert_eq!(bob_view.position.unwrap().position, 1);

    let ada_view = h.queue_state.entry_status(&ada.entry.id).await.unwrap();
    assert_eq!(ada_view.position, None);

    // Dashboard shows only active entries
    let dashboard = h.queue_state.list_entries(&staff, &queue.id).await.unwrap();
    assert_eq!(dashboard.len(), 1);
    assert_eq!(dashboard[0].entry.id, bob.entry.id);

    // Directory reflects the counts
    let directory = h.student.directory().await.unwrap();
    assert_eq!(directory.len(), 1);
    assert_eq!(directory[0].staff_name, "Grace");
    assert_eq!(directory[0].waiting_count, 1);
    assert_eq!(directory[0].called_count, 0);
}

#[tokio::test]
async fn test_closed_queue_rejects_joins() {
    let h = Harness::in_memory().await;
    let admin = h.admin().await;
    let (_grace, queue) = h.staff(&admin, "Grace").await;

    h.student.join(join_request(&queue, "Ada")).await.unwrap();

    let closed = h
        .queue_state
        .set_queue_status(&admin, &queue.id, QueueStatus::Closed)
        .await
        .unwrap();
    assert_eq!(closed.status, QueueStatus::Closed);

    let err = h
        .student
        .join(join_request(&queue, "Bob"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::QueueClosed(_)), "got {:?}", err);

    // Existing entries are untouched and can still be served
    let dashboard = h.queue_state.list_entries(&admin, &queue.id).await.unwrap();
    assert_eq!(dashboard.len(), 1);

    // Reopening continues the sequence; the rejected join used no number
    h.queue_state
        .set_queue_status(&admin, &queue.id, QueueStatus::Open)
        .await
        .unwrap();
    let bob = h.student.join(join_request(&queue, "Bob")).await.unwrap();
    assert_eq!(bob.entry.queue_number, 2);
}

#[tokio::test]
async fn test_queue_numbers_are_never_reused() {
    let h = Harness::in_memory().await;
    let admin = h.admin().await;
    let (_grace, queue) = h.staff(&admin, "Grace").await;

    for name in ["Ada", "Bob", "Cy"] {
        let receipt = h.student.join(join_request(&queue, name)).await.unwrap();
        h.queue_state
            .skip(&admin, &receipt.entry.id)
            .await
            .unwrap();
    }

    let dee = h.student.join(join_request(&queue, "Dee")).await.unwrap();
    assert_eq!(dee.entry.queue_number, 4);
    // Skipped entries hold no place in line
    assert_eq!(dee.position.position, 1);
}

#[tokio::test]
async fn test_join_validation_runs_before_store() {
    let h = Harness::in_memory().await;

    let err = h
        .student
        .join(JoinRequest {
            queue_id: "no-such-queue".to_string(),
            student_name: "   ".to_string(),
            reason: "advising".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)), "got {:?}", err);

    let err = h
        .student
        .join(JoinRequest {
            queue_id: "no-such-queue".to_string(),
            student_name: "Ada".to_string(),
            reason: "advising".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_call_next_on_empty_queue() {
    let h = Harness::in_memory().await;
    let admin = h.admin().await;
    let (_grace, queue) = h.staff(&admin, "Grace").await;

    let err = h
        .queue_state
        .call_next(&admin, &queue.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_call_next_takes_lowest_waiting_number() {
    let h = Harness::in_memory().await;
    let admin = h.admin().await;
    let (_grace, queue) = h.staff(&admin, "Grace").await;

    let ada = h.student.join(join_request(&queue, "Ada")).await.unwrap();
    let bob = h.student.join(join_request(&queue, "Bob")).await.unwrap();

    let first = h.queue_state.call_next(&admin, &queue.id).await.unwrap();
    assert_eq!(first.entry.id, ada.entry.id);

    // Ada is already called; the next call skips over her
    let second = h.queue_state.call_next(&admin, &queue.id).await.unwrap();
    assert_eq!(second.entry.id, bob.entry.id);
    assert_eq!(second.position.unwrap().position, 2);
}

#[tokio::test]
async fn test_finished_entries_reject_further_actions() {
    let h = Harness::in_memory().await;
    let admin = h.admin().await;
    let (_grace, queue) = h.staff(&admin, "Grace").await;

    let ada = h.student.join(join_request(&queue, "Ada")).await.unwrap();
    h.queue_state.skip(&admin, &ada.entry.id).await.unwrap();

    let err = h
        .queue_state
        .complete(&admin, &ada.entry.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)), "got {:?}", err);

    let err = h
        .queue_state
        .skip(&admin, &"missing".to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_anonymous_cannot_use_dashboard() {
    let h = Harness::in_memory().await;
    let admin = h.admin().await;
    let (_grace, queue) = h.staff(&admin, "Grace").await;
    let anonymous = queuedesk_core::domain::Session::Anonymous;

    let err = h
        .queue_state
        .list_entries(&anonymous, &queue.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)), "got {:?}", err);

    let err = h
        .queue_state
        .set_queue_status(&anonymous, &queue.id, QueueStatus::Closed)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)), "got {:?}", err);
}
