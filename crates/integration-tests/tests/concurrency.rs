//! Concurrent joins against one file-backed database

mod common;

use common::{join_request, Harness};
use std::collections::HashSet;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_joins_get_distinct_numbers() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("queuedesk.db").display());
    let h = Harness::with_url(&url, Vec::new()).await;
    let admin = h.admin().await;
    let (_grace, queue) = h.staff(&admin, "Grace").await;

    const STUDENTS: i64 = 20;
    let mut handles = Vec::new();
    for i in 0..STUDENTS {
        let student = h.student.clone();
        let req = join_request(&queue, &format!("Student {}", i));
        handles.push(tokio::spawn(async move { student.join(req).await }));
    }

    let mut numbers = HashSet::new();
    let mut positions = HashSet::new();
    for handle in handles {
        let receipt = handle.await.unwrap().unwrap();
        numbers.insert(receipt.entry.queue_number);
        positions.insert(receipt.position.position);
    }

    let expected: HashSet<i64> = (1..=STUDENTS).collect();
    assert_eq!(numbers, expected);
    // Each join saw exactly the entries committed before it
    assert_eq!(positions, expected);

    let queue = h.queue_repo.find_by_id(&queue.id).await.unwrap().unwrap();
    assert_eq!(queue.last_queue_number, STUDENTS);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_call_next_never_double_calls() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("queuedesk.db").display());
    let h = Harness::with_url(&url, Vec::new()).await;
    let admin = h.admin().await;
    let (_grace, queue) = h.staff(&admin, "Grace").await;

    for i in 0..5 {
        h.student
            .join(join_request(&queue, &format!("Student {}", i)))
            .await
            .unwrap();
    }

    let mut handles = Vec::new();
    for _ in 0..8 {
        let queue_state = h.queue_state.clone();
        let admin = admin.clone();
        let queue_id = queue.id.clone();
        handles.push(tokio::spawn(async move {
            queue_state.call_next(&admin, &queue_id).await
        }));
    }

    let mut called = HashSet::new();
    let mut empty = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(view) => {
                assert!(called.insert(view.entry.id));
            }
            Err(queuedesk_core::error::AppError::NotFound(_)) => empty += 1,
            Err(e) => panic!("unexpected error: {:?}", e),
        }
    }
    assert_eq!(called.len(), 5);
    assert_eq!(empty, 3);
}
