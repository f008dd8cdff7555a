//! Staff Dashboard Example
//!
//! Signs in with an access code, prints the queue, then follows live changes.
//!
//! # Usage
//!
//! 1. Start the server:
//!    ```bash
//!    cargo run --package queuedesk-daemon
//!    ```
//!
//! 2. Run this example with a staff access code:
//!    ```bash
//!    QUEUEDESK_ACCESS_CODE=ABCD1234 cargo run --example dashboard
//!    ```

use queuedesk_core::domain::FeedFilter;
use queuedesk_sdk::QueueDeskClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let access_code = std::env::var("QUEUEDESK_ACCESS_CODE")?;

    println!("QueueDesk SDK - Staff Dashboard");
    println!("================================\n");

    // 1. Sign in
    let mut client = QueueDeskClient::connect("http://127.0.0.1:9630").await?;
    let login = client.staff_login(&access_code).await?;
    let queue_id = login.queue_id.ok_or("staff session without a queue")?;
    println!("✓ Signed in, queue {}\n", queue_id);

    // 2. Current entries
    for row in client.queue_entries(None).await? {
        let position = row
            .position
            .map(|p| format!("#{}", p.position))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:>3}  {:<20} {:<10} {}",
            row.entry.queue_number, row.entry.student_name, row.entry.status, position
        );
    }
    println!();

    // 3. Follow changes to this queue
    let mut feed = client
        .subscribe(FeedFilter {
            queue_id: Some(queue_id),
            ..Default::default()
        })
        .await?;
    println!("Watching for changes (Ctrl+C to stop)...");

    while let Some(event) = feed.next().await {
        let event = event?;
        println!("  {:?} {:?} {}", event.kind, event.table, event.row_id);
    }

    Ok(())
}
