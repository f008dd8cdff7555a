//! QueueDesk SDK - Rust Client Library
//!
//! Typed client for the QueueDesk JSON-RPC server: the student flow, staff
//! dashboard, admin operations and the live change feed.
//!
//! # Example
//!
//! ```no_run
//! use queuedesk_sdk::{JoinRequest, QueueDeskClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = QueueDeskClient::connect("http://127.0.0.1:9630").await?;
//!
//!     let queue = &client.directory().await?[0];
//!     let receipt = client.join(JoinRequest {
//!         queue_id: queue.queue_id.clone(),
//!         student_name: "Ada".to_string(),
//!         reason: "Thesis question".to_string(),
//!     }).await?;
//!
//!     println!("You are #{}", receipt.entry.queue_number);
//!
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod types;

pub use client::{FeedStream, QueueDeskClient};
pub use error::{code, Result, SdkError};
pub use types::{
    AdminSignupResponse, DeleteResponse, JoinRequest, LoginResponse, LogoutResponse,
    MaintenanceResponse, StaffForm, StaffListResponse, SweepResponse, WhoamiResponse,
};
