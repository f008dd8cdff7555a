//! JSON-RPC API Layer
//!
//! Implements the JSON-RPC 2.0 server for QueueDesk: session tokens,
//! rate limits, error codes and the change feed subscription.

pub mod error;
pub mod handler;
pub mod rate_limiter;
pub mod server;
pub mod session;
pub mod types;

pub use handler::RpcContext;
pub use jsonrpsee::server::ServerHandle;
pub use server::{RpcServer, RpcServerConfig};
pub use session::SessionRegistry;
