// User Repository Port (Interface)

use crate::domain::{UserId, UserProfile};
use crate::error::Result;
use async_trait::async_trait;

/// Repository interface for authentication identities and profiles
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert identity + profile; Conflict if the email is taken
    async fn insert(&self, user: &UserProfile) -> Result<()>;

    /// Case-insensitive email lookup
    async fn find_by_email(&self, email: &str) -> Result<Option<UserProfile>>;

    /// Find user by ID
    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserProfile>>;
}
