// Authentication - admin credentials and staff access codes

use crate::domain::{
    AccessCode, AdminIdentity, Role, Session, StaffIdentity, UserProfile,
};
use crate::error::{AppError, Result};
use crate::port::credential_hasher::MIN_PASSWORD_LEN;
use crate::port::{CredentialHasher, IdProvider, StaffRepository, TimeProvider, UserRepository};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, warn};

/// Checked on unknown emails so every login attempt costs one hash verification
const DUMMY_PASSWORD: &str = "queuedesk-unknown-account";

/// Admin signup form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminSignup {
    pub email: String,
    pub name: String,
    pub password: String,
}

/// Validate signup input before touching the store
pub fn validate_signup(req: &AdminSignup) -> Result<()> {
    let email = req.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::Validation("a valid email is required".to_string()));
    }
    if req.name.trim().is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// Authentication Service
pub struct AuthService {
    user_repo: Arc<dyn UserRepository>,
    staff_repo: Arc<dyn StaffRepository>,
    hasher: Arc<dyn CredentialHasher>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
    allow_signup: bool,
    dummy_hash: OnceCell<String>,
}

impl AuthService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        staff_repo: Arc<dyn StaffRepository>,
        hasher: Arc<dyn CredentialHasher>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
        allow_signup: bool,
    ) -> Self {
        Self {
            user_repo,
            staff_repo,
            hasher,
            id_provider,
            time_provider,
            allow_signup,
            dummy_hash: OnceCell::new(),
        }
    }

    /// Create an admin identity and profile
    pub async fn admin_signup(&self, req: AdminSignup) -> Result<AdminIdentity> {
        if !self.allow_signup {
            return Err(AppError::Forbidden("admin signup is disabled".to_string()));
        }
        validate_signup(&req)?;

        let email = req.email.trim().to_lowercase();
        if self.user_repo.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict(format!("email {} is already registered", email)));
        }

        let user = UserProfile {
            id: self.id_provider.generate_id(),
            email,
            name: req.name.trim().to_string(),
            role: Some(Role::Admin),
            password_hash: self.hash_password(&req.password).await?,
            created_at: self.time_provider.now_millis(),
        };
        self.user_repo.insert(&user).await?;

        info!(user_id = %user.id, "Admin account created");

        Ok(AdminIdentity {
            user_id: user.id,
            email: user.email,
            name: user.name,
        })
    }

    /// Check credentials first, then require an admin profile.
    /// A valid identity without one gets Forbidden and no session.
    pub async fn admin_login(&self, email: &str, password: &str) -> Result<Session> {
        let email = email.trim().to_lowercase();
        let invalid = || AppError::Unauthorized("invalid email or password".to_string());

        let Some(user) = self.user_repo.find_by_email(&email).await? else {
            let dummy = self
                .dummy_hash
                .get_or_try_init(|| self.hash_password(DUMMY_PASSWORD))
                .await?;
            self.verify_password(password, dummy).await?;
            warn!("Admin login failed: unknown email");
            return Err(invalid());
        };
        if !self.verify_password(password, &user.password_hash).await? {
            warn!(user_id = %user.id, "Admin login failed: bad password");
            return Err(invalid());
        }

        if !user.is_admin() {
            warn!(user_id = %user.id, "Login rejected: no admin profile");
            return Err(AppError::Forbidden(
                "this account does not have admin access".to_string(),
            ));
        }

        info!(user_id = %user.id, "Admin logged in");
        Ok(Session::Admin(AdminIdentity {
            user_id: user.id,
            email: user.email,
            name: user.name,
        }))
    }

    /// Exchange an access code for a staff session
    pub async fn staff_login(&self, code: &str) -> Result<Session> {
        let denied = || AppError::Unauthorized("invalid access code".to_string());

        let code = AccessCode::parse(code).map_err(|_| denied())?;
        let staff = self
            .staff_repo
            .find_by_access_code(&code)
            .await?
            .ok_or_else(denied)?;

        info!(staff_id = %staff.id, "Staff logged in");
        Ok(Session::Staff(StaffIdentity {
            staff_id: staff.id,
            name: staff.name,
            department: staff.department,
        }))
    }

    /// Argon2 is CPU and memory heavy: keep it off the async workers
    async fn hash_password(&self, password: &str) -> Result<String> {
        let hasher = Arc::clone(&self.hasher);
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
    }

    async fn verify_password(&self, password: &str, hash: &str) -> Result<bool> {
        let hasher = Arc::clone(&self.hasher);
        let password = password.to_string();
        let hash = hash.to_string();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))
    }
}
