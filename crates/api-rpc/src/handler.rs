//! RPC Method Handlers
//!
//! Resolves the caller's session, applies rate limits and delegates to the
//! core services. Authorization itself lives in the services.

use crate::error::{throttled, to_rpc_error};
use crate::rate_limiter::RateLimiter;
use crate::session::SessionRegistry;
use crate::types::{
    AdminLoginRequest, AdminSignupRequest, AdminSignupResponse, DeleteResponse,
    DirectoryRequest, EntryActionRequest, EntryStatusRequest, JoinRequest, LoginResponse,
    LogoutResponse, MaintenanceRequest, MaintenanceResponse, QueueRequest,
    SetQueueStatusRequest, StaffCreateRequest, StaffIdRequest, StaffListResponse,
    StaffLoginRequest, StaffUpdateRequest, SweepResponse, TokenRequest, WhoamiResponse,
};
use jsonrpsee::types::ErrorObjectOwned;
use queuedesk_core::application::authz::require_authenticated;
use queuedesk_core::application::student::JoinRequest as JoinForm;
use queuedesk_core::application::{
    AdminSignup, AuthService, ChangeFeed, DashboardEntry, EntryView, JoinReceipt,
    MaintenanceScheduler, QueueStateService, StaffAdminService, StatsService, StudentService,
    SystemStats,
};
use queuedesk_core::domain::{Queue, QueueEntry, QueueId, QueueSummary, Session, StaffMember};
use queuedesk_core::error::AppError;
use queuedesk_core::port::QueueRepository;
use std::sync::Arc;
use tracing::{info, warn};

type RpcResult<T> = Result<T, ErrorObjectOwned>;

/// Services the RPC layer dispatches to (built by the composition root)
#[derive(Clone)]
pub struct RpcContext {
    pub student: Arc<StudentService>,
    pub queue_state: Arc<QueueStateService>,
    pub staff_admin: Arc<StaffAdminService>,
    pub auth: Arc<AuthService>,
    pub stats: Arc<StatsService>,
    pub maintenance: Arc<MaintenanceScheduler>,
    pub queues: Arc<dyn QueueRepository>,
    pub feed: ChangeFeed,
}

/// RPC Handler with injected dependencies
pub struct RpcHandler {
    ctx: RpcContext,
    sessions: Arc<SessionRegistry>,
    join_limiter: RateLimiter,
    admin_limiter: RateLimiter,
    staff_login_limiter: RateLimiter,
}

impl RpcHandler {
    pub fn new(
        ctx: RpcContext,
        sessions: Arc<SessionRegistry>,
        rate_limit_burst: u32,
        rate_limit_per_sec: u32,
    ) -> Self {
        Self {
            ctx,
            sessions,
            join_limiter: RateLimiter::new(rate_limit_burst, rate_limit_per_sec),
            admin_limiter: RateLimiter::new(rate_limit_burst, rate_limit_per_sec),
            staff_login_limiter: RateLimiter::new(rate_limit_burst, rate_limit_per_sec),
        }
    }

    pub fn feed(&self) -> &ChangeFeed {
        &self.ctx.feed
    }

    async fn session(&self, token: Option<&str>) -> RpcResult<Session> {
        self.sessions.resolve(token).await.map_err(to_rpc_error)
    }

    /// Explicit queue, or the staff caller's own queue when omitted.
    /// Anonymous callers are turned away before any lookup.
    async fn target_queue(&self, session: &Session, queue_id: Option<QueueId>) -> RpcResult<QueueId> {
        require_authenticated(session).map_err(to_rpc_error)?;
        if let Some(queue_id) = queue_id {
            return Ok(queue_id);
        }
        let Some(staff) = session.staff() else {
            return Err(to_rpc_error(AppError::Validation(
                "queue_id is required".to_string(),
            )));
        };
        self.own_queue(&staff.staff_id)
            .await?
            .map(|queue| queue.id)
            .ok_or_else(|| {
                to_rpc_error(AppError::NotFound(format!(
                    "No queue for staff {}",
                    staff.staff_id
                )))
            })
    }

    async fn own_queue(&self, staff_id: &str) -> RpcResult<Option<Queue>> {
        self.ctx
            .queues
            .find_by_staff(&staff_id.to_string())
            .await
            .map_err(to_rpc_error)
    }

    async fn session_queue_id(&self, session: &Session) -> RpcResult<Option<QueueId>> {
        match session.staff() {
            Some(staff) => Ok(self.own_queue(&staff.staff_id).await?.map(|q| q.id)),
            None => Ok(None),
        }
    }

    // ---------------------------------------------------------------
    // Public
    // ---------------------------------------------------------------

    /// directory.list.v1
    pub async fn directory(&self, _params: DirectoryRequest) -> RpcResult<Vec<QueueSummary>> {
        self.ctx.student.directory().await.map_err(to_rpc_error)
    }

    /// queue.join.v1
    ///
    /// Throttled per caller and queue.
    pub async fn join(&self, caller: &str, params: JoinRequest) -> RpcResult<JoinReceipt> {
        let key = format!("{}|{}", caller, params.queue_id);
        if !self.join_limiter.check(&key).await {
            warn!(caller, queue_id = %params.queue_id, "Join throttled");
            return Err(throttled());
        }

        self.ctx
            .student
            .join(JoinForm {
                queue_id: params.queue_id,
                student_name: params.student_name,
                reason: params.reason,
            })
            .await
            .map_err(to_rpc_error)
    }

    /// entry.status.v1
    pub async fn entry_status(&self, params: EntryStatusRequest) -> RpcResult<EntryView> {
        self.ctx
            .queue_state
            .entry_status(&params.entry_id)
            .await
            .map_err(to_rpc_error)
    }

    // ---------------------------------------------------------------
    // Auth
    // ---------------------------------------------------------------

    /// auth.admin_signup.v1
    pub async fn admin_signup(
        &self,
        caller: &str,
        params: AdminSignupRequest,
    ) -> RpcResult<AdminSignupResponse> {
        if !self.admin_limiter.check(caller).await {
            warn!(caller, "Admin signup throttled");
            return Err(throttled());
        }

        let identity = self
            .ctx
            .auth
            .admin_signup(AdminSignup {
                email: params.email,
                name: params.name,
                password: params.password,
            })
            .await
            .map_err(to_rpc_error)?;

        Ok(AdminSignupResponse {
            user_id: identity.user_id,
            email: identity.email,
            name: identity.name,
        })
    }

    /// auth.admin_login.v1
    pub async fn admin_login(&self, caller: &str, params: AdminLoginRequest) -> RpcResult<LoginResponse> {
        if !self.admin_limiter.check(caller).await {
            warn!(caller, "Admin login throttled");
            return Err(throttled());
        }

        let session = self
            .ctx
            .auth
            .admin_login(&params.email, &params.password)
            .await
            .map_err(to_rpc_error)?;
        self.login(session, None).await
    }

    /// auth.staff_login.v1
    pub async fn staff_login(&self, caller: &str, params: StaffLoginRequest) -> RpcResult<LoginResponse> {
        if !self.staff_login_limiter.check(caller).await {
            warn!(caller, "Staff login throttled");
            return Err(throttled());
        }

        let session = self
            .ctx
            .auth
            .staff_login(&params.access_code)
            .await
            .map_err(to_rpc_error)?;
        let queue_id = self.session_queue_id(&session).await?;
        self.login(session, queue_id).await
    }

    async fn login(&self, session: Session, queue_id: Option<QueueId>) -> RpcResult<LoginResponse> {
        let issued = self.sessions.issue(session.clone()).await;
        info!(who = %session.label(), "Session issued");

        Ok(LoginResponse {
            token: issued.token,
            session,
            expires_at: issued.expires_at,
            queue_id,
        })
    }

    /// auth.logout.v1
    pub async fn logout(&self, params: TokenRequest) -> RpcResult<LogoutResponse> {
        let revoked = match params.token.as_deref() {
            Some(token) => self.sessions.revoke(token).await,
            None => false,
        };
        Ok(LogoutResponse { revoked })
    }

    /// auth.whoami.v1
    pub async fn whoami(&self, params: TokenRequest) -> RpcResult<WhoamiResponse> {
        let session = self.session(params.token.as_deref()).await?;
        let queue_id = self.session_queue_id(&session).await?;
        Ok(WhoamiResponse { session, queue_id })
    }

    // ---------------------------------------------------------------
    // Staff dashboard
    // ---------------------------------------------------------------

    /// queue.entries.v1
    pub async fn queue_entries(&self, params: QueueRequest) -> RpcResult<Vec<DashboardEntry>> {
        let session = self.session(params.token.as_deref()).await?;
        let queue_id = self.target_queue(&session, params.queue_id).await?;
        self.ctx
            .queue_state
            .list_entries(&session, &queue_id)
            .await
            .map_err(to_rpc_error)
    }

    /// queue.set_status.v1
    pub async fn set_queue_status(&self, params: SetQueueStatusRequest) -> RpcResult<Queue> {
        let session = self.session(params.token.as_deref()).await?;
        let queue_id = self.target_queue(&session, params.queue_id).await?;
        self.ctx
            .queue_state
            .set_queue_status(&session, &queue_id, params.status)
            .await
            .map_err(to_rpc_error)
    }

    /// queue.call_next.v1
    pub async fn call_next(&self, params: QueueRequest) -> RpcResult<EntryView> {
        let session = self.session(params.token.as_deref()).await?;
        let queue_id = self.target_queue(&session, params.queue_id).await?;
        self.ctx
            .queue_state
            .call_next(&session, &queue_id)
            .await
            .map_err(to_rpc_error)
    }

    /// entry.skip.v1
    pub async fn skip(&self, params: EntryActionRequest) -> RpcResult<QueueEntry> {
        let session = self.session(params.token.as_deref()).await?;
        self.ctx
            .queue_state
            .skip(&session, &params.entry_id)
            .await
            .map_err(to_rpc_error)
    }

    /// entry.complete.v1
    pub async fn complete(&self, params: EntryActionRequest) -> RpcResult<QueueEntry> {
        let session = self.session(params.token.as_deref()).await?;
        self.ctx
            .queue_state
            .complete(&session, &params.entry_id)
            .await
            .map_err(to_rpc_error)
    }

    /// queue.sweep.v1
    pub async fn sweep(&self, params: TokenRequest) -> RpcResult<SweepResponse> {
        let session = self.session(params.token.as_deref()).await?;
        let removed = self
            .ctx
            .queue_state
            .sweep_now(&session)
            .await
            .map_err(to_rpc_error)?;
        Ok(SweepResponse { removed })
    }

    // ---------------------------------------------------------------
    // Admin
    // ---------------------------------------------------------------

    /// admin.staff.list.v1
    pub async fn staff_list(&self, params: TokenRequest) -> RpcResult<StaffListResponse> {
        let session = self.session(params.token.as_deref()).await?;
        let staff = self
            .ctx
            .staff_admin
            .list(&session)
            .await
            .map_err(to_rpc_error)?;
        Ok(StaffListResponse { staff })
    }

    /// admin.staff.create.v1
    pub async fn staff_create(&self, params: StaffCreateRequest) -> RpcResult<StaffMember> {
        let session = self.session(params.token.as_deref()).await?;
        self.ctx
            .staff_admin
            .create(&session, params.profile)
            .await
            .map_err(to_rpc_error)
    }

    /// admin.staff.update.v1
    pub async fn staff_update(&self, params: StaffUpdateRequest) -> RpcResult<StaffMember> {
        let session = self.session(params.token.as_deref()).await?;
        self.ctx
            .staff_admin
            .update(&session, &params.staff_id, params.profile)
            .await
            .map_err(to_rpc_error)
    }

    /// admin.staff.delete.v1
    pub async fn staff_delete(&self, params: StaffIdRequest) -> RpcResult<DeleteResponse> {
        let session = self.session(params.token.as_deref()).await?;
        self.ctx
            .staff_admin
            .delete(&session, &params.staff_id)
            .await
            .map_err(to_rpc_error)?;

        let revoked = self.sessions.revoke_staff(&params.staff_id).await;
        info!(staff_id = %params.staff_id, revoked, "Staff sessions revoked");

        Ok(DeleteResponse {
            staff_id: params.staff_id,
            deleted: true,
        })
    }

    /// admin.staff.regenerate_code.v1
    ///
    /// Sessions already issued to the staff member stay valid; only new
    /// logins need the new code.
    pub async fn staff_regenerate_code(&self, params: StaffIdRequest) -> RpcResult<StaffMember> {
        let session = self.session(params.token.as_deref()).await?;
        self.ctx
            .staff_admin
            .regenerate_code(&session, &params.staff_id)
            .await
            .map_err(to_rpc_error)
    }

    /// admin.stats.v1
    pub async fn stats(&self, params: TokenRequest) -> RpcResult<SystemStats> {
        let session = self.session(params.token.as_deref()).await?;
        self.ctx.stats.stats(&session).await.map_err(to_rpc_error)
    }

    /// admin.maintenance.v1
    pub async fn maintenance(&self, params: MaintenanceRequest) -> RpcResult<MaintenanceResponse> {
        let session = self.session(params.token.as_deref()).await?;
        let report = self
            .ctx
            .maintenance
            .run_now(&session, params.force_vacuum)
            .await
            .map_err(to_rpc_error)?;
        Ok(report.into())
    }
}
