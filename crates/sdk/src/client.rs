//! QueueDesk Client Implementation

use crate::error::{Result, SdkError};
use crate::types::{
    AdminSignupResponse, DeleteResponse, JoinRequest, LoginResponse, LogoutResponse,
    MaintenanceResponse, StaffForm, StaffListResponse, SweepResponse, WhoamiResponse,
};
use futures::{Stream, StreamExt};
use jsonrpsee::core::client::{ClientT, Subscription, SubscriptionClientT};
use jsonrpsee::core::traits::ToRpcParams;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use jsonrpsee::ws_client::{WsClient, WsClientBuilder};
use queuedesk_core::application::{DashboardEntry, EntryView, JoinReceipt, SystemStats};
use queuedesk_core::domain::{
    ChangeEvent, FeedFilter, Queue, QueueEntry, QueueStatus, QueueSummary, StaffMember,
};
use serde::de::DeserializeOwned;
use serde_json::{json, value::RawValue, Value};
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

const FEED_SUBSCRIBE: &str = "feed.subscribe.v1";
const FEED_UNSUBSCRIBE: &str = "feed.unsubscribe.v1";

/// Params sent as a single JSON object
struct ObjectParams(Value);

impl ToRpcParams for ObjectParams {
    fn to_rpc_params(self) -> std::result::Result<Option<Box<RawValue>>, serde_json::Error> {
        serde_json::value::to_raw_value(&self.0).map(Some)
    }
}

/// QueueDesk Client
///
/// Wraps the JSON-RPC API. After `admin_login`/`staff_login` the session
/// token is attached to every call automatically.
///
/// # Example
///
/// ```no_run
/// use queuedesk_sdk::QueueDeskClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = QueueDeskClient::connect("http://127.0.0.1:9630").await?;
/// for queue in client.directory().await? {
///     println!("{} ({}): {}", queue.staff_name, queue.department, queue.status);
/// }
/// # Ok(())
/// # }
/// ```
pub struct QueueDeskClient {
    client: HttpClient,
    url: String,
    token: Option<String>,
}

impl QueueDeskClient {
    /// Connect to a QueueDesk server
    ///
    /// # Arguments
    ///
    /// * `url` - RPC endpoint URL (e.g., `http://127.0.0.1:9630`)
    pub async fn connect(url: impl AsRef<str>) -> Result<Self> {
        let url = url.as_ref();

        let client = HttpClientBuilder::default()
            .request_timeout(Duration::from_secs(30))
            .build(url)
            .map_err(|e| SdkError::Connection(format!("Failed to create client: {}", e)))?;

        Ok(Self {
            client,
            url: url.to_string(),
            token: None,
        })
    }

    /// Use an existing session token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    async fn call<R: DeserializeOwned>(&self, method: &str, mut params: Value) -> Result<R> {
        if let (Some(token), Some(obj)) = (&self.token, params.as_object_mut()) {
            obj.insert("token".to_string(), json!(token));
        }
        let response: R = self.client.request(method, ObjectParams(params)).await?;
        Ok(response)
    }

    // ---- Students (no login) ----

    /// Staff members and their queues
    pub async fn directory(&self) -> Result<Vec<QueueSummary>> {
        self.call("directory.list.v1", json!({})).await
    }

    /// Join a queue
    ///
    /// ```no_run
    /// # use queuedesk_sdk::{QueueDeskClient, JoinRequest};
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// # let client = QueueDeskClient::connect("http://127.0.0.1:9630").await?;
    /// let receipt = client.join(JoinRequest {
    ///     queue_id: "q-1".to_string(),
    ///     student_name: "Ada".to_string(),
    ///     reason: "Course advising".to_string(),
    /// }).await?;
    /// println!("#{} at position {}", receipt.entry.queue_number, receipt.position.position);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn join(&self, request: JoinRequest) -> Result<JoinReceipt> {
        self.call("queue.join.v1", serde_json::to_value(request)?)
            .await
    }

    /// An entry's status, position and wait estimate
    pub async fn entry_status(&self, entry_id: &str) -> Result<EntryView> {
        self.call("entry.status.v1", json!({ "entry_id": entry_id }))
            .await
    }

    // ---- Sessions ----

    pub async fn admin_signup(
        &self,
        email: &str,
        name: &str,
        password: &str,
    ) -> Result<AdminSignupResponse> {
        self.call(
            "auth.admin_signup.v1",
            json!({ "email": email, "name": name, "password": password }),
        )
        .await
    }

    /// Sign in as admin; the token is kept for later calls
    pub async fn admin_login(&mut self, email: &str, password: &str) -> Result<LoginResponse> {
        let login: LoginResponse = self
            .call(
                "auth.admin_login.v1",
                json!({ "email": email, "password": password }),
            )
            .await?;
        self.token = Some(login.token.clone());
        Ok(login)
    }

    /// Sign in with a staff access code; the token is kept for later calls
    pub async fn staff_login(&mut self, access_code: &str) -> Result<LoginResponse> {
        let login: LoginResponse = self
            .call("auth.staff_login.v1", json!({ "access_code": access_code }))
            .await?;
        self.token = Some(login.token.clone());
        Ok(login)
    }

    pub async fn logout(&mut self) -> Result<LogoutResponse> {
        let response = self.call("auth.logout.v1", json!({})).await?;
        self.token = None;
        Ok(response)
    }

    pub async fn whoami(&self) -> Result<WhoamiResponse> {
        self.call("auth.whoami.v1", json!({})).await
    }

    // ---- Staff dashboard ----
    // `queue_id: None` means the signed-in staff member's own queue.

    pub async fn queue_entries(&self, queue_id: Option<&str>) -> Result<Vec<DashboardEntry>> {
        self.call("queue.entries.v1", json!({ "queue_id": queue_id }))
            .await
    }

    pub async fn set_queue_status(
        &self,
        queue_id: Option<&str>,
        status: QueueStatus,
    ) -> Result<Queue> {
        self.call(
            "queue.set_status.v1",
            json!({ "queue_id": queue_id, "status": status }),
        )
        .await
    }

    pub async fn call_next(&self, queue_id: Option<&str>) -> Result<EntryView> {
        self.call("queue.call_next.v1", json!({ "queue_id": queue_id }))
            .await
    }

    pub async fn skip(&self, entry_id: &str) -> Result<QueueEntry> {
        self.call("entry.skip.v1", json!({ "entry_id": entry_id }))
            .await
    }

    pub async fn complete(&self, entry_id: &str) -> Result<QueueEntry> {
        self.call("entry.complete.v1", json!({ "entry_id": entry_id }))
            .await
    }

    /// Remove called entries past their response deadline
    pub async fn sweep(&self) -> Result<SweepResponse> {
        self.call("queue.sweep.v1", json!({})).await
    }

    // ---- Admin ----

    pub async fn staff_list(&self) -> Result<Vec<StaffMember>> {
        let response: StaffListResponse = self.call("admin.staff.list.v1", json!({})).await?;
        Ok(response.staff)
    }

    pub async fn staff_create(&self, form: StaffForm) -> Result<StaffMember> {
        self.call("admin.staff.create.v1", serde_json::to_value(form)?)
            .await
    }

    pub async fn staff_update(&self, staff_id: &str, form: StaffForm) -> Result<StaffMember> {
        let mut params = serde_json::to_value(form)?;
        if let Some(obj) = params.as_object_mut() {
            obj.insert("staff_id".to_string(), json!(staff_id));
        }
        self.call("admin.staff.update.v1", params).await
    }

    pub async fn staff_delete(&self, staff_id: &str) -> Result<DeleteResponse> {
        self.call("admin.staff.delete.v1", json!({ "staff_id": staff_id }))
            .await
    }

    pub async fn staff_regenerate_code(&self, staff_id: &str) -> Result<StaffMember> {
        self.call(
            "admin.staff.regenerate_code.v1",
            json!({ "staff_id": staff_id }),
        )
        .await
    }

    pub async fn stats(&self) -> Result<SystemStats> {
        self.call("admin.stats.v1", json!({})).await
    }

    pub async fn maintenance(&self, force_vacuum: bool) -> Result<MaintenanceResponse> {
        self.call(
            "admin.maintenance.v1",
            json!({ "force_vacuum": force_vacuum }),
        )
        .await
    }

    // ---- Change feed ----

    /// Open a WebSocket subscription to row-level changes
    pub async fn subscribe(&self, filter: FeedFilter) -> Result<FeedStream> {
        let ws_url = ws_url(&self.url);
        let client = WsClientBuilder::default()
            .build(&ws_url)
            .await
            .map_err(|e| SdkError::Connection(format!("Failed to open {}: {}", ws_url, e)))?;

        let subscription: Subscription<ChangeEvent> = client
            .subscribe(
                FEED_SUBSCRIBE,
                ObjectParams(serde_json::to_value(filter)?),
                FEED_UNSUBSCRIBE,
            )
            .await?;

        Ok(FeedStream {
            _client: client,
            subscription,
        })
    }
}

/// Live change events. Dropping it unsubscribes.
///
/// Also a `futures::Stream`, so combinators (`filter`, `take`, ...) apply.
pub struct FeedStream {
    _client: WsClient,
    subscription: Subscription<ChangeEvent>,
}

impl FeedStream {
    /// Next matching event; `None` once the server ends the subscription
    pub async fn next(&mut self) -> Option<Result<ChangeEvent>> {
        StreamExt::next(self).await
    }
}

impl Stream for FeedStream {
    type Item = Result<ChangeEvent>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.subscription
            .poll_next_unpin(cx)
            .map(|event| event.map(|event| event.map_err(SdkError::from)))
    }
}

/// `http(s)://` endpoint to the matching `ws(s)://` endpoint
fn ws_url(http_url: &str) -> String {
    if let Some(rest) = http_url.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = http_url.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        http_url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ws_url() {
        assert_eq!(ws_url("http://127.0.0.1:9630"), "ws://127.0.0.1:9630");
        assert_eq!(ws_url("https://queue.uni.edu"), "wss://queue.uni.edu");
        assert_eq!(ws_url("ws://already"), "ws://already");
    }

    #[test]
    fn test_object_params_are_not_wrapped() {
        let raw = ObjectParams(json!({ "entry_id": "e-1" }))
            .to_rpc_params()
            .unwrap()
            .unwrap();
        assert_eq!(raw.get(), r#"{"entry_id":"e-1"}"#);
    }

    #[tokio::test]
    async fn test_with_token_is_kept() {
        let client = QueueDeskClient::connect("http://127.0.0.1:1")
            .await
            .unwrap()
            .with_token("t-1");
        assert_eq!(client.token(), Some("t-1"));
    }
}
