//! JSON-RPC Server
//!
//! HTTP and WebSocket on one TCP port. Method calls work over both; the
//! change feed subscription needs WebSocket.

use crate::handler::{RpcContext, RpcHandler};
use crate::session::SessionRegistry;
use jsonrpsee::core::SubscriptionResult;
use jsonrpsee::server::{
    serve_with_graceful_shutdown, stop_channel, HttpRequest, Methods, Server, ServerHandle,
    StopHandle,
};
use jsonrpsee::types::error::INVALID_PARAMS_CODE;
use jsonrpsee::types::{ErrorObjectOwned, Params};
use jsonrpsee::{ConnectionId, Extensions, PendingSubscriptionSink, RpcModule, SubscriptionMessage};
use queuedesk_core::application::ChangeFeed;
use queuedesk_core::domain::FeedFilter;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::Service;
use tracing::{debug, info, warn};

const DEFAULT_RPC_HOST: &str = "127.0.0.1";
const DEFAULT_RPC_PORT: u16 = 9630;

/// Change feed method names
pub const FEED_SUBSCRIBE: &str = "feed.subscribe.v1";
pub const FEED_NOTIFICATION: &str = "feed.event";
pub const FEED_UNSUBSCRIBE: &str = "feed.unsubscribe.v1";

/// RPC Server Configuration
#[derive(Debug, Clone)]
pub struct RpcServerConfig {
    pub host: String,
    pub port: u16,
    pub rate_limit_burst: u32,
    pub rate_limit_per_sec: u32,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RPC_HOST.to_string(),
            port: DEFAULT_RPC_PORT,
            rate_limit_burst: 60,
            rate_limit_per_sec: 10,
        }
    }
}

/// RPC Server
pub struct RpcServer {
    config: RpcServerConfig,
    handler: Arc<RpcHandler>,
}

impl RpcServer {
    pub fn new(config: RpcServerConfig, ctx: RpcContext, sessions: Arc<SessionRegistry>) -> Self {
        let handler = RpcHandler::new(
            ctx,
            sessions,
            config.rate_limit_burst,
            config.rate_limit_per_sec,
        );
        Self {
            config,
            handler: Arc::new(handler),
        }
    }

    /// Start the JSON-RPC server
    ///
    /// Returns the bound address (port 0 picks a free port) and the handle
    /// used to stop it.
    pub async fn start(self) -> Result<(SocketAddr, ServerHandle), String> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| format!("Failed to bind {}: {}", addr, e))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| format!("Failed to read bound address: {}", e))?;

        let methods: Methods = self.module()?.into();
        let (stop_handle, server_handle) = stop_channel();
        tokio::spawn(accept_loop(listener, methods, stop_handle));

        info!(
            addr = %local_addr,
            "JSON-RPC server started (HTTP + WebSocket)"
        );
        Ok((local_addr, server_handle))
    }

    fn module(&self) -> Result<RpcModule<()>, String> {
        let mut module = RpcModule::new(());
        let h = &self.handler;

        // Public
        register(&mut module, h, "directory.list.v1", |h, p| async move { h.directory(p).await })?;
        register_with_caller(&mut module, h, "queue.join.v1", |h, caller, p| async move {
            h.join(&caller, p).await
        })?;
        register(&mut module, h, "entry.status.v1", |h, p| async move {
            h.entry_status(p).await
        })?;

        // Auth
        register_with_caller(&mut module, h, "auth.admin_signup.v1", |h, caller, p| async move {
            h.admin_signup(&caller, p).await
        })?;
        register_with_caller(&mut module, h, "auth.admin_login.v1", |h, caller, p| async move {
            h.admin_login(&caller, p).await
        })?;
        register_with_caller(&mut module, h, "auth.staff_login.v1", |h, caller, p| async move {
            h.staff_login(&caller, p).await
        })?;
        register(&mut module, h, "auth.logout.v1", |h, p| async move { h.logout(p).await })?;
        register(&mut module, h, "auth.whoami.v1", |h, p| async move { h.whoami(p).await })?;

        // Staff dashboard
        register(&mut module, h, "queue.entries.v1", |h, p| async move {
            h.queue_entries(p).await
        })?;
        register(&mut module, h, "queue.set_status.v1", |h, p| async move {
            h.set_queue_status(p).await
        })?;
        register(&mut module, h, "queue.call_next.v1", |h, p| async move {
            h.call_next(p).await
        })?;
        register(&mut module, h, "entry.skip.v1", |h, p| async move { h.skip(p).await })?;
        register(&mut module, h, "entry.complete.v1", |h, p| async move {
            h.complete(p).await
        })?;
        register(&mut module, h, "queue.sweep.v1", |h, p| async move { h.sweep(p).await })?;

        // Admin
        register(&mut module, h, "admin.staff.list.v1", |h, p| async move {
            h.staff_list(p).await
        })?;
        register(&mut module, h, "admin.staff.create.v1", |h, p| async move {
            h.staff_create(p).await
        })?;
        register(&mut module, h, "admin.staff.update.v1", |h, p| async move {
            h.staff_update(p).await
        })?;
        register(&mut module, h, "admin.staff.delete.v1", |h, p| async move {
            h.staff_delete(p).await
        })?;
        register(&mut module, h, "admin.staff.regenerate_code.v1", |h, p| async move {
            h.staff_regenerate_code(p).await
        })?;
        register(&mut module, h, "admin.stats.v1", |h, p| async move { h.stats(p).await })?;
        register(&mut module, h, "admin.maintenance.v1", |h, p| async move {
            h.maintenance(p).await
        })?;

        // Change feed
        let feed = self.handler.feed().clone();
        module
            .register_subscription(
                FEED_SUBSCRIBE,
                FEED_NOTIFICATION,
                FEED_UNSUBSCRIBE,
                move |params, pending, _, _| forward_feed(feed.clone(), params, pending),
            )
            .map_err(|e| e.to_string())?;

        Ok(module)
    }
}

/// Peer address of the TCP connection a request arrived on
#[derive(Debug, Clone, Copy)]
struct CallerAddr(SocketAddr);

fn with_caller<B>(mut request: HttpRequest<B>, addr: SocketAddr) -> HttpRequest<B> {
    request.extensions_mut().insert(CallerAddr(addr));
    request
}

/// Rate limit key: the peer IP, else the connection
fn caller_key(extensions: &Extensions) -> String {
    if let Some(CallerAddr(addr)) = extensions.get::<CallerAddr>() {
        return addr.ip().to_string();
    }
    match extensions.get::<ConnectionId>() {
        Some(conn) => format!("conn-{}", conn.0),
        None => "unknown".to_string(),
    }
}

/// Accept connections until the server is stopped.
///
/// Each connection is served by jsonrpsee (HTTP or WebSocket upgrade) with
/// its peer address attached to every request.
async fn accept_loop(listener: TcpListener, methods: Methods, stop_handle: StopHandle) {
    let svc_builder = Server::builder().to_service_builder();

    loop {
        let (socket, remote_addr) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(conn) => conn,
                Err(e) => {
                    warn!(error = %e, "Failed to accept connection");
                    continue;
                }
            },
            _ = stop_handle.clone().shutdown() => break,
        };

        let methods = methods.clone();
        let stop = stop_handle.clone();
        let svc_builder = svc_builder.clone();
        let svc = tower::service_fn(move |request| {
            let mut svc = svc_builder.clone().build(methods.clone(), stop.clone());
            async move { svc.call(with_caller(request, remote_addr)).await }
        });

        tokio::spawn(serve_with_graceful_shutdown(
            socket,
            svc,
            stop_handle.clone().shutdown(),
        ));
    }

    debug!("JSON-RPC listener closed");
}

/// Pump matching change events into one WebSocket subscription until either side goes away
async fn forward_feed(
    feed: ChangeFeed,
    params: Params<'static>,
    pending: PendingSubscriptionSink,
) -> SubscriptionResult {
    let filter = params
        .parse::<Option<FeedFilter>>()
        .map_err(|e| e.message().to_string())?
        .unwrap_or_default();
    let mut subscription = feed.subscribe(filter);
    let sink = pending.accept().await?;
    debug!(subscribers = feed.subscriber_count(), "Feed subscriber joined");

    loop {
        tokio::select! {
            _ = sink.closed() => break,
            event = subscription.next() => {
                let Some(event) = event else { break };
                let message = SubscriptionMessage::from_json(&event)?;
                if sink.send(message).await.is_err() {
                    break;
                }
            }
        }
    }

    debug!("Feed subscriber left");
    Ok(())
}

/// Register one request/response method.
///
/// Params must be a JSON object; omitted params count as `{}`.
fn register<P, R, F, Fut>(
    module: &mut RpcModule<()>,
    handler: &Arc<RpcHandler>,
    name: &'static str,
    method: F,
) -> Result<(), String>
where
    P: DeserializeOwned + Send + 'static,
    R: Serialize + Clone + Send + 'static,
    F: Fn(Arc<RpcHandler>, P) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<R, ErrorObjectOwned>> + Send + 'static,
{
    register_with_caller(module, handler, name, move |h, _caller, p| method(h, p))
}

/// Register a method that also needs the caller's rate limit key
fn register_with_caller<P, R, F, Fut>(
    module: &mut RpcModule<()>,
    handler: &Arc<RpcHandler>,
    name: &'static str,
    method: F,
) -> Result<(), String>
where
    P: DeserializeOwned + Send + 'static,
    R: Serialize + Clone + Send + 'static,
    F: Fn(Arc<RpcHandler>, String, P) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<R, ErrorObjectOwned>> + Send + 'static,
{
    let handler = handler.clone();
    module
        .register_async_method(name, move |params, _, extensions| {
            let handler = handler.clone();
            let method = method.clone();
            let caller = caller_key(&extensions);
            async move {
                let req: P = match params.parse::<Option<P>>()? {
                    Some(req) => req,
                    None => serde_json::from_str("{}").map_err(|e| {
                        ErrorObjectOwned::owned(INVALID_PARAMS_CODE, e.to_string(), None::<()>)
                    })?,
                };
                method(handler, caller, req).await
            }
        })
        .map_err(|e| e.to_string())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caller_key_prefers_peer_ip() {
        let mut extensions = Extensions::new();
        extensions.insert(ConnectionId(7));
        assert_eq!(caller_key(&extensions), "conn-7");

        extensions.insert(CallerAddr("10.1.2.3:55012".parse().unwrap()));
        assert_eq!(caller_key(&extensions), "10.1.2.3");
    }

    #[test]
    fn test_caller_key_without_transport_info() {
        assert_eq!(caller_key(&Extensions::new()), "unknown");
    }

    #[test]
    fn test_with_caller_tags_request() {
        let addr: SocketAddr = "192.168.0.9:4000".parse().unwrap();
        let request = with_caller(HttpRequest::<()>::new(()), addr);
        let tagged = request.extensions().get::<CallerAddr>().map(|c| c.0);
        assert_eq!(tagged, Some(addr));
    }
}
