//! Read-only HTTP view of the latest status.
//!
//! Plain HTTP by default, HTTPS when a certificate and key are given. Every
//! client IP gets a small request budget; CORS is open so dashboards on other
//! origins can poll `/status`.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::extract::{ConnectInfo, Request, State};
use axum::http::{Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::core::status::{SharedStatus, StatusSummary};

pub const DEFAULT_ADDR: &str = "0.0.0.0:3770";

/// Sustained requests per second per client IP, also the burst size.
pub const REQUESTS_PER_SECOND: u32 = 3;

/// Idle clients are forgotten once this many are tracked.
const MAX_TRACKED_CLIENTS: usize = 1024;

const GRACE_PERIOD: Duration = Duration::from_secs(5);

type ClientLimiter = DefaultKeyedRateLimiter<IpAddr>;

#[derive(Clone)]
struct AppState {
    status: SharedStatus,
    name: Arc<str>,
}

/// Body of `GET /status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub code: i32,
    pub data: StatusSummary,
}

/// PEM certificate chain and private key for HTTPS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsFiles {
    pub cert: PathBuf,
    pub key: PathBuf,
}

pub fn build_router(status: SharedStatus, name: &str) -> Router {
    build_router_with_limit(status, name, REQUESTS_PER_SECOND)
}

pub fn build_router_with_limit(status: SharedStatus, name: &str, per_second: u32) -> Router {
    let limiter = Arc::new(client_limiter(per_second));
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods([Method::GET]);

    Router::new()
        .route("/status", get(handle_status))
        .with_state(AppState {
            status,
            name: Arc::from(name),
        })
        .layer(middleware::from_fn_with_state(limiter, limit_requests))
        .layer(cors)
}

fn client_limiter(per_second: u32) -> ClientLimiter {
    let rate = NonZeroU32::new(per_second).unwrap_or(NonZeroU32::MIN);
    RateLimiter::keyed(Quota::per_second(rate))
}

async fn handle_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let data = state.status.read().summary(&state.name);
    Json(StatusResponse { code: 0, data })
}

/// Answer 429 once a client IP exceeds its budget.
///
/// Without connection info (a server not started through [`serve`]) all
/// requests share one budget.
async fn limit_requests(
    State(limiter): State<Arc<ClientLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    if limiter.check_key(&client).is_err() {
        log::debug!("Request from {} rate limited", client);
        return StatusCode::TOO_MANY_REQUESTS.into_response();
    }
    if limiter.len() > MAX_TRACKED_CLIENTS {
        limiter.retain_recent();
    }
    next.run(request).await
}

/// Serve until `shutdown` fires, over HTTPS when `tls` is given.
pub async fn serve(
    addr: &str,
    tls: Option<TlsFiles>,
    router: Router,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let app = router.into_make_service_with_connect_info::<SocketAddr>();

    let Some(tls) = tls else {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to listen on {}", addr))?;
        log::info!("Status endpoint listening on http://{}/status", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await
            .context("HTTP server failed")?;
        return Ok(());
    };

    let config = RustlsConfig::from_pem_file(&tls.cert, &tls.key)
        .await
        .with_context(|| {
            format!(
                "Failed to load TLS certificate {:?} and key {:?}",
                tls.cert, tls.key
            )
        })?;
    let socket_addr = tokio::net::lookup_host(addr)
        .await
        .with_context(|| format!("Failed to resolve {}", addr))?
        .next()
        .with_context(|| format!("No address found for {}", addr))?;

    let handle = Handle::new();
    let shutdown_handle = handle.clone();
    tokio::spawn(async move {
        let _ = shutdown.recv().await;
        shutdown_handle.graceful_shutdown(Some(GRACE_PERIOD));
    });

    log::info!("Status endpoint listening on https://{}/status", addr);
    axum_server::bind_rustls(socket_addr, config)
        .handle(handle)
        .serve(app)
        .await
        .context("HTTPS server failed")?;
    Ok(())
}
