//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling. Every request goes
//! through `dispatch`, which strips the `/api` prefix, hands the remaining
//! path segments to the resource's route module, and turns any error into
//! its JSON body.

use hyper::body::Body;
use hyper::header::{
    HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN,
};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::auth::{AccessGate, CredentialHasher, JwtCodec};
use crate::config::Args;
use crate::db::{DocumentStore, IdentityStore, UserRepository};
use crate::routes::{self, empty_response, error_response, route_not_found, ApiResponse, BoxError};
use crate::services::{AuditService, AuthService, DashboardService, RiskService, UserService};
use crate::types::AuditError;

const ALLOWED_METHODS: &str = "GET, POST, PUT, OPTIONS";
const ALLOWED_HEADERS: &str = "Content-Type, Authorization";
const REQUEST_ID_HEADER: &str = "x-request-id";

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub store: Arc<dyn DocumentStore>,
    /// Bearer token check plus live account lookup
    pub gate: AccessGate,
    pub auth: AuthService,
    pub users: UserService,
    pub audits: AuditService,
    pub risks: RiskService,
    pub dashboard: DashboardService,
}

impl AppState {
    /// Wire every service onto one store
    pub fn new(args: Args, store: Arc<dyn DocumentStore>, tokens: JwtCodec, hasher: CredentialHasher) -> Self {
        let identity: Arc<dyn IdentityStore> = Arc::new(UserRepository::new(store.clone()));

        Self {
            gate: AccessGate::new(identity.clone(), tokens.clone()),
            auth: AuthService::new(identity.clone(), hasher, tokens),
            users: UserService::new(identity),
            audits: AuditService::new(store.clone()),
            risks: RiskService::new(store.clone()),
            dashboard: DashboardService::new(store.clone()),
            store,
            args,
        }
    }
}

/// Start the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<(), AuditError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!("auditdesk listening on {}", state.args.listen);
    if state.args.dev_mode {
        warn!("Development mode enabled - do not expose this instance");
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { Ok::<_, Infallible>(dispatch(&state, req).await) }
                    });

                    if let Err(err) = http1::Builder::new()
                        .serve_connection(io, service)
                        .await
                    {
                        debug!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route one request and log its outcome
pub async fn dispatch<B>(state: &AppState, req: Request<B>) -> ApiResponse
where
    B: Body,
    B::Error: Into<BoxError>,
{
    let started = Instant::now();
    let request_id = Uuid::new_v4();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let mut response = if method == Method::OPTIONS {
        empty_response(StatusCode::NO_CONTENT)
    } else {
        match route(state, req, &path).await {
            Ok(response) => response,
            Err(err) => {
                log_failure(&request_id, &method, &path, &err);
                error_response(&err)
            }
        }
    };

    apply_cors(state, &mut response);
    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    info!(
        request_id = %request_id,
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request"
    );
    response
}

async fn route<B>(state: &AppState, req: Request<B>, path: &str) -> routes::HandlerResult
where
    B: Body,
    B::Error: Into<BoxError>,
{
    let Some(rest) = path.strip_prefix("/api") else {
        return Err(route_not_found());
    };
    let segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();

    match segments.as_slice() {
        ["health"] if req.method() == Method::GET => routes::health::handle_health(state),
        ["auth", tail @ ..] => routes::auth_routes::route(state, req, tail).await,
        ["users", tail @ ..] => routes::users::route(state, req, tail).await,
        ["audits", tail @ ..] => routes::audits::route(state, req, tail).await,
        ["risks", tail @ ..] => routes::risks::route(state, req, tail).await,
        ["dashboard", tail @ ..] => routes::dashboard::route(state, req, tail).await,
        _ => Err(route_not_found()),
    }
}

fn log_failure(request_id: &Uuid, method: &Method, path: &str, err: &AuditError) {
    if err.is_internal() {
        error!(request_id = %request_id, %method, path, error = ?err, "Request failed");
    } else if matches!(err.status_code(), StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
        warn!(request_id = %request_id, %method, path, code = err.code(), "Request rejected");
    } else {
        debug!(request_id = %request_id, %method, path, code = err.code(), "Request rejected");
    }
}

fn apply_cors(state: &AppState, response: &mut ApiResponse) {
    let headers = response.headers_mut();
    if let Ok(origin) = HeaderValue::from_str(&state.args.cors_origin) {
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    }
    headers.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(ALLOWED_METHODS));
    headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(ALLOWED_HEADERS));
}
