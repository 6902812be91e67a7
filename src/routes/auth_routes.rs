//! HTTP routes for authentication
//!
//! - POST /api/auth/register - Create a staff account (directors only)
//! - POST /api/auth/login    - Check credentials and issue a session token
//! - POST /api/auth/logout   - Stateless; the client drops its token
//! - GET  /api/auth/me       - The authenticated principal

use hyper::body::Body;
use hyper::{Method, Request};
use serde::Serialize;

use crate::auth::RoleSet;
use crate::routes::{auth_header, created, ok, read_json, route_not_found, BoxError, HandlerResult};
use crate::server::AppState;
use crate::services::auth::{AccountInfo, LoginInput, RegisterInput};

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: &'static str,
    pub user: AccountInfo,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: &'static str,
    pub token: String,
    pub expires_at: u64,
    pub user: AccountInfo,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

pub async fn route<B>(state: &AppState, req: Request<B>, path: &[&str]) -> HandlerResult
where
    B: Body,
    B::Error: Into<BoxError>,
{
    match (req.method().clone(), path) {
        (Method::POST, ["register"]) => handle_register(state, req).await,
        (Method::POST, ["login"]) => handle_login(state, req).await,
        (Method::POST, ["logout"]) => ok(&MessageResponse {
            message: "Logout successful",
        }),
        (Method::GET, ["me"]) => {
            let principal = state.gate.authorize(auth_header(&req), RoleSet::ANY).await?;
            ok(&principal)
        }
        _ => Err(route_not_found()),
    }
}

async fn handle_register<B>(state: &AppState, req: Request<B>) -> HandlerResult
where
    B: Body,
    B::Error: Into<BoxError>,
{
    state.gate.authorize(auth_header(&req), RoleSet::DIRECTOR).await?;
    let input: RegisterInput = read_json(req, state.args.max_body_bytes).await?;
    let user = state.auth.register(input).await?;
    created(&RegisterResponse {
        message: "User created successfully",
        user,
    })
}

async fn handle_login<B>(state: &AppState, req: Request<B>) -> HandlerResult
where
    B: Body,
    B::Error: Into<BoxError>,
{
    let input: LoginInput = read_json(req, state.args.max_body_bytes).await?;
    let outcome = state.auth.login(input).await?;
    ok(&LoginResponse {
        message: "Login successful",
        token: outcome.token.token,
        expires_at: outcome.token.expires_at,
        user: outcome.user,
    })
}
