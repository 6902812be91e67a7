//! HTTP routes for staff accounts
//!
//! - GET /api/users             - All users (directors only)
//! - GET /api/users/profile     - Own profile
//! - PUT /api/users/profile     - Update own profile
//! - PUT /api/users/{id}/status - Activate, deactivate or suspend (directors only)

use hyper::body::Body;
use hyper::{Method, Request};
use serde_json::json;

use crate::auth::RoleSet;
use crate::routes::{auth_header, ok, parse_id, read_json, route_not_found, BoxError, HandlerResult};
use crate::server::AppState;
use crate::services::users::{ProfileInput, StatusInput};

pub async fn route<B>(state: &AppState, req: Request<B>, path: &[&str]) -> HandlerResult
where
    B: Body,
    B::Error: Into<BoxError>,
{
    let limit = state.args.max_body_bytes;
    match (req.method().clone(), path) {
        (Method::GET, []) => {
            state.gate.authorize(auth_header(&req), RoleSet::DIRECTOR).await?;
            ok(&state.users.list().await?)
        }
        (Method::GET, ["profile"]) => {
            let principal = state.gate.authorize(auth_header(&req), RoleSet::ANY).await?;
            ok(&state.users.profile(&principal).await?)
        }
        (Method::PUT, ["profile"]) => {
            let principal = state.gate.authorize(auth_header(&req), RoleSet::ANY).await?;
            let input: ProfileInput = read_json(req, limit).await?;
            let user = state.users.update_profile(&principal, input).await?;
            ok(&json!({ "message": "Profile updated successfully", "user": user }))
        }
        (Method::PUT, [id, "status"]) => {
            let principal = state.gate.authorize(auth_header(&req), RoleSet::DIRECTOR).await?;
            let user_id = parse_id(id)?;
            let input: StatusInput = read_json(req, limit).await?;
            let user = state.users.set_status(&principal, user_id, input).await?;
            ok(&json!({ "message": "User status updated successfully", "user": user }))
        }
        _ => Err(route_not_found()),
    }
}
