//! HTTP routes for the dashboard

use hyper::{Method, Request};

use crate::auth::RoleSet;
use crate::routes::{auth_header, ok, route_not_found, HandlerResult};
use crate::server::AppState;

pub async fn route<B>(state: &AppState, req: Request<B>, path: &[&str]) -> HandlerResult {
    let principal = state.gate.authorize(auth_header(&req), RoleSet::ANY).await?;
    match (req.method(), path) {
        (&Method::GET, ["overview"]) => ok(&state.dashboard.overview().await?),
        (&Method::GET, ["my-tasks"]) => ok(&state.dashboard.my_tasks(&principal).await?),
        _ => Err(route_not_found()),
    }
}
