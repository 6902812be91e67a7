//! Health endpoint
//!
//! Reports the build this process runs and which store backs it. No
//! authentication, no store round trip.

use serde::Serialize;

use crate::routes::{ok, HandlerResult};
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub commit: &'static str,
    pub built_at: &'static str,
    pub store: &'static str,
}

pub fn handle_health(state: &AppState) -> HandlerResult {
    ok(&HealthResponse {
        status: "OK",
        version: env!("CARGO_PKG_VERSION"),
        commit: env!("GIT_COMMIT_SHORT"),
        built_at: env!("BUILD_TIMESTAMP"),
        store: state.store.backend(),
    })
}
