//! HTTP routes for risk assessments
//!
//! - GET  /api/risks          - List, filtered by `risk_level` and `area`
//! - POST /api/risks          - Create (assessors)
//! - GET  /api/risks/heatmap  - Last year's assessments plus level counts
//! - GET  /api/risks/{id}     - One assessment
//! - PUT  /api/risks/{id}     - Update (assessors)

use hyper::body::Body;
use hyper::{Method, Request};
use serde_json::json;

use crate::auth::RoleSet;
use crate::routes::{
    auth_header, created, ok, parse_id, read_json, read_query, route_not_found, BoxError,
    HandlerResult,
};
use crate::server::AppState;
use crate::services::risks::{RiskFilter, RiskInput};

pub async fn route<B>(state: &AppState, req: Request<B>, path: &[&str]) -> HandlerResult
where
    B: Body,
    B::Error: Into<BoxError>,
{
    let limit = state.args.max_body_bytes;
    match (req.method().clone(), path) {
        (Method::GET, []) => {
            state.gate.authorize(auth_header(&req), RoleSet::ANY).await?;
            let filter: RiskFilter = read_query(&req)?;
            ok(&state.risks.list(filter).await?)
        }
        (Method::POST, []) => {
            let principal = state.gate.authorize(auth_header(&req), RoleSet::ASSESSORS).await?;
            let input: RiskInput = read_json(req, limit).await?;
            let risk = state.risks.create(&principal, input).await?;
            created(&json!({
                "id": risk.id,
                "risk_level": risk.risk_level(),
                "message": "Risk assessment created successfully",
                "risk": risk,
            }))
        }
        (Method::GET, ["heatmap"]) => {
            state.gate.authorize(auth_header(&req), RoleSet::ANY).await?;
            ok(&state.risks.heat_map().await?)
        }
        (Method::GET, [id]) => {
            state.gate.authorize(auth_header(&req), RoleSet::ANY).await?;
            ok(&state.risks.get(parse_id(id)?).await?)
        }
        (Method::PUT, [id]) => {
            let principal = state.gate.authorize(auth_header(&req), RoleSet::ASSESSORS).await?;
            let risk_id = parse_id(id)?;
            let input: RiskInput = read_json(req, limit).await?;
            let risk = state.risks.update(&principal, risk_id, input).await?;
            ok(&json!({
                "risk_level": risk.risk_level(),
                "message": "Risk assessment updated successfully",
                "risk": risk,
            }))
        }
        _ => Err(route_not_found()),
    }
}
