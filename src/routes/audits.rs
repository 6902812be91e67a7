//! HTTP routes for the audit lifecycle
//!
//! Plans and engagements live at the top level; working papers, findings
//! and reports hang off an engagement, action plans off a finding. Status
//! and review updates address the child directly by id.

use hyper::body::Body;
use hyper::{Method, Request};
use serde_json::json;

use crate::auth::RoleSet;
use crate::routes::{
    auth_header, created, ok, parse_id, read_json, read_query, route_not_found, BoxError,
    HandlerResult,
};
use crate::server::AppState;
use crate::services::audits::{
    ActionPlanInput, ActionPlanStatusInput, EngagementFilter, EngagementInput,
    EngagementStatusInput, FindingInput, FindingStatusInput, PlanFilter, PlanInput,
    PlanStatusInput, ReportInput, ReviewInput, WorkingPaperInput,
};

pub async fn route<B>(state: &AppState, req: Request<B>, path: &[&str]) -> HandlerResult
where
    B: Body,
    B::Error: Into<BoxError>,
{
    match (req.method().clone(), path) {
        (_, ["plans", ..]) => plans(state, req, &path[1..]).await,
        (_, ["engagements", ..]) => engagements(state, req, &path[1..]).await,
        (Method::PUT, ["working-papers", id, "review"]) => {
            let principal = state.gate.authorize(auth_header(&req), RoleSet::PLANNERS).await?;
            let paper_id = parse_id(id)?;
            let input: ReviewInput = read_json(req, state.args.max_body_bytes).await?;
            let paper = state.audits.review_working_paper(&principal, paper_id, input).await?;
            ok(&json!({ "message": "Working paper reviewed successfully", "working_paper": paper }))
        }
        (_, ["findings", ..]) => findings(state, req, &path[1..]).await,
        (Method::PUT, ["action-plans", id, "status"]) => {
            let principal = state.gate.authorize(auth_header(&req), RoleSet::ANY).await?;
            let action_id = parse_id(id)?;
            let input: ActionPlanStatusInput = read_json(req, state.args.max_body_bytes).await?;
            let plan = state.audits.set_action_plan_status(&principal, action_id, input).await?;
            ok(&json!({ "message": "Action plan status updated successfully", "action_plan": plan }))
        }
        _ => Err(route_not_found()),
    }
}

async fn plans<B>(state: &AppState, req: Request<B>, path: &[&str]) -> HandlerResult
where
    B: Body,
    B::Error: Into<BoxError>,
{
    let limit = state.args.max_body_bytes;
    match (req.method().clone(), path) {
        (Method::GET, []) => {
            state.gate.authorize(auth_header(&req), RoleSet::ANY).await?;
            let filter: PlanFilter = read_query(&req)?;
            ok(&state.audits.list_plans(filter).await?)
        }
        (Method::POST, []) => {
            let principal = state.gate.authorize(auth_header(&req), RoleSet::PLANNERS).await?;
            let input: PlanInput = read_json(req, limit).await?;
            let plan = state.audits.create_plan(&principal, input).await?;
            created(&json!({
                "id": plan.id,
                "message": "Audit plan created successfully",
                "plan": plan,
            }))
        }
        (Method::PUT, [id, "status"]) => {
            let principal = state.gate.authorize(auth_header(&req), RoleSet::DIRECTOR).await?;
            let plan_id = parse_id(id)?;
            let input: PlanStatusInput = read_json(req, limit).await?;
            let plan = state.audits.set_plan_status(&principal, plan_id, input).await?;
            ok(&json!({ "message": "Audit plan status updated successfully", "plan": plan }))
        }
        _ => Err(route_not_found()),
    }
}

async fn engagements<B>(state: &AppState, req: Request<B>, path: &[&str]) -> HandlerResult
where
    B: Body,
    B::Error: Into<BoxError>,
{
    let limit = state.args.max_body_bytes;
    match (req.method().clone(), path) {
        (Method::GET, []) => {
            state.gate.authorize(auth_header(&req), RoleSet::ANY).await?;
            let filter: EngagementFilter = read_query(&req)?;
            ok(&state.audits.list_engagements(filter).await?)
        }
        (Method::POST, []) => {
            let principal = state.gate.authorize(auth_header(&req), RoleSet::PLANNERS).await?;
            let input: EngagementInput = read_json(req, limit).await?;
            let engagement = state.audits.create_engagement(&principal, input).await?;
            created(&json!({
                "id": engagement.id,
                "engagement_number": engagement.engagement_number,
                "message": "Engagement created successfully",
                "engagement": engagement,
            }))
        }
        (Method::GET, [id]) => {
            state.gate.authorize(auth_header(&req), RoleSet::ANY).await?;
            ok(&state.audits.get_engagement(parse_id(id)?).await?)
        }
        (Method::PUT, [id, "status"]) => {
            let principal = state.gate.authorize(auth_header(&req), RoleSet::PLANNERS).await?;
            let engagement_id = parse_id(id)?;
            let input: EngagementStatusInput = read_json(req, limit).await?;
            let engagement = state
                .audits
                .set_engagement_status(&principal, engagement_id, input)
                .await?;
            ok(&json!({ "message": "Engagement status updated successfully", "engagement": engagement }))
        }
        (Method::GET, [id, "working-papers"]) => {
            state.gate.authorize(auth_header(&req), RoleSet::ANY).await?;
            ok(&state.audits.list_working_papers(parse_id(id)?).await?)
        }
        (Method::POST, [id, "working-papers"]) => {
            let principal = state.gate.authorize(auth_header(&req), RoleSet::ANY).await?;
            let engagement_id = parse_id(id)?;
            let input: WorkingPaperInput = read_json(req, limit).await?;
            let paper = state
                .audits
                .create_working_paper(&principal, engagement_id, input)
                .await?;
            created(&json!({
                "id": paper.id,
                "message": "Working paper created successfully",
                "working_paper": paper,
            }))
        }
        (Method::GET, [id, "findings"]) => {
            state.gate.authorize(auth_header(&req), RoleSet::ANY).await?;
            ok(&state.audits.list_findings(parse_id(id)?).await?)
        }
        (Method::POST, [id, "findings"]) => {
            let principal = state.gate.authorize(auth_header(&req), RoleSet::ANY).await?;
            let engagement_id = parse_id(id)?;
            let input: FindingInput = read_json(req, limit).await?;
            let finding = state.audits.create_finding(&principal, engagement_id, input).await?;
            created(&json!({
                "id": finding.id,
                "finding_number": finding.finding_number,
                "message": "Finding created successfully",
                "finding": finding,
            }))
        }
        (Method::GET, [id, "reports"]) => {
            state.gate.authorize(auth_header(&req), RoleSet::ANY).await?;
            ok(&state.audits.list_reports(parse_id(id)?).await?)
        }
        (Method::POST, [id, "reports"]) => {
            let principal = state.gate.authorize(auth_header(&req), RoleSet::PLANNERS).await?;
            let engagement_id = parse_id(id)?;
            let input: ReportInput = read_json(req, limit).await?;
            let report = state.audits.create_report(&principal, engagement_id, input).await?;
            created(&json!({
                "id": report.id,
                "report_number": report.report_number,
                "message": "Report created successfully",
                "report": report,
            }))
        }
        _ => Err(route_not_found()),
    }
}

async fn findings<B>(state: &AppState, req: Request<B>, path: &[&str]) -> HandlerResult
where
    B: Body,
    B::Error: Into<BoxError>,
{
    let limit = state.args.max_body_bytes;
    match (req.method().clone(), path) {
        (Method::PUT, [id, "status"]) => {
            let principal = state.gate.authorize(auth_header(&req), RoleSet::ASSESSORS).await?;
            let finding_id = parse_id(id)?;
            let input: FindingStatusInput = read_json(req, limit).await?;
            let finding = state.audits.set_finding_status(&principal, finding_id, input).await?;
            ok(&json!({ "message": "Finding status updated successfully", "finding": finding }))
        }
        (Method::GET, [id, "action-plans"]) => {
            state.gate.authorize(auth_header(&req), RoleSet::ANY).await?;
            ok(&state.audits.list_action_plans(parse_id(id)?).await?)
        }
        (Method::POST, [id, "action-plans"]) => {
            let principal = state.gate.authorize(auth_header(&req), RoleSet::ANY).await?;
            let finding_id = parse_id(id)?;
            let input: ActionPlanInput = read_json(req, limit).await?;
            let plan = state.audits.create_action_plan(&principal, finding_id, input).await?;
            created(&json!({
                "id": plan.id,
                "message": "Action plan created successfully",
                "action_plan": plan,
            }))
        }
        _ => Err(route_not_found()),
    }
}
