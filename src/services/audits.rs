//! Audit lifecycle: plans, engagements, working papers, findings, reports
//! and action plans
//!
//! Status columns accept any value of their enum at any time. Some moves
//! stamp a date or an actor (approval, fieldwork start, completion, review,
//! resolution) the first time they happen.

use chrono::{Datelike, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::Principal;
use crate::db::query::{Query, SortOrder};
use crate::db::schemas::{
    ActionPlanDoc, AuditPlanDoc, AuditReportDoc, EngagementDoc, FindingDoc, Metadata,
    RiskAssessmentDoc, WorkingPaperDoc,
};
use crate::db::{DocumentStore, Patch, Repository, UserRepository};
use crate::domain::{
    ActionPlanStatus, EngagementStatus, FindingStatus, Opinion, PlanStatus, ReportStatus,
    ReviewStatus, SequenceAllocator, Severity,
};
use crate::services::names::{to_object, NameDirectory};
use crate::types::{AuditError, RecordId, Result};

/// Attempts at allocating a fresh number when an insert hits a taken one
pub const MAX_NUMBERING_ATTEMPTS: usize = 5;

fn required(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(AuditError::Validation(format!("{field} is required")))
    } else {
        Ok(())
    }
}

// =============================================================================
// Inputs
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct PlanInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlanFilter {
    pub year: Option<i32>,
    pub status: Option<PlanStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlanStatusInput {
    pub status: PlanStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngagementInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub objective: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub audit_plan_id: Option<RecordId>,
    #[serde(default)]
    pub risk_assessment_id: Option<RecordId>,
    #[serde(default)]
    pub lead_auditor: Option<RecordId>,
    #[serde(default)]
    pub planned_start_date: Option<chrono::NaiveDate>,
    #[serde(default)]
    pub planned_end_date: Option<chrono::NaiveDate>,
    #[serde(default)]
    pub budgeted_hours: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngagementFilter {
    pub status: Option<EngagementStatus>,
    pub year: Option<i32>,
    pub plan_id: Option<RecordId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngagementStatusInput {
    pub status: EngagementStatus,
    #[serde(default)]
    pub actual_hours: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkingPaperInput {
    #[serde(default)]
    pub wp_reference: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub file_size: Option<i64>,
    /// Reviewer the paper is assigned to
    #[serde(default)]
    pub reviewed_by: Option<RecordId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewInput {
    pub review_status: ReviewStatus,
    #[serde(default)]
    pub review_comments: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FindingInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub criteria: Option<String>,
    #[serde(default)]
    pub cause: Option<String>,
    #[serde(default)]
    pub effect: Option<String>,
    #[serde(default)]
    pub recommendation: Option<String>,
    pub severity: Severity,
    #[serde(default)]
    pub assigned_to: Option<RecordId>,
    #[serde(default)]
    pub target_date: Option<chrono::NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FindingStatusInput {
    pub status: FindingStatus,
    #[serde(default)]
    pub management_response: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub executive_summary: Option<String>,
    #[serde(default)]
    pub background: Option<String>,
    #[serde(default)]
    pub objectives: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub methodology: Option<String>,
    #[serde(default)]
    pub conclusions: Option<String>,
    #[serde(default)]
    pub opinion: Option<Opinion>,
    #[serde(default)]
    pub issue_date: Option<chrono::NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActionPlanInput {
    #[serde(default)]
    pub action_description: String,
    #[serde(default)]
    pub responsible_person: Option<RecordId>,
    #[serde(default)]
    pub target_completion_date: Option<chrono::NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActionPlanStatusInput {
    pub status: ActionPlanStatus,
    #[serde(default)]
    pub progress_notes: Option<String>,
}

// =============================================================================
// Service
// =============================================================================

/// Run a numbered insert, drawing a new number if the one drawn is taken
async fn with_fresh_number<T, F, Fut>(what: &str, mut attempt: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut tries = 0;
    loop {
        tries += 1;
        match attempt().await {
            Err(AuditError::Conflict(reason)) if tries < MAX_NUMBERING_ATTEMPTS => {
                warn!(what, tries, %reason, "Number already taken, allocating another");
            }
            other => return other,
        }
    }
}

#[derive(Clone)]
pub struct AuditService {
    users: UserRepository,
    plans: Repository<AuditPlanDoc>,
    risks: Repository<RiskAssessmentDoc>,
    engagements: Repository<EngagementDoc>,
    papers: Repository<WorkingPaperDoc>,
    findings: Repository<FindingDoc>,
    reports: Repository<AuditReportDoc>,
    actions: Repository<ActionPlanDoc>,
    sequences: SequenceAllocator,
}

impl AuditService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            users: Repository::new(store.clone()),
            plans: Repository::new(store.clone()),
            risks: Repository::new(store.clone()),
            engagements: Repository::new(store.clone()),
            papers: Repository::new(store.clone()),
            findings: Repository::new(store.clone()),
            reports: Repository::new(store.clone()),
            actions: Repository::new(store.clone()),
            sequences: SequenceAllocator::new(store),
        }
    }

    /// A referenced user must exist; a dangling reference is bad input
    async fn check_user(&self, field: &str, id: Option<RecordId>) -> Result<()> {
        if let Some(id) = id {
            if self.users.get(id).await?.is_none() {
                return Err(AuditError::Validation(format!("{field} refers to unknown user {id}")));
            }
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Plans
    // -------------------------------------------------------------------------

    pub async fn list_plans(&self, filter: PlanFilter) -> Result<Vec<Value>> {
        let query = Query::new()
            .eq_opt("year", filter.year)
            .eq_opt("status", filter.status)
            .sort_by("year", SortOrder::Desc);
        let plans = self.plans.find(&query).await?;
        let names = NameDirectory::load(&self.users).await?;

        plans
            .iter()
            .map(|plan| {
                let mut row = to_object(plan)?;
                names.annotate(&mut row, "creator", Some(plan.created_by));
                names.annotate(&mut row, "approver", plan.approved_by);
                Ok(Value::Object(row))
            })
            .collect()
    }

    pub async fn create_plan(&self, actor: &Principal, input: PlanInput) -> Result<AuditPlanDoc> {
        required("title", &input.title)?;
        let year = input
            .year
            .ok_or_else(|| AuditError::Validation("year is required".into()))?;
        if !(1000..=9999).contains(&year) {
            return Err(AuditError::Validation(format!("year must have four digits, got {year}")));
        }

        let plan = self
            .plans
            .insert(AuditPlanDoc {
                id: 0,
                metadata: Metadata::new(),
                title: input.title.trim().to_string(),
                description: input.description,
                year,
                status: PlanStatus::Draft,
                created_by: actor.id,
                approved_by: None,
                approved_date: None,
            })
            .await?;
        info!(plan_id = plan.id, year, "Audit plan created");
        Ok(plan)
    }

    pub async fn set_plan_status(
        &self,
        actor: &Principal,
        plan_id: RecordId,
        input: PlanStatusInput,
    ) -> Result<AuditPlanDoc> {
        let mut patch = Patch::new().set("status", input.status)?;
        if input.status == PlanStatus::Approved {
            patch = patch
                .set("approved_by", actor.id)?
                .set("approved_date", Utc::now())?;
        }
        let plan = self.plans.patch(plan_id, patch).await?;
        info!(plan_id, status = %input.status, actor = actor.id, "Audit plan status changed");
        Ok(plan)
    }

    // -------------------------------------------------------------------------
    // Engagements
    // -------------------------------------------------------------------------

    async fn engagement_rows(&self, engagements: &[EngagementDoc]) -> Result<Vec<Value>> {
        let names = NameDirectory::load(&self.users).await?;
        let plan_titles: HashMap<RecordId, String> = self
            .plans
            .find(&Query::new())
            .await?
            .into_iter()
            .map(|p| (p.id, p.title))
            .collect();
        let risk_levels: HashMap<RecordId, &'static str> = self
            .risks
            .find(&Query::new())
            .await?
            .iter()
            .map(|r| (r.id, r.risk_level().as_str()))
            .collect();

        engagements
            .iter()
            .map(|engagement| {
                let mut row = to_object(engagement)?;
                names.annotate(&mut row, "lead", engagement.lead_auditor);
                let plan_title = engagement
                    .audit_plan_id
                    .and_then(|id| plan_titles.get(&id))
                    .map(|t| Value::from(t.as_str()))
                    .unwrap_or(Value::Null);
                let risk_level = engagement
                    .risk_assessment_id
                    .and_then(|id| risk_levels.get(&id))
                    .map(|l| Value::from(*l))
                    .unwrap_or(Value::Null);
                row.insert("plan_title".into(), plan_title);
                row.insert("risk_level".into(), risk_level);
                Ok(Value::Object(row))
            })
            .collect()
    }

    /// Engagements, newest first
    pub async fn list_engagements(&self, filter: EngagementFilter) -> Result<Vec<Value>> {
        let query = Query::new()
            .eq_opt("status", filter.status)
            .eq_opt("year", filter.year)
            .eq_opt("audit_plan_id", filter.plan_id)
            .sort_by("id", SortOrder::Desc);
        let engagements = self.engagements.find(&query).await?;
        self.engagement_rows(&engagements).await
    }

    pub async fn get_engagement(&self, engagement_id: RecordId) -> Result<Value> {
        let engagement = self.engagements.require(engagement_id).await?;
        let mut rows = self.engagement_rows(std::slice::from_ref(&engagement)).await?;
        rows.pop()
            .ok_or_else(|| AuditError::Internal("Engagement row went missing".into()))
    }

    /// Open an engagement numbered `YYYY-NNN` within the current year
    pub async fn create_engagement(
        &self,
        actor: &Principal,
        input: EngagementInput,
    ) -> Result<EngagementDoc> {
        self.create_engagement_in_year(actor, input, Utc::now().year()).await
    }

    pub async fn create_engagement_in_year(
        &self,
        actor: &Principal,
        input: EngagementInput,
        year: i32,
    ) -> Result<EngagementDoc> {
        required("title", &input.title)?;
        if let Some(plan_id) = input.audit_plan_id {
            if self.plans.get(plan_id).await?.is_none() {
                return Err(AuditError::Validation(format!("Unknown audit plan {plan_id}")));
            }
        }
        if let Some(risk_id) = input.risk_assessment_id {
            if self.risks.get(risk_id).await?.is_none() {
                return Err(AuditError::Validation(format!("Unknown risk assessment {risk_id}")));
            }
        }
        self.check_user("lead_auditor", input.lead_auditor).await?;
        if let (Some(start), Some(end)) = (input.planned_start_date, input.planned_end_date) {
            if end < start {
                return Err(AuditError::Validation(
                    "planned_end_date must not precede planned_start_date".into(),
                ));
            }
        }

        let template = EngagementDoc {
            id: 0,
            metadata: Metadata::new(),
            engagement_number: String::new(),
            year,
            title: input.title.trim().to_string(),
            objective: input.objective,
            scope: input.scope,
            audit_plan_id: input.audit_plan_id,
            risk_assessment_id: input.risk_assessment_id,
            lead_auditor: input.lead_auditor,
            status: EngagementStatus::Planning,
            planned_start_date: input.planned_start_date,
            planned_end_date: input.planned_end_date,
            actual_start_date: None,
            actual_end_date: None,
            budgeted_hours: input.budgeted_hours,
            actual_hours: None,
        };

        let this = self;
        let template = &template;
        let engagement = with_fresh_number("engagement", move || async move {
            let mut doc = template.clone();
            doc.engagement_number = this.sequences.next_engagement_number(year).await?;
            this.engagements.insert(doc).await
        })
        .await?;

        info!(
            engagement_id = engagement.id,
            number = %engagement.engagement_number,
            actor = actor.id,
            "Engagement created"
        );
        Ok(engagement)
    }

    pub async fn set_engagement_status(
        &self,
        actor: &Principal,
        engagement_id: RecordId,
        input: EngagementStatusInput,
    ) -> Result<EngagementDoc> {
        let current = self.engagements.require(engagement_id).await?;
        let today = Utc::now().date_naive();

        let mut patch = Patch::new()
            .set("status", input.status)?
            .set_opt("actual_hours", input.actual_hours)?;
        match input.status {
            EngagementStatus::Fieldwork if current.actual_start_date.is_none() => {
                patch = patch.set("actual_start_date", today)?;
            }
            EngagementStatus::Completed if current.actual_end_date.is_none() => {
                patch = patch.set("actual_end_date", today)?;
            }
            _ => {}
        }

        let engagement = self.engagements.patch(engagement_id, patch).await?;
        info!(engagement_id, status = %input.status, actor = actor.id, "Engagement status changed");
        Ok(engagement)
    }

    // -------------------------------------------------------------------------
    // Working papers
    // -------------------------------------------------------------------------

    pub async fn list_working_papers(&self, engagement_id: RecordId) -> Result<Vec<Value>> {
        self.engagements.require(engagement_id).await?;
        let query = Query::new()
            .eq("engagement_id", engagement_id)
            .sort_by("wp_reference", SortOrder::Asc);
        let papers = self.papers.find(&query).await?;
        let names = NameDirectory::load(&self.users).await?;

        papers
            .iter()
            .map(|paper| {
                let mut row = to_object(paper)?;
                names.annotate(&mut row, "creator", Some(paper.created_by));
                names.annotate(&mut row, "reviewer", paper.reviewed_by);
                Ok(Value::Object(row))
            })
            .collect()
    }

    pub async fn create_working_paper(
        &self,
        actor: &Principal,
        engagement_id: RecordId,
        input: WorkingPaperInput,
    ) -> Result<WorkingPaperDoc> {
        self.engagements.require(engagement_id).await?;
        required("wp_reference", &input.wp_reference)?;
        required("title", &input.title)?;
        self.check_user("reviewed_by", input.reviewed_by).await?;

        let paper = self
            .papers
            .insert(WorkingPaperDoc {
                id: 0,
                metadata: Metadata::new(),
                wp_reference: input.wp_reference.trim().to_string(),
                engagement_id,
                title: input.title.trim().to_string(),
                description: input.description,
                file_path: input.file_path,
                file_type: input.file_type,
                file_size: input.file_size,
                created_by: actor.id,
                reviewed_by: input.reviewed_by,
                reviewed_date: None,
                review_status: ReviewStatus::Draft,
                review_comments: None,
            })
            .await?;
        info!(paper_id = paper.id, engagement_id, "Working paper created");
        Ok(paper)
    }

    pub async fn review_working_paper(
        &self,
        actor: &Principal,
        paper_id: RecordId,
        input: ReviewInput,
    ) -> Result<WorkingPaperDoc> {
        let patch = Patch::new()
            .set("review_status", input.review_status)?
            .set_opt("review_comments", input.review_comments)?
            .set("reviewed_by", actor.id)?
            .set("reviewed_date", Utc::now())?;

        let paper = self.papers.patch(paper_id, patch).await?;
        info!(paper_id, status = %input.review_status, reviewer = actor.id, "Working paper reviewed");
        Ok(paper)
    }

    // -------------------------------------------------------------------------
    // Findings
    // -------------------------------------------------------------------------

    pub async fn list_findings(&self, engagement_id: RecordId) -> Result<Vec<Value>> {
        self.engagements.require(engagement_id).await?;
        let query = Query::new()
            .eq("engagement_id", engagement_id)
            .sort_by("finding_number", SortOrder::Asc);
        let findings = self.findings.find(&query).await?;
        let names = NameDirectory::load(&self.users).await?;

        findings
            .iter()
            .map(|finding| {
                let mut row = to_object(finding)?;
                names.annotate(&mut row, "assigned", finding.assigned_to);
                Ok(Value::Object(row))
            })
            .collect()
    }

    /// Record a finding numbered `FNN` within its engagement
    pub async fn create_finding(
        &self,
        actor: &Principal,
        engagement_id: RecordId,
        input: FindingInput,
    ) -> Result<FindingDoc> {
        self.engagements.require(engagement_id).await?;
        required("title", &input.title)?;
        self.check_user("assigned_to", input.assigned_to).await?;

        let template = FindingDoc {
            id: 0,
            metadata: Metadata::new(),
            finding_number: String::new(),
            engagement_id,
            title: input.title.trim().to_string(),
            condition: input.condition,
            criteria: input.criteria,
            cause: input.cause,
            effect: input.effect,
            recommendation: input.recommendation,
            severity: input.severity,
            status: FindingStatus::Open,
            assigned_to: input.assigned_to,
            target_date: input.target_date,
            resolved_date: None,
            management_response: None,
        };

        let this = self;
        let template = &template;
        let finding = with_fresh_number("finding", move || async move {
            let mut doc = template.clone();
            doc.finding_number = this.sequences.next_finding_number(engagement_id).await?;
            this.findings.insert(doc).await
        })
        .await?;

        info!(
            finding_id = finding.id,
            engagement_id,
            number = %finding.finding_number,
            actor = actor.id,
            "Finding recorded"
        );
        Ok(finding)
    }

    pub async fn set_finding_status(
        &self,
        actor: &Principal,
        finding_id: RecordId,
        input: FindingStatusInput,
    ) -> Result<FindingDoc> {
        let mut patch = Patch::new()
            .set("status", input.status)?
            .set_opt("management_response", input.management_response)?;
        if input.status == FindingStatus::Resolved {
            patch = patch.set("resolved_date", Utc::now().date_naive())?;
        }

        let finding = self.findings.patch(finding_id, patch).await?;
        info!(finding_id, status = %input.status, actor = actor.id, "Finding status changed");
        Ok(finding)
    }

    // -------------------------------------------------------------------------
    // Reports
    // -------------------------------------------------------------------------

    pub async fn list_reports(&self, engagement_id: RecordId) -> Result<Vec<Value>> {
        self.engagements.require(engagement_id).await?;
        let query = Query::new()
            .eq("engagement_id", engagement_id)
            .sort_by("report_number", SortOrder::Asc);
        let reports = self.reports.find(&query).await?;
        let names = NameDirectory::load(&self.users).await?;

        reports
            .iter()
            .map(|report| {
                let mut row = to_object(report)?;
                names.annotate(&mut row, "preparer", Some(report.prepared_by));
                names.annotate(&mut row, "reviewer", report.reviewed_by);
                Ok(Value::Object(row))
            })
            .collect()
    }

    /// Draft a report numbered `<engagement number>-RNN`
    pub async fn create_report(
        &self,
        actor: &Principal,
        engagement_id: RecordId,
        input: ReportInput,
    ) -> Result<AuditReportDoc> {
        let engagement = self.engagements.require(engagement_id).await?;
        required("title", &input.title)?;

        let template = AuditReportDoc {
            id: 0,
            metadata: Metadata::new(),
            engagement_id,
            report_number: String::new(),
            title: input.title.trim().to_string(),
            executive_summary: input.executive_summary,
            background: input.background,
            objectives: input.objectives,
            scope: input.scope,
            methodology: input.methodology,
            conclusions: input.conclusions,
            opinion: input.opinion,
            status: ReportStatus::Draft,
            prepared_by: actor.id,
            reviewed_by: None,
            issue_date: input.issue_date,
        };

        let this = self;
        let template = &template;
        let engagement_number = engagement.engagement_number.as_str();
        let report = with_fresh_number("report", move || async move {
            let mut doc = template.clone();
            doc.report_number = this
                .sequences
                .next_report_number(engagement_id, engagement_number)
                .await?;
            this.reports.insert(doc).await
        })
        .await?;

        info!(report_id = report.id, number = %report.report_number, "Report drafted");
        Ok(report)
    }

    // -------------------------------------------------------------------------
    // Action plans
    // -------------------------------------------------------------------------

    pub async fn list_action_plans(&self, finding_id: RecordId) -> Result<Vec<Value>> {
        self.findings.require(finding_id).await?;
        let query = Query::new()
            .eq("finding_id", finding_id)
            .sort_by("target_completion_date", SortOrder::Asc);
        let plans = self.actions.find(&query).await?;
        let names = NameDirectory::load(&self.users).await?;

        plans
            .iter()
            .map(|plan| {
                let mut row = to_object(plan)?;
                names.annotate(&mut row, "responsible", plan.responsible_person);
                Ok(Value::Object(row))
            })
            .collect()
    }

    pub async fn create_action_plan(
        &self,
        actor: &Principal,
        finding_id: RecordId,
        input: ActionPlanInput,
    ) -> Result<ActionPlanDoc> {
        self.findings.require(finding_id).await?;
        required("action_description", &input.action_description)?;
        self.check_user("responsible_person", input.responsible_person).await?;

        let plan = self
            .actions
            .insert(ActionPlanDoc {
                id: 0,
                metadata: Metadata::new(),
                finding_id,
                action_description: input.action_description.trim().to_string(),
                responsible_person: input.responsible_person,
                target_completion_date: input.target_completion_date,
                actual_completion_date: None,
                status: ActionPlanStatus::Pending,
                progress_notes: None,
            })
            .await?;
        info!(action_plan_id = plan.id, finding_id, actor = actor.id, "Action plan created");
        Ok(plan)
    }

    pub async fn set_action_plan_status(
        &self,
        actor: &Principal,
        action_plan_id: RecordId,
        input: ActionPlanStatusInput,
    ) -> Result<ActionPlanDoc> {
        let current = self.actions.require(action_plan_id).await?;
        let mut patch = Patch::new()
            .set("status", input.status)?
            .set_opt("progress_notes", input.progress_notes)?;
        if input.status == ActionPlanStatus::Completed && current.actual_completion_date.is_none() {
            patch = patch.set("actual_completion_date", Utc::now().date_naive())?;
        }

        let plan = self.actions.patch(action_plan_id, patch).await?;
        info!(action_plan_id, status = %input.status, actor = actor.id, "Action plan status changed");
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::db::MemoryStore;

    fn director() -> Principal {
        Principal {
            id: 1,
            email: "dir@x.test".into(),
            role: Role::Director,
            first_name: "Dana".into(),
            last_name: "Reyes".into(),
        }
    }

    fn engagement(title: &str) -> EngagementInput {
        EngagementInput {
            title: title.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_engagement_numbers_per_year() {
        let audits = AuditService::new(Arc::new(MemoryStore::new()));
        let actor = director();

        let a = audits.create_engagement_in_year(&actor, engagement("Payroll"), 2026).await.unwrap();
        let b = audits.create_engagement_in_year(&actor, engagement("Treasury"), 2026).await.unwrap();
        let c = audits.create_engagement_in_year(&actor, engagement("IT"), 2027).await.unwrap();

        assert_eq!(a.engagement_number, "2026-001");
        assert_eq!(b.engagement_number, "2026-002");
        assert_eq!(c.engagement_number, "2027-001");
        assert_eq!(a.status, EngagementStatus::Planning);
    }

    #[tokio::test]
    async fn test_taken_number_is_skipped() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let audits = AuditService::new(store.clone());
        let actor = director();

        // Simulate a record numbered outside the counter, e.g. imported data
        store
            .insert(
                crate::db::Collection::Engagements,
                serde_json::json!({"id": 999, "engagement_number": "2026-001"}),
            )
            .await
            .unwrap();

        let created = audits.create_engagement_in_year(&actor, engagement("Payroll"), 2026).await.unwrap();
        assert_eq!(created.engagement_number, "2026-002");
    }

    #[tokio::test]
    async fn test_dangling_references_rejected() {
        let audits = AuditService::new(Arc::new(MemoryStore::new()));
        let input = EngagementInput {
            title: "Payroll".into(),
            audit_plan_id: Some(42),
            ..Default::default()
        };
        assert!(matches!(
            audits.create_engagement(&director(), input).await,
            Err(AuditError::Validation(_))
        ));
        assert!(matches!(
            audits.create_engagement(&director(), engagement("  ")).await,
            Err(AuditError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_children_of_missing_parent() {
        let audits = AuditService::new(Arc::new(MemoryStore::new()));
        let err = audits
            .create_working_paper(
                &director(),
                77,
                WorkingPaperInput {
                    wp_reference: "WP1".into(),
                    title: "Walkthrough".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AuditError::NotFound(_)));
        assert!(matches!(audits.list_findings(77).await, Err(AuditError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_status_stamps() {
        let audits = AuditService::new(Arc::new(MemoryStore::new()));
        let actor = director();
        let created = audits.create_engagement(&actor, engagement("Payroll")).await.unwrap();

        let fieldwork = audits
            .set_engagement_status(
                &actor,
                created.id,
                EngagementStatusInput {
                    status: EngagementStatus::Fieldwork,
                    actual_hours: None,
                },
            )
            .await
            .unwrap();
        assert!(fieldwork.actual_start_date.is_some());
        assert!(fieldwork.actual_end_date.is_none());

        // Any-to-any: straight back to planning is allowed
        let back = audits
            .set_engagement_status(
                &actor,
                created.id,
                EngagementStatusInput {
                    status: EngagementStatus::Planning,
                    actual_hours: Some(12),
                },
            )
            .await
            .unwrap();
        assert_eq!(back.status, EngagementStatus::Planning);
        assert_eq!(back.actual_hours, Some(12));

        let plan = audits
            .create_plan(
                &actor,
                PlanInput {
                    title: "FY26".into(),
                    description: None,
                    year: Some(2026),
                },
            )
            .await
            .unwrap();
        let approved = audits
            .set_plan_status(&actor, plan.id, PlanStatusInput { status: PlanStatus::Approved })
            .await
            .unwrap();
        assert_eq!(approved.approved_by, Some(actor.id));
        assert!(approved.approved_date.is_some());
    }
}
