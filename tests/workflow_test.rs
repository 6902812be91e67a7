//! End-to-end audit workflow against the memory store

use chrono::{Datelike, NaiveDate, Utc};
use std::collections::HashSet;
use std::sync::Arc;

use auditdesk::auth::{Principal, Role};
use auditdesk::db::schemas::UserDoc;
use auditdesk::db::{DocumentStore, IdentityStore, MemoryStore, UserRepository};
use auditdesk::domain::{
    ActionPlanStatus, EngagementStatus, FindingStatus, PlanStatus, ReviewStatus, RiskLevel,
    Severity,
};
use auditdesk::services::audits::{
    ActionPlanInput, ActionPlanStatusInput, EngagementInput, EngagementStatusInput, FindingInput,
    FindingStatusInput, PlanInput, PlanStatusInput, ReportInput, ReviewInput, WorkingPaperInput,
};
use auditdesk::services::risks::RiskInput;
use auditdesk::services::{AuditService, DashboardService, RiskService};
use auditdesk::types::AuditError;

async fn staff(users: &UserRepository, email: &str, role: Role) -> Principal {
    let user = IdentityStore::insert(
        users,
        UserDoc::new(email.into(), "unused".into(), "Kim".into(), email.into(), role),
    )
    .await
    .unwrap();
    Principal::from(&user)
}

fn risk(residual: i64) -> RiskInput {
    RiskInput {
        title: "Vendor master changes".into(),
        area_assessed: "Procurement".into(),
        inherent_risk_score: Some(8),
        residual_risk_score: Some(residual),
        ..Default::default()
    }
}

fn finding(title: &str, severity: Severity) -> FindingInput {
    FindingInput {
        title: title.into(),
        condition: None,
        criteria: None,
        cause: None,
        effect: None,
        recommendation: None,
        severity,
        assigned_to: None,
        target_date: None,
    }
}

#[tokio::test]
async fn risk_level_follows_residual_score() {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    let users = UserRepository::new(store.clone());
    let assessor = staff(&users, "assessor@x.test", Role::Auditor).await;
    let risks = RiskService::new(store);

    let created = risks.create(&assessor, risk(6)).await.unwrap();
    assert_eq!(created.risk_level(), RiskLevel::High);

    let updated = risks.update(&assessor, created.id, risk(3)).await.unwrap();
    assert_eq!(updated.risk_level(), RiskLevel::Low);

    let stored = risks.get(created.id).await.unwrap();
    assert_eq!(stored["risk_level"], "low");
    assert_eq!(stored["residual_risk_score"], 3);
    assert_eq!(stored["assessor_first_name"], "Kim");
}

#[tokio::test]
async fn concurrent_engagements_get_distinct_numbers() {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    let users = UserRepository::new(store.clone());
    let planner = staff(&users, "planner@x.test", Role::SeniorAuditor).await;
    let audits = AuditService::new(store);

    let mut tasks = Vec::new();
    for i in 0..25 {
        let audits = audits.clone();
        let planner = planner.clone();
        tasks.push(tokio::spawn(async move {
            let input = EngagementInput {
                title: format!("Engagement {i}"),
                ..Default::default()
            };
            audits.create_engagement_in_year(&planner, input, 2031).await
        }));
    }

    let mut numbers = HashSet::new();
    for task in tasks {
        let engagement = task.await.unwrap().unwrap();
        assert!(numbers.insert(engagement.engagement_number));
    }

    let expected: HashSet<String> = (1..=25).map(|n| format!("2031-{n:03}")).collect();
    assert_eq!(numbers, expected);
}

#[tokio::test]
async fn engagement_lifecycle() {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    let users = UserRepository::new(store.clone());
    let director = staff(&users, "director@x.test", Role::Director).await;
    let senior = staff(&users, "senior@x.test", Role::SeniorAuditor).await;
    let auditor = staff(&users, "auditor@x.test", Role::Auditor).await;

    let audits = AuditService::new(store.clone());
    let risks = RiskService::new(store.clone());
    let dashboard = DashboardService::new(store.clone());
    let year = Utc::now().year();

    // Plan, approved by the director
    let plan = audits
        .create_plan(
            &senior,
            PlanInput {
                title: format!("Annual plan {year}"),
                description: None,
                year: Some(year),
            },
        )
        .await
        .unwrap();
    assert_eq!(plan.status, PlanStatus::Draft);
    let plan = audits
        .set_plan_status(&director, plan.id, PlanStatusInput { status: PlanStatus::Approved })
        .await
        .unwrap();
    assert_eq!(plan.approved_by, Some(director.id));
    assert!(plan.approved_date.is_some());

    // Engagement tied to the plan and a risk assessment
    let assessment = risks.create(&auditor, risk(9)).await.unwrap();
    let engagement = audits
        .create_engagement(
            &senior,
            EngagementInput {
                title: "Procure to pay".into(),
                audit_plan_id: Some(plan.id),
                risk_assessment_id: Some(assessment.id),
                lead_auditor: Some(auditor.id),
                planned_start_date: NaiveDate::from_ymd_opt(year, 3, 1),
                planned_end_date: NaiveDate::from_ymd_opt(year, 4, 30),
                budgeted_hours: Some(120),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(engagement.engagement_number, format!("{year}-001"));

    let row = audits.get_engagement(engagement.id).await.unwrap();
    assert_eq!(row["plan_title"], format!("Annual plan {year}"));
    assert_eq!(row["risk_level"], "critical");
    assert_eq!(row["lead_last_name"], "auditor@x.test");

    let engagement = audits
        .set_engagement_status(
            &senior,
            engagement.id,
            EngagementStatusInput {
                status: EngagementStatus::Fieldwork,
                actual_hours: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(engagement.actual_start_date, Some(Utc::now().date_naive()));
    assert!(engagement.actual_end_date.is_none());

    // Working paper awaiting the senior's review
    let paper = audits
        .create_working_paper(
            &auditor,
            engagement.id,
            WorkingPaperInput {
                wp_reference: "WP-01".into(),
                title: "Vendor master walkthrough".into(),
                reviewed_by: Some(senior.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(paper.review_status, ReviewStatus::Draft);
    audits
        .review_working_paper(
            &senior,
            paper.id,
            ReviewInput {
                review_status: ReviewStatus::UnderReview,
                review_comments: Some("Tie out sample 4".into()),
            },
        )
        .await
        .unwrap();

    let tasks = dashboard.my_tasks(&senior).await.unwrap();
    assert_eq!(tasks.pending_reviews.len(), 1);
    assert_eq!(tasks.pending_reviews[0].wp_reference, "WP-01");
    assert_eq!(tasks.pending_reviews[0].engagement_title.as_deref(), Some("Procure to pay"));

    // Findings are numbered within the engagement
    let f1 = audits
        .create_finding(&auditor, engagement.id, finding("Duplicate vendors", Severity::High))
        .await
        .unwrap();
    let f2 = audits
        .create_finding(&auditor, engagement.id, finding("Missing approvals", Severity::Medium))
        .await
        .unwrap();
    assert_eq!(f1.finding_number, "F01");
    assert_eq!(f2.finding_number, "F02");
    assert_eq!(f1.status, FindingStatus::Open);

    let listed = audits.list_findings(engagement.id).await.unwrap();
    let numbers: Vec<&str> = listed.iter().map(|f| f["finding_number"].as_str().unwrap()).collect();
    assert_eq!(numbers, vec!["F01", "F02"]);

    // Action plan owned by the lead auditor, overdue since last year
    let action = audits
        .create_action_plan(
            &auditor,
            f1.id,
            ActionPlanInput {
                action_description: "Purge duplicate vendor records".into(),
                responsible_person: Some(auditor.id),
                target_completion_date: NaiveDate::from_ymd_opt(year - 1, 12, 31),
            },
        )
        .await
        .unwrap();
    assert_eq!(action.status, ActionPlanStatus::Pending);

    let tasks = dashboard.my_tasks(&auditor).await.unwrap();
    assert_eq!(tasks.my_engagements.len(), 1);
    assert_eq!(tasks.my_action_plans.len(), 1);
    assert_eq!(tasks.my_action_plans[0].finding_title.as_deref(), Some("Duplicate vendors"));

    let overview = dashboard.overview_for_year(year).await.unwrap();
    assert_eq!(overview.metrics.total_engagements, 1);
    assert_eq!(overview.metrics.completion_rate, 0);
    assert_eq!(overview.overdue_actions.len(), 1);
    assert_eq!(overview.recent_engagements[0].engagement_number, format!("{year}-001"));
    let fieldwork = overview
        .audit_statistics
        .iter()
        .find(|s| s.status == EngagementStatus::Fieldwork)
        .unwrap();
    assert_eq!(fieldwork.count, 1);
    assert_eq!(overview.finding_statistics.len(), 2);

    // Close out
    let action = audits
        .set_action_plan_status(
            &auditor,
            action.id,
            ActionPlanStatusInput {
                status: ActionPlanStatus::Completed,
                progress_notes: Some("Done".into()),
            },
        )
        .await
        .unwrap();
    assert!(action.actual_completion_date.is_some());

    let f1 = audits
        .set_finding_status(
            &senior,
            f1.id,
            FindingStatusInput {
                status: FindingStatus::Resolved,
                management_response: Some("Agreed".into()),
            },
        )
        .await
        .unwrap();
    assert!(f1.resolved_date.is_some());

    let report = audits
        .create_report(
            &senior,
            engagement.id,
            ReportInput {
                title: "Procure to pay review".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(report.report_number, format!("{year}-001-R01"));

    let engagement = audits
        .set_engagement_status(
            &senior,
            engagement.id,
            EngagementStatusInput {
                status: EngagementStatus::Completed,
                actual_hours: Some(110),
            },
        )
        .await
        .unwrap();
    assert!(engagement.actual_end_date.is_some());
    assert_eq!(engagement.actual_hours, Some(110));

    let overview = dashboard.overview_for_year(year).await.unwrap();
    assert_eq!(overview.metrics.completed_engagements, 1);
    assert_eq!(overview.metrics.completion_rate, 100);
    assert!(overview.overdue_actions.is_empty());
    assert!(dashboard.my_tasks(&auditor).await.unwrap().my_engagements.is_empty());
}

#[tokio::test]
async fn missing_parents_are_not_found() {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    let users = UserRepository::new(store.clone());
    let auditor = staff(&users, "auditor@x.test", Role::Auditor).await;
    let audits = AuditService::new(store);

    let err = audits
        .create_finding(&auditor, 41, finding("Orphan", Severity::Low))
        .await
        .unwrap_err();
    assert!(matches!(err, AuditError::NotFound(_)));

    let err = audits
        .create_action_plan(
            &auditor,
            41,
            ActionPlanInput {
                action_description: "Nothing to fix".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AuditError::NotFound(_)));

    assert!(matches!(
        audits.list_reports(41).await,
        Err(AuditError::NotFound(_))
    ));
}
