//! Dashboard summaries

use chrono::{Datelike, NaiveDate, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::auth::Principal;
use crate::db::query::{Query, SortOrder};
use crate::db::schemas::{ActionPlanDoc, EngagementDoc, FindingDoc, WorkingPaperDoc};
use crate::db::{DocumentStore, Repository, UserRepository};
use crate::domain::{ActionPlanStatus, EngagementStatus, FindingStatus, ReviewStatus, Severity};
use crate::services::names::NameDirectory;
use crate::services::risks::{LevelCount, RiskService};
use crate::types::{RecordId, Result};

const RECENT_ENGAGEMENTS: usize = 10;
const OVERDUE_ACTIONS: usize = 5;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StatusCount {
    pub status: EngagementStatus,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FindingCount {
    pub severity: Severity,
    pub status: FindingStatus,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EngagementSummary {
    pub id: RecordId,
    pub title: String,
    pub engagement_number: String,
    pub status: EngagementStatus,
    pub planned_start_date: Option<NaiveDate>,
    pub planned_end_date: Option<NaiveDate>,
    pub lead_first_name: Option<String>,
    pub lead_last_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActionSummary {
    pub id: RecordId,
    pub action_description: String,
    pub target_completion_date: Option<NaiveDate>,
    pub status: ActionPlanStatus,
    pub finding_title: Option<String>,
    pub engagement_title: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewSummary {
    pub id: RecordId,
    pub title: String,
    pub wp_reference: String,
    pub created_at: chrono::DateTime<Utc>,
    pub engagement_title: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Metrics {
    pub total_engagements: u64,
    pub completed_engagements: u64,
    /// Whole percent
    pub completion_rate: u64,
    pub year: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    pub audit_statistics: Vec<StatusCount>,
    pub risk_statistics: Vec<LevelCount>,
    pub finding_statistics: Vec<FindingCount>,
    pub recent_engagements: Vec<EngagementSummary>,
    pub overdue_actions: Vec<ActionSummary>,
    pub metrics: Metrics,
}

#[derive(Debug, Clone, Serialize)]
pub struct MyTasks {
    pub my_engagements: Vec<EngagementSummary>,
    pub my_action_plans: Vec<ActionSummary>,
    pub pending_reviews: Vec<ReviewSummary>,
}

/// Rounded completion percentage; zero when nothing is planned
pub fn completion_rate(completed: u64, total: u64) -> u64 {
    if total == 0 {
        0
    } else {
        ((completed as f64 / total as f64) * 100.0).round() as u64
    }
}

#[derive(Clone)]
pub struct DashboardService {
    users: UserRepository,
    engagements: Repository<EngagementDoc>,
    papers: Repository<WorkingPaperDoc>,
    findings: Repository<FindingDoc>,
    actions: Repository<ActionPlanDoc>,
    risks: RiskService,
}

impl DashboardService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            users: Repository::new(store.clone()),
            engagements: Repository::new(store.clone()),
            papers: Repository::new(store.clone()),
            findings: Repository::new(store.clone()),
            actions: Repository::new(store.clone()),
            risks: RiskService::new(store),
        }
    }

    pub async fn overview(&self) -> Result<Overview> {
        self.overview_for_year(Utc::now().year()).await
    }

    pub async fn overview_for_year(&self, year: i32) -> Result<Overview> {
        let mut audit_statistics = Vec::with_capacity(EngagementStatus::ALL.len());
        for &status in EngagementStatus::ALL {
            let count = self
                .engagements
                .count(&Query::new().eq("year", year).eq("status", status))
                .await?;
            audit_statistics.push(StatusCount { status, count });
        }

        let mut finding_statistics = Vec::new();
        for &severity in Severity::ALL {
            for &status in FindingStatus::ALL {
                let count = self
                    .findings
                    .count(&Query::new().eq("severity", severity).eq("status", status))
                    .await?;
                if count > 0 {
                    finding_statistics.push(FindingCount {
                        severity,
                        status,
                        count,
                    });
                }
            }
        }

        let names = NameDirectory::load(&self.users).await?;
        let recent = self
            .engagements
            .find(
                &Query::new()
                    .sort_by("id", SortOrder::Desc)
                    .limit(RECENT_ENGAGEMENTS),
            )
            .await?;
        let recent_engagements = recent.iter().map(|e| engagement_summary(&names, e)).collect();

        let today = Utc::now().date_naive();
        let overdue = self
            .actions
            .find(
                &Query::new()
                    .ne("status", ActionPlanStatus::Completed)
                    .lt("target_completion_date", today)
                    .sort_by("target_completion_date", SortOrder::Asc)
                    .limit(OVERDUE_ACTIONS),
            )
            .await?;
        let overdue_actions = self.action_summaries(overdue).await?;

        let total_engagements: u64 = audit_statistics.iter().map(|s| s.count).sum();
        let completed_engagements: u64 = audit_statistics
            .iter()
            .filter(|s| s.status == EngagementStatus::Completed)
            .map(|s| s.count)
            .sum();

        Ok(Overview {
            audit_statistics,
            risk_statistics: self.risks.level_counts().await?,
            finding_statistics,
            recent_engagements,
            overdue_actions,
            metrics: Metrics {
                total_engagements,
                completed_engagements,
                completion_rate: completion_rate(completed_engagements, total_engagements),
                year,
            },
        })
    }

    pub async fn my_tasks(&self, principal: &Principal) -> Result<MyTasks> {
        let names = NameDirectory::load(&self.users).await?;

        let engagements = self
            .engagements
            .find(
                &Query::new()
                    .eq("lead_auditor", principal.id)
                    .ne("status", EngagementStatus::Completed)
                    .sort_by("planned_start_date", SortOrder::Asc),
            )
            .await?;
        let my_engagements = engagements.iter().map(|e| engagement_summary(&names, e)).collect();

        let actions = self
            .actions
            .find(
                &Query::new()
                    .eq("responsible_person", principal.id)
                    .ne("status", ActionPlanStatus::Completed)
                    .sort_by("target_completion_date", SortOrder::Asc),
            )
            .await?;
        let my_action_plans = self.action_summaries(actions).await?;

        let papers = self
            .papers
            .find(
                &Query::new()
                    .eq("review_status", ReviewStatus::UnderReview)
                    .eq("reviewed_by", principal.id),
            )
            .await?;
        let mut engagement_titles: HashMap<RecordId, Option<String>> = HashMap::new();
        let mut pending_reviews = Vec::with_capacity(papers.len());
        for paper in papers {
            let engagement_title = match engagement_titles.get(&paper.engagement_id) {
                Some(title) => title.clone(),
                None => {
                    let title = self.engagements.get(paper.engagement_id).await?.map(|e| e.title);
                    engagement_titles.insert(paper.engagement_id, title.clone());
                    title
                }
            };
            let author = names.get(paper.created_by);
            pending_reviews.push(ReviewSummary {
                id: paper.id,
                title: paper.title,
                wp_reference: paper.wp_reference,
                created_at: paper.metadata.created_at,
                engagement_title,
                first_name: author.map(|(f, _)| f.to_string()),
                last_name: author.map(|(_, l)| l.to_string()),
            });
        }

        Ok(MyTasks {
            my_engagements,
            my_action_plans,
            pending_reviews,
        })
    }

    /// Attach finding and engagement titles to action plans
    async fn action_summaries(&self, actions: Vec<ActionPlanDoc>) -> Result<Vec<ActionSummary>> {
        let mut summaries = Vec::with_capacity(actions.len());
        for action in actions {
            let finding = self.findings.get(action.finding_id).await?;
            let engagement = match &finding {
                Some(f) => self.engagements.get(f.engagement_id).await?,
                None => None,
            };
            summaries.push(ActionSummary {
                id: action.id,
                action_description: action.action_description,
                target_completion_date: action.target_completion_date,
                status: action.status,
                finding_title: finding.map(|f| f.title),
                engagement_title: engagement.map(|e| e.title),
            });
        }
        Ok(summaries)
    }
}

fn engagement_summary(names: &NameDirectory, engagement: &EngagementDoc) -> EngagementSummary {
    let lead = engagement.lead_auditor.and_then(|id| names.get(id));
    EngagementSummary {
        id: engagement.id,
        title: engagement.title.clone(),
        engagement_number: engagement.engagement_number.clone(),
        status: engagement.status,
        planned_start_date: engagement.planned_start_date,
        planned_end_date: engagement.planned_end_date,
        lead_first_name: lead.map(|(f, _)| f.to_string()),
        lead_last_name: lead.map(|(_, l)| l.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_rate() {
        assert_eq!(completion_rate(0, 0), 0);
        assert_eq!(completion_rate(1, 3), 33);
        assert_eq!(completion_rate(2, 3), 67);
        assert_eq!(completion_rate(4, 4), 100);
    }
}
