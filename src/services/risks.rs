//! Risk assessments
//!
//! The stored level is recomputed from the residual score on every create
//! and update; any level a client sends is ignored.

use chrono::{Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use crate::auth::Principal;
use crate::db::query::{Query, SortOrder};
use crate::db::schemas::RiskAssessmentDoc;
use crate::db::{DocumentStore, Repository, UserRepository};
use crate::domain::{RiskLevel, RiskScore};
use crate::services::names::{to_object, NameDirectory};
use crate::types::{AuditError, RecordId, Result};

/// Body for creating or updating an assessment
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RiskInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub area_assessed: String,
    #[serde(default)]
    pub inherent_risk_score: Option<i64>,
    #[serde(default)]
    pub residual_risk_score: Option<i64>,
    #[serde(default)]
    pub risk_factors: Option<String>,
    #[serde(default)]
    pub controls_identified: Option<String>,
    #[serde(default)]
    pub assessment_date: Option<NaiveDate>,
    #[serde(default)]
    pub next_review_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RiskFilter {
    pub risk_level: Option<RiskLevel>,
    pub area: Option<String>,
}

/// Validated fields shared by create and update
struct ValidRisk {
    title: String,
    area_assessed: String,
    inherent: RiskScore,
    residual: RiskScore,
}

fn score(field: &str, value: Option<i64>) -> Result<RiskScore> {
    let value = value.ok_or_else(|| AuditError::Validation(format!("{field} is required")))?;
    RiskScore::parse(field, value)
}

impl RiskInput {
    fn validate(&self) -> Result<ValidRisk> {
        if self.title.trim().is_empty() {
            return Err(AuditError::Validation("title is required".into()));
        }
        if self.area_assessed.trim().is_empty() {
            return Err(AuditError::Validation("area_assessed is required".into()));
        }
        Ok(ValidRisk {
            title: self.title.trim().to_string(),
            area_assessed: self.area_assessed.trim().to_string(),
            inherent: score("inherent_risk_score", self.inherent_risk_score)?,
            residual: score("residual_risk_score", self.residual_risk_score)?,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HeatMapCell {
    pub id: RecordId,
    pub title: String,
    pub area_assessed: String,
    pub inherent_risk_score: RiskScore,
    pub residual_risk_score: RiskScore,
    pub risk_level: RiskLevel,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LevelCount {
    pub risk_level: RiskLevel,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HeatMap {
    pub heat_map_data: Vec<HeatMapCell>,
    pub risk_summary: Vec<LevelCount>,
}

#[derive(Clone)]
pub struct RiskService {
    users: UserRepository,
    risks: Repository<RiskAssessmentDoc>,
}

impl RiskService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            users: Repository::new(store.clone()),
            risks: Repository::new(store),
        }
    }

    fn row(names: &NameDirectory, risk: &RiskAssessmentDoc) -> Result<Value> {
        let mut row = to_object(risk)?;
        names.annotate(&mut row, "assessor", Some(risk.assessed_by));
        Ok(Value::Object(row))
    }

    /// Assessments by inherent score, highest first
    pub async fn list(&self, filter: RiskFilter) -> Result<Vec<Value>> {
        let mut query = Query::new()
            .eq_opt("risk_level", filter.risk_level)
            .sort_by("inherent_risk_score", SortOrder::Desc);
        if let Some(area) = filter.area.as_deref().map(str::trim).filter(|a| !a.is_empty()) {
            query = query.contains("area_assessed", area);
        }

        let risks = self.risks.find(&query).await?;
        let names = NameDirectory::load(&self.users).await?;
        risks.iter().map(|r| Self::row(&names, r)).collect()
    }

    pub async fn get(&self, risk_id: RecordId) -> Result<Value> {
        let risk = self.risks.require(risk_id).await?;
        let names = NameDirectory::load(&self.users).await?;
        Self::row(&names, &risk)
    }

    pub async fn create(&self, actor: &Principal, input: RiskInput) -> Result<RiskAssessmentDoc> {
        let valid = input.validate()?;

        let mut risk = RiskAssessmentDoc::new(
            valid.title,
            valid.area_assessed,
            valid.inherent,
            valid.residual,
            actor.id,
        );
        risk.description = input.description;
        risk.risk_factors = input.risk_factors;
        risk.controls_identified = input.controls_identified;
        risk.assessment_date = Some(input.assessment_date.unwrap_or_else(|| Utc::now().date_naive()));
        risk.next_review_date = input.next_review_date;

        let risk = self.risks.insert(risk).await?;
        info!(risk_id = risk.id, level = %risk.risk_level(), "Risk assessment created");
        Ok(risk)
    }

    /// Replace the editable fields; assessor and assessment date are kept
    pub async fn update(&self, actor: &Principal, risk_id: RecordId, input: RiskInput) -> Result<RiskAssessmentDoc> {
        let valid = input.validate()?;
        let mut risk = self.risks.require(risk_id).await?;

        risk.title = valid.title;
        risk.area_assessed = valid.area_assessed;
        risk.set_scores(valid.inherent, valid.residual);
        risk.description = input.description;
        risk.risk_factors = input.risk_factors;
        risk.controls_identified = input.controls_identified;
        risk.next_review_date = input.next_review_date;

        self.risks.save(&mut risk).await?;
        info!(risk_id, level = %risk.risk_level(), actor = actor.id, "Risk assessment updated");
        Ok(risk)
    }

    /// Assessments dated within the last year plus a count per level
    pub async fn heat_map(&self) -> Result<HeatMap> {
        let today = Utc::now().date_naive();
        let since = today.checked_sub_months(Months::new(12)).unwrap_or(today);

        let recent = self
            .risks
            .find(
                &Query::new()
                    .gte("assessment_date", since)
                    .sort_by("residual_risk_score", SortOrder::Desc),
            )
            .await?;

        let heat_map_data = recent
            .into_iter()
            .map(|r| HeatMapCell {
                id: r.id,
                inherent_risk_score: r.inherent_risk_score(),
                residual_risk_score: r.residual_risk_score(),
                risk_level: r.risk_level(),
                title: r.title,
                area_assessed: r.area_assessed,
            })
            .collect();

        Ok(HeatMap {
            heat_map_data,
            risk_summary: self.level_counts().await?,
        })
    }

    /// Number of assessments at each level, over all assessments
    pub async fn level_counts(&self) -> Result<Vec<LevelCount>> {
        let mut counts = Vec::with_capacity(RiskLevel::ALL.len());
        for level in RiskLevel::ALL {
            let count = self.risks.count(&Query::new().eq("risk_level", level)).await?;
            counts.push(LevelCount {
                risk_level: level,
                count,
            });
        }
        Ok(counts)
    }
}
