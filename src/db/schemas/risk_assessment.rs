//! Risk assessment schema

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::db::schemas::{impl_record, Metadata};
use crate::db::store::Collection;
use crate::domain::{classify, RiskLevel, RiskScore};
use crate::types::RecordId;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct RiskAssessmentDoc {
    pub id: RecordId,

    #[serde(flatten)]
    pub metadata: Metadata,

    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    pub area_assessed: String,

    inherent_risk_score: RiskScore,
    residual_risk_score: RiskScore,

    /// Always `classify(residual_risk_score)`
    risk_level: RiskLevel,

    #[serde(default)]
    pub risk_factors: Option<String>,

    #[serde(default)]
    pub controls_identified: Option<String>,

    pub assessed_by: RecordId,

    #[serde(default)]
    pub assessment_date: Option<NaiveDate>,

    #[serde(default)]
    pub next_review_date: Option<NaiveDate>,
}

impl_record!(RiskAssessmentDoc, Collection::RiskAssessments, "Risk assessment");

impl RiskAssessmentDoc {
    pub fn new(
        title: String,
        area_assessed: String,
        inherent: RiskScore,
        residual: RiskScore,
        assessed_by: RecordId,
    ) -> Self {
        Self {
            id: 0,
            metadata: Metadata::new(),
            title,
            description: None,
            area_assessed,
            inherent_risk_score: inherent,
            residual_risk_score: residual,
            risk_level: classify(residual),
            risk_factors: None,
            controls_identified: None,
            assessed_by,
            assessment_date: None,
            next_review_date: None,
        }
    }

    /// Replace both scores; the level follows the residual score
    pub fn set_scores(&mut self, inherent: RiskScore, residual: RiskScore) {
        self.inherent_risk_score = inherent;
        self.residual_risk_score = residual;
        self.risk_level = classify(residual);
    }

    pub fn inherent_risk_score(&self) -> RiskScore {
        self.inherent_risk_score
    }

    pub fn residual_risk_score(&self) -> RiskScore {
        self.residual_risk_score
    }

    pub fn risk_level(&self) -> RiskLevel {
        self.risk_level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_tracks_residual() {
        let score = |v| RiskScore::parse("score", v).unwrap();
        let mut risk = RiskAssessmentDoc::new("Payroll".into(), "HR".into(), score(9), score(6), 1);
        assert_eq!(risk.risk_level(), RiskLevel::High);

        risk.set_scores(score(9), score(3));
        assert_eq!(risk.risk_level(), RiskLevel::Low);

        let json = serde_json::to_value(&risk).unwrap();
        assert_eq!(json["risk_level"], "low");
        assert_eq!(json["residual_risk_score"], 3);
    }
}
