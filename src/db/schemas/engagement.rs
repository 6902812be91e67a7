//! Audit engagement schema

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::db::schemas::{impl_record, Metadata};
use crate::db::store::Collection;
use crate::domain::EngagementStatus;
use crate::types::RecordId;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct EngagementDoc {
    pub id: RecordId,

    #[serde(flatten)]
    pub metadata: Metadata,

    /// `YYYY-NNN`, unique
    pub engagement_number: String,

    /// Calendar year the number was allocated in
    pub year: i32,

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
    pub status: EngagementStatus,

    #[serde(default)]
    pub planned_start_date: Option<NaiveDate>,
    #[serde(default)]
    pub planned_end_date: Option<NaiveDate>,
    #[serde(default)]
    pub actual_start_date: Option<NaiveDate>,
    #[serde(default)]
    pub actual_end_date: Option<NaiveDate>,

    #[serde(default)]
    pub budgeted_hours: Option<i32>,
    #[serde(default)]
    pub actual_hours: Option<i32>,
}

impl_record!(EngagementDoc, Collection::Engagements, "Engagement");
