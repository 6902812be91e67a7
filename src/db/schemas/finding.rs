use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::db::schemas::{impl_record, Metadata};
use crate::db::store::Collection;
use crate::domain::{FindingStatus, Severity};
use crate::types::RecordId;

/// Audit finding. `finding_number` is unique per engagement.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct FindingDoc {
    pub id: RecordId,

    #[serde(flatten)]
    pub metadata: Metadata,

    pub finding_number: String,
    pub engagement_id: RecordId,
    pub title: String,

    /// What was found
    #[serde(default)]
    pub condition: Option<String>,
    /// What should be
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
    pub status: FindingStatus,

    #[serde(default)]
    pub assigned_to: Option<RecordId>,

    #[serde(default)]
    pub target_date: Option<NaiveDate>,
    #[serde(default)]
    pub resolved_date: Option<NaiveDate>,

    #[serde(default)]
    pub management_response: Option<String>,
}

impl_record!(FindingDoc, Collection::Findings, "Finding");
