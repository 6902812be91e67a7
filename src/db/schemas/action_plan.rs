use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::db::schemas::{impl_record, Metadata};
use crate::db::store::Collection;
use crate::domain::ActionPlanStatus;
use crate::types::RecordId;

/// Corrective action agreed for a finding
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ActionPlanDoc {
    pub id: RecordId,

    #[serde(flatten)]
    pub metadata: Metadata,

    pub finding_id: RecordId,
    pub action_description: String,

    #[serde(default)]
    pub responsible_person: Option<RecordId>,

    #[serde(default)]
    pub target_completion_date: Option<NaiveDate>,
    #[serde(default)]
    pub actual_completion_date: Option<NaiveDate>,

    #[serde(default)]
    pub status: ActionPlanStatus,

    #[serde(default)]
    pub progress_notes: Option<String>,
}

impl_record!(ActionPlanDoc, Collection::ActionPlans, "Action plan");
