//! Annual audit plan schema

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::schemas::{impl_record, Metadata};
use crate::db::store::Collection;
use crate::domain::PlanStatus;
use crate::types::RecordId;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AuditPlanDoc {
    pub id: RecordId,

    #[serde(flatten)]
    pub metadata: Metadata,

    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    pub year: i32,

    #[serde(default)]
    pub status: PlanStatus,

    pub created_by: RecordId,

    #[serde(default)]
    pub approved_by: Option<RecordId>,

    #[serde(default)]
    pub approved_date: Option<DateTime<Utc>>,
}

impl_record!(AuditPlanDoc, Collection::AuditPlans, "Audit plan");
