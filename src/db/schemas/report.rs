use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::db::schemas::{impl_record, Metadata};
use crate::db::store::Collection;
use crate::domain::{Opinion, ReportStatus};
use crate::types::RecordId;

/// Engagement report
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AuditReportDoc {
    pub id: RecordId,

    #[serde(flatten)]
    pub metadata: Metadata,

    pub engagement_id: RecordId,

    /// `<engagement_number>-RNN`, unique
    pub report_number: String,

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
    pub status: ReportStatus,

    pub prepared_by: RecordId,

    #[serde(default)]
    pub reviewed_by: Option<RecordId>,

    #[serde(default)]
    pub issue_date: Option<NaiveDate>,
}

impl_record!(AuditReportDoc, Collection::AuditReports, "Report");
