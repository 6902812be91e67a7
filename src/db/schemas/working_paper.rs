use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::schemas::{impl_record, Metadata};
use crate::db::store::Collection;
use crate::domain::ReviewStatus;
use crate::types::RecordId;

/// Evidence document attached to an engagement
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct WorkingPaperDoc {
    pub id: RecordId,

    #[serde(flatten)]
    pub metadata: Metadata,

    /// Reference within the engagement, e.g. `WP1`
    pub wp_reference: String,

    pub engagement_id: RecordId,
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub file_size: Option<i64>,

    pub created_by: RecordId,

    /// Assigned or actual reviewer
    #[serde(default)]
    pub reviewed_by: Option<RecordId>,

    #[serde(default)]
    pub reviewed_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub review_status: ReviewStatus,

    #[serde(default)]
    pub review_comments: Option<String>,
}

impl_record!(WorkingPaperDoc, Collection::WorkingPapers, "Working paper");
