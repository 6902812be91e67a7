//! Record schemas
//!
//! One struct per collection. Every record carries an integer `id` and
//! flattened creation/update timestamps.

mod action_plan;
mod engagement;
mod finding;
mod metadata;
mod plan;
mod report;
mod risk_assessment;
mod user;
mod working_paper;

use serde::{de::DeserializeOwned, Serialize};

use crate::db::store::Collection;
use crate::types::RecordId;

pub use action_plan::ActionPlanDoc;
pub use engagement::EngagementDoc;
pub use finding::FindingDoc;
pub use metadata::Metadata;
pub use plan::AuditPlanDoc;
pub use report::AuditReportDoc;
pub use risk_assessment::RiskAssessmentDoc;
pub use user::{UserDoc, UserSummary};
pub use working_paper::WorkingPaperDoc;

/// A typed record stored in a known collection
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const COLLECTION: Collection;
    /// Human name used in `not found` errors
    const NAME: &'static str;

    fn id(&self) -> RecordId;
    fn set_id(&mut self, id: RecordId);
    fn mut_metadata(&mut self) -> &mut Metadata;
}

macro_rules! impl_record {
    ($ty:ty, $collection:expr, $name:literal) => {
        impl $crate::db::schemas::Record for $ty {
            const COLLECTION: $crate::db::store::Collection = $collection;
            const NAME: &'static str = $name;

            fn id(&self) -> $crate::types::RecordId {
                self.id
            }

            fn set_id(&mut self, id: $crate::types::RecordId) {
                self.id = id;
            }

            fn mut_metadata(&mut self) -> &mut $crate::db::schemas::Metadata {
                &mut self.metadata
            }
        }
    };
}
pub(crate) use impl_record;
