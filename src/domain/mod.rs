//! Domain rules independent of storage and transport

pub mod risk;
pub mod sequence;
pub mod status;

pub use risk::{classify, RiskLevel, RiskScore};
pub use sequence::SequenceAllocator;
pub use status::{
    ActionPlanStatus, EngagementStatus, FindingStatus, Opinion, PlanStatus, ReportStatus,
    ReviewStatus, Severity,
};
