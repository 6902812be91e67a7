//! Shared types for auditdesk

pub mod error;

pub use error::{AuditError, Result};

/// Integer surrogate key used by every stored record
pub type RecordId = i64;
