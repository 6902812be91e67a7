//! Document store seam
//!
//! Every persistent record lives in one of a fixed set of collections as a
//! JSON object keyed by an integer `id`. Backends only need to offer insert,
//! query, replace, a field-level patch and an atomic counter; typed access is
//! layered on top in `db::repository`.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt;

use crate::db::query::Query;
use crate::types::{RecordId, Result};

/// Named collections and their uniqueness constraints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Users,
    AuditPlans,
    RiskAssessments,
    Engagements,
    WorkingPapers,
    Findings,
    AuditReports,
    ActionPlans,
}

impl Collection {
    pub const ALL: [Collection; 8] = [
        Collection::Users,
        Collection::AuditPlans,
        Collection::RiskAssessments,
        Collection::Engagements,
        Collection::WorkingPapers,
        Collection::Findings,
        Collection::AuditReports,
        Collection::ActionPlans,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::AuditPlans => "audit_plans",
            Collection::RiskAssessments => "risk_assessments",
            Collection::Engagements => "engagements",
            Collection::WorkingPapers => "working_papers",
            Collection::Findings => "findings",
            Collection::AuditReports => "audit_reports",
            Collection::ActionPlans => "action_plans",
        }
    }

    /// Field sets that must be unique across the collection, besides `id`
    pub fn unique_keys(&self) -> &'static [&'static [&'static str]] {
        match self {
            Collection::Users => &[&["email"]],
            Collection::Engagements => &[&["engagement_number"]],
            Collection::Findings => &[&["engagement_id", "finding_number"]],
            Collection::AuditReports => &[&["report_number"]],
            Collection::AuditPlans
            | Collection::RiskAssessments
            | Collection::WorkingPapers
            | Collection::ActionPlans => &[],
        }
    }

    /// Counter scope used to allocate record ids
    pub fn id_scope(&self) -> String {
        format!("id:{}", self.name())
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Persistence backend for all domain records
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a record that already carries its `id`.
    ///
    /// Fails with `Conflict` and writes nothing if a unique key is taken.
    async fn insert(&self, collection: Collection, doc: Value) -> Result<()>;

    /// All records matching the query, ordered and limited as it asks
    async fn find(&self, collection: Collection, query: &Query) -> Result<Vec<Value>>;

    async fn count(&self, collection: Collection, query: &Query) -> Result<u64>;

    /// Replace the record with the given id. Returns false when absent.
    async fn replace(&self, collection: Collection, id: RecordId, doc: Value) -> Result<bool>;

    /// Overwrite only the named top-level fields of one record, in a single
    /// atomic step, and return the record as it now stands.
    ///
    /// `None` when no record has this id. Fields not named are left exactly
    /// as the latest writer stored them.
    async fn patch(
        &self,
        collection: Collection,
        id: RecordId,
        fields: Map<String, Value>,
    ) -> Result<Option<Value>>;

    /// Atomically increment the named counter and return the new value.
    ///
    /// The first call for a scope returns 1. Concurrent callers never see
    /// the same value.
    async fn next_sequence(&self, scope: &str) -> Result<i64>;

    /// Short backend name for health output
    fn backend(&self) -> &'static str;
}

/// Project the unique key of a record, or `None` if any part is missing
pub fn unique_key_of(doc: &Value, fields: &[&str]) -> Option<Vec<Value>> {
    fields
        .iter()
        .map(|field| match doc.get(*field) {
            Some(Value::Null) | None => None,
            Some(v) => Some(v.clone()),
        })
        .collect()
}
