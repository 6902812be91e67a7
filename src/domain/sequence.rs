//! Human-readable identifiers
//!
//! Numbers are drawn from the store's atomic counter for the scope, so two
//! concurrent creators in the same scope never receive the same value. A
//! number whose insert later fails is simply skipped.

use std::sync::Arc;

use crate::db::DocumentStore;
use crate::types::{RecordId, Result};

/// Allocates engagement, finding and report numbers
#[derive(Clone)]
pub struct SequenceAllocator {
    store: Arc<dyn DocumentStore>,
}

pub fn engagement_scope(year: i32) -> String {
    format!("engagement:{year}")
}

pub fn finding_scope(engagement_id: RecordId) -> String {
    format!("finding:{engagement_id}")
}

pub fn report_scope(engagement_id: RecordId) -> String {
    format!("report:{engagement_id}")
}

/// `YYYY-NNN`
pub fn format_engagement_number(year: i32, n: i64) -> String {
    format!("{year}-{n:03}")
}

/// `FNN`
pub fn format_finding_number(n: i64) -> String {
    format!("F{n:02}")
}

/// `<engagement number>-RNN`
pub fn format_report_number(engagement_number: &str, n: i64) -> String {
    format!("{engagement_number}-R{n:02}")
}

impl SequenceAllocator {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn next_engagement_number(&self, year: i32) -> Result<String> {
        let n = self.store.next_sequence(&engagement_scope(year)).await?;
        Ok(format_engagement_number(year, n))
    }

    pub async fn next_finding_number(&self, engagement_id: RecordId) -> Result<String> {
        let n = self.store.next_sequence(&finding_scope(engagement_id)).await?;
        Ok(format_finding_number(n))
    }

    pub async fn next_report_number(
        &self,
        engagement_id: RecordId,
        engagement_number: &str,
    ) -> Result<String> {
        let n = self.store.next_sequence(&report_scope(engagement_id)).await?;
        Ok(format_report_number(engagement_number, n))
    }
}
