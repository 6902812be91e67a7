//! In-process document store
//!
//! Used in development mode and by the test suite. Records live in ordered
//! maps behind a single lock so unique-key checks and the write they guard
//! happen together. Counters are kept in a `DashMap`, whose entry lock makes
//! increment-and-return atomic per scope.

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use crate::db::query::Query;
use crate::db::store::{unique_key_of, Collection, DocumentStore};
use crate::types::{AuditError, RecordId, Result};

#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, BTreeMap<RecordId, Value>>>,
    sequences: DashMap<String, i64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn record_id(doc: &Value) -> Result<RecordId> {
    doc.get("id")
        .and_then(Value::as_i64)
        .ok_or_else(|| AuditError::Internal("Record is missing an integer id".into()))
}

/// Find a unique key of `doc` already held by a record other than `skip`
fn violated_key(
    collection: Collection,
    records: &BTreeMap<RecordId, Value>,
    doc: &Value,
    skip: Option<RecordId>,
) -> Option<String> {
    collection.unique_keys().iter().find_map(|fields| {
        let key = unique_key_of(doc, fields)?;
        let taken = records
            .iter()
            .filter(|(id, _)| Some(**id) != skip)
            .any(|(_, other)| unique_key_of(other, fields).as_ref() == Some(&key));
        taken.then(|| fields.join(", "))
    })
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, collection: Collection, doc: Value) -> Result<()> {
        let id = record_id(&doc)?;
        let mut collections = self.collections.write().await;
        let records = collections.entry(collection).or_default();

        if records.contains_key(&id) {
            return Err(AuditError::Conflict(format!("{collection} id {id} already exists")));
        }
        if let Some(key) = violated_key(collection, records, &doc, None) {
            return Err(AuditError::Conflict(format!("Duplicate {collection} key ({key})")));
        }

        records.insert(id, doc);
        Ok(())
    }

    async fn find(&self, collection: Collection, query: &Query) -> Result<Vec<Value>> {
        let collections = self.collections.read().await;
        let mut matched: Vec<Value> = collections
            .get(&collection)
            .map(|records| {
                records
                    .values()
                    .filter(|doc| query.matches(doc))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        matched.sort_by(|a, b| query.compare(a, b));
        if let Some(limit) = query.limit {
            matched.truncate(limit);
        }
        Ok(matched)
    }

    async fn count(&self, collection: Collection, query: &Query) -> Result<u64> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .map(|records| records.values().filter(|doc| query.matches(doc)).count() as u64)
            .unwrap_or(0))
    }

    async fn replace(&self, collection: Collection, id: RecordId, doc: Value) -> Result<bool> {
        let mut collections = self.collections.write().await;
        let Some(records) = collections.get_mut(&collection) else {
            return Ok(false);
        };
        if !records.contains_key(&id) {
            return Ok(false);
        }
        if let Some(key) = violated_key(collection, records, &doc, Some(id)) {
            return Err(AuditError::Conflict(format!("Duplicate {collection} key ({key})")));
        }
        records.insert(id, doc);
        Ok(true)
    }

    async fn patch(
        &self,
        collection: Collection,
        id: RecordId,
        fields: Map<String, Value>,
    ) -> Result<Option<Value>> {
        let mut collections = self.collections.write().await;
        let Some(records) = collections.get_mut(&collection) else {
            return Ok(None);
        };
        let Some(mut merged) = records.get(&id).cloned() else {
            return Ok(None);
        };

        let Value::Object(map) = &mut merged else {
            return Err(AuditError::Internal(format!("{collection} {id} is not an object")));
        };
        map.extend(fields);

        if let Some(key) = violated_key(collection, records, &merged, Some(id)) {
            return Err(AuditError::Conflict(format!("Duplicate {collection} key ({key})")));
        }
        records.insert(id, merged.clone());
        Ok(Some(merged))
    }

    async fn next_sequence(&self, scope: &str) -> Result<i64> {
        let mut counter = self.sequences.entry(scope.to_string()).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::query::SortOrder;
    use serde_json::json;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = MemoryStore::new();
        store
            .insert(Collection::AuditPlans, json!({"id": 1, "year": 2025, "title": "FY25"}))
            .await
            .unwrap();
        store
            .insert(Collection::AuditPlans, json!({"id": 2, "year": 2026, "title": "FY26"}))
            .await
            .unwrap();

        let query = Query::new().sort_by("year", SortOrder::Desc);
        let plans = store.find(Collection::AuditPlans, &query).await.unwrap();
        assert_eq!(plans[0]["title"], "FY26");
        assert_eq!(store.count(Collection::AuditPlans, &Query::new().eq("year", 2025)).await.unwrap(), 1);
        assert_eq!(store.count(Collection::Findings, &Query::new()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unique_key_rejects_without_writing() {
        let store = MemoryStore::new();
        store
            .insert(Collection::Users, json!({"id": 1, "email": "a@x.test"}))
            .await
            .unwrap();

        let err = store
            .insert(Collection::Users, json!({"id": 2, "email": "a@x.test"}))
            .await
            .unwrap_err();
        assert!(matches!(err, AuditError::Conflict(_)));
        assert_eq!(store.count(Collection::Users, &Query::new()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_compound_key_scoped_per_parent() {
        let store = MemoryStore::new();
        let finding = |id: i64, engagement: i64| {
            json!({"id": id, "engagement_id": engagement, "finding_number": "F01"})
        };
        store.insert(Collection::Findings, finding(1, 10)).await.unwrap();
        store.insert(Collection::Findings, finding(2, 11)).await.unwrap();
        assert!(store.insert(Collection::Findings, finding(3, 10)).await.is_err());
    }

    #[tokio::test]
    async fn test_replace() {
        let store = MemoryStore::new();
        store
            .insert(Collection::Users, json!({"id": 1, "email": "a@x.test"}))
            .await
            .unwrap();
        store
            .insert(Collection::Users, json!({"id": 2, "email": "b@x.test"}))
            .await
            .unwrap();

        assert!(store
            .replace(Collection::Users, 1, json!({"id": 1, "email": "a@x.test", "phone": "1"}))
            .await
            .unwrap());
        assert!(!store.replace(Collection::Users, 9, json!({"id": 9})).await.unwrap());
        assert!(store
            .replace(Collection::Users, 2, json!({"id": 2, "email": "a@x.test"}))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_patch_touches_only_named_fields() {
        let store = MemoryStore::new();
        store
            .insert(Collection::Users, json!({"id": 1, "email": "a@x.test", "status": "active"}))
            .await
            .unwrap();
        store
            .insert(Collection::Users, json!({"id": 2, "email": "b@x.test", "status": "active"}))
            .await
            .unwrap();

        let mut status = Map::new();
        status.insert("status".into(), json!("suspended"));
        let mut phone = Map::new();
        phone.insert("phone".into(), json!("555-0101"));

        store.patch(Collection::Users, 1, status).await.unwrap();
        let patched = store.patch(Collection::Users, 1, phone).await.unwrap().unwrap();
        assert_eq!(patched["status"], "suspended");
        assert_eq!(patched["phone"], "555-0101");
        assert_eq!(patched["email"], "a@x.test");

        assert!(store.patch(Collection::Users, 9, Map::new()).await.unwrap().is_none());

        let mut steal = Map::new();
        steal.insert("email".into(), json!("b@x.test"));
        assert!(matches!(
            store.patch(Collection::Users, 1, steal).await,
            Err(AuditError::Conflict(_))
        ));
        let users = store.find(Collection::Users, &Query::new().eq("id", 1)).await.unwrap();
        assert_eq!(users[0]["email"], "a@x.test");
    }

    #[tokio::test]
    async fn test_sequence_is_atomic_under_contention() {
        let store = Arc::new(MemoryStore::new());
        let mut handles = Vec::new();
        for _ in 0..64 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.next_sequence("engagement:2026").await.unwrap()
            }));
        }

        let mut seen = HashSet::new();
        for handle in handles {
            assert!(seen.insert(handle.await.unwrap()));
        }
        assert_eq!(seen.len(), 64);
        assert_eq!(seen.iter().max(), Some(&64));
        assert_eq!(store.next_sequence("engagement:2027").await.unwrap(), 1);
    }
}
