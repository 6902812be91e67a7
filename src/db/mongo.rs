//! MongoDB document store
//!
//! Records are stored one document per record with the integer `id` as a
//! uniquely indexed field; Mongo's own `_id` is never exposed. Unique keys
//! are enforced with unique indexes created at connect time, so a duplicate
//! insert surfaces as error 11000 and maps to `Conflict`.

use async_trait::async_trait;
use bson::{doc, Bson, Document};
use futures_util::TryStreamExt;
use mongodb::{
    options::{IndexOptions, ReturnDocument},
    Client, Database, IndexModel,
};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::db::query::{Condition, Query, SortOrder};
use crate::db::store::{Collection, DocumentStore};
use crate::types::{AuditError, RecordId, Result};

/// Collection holding one counter document per sequence scope
pub const COUNTER_COLLECTION: &str = "counters";

/// Index definitions for a collection: unique `id` plus its unique keys
pub fn indexes_for(collection: Collection) -> Vec<(Document, Option<IndexOptions>)> {
    let mut indexes = vec![(
        doc! { "id": 1 },
        Some(
            IndexOptions::builder()
                .unique(true)
                .name("id_unique".to_string())
                .build(),
        ),
    )];

    for fields in collection.unique_keys() {
        let mut keys = Document::new();
        for field in fields.iter() {
            keys.insert(*field, 1);
        }
        indexes.push((
            keys,
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name(format!("{}_unique", fields.join("_")))
                    .build(),
            ),
        ));
    }
    indexes
}

#[derive(Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    /// Connect, verify with a ping and ensure indexes exist
    pub async fn connect(uri: &str, db_name: &str) -> Result<Self> {
        info!("Connecting to MongoDB at {}", redact_uri(uri));

        // Fail fast on an unreachable server instead of hanging
        let timeout_uri = if uri.contains('?') {
            format!("{uri}&serverSelectionTimeoutMS=3000&connectTimeoutMS=3000")
        } else {
            format!("{uri}?serverSelectionTimeoutMS=3000&connectTimeoutMS=3000")
        };

        let client = Client::with_uri_str(&timeout_uri)
            .await
            .map_err(|e| AuditError::Internal(format!("Failed to connect to MongoDB: {e}")))?;

        let db = client.database(db_name);
        db.run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| AuditError::Internal(format!("MongoDB ping failed: {e}")))?;

        info!("Connected to MongoDB database '{}'", db_name);

        let store = Self { db };
        store.apply_indexes().await?;
        Ok(store)
    }

    async fn apply_indexes(&self) -> Result<()> {
        for collection in Collection::ALL {
            let models: Vec<IndexModel> = indexes_for(collection)
                .into_iter()
                .map(|(keys, opts)| IndexModel::builder().keys(keys).options(opts).build())
                .collect();

            self.collection(collection)
                .create_indexes(models)
                .await
                .map_err(|e| {
                    AuditError::Internal(format!("Failed to create indexes on {collection}: {e}"))
                })?;
            debug!("Indexes ensured on {}", collection);
        }
        Ok(())
    }

    fn collection(&self, collection: Collection) -> mongodb::Collection<Document> {
        self.db.collection::<Document>(collection.name())
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn insert(&self, collection: Collection, doc: Value) -> Result<()> {
        let document = bson::to_document(&doc)?;
        self.collection(collection).insert_one(document).await?;
        Ok(())
    }

    async fn find(&self, collection: Collection, query: &Query) -> Result<Vec<Value>> {
        let records = self.collection(collection);
        let mut action = records
            .find(filter_document(query)?)
            .projection(doc! { "_id": 0 })
            .sort(sort_document(query));
        if let Some(limit) = query.limit {
            action = action.limit(limit as i64);
        }

        let documents: Vec<Document> = action.await?.try_collect().await?;
        documents
            .into_iter()
            .map(|d| bson::from_document::<Value>(d).map_err(AuditError::from))
            .collect()
    }

    async fn count(&self, collection: Collection, query: &Query) -> Result<u64> {
        Ok(self
            .collection(collection)
            .count_documents(filter_document(query)?)
            .await?)
    }

    async fn replace(&self, collection: Collection, id: RecordId, doc: Value) -> Result<bool> {
        let document = bson::to_document(&doc)?;
        let result = self
            .collection(collection)
            .replace_one(doc! { "id": id }, document)
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn patch(
        &self,
        collection: Collection,
        id: RecordId,
        fields: Map<String, Value>,
    ) -> Result<Option<Value>> {
        let set = bson::to_document(&Value::Object(fields))?;
        let updated = self
            .collection(collection)
            .find_one_and_update(doc! { "id": id }, doc! { "$set": set })
            .projection(doc! { "_id": 0 })
            .return_document(ReturnDocument::After)
            .await?;

        updated
            .map(|d| bson::from_document::<Value>(d).map_err(AuditError::from))
            .transpose()
    }

    async fn next_sequence(&self, scope: &str) -> Result<i64> {
        let counter = self
            .db
            .collection::<Document>(COUNTER_COLLECTION)
            .find_one_and_update(doc! { "_id": scope }, doc! { "$inc": { "value": 1i64 } })
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await?
            .ok_or_else(|| AuditError::Internal(format!("Counter '{scope}' was not returned")))?;

        match counter.get("value") {
            Some(Bson::Int64(n)) => Ok(*n),
            Some(Bson::Int32(n)) => Ok(i64::from(*n)),
            other => Err(AuditError::Internal(format!(
                "Counter '{scope}' holds a non-integer value: {other:?}"
            ))),
        }
    }

    fn backend(&self) -> &'static str {
        "mongodb"
    }
}

fn to_bson(value: &Value) -> Result<Bson> {
    Ok(bson::to_bson(value)?)
}

/// Translate a query into a Mongo filter
pub fn filter_document(query: &Query) -> Result<Document> {
    let mut clauses = Vec::with_capacity(query.conditions.len());
    for condition in &query.conditions {
        let clause = match condition {
            Condition::Eq(field, value) => doc! { field: to_bson(value)? },
            Condition::Ne(field, value) => doc! { field: { "$ne": to_bson(value)? } },
            Condition::Lt(field, value) => doc! { field: { "$lt": to_bson(value)? } },
            Condition::Gte(field, value) => doc! { field: { "$gte": to_bson(value)? } },
            Condition::Contains(field, needle) => doc! {
                field: { "$regex": escape_regex(needle), "$options": "i" }
            },
        };
        clauses.push(clause);
    }

    Ok(if clauses.is_empty() {
        Document::new()
    } else {
        doc! { "$and": clauses }
    })
}

/// Sort keys with `id` as the final tiebreak
pub fn sort_document(query: &Query) -> Document {
    let mut sort = Document::new();
    for (field, order) in &query.sort {
        let direction = match order {
            SortOrder::Asc => 1,
            SortOrder::Desc => -1,
        };
        sort.insert(field.as_str(), direction);
    }
    if !sort.contains_key("id") {
        sort.insert("id", 1);
    }
    sort
}

/// Escape regex metacharacters so user input matches literally
fn escape_regex(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if "\\^$.|?*+()[]{}/-".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Hide credentials in a connection string before logging it
fn redact_uri(uri: &str) -> String {
    match (uri.find("://"), uri.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***{}", &uri[..scheme_end], &uri[at..])
        }
        _ => uri.to_string(),
    }
}
