//! Typed access to collections
//!
//! `Repository<T>` converts between schema structs and the store's JSON
//! records, allocates ids and maintains timestamps. The user repository
//! also serves as the identity store consulted by the access gate.
//!
//! Updates that change a few columns go through `Patch`, which the store
//! applies atomically. `save` rewrites the whole record and is only for
//! edits that replace every editable field at once.

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value};
use std::marker::PhantomData;
use std::sync::Arc;

use crate::auth::UserStatus;
use crate::db::query::{Query, SortOrder};
use crate::db::schemas::{Record, UserDoc};
use crate::db::store::DocumentStore;
use crate::types::{AuditError, RecordId, Result};

pub struct Repository<T: Record> {
    store: Arc<dyn DocumentStore>,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _record: PhantomData,
        }
    }
}

fn encode<T: Record>(record: &T) -> Result<serde_json::Value> {
    serde_json::to_value(record)
        .map_err(|e| AuditError::Internal(format!("Failed to encode {}: {e}", T::NAME)))
}

fn decode<T: Record>(value: serde_json::Value) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| AuditError::Internal(format!("Failed to decode {}: {e}", T::NAME)))
}

/// A set of top-level field assignments for one record
#[derive(Debug, Clone, Default)]
pub struct Patch {
    fields: Map<String, Value>,
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: &str, value: impl Serialize) -> Result<Self> {
        let value = serde_json::to_value(value)
            .map_err(|e| AuditError::Internal(format!("Failed to encode {field}: {e}")))?;
        self.fields.insert(field.to_string(), value);
        Ok(self)
    }

    /// Assign only when a value is given
    pub fn set_opt<V: Serialize>(self, field: &str, value: Option<V>) -> Result<Self> {
        match value {
            Some(v) => self.set(field, v),
            None => Ok(self),
        }
    }
}

impl<T: Record> Repository<T> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _record: PhantomData,
        }
    }

    /// Insert a new record, assigning its id and timestamps
    pub async fn insert(&self, mut record: T) -> Result<T> {
        let id = self.store.next_sequence(&T::COLLECTION.id_scope()).await?;
        record.set_id(id);
        let metadata = record.mut_metadata();
        let now = Utc::now();
        metadata.created_at = now;
        metadata.updated_at = now;

        self.store.insert(T::COLLECTION, encode(&record)?).await?;
        Ok(record)
    }

    pub async fn get(&self, id: RecordId) -> Result<Option<T>> {
        let query = Query::new().eq("id", id).limit(1);
        self.find_one(&query).await
    }

    /// Like `get`, but absence is a `NotFound` error
    pub async fn require(&self, id: RecordId) -> Result<T> {
        self.get(id)
            .await?
            .ok_or_else(|| AuditError::NotFound(T::NAME.to_string()))
    }

    pub async fn find(&self, query: &Query) -> Result<Vec<T>> {
        self.store
            .find(T::COLLECTION, query)
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }

    pub async fn find_one(&self, query: &Query) -> Result<Option<T>> {
        let mut query = query.clone();
        query.limit = Some(1);
        Ok(self.find(&query).await?.into_iter().next())
    }

    pub async fn count(&self, query: &Query) -> Result<u64> {
        self.store.count(T::COLLECTION, query).await
    }

    /// Apply a field patch, bumping `updated_at`, and return the result
    pub async fn patch(&self, id: RecordId, patch: Patch) -> Result<T> {
        let patch = patch.set("updated_at", Utc::now())?;
        match self.store.patch(T::COLLECTION, id, patch.fields).await? {
            Some(value) => decode(value),
            None => Err(AuditError::NotFound(T::NAME.to_string())),
        }
    }

    /// Write back a modified record, bumping `updated_at`
    pub async fn save(&self, record: &mut T) -> Result<()> {
        record.mut_metadata().touch();
        let id = record.id();
        if self.store.replace(T::COLLECTION, id, encode(record)?).await? {
            Ok(())
        } else {
            Err(AuditError::NotFound(T::NAME.to_string()))
        }
    }
}

/// Profile fields a user may change on their own account
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub certifications: Option<Vec<String>>,
}

/// Lookup and mutation of staff accounts
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserDoc>>;

    async fn find_by_id(&self, id: RecordId) -> Result<Option<UserDoc>>;

    /// Create an account. Fails with `Conflict` if the email is taken.
    async fn insert(&self, user: UserDoc) -> Result<UserDoc>;

    async fn update_status(&self, id: RecordId, status: UserStatus) -> Result<UserDoc>;

    async fn update_last_login(&self, id: RecordId) -> Result<()>;

    async fn update_profile(&self, id: RecordId, update: ProfileUpdate) -> Result<UserDoc>;

    /// All users ordered by last name
    async fn list(&self) -> Result<Vec<UserDoc>>;
}

pub type UserRepository = Repository<UserDoc>;

#[async_trait]
impl IdentityStore for Repository<UserDoc> {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserDoc>> {
        self.find_one(&Query::new().eq("email", email)).await
    }

    async fn find_by_id(&self, id: RecordId) -> Result<Option<UserDoc>> {
        self.get(id).await
    }

    async fn insert(&self, user: UserDoc) -> Result<UserDoc> {
        Repository::insert(self, user).await.map_err(|e| match e {
            AuditError::Conflict(_) => AuditError::Conflict("User with this email already exists".into()),
            other => other,
        })
    }

    async fn update_status(&self, id: RecordId, status: UserStatus) -> Result<UserDoc> {
        self.patch(id, Patch::new().set("status", status)?).await
    }

    async fn update_last_login(&self, id: RecordId) -> Result<()> {
        self.patch(id, Patch::new().set("last_login", Utc::now())?)
            .await
            .map(|_| ())
    }

    async fn update_profile(&self, id: RecordId, update: ProfileUpdate) -> Result<UserDoc> {
        let patch = Patch::new()
            .set_opt("first_name", update.first_name)?
            .set_opt("last_name", update.last_name)?
            .set_opt("phone", update.phone)?
            .set_opt("department", update.department)?
            .set_opt("certifications", update.certifications)?;
        self.patch(id, patch).await
    }

    async fn list(&self) -> Result<Vec<UserDoc>> {
        let query = Query::new()
            .sort_by("last_name", SortOrder::Asc)
            .sort_by("first_name", SortOrder::Asc);
        self.find(&query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::db::memory::MemoryStore;

    fn users() -> UserRepository {
        Repository::new(Arc::new(MemoryStore::new()))
    }

    fn user(email: &str, last: &str) -> UserDoc {
        UserDoc::new(email.into(), "hash".into(), "Pat".into(), last.into(), Role::Auditor)
    }

    #[tokio::test]
    async fn test_insert_assigns_increasing_ids() {
        let repo = users();
        let a = IdentityStore::insert(&repo, user("a@x.test", "Zed")).await.unwrap();
        let b = IdentityStore::insert(&repo, user("b@x.test", "Abel")).await.unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);

        let listed = repo.list().await.unwrap();
        assert_eq!(listed[0].last_name, "Abel");
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let repo = users();
        IdentityStore::insert(&repo, user("a@x.test", "One")).await.unwrap();
        let err = IdentityStore::insert(&repo, user("a@x.test", "Two")).await.unwrap_err();
        assert!(matches!(err, AuditError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_require_and_save() {
        let repo = users();
        assert!(matches!(repo.require(7).await, Err(AuditError::NotFound(_))));

        let created = IdentityStore::insert(&repo, user("a@x.test", "One")).await.unwrap();
        let suspended = repo.update_status(created.id, UserStatus::Suspended).await.unwrap();
        assert_eq!(suspended.status, UserStatus::Suspended);
        assert!(suspended.metadata.updated_at >= created.metadata.updated_at);

        let fetched = repo.find_by_email("a@x.test").await.unwrap().unwrap();
        assert_eq!(fetched.status, UserStatus::Suspended);
    }

    #[tokio::test]
    async fn test_profile_update_leaves_unset_fields() {
        let repo = users();
        let created = IdentityStore::insert(&repo, user("a@x.test", "One")).await.unwrap();
        let updated = repo
            .update_profile(
                created.id,
                ProfileUpdate {
                    department: Some("Internal Audit".into()),
                    certifications: Some(vec!["CIA".into()]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.last_name, "One");
        assert_eq!(updated.department.as_deref(), Some("Internal Audit"));
        assert_eq!(updated.certifications, vec!["CIA".to_string()]);
    }

    #[tokio::test]
    async fn test_profile_update_keeps_concurrent_status_change() {
        let repo = users();
        let created = IdentityStore::insert(&repo, user("a@x.test", "One")).await.unwrap();

        // Stale copy taken before the suspension lands
        let before = repo.require(created.id).await.unwrap();
        repo.update_status(created.id, UserStatus::Suspended).await.unwrap();
        let updated = repo
            .update_profile(
                before.id,
                ProfileUpdate {
                    phone: Some("555-0101".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.status, UserStatus::Suspended);
        assert_eq!(updated.phone.as_deref(), Some("555-0101"));
        assert!(matches!(
            repo.update_last_login(99).await,
            Err(AuditError::NotFound(_))
        ));
    }
}
