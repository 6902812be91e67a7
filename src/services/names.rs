//! Attaches people's names to listings
//!
//! Listing endpoints show `<prefix>_first_name` / `<prefix>_last_name` next
//! to every user reference. Names come from one snapshot of the user
//! collection taken per request.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::db::{IdentityStore, UserRepository};
use crate::types::{AuditError, RecordId, Result};

pub struct NameDirectory {
    names: HashMap<RecordId, (String, String)>,
}

impl NameDirectory {
    pub async fn load(users: &UserRepository) -> Result<Self> {
        let names = users
            .list()
            .await?
            .into_iter()
            .map(|u| (u.id, (u.first_name, u.last_name)))
            .collect();
        Ok(Self { names })
    }

    pub fn get(&self, id: RecordId) -> Option<(&str, &str)> {
        self.names.get(&id).map(|(f, l)| (f.as_str(), l.as_str()))
    }

    /// Set the name fields for `prefix`; unknown or absent ids give nulls
    pub fn annotate(&self, target: &mut Map<String, Value>, prefix: &str, id: Option<RecordId>) {
        let (first, last) = match id.and_then(|id| self.get(id)) {
            Some((f, l)) => (Value::from(f), Value::from(l)),
            None => (Value::Null, Value::Null),
        };
        target.insert(format!("{prefix}_first_name"), first);
        target.insert(format!("{prefix}_last_name"), last);
    }
}

/// Serialize a record into a JSON object so fields can be added to it
pub fn to_object<T: Serialize>(record: &T) -> Result<Map<String, Value>> {
    match serde_json::to_value(record) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(AuditError::Internal("Record did not serialize to an object".into())),
        Err(e) => Err(AuditError::Internal(format!("Failed to serialize record: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::db::schemas::UserDoc;
    use crate::db::MemoryStore;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_annotate() {
        let users = UserRepository::new(Arc::new(MemoryStore::new()));
        let lead = IdentityStore::insert(
            &users,
            UserDoc::new("l@x.test".into(), "h".into(), "Lee".into(), "Park".into(), Role::SeniorAuditor),
        )
        .await
        .unwrap();

        let names = NameDirectory::load(&users).await.unwrap();
        let mut row = Map::new();
        names.annotate(&mut row, "lead", Some(lead.id));
        names.annotate(&mut row, "approver", None);

        assert_eq!(row["lead_first_name"], "Lee");
        assert_eq!(row["lead_last_name"], "Park");
        assert!(row["approver_first_name"].is_null());
    }
}
