//! Staff directory and account administration

use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::auth::{Principal, UserStatus};
use crate::db::schemas::UserSummary;
use crate::db::{IdentityStore, ProfileUpdate};
use crate::types::{AuditError, RecordId, Result};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileInput {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub certifications: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusInput {
    pub status: String,
}

/// Parse a status value, naming the allowed set on failure
pub fn parse_user_status(value: &str) -> Result<UserStatus> {
    match value {
        "active" => Ok(UserStatus::Active),
        "inactive" => Ok(UserStatus::Inactive),
        "suspended" => Ok(UserStatus::Suspended),
        _ => Err(AuditError::Validation(
            "Invalid status value: expected active, inactive or suspended".into(),
        )),
    }
}

#[derive(Clone)]
pub struct UserService {
    identity: Arc<dyn IdentityStore>,
}

impl UserService {
    pub fn new(identity: Arc<dyn IdentityStore>) -> Self {
        Self { identity }
    }

    pub async fn list(&self) -> Result<Vec<UserSummary>> {
        Ok(self.identity.list().await?.iter().map(UserSummary::from).collect())
    }

    pub async fn profile(&self, principal: &Principal) -> Result<UserSummary> {
        self.identity
            .find_by_id(principal.id)
            .await?
            .map(|u| UserSummary::from(&u))
            .ok_or_else(|| AuditError::NotFound("User".into()))
    }

    pub async fn update_profile(&self, principal: &Principal, input: ProfileInput) -> Result<UserSummary> {
        for (field, value) in [("first_name", &input.first_name), ("last_name", &input.last_name)] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(AuditError::Validation(format!("{field} must not be empty")));
            }
        }

        let update = ProfileUpdate {
            first_name: input.first_name.map(|s| s.trim().to_string()),
            last_name: input.last_name.map(|s| s.trim().to_string()),
            phone: input.phone,
            department: input.department,
            certifications: input.certifications,
        };
        let user = self.identity.update_profile(principal.id, update).await?;
        Ok(UserSummary::from(&user))
    }

    pub async fn set_status(&self, actor: &Principal, user_id: RecordId, input: StatusInput) -> Result<UserSummary> {
        let status = parse_user_status(&input.status)?;
        let user = self.identity.update_status(user_id, status).await?;
        info!(actor = actor.id, user_id, status = %status, "User status changed");
        Ok(UserSummary::from(&user))
    }
}
