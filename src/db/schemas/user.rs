//! Staff account schema
//!
//! The credential hash never leaves this module's `UserDoc`; everything
//! returned to clients goes through `UserSummary`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::{Role, UserStatus};
use crate::db::schemas::{impl_record, Metadata};
use crate::db::store::Collection;
use crate::types::RecordId;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct UserDoc {
    pub id: RecordId,

    #[serde(flatten)]
    pub metadata: Metadata,

    /// Lowercased login email, unique
    pub email: String,

    /// Argon2 PHC string
    pub password_hash: String,

    pub first_name: String,
    pub last_name: String,
    pub role: Role,

    #[serde(default)]
    pub status: UserStatus,

    #[serde(default)]
    pub phone: Option<String>,

    #[serde(default)]
    pub department: Option<String>,

    /// Professional certifications (CPA, CIA, CISA, ...)
    #[serde(default)]
    pub certifications: Vec<String>,

    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
}

impl_record!(UserDoc, Collection::Users, "User");

impl UserDoc {
    pub fn new(
        email: String,
        password_hash: String,
        first_name: String,
        last_name: String,
        role: Role,
    ) -> Self {
        Self {
            id: 0,
            metadata: Metadata::new(),
            email,
            password_hash,
            first_name,
            last_name,
            role,
            status: UserStatus::Active,
            phone: None,
            department: None,
            certifications: Vec::new(),
            last_login: None,
        }
    }
}

/// Client-facing view of a user
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct UserSummary {
    pub id: RecordId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub status: UserStatus,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub certifications: Vec<String>,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&UserDoc> for UserSummary {
    fn from(user: &UserDoc) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            role: user.role,
            status: user.status,
            phone: user.phone.clone(),
            department: user.department.clone(),
            certifications: user.certifications.clone(),
            last_login: user.last_login,
            created_at: user.metadata.created_at,
        }
    }
}
