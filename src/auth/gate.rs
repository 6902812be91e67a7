//! Access gate
//!
//! Every protected operation passes through `AccessGate::authorize`:
//! 1. Extract the bearer token (absent vs. malformed are distinct failures)
//! 2. Verify signature and expiry
//! 3. Re-read the user from the identity store; missing or non-active users
//!    are rejected even while their token is still valid
//! 4. Check the live role against the required role set
//!
//! Nothing is cached between requests.

use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use crate::auth::jwt::{extract_bearer_token, JwtCodec};
use crate::auth::{Role, RoleSet};
use crate::db::schemas::UserDoc;
use crate::db::IdentityStore;
use crate::types::{AuditError, RecordId, Result};

/// Authenticated identity handed to domain operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub id: RecordId,
    pub email: String,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
}

impl From<&UserDoc> for Principal {
    fn from(user: &UserDoc) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            role: user.role,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AccessGate {
    identity: Arc<dyn IdentityStore>,
    tokens: JwtCodec,
}

impl AccessGate {
    pub fn new(identity: Arc<dyn IdentityStore>, tokens: JwtCodec) -> Self {
        Self { identity, tokens }
    }

    /// Authenticate the request and check it against `required`
    pub async fn authorize(&self, auth_header: Option<&str>, required: RoleSet) -> Result<Principal> {
        let token = match extract_bearer_token(auth_header) {
            None => return Err(AuditError::MissingToken),
            Some(token) => token?,
        };

        let claims = self.tokens.verify(token)?;

        let user = match self.identity.find_by_id(claims.user_id).await? {
            Some(user) if user.status.permits_authentication() => user,
            Some(user) => {
                warn!(user_id = user.id, status = %user.status, "Rejected token for non-active user");
                return Err(AuditError::InvalidOrInactiveUser);
            }
            None => {
                warn!(user_id = claims.user_id, "Rejected token for unknown user");
                return Err(AuditError::InvalidOrInactiveUser);
            }
        };

        if !required.permits(user.role) {
            warn!(
                user_id = user.id,
                role = %user.role,
                "Insufficient permissions"
            );
            return Err(AuditError::InsufficientPermissions {
                required: required.roles().to_vec(),
                actual: user.role,
            });
        }

        Ok(Principal::from(&user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::TokenInput;
    use crate::auth::UserStatus;
    use crate::db::{MemoryStore, UserRepository};

    async fn setup(role: Role) -> (AccessGate, UserRepository, String) {
        let users = UserRepository::new(Arc::new(MemoryStore::new()));
        let user = IdentityStore::insert(
            &users,
            UserDoc::new("sam@x.test".into(), "hash".into(), "Sam".into(), "Ng".into(), role),
        )
        .await
        .unwrap();

        let codec = JwtCodec::new_dev(3600);
        let token = codec
            .issue(TokenInput {
                user_id: user.id,
                email: user.email.clone(),
                role,
            })
            .unwrap()
            .token;
        (AccessGate::new(Arc::new(users.clone()), codec), users, token)
    }

    #[tokio::test]
    async fn test_valid_token_yields_principal() {
        let (gate, _, token) = setup(Role::Auditor).await;
        let header = format!("Bearer {token}");
        let principal = gate.authorize(Some(&header), RoleSet::ANY).await.unwrap();
        assert_eq!(principal.email, "sam@x.test");
        assert_eq!(principal.first_name, "Sam");
        assert_eq!(principal.role, Role::Auditor);
    }

    #[tokio::test]
    async fn test_missing_header() {
        let (gate, _, _) = setup(Role::Auditor).await;
        assert!(matches!(
            gate.authorize(None, RoleSet::ANY).await,
            Err(AuditError::MissingToken)
        ));
    }

    #[tokio::test]
    async fn test_role_outside_set() {
        let (gate, _, token) = setup(Role::Auditor).await;
        let header = format!("Bearer {token}");
        match gate.authorize(Some(&header), RoleSet::PLANNERS).await {
            Err(AuditError::InsufficientPermissions { required, actual }) => {
                assert_eq!(required, vec![Role::Director, Role::SeniorAuditor]);
                assert_eq!(actual, Role::Auditor);
            }
            other => panic!("expected insufficient permissions, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_suspension_takes_effect_immediately() {
        let (gate, users, token) = setup(Role::Director).await;
        let header = format!("Bearer {token}");
        assert!(gate.authorize(Some(&header), RoleSet::ANY).await.is_ok());

        users.update_status(1, UserStatus::Suspended).await.unwrap();
        assert!(matches!(
            gate.authorize(Some(&header), RoleSet::ANY).await,
            Err(AuditError::InvalidOrInactiveUser)
        ));
    }
}
