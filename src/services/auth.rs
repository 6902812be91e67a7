//! Registration, login and bootstrap of the first director

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::auth::password::MIN_PASSWORD_LENGTH;
use crate::auth::{CredentialHasher, IssuedToken, JwtCodec, Role, TokenInput};
use crate::db::schemas::UserDoc;
use crate::db::IdentityStore;
use crate::types::{AuditError, RecordId, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginInput {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Identity echoed back after registration and login
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AccountInfo {
    pub id: RecordId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

impl From<&UserDoc> for AccountInfo {
    fn from(user: &UserDoc) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            role: user.role,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: IssuedToken,
    pub user: AccountInfo,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn required(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(AuditError::Validation(format!("{field} is required")))
    } else {
        Ok(())
    }
}

#[derive(Clone)]
pub struct AuthService {
    identity: Arc<dyn IdentityStore>,
    hasher: CredentialHasher,
    tokens: JwtCodec,
    /// Hash checked when the email is unknown, so that path costs one verify too
    decoy_hash: Arc<OnceCell<String>>,
}

impl AuthService {
    pub fn new(identity: Arc<dyn IdentityStore>, hasher: CredentialHasher, tokens: JwtCodec) -> Self {
        Self {
            identity,
            hasher,
            tokens,
            decoy_hash: Arc::new(OnceCell::new()),
        }
    }

    async fn decoy_hash(&self) -> Result<&str> {
        let hash = self
            .decoy_hash
            .get_or_try_init(|| self.hasher.hash("auditdesk-decoy-credential"))
            .await?;
        Ok(hash.as_str())
    }

    /// Create a staff account.
    ///
    /// A taken email is rejected before any hashing work is done.
    pub async fn register(&self, input: RegisterInput) -> Result<AccountInfo> {
        let email = normalize_email(&input.email);
        required("email", &email)?;
        if !email.contains('@') {
            return Err(AuditError::Validation("email must be a valid address".into()));
        }
        required("first_name", &input.first_name)?;
        required("last_name", &input.last_name)?;
        if input.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AuditError::Validation(format!(
                "password must be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }

        if self.identity.find_by_email(&email).await?.is_some() {
            return Err(AuditError::Conflict("User with this email already exists".into()));
        }

        let password_hash = self.hasher.hash(&input.password).await?;
        let mut user = UserDoc::new(
            email,
            password_hash,
            input.first_name.trim().to_string(),
            input.last_name.trim().to_string(),
            input.role,
        );
        user.phone = input.phone;
        user.department = input.department;

        let user = self.identity.insert(user).await?;
        info!(user_id = user.id, role = %user.role, "Registered user");
        Ok(AccountInfo::from(&user))
    }

    /// Check credentials and issue a session token.
    ///
    /// Unknown email, wrong password and non-active accounts all fail the
    /// same way.
    pub async fn login(&self, input: LoginInput) -> Result<LoginOutcome> {
        if input.email.trim().is_empty() || input.password.is_empty() {
            return Err(AuditError::Validation("Email and password are required".into()));
        }

        let email = normalize_email(&input.email);
        let Some(user) = self.identity.find_by_email(&email).await? else {
            let decoy = self.decoy_hash().await?;
            self.hasher.verify(&input.password, decoy).await?;
            warn!("Login failed: unknown email");
            return Err(AuditError::InvalidCredentials);
        };

        if !self.hasher.verify(&input.password, &user.password_hash).await? {
            warn!(user_id = user.id, "Login failed: wrong password");
            return Err(AuditError::InvalidCredentials);
        }

        if !user.status.permits_authentication() {
            warn!(user_id = user.id, status = %user.status, "Login refused for non-active account");
            return Err(AuditError::InvalidCredentials);
        }

        self.identity.update_last_login(user.id).await?;

        let token = self.tokens.issue(TokenInput {
            user_id: user.id,
            email: user.email.clone(),
            role: user.role,
        })?;

        info!(user_id = user.id, "Login successful");
        Ok(LoginOutcome {
            token,
            user: AccountInfo::from(&user),
        })
    }

    /// Create a director account if none exists with this email.
    ///
    /// Returns whether an account was created.
    pub async fn ensure_director(&self, email: &str, password: &str) -> Result<bool> {
        let email = normalize_email(email);
        if self.identity.find_by_email(&email).await?.is_some() {
            return Ok(false);
        }

        self.register(RegisterInput {
            email,
            password: password.to_string(),
            first_name: "Audit".into(),
            last_name: "Director".into(),
            role: Role::Director,
            phone: None,
            department: None,
        })
        .await?;
        Ok(true)
    }
}
