//! Error types for auditdesk
//!
//! One variant per failure class a caller can observe. The HTTP layer turns
//! these into a status code plus a `{error, code}` JSON body.

use hyper::StatusCode;
use serde_json::json;

use crate::auth::Role;

/// Main error type for auditdesk operations
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("Access token required")]
    MissingToken,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Invalid or inactive user")]
    InvalidOrInactiveUser,

    #[error("Insufficient permissions for this resource")]
    InsufficientPermissions {
        required: Vec<Role>,
        actual: Role,
    },

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("{0} not found")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AuditError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingToken => StatusCode::UNAUTHORIZED,
            Self::InvalidToken => StatusCode::FORBIDDEN,
            Self::InvalidOrInactiveUser => StatusCode::UNAUTHORIZED,
            Self::InsufficientPermissions { .. } => StatusCode::FORBIDDEN,
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code returned to clients
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingToken => "missing_token",
            Self::InvalidToken => "invalid_token",
            Self::InvalidOrInactiveUser => "invalid_or_inactive_user",
            Self::InsufficientPermissions { .. } => "insufficient_permissions",
            Self::InvalidCredentials => "invalid_credentials",
            Self::NotFound(_) => "not_found",
            Self::Validation(_) => "validation_error",
            Self::Conflict(_) => "conflict",
            Self::Internal(_) => "internal_error",
            Self::Config(_) => "config_error",
        }
    }

    /// Whether this error should be logged server-side with its full detail
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Internal(_) | Self::Config(_))
    }

    /// Client-facing JSON body. Internal details never leave the process.
    pub fn to_body(&self) -> serde_json::Value {
        match self {
            Self::InsufficientPermissions { required, actual } => json!({
                "error": self.to_string(),
                "code": self.code(),
                "required_roles": required,
                "user_role": actual,
            }),
            Self::Internal(_) | Self::Config(_) => json!({
                "error": "Internal server error",
                "code": self.code(),
            }),
            _ => json!({
                "error": self.to_string(),
                "code": self.code(),
            }),
        }
    }
}

impl From<serde_json::Error> for AuditError {
    fn from(err: serde_json::Error) -> Self {
        Self::Validation(format!("Invalid JSON: {}", err))
    }
}

impl From<mongodb::error::Error> for AuditError {
    fn from(err: mongodb::error::Error) -> Self {
        use mongodb::error::{ErrorKind, WriteFailure};

        let duplicate = match err.kind.as_ref() {
            ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == 11000,
            _ => err.to_string().contains("E11000"),
        };
        if duplicate {
            Self::Conflict("Duplicate key".into())
        } else {
            Self::Internal(format!("Database error: {}", err))
        }
    }
}

impl From<bson::ser::Error> for AuditError {
    fn from(err: bson::ser::Error) -> Self {
        Self::Internal(format!("BSON encode error: {}", err))
    }
}

impl From<bson::de::Error> for AuditError {
    fn from(err: bson::de::Error) -> Self {
        Self::Internal(format!("BSON decode error: {}", err))
    }
}

impl From<std::io::Error> for AuditError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(format!("IO error: {}", err))
    }
}

impl From<tokio::task::JoinError> for AuditError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(format!("Task join error: {}", err))
    }
}

/// Result type alias for auditdesk operations
pub type Result<T> = std::result::Result<T, AuditError>;
