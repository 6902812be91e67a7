//! Session tokens
//!
//! Stateless HS256 bearer tokens binding a user id, email and role to an
//! expiry. Nothing is stored server-side; the access gate re-reads the user on
//! every request, so a token only ever grants what the live record allows.
//!
//! Security notes:
//! - Default validity is 8 hours, with no clock leeway
//! - Verification failures are reported uniformly as `InvalidToken`
//! - The development secret is public knowledge; production refuses to start
//!   without a configured one

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

use crate::auth::Role;
use crate::types::{AuditError, RecordId};

/// Default token validity: 8 hours
pub const DEFAULT_EXPIRY_SECONDS: u64 = 8 * 60 * 60;

/// Longest configurable token validity: 30 days
pub const MAX_EXPIRY_SECONDS: u64 = 30 * 24 * 60 * 60;

/// Minimum accepted length for a configured signing secret
pub const MIN_SECRET_LENGTH: usize = 32;

/// Well-known secret used only in development mode
pub const DEV_SECRET: &str = "auditdesk-dev-mode-secret-not-for-production";

/// Payload stored in a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: RecordId,
    pub email: String,
    pub role: Role,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// Identity to embed in a new token
#[derive(Debug, Clone)]
pub struct TokenInput {
    pub user_id: RecordId,
    pub email: String,
    pub role: Role,
}

/// A freshly signed token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: u64,
}

/// Signs and verifies session tokens with a shared secret
#[derive(Clone)]
pub struct JwtCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expiry_seconds: u64,
    dev: bool,
}

impl JwtCodec {
    /// Create a codec from a configured secret
    ///
    /// Returns an error if the secret is empty or too short
    pub fn new(secret: &str, expiry_seconds: u64) -> Result<Self, AuditError> {
        if secret.is_empty() {
            return Err(AuditError::Config("JWT_SECRET is required".into()));
        }
        if secret.len() < MIN_SECRET_LENGTH {
            return Err(AuditError::Config(format!(
                "JWT_SECRET must be at least {MIN_SECRET_LENGTH} characters"
            )));
        }
        Ok(Self::from_secret(secret, expiry_seconds, false))
    }

    /// Create a codec for dev mode using the well-known secret
    pub fn new_dev(expiry_seconds: u64) -> Self {
        Self::from_secret(DEV_SECRET, expiry_seconds, true)
    }

    fn from_secret(secret: &str, expiry_seconds: u64, dev: bool) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            expiry_seconds,
            dev,
        }
    }

    /// Whether this codec signs with the public development secret
    pub fn is_dev(&self) -> bool {
        self.dev
    }

    /// Sign a token valid for the configured window starting now
    pub fn issue(&self, input: TokenInput) -> Result<IssuedToken, AuditError> {
        self.issue_at(input, unix_now()?)
    }

    fn issue_at(&self, input: TokenInput, now: u64) -> Result<IssuedToken, AuditError> {
        let exp = now
            .checked_add(self.expiry_seconds)
            .ok_or_else(|| AuditError::Config("Token expiry is out of range".into()))?;
        let claims = Claims {
            user_id: input.user_id,
            email: input.email,
            role: input.role,
            iat: now,
            exp,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuditError::Internal(format!("Failed to sign token: {e}")))?;

        Ok(IssuedToken {
            token,
            expires_at: claims.exp,
        })
    }

    /// Verify signature and expiry, returning the embedded claims
    pub fn verify(&self, token: &str) -> Result<Claims, AuditError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|err| {
                debug!("Token rejected: {:?}", err.kind());
                AuditError::InvalidToken
            })
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header.
///
/// `None` means no credential was presented at all; `Some(Err)` means a
/// credential was presented in a form other than a bearer token.
pub fn extract_bearer_token(auth_header: Option<&str>) -> Option<Result<&str, AuditError>> {
    let header = auth_header?.trim();
    if header.is_empty() {
        return None;
    }

    let (scheme, rest) = header.split_once(' ').unwrap_or((header, ""));
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Some(Err(AuditError::InvalidToken));
    }

    let token = rest.trim();
    if token.is_empty() {
        None
    } else {
        Some(Ok(token))
    }
}

fn unix_now() -> Result<u64, AuditError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| AuditError::Internal(format!("System time error: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_codec() -> JwtCodec {
        JwtCodec::new("test-secret-that-is-at-least-32-characters-long", 3600).unwrap()
    }

    fn input() -> TokenInput {
        TokenInput {
            user_id: 42,
            email: "lead@audit.example".into(),
            role: Role::SeniorAuditor,
        }
    }

    #[test]
    fn test_issue_and_verify() {
        let codec = test_codec();
        let issued = codec.issue(input()).unwrap();
        assert!(!issued.token.is_empty());

        let claims = codec.verify(&issued.token).unwrap();
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.email, "lead@audit.example");
        assert_eq!(claims.role, Role::SeniorAuditor);
        assert_eq!(claims.exp, issued.expires_at);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_expired_token_rejected() {
        let codec = JwtCodec::new("test-secret-that-is-at-least-32-characters-long", DEFAULT_EXPIRY_SECONDS).unwrap();
        let now = unix_now().unwrap();

        let stale = codec.issue_at(input(), now - DEFAULT_EXPIRY_SECONDS - 1).unwrap();
        assert!(matches!(codec.verify(&stale.token), Err(AuditError::InvalidToken)));

        let fresh = codec.issue_at(input(), now - DEFAULT_EXPIRY_SECONDS + 120).unwrap();
        assert!(codec.verify(&fresh.token).is_ok());
    }

    #[test]
    fn test_expiry_overflow_is_an_error() {
        let codec = JwtCodec::new("test-secret-that-is-at-least-32-characters-long", u64::MAX).unwrap();
        assert!(matches!(codec.issue(input()), Err(AuditError::Config(_))));

        let longest = JwtCodec::new_dev(MAX_EXPIRY_SECONDS).issue(input()).unwrap();
        assert!(longest.expires_at > MAX_EXPIRY_SECONDS);
    }

    #[test]
    fn test_wrong_secret() {
        let other = JwtCodec::new("different-secret-that-is-at-least-32-characters", 3600).unwrap();
        let token = test_codec().issue(input()).unwrap().token;

        assert!(matches!(other.verify(&token), Err(AuditError::InvalidToken)));
    }

    #[test]
    fn test_malformed_token() {
        assert!(matches!(test_codec().verify("invalid-token"), Err(AuditError::InvalidToken)));
        assert!(matches!(test_codec().verify("a.b.c"), Err(AuditError::InvalidToken)));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let codec = test_codec();
        let token = codec.issue(input()).unwrap().token;
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged = codec
            .issue(TokenInput {
                role: Role::Director,
                ..input()
            })
            .unwrap()
            .token;
        let forged_payload = forged.split('.').nth(1).unwrap().to_string();
        parts[1] = forged_payload.as_str();
        let spliced = format!("{}.{}.{}", parts[0], parts[1], parts[2]);

        assert!(matches!(codec.verify(&spliced), Err(AuditError::InvalidToken)));
    }

    #[test]
    fn test_secret_validation() {
        assert!(JwtCodec::new("short", 3600).is_err());
        assert!(JwtCodec::new("", 3600).is_err());
        assert!(JwtCodec::new("this-secret-is-at-least-32-chars-long", 3600).is_ok());
    }

    #[test]
    fn test_dev_codec_flagged() {
        let codec = JwtCodec::new_dev(DEFAULT_EXPIRY_SECONDS);
        assert!(codec.is_dev());
        assert!(!test_codec().is_dev());
        let token = codec.issue(input()).unwrap().token;
        assert!(codec.verify(&token).is_ok());
    }

    #[test]
    fn test_extract_bearer_token() {
        assert!(matches!(extract_bearer_token(Some("Bearer abc123")), Some(Ok("abc123"))));
        assert!(matches!(extract_bearer_token(Some("bearer  abc123 ")), Some(Ok("abc123"))));

        assert!(extract_bearer_token(None).is_none());
        assert!(extract_bearer_token(Some("")).is_none());
        assert!(extract_bearer_token(Some("Bearer ")).is_none());

        assert!(matches!(extract_bearer_token(Some("Basic abc123")), Some(Err(_))));
        assert!(matches!(extract_bearer_token(Some("abc123")), Some(Err(_))));
    }
}
