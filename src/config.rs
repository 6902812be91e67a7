//! Configuration for auditdesk
//!
//! CLI arguments and environment variable handling using clap.

use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use tracing::warn;

use crate::auth::jwt::{DEFAULT_EXPIRY_SECONDS, MAX_EXPIRY_SECONDS, MIN_SECRET_LENGTH};
use crate::auth::JwtCodec;
use crate::types::AuditError;

/// Which document store backs the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    Mongo,
    /// In-process store, development only
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// auditdesk - internal audit management backend
#[derive(Parser, Debug, Clone)]
#[command(name = "auditdesk")]
#[command(about = "Internal audit management API: plans, engagements, findings and risk")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:3001")]
    pub listen: SocketAddr,

    /// Enable development mode (public signing secret, in-memory store allowed)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Document store backend
    #[arg(long, env = "STORE", value_enum, default_value = "mongo")]
    pub store: StoreKind,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "auditdesk")]
    pub mongodb_db: String,

    /// Secret used to sign session tokens (required outside dev mode)
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Session token lifetime in seconds
    #[arg(long, env = "JWT_EXPIRY_SECONDS", default_value_t = DEFAULT_EXPIRY_SECONDS)]
    pub jwt_expiry_seconds: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value = "pretty")]
    pub log_format: LogFormat,

    /// Origin allowed by CORS
    #[arg(long, env = "CORS_ORIGIN", default_value = "http://localhost:3000")]
    pub cors_origin: String,

    /// Largest accepted request body in bytes
    #[arg(long, env = "MAX_BODY_BYTES", default_value_t = 1024 * 1024)]
    pub max_body_bytes: usize,

    /// Email of a director account to create at startup if missing
    #[arg(long, env = "BOOTSTRAP_DIRECTOR_EMAIL")]
    pub bootstrap_director_email: Option<String>,

    /// Password for the bootstrap director account
    #[arg(long, env = "BOOTSTRAP_DIRECTOR_PASSWORD", hide_env_values = true)]
    pub bootstrap_director_password: Option<String>,
}

impl Args {
    /// Validate configuration before anything is started
    pub fn validate(&self) -> Result<(), String> {
        match self.jwt_secret.as_deref() {
            None | Some("") if !self.dev_mode => {
                return Err("JWT_SECRET is required in production mode".to_string());
            }
            Some(secret) if !secret.is_empty() && secret.len() < MIN_SECRET_LENGTH => {
                return Err(format!("JWT_SECRET must be at least {MIN_SECRET_LENGTH} characters"));
            }
            _ => {}
        }

        if self.store == StoreKind::Memory && !self.dev_mode {
            return Err("STORE=memory is only allowed in dev mode".to_string());
        }

        if self.jwt_expiry_seconds == 0 {
            return Err("JWT_EXPIRY_SECONDS must be positive".to_string());
        }
        if self.jwt_expiry_seconds > MAX_EXPIRY_SECONDS {
            return Err(format!("JWT_EXPIRY_SECONDS must not exceed {MAX_EXPIRY_SECONDS}"));
        }

        if self.bootstrap_director_email.is_some() != self.bootstrap_director_password.is_some() {
            return Err(
                "BOOTSTRAP_DIRECTOR_EMAIL and BOOTSTRAP_DIRECTOR_PASSWORD must be set together"
                    .to_string(),
            );
        }

        Ok(())
    }

    /// Build the token codec from the configured secret.
    ///
    /// Without a secret in dev mode the public development secret is used,
    /// and a warning is logged every time.
    pub fn signing_codec(&self) -> Result<JwtCodec, AuditError> {
        match self.jwt_secret.as_deref() {
            Some(secret) if !secret.is_empty() => JwtCodec::new(secret, self.jwt_expiry_seconds),
            _ if self.dev_mode => {
                warn!("JWT_SECRET not set: signing tokens with the public development secret. Do not use in production");
                Ok(JwtCodec::new_dev(self.jwt_expiry_seconds))
            }
            _ => Err(AuditError::Config("JWT_SECRET is required in production mode".into())),
        }
    }

    /// The bootstrap director credentials, if configured
    pub fn bootstrap_director(&self) -> Option<(&str, &str)> {
        match (&self.bootstrap_director_email, &self.bootstrap_director_password) {
            (Some(email), Some(password)) => Some((email.as_str(), password.as_str())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "a-production-secret-of-sufficient-length";

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["auditdesk"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = parse(&["--jwt-secret", SECRET]);
        assert_eq!(args.listen.port(), 3001);
        assert_eq!(args.store, StoreKind::Mongo);
        assert_eq!(args.jwt_expiry_seconds, 8 * 3600);
        assert_eq!(args.mongodb_db, "auditdesk");
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_secret_required_outside_dev() {
        let args = parse(&[]);
        assert!(args.validate().is_err());
        assert!(args.signing_codec().is_err());

        let short = parse(&["--jwt-secret", "short"]);
        assert!(short.validate().is_err());
    }

    #[test]
    fn test_dev_mode_falls_back_to_dev_secret() {
        let args = parse(&["--dev-mode", "--store", "memory"]);
        assert!(args.validate().is_ok());
        assert!(args.signing_codec().unwrap().is_dev());

        let configured = parse(&["--dev-mode", "--jwt-secret", SECRET]);
        assert!(!configured.signing_codec().unwrap().is_dev());
    }

    #[test]
    fn test_expiry_bounds() {
        assert!(parse(&["--jwt-secret", SECRET, "--jwt-expiry-seconds", "0"]).validate().is_err());
        assert!(parse(&["--jwt-secret", SECRET, "--jwt-expiry-seconds", "18446744073709551615"])
            .validate()
            .is_err());
        assert!(parse(&["--jwt-secret", SECRET, "--jwt-expiry-seconds", "2592000"])
            .validate()
            .is_ok());
    }

    #[test]
    fn test_memory_store_needs_dev_mode() {
        let args = parse(&["--store", "memory", "--jwt-secret", SECRET]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_bootstrap_pair() {
        let half = parse(&["--jwt-secret", SECRET, "--bootstrap-director-email", "d@x.test"]);
        assert!(half.validate().is_err());

        let full = parse(&[
            "--jwt-secret",
            SECRET,
            "--bootstrap-director-email",
            "d@x.test",
            "--bootstrap-director-password",
            "initial-pass",
        ]);
        assert!(full.validate().is_ok());
        assert_eq!(full.bootstrap_director(), Some(("d@x.test", "initial-pass")));
    }
}
