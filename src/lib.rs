//! auditdesk - internal audit management backend
//!
//! Serves the JSON API behind an internal-audit department's dashboard:
//!
//! - **Auth**: staff accounts, argon2 credentials, signed session tokens
//! - **Audits**: annual plans, engagements, working papers, findings,
//!   reports and the action plans that close findings out
//! - **Risks**: scored assessments classified into levels, heat map
//! - **Dashboard**: per-year statistics and a personal task list
//!
//! Records live in a `DocumentStore`, MongoDB in production or an
//! in-process map for development and tests.

pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod routes;
pub mod server;
pub mod services;
pub mod types;

pub use config::Args;
pub use server::{dispatch, run, AppState};
pub use types::{AuditError, Result};
