//! Business operations behind the HTTP routes

pub mod audits;
pub mod auth;
pub mod dashboard;
pub mod names;
pub mod risks;
pub mod users;

pub use audits::AuditService;
pub use auth::AuthService;
pub use dashboard::DashboardService;
pub use risks::RiskService;
pub use users::UserService;
