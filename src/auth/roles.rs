//! Staff roles, account status, and the role sets routes are gated on

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role assigned to a staff account at registration. Never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Chief audit executive; manages staff and approves plans
    Director,
    SeniorAuditor,
    Auditor,
    /// Auditee management, responsible for action plans
    Management,
    /// Board / audit committee, read access
    Board,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Director,
        Role::SeniorAuditor,
        Role::Auditor,
        Role::Management,
        Role::Board,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Director => "director",
            Role::SeniorAuditor => "senior_auditor",
            Role::Auditor => "auditor",
            Role::Management => "management",
            Role::Board => "board",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| format!("Unknown role: {s}"))
    }
}

/// Account status. Only active accounts may authenticate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    #[default]
    Active,
    Inactive,
    Suspended,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Inactive => "inactive",
            UserStatus::Suspended => "suspended",
        }
    }

    /// Whether a user in this status may log in or use an issued token
    pub fn permits_authentication(&self) -> bool {
        match self {
            UserStatus::Active => true,
            UserStatus::Inactive | UserStatus::Suspended => false,
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Roles an operation is restricted to. An empty set means any
/// authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleSet(&'static [Role]);

impl RoleSet {
    /// Any authenticated user
    pub const ANY: RoleSet = RoleSet(&[]);
    /// User administration
    pub const DIRECTOR: RoleSet = RoleSet(&[Role::Director]);
    /// Audit planning: plans, engagements, reports, reviews
    pub const PLANNERS: RoleSet = RoleSet(&[Role::Director, Role::SeniorAuditor]);
    /// Risk assessment and finding follow-up
    pub const ASSESSORS: RoleSet = RoleSet(&[Role::Director, Role::SeniorAuditor, Role::Auditor]);

    pub const fn of(roles: &'static [Role]) -> Self {
        RoleSet(roles)
    }

    pub fn roles(&self) -> &'static [Role] {
        self.0
    }

    pub fn is_any(&self) -> bool {
        self.0.is_empty()
    }

    pub fn permits(&self, role: Role) -> bool {
        self.is_any() || self.0.contains(&role)
    }
}
