//! Workflow status columns
//!
//! Each column is a closed set of values. Transitions are unrestricted: any
//! value may follow any other.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! status_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $first:ident => $first_str:literal $(, $variant:ident => $str:literal)* $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            #[default]
            $first,
            $($variant,)*
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$name::$first, $($name::$variant,)*];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $name::$first => $first_str,
                    $($name::$variant => $str,)*
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

status_enum! {
    /// Annual audit plan lifecycle
    PlanStatus {
        Draft => "draft",
        Approved => "approved",
        InProgress => "in_progress",
        Completed => "completed",
    }
}

status_enum! {
    /// Engagement phase
    EngagementStatus {
        Planning => "planning",
        Fieldwork => "fieldwork",
        Reporting => "reporting",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

status_enum! {
    /// Working paper review state
    ReviewStatus {
        Draft => "draft",
        UnderReview => "under_review",
        Approved => "approved",
        NeedsRevision => "needs_revision",
    }
}

status_enum! {
    /// Finding severity as rated by the auditor
    Severity {
        Low => "low",
        Medium => "medium",
        High => "high",
        Critical => "critical",
    }
}

status_enum! {
    FindingStatus {
        Open => "open",
        InProgress => "in_progress",
        Resolved => "resolved",
        Closed => "closed",
    }
}

status_enum! {
    ReportStatus {
        Draft => "draft",
        UnderReview => "under_review",
        Final => "final",
    }
}

status_enum! {
    /// Overall audit opinion
    Opinion {
        Satisfactory => "satisfactory",
        NeedsImprovement => "needs_improvement",
        Unsatisfactory => "unsatisfactory",
    }
}

status_enum! {
    /// Corrective action plan progress
    ActionPlanStatus {
        Pending => "pending",
        InProgress => "in_progress",
        Completed => "completed",
        Overdue => "overdue",
    }
}
