//! Risk scoring
//!
//! Scores run from 1 (negligible) to 10 (severe). The stored risk level of an
//! assessment is always `classify(residual score)`, recomputed on every write.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::AuditError;

pub const MIN_SCORE: i64 = 1;
pub const MAX_SCORE: i64 = 10;

/// A risk score known to lie in `[1, 10]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct RiskScore(u8);

impl RiskScore {
    /// Validate a raw score, naming the offending field on failure
    pub fn parse(field: &str, value: i64) -> Result<Self, AuditError> {
        if (MIN_SCORE..=MAX_SCORE).contains(&value) {
            Ok(RiskScore(value as u8))
        } else {
            Err(AuditError::Validation(format!(
                "{field} must be between {MIN_SCORE} and {MAX_SCORE}, got {value}"
            )))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for RiskScore {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        RiskScore::parse("score", value).map_err(|e| e.to_string())
    }
}

impl From<RiskScore> for i64 {
    fn from(score: RiskScore) -> Self {
        score.0 as i64
    }
}

/// Risk category derived from the residual score
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 4] = [
        RiskLevel::Low,
        RiskLevel::Medium,
        RiskLevel::High,
        RiskLevel::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a residual score to its risk level.
///
/// Each band includes its lower edge: 8 and up is critical, 6-7 high,
/// 4-5 medium, anything below low.
pub fn classify(residual: RiskScore) -> RiskLevel {
    match residual.get() {
        8.. => RiskLevel::Critical,
        6..=7 => RiskLevel::High,
        4..=5 => RiskLevel::Medium,
        _ => RiskLevel::Low,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(v: i64) -> RiskScore {
        RiskScore::parse("residual_risk_score", v).unwrap()
    }

    #[test]
    fn test_band_edges() {
        assert_eq!(classify(score(10)), RiskLevel::Critical);
        assert_eq!(classify(score(8)), RiskLevel::Critical);
        assert_eq!(classify(score(7)), RiskLevel::High);
        assert_eq!(classify(score(6)), RiskLevel::High);
        assert_eq!(classify(score(5)), RiskLevel::Medium);
        assert_eq!(classify(score(4)), RiskLevel::Medium);
        assert_eq!(classify(score(3)), RiskLevel::Low);
        assert_eq!(classify(score(1)), RiskLevel::Low);
    }

    #[test]
    fn test_classify_is_monotonic() {
        let levels: Vec<RiskLevel> = (MIN_SCORE..=MAX_SCORE).map(|v| classify(score(v))).collect();
        assert!(levels.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_out_of_range_rejected() {
        for bad in [0, 11, -3, 100] {
            let err = RiskScore::parse("inherent_risk_score", bad).unwrap_err();
            assert!(matches!(err, AuditError::Validation(_)));
            assert!(err.to_string().contains("inherent_risk_score"));
        }
    }

    #[test]
    fn test_score_serde() {
        assert_eq!(serde_json::to_string(&score(6)).unwrap(), "6");
        let parsed: RiskScore = serde_json::from_str("9").unwrap();
        assert_eq!(parsed.get(), 9);
        assert!(serde_json::from_str::<RiskScore>("12").is_err());
    }
}
