//! Verification outcome and audit trail

use serde::{Deserialize, Serialize};

/// Name reported for a vote that did not reach the confidence threshold
pub const NO_MATCH: &str = "no match";

/// Name reported when an identity id has no registered display name
pub const UNKNOWN_USER: &str = "unknown";

/// Overall decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationStatus {
    #[serde(rename = "VERIFIED")]
    Verified,
    #[serde(rename = "NOT VERIFIED")]
    NotVerified,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Verified => "VERIFIED",
            VerificationStatus::NotVerified => "NOT VERIFIED",
        }
    }
}

/// One model's vote in one round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelVote {
    /// Ensemble member name (RF, ET, DT, XGB, ANN)
    pub model: String,
    /// Voted identity id; `None` below the confidence threshold
    pub user_id: Option<String>,
    /// Display name, or "no match"
    pub user_name: String,
    /// Top-class probability as a percentage
    pub confidence: f64,
}

impl ModelVote {
    pub fn is_match(&self) -> bool {
        self.user_id.is_some()
    }
}

/// Votes of every member for one round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundDetail {
    /// 1-based round number
    pub round: usize,
    pub votes: Vec<ModelVote>,
}

/// Final decision plus the per-round, per-model audit trail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub status: VerificationStatus,
    /// Resolved identity id; `None` unless verified
    pub user_id: Option<String>,
    /// Resolved display name; `None` unless verified
    pub user_name: Option<String>,
    /// Fused top-class probability as a percentage
    pub confidence: f64,
    pub round_details: Vec<RoundDetail>,
}

impl VerificationResult {
    pub fn is_verified(&self) -> bool {
        self.status == VerificationStatus::Verified
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_shape() {
        let result = VerificationResult {
            status: VerificationStatus::NotVerified,
            user_id: None,
            user_name: None,
            confidence: 41.5,
            round_details: vec![RoundDetail {
                round: 1,
                votes: vec![ModelVote {
                    model: "RF".to_string(),
                    user_id: None,
                    user_name: NO_MATCH.to_string(),
                    confidence: 41.5,
                }],
            }],
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "NOT VERIFIED");
        assert!(json["user_id"].is_null());
        assert_eq!(json["round_details"][0]["votes"][0]["user_name"], "no match");
    }
}
