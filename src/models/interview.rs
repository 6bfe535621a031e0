use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use crate::utils::errors::AppError;

/// Round 3 is the HR decision round; it has no evaluator and keeps every decision as its own row.
pub const FINAL_ROUND: i32 = 3;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Interview {
    pub id: i32,
    pub candidate_id: i32,
    pub evaluator_id: Option<i32>,
    pub scheduled_at: DateTime<Utc>,
    pub status: InterviewStatus,
    pub round_number: i32,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Interview {
    pub fn is_final_round(&self) -> bool {
        self.round_number == FINAL_ROUND
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "interview_status")]
pub enum InterviewStatus {
    #[sqlx(rename = "Scheduled")]
    #[serde(rename = "Scheduled")]
    Scheduled,
    #[sqlx(rename = "Round 1 Scheduled")]
    #[serde(rename = "Round 1 Scheduled")]
    RoundOneScheduled,
    #[sqlx(rename = "Proceed to Round 2")]
    #[serde(rename = "Proceed to Round 2")]
    ProceedToRoundTwo,
    #[sqlx(rename = "Round 2 Scheduled")]
    #[serde(rename = "Round 2 Scheduled")]
    RoundTwoScheduled,
    #[sqlx(rename = "Round 2 Accepted")]
    #[serde(rename = "Round 2 Accepted")]
    RoundTwoAccepted,
    #[sqlx(rename = "Rejected")]
    #[serde(rename = "Rejected")]
    Rejected,
    #[sqlx(rename = "Round 2 Rejected")]
    #[serde(rename = "Round 2 Rejected")]
    RoundTwoRejected,
    #[sqlx(rename = "Accepted")]
    #[serde(rename = "Accepted")]
    Accepted,
    #[sqlx(rename = "On Hold")]
    #[serde(rename = "On Hold")]
    OnHold,
}

impl InterviewStatus {
    pub const ALL: [InterviewStatus; 9] = [
        InterviewStatus::Scheduled,
        InterviewStatus::RoundOneScheduled,
        InterviewStatus::ProceedToRoundTwo,
        InterviewStatus::RoundTwoScheduled,
        InterviewStatus::RoundTwoAccepted,
        InterviewStatus::Rejected,
        InterviewStatus::RoundTwoRejected,
        InterviewStatus::Accepted,
        InterviewStatus::OnHold,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewStatus::Scheduled => "Scheduled",
            InterviewStatus::RoundOneScheduled => "Round 1 Scheduled",
            InterviewStatus::ProceedToRoundTwo => "Proceed to Round 2",
            InterviewStatus::RoundTwoScheduled => "Round 2 Scheduled",
            InterviewStatus::RoundTwoAccepted => "Round 2 Accepted",
            InterviewStatus::Rejected => "Rejected",
            InterviewStatus::RoundTwoRejected => "Round 2 Rejected",
            InterviewStatus::Accepted => "Accepted",
            InterviewStatus::OnHold => "On Hold",
        }
    }

    pub fn is_rejection(&self) -> bool {
        matches!(self, InterviewStatus::Rejected | InterviewStatus::RoundTwoRejected)
    }

    /// Parses a status arriving at the API boundary, reporting failures against `field`.
    pub fn parse_field(field: &str, value: &str) -> Result<Self, AppError> {
        value
            .parse::<InterviewStatus>()
            .map_err(|e| AppError::invalid_field(field, e.to_string()))
    }
}

impl fmt::Display for InterviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown interview status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for InterviewStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        InterviewStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == trimmed)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// Column values for an insert or a full replacement.
#[derive(Debug, Clone)]
pub struct NewInterview {
    pub candidate_id: i32,
    pub evaluator_id: Option<i32>,
    pub scheduled_at: DateTime<Utc>,
    pub status: InterviewStatus,
    pub round_number: i32,
    pub notes: String,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct InterviewFilter {
    pub candidate_id: Option<i32>,
    #[serde(alias = "round")]
    pub round_number: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ScheduleInterviewRequest {
    pub candidate_id: i32,
    #[serde(alias = "interview_date")]
    pub scheduled_at: DateTime<Utc>,
    #[validate(range(min = 1, max = 3, message = "Round must be 1, 2 or 3"))]
    #[serde(alias = "round")]
    pub round_number: i32,
    #[serde(alias = "scheduled_by_id")]
    pub evaluator_id: Option<i32>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateInterviewRequest {
    pub candidate_id: i32,
    #[serde(alias = "recruiter_id")]
    pub evaluator_id: Option<i32>,
    pub status: String,
    #[serde(alias = "date")]
    pub scheduled_at: DateTime<Utc>,
    #[validate(range(min = 1, max = 3, message = "Round must be 1, 2 or 3"))]
    #[serde(alias = "round")]
    pub round_number: i32,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

impl UpdateInterviewRequest {
    pub fn into_new_interview(self) -> Result<NewInterview, AppError> {
        self.validate()?;
        let status = InterviewStatus::parse_field("status", &self.status)?;

        Ok(NewInterview {
            candidate_id: self.candidate_id,
            evaluator_id: self.evaluator_id,
            scheduled_at: self.scheduled_at,
            status,
            round_number: self.round_number,
            notes: self.notes.unwrap_or_default(),
        })
    }
}

/// Body of a stage revision or a decision on a specific interview.
#[derive(Debug, Deserialize, Validate)]
pub struct StatusUpdateRequest {
    pub status: String,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct FinalDecisionRequest {
    pub decision: String,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InterviewResponse {
    pub id: i32,
    pub candidate_id: i32,
    pub evaluator_id: Option<i32>,
    /// Evaluator name, "HR Team" for the final round, `None` once the evaluator is gone.
    pub interviewer: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    pub status: InterviewStatus,
    pub round_number: i32,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InterviewResponse {
    pub fn with_interviewer(interview: Interview, evaluator_name: Option<String>) -> Self {
        let interviewer = if interview.is_final_round() {
            Some("HR Team".to_string())
        } else {
            evaluator_name
        };

        Self {
            interviewer,
            ..Self::from(interview)
        }
    }
}

impl From<Interview> for InterviewResponse {
    fn from(interview: Interview) -> Self {
        Self {
            id: interview.id,
            candidate_id: interview.candidate_id,
            evaluator_id: interview.evaluator_id,
            interviewer: None,
            scheduled_at: interview.scheduled_at,
            status: interview.status,
            round_number: interview.round_number,
            notes: interview.notes,
            created_at: interview.created_at,
            updated_at: interview.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_strings_round_trip_through_from_str() {
        for status in InterviewStatus::ALL {
            assert_eq!(status.as_str().parse::<InterviewStatus>(), Ok(status));
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        let err = "Not Scheduled".parse::<InterviewStatus>().unwrap_err();
        assert_eq!(err.to_string(), "unknown interview status 'Not Scheduled'");
        assert!("round 1 scheduled".parse::<InterviewStatus>().is_err());
    }

    #[test]
    fn serde_uses_display_strings() {
        let json = serde_json::to_string(&InterviewStatus::ProceedToRoundTwo).unwrap();
        assert_eq!(json, "\"Proceed to Round 2\"");
        let parsed: InterviewStatus = serde_json::from_str("\"On Hold\"").unwrap();
        assert_eq!(parsed, InterviewStatus::OnHold);
    }

    #[test]
    fn update_request_rejects_unknown_status() {
        let request = UpdateInterviewRequest {
            candidate_id: 1,
            evaluator_id: Some(1),
            status: "Maybe Later".to_string(),
            scheduled_at: Utc::now(),
            round_number: 1,
            notes: None,
        };

        match request.into_new_interview() {
            Err(AppError::ValidationError(map)) => assert!(map.contains_key("status")),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }
}
