//! Interview pipeline: stage derivation, next-action lookup and the
//! transition table for in-place revisions.
//!
//! Everything here is pure. The stage of a candidate is a function of its
//! interview rows only; nothing is cached or stored.

use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::models::interview::{Interview, InterviewStatus, FINAL_ROUND};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// No interview rows exist for the candidate. Never stored.
    NotScheduled,
    Interview(InterviewStatus),
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::NotScheduled => "Not Scheduled",
            Stage::Interview(status) => status.as_str(),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Stage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Where a candidate sits: the stage plus the row it was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CurrentStage {
    pub stage: Stage,
    pub round: Option<i32>,
    pub interview_id: Option<i32>,
}

impl CurrentStage {
    pub const NOT_SCHEDULED: CurrentStage = CurrentStage {
        stage: Stage::NotScheduled,
        round: None,
        interview_id: None,
    };

    fn from_row(interview: &Interview) -> Self {
        CurrentStage {
            stage: Stage::Interview(interview.status),
            round: Some(interview.round_number),
            interview_id: Some(interview.id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NextAction {
    pub next_round: Option<i32>,
    pub allowed_label: String,
    pub can_schedule_now: bool,
}

impl NextAction {
    fn schedule(round: i32, label: impl Into<String>) -> Self {
        Self {
            next_round: Some(round),
            allowed_label: label.into(),
            can_schedule_now: true,
        }
    }

    fn waiting(round: Option<i32>, label: impl Into<String>) -> Self {
        Self {
            next_round: round,
            allowed_label: label.into(),
            can_schedule_now: false,
        }
    }
}

/// Most recent row wins among rows of the same round.
fn recency(a: &Interview, b: &Interview) -> Ordering {
    (a.created_at, a.id).cmp(&(b.created_at, b.id))
}

/// Derives the current stage from every interview row of one candidate.
///
/// The row with the highest round decides; ties go to the most recently
/// created row. A rejection in round 1 or 2 ends the pipeline, so it wins
/// over any stray row in a later round. Final-round rejections are not sticky
/// because HR may record a new decision.
pub fn derive_stage(interviews: &[Interview]) -> CurrentStage {
    let early_rejection = interviews
        .iter()
        .filter(|i| i.round_number < FINAL_ROUND && i.status.is_rejection())
        .min_by(|a, b| a.round_number.cmp(&b.round_number).then_with(|| recency(b, a)));

    if let Some(rejected) = early_rejection {
        return CurrentStage::from_row(rejected);
    }

    interviews
        .iter()
        .max_by(|a, b| a.round_number.cmp(&b.round_number).then_with(|| recency(a, b)))
        .map(CurrentStage::from_row)
        .unwrap_or(CurrentStage::NOT_SCHEDULED)
}

/// Decides whether a new round may be scheduled from the current stage.
pub fn next_action(current: &CurrentStage) -> NextAction {
    let status = match current.stage {
        Stage::NotScheduled => return NextAction::schedule(1, "Schedule Round 1"),
        Stage::Interview(status) => status,
    };

    match status {
        InterviewStatus::RoundOneScheduled => {
            NextAction::waiting(Some(1), "Round 1 Scheduled (waiting)")
        }
        InterviewStatus::ProceedToRoundTwo => NextAction::schedule(2, "Schedule Round 2"),
        InterviewStatus::RoundTwoScheduled => {
            NextAction::waiting(Some(2), "Round 2 Scheduled (waiting)")
        }
        InterviewStatus::RoundTwoAccepted => NextAction::schedule(FINAL_ROUND, "Schedule Final Round"),
        InterviewStatus::Rejected | InterviewStatus::RoundTwoRejected => {
            NextAction::waiting(None, "Rejected")
        }
        InterviewStatus::Scheduled => {
            let round = current.round.unwrap_or(1);
            if round == FINAL_ROUND {
                NextAction::waiting(Some(round), "Final Round Scheduled (waiting)")
            } else {
                NextAction::waiting(Some(round), format!("Round {} Scheduled (waiting)", round))
            }
        }
        InterviewStatus::Accepted => NextAction::waiting(None, "Hired"),
        InterviewStatus::OnHold => {
            NextAction::waiting(Some(FINAL_ROUND), "On Hold (awaiting final decision)")
        }
    }
}

/// Transition table for in-place revisions of round 1 and round 2 rows.
///
/// Re-writing the current status is always allowed so notes can be edited.
/// Final-round rows are never revised in place.
pub fn can_revise(round: i32, from: InterviewStatus, to: InterviewStatus) -> bool {
    use InterviewStatus::*;

    if round >= FINAL_ROUND {
        return false;
    }
    if from == to {
        return true;
    }

    match round {
        1 => matches!(from, Scheduled | RoundOneScheduled)
            && matches!(to, RoundOneScheduled | ProceedToRoundTwo | Rejected),
        2 => matches!(from, Scheduled | RoundTwoScheduled)
            && matches!(to, RoundTwoScheduled | RoundTwoAccepted | RoundTwoRejected),
        _ => false,
    }
}

/// True when HR may record a final decision for a candidate at this stage.
pub fn accepts_final_decision(current: &CurrentStage) -> bool {
    match current.stage {
        Stage::Interview(InterviewStatus::RoundTwoAccepted) => true,
        Stage::Interview(_) => current.round == Some(FINAL_ROUND),
        Stage::NotScheduled => false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalDecision {
    Accepted,
    Rejected,
    OnHold,
}

impl FinalDecision {
    pub fn status(&self) -> InterviewStatus {
        match self {
            FinalDecision::Accepted => InterviewStatus::Accepted,
            FinalDecision::Rejected => InterviewStatus::Rejected,
            FinalDecision::OnHold => InterviewStatus::OnHold,
        }
    }

    pub fn default_note(&self) -> &'static str {
        match self {
            FinalDecision::Accepted => "HIRED: Candidate accepted by HR - Offer letter to be sent",
            FinalDecision::Rejected => {
                "NOT HIRED: Candidate rejected by HR - Does not meet final requirements"
            }
            FinalDecision::OnHold => {
                "ON HOLD: Decision pending - Requires additional review or references"
            }
        }
    }

    pub fn from_status(status: InterviewStatus) -> Option<Self> {
        match status {
            InterviewStatus::Accepted => Some(FinalDecision::Accepted),
            InterviewStatus::Rejected => Some(FinalDecision::Rejected),
            InterviewStatus::OnHold => Some(FinalDecision::OnHold),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a final decision; expected Accepted, Rejected or On Hold")]
pub struct UnknownDecision(pub String);

impl FromStr for FinalDecision {
    type Err = UnknownDecision;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<InterviewStatus>()
            .ok()
            .and_then(FinalDecision::from_status)
            .ok_or_else(|| UnknownDecision(s.to_string()))
    }
}

/// Buckets used by the HR candidate board and the reports summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineCategory {
    New,
    Round1Scheduled,
    Round2Pending,
    Round2Scheduled,
    FinalRound,
    OnHold,
    Hired,
    Rejected,
}

impl PipelineCategory {
    pub const ALL: [PipelineCategory; 8] = [
        PipelineCategory::New,
        PipelineCategory::Round1Scheduled,
        PipelineCategory::Round2Pending,
        PipelineCategory::Round2Scheduled,
        PipelineCategory::FinalRound,
        PipelineCategory::OnHold,
        PipelineCategory::Hired,
        PipelineCategory::Rejected,
    ];
}

pub fn categorize(current: &CurrentStage) -> PipelineCategory {
    let status = match current.stage {
        Stage::NotScheduled => return PipelineCategory::New,
        Stage::Interview(status) => status,
    };

    match status {
        InterviewStatus::RoundOneScheduled => PipelineCategory::Round1Scheduled,
        InterviewStatus::ProceedToRoundTwo => PipelineCategory::Round2Pending,
        InterviewStatus::RoundTwoScheduled => PipelineCategory::Round2Scheduled,
        InterviewStatus::RoundTwoAccepted => PipelineCategory::FinalRound,
        InterviewStatus::Rejected | InterviewStatus::RoundTwoRejected => PipelineCategory::Rejected,
        InterviewStatus::Accepted => PipelineCategory::Hired,
        InterviewStatus::OnHold => PipelineCategory::OnHold,
        InterviewStatus::Scheduled => match current.round {
            Some(2) => PipelineCategory::Round2Scheduled,
            Some(round) if round >= FINAL_ROUND => PipelineCategory::FinalRound,
            _ => PipelineCategory::Round1Scheduled,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn row(id: i32, round_number: i32, status: InterviewStatus) -> Interview {
        let created = Utc.with_ymd_and_hms(2025, 8, 1, 9, 0, 0).unwrap() + Duration::minutes(id as i64);
        Interview {
            id,
            candidate_id: 7,
            evaluator_id: if round_number < FINAL_ROUND { Some(1) } else { None },
            scheduled_at: created + Duration::days(2),
            status,
            round_number,
            notes: String::new(),
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn no_rows_means_not_scheduled_and_round_one_is_open() {
        let current = derive_stage(&[]);
        assert_eq!(current, CurrentStage::NOT_SCHEDULED);
        assert_eq!(current.stage.as_str(), "Not Scheduled");

        let action = next_action(&current);
        assert_eq!(action.next_round, Some(1));
        assert!(action.can_schedule_now);
        assert_eq!(action.allowed_label, "Schedule Round 1");
    }

    #[test]
    fn round_one_scheduled_blocks_scheduling() {
        let current = derive_stage(&[row(1, 1, InterviewStatus::RoundOneScheduled)]);
        let action = next_action(&current);
        assert_eq!(action.next_round, Some(1));
        assert!(!action.can_schedule_now);
    }

    #[test]
    fn proceed_to_round_two_opens_round_two() {
        let current = derive_stage(&[row(1, 1, InterviewStatus::ProceedToRoundTwo)]);
        let action = next_action(&current);
        assert_eq!(action.next_round, Some(2));
        assert!(action.can_schedule_now);
    }

    #[test]
    fn round_two_accepted_opens_final_round() {
        let rows = [
            row(1, 1, InterviewStatus::ProceedToRoundTwo),
            row(2, 2, InterviewStatus::RoundTwoAccepted),
        ];
        let action = next_action(&derive_stage(&rows));
        assert_eq!(action.next_round, Some(3));
        assert!(action.can_schedule_now);
        assert_eq!(action.allowed_label, "Schedule Final Round");
    }

    #[test]
    fn round_one_rejection_is_terminal() {
        let action = next_action(&derive_stage(&[row(1, 1, InterviewStatus::Rejected)]));
        assert_eq!(action.next_round, None);
        assert!(!action.can_schedule_now);
    }

    #[test]
    fn round_one_rejection_wins_over_stray_later_rows() {
        let rows = [
            row(1, 1, InterviewStatus::Rejected),
            row(2, 2, InterviewStatus::RoundTwoScheduled),
        ];
        let current = derive_stage(&rows);
        assert_eq!(current.stage, Stage::Interview(InterviewStatus::Rejected));
        assert_eq!(current.interview_id, Some(1));
        assert!(!next_action(&current).can_schedule_now);
    }

    #[test]
    fn highest_round_decides_regardless_of_input_order() {
        let rows = [
            row(3, 2, InterviewStatus::RoundTwoScheduled),
            row(1, 1, InterviewStatus::ProceedToRoundTwo),
        ];
        let current = derive_stage(&rows);
        assert_eq!(current.stage, Stage::Interview(InterviewStatus::RoundTwoScheduled));
        assert_eq!(current.round, Some(2));
    }

    #[test]
    fn latest_final_round_row_wins_the_tie() {
        let rows = [
            row(5, 3, InterviewStatus::OnHold),
            row(9, 3, InterviewStatus::Accepted),
            row(4, 2, InterviewStatus::RoundTwoAccepted),
        ];
        let current = derive_stage(&rows);
        assert_eq!(current.interview_id, Some(9));
        assert_eq!(next_action(&current).allowed_label, "Hired");

        let mut reversed = rows.clone();
        reversed.reverse();
        assert_eq!(derive_stage(&reversed), current);
    }

    #[test]
    fn final_round_rejection_can_be_superseded() {
        let rows = [
            row(4, 2, InterviewStatus::RoundTwoAccepted),
            row(5, 3, InterviewStatus::Rejected),
            row(6, 3, InterviewStatus::OnHold),
        ];
        let current = derive_stage(&rows);
        assert_eq!(current.stage, Stage::Interview(InterviewStatus::OnHold));
    }

    #[test]
    fn freshly_scheduled_rows_wait_for_a_decision() {
        let round_one = next_action(&derive_stage(&[row(1, 1, InterviewStatus::Scheduled)]));
        assert_eq!(round_one.next_round, Some(1));
        assert!(!round_one.can_schedule_now);
        assert_eq!(round_one.allowed_label, "Round 1 Scheduled (waiting)");

        let final_round = next_action(&derive_stage(&[
            row(1, 2, InterviewStatus::RoundTwoAccepted),
            row(2, 3, InterviewStatus::Scheduled),
        ]));
        assert_eq!(final_round.allowed_label, "Final Round Scheduled (waiting)");
        assert!(!final_round.can_schedule_now);
    }

    #[test]
    fn revision_table() {
        use InterviewStatus::*;

        assert!(can_revise(1, Scheduled, ProceedToRoundTwo));
        assert!(can_revise(1, RoundOneScheduled, Rejected));
        assert!(can_revise(2, RoundTwoScheduled, RoundTwoAccepted));
        assert!(can_revise(2, Scheduled, RoundTwoRejected));
        assert!(can_revise(1, ProceedToRoundTwo, ProceedToRoundTwo));

        assert!(!can_revise(1, Scheduled, RoundTwoAccepted));
        assert!(!can_revise(1, Rejected, ProceedToRoundTwo));
        assert!(!can_revise(2, RoundTwoAccepted, RoundTwoRejected));
        assert!(!can_revise(3, Scheduled, Accepted));
    }

    #[test]
    fn final_decisions_parse_from_status_strings() {
        assert_eq!("Accepted".parse::<FinalDecision>(), Ok(FinalDecision::Accepted));
        assert_eq!("On Hold".parse::<FinalDecision>(), Ok(FinalDecision::OnHold));
        assert!("Round 2 Accepted".parse::<FinalDecision>().is_err());
        assert_eq!(FinalDecision::Rejected.status(), InterviewStatus::Rejected);
    }

    #[test]
    fn final_decision_requires_final_round() {
        assert!(!accepts_final_decision(&CurrentStage::NOT_SCHEDULED));
        assert!(!accepts_final_decision(&derive_stage(&[row(1, 1, InterviewStatus::ProceedToRoundTwo)])));
        assert!(accepts_final_decision(&derive_stage(&[row(1, 2, InterviewStatus::RoundTwoAccepted)])));
        assert!(accepts_final_decision(&derive_stage(&[row(1, 3, InterviewStatus::OnHold)])));
    }

    #[test]
    fn categories_follow_the_board_columns() {
        assert_eq!(categorize(&CurrentStage::NOT_SCHEDULED), PipelineCategory::New);
        assert_eq!(
            categorize(&derive_stage(&[row(1, 2, InterviewStatus::Scheduled)])),
            PipelineCategory::Round2Scheduled
        );
        assert_eq!(
            categorize(&derive_stage(&[row(1, 3, InterviewStatus::Accepted)])),
            PipelineCategory::Hired
        );
        assert_eq!(
            categorize(&derive_stage(&[row(1, 2, InterviewStatus::RoundTwoRejected)])),
            PipelineCategory::Rejected
        );
    }

    #[test]
    fn categories_serialize_as_board_keys() {
        let keys: Vec<String> = PipelineCategory::ALL
            .iter()
            .map(|category| serde_json::to_value(category).unwrap().as_str().unwrap().to_string())
            .collect();
        assert_eq!(
            keys,
            [
                "new",
                "round1_scheduled",
                "round2_pending",
                "round2_scheduled",
                "final_round",
                "on_hold",
                "hired",
                "rejected",
            ]
        );
    }

    #[test]
    fn stage_serializes_as_its_label() {
        let json = serde_json::to_value(derive_stage(&[])).unwrap();
        assert_eq!(json["stage"], "Not Scheduled");
        assert!(json["round"].is_null());
    }
}
