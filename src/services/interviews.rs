use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

use crate::events::{Action, ChangeEvent, Entity, EventBus};
use crate::models::interview::{
    Interview, InterviewFilter, InterviewStatus, NewInterview, ScheduleInterviewRequest, FINAL_ROUND,
};
use crate::services::pipeline::{
    accepts_final_decision, can_revise, categorize, derive_stage, next_action, CurrentStage,
    FinalDecision, NextAction, PipelineCategory,
};
use crate::store::{RecruitmentStore, StoreError};
use crate::utils::errors::AppError;
use crate::utils::logger::LOGGER;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{message}")]
    Invalid { field: &'static str, message: String },
    /// The pipeline state does not allow the requested change.
    #[error("{0}")]
    NotAllowed(String),
    /// The request targets the wrong operation for the interview's round.
    #[error("{0}")]
    WrongOperation(String),
}

impl From<PipelineError> for AppError {
    fn from(error: PipelineError) -> Self {
        match error {
            PipelineError::Store(err) => AppError::from(err),
            PipelineError::Invalid { field, message } => AppError::invalid_field(field, message),
            PipelineError::NotAllowed(msg) => AppError::Conflict(msg),
            PipelineError::WrongOperation(msg) => AppError::BadRequest(msg),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionOutcome {
    /// A round 1 or 2 row was updated in place.
    Revised,
    /// A new final-round row was inserted.
    Appended,
}

#[derive(Debug, Clone, Serialize)]
pub struct CandidatePipeline {
    pub candidate_id: i32,
    pub current: CurrentStage,
    pub next_action: NextAction,
    pub category: PipelineCategory,
}

impl CandidatePipeline {
    pub fn from_rows(candidate_id: i32, interviews: &[Interview]) -> Self {
        let current = derive_stage(interviews);
        Self {
            candidate_id,
            next_action: next_action(&current),
            category: categorize(&current),
            current,
        }
    }
}

/// Rounds 1 and 2 need an evaluator; the final round belongs to HR and has none.
fn check_assignment(round_number: i32, evaluator_id: Option<i32>) -> Result<(), PipelineError> {
    match (round_number >= FINAL_ROUND, evaluator_id) {
        (true, Some(_)) => Err(PipelineError::Invalid {
            field: "evaluator_id",
            message: "The final round is owned by HR and takes no evaluator".to_string(),
        }),
        (false, None) => Err(PipelineError::Invalid {
            field: "evaluator_id",
            message: "An evaluator is required for rounds 1 and 2".to_string(),
        }),
        _ => Ok(()),
    }
}

fn event_metadata(interview: &Interview) -> HashMap<String, serde_json::Value> {
    [
        ("interview_id".to_string(), json!(interview.id)),
        ("round_number".to_string(), json!(interview.round_number)),
        ("status".to_string(), json!(interview.status.as_str())),
    ]
    .into_iter()
    .collect()
}

pub struct InterviewService {
    store: Arc<dyn RecruitmentStore>,
    events: EventBus,
}

impl InterviewService {
    pub fn new(store: Arc<dyn RecruitmentStore>, events: EventBus) -> Self {
        Self { store, events }
    }

    async fn interviews_for(&self, candidate_id: i32) -> Result<Vec<Interview>, PipelineError> {
        let filter = InterviewFilter {
            candidate_id: Some(candidate_id),
            round_number: None,
        };
        Ok(self.store.list_interviews(&filter).await?)
    }

    fn announce(&self, event_name: &str, interview: &Interview, action: Action) {
        LOGGER.log_business_event(event_name, Some(interview.candidate_id), event_metadata(interview));
        self.events.publish(
            ChangeEvent::new(Entity::Interview, action, interview.id).for_candidate(interview.candidate_id),
        );
    }

    pub async fn candidate_pipeline(&self, candidate_id: i32) -> Result<CandidatePipeline, PipelineError> {
        self.store.get_candidate(candidate_id).await?;
        let interviews = self.interviews_for(candidate_id).await?;
        Ok(CandidatePipeline::from_rows(candidate_id, &interviews))
    }

    /// Creates the next round for a candidate with status `Scheduled`.
    pub async fn schedule(&self, request: &ScheduleInterviewRequest) -> Result<Interview, PipelineError> {
        if request.scheduled_at <= Utc::now() {
            return Err(PipelineError::Invalid {
                field: "scheduled_at",
                message: "Please select a future date/time".to_string(),
            });
        }
        check_assignment(request.round_number, request.evaluator_id)?;

        self.store.get_candidate(request.candidate_id).await?;
        if let Some(evaluator_id) = request.evaluator_id {
            self.store.get_evaluator(evaluator_id).await?;
        }

        let interviews = self.interviews_for(request.candidate_id).await?;
        let action = next_action(&derive_stage(&interviews));
        if !action.can_schedule_now || action.next_round != Some(request.round_number) {
            return Err(PipelineError::NotAllowed(format!(
                "Cannot schedule round {} at this time: {}",
                request.round_number, action.allowed_label
            )));
        }

        let interview = self
            .store
            .create_interview(&NewInterview {
                candidate_id: request.candidate_id,
                evaluator_id: request.evaluator_id,
                scheduled_at: request.scheduled_at,
                status: InterviewStatus::Scheduled,
                round_number: request.round_number,
                notes: request.notes.clone().unwrap_or_default(),
            })
            .await?;

        self.announce("interview_scheduled", &interview, Action::Created);
        Ok(interview)
    }

    /// Overwrites every column of an existing interview.
    pub async fn replace(&self, id: i32, replacement: &NewInterview) -> Result<Interview, PipelineError> {
        self.store.get_interview(id).await?;
        check_assignment(replacement.round_number, replacement.evaluator_id)?;

        let interview = self.store.replace_interview(id, replacement).await?;
        self.announce("interview_replaced", &interview, Action::Updated);
        Ok(interview)
    }

    /// In-place status change for a round 1 or round 2 interview.
    pub async fn revise_stage(
        &self,
        id: i32,
        status: InterviewStatus,
        notes: Option<String>,
    ) -> Result<Interview, PipelineError> {
        let existing = self.store.get_interview(id).await?;

        if existing.is_final_round() {
            return Err(PipelineError::WrongOperation(
                "Final-round interviews are not revised in place; record a final decision for the candidate instead"
                    .to_string(),
            ));
        }
        if !can_revise(existing.round_number, existing.status, status) {
            return Err(PipelineError::NotAllowed(format!(
                "Cannot move a round {} interview from '{}' to '{}'",
                existing.round_number, existing.status, status
            )));
        }

        let revised = NewInterview {
            candidate_id: existing.candidate_id,
            evaluator_id: existing.evaluator_id,
            scheduled_at: existing.scheduled_at,
            status,
            round_number: existing.round_number,
            notes: notes.unwrap_or(existing.notes),
        };
        let interview = self.store.replace_interview(id, &revised).await?;

        self.announce("interview_stage_revised", &interview, Action::Updated);
        Ok(interview)
    }

    /// Appends a new final-round row carrying HR's decision. Earlier final-round rows are kept.
    pub async fn record_final_decision(
        &self,
        candidate_id: i32,
        decision: FinalDecision,
        notes: Option<String>,
    ) -> Result<Interview, PipelineError> {
        self.store.get_candidate(candidate_id).await?;
        let interviews = self.interviews_for(candidate_id).await?;

        let current = derive_stage(&interviews);
        if !accepts_final_decision(&current) {
            return Err(PipelineError::NotAllowed(format!(
                "Candidate is not in the final round (current stage: {})",
                current.stage
            )));
        }

        let scheduled_at = interviews
            .iter()
            .filter(|i| i.is_final_round())
            .max_by_key(|i| (i.created_at, i.id))
            .map(|i| i.scheduled_at)
            .unwrap_or_else(Utc::now);
        let notes = notes
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| decision.default_note().to_string());

        let interview = self
            .store
            .create_interview(&NewInterview {
                candidate_id,
                evaluator_id: None,
                scheduled_at,
                status: decision.status(),
                round_number: FINAL_ROUND,
                notes,
            })
            .await?;

        self.announce("final_decision_recorded", &interview, Action::Created);
        Ok(interview)
    }

    /// Applies a decision to an interview: revised in place for rounds 1 and 2,
    /// appended as a new row for the final round.
    pub async fn record_decision(
        &self,
        interview_id: i32,
        status: InterviewStatus,
        notes: Option<String>,
    ) -> Result<(Interview, DecisionOutcome), PipelineError> {
        let existing = self.store.get_interview(interview_id).await?;

        if existing.is_final_round() {
            let decision = FinalDecision::from_status(status).ok_or_else(|| PipelineError::Invalid {
                field: "status",
                message: format!(
                    "'{}' is not a final decision; expected Accepted, Rejected or On Hold",
                    status
                ),
            })?;
            let interview = self
                .record_final_decision(existing.candidate_id, decision, notes)
                .await?;
            return Ok((interview, DecisionOutcome::Appended));
        }

        let interview = self.revise_stage(interview_id, status, notes).await?;
        Ok((interview, DecisionOutcome::Revised))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{candidate::NewCandidate, job::JobRequest};
    use crate::services::pipeline::Stage;
    use crate::store::MemoryStore;
    use chrono::Duration;

    const MANAGER_ID: i32 = 1;

    struct Fixture {
        store: Arc<MemoryStore>,
        service: InterviewService,
        candidate_id: i32,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::with_default_evaluators().await.unwrap());
        let job = store
            .create_job(&JobRequest {
                name: "Platform Engineer".to_string(),
                description: "Owns the deploy pipeline".to_string(),
                employment_type: "Full-time".to_string(),
                work_mode: "Hybrid".to_string(),
            })
            .await
            .unwrap();
        let candidate = store
            .create_candidate(&NewCandidate {
                job_id: job.id,
                name: "Ravi Kumar".to_string(),
                email: "ravi@example.com".to_string(),
                phone: "9123456780".to_string(),
                experience_years: 5,
                college: "NIT Trichy".to_string(),
                skills: "Rust, Kubernetes".to_string(),
                resume_path: None,
            })
            .await
            .unwrap();
        let service = InterviewService::new(store.clone(), EventBus::new());
        Fixture {
            store,
            service,
            candidate_id: candidate.id,
        }
    }

    fn request(candidate_id: i32, round_number: i32, evaluator_id: Option<i32>) -> ScheduleInterviewRequest {
        ScheduleInterviewRequest {
            candidate_id,
            scheduled_at: Utc::now() + Duration::days(3),
            round_number,
            evaluator_id,
            notes: None,
        }
    }

    async fn advance_to_final_round(fx: &Fixture) {
        let round_one = fx.service.schedule(&request(fx.candidate_id, 1, Some(MANAGER_ID))).await.unwrap();
        fx.service
            .revise_stage(round_one.id, InterviewStatus::ProceedToRoundTwo, None)
            .await
            .unwrap();
        let round_two = fx.service.schedule(&request(fx.candidate_id, 2, Some(MANAGER_ID))).await.unwrap();
        fx.service
            .revise_stage(round_two.id, InterviewStatus::RoundTwoAccepted, None)
            .await
            .unwrap();
    }

    async fn all_rows(fx: &Fixture) -> Vec<Interview> {
        fx.store.list_interviews(&InterviewFilter::default()).await.unwrap()
    }

    #[tokio::test]
    async fn scheduling_creates_a_scheduled_row() {
        let fx = fixture().await;
        let interview = fx.service.schedule(&request(fx.candidate_id, 1, Some(MANAGER_ID))).await.unwrap();

        assert_eq!(interview.status, InterviewStatus::Scheduled);
        assert_eq!(interview.round_number, 1);

        let pipeline = fx.service.candidate_pipeline(fx.candidate_id).await.unwrap();
        assert!(!pipeline.next_action.can_schedule_now);
        assert_eq!(pipeline.category, PipelineCategory::Round1Scheduled);
    }

    #[tokio::test]
    async fn scheduling_a_round_the_pipeline_has_not_reached_conflicts() {
        let fx = fixture().await;
        let err = fx
            .service
            .schedule(&request(fx.candidate_id, 2, Some(MANAGER_ID)))
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::NotAllowed(_)));
        assert!(all_rows(&fx).await.is_empty());
    }

    #[tokio::test]
    async fn double_scheduling_round_one_conflicts() {
        let fx = fixture().await;
        fx.service.schedule(&request(fx.candidate_id, 1, Some(MANAGER_ID))).await.unwrap();

        let err = fx
            .service
            .schedule(&request(fx.candidate_id, 1, Some(MANAGER_ID)))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::NotAllowed(_)));
    }

    #[tokio::test]
    async fn evaluator_rules_per_round() {
        let fx = fixture().await;

        let missing = fx.service.schedule(&request(fx.candidate_id, 1, None)).await.unwrap_err();
        assert!(matches!(missing, PipelineError::Invalid { field: "evaluator_id", .. }));

        let unknown = fx.service.schedule(&request(fx.candidate_id, 1, Some(999))).await.unwrap_err();
        assert!(matches!(unknown, PipelineError::Store(StoreError::NotFound("Evaluator"))));

        advance_to_final_round(&fx).await;
        let with_evaluator = fx
            .service
            .schedule(&request(fx.candidate_id, 3, Some(MANAGER_ID)))
            .await
            .unwrap_err();
        assert!(matches!(with_evaluator, PipelineError::Invalid { field: "evaluator_id", .. }));

        let final_round = fx.service.schedule(&request(fx.candidate_id, 3, None)).await.unwrap();
        assert_eq!(final_round.evaluator_id, None);
    }

    #[tokio::test]
    async fn past_dates_are_rejected() {
        let fx = fixture().await;
        let mut past = request(fx.candidate_id, 1, Some(MANAGER_ID));
        past.scheduled_at = Utc::now() - Duration::hours(1);

        let err = fx.service.schedule(&past).await.unwrap_err();
        assert!(matches!(err, PipelineError::Invalid { field: "scheduled_at", .. }));
    }

    #[tokio::test]
    async fn round_one_decision_updates_the_same_row() {
        let fx = fixture().await;
        let scheduled = fx.service.schedule(&request(fx.candidate_id, 1, Some(MANAGER_ID))).await.unwrap();

        let (decided, outcome) = fx
            .service
            .record_decision(scheduled.id, InterviewStatus::ProceedToRoundTwo, Some("Strong systems design".to_string()))
            .await
            .unwrap();

        assert_eq!(outcome, DecisionOutcome::Revised);
        assert_eq!(decided.id, scheduled.id);
        assert_eq!(decided.notes, "Strong systems design");

        let rows = all_rows(&fx).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, InterviewStatus::ProceedToRoundTwo);
    }

    #[tokio::test]
    async fn final_round_decisions_always_append() {
        let fx = fixture().await;
        advance_to_final_round(&fx).await;
        let final_round = fx.service.schedule(&request(fx.candidate_id, 3, None)).await.unwrap();

        let (on_hold, outcome) = fx
            .service
            .record_decision(final_round.id, InterviewStatus::OnHold, None)
            .await
            .unwrap();
        assert_eq!(outcome, DecisionOutcome::Appended);
        assert_ne!(on_hold.id, final_round.id);
        assert_eq!(on_hold.notes, FinalDecision::OnHold.default_note());
        assert_eq!(on_hold.scheduled_at, final_round.scheduled_at);

        let (hired, _) = fx
            .service
            .record_decision(on_hold.id, InterviewStatus::Accepted, None)
            .await
            .unwrap();

        let final_rows: Vec<Interview> = all_rows(&fx)
            .await
            .into_iter()
            .filter(|i| i.is_final_round())
            .collect();
        assert_eq!(final_rows.len(), 3);
        assert_eq!(final_rows[0].status, InterviewStatus::Scheduled);
        assert_eq!(final_rows[1].status, InterviewStatus::OnHold);

        let pipeline = fx.service.candidate_pipeline(fx.candidate_id).await.unwrap();
        assert_eq!(pipeline.current.interview_id, Some(hired.id));
        assert_eq!(pipeline.current.stage, Stage::Interview(InterviewStatus::Accepted));
        assert_eq!(pipeline.category, PipelineCategory::Hired);
    }

    #[tokio::test]
    async fn final_decision_without_final_round_conflicts() {
        let fx = fixture().await;
        fx.service.schedule(&request(fx.candidate_id, 1, Some(MANAGER_ID))).await.unwrap();

        let err = fx
            .service
            .record_final_decision(fx.candidate_id, FinalDecision::Accepted, None)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::NotAllowed(_)));
    }

    #[tokio::test]
    async fn final_decision_straight_after_round_two_acceptance() {
        let fx = fixture().await;
        advance_to_final_round(&fx).await;

        let rejected = fx
            .service
            .record_final_decision(fx.candidate_id, FinalDecision::Rejected, Some("Salary mismatch".to_string()))
            .await
            .unwrap();
        assert_eq!(rejected.round_number, FINAL_ROUND);
        assert_eq!(rejected.evaluator_id, None);
        assert_eq!(rejected.notes, "Salary mismatch");
    }

    #[tokio::test]
    async fn unknown_interview_is_not_found_and_store_is_unchanged() {
        let fx = fixture().await;
        let scheduled = fx.service.schedule(&request(fx.candidate_id, 1, Some(MANAGER_ID))).await.unwrap();
        let before = all_rows(&fx).await;

        let err = fx
            .service
            .record_decision(4242, InterviewStatus::ProceedToRoundTwo, None)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Store(StoreError::NotFound("Interview"))));

        let replacement = NewInterview {
            candidate_id: fx.candidate_id,
            evaluator_id: Some(MANAGER_ID),
            scheduled_at: scheduled.scheduled_at,
            status: InterviewStatus::Rejected,
            round_number: 1,
            notes: String::new(),
        };
        let err = fx.service.replace(4242, &replacement).await.unwrap_err();
        assert!(matches!(err, PipelineError::Store(StoreError::NotFound("Interview"))));

        let after = all_rows(&fx).await;
        assert_eq!(before.len(), after.len());
        assert_eq!(after[0].status, InterviewStatus::Scheduled);
        assert_eq!(after[0].updated_at, before[0].updated_at);
    }

    #[tokio::test]
    async fn replace_rewrites_the_row_under_the_same_id() {
        let fx = fixture().await;
        let scheduled = fx.service.schedule(&request(fx.candidate_id, 1, Some(MANAGER_ID))).await.unwrap();
        let moved_to = scheduled.scheduled_at + Duration::days(1);

        let replaced = fx
            .service
            .replace(
                scheduled.id,
                &NewInterview {
                    candidate_id: fx.candidate_id,
                    evaluator_id: Some(2),
                    scheduled_at: moved_to,
                    status: InterviewStatus::Rejected,
                    round_number: 1,
                    notes: "Weak on systems design".to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(replaced.id, scheduled.id);
        assert_eq!(replaced.evaluator_id, Some(2));
        assert_eq!(replaced.scheduled_at, moved_to);
        assert_eq!(replaced.status, InterviewStatus::Rejected);
        assert_eq!(replaced.notes, "Weak on systems design");

        let rows = all_rows(&fx).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, scheduled.id);
        assert_eq!(rows[0].status, InterviewStatus::Rejected);
    }

    #[tokio::test]
    async fn replace_into_an_occupied_round_conflicts() {
        let fx = fixture().await;
        let round_one = fx.service.schedule(&request(fx.candidate_id, 1, Some(MANAGER_ID))).await.unwrap();
        fx.service
            .revise_stage(round_one.id, InterviewStatus::ProceedToRoundTwo, None)
            .await
            .unwrap();
        let round_two = fx.service.schedule(&request(fx.candidate_id, 2, Some(MANAGER_ID))).await.unwrap();

        let err = fx
            .service
            .replace(
                round_two.id,
                &NewInterview {
                    candidate_id: fx.candidate_id,
                    evaluator_id: Some(MANAGER_ID),
                    scheduled_at: round_two.scheduled_at,
                    status: InterviewStatus::Scheduled,
                    round_number: 1,
                    notes: String::new(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Store(StoreError::Conflict(_))));

        let unchanged = fx.store.get_interview(round_two.id).await.unwrap();
        assert_eq!(unchanged.round_number, 2);
        assert_eq!(all_rows(&fx).await.len(), 2);
    }

    #[tokio::test]
    async fn illegal_revision_conflicts() {
        let fx = fixture().await;
        let scheduled = fx.service.schedule(&request(fx.candidate_id, 1, Some(MANAGER_ID))).await.unwrap();
        fx.service
            .revise_stage(scheduled.id, InterviewStatus::Rejected, None)
            .await
            .unwrap();

        let err = fx
            .service
            .revise_stage(scheduled.id, InterviewStatus::ProceedToRoundTwo, None)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::NotAllowed(_)));

        let pipeline = fx.service.candidate_pipeline(fx.candidate_id).await.unwrap();
        assert_eq!(pipeline.next_action.next_round, None);
        assert!(!pipeline.next_action.can_schedule_now);
    }

    #[tokio::test]
    async fn final_round_rows_are_not_revised_in_place() {
        let fx = fixture().await;
        advance_to_final_round(&fx).await;
        let final_round = fx.service.schedule(&request(fx.candidate_id, 3, None)).await.unwrap();

        let err = fx
            .service
            .revise_stage(final_round.id, InterviewStatus::Accepted, None)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::WrongOperation(_)));
    }

    #[tokio::test]
    async fn final_round_decision_with_non_final_status_is_invalid() {
        let fx = fixture().await;
        advance_to_final_round(&fx).await;
        let final_round = fx.service.schedule(&request(fx.candidate_id, 3, None)).await.unwrap();

        let err = fx
            .service
            .record_decision(final_round.id, InterviewStatus::RoundTwoAccepted, None)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Invalid { field: "status", .. }));
    }

    #[tokio::test]
    async fn writes_publish_change_events() {
        let store = Arc::new(MemoryStore::with_default_evaluators().await.unwrap());
        let events = EventBus::new();
        let mut rx = events.subscribe();
        let job = store
            .create_job(&JobRequest {
                name: "QA".to_string(),
                description: String::new(),
                employment_type: "Contract".to_string(),
                work_mode: "On-site".to_string(),
            })
            .await
            .unwrap();
        let candidate = store
            .create_candidate(&NewCandidate {
                job_id: job.id,
                name: "Meera".to_string(),
                email: "meera@example.com".to_string(),
                phone: "9000000001".to_string(),
                experience_years: 1,
                college: "BITS".to_string(),
                skills: "Testing".to_string(),
                resume_path: None,
            })
            .await
            .unwrap();
        let service = InterviewService::new(store, events);

        let interview = service.schedule(&request(candidate.id, 1, Some(MANAGER_ID))).await.unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.entity, Entity::Interview);
        assert_eq!(event.action, Action::Created);
        assert_eq!(event.id, interview.id);
        assert_eq!(event.candidate_id, Some(candidate.id));
    }
}
