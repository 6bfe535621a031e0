//! Persistence contract shared by the PostgreSQL store and the in-memory store.
//!
//! Every operation is a single statement against the backing store. Nothing
//! here knows about the interview pipeline; the rules about which rows may be
//! written live in `services::interviews`.

use async_trait::async_trait;

use crate::models::{
    candidate::{Candidate, CandidateFilter, NewCandidate},
    evaluator::{Evaluator, EvaluatorRequest},
    interview::{Interview, InterviewFilter, NewInterview},
    job::{Job, JobRequest},
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait RecruitmentStore: Send + Sync {
    async fn list_jobs(&self) -> StoreResult<Vec<Job>>;
    async fn get_job(&self, id: i32) -> StoreResult<Job>;
    async fn create_job(&self, job: &JobRequest) -> StoreResult<Job>;
    async fn update_job(&self, id: i32, job: &JobRequest) -> StoreResult<Job>;
    /// Fails with a conflict while candidates still reference the job.
    async fn delete_job(&self, id: i32) -> StoreResult<()>;

    async fn list_candidates(&self, filter: &CandidateFilter) -> StoreResult<Vec<Candidate>>;
    async fn get_candidate(&self, id: i32) -> StoreResult<Candidate>;
    async fn create_candidate(&self, candidate: &NewCandidate) -> StoreResult<Candidate>;
    /// Removes the candidate together with its interview rows.
    async fn delete_candidate(&self, id: i32) -> StoreResult<Candidate>;

    async fn list_evaluators(&self) -> StoreResult<Vec<Evaluator>>;
    async fn get_evaluator(&self, id: i32) -> StoreResult<Evaluator>;
    async fn create_evaluator(&self, evaluator: &EvaluatorRequest) -> StoreResult<Evaluator>;
    async fn update_evaluator(&self, id: i32, evaluator: &EvaluatorRequest) -> StoreResult<Evaluator>;
    async fn delete_evaluator(&self, id: i32) -> StoreResult<()>;
    /// Exact email and password match, `None` otherwise.
    async fn find_evaluator_by_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> StoreResult<Option<Evaluator>>;

    /// Ordered by round, then creation time, then id.
    async fn list_interviews(&self, filter: &InterviewFilter) -> StoreResult<Vec<Interview>>;
    async fn get_interview(&self, id: i32) -> StoreResult<Interview>;
    async fn create_interview(&self, interview: &NewInterview) -> StoreResult<Interview>;
    /// Full replacement of the row's columns; not-found leaves the store untouched.
    async fn replace_interview(&self, id: i32, interview: &NewInterview) -> StoreResult<Interview>;
}
