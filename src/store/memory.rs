//! In-process store used when no `DATABASE_URL` is configured and by the tests.
//!
//! Mirrors the constraints of the SQL schema: foreign keys, the unique
//! evaluator email, the one-row-per-round rule for rounds 1 and 2, and the
//! cascade from candidates to their interviews.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::{RecruitmentStore, StoreError, StoreResult};
use crate::models::{
    candidate::{Candidate, CandidateFilter, NewCandidate},
    evaluator::{Evaluator, EvaluatorRequest},
    interview::{Interview, InterviewFilter, NewInterview, FINAL_ROUND},
    job::{Job, JobRequest},
};

#[derive(Debug, Default)]
struct Tables {
    next_id: i32,
    jobs: BTreeMap<i32, Job>,
    candidates: BTreeMap<i32, Candidate>,
    evaluators: BTreeMap<i32, Evaluator>,
    interviews: BTreeMap<i32, Interview>,
}

impl Tables {
    fn allocate_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn check_interview_refs(&self, interview: &NewInterview) -> StoreResult<()> {
        if !self.candidates.contains_key(&interview.candidate_id) {
            return Err(StoreError::NotFound("Referenced record"));
        }
        if let Some(evaluator_id) = interview.evaluator_id {
            if !self.evaluators.contains_key(&evaluator_id) {
                return Err(StoreError::NotFound("Referenced record"));
            }
        }
        Ok(())
    }

    fn check_round_unique(&self, interview: &NewInterview, ignore_id: Option<i32>) -> StoreResult<()> {
        if interview.round_number >= FINAL_ROUND {
            return Ok(());
        }
        let taken = self.interviews.values().any(|existing| {
            Some(existing.id) != ignore_id
                && existing.candidate_id == interview.candidate_id
                && existing.round_number == interview.round_number
        });
        if taken {
            return Err(StoreError::Conflict(format!(
                "Round {} is already scheduled for this candidate",
                interview.round_number
            )));
        }
        Ok(())
    }

    fn check_email_unique(&self, email: &str, ignore_id: Option<i32>) -> StoreResult<()> {
        let taken = self
            .evaluators
            .values()
            .any(|existing| Some(existing.id) != ignore_id && existing.email == email);
        if taken {
            return Err(StoreError::Conflict("Evaluator already exists".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The three accounts the SQL migration seeds.
    pub async fn with_default_evaluators() -> StoreResult<Self> {
        let store = Self::new();
        for (name, email, password, designation) in [
            ("Manager User", "manager@company.com", "Manager123", "Manager"),
            ("HR User", "hr@company.com", "Hr123", "HR"),
            ("Super User", "superuser@company.com", "Super123", "SuperAdmin"),
        ] {
            store
                .create_evaluator(&EvaluatorRequest {
                    name: name.to_string(),
                    email: email.to_string(),
                    password: password.to_string(),
                    designation: designation.to_string(),
                })
                .await?;
        }
        Ok(store)
    }
}

#[async_trait]
impl RecruitmentStore for MemoryStore {
    async fn list_jobs(&self) -> StoreResult<Vec<Job>> {
        let tables = self.tables.read().await;
        Ok(tables.jobs.values().rev().cloned().collect())
    }

    async fn get_job(&self, id: i32) -> StoreResult<Job> {
        let tables = self.tables.read().await;
        tables.jobs.get(&id).cloned().ok_or(StoreError::NotFound("Job"))
    }

    async fn create_job(&self, job: &JobRequest) -> StoreResult<Job> {
        let mut tables = self.tables.write().await;
        let id = tables.allocate_id();
        let now = Utc::now();
        let job = Job {
            id,
            name: job.name.clone(),
            description: job.description.clone(),
            employment_type: job.employment_type.clone(),
            work_mode: job.work_mode.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.jobs.insert(id, job.clone());
        Ok(job)
    }

    async fn update_job(&self, id: i32, job: &JobRequest) -> StoreResult<Job> {
        let mut tables = self.tables.write().await;
        let existing = tables.jobs.get_mut(&id).ok_or(StoreError::NotFound("Job"))?;
        existing.name = job.name.clone();
        existing.description = job.description.clone();
        existing.employment_type = job.employment_type.clone();
        existing.work_mode = job.work_mode.clone();
        existing.updated_at = Utc::now();
        Ok(existing.clone())
    }

    async fn delete_job(&self, id: i32) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.jobs.contains_key(&id) {
            return Err(StoreError::NotFound("Job"));
        }
        if tables.candidates.values().any(|c| c.job_id == id) {
            return Err(StoreError::Conflict(
                "Job is still referenced by other records".to_string(),
            ));
        }
        tables.jobs.remove(&id);
        Ok(())
    }

    async fn list_candidates(&self, filter: &CandidateFilter) -> StoreResult<Vec<Candidate>> {
        let tables = self.tables.read().await;
        Ok(tables
            .candidates
            .values()
            .rev()
            .filter(|c| filter.job_id.map_or(true, |job_id| c.job_id == job_id))
            .cloned()
            .collect())
    }

    async fn get_candidate(&self, id: i32) -> StoreResult<Candidate> {
        let tables = self.tables.read().await;
        tables
            .candidates
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound("Candidate"))
    }

    async fn create_candidate(&self, candidate: &NewCandidate) -> StoreResult<Candidate> {
        let mut tables = self.tables.write().await;
        if !tables.jobs.contains_key(&candidate.job_id) {
            return Err(StoreError::NotFound("Referenced record"));
        }
        let id = tables.allocate_id();
        let candidate = Candidate {
            id,
            job_id: candidate.job_id,
            name: candidate.name.clone(),
            email: candidate.email.clone(),
            phone: candidate.phone.clone(),
            experience_years: candidate.experience_years,
            college: candidate.college.clone(),
            skills: candidate.skills.clone(),
            resume_path: candidate.resume_path.clone(),
            created_at: Utc::now(),
        };
        tables.candidates.insert(id, candidate.clone());
        Ok(candidate)
    }

    async fn delete_candidate(&self, id: i32) -> StoreResult<Candidate> {
        let mut tables = self.tables.write().await;
        let candidate = tables
            .candidates
            .remove(&id)
            .ok_or(StoreError::NotFound("Candidate"))?;
        tables.interviews.retain(|_, interview| interview.candidate_id != id);
        Ok(candidate)
    }

    async fn list_evaluators(&self) -> StoreResult<Vec<Evaluator>> {
        let tables = self.tables.read().await;
        Ok(tables.evaluators.values().cloned().collect())
    }

    async fn get_evaluator(&self, id: i32) -> StoreResult<Evaluator> {
        let tables = self.tables.read().await;
        tables
            .evaluators
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound("Evaluator"))
    }

    async fn create_evaluator(&self, evaluator: &EvaluatorRequest) -> StoreResult<Evaluator> {
        let mut tables = self.tables.write().await;
        tables.check_email_unique(&evaluator.email, None)?;
        let id = tables.allocate_id();
        let evaluator = Evaluator {
            id,
            name: evaluator.name.clone(),
            email: evaluator.email.clone(),
            password: evaluator.password.clone(),
            designation: evaluator.designation.clone(),
        };
        tables.evaluators.insert(id, evaluator.clone());
        Ok(evaluator)
    }

    async fn update_evaluator(&self, id: i32, evaluator: &EvaluatorRequest) -> StoreResult<Evaluator> {
        let mut tables = self.tables.write().await;
        if !tables.evaluators.contains_key(&id) {
            return Err(StoreError::NotFound("Evaluator"));
        }
        tables.check_email_unique(&evaluator.email, Some(id))?;
        let existing = tables
            .evaluators
            .get_mut(&id)
            .ok_or(StoreError::NotFound("Evaluator"))?;
        existing.name = evaluator.name.clone();
        existing.email = evaluator.email.clone();
        existing.password = evaluator.password.clone();
        existing.designation = evaluator.designation.clone();
        Ok(existing.clone())
    }

    async fn delete_evaluator(&self, id: i32) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables.evaluators.remove(&id).is_none() {
            return Err(StoreError::NotFound("Evaluator"));
        }
        for interview in tables.interviews.values_mut() {
            if interview.evaluator_id == Some(id) {
                interview.evaluator_id = None;
            }
        }
        Ok(())
    }

    async fn find_evaluator_by_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> StoreResult<Option<Evaluator>> {
        let tables = self.tables.read().await;
        Ok(tables
            .evaluators
            .values()
            .find(|e| e.email == email && e.password == password)
            .cloned())
    }

    async fn list_interviews(&self, filter: &InterviewFilter) -> StoreResult<Vec<Interview>> {
        let tables = self.tables.read().await;
        let mut interviews: Vec<Interview> = tables
            .interviews
            .values()
            .filter(|i| filter.candidate_id.map_or(true, |id| i.candidate_id == id))
            .filter(|i| filter.round_number.map_or(true, |round| i.round_number == round))
            .cloned()
            .collect();
        interviews.sort_by_key(|i| (i.round_number, i.created_at, i.id));
        Ok(interviews)
    }

    async fn get_interview(&self, id: i32) -> StoreResult<Interview> {
        let tables = self.tables.read().await;
        tables
            .interviews
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound("Interview"))
    }

    async fn create_interview(&self, interview: &NewInterview) -> StoreResult<Interview> {
        let mut tables = self.tables.write().await;
        tables.check_interview_refs(interview)?;
        tables.check_round_unique(interview, None)?;
        let id = tables.allocate_id();
        let now = Utc::now();
        let interview = Interview {
            id,
            candidate_id: interview.candidate_id,
            evaluator_id: interview.evaluator_id,
            scheduled_at: interview.scheduled_at,
            status: interview.status,
            round_number: interview.round_number,
            notes: interview.notes.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.interviews.insert(id, interview.clone());
        Ok(interview)
    }

    async fn replace_interview(&self, id: i32, interview: &NewInterview) -> StoreResult<Interview> {
        let mut tables = self.tables.write().await;
        if !tables.interviews.contains_key(&id) {
            return Err(StoreError::NotFound("Interview"));
        }
        tables.check_interview_refs(interview)?;
        tables.check_round_unique(interview, Some(id))?;
        let existing = tables
            .interviews
            .get_mut(&id)
            .ok_or(StoreError::NotFound("Interview"))?;
        existing.candidate_id = interview.candidate_id;
        existing.evaluator_id = interview.evaluator_id;
        existing.scheduled_at = interview.scheduled_at;
        existing.status = interview.status;
        existing.round_number = interview.round_number;
        existing.notes = interview.notes.clone();
        existing.updated_at = Utc::now();
        Ok(existing.clone())
    }
}
