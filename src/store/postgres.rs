use async_trait::async_trait;
use sqlx::PgPool;
use std::time::Instant;

use super::{RecruitmentStore, StoreError, StoreResult};
use crate::models::{
    candidate::{Candidate, CandidateFilter, NewCandidate},
    evaluator::{Evaluator, EvaluatorRequest},
    interview::{Interview, InterviewFilter, NewInterview},
    job::{Job, JobRequest},
};
use crate::utils::logger::LOGGER;

#[derive(Debug, Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn log_query(query: &str, started: Instant, result_count: Option<usize>) {
    LOGGER.log_database_query(query, started.elapsed().as_millis(), result_count);
}

/// Row lookups and writes: a foreign key failure means the referenced row is missing.
fn write_error(entity: &'static str) -> impl Fn(sqlx::Error) -> StoreError {
    move |error| match error {
        sqlx::Error::RowNotFound => StoreError::NotFound(entity),
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            StoreError::Conflict(format!("{} already exists", entity))
        }
        sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
            StoreError::NotFound("Referenced record")
        }
        other => StoreError::Database(other),
    }
}

/// Interview writes: a unique violation is the one-row-per-round rule.
fn interview_write_error(error: sqlx::Error, round_number: i32) -> StoreError {
    match write_error("Interview")(error) {
        StoreError::Conflict(_) => StoreError::Conflict(format!(
            "Round {} is already scheduled for this candidate",
            round_number
        )),
        other => other,
    }
}

/// Deletes: a foreign key failure means other rows still point at this one.
fn delete_error(entity: &'static str) -> impl Fn(sqlx::Error) -> StoreError {
    move |error| match error {
        sqlx::Error::RowNotFound => StoreError::NotFound(entity),
        sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
            StoreError::Conflict(format!("{} is still referenced by other records", entity))
        }
        other => StoreError::Database(other),
    }
}

#[async_trait]
impl RecruitmentStore for PgStore {
    async fn list_jobs(&self) -> StoreResult<Vec<Job>> {
        let query = "SELECT * FROM jobs ORDER BY created_at DESC, id DESC";
        let started = Instant::now();
        let jobs = sqlx::query_as::<_, Job>(query).fetch_all(&self.db).await?;
        log_query(query, started, Some(jobs.len()));
        Ok(jobs)
    }

    async fn get_job(&self, id: i32) -> StoreResult<Job> {
        sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_one(&self.db)
            .await
            .map_err(write_error("Job"))
    }

    async fn create_job(&self, job: &JobRequest) -> StoreResult<Job> {
        sqlx::query_as::<_, Job>(
            r#"
            INSERT INTO jobs (name, description, employment_type, work_mode)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&job.name)
        .bind(&job.description)
        .bind(&job.employment_type)
        .bind(&job.work_mode)
        .fetch_one(&self.db)
        .await
        .map_err(write_error("Job"))
    }

    async fn update_job(&self, id: i32, job: &JobRequest) -> StoreResult<Job> {
        sqlx::query_as::<_, Job>(
            r#"
            UPDATE jobs
            SET name = $1,
                description = $2,
                employment_type = $3,
                work_mode = $4,
                updated_at = NOW()
            WHERE id = $5
            RETURNING *
            "#,
        )
        .bind(&job.name)
        .bind(&job.description)
        .bind(&job.employment_type)
        .bind(&job.work_mode)
        .bind(id)
        .fetch_one(&self.db)
        .await
        .map_err(write_error("Job"))
    }

    async fn delete_job(&self, id: i32) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .map_err(delete_error("Job"))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("Job"));
        }
        Ok(())
    }

    async fn list_candidates(&self, filter: &CandidateFilter) -> StoreResult<Vec<Candidate>> {
        let query = r#"
            SELECT * FROM candidates
            WHERE ($1::int IS NULL OR job_id = $1)
            ORDER BY created_at DESC, id DESC
        "#;
        let started = Instant::now();
        let candidates = sqlx::query_as::<_, Candidate>(query)
            .bind(filter.job_id)
            .fetch_all(&self.db)
            .await?;
        log_query(query, started, Some(candidates.len()));
        Ok(candidates)
    }

    async fn get_candidate(&self, id: i32) -> StoreResult<Candidate> {
        sqlx::query_as::<_, Candidate>("SELECT * FROM candidates WHERE id = $1")
            .bind(id)
            .fetch_one(&self.db)
            .await
            .map_err(write_error("Candidate"))
    }

    async fn create_candidate(&self, candidate: &NewCandidate) -> StoreResult<Candidate> {
        sqlx::query_as::<_, Candidate>(
            r#"
            INSERT INTO candidates
                (job_id, name, email, phone, experience_years, college, skills, resume_path)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(candidate.job_id)
        .bind(&candidate.name)
        .bind(&candidate.email)
        .bind(&candidate.phone)
        .bind(candidate.experience_years)
        .bind(&candidate.college)
        .bind(&candidate.skills)
        .bind(&candidate.resume_path)
        .fetch_one(&self.db)
        .await
        .map_err(write_error("Candidate"))
    }

    async fn delete_candidate(&self, id: i32) -> StoreResult<Candidate> {
        sqlx::query_as::<_, Candidate>("DELETE FROM candidates WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_one(&self.db)
            .await
            .map_err(delete_error("Candidate"))
    }

    async fn list_evaluators(&self) -> StoreResult<Vec<Evaluator>> {
        let evaluators = sqlx::query_as::<_, Evaluator>("SELECT * FROM evaluators ORDER BY id")
            .fetch_all(&self.db)
            .await?;
        Ok(evaluators)
    }

    async fn get_evaluator(&self, id: i32) -> StoreResult<Evaluator> {
        sqlx::query_as::<_, Evaluator>("SELECT * FROM evaluators WHERE id = $1")
            .bind(id)
            .fetch_one(&self.db)
            .await
            .map_err(write_error("Evaluator"))
    }

    async fn create_evaluator(&self, evaluator: &EvaluatorRequest) -> StoreResult<Evaluator> {
        sqlx::query_as::<_, Evaluator>(
            r#"
            INSERT INTO evaluators (name, email, password, designation)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&evaluator.name)
        .bind(&evaluator.email)
        .bind(&evaluator.password)
        .bind(&evaluator.designation)
        .fetch_one(&self.db)
        .await
        .map_err(write_error("Evaluator"))
    }

    async fn update_evaluator(&self, id: i32, evaluator: &EvaluatorRequest) -> StoreResult<Evaluator> {
        sqlx::query_as::<_, Evaluator>(
            r#"
            UPDATE evaluators
            SET name = $1, email = $2, password = $3, designation = $4
            WHERE id = $5
            RETURNING *
            "#,
        )
        .bind(&evaluator.name)
        .bind(&evaluator.email)
        .bind(&evaluator.password)
        .bind(&evaluator.designation)
        .bind(id)
        .fetch_one(&self.db)
        .await
        .map_err(write_error("Evaluator"))
    }

    async fn delete_evaluator(&self, id: i32) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM evaluators WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .map_err(delete_error("Evaluator"))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("Evaluator"));
        }
        Ok(())
    }

    async fn find_evaluator_by_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> StoreResult<Option<Evaluator>> {
        let evaluator = sqlx::query_as::<_, Evaluator>(
            "SELECT * FROM evaluators WHERE email = $1 AND password = $2",
        )
        .bind(email)
        .bind(password)
        .fetch_optional(&self.db)
        .await?;
        Ok(evaluator)
    }

    async fn list_interviews(&self, filter: &InterviewFilter) -> StoreResult<Vec<Interview>> {
        let query = r#"
            SELECT * FROM interviews
            WHERE ($1::int IS NULL OR candidate_id = $1)
              AND ($2::int IS NULL OR round_number = $2)
            ORDER BY round_number, created_at, id
        "#;
        let started = Instant::now();
        let interviews = sqlx::query_as::<_, Interview>(query)
            .bind(filter.candidate_id)
            .bind(filter.round_number)
            .fetch_all(&self.db)
            .await?;
        log_query(query, started, Some(interviews.len()));
        Ok(interviews)
    }

    async fn get_interview(&self, id: i32) -> StoreResult<Interview> {
        sqlx::query_as::<_, Interview>("SELECT * FROM interviews WHERE id = $1")
            .bind(id)
            .fetch_one(&self.db)
            .await
            .map_err(write_error("Interview"))
    }

    async fn create_interview(&self, interview: &NewInterview) -> StoreResult<Interview> {
        sqlx::query_as::<_, Interview>(
            r#"
            INSERT INTO interviews
                (candidate_id, evaluator_id, scheduled_at, status, round_number, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(interview.candidate_id)
        .bind(interview.evaluator_id)
        .bind(interview.scheduled_at)
        .bind(interview.status)
        .bind(interview.round_number)
        .bind(&interview.notes)
        .fetch_one(&self.db)
        .await
        .map_err(|error| interview_write_error(error, interview.round_number))
    }

    async fn replace_interview(&self, id: i32, interview: &NewInterview) -> StoreResult<Interview> {
        sqlx::query_as::<_, Interview>(
            r#"
            UPDATE interviews
            SET candidate_id = $1,
                evaluator_id = $2,
                scheduled_at = $3,
                status = $4,
                round_number = $5,
                notes = $6,
                updated_at = NOW()
            WHERE id = $7
            RETURNING *
            "#,
        )
        .bind(interview.candidate_id)
        .bind(interview.evaluator_id)
        .bind(interview.scheduled_at)
        .bind(interview.status)
        .bind(interview.round_number)
        .bind(&interview.notes)
        .bind(id)
        .fetch_one(&self.db)
        .await
        .map_err(|error| interview_write_error(error, interview.round_number))
    }
}
