use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use validator::Validate;

use crate::events::{Action, ChangeEvent, Entity, EventBus};
use crate::models::candidate::{normalize_skills, Candidate, NewCandidate};
use crate::services::resumes::ResumeStorage;
use crate::store::{RecruitmentStore, StoreError};
use crate::utils::errors::AppError;
use crate::utils::logger::LOGGER;

#[derive(Debug, Clone)]
pub struct ResumeUpload {
    pub file_name: String,
    pub data: Vec<u8>,
}

/// Text fields of an application form keyed case-insensitively, so `JobId`,
/// `jobId` and `job_id` all land on the same entry.
#[derive(Debug, Default)]
pub struct ApplicationForm {
    fields: HashMap<String, String>,
    pub resume: Option<ResumeUpload>,
}

fn canonical_name(name: &str) -> String {
    let key: String = name
        .chars()
        .filter(|c| *c != '_' && *c != '-')
        .map(|c| c.to_ascii_lowercase())
        .collect();
    match key.as_str() {
        "experienceyears" => "experience".to_string(),
        "resumefile" => "resume".to_string(),
        _ => key,
    }
}

impl ApplicationForm {
    pub fn is_resume_field(name: &str) -> bool {
        canonical_name(name) == "resume"
    }

    pub fn insert_field(&mut self, name: &str, value: &str) {
        self.fields.insert(canonical_name(name), value.trim().to_string());
    }

    fn text(&self, key: &str) -> String {
        self.fields.get(key).cloned().unwrap_or_default()
    }

    fn number(&self, key: &str, field: &str, message: &str) -> Result<i32, AppError> {
        self.fields
            .get(key)
            .and_then(|value| value.parse::<i32>().ok())
            .ok_or_else(|| AppError::invalid_field(field, message))
    }

    pub fn to_new_candidate(&self) -> Result<NewCandidate, AppError> {
        Ok(NewCandidate {
            job_id: self.number("jobid", "job_id", "A valid job is required")?,
            name: self.text("name"),
            email: self.text("email"),
            phone: self.text("phone"),
            experience_years: self.number(
                "experience",
                "experience_years",
                "Experience must be a whole number of years",
            )?,
            college: self.text("college"),
            skills: normalize_skills(&self.text("skills")),
            resume_path: None,
        })
    }
}

pub struct CandidateService {
    store: Arc<dyn RecruitmentStore>,
    events: EventBus,
    resumes: ResumeStorage,
}

impl CandidateService {
    pub fn new(store: Arc<dyn RecruitmentStore>, events: EventBus, resumes: ResumeStorage) -> Self {
        Self {
            store,
            events,
            resumes,
        }
    }

    /// Validates the application, writes the resume and inserts the row.
    /// The resume is removed again when the insert fails.
    pub async fn submit(&self, form: ApplicationForm) -> Result<Candidate, AppError> {
        let mut candidate = form.to_new_candidate()?;
        candidate.validate()?;

        match self.store.get_job(candidate.job_id).await {
            Ok(_) => {}
            Err(StoreError::NotFound(_)) => {
                return Err(AppError::invalid_field("job_id", "Selected job does not exist"))
            }
            Err(err) => return Err(err.into()),
        }

        if let Some(resume) = &form.resume {
            candidate.resume_path = Some(self.resumes.save(&resume.file_name, &resume.data).await?);
        }

        let created = match self.store.create_candidate(&candidate).await {
            Ok(created) => created,
            Err(err) => {
                if let Some(stored) = &candidate.resume_path {
                    self.resumes.remove(stored).await;
                }
                return Err(err.into());
            }
        };

        let metadata = [
            ("job_id".to_string(), json!(created.job_id)),
            ("has_resume".to_string(), json!(created.resume_path.is_some())),
        ]
        .into_iter()
        .collect();
        LOGGER.log_business_event("candidate_applied", Some(created.id), metadata);
        self.events.publish(
            ChangeEvent::new(Entity::Candidate, Action::Created, created.id).for_candidate(created.id),
        );

        Ok(created)
    }

    /// Deletes the candidate, its interviews and its resume file.
    pub async fn delete(&self, id: i32) -> Result<(), AppError> {
        let removed = self.store.delete_candidate(id).await?;
        if let Some(stored) = &removed.resume_path {
            self.resumes.remove(stored).await;
        }

        LOGGER.log_business_event("candidate_deleted", Some(id), HashMap::new());
        self.events
            .publish(ChangeEvent::new(Entity::Candidate, Action::Deleted, id).for_candidate(id));
        Ok(())
    }

    /// Resume bytes, content type and a download file name.
    pub async fn resume(&self, id: i32) -> Result<(Vec<u8>, mime::Mime, String), AppError> {
        let candidate = self.store.get_candidate(id).await?;
        let stored = candidate
            .resume_path
            .ok_or_else(|| AppError::NotFound("Candidate has no resume".to_string()))?;

        let (data, content_type) = self.resumes.read(&stored).await?;
        let extension = stored.rsplit('.').next().unwrap_or("bin");
        Ok((data, content_type, format!("resume-{}.{}", id, extension)))
    }
}
