use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Job {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub employment_type: String,
    pub work_mode: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Used for both posting a job and overwriting one.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct JobRequest {
    #[validate(length(min = 1, max = 100, message = "Job name is required and cannot exceed 100 characters"))]
    #[serde(alias = "job_name")]
    pub name: String,
    #[validate(length(max = 1000, message = "Description cannot exceed 1000 characters"))]
    #[serde(default)]
    pub description: String,
    #[validate(length(min = 1, max = 50, message = "Type is required and cannot exceed 50 characters"))]
    #[serde(alias = "type")]
    pub employment_type: String,
    #[validate(length(min = 1, max = 50, message = "Work mode is required and cannot exceed 50 characters"))]
    pub work_mode: String,
}
