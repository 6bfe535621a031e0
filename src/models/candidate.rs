use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::sync::OnceLock;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Candidate {
    pub id: i32,
    pub job_id: i32,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub experience_years: i32,
    pub college: String,
    /// Comma-joined, as submitted by the application form.
    pub skills: String,
    pub resume_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct CandidateFilter {
    pub job_id: Option<i32>,
}

/// An application submission after the multipart form has been read.
#[derive(Debug, Default, Clone, Validate)]
pub struct NewCandidate {
    #[validate(range(min = 1, message = "A valid job is required"))]
    pub job_id: i32,
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    #[validate(custom = "validate_phone")]
    pub phone: String,
    #[validate(range(min = 0, max = 60, message = "Experience must be between 0 and 60 years"))]
    pub experience_years: i32,
    #[validate(length(min = 1, max = 200, message = "College is required"))]
    pub college: String,
    #[validate(custom = "validate_skills")]
    pub skills: String,
    pub resume_path: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CandidateResponse {
    pub id: i32,
    pub job_id: i32,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub experience_years: i32,
    pub college: String,
    pub skills: Vec<String>,
    pub has_resume: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Candidate> for CandidateResponse {
    fn from(candidate: Candidate) -> Self {
        Self {
            id: candidate.id,
            job_id: candidate.job_id,
            skills: split_skills(&candidate.skills),
            name: candidate.name,
            email: candidate.email,
            phone: candidate.phone,
            experience_years: candidate.experience_years,
            college: candidate.college,
            has_resume: candidate.resume_path.is_some(),
            created_at: candidate.created_at,
        }
    }
}

fn phone_pattern() -> &'static Regex {
    static PHONE: OnceLock<Regex> = OnceLock::new();
    PHONE.get_or_init(|| {
        Regex::new(r"^\+?[0-9][0-9 ()\-]{6,18}[0-9]$").expect("phone pattern is valid")
    })
}

fn skill_separator() -> &'static Regex {
    static SEPARATOR: OnceLock<Regex> = OnceLock::new();
    SEPARATOR.get_or_init(|| Regex::new(r"\s*[,;]\s*").expect("separator pattern is valid"))
}

fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if phone_pattern().is_match(phone.trim()) {
        Ok(())
    } else {
        let mut error = ValidationError::new("phone");
        error.message = Some("Enter a valid phone number".into());
        Err(error)
    }
}

fn validate_skills(skills: &str) -> Result<(), ValidationError> {
    if split_skills(skills).is_empty() {
        let mut error = ValidationError::new("skills");
        error.message = Some("Please add at least one skill".into());
        Err(error)
    } else {
        Ok(())
    }
}

pub fn split_skills(raw: &str) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for skill in skill_separator().split(raw.trim()) {
        let skill = skill.trim();
        if skill.is_empty() {
            continue;
        }
        if !seen.iter().any(|s| s.eq_ignore_ascii_case(skill)) {
            seen.push(skill.to_string());
        }
    }
    seen
}

/// Canonical stored form: trimmed, de-duplicated, joined with ", ".
pub fn normalize_skills(raw: &str) -> String {
    split_skills(raw).join(", ")
}
