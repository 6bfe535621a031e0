use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Evaluator {
    pub id: i32,
    pub name: String,
    pub email: String,
    /// Stored and compared in plaintext. Replace with salted hashes before any real deployment.
    pub password: String,
    pub designation: String,
}

/// Designations that route to a view. The column itself stays an open string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Designation {
    Manager,
    Hr,
    SuperAdmin,
}

impl Designation {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "Manager" => Some(Designation::Manager),
            "HR" => Some(Designation::Hr),
            "SuperAdmin" => Some(Designation::SuperAdmin),
            _ => None,
        }
    }

    pub fn home_route(&self) -> &'static str {
        match self {
            Designation::Manager => "/manager",
            Designation::Hr => "/hr",
            Designation::SuperAdmin => "/superuser",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct EvaluatorRequest {
    #[validate(length(min = 1, max = 50, message = "Name cannot exceed 50 characters."))]
    pub name: String,
    #[validate(email(message = "Enter a valid email address."), length(max = 100))]
    pub email: String,
    #[validate(length(min = 1, max = 100, message = "Password cannot exceed 100 characters."))]
    pub password: String,
    #[validate(length(min = 1, max = 50, message = "Designation cannot exceed 50 characters."))]
    pub designation: String,
}

#[derive(Debug, Serialize)]
pub struct EvaluatorResponse {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub designation: String,
}

impl From<Evaluator> for EvaluatorResponse {
    fn from(evaluator: Evaluator) -> Self {
        Self {
            id: evaluator.id,
            name: evaluator.name,
            email: evaluator.email,
            designation: evaluator.designation,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub name: String,
    pub designation: String,
    /// Landing route for the designation, absent for designations no view handles.
    pub home: Option<&'static str>,
}
