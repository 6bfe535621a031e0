use axum::{extract::State, response::Json};
use serde_json::json;
use validator::Validate;

use crate::{
    models::evaluator::{Designation, LoginRequest, LoginResponse},
    utils::{errors::AppError, extract::JsonBody, logger::LOGGER},
    AppState,
};

/// Same text for an unknown email and a wrong password.
const INVALID_CREDENTIALS: &str = "Invalid email or password";

pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    payload.validate()?;

    let evaluator = state
        .store
        .find_evaluator_by_credentials(payload.email.trim(), &payload.password)
        .await?
        .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

    let home = Designation::parse(&evaluator.designation).map(|d| d.home_route());
    if home.is_none() {
        tracing::warn!(
            "Evaluator {} has designation '{}' with no matching view",
            evaluator.id,
            evaluator.designation
        );
    }

    let metadata = [
        ("evaluator_id".to_string(), json!(evaluator.id)),
        ("designation".to_string(), json!(evaluator.designation)),
    ]
    .into_iter()
    .collect();
    LOGGER.log_business_event("evaluator_login", None, metadata);

    Ok(Json(LoginResponse {
        name: evaluator.name,
        designation: evaluator.designation,
        home,
    }))
}
