use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use serde_json::json;
use validator::Validate;

use crate::{
    events::{Action, ChangeEvent, Entity},
    models::evaluator::{EvaluatorRequest, EvaluatorResponse},
    utils::{
        errors::AppError,
        extract::{JsonBody, PathParam},
        logger::LOGGER,
    },
    AppState,
};

pub async fn list_evaluators(
    State(state): State<AppState>,
) -> Result<Json<Vec<EvaluatorResponse>>, AppError> {
    let evaluators = state.store.list_evaluators().await?;
    Ok(Json(evaluators.into_iter().map(EvaluatorResponse::from).collect()))
}

pub async fn create_evaluator(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<EvaluatorRequest>,
) -> Result<(StatusCode, Json<EvaluatorResponse>), AppError> {
    payload.validate()?;

    let evaluator = state.store.create_evaluator(&payload).await?;

    let metadata = [
        ("evaluator_id".to_string(), json!(evaluator.id)),
        ("designation".to_string(), json!(evaluator.designation)),
    ]
    .into_iter()
    .collect();
    LOGGER.log_business_event("evaluator_created", None, metadata);
    state
        .events
        .publish(ChangeEvent::new(Entity::Evaluator, Action::Created, evaluator.id));

    Ok((StatusCode::CREATED, Json(EvaluatorResponse::from(evaluator))))
}

pub async fn update_evaluator(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
    JsonBody(payload): JsonBody<EvaluatorRequest>,
) -> Result<Json<EvaluatorResponse>, AppError> {
    payload.validate()?;

    let evaluator = state.store.update_evaluator(id, &payload).await?;
    state
        .events
        .publish(ChangeEvent::new(Entity::Evaluator, Action::Updated, evaluator.id));

    Ok(Json(EvaluatorResponse::from(evaluator)))
}

/// Interviews the evaluator ran keep their rows with the evaluator cleared.
pub async fn delete_evaluator(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<StatusCode, AppError> {
    state.store.delete_evaluator(id).await?;

    state
        .events
        .publish(ChangeEvent::new(Entity::Evaluator, Action::Deleted, id));
    Ok(StatusCode::NO_CONTENT)
}
