use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use serde_json::json;
use std::collections::HashMap;
use validator::Validate;

use crate::{
    events::{Action, ChangeEvent, Entity},
    models::job::{Job, JobRequest},
    services::reports::{PipelineBoard, ReportService},
    utils::{
        errors::AppError,
        extract::{JsonBody, PathParam},
        logger::LOGGER,
    },
    AppState,
};

fn job_metadata(job: &Job) -> HashMap<String, serde_json::Value> {
    [
        ("job_id".to_string(), json!(job.id)),
        ("name".to_string(), json!(job.name)),
    ]
    .into_iter()
    .collect()
}

pub async fn list_jobs(State(state): State<AppState>) -> Result<Json<Vec<Job>>, AppError> {
    Ok(Json(state.store.list_jobs().await?))
}

pub async fn get_job(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<Json<Job>, AppError> {
    Ok(Json(state.store.get_job(id).await?))
}

pub async fn create_job(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<JobRequest>,
) -> Result<(StatusCode, Json<Job>), AppError> {
    payload.validate()?;

    let job = state.store.create_job(&payload).await?;

    LOGGER.log_business_event("job_created", None, job_metadata(&job));
    state.events.publish(ChangeEvent::new(Entity::Job, Action::Created, job.id));

    Ok((StatusCode::CREATED, Json(job)))
}

pub async fn update_job(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
    JsonBody(payload): JsonBody<JobRequest>,
) -> Result<Json<Job>, AppError> {
    payload.validate()?;

    let job = state.store.update_job(id, &payload).await?;

    LOGGER.log_business_event("job_updated", None, job_metadata(&job));
    state.events.publish(ChangeEvent::new(Entity::Job, Action::Updated, job.id));

    Ok(Json(job))
}

pub async fn delete_job(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<StatusCode, AppError> {
    state.store.delete_job(id).await?;

    state.events.publish(ChangeEvent::new(Entity::Job, Action::Deleted, id));
    Ok(StatusCode::NO_CONTENT)
}

pub async fn job_pipeline(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<Json<PipelineBoard>, AppError> {
    let board = ReportService::new(state.store.clone()).job_board(id).await?;
    Ok(Json(board))
}
