use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use serde::Serialize;
use std::collections::HashMap;
use validator::Validate;

use crate::{
    models::interview::{
        Interview, InterviewFilter, InterviewResponse, InterviewStatus, ScheduleInterviewRequest,
        StatusUpdateRequest, UpdateInterviewRequest,
    },
    services::interviews::DecisionOutcome,
    store::StoreError,
    utils::{
        errors::AppError,
        extract::{JsonBody, PathParam, QueryParams},
    },
    AppState,
};

#[derive(Debug, Serialize)]
pub struct DecisionResponse {
    pub outcome: DecisionOutcome,
    pub interview: InterviewResponse,
}

async fn with_interviewer(state: &AppState, interview: Interview) -> Result<InterviewResponse, AppError> {
    let name = match interview.evaluator_id {
        Some(evaluator_id) => match state.store.get_evaluator(evaluator_id).await {
            Ok(evaluator) => Some(evaluator.name),
            Err(StoreError::NotFound(_)) => None,
            Err(err) => return Err(err.into()),
        },
        None => None,
    };
    Ok(InterviewResponse::with_interviewer(interview, name))
}

pub async fn list_interviews(
    State(state): State<AppState>,
    QueryParams(filter): QueryParams<InterviewFilter>,
) -> Result<Json<Vec<InterviewResponse>>, AppError> {
    let (interviews, evaluators) = tokio::try_join!(
        state.store.list_interviews(&filter),
        state.store.list_evaluators(),
    )?;

    let names: HashMap<i32, String> = evaluators.into_iter().map(|e| (e.id, e.name)).collect();
    let responses = interviews
        .into_iter()
        .map(|interview| {
            let name = interview.evaluator_id.and_then(|id| names.get(&id).cloned());
            InterviewResponse::with_interviewer(interview, name)
        })
        .collect();

    Ok(Json(responses))
}

pub async fn get_interview(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<Json<InterviewResponse>, AppError> {
    let interview = state.store.get_interview(id).await?;
    Ok(Json(with_interviewer(&state, interview).await?))
}

pub async fn schedule_interview(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<ScheduleInterviewRequest>,
) -> Result<(StatusCode, Json<InterviewResponse>), AppError> {
    payload.validate()?;

    let interview = state.interviews().schedule(&payload).await?;

    Ok((StatusCode::CREATED, Json(with_interviewer(&state, interview).await?)))
}

pub async fn replace_interview(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
    JsonBody(payload): JsonBody<UpdateInterviewRequest>,
) -> Result<Json<InterviewResponse>, AppError> {
    let replacement = payload.into_new_interview()?;

    let interview = state.interviews().replace(id, &replacement).await?;

    Ok(Json(with_interviewer(&state, interview).await?))
}

pub async fn revise_stage(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
    JsonBody(payload): JsonBody<StatusUpdateRequest>,
) -> Result<Json<InterviewResponse>, AppError> {
    payload.validate()?;
    let status = InterviewStatus::parse_field("status", &payload.status)?;

    let interview = state.interviews().revise_stage(id, status, payload.notes).await?;

    Ok(Json(with_interviewer(&state, interview).await?))
}

pub async fn record_decision(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
    JsonBody(payload): JsonBody<StatusUpdateRequest>,
) -> Result<(StatusCode, Json<DecisionResponse>), AppError> {
    payload.validate()?;
    let status = InterviewStatus::parse_field("status", &payload.status)?;

    let (interview, outcome) = state
        .interviews()
        .record_decision(id, status, payload.notes)
        .await?;

    let status_code = match outcome {
        DecisionOutcome::Appended => StatusCode::CREATED,
        DecisionOutcome::Revised => StatusCode::OK,
    };
    let interview = with_interviewer(&state, interview).await?;

    Ok((status_code, Json(DecisionResponse { outcome, interview })))
}
