use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::Json,
};

use validator::Validate;

use crate::{
    models::{
        candidate::{CandidateFilter, CandidateResponse},
        interview::{FinalDecisionRequest, InterviewResponse},
    },
    services::{
        candidates::{ApplicationForm, ResumeUpload},
        interviews::CandidatePipeline,
        pipeline::FinalDecision,
    },
    utils::{
        errors::AppError,
        extract::{JsonBody, PathParam, QueryParams},
    },
    AppState,
};

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("Request body is too large".to_string())
    } else {
        AppError::BadRequest(format!("Malformed form data: {}", err.body_text()))
    }
}

async fn read_application(mut multipart: Multipart) -> Result<ApplicationForm, AppError> {
    let mut form = ApplicationForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or("").to_string();

        if ApplicationForm::is_resume_field(&name) {
            let file_name = field.file_name().unwrap_or("").to_string();
            let data = field.bytes().await.map_err(multipart_error)?;
            // Browsers send an empty part when no file was picked.
            if !file_name.is_empty() || !data.is_empty() {
                form.resume = Some(ResumeUpload {
                    file_name,
                    data: data.to_vec(),
                });
            }
        } else {
            let value = field.text().await.map_err(multipart_error)?;
            form.insert_field(&name, &value);
        }
    }

    Ok(form)
}

pub async fn list_candidates(
    State(state): State<AppState>,
    QueryParams(filter): QueryParams<CandidateFilter>,
) -> Result<Json<Vec<CandidateResponse>>, AppError> {
    let candidates = state.store.list_candidates(&filter).await?;
    Ok(Json(candidates.into_iter().map(CandidateResponse::from).collect()))
}

pub async fn get_candidate(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<Json<CandidateResponse>, AppError> {
    let candidate = state.store.get_candidate(id).await?;
    Ok(Json(CandidateResponse::from(candidate)))
}

pub async fn create_candidate(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<CandidateResponse>), AppError> {
    let form = read_application(multipart).await?;
    let candidate = state.candidates().submit(form).await?;

    Ok((StatusCode::CREATED, Json(CandidateResponse::from(candidate))))
}

pub async fn delete_candidate(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<StatusCode, AppError> {
    state.candidates().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn candidate_pipeline(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<Json<CandidatePipeline>, AppError> {
    let pipeline = state.interviews().candidate_pipeline(id).await?;
    Ok(Json(pipeline))
}

pub async fn record_final_decision(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
    JsonBody(payload): JsonBody<FinalDecisionRequest>,
) -> Result<(StatusCode, Json<InterviewResponse>), AppError> {
    payload.validate()?;
    let decision = payload.decision.trim().parse::<FinalDecision>().map_err(|_| {
        AppError::invalid_field("decision", "Decision must be Accepted, Rejected or On Hold")
    })?;

    let interview = state
        .interviews()
        .record_final_decision(id, decision, payload.notes)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(InterviewResponse::with_interviewer(interview, None)),
    ))
}
