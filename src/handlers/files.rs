use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::{
    utils::{errors::AppError, extract::PathParam},
    AppState,
};

pub async fn download_resume(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<Response, AppError> {
    let (data, content_type, file_name) = state.candidates().resume(id).await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_LENGTH, data.len().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        Body::from(data),
    )
        .into_response())
}
