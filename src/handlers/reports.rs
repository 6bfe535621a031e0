use axum::{extract::State, response::Json};

use crate::{
    services::reports::{ReportService, SummaryReport},
    utils::errors::AppError,
    AppState,
};

pub async fn summary(State(state): State<AppState>) -> Result<Json<SummaryReport>, AppError> {
    let report = ReportService::new(state.store.clone()).summary().await?;
    Ok(Json(report))
}
