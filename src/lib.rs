pub mod config;
pub mod events;
pub mod handlers;
pub mod models;
pub mod services;
pub mod store;
pub mod utils;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, patch, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    config::Config,
    events::EventBus,
    handlers::{auth, candidates, evaluators, files, interviews, jobs, reports},
    services::{candidates::CandidateService, interviews::InterviewService, resumes::ResumeStorage},
    store::RecruitmentStore,
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecruitmentStore>,
    pub events: EventBus,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn RecruitmentStore>, config: Config) -> Self {
        Self {
            store,
            events: EventBus::new(),
            config: Arc::new(config),
        }
    }

    pub fn interviews(&self) -> InterviewService {
        InterviewService::new(self.store.clone(), self.events.clone())
    }

    pub fn candidates(&self) -> CandidateService {
        CandidateService::new(
            self.store.clone(),
            self.events.clone(),
            ResumeStorage::new(self.config.upload_dir.clone(), self.config.max_resume_bytes),
        )
    }
}

fn cors_layer(origin: &str) -> anyhow::Result<CorsLayer> {
    let allow_origin = if origin == "*" {
        AllowOrigin::any()
    } else {
        AllowOrigin::exact(origin.parse::<HeaderValue>()?)
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE]))
}

pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let api = Router::new()
        .route("/auth/login", post(auth::login))
        .route("/jobs", get(jobs::list_jobs).post(jobs::create_job))
        .route(
            "/jobs/:id",
            get(jobs::get_job).put(jobs::update_job).delete(jobs::delete_job),
        )
        .route("/jobs/:id/pipeline", get(jobs::job_pipeline))
        .route(
            "/candidates",
            get(candidates::list_candidates).post(candidates::create_candidate),
        )
        .route(
            "/candidates/:id",
            get(candidates::get_candidate).delete(candidates::delete_candidate),
        )
        .route("/candidates/:id/resume", get(files::download_resume))
        .route("/candidates/:id/pipeline", get(candidates::candidate_pipeline))
        .route(
            "/candidates/:id/final-decision",
            post(candidates::record_final_decision),
        )
        .route(
            "/evaluators",
            get(evaluators::list_evaluators).post(evaluators::create_evaluator),
        )
        .route(
            "/evaluators/:id",
            put(evaluators::update_evaluator).delete(evaluators::delete_evaluator),
        )
        .route(
            "/interviews",
            get(interviews::list_interviews).post(interviews::schedule_interview),
        )
        .route(
            "/interviews/:id",
            get(interviews::get_interview).put(interviews::replace_interview),
        )
        .route("/interviews/:id/stage", patch(interviews::revise_stage))
        .route("/interviews/:id/decision", post(interviews::record_decision))
        .route("/reports/summary", get(reports::summary))
        .route("/events", get(handlers::events::event_stream));

    let app = Router::new()
        .route("/health", get(|| async { "OK" }))
        .nest("/api", api)
        .layer(cors_layer(&state.config.cors_origin)?)
        .layer(DefaultBodyLimit::max(state.config.max_request_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}
