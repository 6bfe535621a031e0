use serde::Serialize;
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;

use crate::models::candidate::{Candidate, CandidateFilter, CandidateResponse};
use crate::models::interview::{Interview, InterviewFilter};
use crate::services::interviews::CandidatePipeline;
use crate::services::pipeline::PipelineCategory;
use crate::store::{RecruitmentStore, StoreResult};
use crate::utils::logger::LOGGER;

#[derive(Debug, Serialize)]
pub struct BoardEntry {
    pub candidate: CandidateResponse,
    pub pipeline: CandidatePipeline,
}

/// Candidates grouped by pipeline category. Every category is present, even when empty.
#[derive(Debug, Serialize)]
pub struct PipelineBoard {
    pub job_id: i32,
    pub categories: BTreeMap<PipelineCategory, Vec<BoardEntry>>,
}

#[derive(Debug, Serialize)]
pub struct SummaryReport {
    pub total_jobs: usize,
    pub total_candidates: usize,
    pub total_interviews: usize,
    pub total_evaluators: usize,
    pub candidates_by_category: BTreeMap<PipelineCategory, usize>,
}

fn group_by_candidate(interviews: Vec<Interview>) -> HashMap<i32, Vec<Interview>> {
    let mut grouped: HashMap<i32, Vec<Interview>> = HashMap::new();
    for interview in interviews {
        grouped.entry(interview.candidate_id).or_default().push(interview);
    }
    grouped
}

fn empty_buckets<T>() -> BTreeMap<PipelineCategory, T>
where
    T: Default,
{
    PipelineCategory::ALL
        .into_iter()
        .map(|category| (category, T::default()))
        .collect()
}

fn pipelines(
    candidates: Vec<Candidate>,
    interviews: Vec<Interview>,
) -> impl Iterator<Item = (Candidate, CandidatePipeline)> {
    let grouped = group_by_candidate(interviews);
    candidates.into_iter().map(move |candidate| {
        let rows = grouped.get(&candidate.id).map(Vec::as_slice).unwrap_or(&[]);
        let pipeline = CandidatePipeline::from_rows(candidate.id, rows);
        (candidate, pipeline)
    })
}

pub struct ReportService {
    store: Arc<dyn RecruitmentStore>,
}

impl ReportService {
    pub fn new(store: Arc<dyn RecruitmentStore>) -> Self {
        Self { store }
    }

    pub async fn job_board(&self, job_id: i32) -> StoreResult<PipelineBoard> {
        self.store.get_job(job_id).await?;

        let candidate_filter = CandidateFilter { job_id: Some(job_id) };
        let interview_filter = InterviewFilter::default();
        let (candidates, interviews) = tokio::try_join!(
            self.store.list_candidates(&candidate_filter),
            self.store.list_interviews(&interview_filter),
        )?;

        let mut categories = empty_buckets::<Vec<BoardEntry>>();
        for (candidate, pipeline) in pipelines(candidates, interviews) {
            categories.entry(pipeline.category).or_default().push(BoardEntry {
                candidate: CandidateResponse::from(candidate),
                pipeline,
            });
        }

        Ok(PipelineBoard { job_id, categories })
    }

    pub async fn summary(&self) -> StoreResult<SummaryReport> {
        let started = Instant::now();

        let candidate_filter = CandidateFilter::default();
        let interview_filter = InterviewFilter::default();
        let (jobs, candidates, interviews, evaluators) = tokio::try_join!(
            self.store.list_jobs(),
            self.store.list_candidates(&candidate_filter),
            self.store.list_interviews(&interview_filter),
            self.store.list_evaluators(),
        )?;

        let total_candidates = candidates.len();
        let total_interviews = interviews.len();
        let mut candidates_by_category = empty_buckets::<usize>();
        for (_, pipeline) in pipelines(candidates, interviews) {
            *candidates_by_category.entry(pipeline.category).or_default() += 1;
        }

        let metadata = [("duration_ms".to_string(), json!(started.elapsed().as_millis() as u64))]
            .into_iter()
            .collect();
        LOGGER.log_business_event("summary_report_generated", None, metadata);

        Ok(SummaryReport {
            total_jobs: jobs.len(),
            total_candidates,
            total_interviews,
            total_evaluators: evaluators.len(),
            candidates_by_category,
        })
    }
}
