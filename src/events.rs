//! Change notifications pushed to connected clients instead of timed re-fetching.

use serde::Serialize;
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    Job,
    Candidate,
    Evaluator,
    Interview,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Created,
    Updated,
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeEvent {
    pub entity: Entity,
    pub action: Action,
    pub id: i32,
    /// Candidate the change belongs to, so boards can refresh a single row.
    pub candidate_id: Option<i32>,
}

impl ChangeEvent {
    pub fn new(entity: Entity, action: Action, id: i32) -> Self {
        Self {
            entity,
            action,
            id,
            candidate_id: None,
        }
    }

    pub fn for_candidate(mut self, candidate_id: i32) -> Self {
        self.candidate_id = Some(candidate_id);
        self
    }

    pub fn event_name(&self) -> &'static str {
        match self.entity {
            Entity::Job => "JobChanged",
            Entity::Candidate => "CandidateChanged",
            Entity::Evaluator => "EvaluatorChanged",
            Entity::Interview => "InterviewChanged",
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ChangeEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }

    /// Having no subscribers is normal and not an error.
    pub fn publish(&self, event: ChangeEvent) {
        let receivers = self.tx.send(event).unwrap_or(0);
        tracing::debug!("Change event delivered to {} subscriber(s)", receivers);
    }
}
