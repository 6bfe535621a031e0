use chrono::Utc;
use serde_json::json;
use std::collections::HashMap;
use tracing::{error, info, warn};

const SERVICE_NAME: &str = "recruitment-backend";
const SLOW_QUERY_MS: u128 = 1000;

#[derive(Debug)]
pub struct StructuredLogger;

impl StructuredLogger {
    pub fn log_database_query(&self, query: &str, duration_ms: u128, result_count: Option<usize>) {
        let log_entry = json!({
            "timestamp": Utc::now().to_rfc3339(),
            "event_type": "database_query",
            "query_hash": format!("{:x}", md5::compute(query)),
            "query_preview": query_preview(query),
            "duration_ms": duration_ms,
            "result_count": result_count,
            "service": SERVICE_NAME
        });

        if duration_ms > SLOW_QUERY_MS {
            warn!("Slow query detected: {}", log_entry);
        } else {
            info!("{}", log_entry);
        }
    }

    pub fn log_error(&self, error: &str, context: HashMap<String, serde_json::Value>) {
        let mut log_entry = json!({
            "timestamp": Utc::now().to_rfc3339(),
            "event_type": "error",
            "error_message": error,
            "service": SERVICE_NAME
        });

        for (key, value) in context {
            log_entry[key] = value;
        }

        error!("{}", log_entry);
    }

    /// Pipeline and CRUD events, keyed by the candidate they concern when there is one.
    pub fn log_business_event(
        &self,
        event_name: &str,
        candidate_id: Option<i32>,
        metadata: HashMap<String, serde_json::Value>,
    ) {
        let mut log_entry = json!({
            "timestamp": Utc::now().to_rfc3339(),
            "event_type": "business_event",
            "event_name": event_name,
            "candidate_id": candidate_id,
            "service": SERVICE_NAME
        });

        for (key, value) in metadata {
            log_entry[key] = value;
        }

        info!("{}", log_entry);
    }
}

fn query_preview(query: &str) -> String {
    let compact: String = query.split_whitespace().collect::<Vec<_>>().join(" ");
    if compact.chars().count() > 100 {
        format!("{}...", compact.chars().take(100).collect::<String>())
    } else {
        compact
    }
}

pub static LOGGER: StructuredLogger = StructuredLogger;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_collapses_whitespace_and_truncates() {
        assert_eq!(query_preview("SELECT *\n   FROM jobs"), "SELECT * FROM jobs");

        let long = format!("SELECT {} FROM interviews", "x, ".repeat(60));
        let preview = query_preview(&long);
        assert!(preview.ends_with("..."));
        assert_eq!(preview.chars().count(), 103);
    }
}
