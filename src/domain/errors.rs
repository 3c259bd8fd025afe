use thiserror::Error;

/// Errors surfaced by the LLM governor's endpoint management.
#[derive(Debug, Error)]
pub enum GovernorError {
    #[error("Rate limited by upstream after {attempts} attempts")]
    RateLimited { attempts: u32 },

    #[error("Endpoint {model} returned status {status}")]
    Endpoint { model: String, status: u16 },

    #[error("Network error: {reason}")]
    Network { reason: String },

    #[error("All endpoints exhausted: {reason}")]
    Exhausted { reason: String },
}

/// Errors related to news ingestion.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Malformed article from {source_name}: {reason}")]
    Malformed { source_name: String, reason: String },

    #[error("Feed fetch failed for {source_name}: {reason}")]
    Fetch { source_name: String, reason: String },
}

/// Errors that fail a workflow run.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Persistence failure in node '{node}': {reason}")]
    Persistence { node: String, reason: String },

    #[error("Node '{node}' precondition unmet: {reason}")]
    Precondition { node: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_governor_error_formatting() {
        let err = GovernorError::Endpoint {
            model: "gemini-flash".to_string(),
            status: 503,
        };
        let msg = err.to_string();
        assert!(msg.contains("gemini-flash"));
        assert!(msg.contains("503"));
    }

    #[test]
    fn test_workflow_error_formatting() {
        let err = WorkflowError::Precondition {
            node: "alert".to_string(),
            reason: "empty reasoning trail".to_string(),
        };
        assert!(err.to_string().contains("alert"));
    }
}
