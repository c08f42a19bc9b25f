//! Error types for upstream-revision

use serde::Serialize;
use thiserror::Error;

use crate::model::JobId;

/// Errors raised by host collaborators.
///
/// These are never swallowed by the resolver: they propagate unmodified to
/// the caller.
#[derive(Error, Debug)]
pub enum HostError {
    /// A host query failed
    #[error("host query failed for {what}: {reason}")]
    Query { what: String, reason: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A source descriptor could not be resolved for a job.
///
/// Expected and frequent for jobs that are not part of a branch-organized
/// project; the resolver treats it as a soft stop.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResolutionError {
    /// Parent group of the job is not a branch-organized project
    #[error("inappropriate context: parent of {job} is not a multi-branch project")]
    InappropriateContext { job: JobId },

    /// No source with this identifier in the parent group
    #[error("{source_id} not found")]
    SourceNotFound { source_id: String },
}

/// Errors loading a host snapshot.
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Deserialization failed: {0}")]
    Deserialization(#[from] serde_json::Error),

    #[error("Unknown run: {0}")]
    UnknownRun(String),
}

/// Result type for host collaborator calls
pub type HostResult<T> = std::result::Result<T, HostError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_error_display() {
        let err = ResolutionError::InappropriateContext {
            job: JobId::new("standalone"),
        };
        assert!(err.to_string().contains("inappropriate context"));
        assert!(err.to_string().contains("standalone"));

        let err = ResolutionError::SourceNotFound {
            source_id: "github-1".to_string(),
        };
        assert_eq!(err.to_string(), "github-1 not found");
    }

    #[test]
    fn host_error_wraps_anyhow() {
        let err: HostError = anyhow::anyhow!("controller offline").into();
        assert_eq!(err.to_string(), "controller offline");
    }
}
