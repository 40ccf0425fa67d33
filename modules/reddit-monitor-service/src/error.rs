//! Pipeline error taxonomy.
//!
//! Each variant corresponds to one failure domain of a run. The orchestrator
//! decides per phase whether a failure is isolated (logged, phase output
//! empty) or fatal to the run (`Connection`).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("source fetch failed: {0}")]
    SourceFetch(String),

    #[error("persistence failed: {0}")]
    Persistence(#[from] rusqlite::Error),

    #[error("sentiment scoring failed: {0}")]
    Scoring(String),

    #[error("clustering failed: {0}")]
    Clustering(String),

    #[error("summarization failed: {0}")]
    Summarization(String),

    #[error("storage connection failed: {0}")]
    Connection(String),
}
