//! Texo Core - Story job data model and the pure pieces of slideshow playback

pub mod job;
pub mod timing;
pub mod transition;
pub mod activity_log;

pub use job::{
    CreationMetadata, InputMode, Job, JobId, JobStatus, JobSummary, MaturityLevel, Page, StatusLog,
};
pub use timing::{estimate_duration, DurationEstimator, MIN_PAGE_DURATION_MS, MS_PER_WORD};
pub use transition::{AnimationSelector, TransitionStyle};
pub use activity_log::{present_log, LogEntryView, LogMarker};

/// Result type for Texo Core operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// Error types for Texo Core operations
#[derive(thiserror::Error, Debug)]
pub enum CoreError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown maturity level: {0}")]
    UnknownMaturity(String),

    #[error("Unknown transition style: {0}")]
    UnknownTransition(String),
}
