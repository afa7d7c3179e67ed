use thiserror::Error;

/// Internal grading errors. These never escape the pipeline: any backend
/// failure degrades to the deterministic heuristic path, so callers always
/// receive a populated [`crate::GradingResult`].
#[derive(Debug, Error)]
pub enum GraderError {
    /// The AI backend is unconfigured, unreachable, or timed out.
    #[error("quality-assessment backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The backend answered, but not with the structured shape we need.
    #[error("quality-assessment response unusable: {0}")]
    InvalidResponse(String),
}
