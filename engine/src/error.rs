use thiserror::Error;

/// The only error `Engine::submit` surfaces. Every other failure mode
/// (quota denial, security rejection, crash, timeout, unparsable output)
/// terminates as a populated [`crate::SubmissionOutcome`] instead, because
/// those are statements about the submission, not about the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No execution backend is reachable. Nothing submission-specific can
    /// be said, so the submission is not consumed and may be retried.
    #[error("execution infrastructure unavailable: {0}")]
    InfrastructureUnavailable(String),
}
