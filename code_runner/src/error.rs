use thiserror::Error;

/// Errors surfaced by the sandbox/harness layer.
///
/// Execution timeouts and crashes are *not* errors here; they become
/// failing [`crate::ExecutionResult`]s. Only infrastructure-level problems
/// (no isolation backend, I/O on the scratch dir, bad language tag) reach
/// this enum.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The submission named a language the runtime does not support.
    /// There is deliberately no silent fallback.
    #[error("unsupported language `{0}`")]
    UnsupportedLanguage(String),

    /// The isolation backend is down and no operator-approved fallback is
    /// enabled. The manager fails closed.
    #[error("isolation backend unavailable: {0}")]
    InfrastructureUnavailable(String),

    /// Harness program could not be generated for this submission.
    #[error("failed to generate test harness: {0}")]
    HarnessGeneration(String),

    #[error("sandbox I/O error: {0}")]
    Io(#[from] std::io::Error),
}
