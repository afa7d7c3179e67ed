//! Submission request/outcome types and the stage state machine.

use chrono::{DateTime, Utc};
use code_runner::{ExecutionResult, TestCase};
use grader::GradingResult;
use security::SecurityFinding;
use serde::{Deserialize, Serialize};
use util::languages::Language;

/// The problem a submission is answering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemSpec {
    /// Natural-language problem statement, also shown to the AI assessor.
    pub description: String,
    pub test_cases: Vec<TestCase>,
    /// Instructor solution used for comparative efficiency judging.
    #[serde(default)]
    pub reference_solution: Option<String>,
}

/// One player submission, as received.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionRequest {
    /// Submitter identity, the quota and audit key.
    pub identity: String,
    pub source_code: String,
    pub language: Language,
    pub problem: ProblemSpec,
    pub submitted_at: DateTime<Utc>,
}

impl SubmissionRequest {
    pub fn new(
        identity: impl Into<String>,
        source_code: impl Into<String>,
        language: Language,
        problem: ProblemSpec,
    ) -> Self {
        Self {
            identity: identity.into(),
            source_code: source_code.into(),
            language,
            problem,
            submitted_at: Utc::now(),
        }
    }
}

/// Stages a submission moves through. Strictly forward; `Rejected` is
/// reachable only from the two gate stages, `Failed` from any stage where
/// infrastructure misbehaves after the gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Received,
    QuotaChecked,
    SecurityValidated,
    Sandboxed,
    HarnessExecuted,
    ResultParsed,
    Graded,
    Completed,
    Rejected,
    Failed,
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SubmissionStatus::Received => "received",
            SubmissionStatus::QuotaChecked => "quota_checked",
            SubmissionStatus::SecurityValidated => "security_validated",
            SubmissionStatus::Sandboxed => "sandboxed",
            SubmissionStatus::HarnessExecuted => "harness_executed",
            SubmissionStatus::ResultParsed => "result_parsed",
            SubmissionStatus::Graded => "graded",
            SubmissionStatus::Completed => "completed",
            SubmissionStatus::Rejected => "rejected",
            SubmissionStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

impl SubmissionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SubmissionStatus::Completed | SubmissionStatus::Rejected | SubmissionStatus::Failed
        )
    }
}

/// Terminal record for one submission. Immutable once returned; every
/// outcome carries a populated [`GradingResult`], zero-scored for
/// rejections and failures.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionOutcome {
    pub identity: String,
    pub status: SubmissionStatus,
    /// Gate findings; empty unless the security gate rejected.
    pub findings: Vec<SecurityFinding>,
    /// Present whenever the code actually ran.
    pub execution: Option<ExecutionResult>,
    pub grading: GradingResult,
    pub submitted_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(SubmissionStatus::Completed.is_terminal());
        assert!(SubmissionStatus::Rejected.is_terminal());
        assert!(SubmissionStatus::Failed.is_terminal());
        assert!(!SubmissionStatus::Sandboxed.is_terminal());
    }

    #[test]
    fn test_problem_spec_reference_solution_defaults_off() {
        let spec: ProblemSpec = serde_json::from_str(
            r#"{ "description": "add", "test_cases": [] }"#,
        )
        .unwrap();
        assert!(spec.reference_solution.is_none());
    }
}
