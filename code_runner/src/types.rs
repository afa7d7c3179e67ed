//! Core data types for the execution layer.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// One test case from a problem definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    pub id: i64,
    /// Name of the function the harness resolves and calls.
    pub function: String,
    /// Ordered argument values, passed positionally.
    pub args: Vec<serde_json::Value>,
    pub expected: serde_json::Value,
}

/// Outcome of one test case, as reported by the harness (or synthesized by
/// the collector when the harness never ran).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestOutcome {
    pub test_id: i64,
    pub passed: bool,
    pub expected: serde_json::Value,
    pub got: serde_json::Value,
    pub error: Option<String>,
}

/// How an execution terminated. Anything other than `Completed` means the
/// submission never produced a usable result array and earns zero credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionVerdict {
    /// The harness ran and honored the stdout contract.
    Completed,
    /// Wall-clock ceiling was hit (supervisor kill or `timeout` sentinel).
    TimedOut,
    /// Non-zero, non-timeout exit.
    Crashed,
    /// Zero exit but stdout did not contain the contracted JSON array.
    ContractViolation,
}

/// Canonical result of executing one submission against its test cases.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
    pub outcomes: Vec<TestOutcome>,
    pub passed: usize,
    pub total: usize,
    pub success: bool,
    pub verdict: ExecutionVerdict,
    pub execution_id: Uuid,
    pub elapsed_ms: u64,
    /// Human-readable diagnostic (timeout notice, crash stderr, ...).
    pub message: String,
}

impl ExecutionResult {
    /// Builds an all-failed result for runs that never produced outcomes
    /// (timeouts, crashes, contract violations). Expected values are carried
    /// over from the test cases so callers can still render them.
    pub fn all_failed(
        verdict: ExecutionVerdict,
        cases: &[TestCase],
        execution_id: Uuid,
        elapsed: Duration,
        message: String,
        error: &str,
    ) -> Self {
        let outcomes = cases
            .iter()
            .map(|case| TestOutcome {
                test_id: case.id,
                passed: false,
                expected: case.expected.clone(),
                got: serde_json::Value::Null,
                error: Some(error.to_string()),
            })
            .collect();

        Self {
            outcomes,
            passed: 0,
            total: cases.len(),
            success: false,
            verdict,
            execution_id,
            elapsed_ms: elapsed.as_millis() as u64,
            message,
        }
    }
}

/// Raw observation of one sandboxed process: what the supervisor saw.
#[derive(Debug, Clone)]
pub struct RawExecution {
    /// Process exit code; `None` when the supervisor had to kill it.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
    /// Set when the supervisor-side timeout fired.
    pub timed_out: bool,
}
