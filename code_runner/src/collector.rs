//! # Result Collector
//!
//! Turns one raw sandbox observation into a canonical [`ExecutionResult`].
//! Three failure shapes are kept distinct on purpose: a timeout, a crash
//! (code ran and died), and a contract violation (code exited cleanly but
//! stdout held no harness array). Graders and callers treat them all as
//! zero credit but report them differently.

use crate::types::{ExecutionResult, ExecutionVerdict, RawExecution, TestCase, TestOutcome};
use serde::Deserialize;
use uuid::Uuid;

/// Exit status the `timeout` prefix reports when it kills the runtime.
const TIMEOUT_SENTINEL: i32 = 124;

/// Maximum stderr carried into the diagnostic message.
const STDERR_SNIPPET_LEN: usize = 500;

/// One record of the harness stdout contract.
#[derive(Debug, Deserialize)]
struct HarnessRecord {
    test_id: i64,
    passed: bool,
    expected: serde_json::Value,
    #[serde(default)]
    got: serde_json::Value,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Default)]
pub struct ResultCollector;

impl ResultCollector {
    pub fn new() -> Self {
        Self
    }

    /// Parses a raw execution against the cases it was supposed to cover.
    pub fn parse(
        &self,
        raw: &RawExecution,
        cases: &[TestCase],
        execution_id: Uuid,
    ) -> ExecutionResult {
        if raw.timed_out || raw.exit_code == Some(TIMEOUT_SENTINEL) {
            return ExecutionResult::all_failed(
                ExecutionVerdict::TimedOut,
                cases,
                execution_id,
                raw.elapsed,
                "execution exceeded the time limit".to_string(),
                "timed out before a result was produced",
            );
        }

        if raw.exit_code != Some(0) {
            let code = raw
                .exit_code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "killed".to_string());
            return ExecutionResult::all_failed(
                ExecutionVerdict::Crashed,
                cases,
                execution_id,
                raw.elapsed,
                format!(
                    "execution failed (exit {}): {}",
                    code,
                    snippet(&raw.stderr)
                ),
                "execution crashed before a result was produced",
            );
        }

        let records = match parse_harness_stdout(&raw.stdout) {
            Some(records) => records,
            None => {
                // Code ran to completion but broke the harness contract;
                // distinct from a crash so operators can tell them apart.
                return ExecutionResult::all_failed(
                    ExecutionVerdict::ContractViolation,
                    cases,
                    execution_id,
                    raw.elapsed,
                    "harness output did not contain a valid result array".to_string(),
                    "no parsable result reported",
                );
            }
        };

        let outcomes: Vec<TestOutcome> = cases
            .iter()
            .map(|case| match records.iter().find(|r| r.test_id == case.id) {
                Some(record) => TestOutcome {
                    test_id: record.test_id,
                    passed: record.passed,
                    expected: record.expected.clone(),
                    got: record.got.clone(),
                    error: record.error.clone(),
                },
                None => TestOutcome {
                    test_id: case.id,
                    passed: false,
                    expected: case.expected.clone(),
                    got: serde_json::Value::Null,
                    error: Some("no result reported for this test".to_string()),
                },
            })
            .collect();

        let passed = outcomes.iter().filter(|o| o.passed).count();
        let total = cases.len();
        let success = total > 0 && passed == total;

        ExecutionResult {
            outcomes,
            passed,
            total,
            success,
            verdict: ExecutionVerdict::Completed,
            execution_id,
            elapsed_ms: raw.elapsed.as_millis() as u64,
            message: format!("{}/{} tests passed", passed, total),
        }
    }
}

/// Accepts the whole stdout as the array, or the last non-empty line when
/// the submission printed noise above the harness flush.
fn parse_harness_stdout(stdout: &str) -> Option<Vec<HarnessRecord>> {
    let trimmed = stdout.trim();
    if let Ok(records) = serde_json::from_str::<Vec<HarnessRecord>>(trimmed) {
        return Some(records);
    }
    let last_line = trimmed.lines().rev().find(|l| !l.trim().is_empty())?;
    serde_json::from_str::<Vec<HarnessRecord>>(last_line.trim()).ok()
}

fn snippet(stderr: &str) -> String {
    stderr.trim().chars().take(STDERR_SNIPPET_LEN).collect()
}
