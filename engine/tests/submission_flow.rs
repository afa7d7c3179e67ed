//! Submission pipeline integration tests.
//!
//! The gate paths (quota, security) run fully offline. Cases that need a
//! real runtime are ignored by default, matching the sandbox tests.

use std::sync::Arc;
use std::time::Duration;

use engine::{Engine, EngineError, ProblemSpec, SubmissionRequest, SubmissionStatus};
use grader::{GradingPipeline, HeuristicAssessor, ScoreHistory};
use security::{AuditSink, ExecutionQuotaTracker, MemoryAuditSink};
use serde_json::json;
use util::execution_config::ExecutionConfig;
use util::languages::Language;

fn build_engine(quota_ceiling: usize, allow_local: bool) -> (Engine, Arc<MemoryAuditSink>) {
    let sink = Arc::new(MemoryAuditSink::new());
    let audit: Arc<dyn AuditSink> = sink.clone();

    let quota = ExecutionQuotaTracker::new(
        quota_ceiling,
        Duration::from_secs(60),
        Arc::clone(&audit),
    );
    let sandbox = code_runner::SandboxManager::new(ExecutionConfig::default_config(), allow_local);
    let pipeline = GradingPipeline::new(
        Arc::new(HeuristicAssessor),
        Arc::new(ScoreHistory::new()),
        Duration::from_millis(500),
    );

    let engine = Engine::new(quota, sandbox, pipeline, audit, Duration::from_secs(5));
    (engine, sink)
}

fn two_sum_problem() -> ProblemSpec {
    ProblemSpec {
        description: "Return indices of the two numbers adding to target.".to_string(),
        test_cases: vec![
            code_runner::TestCase {
                id: 1,
                function: "two_sum".to_string(),
                args: vec![json!([2, 7, 11, 15]), json!(9)],
                expected: json!([0, 1]),
            },
            code_runner::TestCase {
                id: 2,
                function: "two_sum".to_string(),
                args: vec![json!([3, 2, 4]), json!(6)],
                expected: json!([1, 2]),
            },
        ],
        reference_solution: None,
    }
}

#[tokio::test]
async fn test_quota_denial_yields_zero_score_outcome() {
    let (engine, sink) = build_engine(0, false);
    let request = SubmissionRequest::new(
        "player-1",
        "def two_sum(nums, target):\n    return [0, 1]\n",
        Language::Python,
        two_sum_problem(),
    );

    let outcome = engine.submit(request).await.expect("denial is not an error");
    assert_eq!(outcome.status, SubmissionStatus::Rejected);
    assert_eq!(outcome.grading.criteria.total, 0);
    assert_eq!(outcome.grading.overall_grade, "F");
    assert!(outcome.execution.is_none());
    assert!(outcome.grading.feedback[0].message.contains("quota"));

    let types = sink.event_types();
    assert!(types.contains(&"quota_denied".to_string()));
    assert!(types.contains(&"submission_rejected".to_string()));
    assert!(
        !types.contains(&"sandbox_created".to_string()),
        "denied submission must never reach a sandbox"
    );

    // Every event names the stage it was emitted at.
    let events = sink.events();
    let received = events
        .iter()
        .find(|e| e.event_type == "submission_received")
        .expect("received event");
    assert_eq!(received.detail["stage"], "received");
    let rejected = events
        .iter()
        .find(|e| e.event_type == "submission_rejected")
        .expect("rejected event");
    assert_eq!(rejected.detail["stage"], "rejected");
}

#[tokio::test]
async fn test_security_rejection_carries_findings() {
    let (engine, sink) = build_engine(10, false);
    let request = SubmissionRequest::new(
        "player-2",
        "import os\n\ndef two_sum(nums, target):\n    os.system('ls')\n",
        Language::Python,
        two_sum_problem(),
    );

    let outcome = engine.submit(request).await.expect("rejection is not an error");
    assert_eq!(outcome.status, SubmissionStatus::Rejected);
    assert!(!outcome.findings.is_empty());
    assert_eq!(outcome.grading.criteria.total, 0);
    assert!(outcome.execution.is_none());

    let types = sink.event_types();
    assert!(types.contains(&"quota_admitted".to_string()));
    assert!(types.contains(&"security_rejected".to_string()));
    assert!(!types.contains(&"sandbox_created".to_string()));
}

#[tokio::test]
async fn test_rejection_consumes_a_quota_slot() {
    // A rejected-by-security submission was still admitted by the quota
    // gate, so the slot is spent.
    let (engine, _) = build_engine(1, false);

    let bad = SubmissionRequest::new(
        "player-3",
        "import os\n",
        Language::Python,
        two_sum_problem(),
    );
    let outcome = engine.submit(bad).await.unwrap();
    assert_eq!(outcome.status, SubmissionStatus::Rejected);
    assert!(!outcome.findings.is_empty());

    let clean = SubmissionRequest::new(
        "player-3",
        "def two_sum(nums, target):\n    return [0, 1]\n",
        Language::Python,
        two_sum_problem(),
    );
    let outcome = engine.submit(clean).await.unwrap();
    assert_eq!(outcome.status, SubmissionStatus::Rejected);
    assert!(outcome.grading.feedback[0].message.contains("quota"));
}

#[tokio::test]
#[ignore] // requires an environment with no container runtime and fallback off
async fn test_no_backend_aborts_without_consuming_the_submission() {
    let (engine, _) = build_engine(10, false);
    let request = SubmissionRequest::new(
        "player-4",
        "def two_sum(nums, target):\n    return [0, 1]\n",
        Language::Python,
        two_sum_problem(),
    );

    let result = engine.submit(request).await;
    assert!(matches!(result, Err(EngineError::InfrastructureUnavailable(_))));
}

#[tokio::test]
#[ignore] // requires a local python3 runtime
async fn test_end_to_end_two_sum_completes_and_grades() {
    let (engine, sink) = build_engine(10, true);
    let code = "def two_sum(nums, target):\n    seen = {}\n    for i, n in enumerate(nums):\n        if target - n in seen:\n            return [seen[target - n], i]\n        seen[n] = i\n";
    let request = SubmissionRequest::new("player-5", code, Language::Python, two_sum_problem());

    let outcome = engine.submit(request).await.expect("pipeline should complete");
    assert_eq!(outcome.status, SubmissionStatus::Completed);

    let execution = outcome.execution.expect("completed run carries execution");
    assert_eq!(execution.passed, 2);
    assert!(execution.success);

    assert_eq!(outcome.grading.criteria.correctness, 40);
    assert_eq!(outcome.grading.feedback.len(), 5);
    assert!(!outcome.grading.overall_grade.is_empty());

    let types = sink.event_types();
    for expected in [
        "submission_received",
        "quota_admitted",
        "security_validated",
        "sandbox_created",
        "harness_executed",
        "sandbox_destroyed",
        "execution_completed",
        "grading_completed",
        "submission_completed",
    ] {
        assert!(
            types.contains(&expected.to_string()),
            "missing audit event {}, got {:?}",
            expected,
            types
        );
    }
}

#[tokio::test]
#[ignore] // requires a local python3 runtime
async fn test_abandoned_submission_still_cleans_up_sandbox() {
    let (engine, sink) = build_engine(10, true);
    let code = "import time\n\ndef two_sum(nums, target):\n    time.sleep(10)\n";
    let request = SubmissionRequest::new("player-7", code, Language::Python, two_sum_problem());

    // Caller walks away mid-run. Dropping the submit future must not skip
    // sandbox teardown; the detached worker finishes on its own.
    tokio::select! {
        _ = engine.submit(request) => panic!("the run should outlast the caller"),
        _ = tokio::time::sleep(Duration::from_millis(700)) => {}
    }
    assert!(
        !engine.live_sandboxes().is_empty(),
        "the run should still be in flight when the caller leaves"
    );

    // Worker deadline is the run limit plus supervisor grace; wait past it.
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(
        engine.live_sandboxes().is_empty(),
        "abandoned submission left a live sandbox; events: {:?}",
        sink.event_types()
    );
    assert!(sink
        .event_types()
        .contains(&"sandbox_destroyed".to_string()));
}

#[tokio::test]
#[ignore] // requires a local python3 runtime
async fn test_infinite_loop_times_out_to_failing_grade() {
    let (engine, _) = build_engine(10, true);
    // A sleep-based stall: plain `while True` would be caught by the
    // static gate, and the point here is the runtime ceiling.
    let code = "import time\n\ndef two_sum(nums, target):\n    time.sleep(60)\n";
    let request = SubmissionRequest::new("player-6", code, Language::Python, two_sum_problem());

    let outcome = engine.submit(request).await.expect("timeout is not an error");
    assert_eq!(outcome.status, SubmissionStatus::Completed);
    let execution = outcome.execution.expect("execution present");
    assert_eq!(execution.verdict, code_runner::ExecutionVerdict::TimedOut);
    assert_eq!(outcome.grading.criteria.total, 0);
    assert_eq!(outcome.grading.overall_grade, "F");
}
