//! End-to-end harness runs through the local fallback backend.
//!
//! These need a host `python3`/`node` runtime, so they are ignored by
//! default, same as the container-dependent tests elsewhere.

use code_runner::harness;
use code_runner::{ResultCollector, SandboxManager};
use serde_json::json;
use std::time::Duration;
use util::execution_config::ExecutionConfig;
use util::languages::Language;
use uuid::Uuid;

fn manager() -> SandboxManager {
    SandboxManager::new(ExecutionConfig::default_config(), true)
}

async fn run_python(user_code: &str, cases: &[code_runner::TestCase]) -> code_runner::ExecutionResult {
    let manager = manager();
    let handle = manager.create("python").expect("create sandbox");
    let program = harness::generate(Language::Python, user_code, cases, 5).expect("generate");
    let raw = manager
        .run(&handle, &program, Duration::from_secs(8))
        .await
        .expect("run");
    let id = handle.id();
    manager.destroy(handle);
    assert!(manager.live_sandboxes().is_empty(), "no sandbox may leak");
    ResultCollector::new().parse(&raw, cases, id)
}

#[tokio::test]
#[ignore]
async fn test_correct_add_passes_single_case() {
    let cases = vec![code_runner::TestCase {
        id: 1,
        function: "add".to_string(),
        args: vec![json!(2), json!(3)],
        expected: json!(5),
    }];

    let result = run_python("def add(a, b):\n    return a + b\n", &cases).await;
    assert_eq!(result.passed, 1);
    assert_eq!(result.total, 1);
    assert!(result.success);
}

#[tokio::test]
#[ignore]
async fn test_exception_recorded_and_neighbor_still_runs() {
    let cases = vec![
        code_runner::TestCase {
            id: 1,
            function: "boom".to_string(),
            args: vec![],
            expected: json!(1),
        },
        code_runner::TestCase {
            id: 2,
            function: "fine".to_string(),
            args: vec![],
            expected: json!(7),
        },
    ];

    let code = "def boom():\n    raise ValueError('bad')\n\ndef fine():\n    return 7\n";
    let result = run_python(code, &cases).await;

    assert_eq!(result.passed, 1);
    assert!(!result.outcomes[0].passed);
    assert!(result.outcomes[0].error.as_deref().unwrap().contains("ValueError"));
    assert!(result.outcomes[1].passed, "independent test must still run");
}

#[tokio::test]
#[ignore]
async fn test_two_sum_end_to_end() {
    let cases = vec![code_runner::TestCase {
        id: 1,
        function: "two_sum".to_string(),
        args: vec![json!([2, 7, 11, 15]), json!(9)],
        expected: json!([0, 1]),
    }];

    let code = "def two_sum(nums, target):\n    seen = {}\n    for i, n in enumerate(nums):\n        if target - n in seen:\n            return [seen[target - n], i]\n        seen[n] = i\n";
    let result = run_python(code, &cases).await;
    assert_eq!(result.passed, 1);
    assert!(result.success);
}

#[tokio::test]
#[ignore]
async fn test_sleeping_program_times_out_and_no_sandbox_survives() {
    let manager = manager();
    let cases = vec![code_runner::TestCase {
        id: 1,
        function: "slow".to_string(),
        args: vec![],
        expected: json!(1),
    }];

    let handle = manager.create("python").expect("create sandbox");
    // Alarm set above the supervisor limit so the supervisor is the layer
    // that has to fire here.
    let program = harness::generate(
        Language::Python,
        "import time\n\ndef slow():\n    time.sleep(60)\n    return 1\n",
        &cases,
        30,
    )
    .expect("generate");

    let raw = manager
        .run(&handle, &program, Duration::from_secs(1))
        .await
        .expect("run");
    let id = handle.id();
    manager.destroy(handle);

    let result = ResultCollector::new().parse(&raw, &cases, id);
    assert_eq!(result.verdict, code_runner::ExecutionVerdict::TimedOut);
    assert!(manager.live_sandboxes().is_empty());
}

#[tokio::test]
#[ignore]
async fn test_alarm_guards_each_test_independently() {
    // Two stalls in a row: each test gets its own in-harness alarm, so the
    // run completes with per-test errors instead of hitting the wall clock.
    let manager = manager();
    let cases = vec![
        code_runner::TestCase {
            id: 1,
            function: "slow".to_string(),
            args: vec![],
            expected: json!(1),
        },
        code_runner::TestCase {
            id: 2,
            function: "slow".to_string(),
            args: vec![],
            expected: json!(1),
        },
    ];

    let handle = manager.create("python").expect("create sandbox");
    let program = harness::generate(
        Language::Python,
        "import time\n\ndef slow():\n    time.sleep(30)\n    return 1\n",
        &cases,
        1,
    )
    .expect("generate");

    let raw = manager
        .run(&handle, &program, Duration::from_secs(8))
        .await
        .expect("run");
    let id = handle.id();
    manager.destroy(handle);

    let result = ResultCollector::new().parse(&raw, &cases, id);
    assert_eq!(result.verdict, code_runner::ExecutionVerdict::Completed);
    assert!(result.outcomes.iter().all(|o| {
        o.error.as_deref().unwrap_or_default().contains("TimeoutError")
    }));
}

#[tokio::test]
#[ignore]
async fn test_javascript_large_result_not_truncated() {
    let manager = manager();
    let expected: Vec<i64> = (0..60_000).collect();
    let cases = vec![code_runner::TestCase {
        id: 1,
        function: "big".to_string(),
        args: vec![],
        expected: json!(expected),
    }];

    let handle = manager.create("javascript").expect("create sandbox");
    let program = harness::generate(
        Language::JavaScript,
        "function big() { const out = []; for (let i = 0; i < 60000; i++) out.push(i); return out; }",
        &cases,
        5,
    )
    .expect("generate");

    let raw = manager
        .run(&handle, &program, Duration::from_secs(8))
        .await
        .expect("run");
    let id = handle.id();
    manager.destroy(handle);

    let result = ResultCollector::new().parse(&raw, &cases, id);
    assert_eq!(
        result.verdict,
        code_runner::ExecutionVerdict::Completed,
        "result array past the pipe buffer size must arrive whole; stdout len was {}",
        raw.stdout.len()
    );
    assert!(result.success);
}

#[tokio::test]
#[ignore]
async fn test_javascript_harness_runs() {
    let manager = manager();
    let cases = vec![code_runner::TestCase {
        id: 1,
        function: "add".to_string(),
        args: vec![json!(2), json!(3)],
        expected: json!(5),
    }];

    let handle = manager.create("javascript").expect("create sandbox");
    let program = harness::generate(
        Language::JavaScript,
        "function add(a, b) { return a + b; }",
        &cases,
        5,
    )
    .expect("generate");

    let raw = manager
        .run(&handle, &program, Duration::from_secs(8))
        .await
        .expect("run");
    let id = handle.id();
    manager.destroy(handle);

    let result = ResultCollector::new().parse(&raw, &cases, id);
    assert!(result.success, "stdout was: {}", raw.stdout);
}
