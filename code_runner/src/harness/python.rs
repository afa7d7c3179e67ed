use super::{HarnessStrategy, cases_json, names_json, string_literal};
use crate::error::RunnerError;
use crate::types::TestCase;
use util::languages::Language;

/// Python harness: user code is `exec`d into a private namespace, the
/// dispatch map is built by looking up each declared function name in that
/// namespace, and results are normalized through a JSON round trip so
/// tuples compare equal to the JSON arrays in `expected`.
pub struct PythonStrategy;

const TEMPLATE: &str = r#"import json
import signal


def _on_alarm(signum, frame):
    raise TimeoutError("harness time limit reached")


signal.signal(signal.SIGALRM, _on_alarm)
signal.alarm(__ALARM__)

_SOURCE = __SOURCE__
_CASES = json.loads(__CASES__)
_NAMES = json.loads(__NAMES__)


def _normalize(value):
    return json.loads(json.dumps(value, default=repr))


_namespace = {}
_results = []
try:
    exec(compile(_SOURCE, "<submission>", "exec"), _namespace)
except BaseException as exc:
    for _case in _CASES:
        _results.append({
            "test_id": _case["id"],
            "passed": False,
            "expected": _case["expected"],
            "got": None,
            "error": "submission failed to load: %s: %s" % (type(exc).__name__, exc),
        })
else:
    _dispatch = {_name: _namespace.get(_name) for _name in _NAMES}
    for _case in _CASES:
        signal.alarm(__ALARM__)
        _record = {
            "test_id": _case["id"],
            "passed": False,
            "expected": _case["expected"],
            "got": None,
            "error": None,
        }
        _target = _dispatch.get(_case["function"])
        if not callable(_target):
            _record["error"] = "function %r is not defined" % (_case["function"],)
        else:
            try:
                _got = _normalize(_target(*_case["args"]))
                _record["got"] = _got
                _record["passed"] = _got == _case["expected"]
            except BaseException as exc:
                _record["error"] = "%s: %s" % (type(exc).__name__, exc)
        _results.append(_record)
    signal.alarm(0)

print(json.dumps(_results), flush=True)
"#;

impl HarnessStrategy for PythonStrategy {
    fn language(&self) -> Language {
        Language::Python
    }

    fn generate(
        &self,
        user_code: &str,
        cases: &[TestCase],
        alarm_secs: u64,
    ) -> Result<String, RunnerError> {
        // Double-encoded: the JSON text is itself embedded as a string
        // literal and re-parsed inside the harness.
        let cases_literal = string_literal(&cases_json(cases)?);
        let names_literal = string_literal(&names_json(cases)?);

        // Source is substituted last so placeholder-looking text inside the
        // submission can never be rewritten.
        Ok(TEMPLATE
            .replace("__ALARM__", &alarm_secs.to_string())
            .replace("__CASES__", &cases_literal)
            .replace("__NAMES__", &names_literal)
            .replace("__SOURCE__", &string_literal(user_code)))
    }
}
