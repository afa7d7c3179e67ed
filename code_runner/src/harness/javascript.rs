use super::{HarnessStrategy, cases_json, names_json, string_literal};
use crate::error::RunnerError;
use crate::types::TestCase;
use util::languages::Language;

/// JavaScript harness: user code runs in a `node:vm` context so declared
/// functions land on an isolated context object, from which the dispatch
/// map is built. The internal guard is a timer that exits with the 124
/// timeout sentinel; a busy-looping submission can starve the event loop,
/// which is why the sandbox-level timeout exists above this one.
pub struct JavaScriptStrategy;

const TEMPLATE: &str = r#""use strict";
const vm = require("node:vm");

const __source = __SOURCE__;
const __cases = JSON.parse(__CASES__);
const __names = JSON.parse(__NAMES__);

const __guard = setTimeout(() => {
  process.stderr.write("harness time limit reached\n");
  process.exit(124);
}, __ALARM_MS__);

function __deepEqual(a, b) {
  if (a === b) return true;
  if (Array.isArray(a) && Array.isArray(b)) {
    if (a.length !== b.length) return false;
    return a.every((v, i) => __deepEqual(v, b[i]));
  }
  if (a && b && typeof a === "object" && typeof b === "object") {
    const ka = Object.keys(a).sort();
    const kb = Object.keys(b).sort();
    if (!__deepEqual(ka, kb)) return false;
    return ka.every((k) => __deepEqual(a[k], b[k]));
  }
  return false;
}

const __results = [];
const __context = vm.createContext(Object.create(null));
let __loadError = null;
try {
  vm.runInContext(__source, __context, { filename: "submission.js" });
} catch (err) {
  __loadError = String(err);
}

if (__loadError !== null) {
  for (const c of __cases) {
    __results.push({
      test_id: c.id,
      passed: false,
      expected: c.expected,
      got: null,
      error: "submission failed to load: " + __loadError,
    });
  }
} else {
  const __dispatch = {};
  for (const name of __names) {
    __dispatch[name] = __context[name];
  }
  for (const c of __cases) {
    const record = {
      test_id: c.id,
      passed: false,
      expected: c.expected,
      got: null,
      error: null,
    };
    const target = __dispatch[c.function];
    if (typeof target !== "function") {
      record.error = "function '" + c.function + "' is not defined";
    } else {
      try {
        const raw = target(...c.args);
        const got = JSON.parse(JSON.stringify(raw) ?? "null");
        record.got = got;
        record.passed = __deepEqual(got, c.expected);
      } catch (err) {
        record.error = String(err);
      }
    }
    __results.push(record);
  }
}

clearTimeout(__guard);
// exit() discards unflushed pipe output, so large arrays would be cut off
// mid-stream; exiting from the write callback waits for the flush.
process.stdout.write(JSON.stringify(__results) + "\n", () => process.exit(0));
"#;

impl HarnessStrategy for JavaScriptStrategy {
    fn language(&self) -> Language {
        Language::JavaScript
    }

    fn generate(
        &self,
        user_code: &str,
        cases: &[TestCase],
        alarm_secs: u64,
    ) -> Result<String, RunnerError> {
        let cases_literal = string_literal(&cases_json(cases)?);
        let names_literal = string_literal(&names_json(cases)?);

        // Source is substituted last so placeholder-looking text inside the
        // submission can never be rewritten.
        Ok(TEMPLATE
            .replace("__ALARM_MS__", &(alarm_secs * 1000).to_string())
            .replace("__CASES__", &cases_literal)
            .replace("__NAMES__", &names_literal)
            .replace("__SOURCE__", &string_literal(user_code)))
    }
}
