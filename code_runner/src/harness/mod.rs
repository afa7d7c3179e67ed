//! # Test Harness Generator
//!
//! Produces the self-contained program a sandbox actually runs: user code
//! loaded into an isolated namespace, an explicit name→callable dispatch
//! map built by the harness (never ambient reflection), one try/catch per
//! test case, deep structural comparison against expected values, and a
//! single JSON array flushed to stdout.
//!
//! One strategy object per language; `strategy_for` is the only place a
//! new language is wired in. The emitted record shape
//! `{test_id, passed, expected, got, error}` is identical across
//! languages, so the collector stays language-agnostic.

use crate::error::RunnerError;
use crate::types::TestCase;
use std::collections::BTreeSet;
use util::languages::Language;

mod javascript;
mod python;

pub use javascript::JavaScriptStrategy;
pub use python::PythonStrategy;

/// Per-language harness emitter.
pub trait HarnessStrategy: Send + Sync {
    fn language(&self) -> Language;

    /// Renders the harness program text. `alarm_secs` is the internal
    /// guard, set beneath the sandbox-level wall clock as a second layer.
    fn generate(
        &self,
        user_code: &str,
        cases: &[TestCase],
        alarm_secs: u64,
    ) -> Result<String, RunnerError>;
}

static PYTHON: PythonStrategy = PythonStrategy;
static JAVASCRIPT: JavaScriptStrategy = JavaScriptStrategy;

pub fn strategy_for(language: Language) -> &'static dyn HarnessStrategy {
    match language {
        Language::Python => &PYTHON,
        Language::JavaScript => &JAVASCRIPT,
    }
}

/// Convenience entry point: renders the harness for `language`.
pub fn generate(
    language: Language,
    user_code: &str,
    cases: &[TestCase],
    alarm_secs: u64,
) -> Result<String, RunnerError> {
    strategy_for(language).generate(user_code, cases, alarm_secs)
}

/// JSON text of the test case array, for embedding inside a host-language
/// string literal.
fn cases_json(cases: &[TestCase]) -> Result<String, RunnerError> {
    serde_json::to_string(cases).map_err(|e| RunnerError::HarnessGeneration(e.to_string()))
}

/// JSON array of the distinct function names the cases reference, in
/// sorted order. This is what the dispatch map is built from.
fn names_json(cases: &[TestCase]) -> Result<String, RunnerError> {
    let names: BTreeSet<&str> = cases.iter().map(|c| c.function.as_str()).collect();
    serde_json::to_string(&names).map_err(|e| RunnerError::HarnessGeneration(e.to_string()))
}

/// Renders `text` as a JSON string literal. JSON string syntax is a subset
/// of both Python and JavaScript string syntax, so the result can be
/// embedded verbatim in either harness.
fn string_literal(text: &str) -> String {
    serde_json::Value::String(text.to_string()).to_string()
}
