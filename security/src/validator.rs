//! # Security Validator
//!
//! Static pre-flight gate over untrusted submission source. Purely
//! syntactic: denylists plus regex heuristics, applied to raw text so the
//! gate works even on code that would not parse. Every finding is collected
//! (no short-circuit) so the caller can report all issues at once; any
//! finding rejects the submission.
//!
//! Incomplete by design. This is a cheap first filter, not a sound
//! analyzer; the sandbox is the actual safety boundary.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use util::languages::Language;

/// Category of one static security concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingCategory {
    DangerousImport,
    DangerousBuiltin,
    InfiniteLoopPattern,
    MemoryBombPattern,
    NetworkPattern,
}

impl std::fmt::Display for FindingCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FindingCategory::DangerousImport => "dangerous-import",
            FindingCategory::DangerousBuiltin => "dangerous-builtin",
            FindingCategory::InfiniteLoopPattern => "infinite-loop-pattern",
            FindingCategory::MemoryBombPattern => "memory-bomb-pattern",
            FindingCategory::NetworkPattern => "network-pattern",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
}

/// One static security concern detected before execution.
#[derive(Debug, Clone, Serialize)]
pub struct SecurityFinding {
    pub category: FindingCategory,
    pub detail: String,
    pub severity: Severity,
}

struct Ruleset {
    /// Module names whose import is forbidden.
    imports: &'static [&'static str],
    /// Builtin/reflection/global-state calls that are forbidden.
    builtins: &'static [&'static str],
}

static PYTHON_RULES: Ruleset = Ruleset {
    imports: &[
        "os",
        "sys",
        "subprocess",
        "socket",
        "shutil",
        "ctypes",
        "importlib",
        "multiprocessing",
        "threading",
        "urllib",
        "http",
        "requests",
        "pickle",
    ],
    builtins: &[
        "eval(",
        "exec(",
        "open(",
        "__import__",
        "compile(",
        "globals(",
        "locals(",
        "vars(",
        "setattr(",
        "delattr(",
        "breakpoint(",
    ],
};

static JAVASCRIPT_RULES: Ruleset = Ruleset {
    imports: &[
        "fs",
        "child_process",
        "net",
        "http",
        "https",
        "os",
        "dgram",
        "cluster",
        "worker_threads",
        "vm",
    ],
    builtins: &[
        "eval(",
        "Function(",
        "process.",
        "globalThis",
        "Reflect.",
    ],
};

static PYTHON_IMPORT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*(?:import|from)\s+([A-Za-z_][A-Za-z0-9_.]*)").unwrap());

static JS_REQUIRE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?:require\s*\(\s*|import\s+.*?from\s+|import\s*\(\s*)["']([^"']+)["']"#)
        .unwrap()
});

static INFINITE_LOOP_RES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (
            Regex::new(r"while\s+True\s*:").unwrap(),
            "unbounded `while True` loop",
        ),
        (
            Regex::new(r"while\s+1\s*:").unwrap(),
            "unbounded `while 1` loop",
        ),
        (
            Regex::new(r"while\s*\(\s*(?:true|1)\s*\)").unwrap(),
            "unbounded `while (true)` loop",
        ),
        (
            Regex::new(r"while\s*\(?\s*[A-Za-z_][\w.\[\]]*\s*==\s*[\w.'\x22\[\]]+\s*\)?\s*[:{]")
                .unwrap(),
            "loop guarded only by an equality check",
        ),
    ]
});

static MEMORY_BOMB_RES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (
            Regex::new(r"\*\s*\d{7,}").unwrap(),
            "multiplication by a very large literal",
        ),
        (
            Regex::new(r"range\s*\(\s*\d{8,}").unwrap(),
            "range over a very large literal",
        ),
        (
            Regex::new(r"\*\*\s*\d{3,}").unwrap(),
            "exponentiation with a very large exponent",
        ),
        (
            Regex::new(r"new\s+Array\s*\(\s*\d{7,}").unwrap(),
            "allocation of a very large array",
        ),
        (
            Regex::new(r"\.repeat\s*\(\s*\d{7,}").unwrap(),
            "string repetition with a very large count",
        ),
    ]
});

static NETWORK_RES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (
            Regex::new(r"https?://").unwrap(),
            "embedded network URL",
        ),
        (
            Regex::new(r"fetch\s*\(").unwrap(),
            "network fetch call",
        ),
        (
            Regex::new(r"XMLHttpRequest").unwrap(),
            "XMLHttpRequest usage",
        ),
    ]
});

/// Heuristic static gate. Stateless; one instance can serve all submissions.
#[derive(Debug, Default)]
pub struct SecurityValidator;

impl SecurityValidator {
    pub fn new() -> Self {
        Self
    }

    /// Scans `code` and returns `(safe, findings)`. `safe` is true iff no
    /// finding was produced. All findings are collected before returning.
    pub fn validate(&self, code: &str, language: Language) -> (bool, Vec<SecurityFinding>) {
        let mut findings = Vec::new();

        self.check_imports(code, language, &mut findings);
        self.check_builtins(code, language, &mut findings);
        self.check_patterns(code, &INFINITE_LOOP_RES, FindingCategory::InfiniteLoopPattern,
            Severity::Medium, &mut findings);
        self.check_patterns(code, &MEMORY_BOMB_RES, FindingCategory::MemoryBombPattern,
            Severity::Medium, &mut findings);
        self.check_patterns(code, &NETWORK_RES, FindingCategory::NetworkPattern,
            Severity::High, &mut findings);

        (findings.is_empty(), findings)
    }

    fn rules(language: Language) -> &'static Ruleset {
        match language {
            Language::Python => &PYTHON_RULES,
            Language::JavaScript => &JAVASCRIPT_RULES,
        }
    }

    fn check_imports(&self, code: &str, language: Language, findings: &mut Vec<SecurityFinding>) {
        let rules = Self::rules(language);
        let re: &Regex = match language {
            Language::Python => &PYTHON_IMPORT_RE,
            Language::JavaScript => &JS_REQUIRE_RE,
        };

        for caps in re.captures_iter(code) {
            let module = &caps[1];
            // Match on the root module so "os.path" and "node:fs" both hit.
            let root = module
                .trim_start_matches("node:")
                .split(['.', '/'])
                .next()
                .unwrap_or(module);
            if rules.imports.contains(&root) {
                findings.push(SecurityFinding {
                    category: FindingCategory::DangerousImport,
                    detail: format!("forbidden import `{}`", module),
                    severity: Severity::High,
                });
            }
        }
    }

    fn check_builtins(&self, code: &str, language: Language, findings: &mut Vec<SecurityFinding>) {
        let rules = Self::rules(language);
        for needle in rules.builtins {
            if code.contains(needle) {
                findings.push(SecurityFinding {
                    category: FindingCategory::DangerousBuiltin,
                    detail: format!("forbidden call `{}`", needle.trim_end_matches('(')),
                    severity: Severity::High,
                });
            }
        }
    }

    fn check_patterns(
        &self,
        code: &str,
        patterns: &[(Regex, &'static str)],
        category: FindingCategory,
        severity: Severity,
        findings: &mut Vec<SecurityFinding>,
    ) {
        for (re, description) in patterns {
            if re.is_match(code) {
                findings.push(SecurityFinding {
                    category,
                    detail: description.to_string(),
                    severity,
                });
            }
        }
    }
}
