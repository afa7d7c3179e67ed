use serde::{Deserialize, Serialize};

/// Languages the execution runtime supports.
/// Serialized/deserialized in `lowercase` for config JSON.
/// Common aliases are accepted (e.g., "py", "js", "node").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[serde(alias = "py", alias = "python3")]
    Python,
    #[serde(alias = "js", alias = "node")]
    JavaScript,
}

impl Language {
    /// Resolves a user-supplied language tag. `None` means unsupported;
    /// callers must surface that as a distinct error, never fall back.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_lowercase().as_str() {
            "python" | "python3" | "py" => Some(Language::Python),
            "javascript" | "js" | "node" => Some(Language::JavaScript),
            _ => None,
        }
    }

    /// Canonical lowercase tag, matching the serde representation.
    pub fn tag(self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
        }
    }

    /// Filename the harness is written to inside the sandbox.
    pub fn main_filename(self) -> &'static str {
        match self {
            Language::Python => "main.py",
            Language::JavaScript => "main.js",
        }
    }

    /// Interpreter invoked inside the sandbox (or locally in fallback mode).
    pub fn runtime(self) -> &'static str {
        match self {
            Language::Python => "python3",
            Language::JavaScript => "node",
        }
    }

    /// Container image the sandbox boots for this language.
    pub fn docker_image(self) -> &'static str {
        match self {
            Language::Python => "python:3.12-alpine",
            Language::JavaScript => "node:20-alpine",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}
