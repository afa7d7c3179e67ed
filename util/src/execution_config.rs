use crate::languages::Language;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Resource ceilings applied to one sandboxed execution.
///
/// Every field carries a serde default so partial config JSON stays valid;
/// `default_config()` is the canonical baseline used by tests and by the
/// engine when no per-problem override exists.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExecutionConfig {
    /// Wall-clock ceiling for the whole run, enforced by the supervisor,
    /// the in-container `timeout` prefix, and the in-harness alarm.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Hard memory ceiling in megabytes. Swap is pinned to the same value,
    /// so effectively disabled.
    #[serde(default = "default_max_memory_mb")]
    pub max_memory_mb: u64,

    /// CPU share ceiling as passed to `--cpus` (e.g., "0.5").
    #[serde(default = "default_max_cpus")]
    pub max_cpus: String,

    /// Process/thread count ceiling inside the sandbox.
    #[serde(default = "default_max_processes")]
    pub max_processes: u32,

    /// Size cap for the writable, no-exec scratch mount, in megabytes.
    #[serde(default = "default_scratch_size_mb")]
    pub scratch_size_mb: u64,

    /// Container image overrides keyed by language tag; languages not
    /// listed use their built-in image.
    #[serde(default)]
    pub image_overrides: HashMap<String, String>,
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_memory_mb() -> u64 {
    256
}

fn default_max_cpus() -> String {
    "0.5".to_string()
}

fn default_max_processes() -> u32 {
    64
}

fn default_scratch_size_mb() -> u64 {
    16
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_memory_mb: default_max_memory_mb(),
            max_cpus: default_max_cpus(),
            max_processes: default_max_processes(),
            scratch_size_mb: default_scratch_size_mb(),
            image_overrides: HashMap::new(),
        }
    }
}

impl ExecutionConfig {
    pub fn default_config() -> Self {
        Self::default()
    }

    /// Container image for `language`, honoring a configured override.
    pub fn image_for(&self, language: Language) -> &str {
        self.image_overrides
            .get(language.tag())
            .map(String::as_str)
            .unwrap_or_else(|| language.docker_image())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let cfg: ExecutionConfig = serde_json::from_str(r#"{ "timeout_secs": 3 }"#).unwrap();
        assert_eq!(cfg.timeout_secs, 3);
        assert_eq!(cfg.max_memory_mb, 256);
        assert_eq!(cfg.max_cpus, "0.5");
        assert_eq!(cfg.max_processes, 64);
        assert_eq!(cfg.scratch_size_mb, 16);
    }

    #[test]
    fn test_image_override_wins() {
        let mut cfg = ExecutionConfig::default_config();
        assert_eq!(cfg.image_for(Language::Python), "python:3.12-alpine");
        cfg.image_overrides
            .insert("python".to_string(), "python:3.13-slim".to_string());
        assert_eq!(cfg.image_for(Language::Python), "python:3.13-slim");
        assert_eq!(cfg.image_for(Language::JavaScript), "node:20-alpine");
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let cfg = serde_json::from_str::<ExecutionConfig>(r#"{ "timeout_secs": "oops" }"#);
        assert!(cfg.is_err());
    }
}
