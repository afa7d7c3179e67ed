use once_cell::sync::OnceCell;
use std::env;

/// Global engine configuration, hydrated once from the environment.
///
/// Every knob has a default so the engine can start from a bare environment;
/// only `GEMINI_API_KEY` is genuinely optional (its absence switches grading
/// to the offline heuristic path).
#[derive(Debug)]
pub struct Config {
    pub project_name: String,
    pub log_level: String,
    pub log_file: String,
    /// Executions allowed per identity inside the quota window.
    pub quota_ceiling: usize,
    /// Quota window length in seconds.
    pub quota_window_secs: u64,
    /// Wall-clock ceiling for one sandbox run, in seconds.
    pub sandbox_timeout_secs: u64,
    /// Operator flag: permit the lower-trust local process backend when
    /// the container runtime is unavailable.
    pub sandbox_allow_local: bool,
    /// Container image override for Python sandboxes.
    pub sandbox_image_python: Option<String>,
    /// Container image override for JavaScript sandboxes.
    pub sandbox_image_javascript: Option<String>,
    /// API key for the AI quality-assessment backend, if configured.
    pub gemini_api_key: Option<String>,
    /// Model name for the AI quality-assessment backend.
    pub gemini_model: String,
    /// Network timeout for one AI backend call, in seconds.
    pub ai_timeout_secs: u64,
}

static CONFIG: OnceCell<Config> = OnceCell::new();

impl Config {
    pub fn init(env_path: &str) -> &'static Self {
        dotenvy::from_filename(env_path).ok();

        CONFIG.get_or_init(Self::from_env)
    }

    pub fn get() -> &'static Self {
        CONFIG.get_or_init(Self::from_env)
    }

    fn from_env() -> Self {
        let project_name = env::var("PROJECT_NAME").unwrap_or_else(|_| "arena-engine".into());
        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into());
        let log_file = env::var("LOG_FILE").unwrap_or_else(|_| "logs/engine.log".into());

        let quota_ceiling = parse_or("QUOTA_CEILING", 10);
        let quota_window_secs = parse_or("QUOTA_WINDOW_SECS", 60);
        let sandbox_timeout_secs = parse_or("SANDBOX_TIMEOUT_SECS", 10);
        let sandbox_allow_local = env::var("SANDBOX_ALLOW_LOCAL")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        let sandbox_image_python = env::var("SANDBOX_IMAGE_PYTHON").ok().filter(|v| !v.is_empty());
        let sandbox_image_javascript = env::var("SANDBOX_IMAGE_JAVASCRIPT")
            .ok()
            .filter(|v| !v.is_empty());
        let gemini_api_key = env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty());
        let gemini_model =
            env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-2.5-flash".into());
        let ai_timeout_secs = parse_or("AI_TIMEOUT_SECS", 8);

        Config {
            project_name,
            log_level,
            log_file,
            quota_ceiling,
            quota_window_secs,
            sandbox_timeout_secs,
            sandbox_allow_local,
            sandbox_image_python,
            sandbox_image_javascript,
            gemini_api_key,
            gemini_model,
            ai_timeout_secs,
        }
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_parse_or_defaults_on_missing_and_garbage() {
        env::remove_var("QUOTA_CEILING");
        assert_eq!(parse_or::<usize>("QUOTA_CEILING", 10), 10);

        env::set_var("QUOTA_CEILING", "not-a-number");
        assert_eq!(parse_or::<usize>("QUOTA_CEILING", 10), 10);

        env::set_var("QUOTA_CEILING", "25");
        assert_eq!(parse_or::<usize>("QUOTA_CEILING", 10), 25);
        env::remove_var("QUOTA_CEILING");
    }
}
