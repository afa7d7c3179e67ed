//! # Sandbox Manager
//!
//! One ephemeral, hardened Docker container per submission. Hardening is
//! layered: no network, read-only root with a size-capped `noexec` scratch
//! tmpfs, unprivileged user, all capabilities dropped, no privilege
//! re-acquisition, memory ceiling with swap pinned off, CPU share ceiling,
//! pids ceiling, and a wall-clock timeout enforced three times over
//! (supervisor kill, in-container `timeout` prefix, in-harness alarm).
//!
//! If the Docker daemon is unreachable the manager fails closed; an
//! operator may explicitly enable a lower-trust local process fallback,
//! which still applies the wall-clock ceiling, rlimit-based CPU/memory/
//! process ceilings, and a throwaway scratch dir, but none of the
//! namespace-level isolation.

use crate::error::RunnerError;
use crate::types::RawExecution;
use shell_escape::escape;
use std::borrow::Cow;
use std::collections::HashSet;
use std::process::Stdio;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio::process::Command;
use tokio::sync::OnceCell;
use tokio::time::timeout;
use util::execution_config::ExecutionConfig;
use util::languages::Language;
use uuid::Uuid;

/// Extra supervisor headroom past the configured limit, so the
/// in-container `timeout` normally wins and reports the 124 sentinel.
const SUPERVISOR_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Backend {
    Docker,
    /// Operator-flagged fallback: plain host process, reduced isolation.
    LocalProcess,
}

/// Handle to one live sandbox. Owns the host-side scratch directory; the
/// directory is removed when the handle is dropped, so scratch state can
/// never leak between submissions.
pub struct SandboxHandle {
    id: Uuid,
    language: Language,
    scratch: TempDir,
    container_name: String,
}

impl SandboxHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn language(&self) -> Language {
        self.language
    }
}

/// Creates, runs, and destroys sandboxes. One manager serves all
/// submissions; each submission gets its own sandbox, never shared or
/// reused.
pub struct SandboxManager {
    config: ExecutionConfig,
    allow_local: bool,
    backend: OnceCell<Backend>,
    live: Mutex<HashSet<Uuid>>,
}

impl SandboxManager {
    /// `allow_local` is the operator flag permitting the lower-trust local
    /// fallback when Docker is down. Leave it off in production.
    pub fn new(config: ExecutionConfig, allow_local: bool) -> Self {
        Self {
            config,
            allow_local,
            backend: OnceCell::new(),
            live: Mutex::new(HashSet::new()),
        }
    }

    /// Creates a sandbox for `language_tag`. An unsupported tag is a
    /// distinct error; there is no fallback language.
    pub fn create(&self, language_tag: &str) -> Result<SandboxHandle, RunnerError> {
        let language = Language::from_tag(language_tag)
            .ok_or_else(|| RunnerError::UnsupportedLanguage(language_tag.to_string()))?;

        let id = Uuid::new_v4();
        let scratch = tempfile::tempdir()?;
        let handle = SandboxHandle {
            id,
            language,
            scratch,
            container_name: format!("sandbox-{}", id),
        };

        self.live.lock().expect("live set poisoned").insert(id);
        log::debug!("created sandbox {} for {}", id, language);
        Ok(handle)
    }

    /// Runs `program` inside the sandbox. Never blocks past the wall-clock
    /// limit; exceeding it forces termination and yields a timed-out
    /// [`RawExecution`], not an error.
    pub async fn run(
        &self,
        handle: &SandboxHandle,
        program: &str,
        limit: Duration,
    ) -> Result<RawExecution, RunnerError> {
        let backend = self.backend().await?;

        let main_file = handle.scratch.path().join(handle.language.main_filename());
        tokio::fs::write(&main_file, program).await?;

        match backend {
            Backend::Docker => self.run_docker(handle, limit).await,
            Backend::LocalProcess => self.run_local(handle, limit).await,
        }
    }

    /// Destroys the sandbox: unregisters it and removes its scratch dir.
    /// Callers invoke this on every exit path; the container itself is
    /// `--rm` and killed on supervisor timeout, so nothing outlives this.
    pub fn destroy(&self, handle: SandboxHandle) {
        self.live.lock().expect("live set poisoned").remove(&handle.id);
        log::debug!("destroyed sandbox {}", handle.id);
        // Scratch dir is removed when `handle.scratch` drops here.
    }

    /// Ids of sandboxes created but not yet destroyed. Used by tests as a
    /// leak post-condition.
    pub fn live_sandboxes(&self) -> Vec<Uuid> {
        self.live
            .lock()
            .expect("live set poisoned")
            .iter()
            .copied()
            .collect()
    }

    async fn backend(&self) -> Result<Backend, RunnerError> {
        self.backend
            .get_or_try_init(|| async {
                if docker_available().await {
                    return Ok(Backend::Docker);
                }
                if self.allow_local {
                    log::warn!(
                        "docker unavailable; using operator-approved local process fallback"
                    );
                    return Ok(Backend::LocalProcess);
                }
                Err(RunnerError::InfrastructureUnavailable(
                    "docker daemon unreachable and local fallback not enabled".to_string(),
                ))
            })
            .await
            .copied()
    }

    async fn run_docker(
        &self,
        handle: &SandboxHandle,
        limit: Duration,
    ) -> Result<RawExecution, RunnerError> {
        let cfg = &self.config;
        let language = handle.language;

        // The in-container command carries its own timeout so a hang inside
        // the runtime exits with the 124 sentinel before the supervisor has
        // to kill the whole container.
        let inner_command = format!(
            "timeout {} {} /code/{}",
            limit.as_secs().max(1),
            escape(Cow::from(language.runtime())),
            escape(Cow::from(language.main_filename())),
        );

        let mut command = Command::new("docker");
        command
            .arg("run")
            .arg("--rm")
            .arg("--name")
            .arg(&handle.container_name)
            .arg("--network=none")
            .arg("--read-only")
            .arg(format!(
                "--tmpfs=/tmp:rw,noexec,nosuid,size={}m",
                cfg.scratch_size_mb
            ))
            .arg(format!("--memory={}m", cfg.max_memory_mb))
            .arg(format!("--memory-swap={}m", cfg.max_memory_mb))
            .arg(format!("--cpus={}", cfg.max_cpus))
            .arg(format!("--pids-limit={}", cfg.max_processes))
            .arg("--security-opt=no-new-privileges")
            .arg("--cap-drop=ALL")
            .arg("--user=65534:65534")
            .arg("-v")
            .arg(format!("{}:/code:ro", handle.scratch.path().display()))
            .arg(cfg.image_for(language))
            .arg("sh")
            .arg("-c")
            .arg(&inner_command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let start = Instant::now();
        let child = command.spawn()?;

        match timeout(limit + SUPERVISOR_GRACE, child.wait_with_output()).await {
            Ok(Ok(output)) => {
                let exit_code = output.status.code();
                Ok(RawExecution {
                    exit_code,
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                    elapsed: start.elapsed(),
                    timed_out: exit_code == Some(124),
                })
            }
            Ok(Err(e)) => Err(RunnerError::Io(e)),
            Err(_) => {
                // Supervisor timeout: the container did not exit on its own.
                let _ = Command::new("docker")
                    .args(["kill", &handle.container_name])
                    .output()
                    .await;
                Ok(RawExecution {
                    exit_code: None,
                    stdout: String::new(),
                    stderr: String::new(),
                    elapsed: start.elapsed(),
                    timed_out: true,
                })
            }
        }
    }

    async fn run_local(
        &self,
        handle: &SandboxHandle,
        limit: Duration,
    ) -> Result<RawExecution, RunnerError> {
        let cfg = &self.config;
        let language = handle.language;
        let main_file = handle.scratch.path().join(language.main_filename());
        let limit_secs = limit.as_secs().max(1);

        // Rlimit ceilings mirroring the container flags: CPU seconds for
        // `--cpus`, process count for `--pids-limit`, address space for
        // `--memory`. The address-space cap is skipped for node, whose V8
        // heap reserves large virtual ranges up front.
        let mut limits = format!("ulimit -t {} -u {};", limit_secs, cfg.max_processes);
        if language == Language::Python {
            limits.push_str(&format!(" ulimit -v {};", cfg.max_memory_mb * 1024));
        }
        let command_line = format!(
            "{} exec timeout {} {} {}",
            limits,
            limit_secs,
            escape(Cow::from(language.runtime())),
            escape(main_file.to_string_lossy()),
        );

        let mut command = Command::new("sh");
        command
            .arg("-c")
            .arg(&command_line)
            .current_dir(handle.scratch.path())
            .env_clear()
            .env("PATH", "/usr/local/bin:/usr/bin:/bin")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let start = Instant::now();
        let child = command.spawn().map_err(|e| {
            RunnerError::InfrastructureUnavailable(format!("local shell unavailable: {}", e))
        })?;

        match timeout(limit + SUPERVISOR_GRACE, child.wait_with_output()).await {
            Ok(Ok(output)) => {
                let exit_code = output.status.code();
                // 127 is the shell's command-not-found: the runtime itself
                // is missing, which is an operator problem, not a verdict.
                if exit_code == Some(127) {
                    return Err(RunnerError::InfrastructureUnavailable(format!(
                        "local runtime `{}` unavailable: {}",
                        language.runtime(),
                        String::from_utf8_lossy(&output.stderr).trim()
                    )));
                }
                Ok(RawExecution {
                    exit_code,
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                    elapsed: start.elapsed(),
                    timed_out: exit_code == Some(124),
                })
            }
            Ok(Err(e)) => Err(RunnerError::Io(e)),
            // Dropping the output future kills the child (kill_on_drop).
            Err(_) => Ok(RawExecution {
                exit_code: None,
                stdout: String::new(),
                stderr: String::new(),
                elapsed: start.elapsed(),
                timed_out: true,
            }),
        }
    }
}

async fn docker_available() -> bool {
    let probe = Command::new("docker")
        .args(["version", "--format", "{{.Server.Version}}"])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .status();

    matches!(
        timeout(Duration::from_secs(5), probe).await,
        Ok(Ok(status)) if status.success()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> SandboxManager {
        SandboxManager::new(ExecutionConfig::default_config(), false)
    }

    #[test]
    fn test_unsupported_language_is_distinct_error() {
        let result = manager().create("cobol");
        match result {
            Err(RunnerError::UnsupportedLanguage(tag)) => assert_eq!(tag, "cobol"),
            other => panic!("expected UnsupportedLanguage, got {:?}", other.map(|h| h.id())),
        }
    }

    #[test]
    fn test_create_registers_and_destroy_unregisters() {
        let manager = manager();
        let handle = manager.create("python").expect("create should succeed");
        let id = handle.id();
        assert!(manager.live_sandboxes().contains(&id));

        let scratch_path = handle.scratch.path().to_path_buf();
        assert!(scratch_path.exists());

        manager.destroy(handle);
        assert!(manager.live_sandboxes().is_empty());
        assert!(!scratch_path.exists(), "scratch dir must be removed");
    }

    #[test]
    fn test_sandboxes_never_share_scratch() {
        let manager = manager();
        let a = manager.create("python").unwrap();
        let b = manager.create("javascript").unwrap();
        assert_ne!(a.scratch.path(), b.scratch.path());
        manager.destroy(a);
        manager.destroy(b);
    }

    #[tokio::test]
    async fn test_fails_closed_without_backend() {
        // With docker absent and the local fallback off, run() must refuse.
        if docker_available().await {
            return; // environment has docker; the fail-closed path is moot
        }
        let manager = manager();
        let handle = manager.create("python").unwrap();
        let result = manager
            .run(&handle, "print('hi')", Duration::from_secs(2))
            .await;
        manager.destroy(handle);
        assert!(matches!(
            result,
            Err(RunnerError::InfrastructureUnavailable(_))
        ));
    }

    #[tokio::test]
    #[ignore] // requires a local python3 runtime
    async fn test_local_fallback_runs_and_times_out() {
        let manager = SandboxManager::new(ExecutionConfig::default_config(), true);

        let handle = manager.create("python").unwrap();
        let raw = manager
            .run(&handle, "print('ok')", Duration::from_secs(5))
            .await
            .unwrap();
        manager.destroy(handle);
        assert_eq!(raw.exit_code, Some(0));
        assert!(raw.stdout.contains("ok"));

        let handle = manager.create("python").unwrap();
        let raw = manager
            .run(
                &handle,
                "import time\ntime.sleep(30)\n",
                Duration::from_secs(1),
            )
            .await
            .unwrap();
        manager.destroy(handle);
        assert!(raw.timed_out);
        assert!(manager.live_sandboxes().is_empty());
    }

    #[tokio::test]
    #[ignore] // requires a local python3 runtime
    async fn test_local_fallback_enforces_memory_ceiling() {
        let manager = SandboxManager::new(ExecutionConfig::default_config(), true);

        // Allocation twice the configured ceiling must fail inside the
        // child, not get through.
        let handle = manager.create("python").unwrap();
        let raw = manager
            .run(
                &handle,
                "x = bytearray(512 * 1024 * 1024)\nprint('allocated')\n",
                Duration::from_secs(5),
            )
            .await
            .unwrap();
        manager.destroy(handle);

        assert_ne!(raw.exit_code, Some(0));
        assert!(!raw.stdout.contains("allocated"));
    }
}
