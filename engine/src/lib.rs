//! # Engine
//!
//! End-to-end submission orchestration: quota gate, static security gate,
//! sandboxed execution, result collection, grading, and audit of every
//! stage decision.
//!
//! ## Overview
//!
//! [`Engine::submit`] drives one submission through the stage machine
//! (received, quota checked, security validated, sandboxed, harness
//! executed, result parsed, graded). Only an unreachable execution backend
//! surfaces as an error; every other terminal state, including rejections
//! and crashes, comes back as a populated [`SubmissionOutcome`] so the
//! caller always has something to show the player.
//!
//! The sandbox phase (run, destroy, audit) executes on a spawned worker
//! task and `submit` merely awaits it, so a caller that abandons the
//! future cannot orphan a sandbox: the worker runs to completion or
//! timeout and always destroys the handle.

pub mod error;
pub mod submission;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use code_runner::harness;
use code_runner::{ExecutionResult, ResultCollector, RunnerError, SandboxManager};
use common::config::Config;
use grader::{GeminiAssessor, GradingJob, GradingPipeline, ScoreHistory};
use security::{
    AuditEvent, AuditSink, ExecutionQuotaTracker, LogAuditSink, SecurityFinding,
    SecurityValidator,
};
use serde_json::json;
use util::execution_config::ExecutionConfig;
use uuid::Uuid;

pub use crate::error::EngineError;
pub use crate::submission::{
    ProblemSpec, SubmissionOutcome, SubmissionRequest, SubmissionStatus,
};

/// Seconds shaved off the sandbox limit for the in-harness alarm, so the
/// alarm normally fires first and per-test errors stay attributable.
const ALARM_MARGIN_SECS: u64 = 2;

pub struct Engine {
    validator: SecurityValidator,
    quota: ExecutionQuotaTracker,
    sandbox: Arc<SandboxManager>,
    collector: ResultCollector,
    pipeline: GradingPipeline,
    audit: Arc<dyn AuditSink>,
    run_limit: Duration,
}

impl Engine {
    pub fn new(
        quota: ExecutionQuotaTracker,
        sandbox: SandboxManager,
        pipeline: GradingPipeline,
        audit: Arc<dyn AuditSink>,
        run_limit: Duration,
    ) -> Self {
        Self {
            validator: SecurityValidator::new(),
            quota,
            sandbox: Arc::new(sandbox),
            collector: ResultCollector::new(),
            pipeline,
            audit,
            run_limit,
        }
    }

    /// Wires an engine from the process-wide configuration: Gemini-backed
    /// grading (heuristic-only when no key is set), log-backed audit, and
    /// the default resource ceilings.
    pub fn from_config(cfg: &Config) -> Self {
        let audit: Arc<dyn AuditSink> = Arc::new(LogAuditSink);

        let quota = ExecutionQuotaTracker::new(
            cfg.quota_ceiling,
            Duration::from_secs(cfg.quota_window_secs),
            Arc::clone(&audit),
        );

        let mut execution_config = ExecutionConfig {
            timeout_secs: cfg.sandbox_timeout_secs,
            ..ExecutionConfig::default_config()
        };
        if let Some(image) = &cfg.sandbox_image_python {
            execution_config
                .image_overrides
                .insert("python".to_string(), image.clone());
        }
        if let Some(image) = &cfg.sandbox_image_javascript {
            execution_config
                .image_overrides
                .insert("javascript".to_string(), image.clone());
        }
        let sandbox = SandboxManager::new(execution_config, cfg.sandbox_allow_local);

        let pipeline = GradingPipeline::new(
            Arc::new(GeminiAssessor::with_model(
                cfg.gemini_api_key.clone(),
                cfg.gemini_model.clone(),
                Duration::from_secs(cfg.ai_timeout_secs),
            )),
            Arc::new(ScoreHistory::new()),
            Duration::from_secs(cfg.ai_timeout_secs),
        );

        Self::new(
            quota,
            sandbox,
            pipeline,
            audit,
            Duration::from_secs(cfg.sandbox_timeout_secs),
        )
    }

    /// Ids of sandboxes created but not yet destroyed. Empty between
    /// submissions; used as a leak post-condition by tests and operators.
    pub fn live_sandboxes(&self) -> Vec<Uuid> {
        self.sandbox.live_sandboxes()
    }

    /// Runs one submission to a terminal state.
    ///
    /// # Returns
    ///
    /// `Ok(outcome)` for every per-submission terminal state (completed,
    /// rejected, failed); `Err(EngineError::InfrastructureUnavailable)` only
    /// when no execution backend is reachable, in which case the submission
    /// may be retried as-is.
    pub async fn submit(
        &self,
        request: SubmissionRequest,
    ) -> Result<SubmissionOutcome, EngineError> {
        self.audit_stage(
            "submission_received",
            &request.identity,
            SubmissionStatus::Received,
            json!({
                "language": request.language.tag(),
                "test_cases": request.problem.test_cases.len(),
            }),
        );

        if !self.quota.check_and_record(&request.identity).await {
            return Ok(self
                .rejected(
                    request,
                    Vec::new(),
                    "Execution quota exceeded; wait for the window to clear.",
                )
                .await);
        }
        self.audit_stage(
            "quota_admitted",
            &request.identity,
            SubmissionStatus::QuotaChecked,
            json!({}),
        );

        let (safe, findings) = self
            .validator
            .validate(&request.source_code, request.language);
        if !safe {
            self.audit.record(AuditEvent::new(
                "security_rejected",
                &request.identity,
                json!({
                    "findings": findings
                        .iter()
                        .map(|f| f.category.to_string())
                        .collect::<Vec<_>>(),
                }),
            ));
            return Ok(self
                .rejected(
                    request,
                    findings,
                    "Submission rejected by the static security gate.",
                )
                .await);
        }
        self.audit_stage(
            "security_validated",
            &request.identity,
            SubmissionStatus::SecurityValidated,
            json!({}),
        );

        let alarm_secs = self
            .run_limit
            .as_secs()
            .saturating_sub(ALARM_MARGIN_SECS)
            .max(1);
        let program = match harness::generate(
            request.language,
            &request.source_code,
            &request.problem.test_cases,
            alarm_secs,
        ) {
            Ok(program) => program,
            Err(e) => {
                return Ok(self
                    .failed(request, &format!("harness generation failed: {}", e))
                    .await);
            }
        };

        let handle = match self.sandbox.create(request.language.tag()) {
            Ok(handle) => handle,
            Err(e) => {
                return Ok(self
                    .failed(request, &format!("sandbox creation failed: {}", e))
                    .await);
            }
        };
        self.audit_stage(
            "sandbox_created",
            &request.identity,
            SubmissionStatus::Sandboxed,
            json!({ "sandbox_id": handle.id() }),
        );

        // The sandbox phase is a detached worker: if the caller drops the
        // submit future mid-run, the worker still finishes (or times out)
        // and destroys the sandbox.
        let sandbox = Arc::clone(&self.sandbox);
        let audit = Arc::clone(&self.audit);
        let identity = request.identity.clone();
        let limit = self.run_limit;
        let worker = tokio::spawn(async move {
            let raw = sandbox.run(&handle, &program, limit).await;
            audit.record(AuditEvent::new(
                "harness_executed",
                &identity,
                json!({
                    "stage": SubmissionStatus::HarnessExecuted.to_string(),
                    "ok": raw.is_ok(),
                }),
            ));
            let id = handle.id();
            sandbox.destroy(handle);
            audit.record(AuditEvent::new(
                "sandbox_destroyed",
                &identity,
                json!({ "sandbox_id": id }),
            ));
            (id, raw)
        });

        let (sandbox_id, raw) = match worker.await {
            Ok(pair) => pair,
            Err(e) => {
                return Ok(self
                    .failed(request, &format!("sandbox worker failed: {}", e))
                    .await);
            }
        };

        let raw = match raw {
            Ok(raw) => raw,
            Err(RunnerError::InfrastructureUnavailable(detail)) => {
                return Err(EngineError::InfrastructureUnavailable(detail));
            }
            Err(e) => {
                return Ok(self
                    .failed(request, &format!("execution failed: {}", e))
                    .await);
            }
        };

        let execution = self
            .collector
            .parse(&raw, &request.problem.test_cases, sandbox_id);
        self.audit_stage(
            "execution_completed",
            &request.identity,
            SubmissionStatus::ResultParsed,
            json!({
                "verdict": execution.verdict,
                "passed": execution.passed,
                "total": execution.total,
                "elapsed_ms": execution.elapsed_ms,
            }),
        );

        let job = GradingJob {
            problem_description: &request.problem.description,
            code: &request.source_code,
            language: request.language,
            reference_solution: request.problem.reference_solution.as_deref(),
            execution: &execution,
        };
        let grading = self.pipeline.grade(&job).await;
        self.audit_stage(
            "grading_completed",
            &request.identity,
            SubmissionStatus::Graded,
            json!({
                "total": grading.criteria.total,
                "grade": grading.overall_grade,
            }),
        );

        self.audit_stage(
            "submission_completed",
            &request.identity,
            SubmissionStatus::Completed,
            json!({}),
        );
        Ok(self.outcome(
            request,
            SubmissionStatus::Completed,
            Vec::new(),
            Some(execution),
            grading,
        ))
    }

    /// Records one stage transition with the stage name in the detail map.
    fn audit_stage(
        &self,
        event_type: &str,
        identity: &str,
        stage: SubmissionStatus,
        mut detail: serde_json::Value,
    ) {
        if let Some(map) = detail.as_object_mut() {
            map.insert("stage".to_string(), json!(stage.to_string()));
        }
        self.audit.record(AuditEvent::new(event_type, identity, detail));
    }

    async fn rejected(
        &self,
        request: SubmissionRequest,
        findings: Vec<SecurityFinding>,
        message: &str,
    ) -> SubmissionOutcome {
        self.audit_stage(
            "submission_rejected",
            &request.identity,
            SubmissionStatus::Rejected,
            json!({ "reason": message }),
        );
        let grading = self.pipeline.rejection_result(message).await;
        self.outcome(request, SubmissionStatus::Rejected, findings, None, grading)
    }

    async fn failed(&self, request: SubmissionRequest, message: &str) -> SubmissionOutcome {
        log::error!("submission by {} failed: {}", request.identity, message);
        self.audit_stage(
            "submission_failed",
            &request.identity,
            SubmissionStatus::Failed,
            json!({ "reason": message }),
        );
        let grading = self.pipeline.rejection_result(message).await;
        self.outcome(request, SubmissionStatus::Failed, Vec::new(), None, grading)
    }

    fn outcome(
        &self,
        request: SubmissionRequest,
        status: SubmissionStatus,
        findings: Vec<SecurityFinding>,
        execution: Option<ExecutionResult>,
        grading: grader::GradingResult,
    ) -> SubmissionOutcome {
        SubmissionOutcome {
            identity: request.identity,
            status,
            findings,
            execution,
            grading,
            submitted_at: request.submitted_at,
            completed_at: Utc::now(),
        }
    }
}
