//! # Grader
//!
//! Turns an execution result plus the submitted source into a rubric-based
//! [`GradingResult`].
//!
//! ## Overview
//!
//! - **Correctness** comes from the pass ratio of the executed tests.
//! - **Efficiency** comes from a static loop-count proxy, optionally
//!   adjusted by a backend comparison against the reference solution.
//! - **Readability, style, innovation** come from the configured
//!   [`QualityAssessor`]; when it fails or overruns its time budget the
//!   deterministic heuristic assessor takes over, so grading never fails.
//! - **Feedback** sentences are chosen from fixed score-band templates and
//!   never contain backend wording.
//!
//! ## Key Concepts
//!
//! - [`GradingPipeline`]: the orchestrator, one instance per engine.
//! - [`ScoreHistory`]: the in-process distribution behind the percentile.

pub mod assessors;
pub mod criteria;
pub mod efficiency;
pub mod error;
pub mod feedback;
pub mod history;

use std::sync::Arc;
use std::time::Duration;

use code_runner::{ExecutionResult, ExecutionVerdict};
use util::languages::Language;

pub use crate::assessors::gemini::GeminiAssessor;
pub use crate::assessors::heuristic::HeuristicAssessor;
pub use crate::assessors::{AssessmentRequest, QualityAssessment, QualityAssessor};
pub use crate::criteria::{Category, FeedbackEntry, GradingCriteria, GradingResult};
pub use crate::error::GraderError;
pub use crate::history::ScoreHistory;

/// Everything the pipeline needs to grade one submission.
pub struct GradingJob<'a> {
    pub problem_description: &'a str,
    pub code: &'a str,
    pub language: Language,
    pub reference_solution: Option<&'a str>,
    pub execution: &'a ExecutionResult,
}

pub struct GradingPipeline {
    assessor: Arc<dyn QualityAssessor>,
    history: Arc<ScoreHistory>,
    ai_timeout: Duration,
}

impl GradingPipeline {
    pub fn new(
        assessor: Arc<dyn QualityAssessor>,
        history: Arc<ScoreHistory>,
        ai_timeout: Duration,
    ) -> Self {
        Self {
            assessor,
            history,
            ai_timeout,
        }
    }

    /// Grades one submission. Infallible: every failure mode inside the
    /// pipeline degrades to a deterministic path instead of erroring out.
    pub async fn grade(&self, job: &GradingJob<'_>) -> GradingResult {
        if job.execution.verdict != ExecutionVerdict::Completed {
            return self.execution_failure_result(job.execution).await;
        }

        let pass_ratio = if job.execution.total == 0 {
            0.0
        } else {
            job.execution.passed as f64 / job.execution.total as f64
        };

        let correctness = correctness_score(job.execution.passed, job.execution.total);

        let request = AssessmentRequest {
            problem_description: job.problem_description.to_string(),
            code: job.code.to_string(),
            language: job.language.tag().to_string(),
            reference_solution: job.reference_solution.map(str::to_string),
            pass_ratio,
        };

        let quality = self.assess_with_fallback(&request).await;

        let efficiency_base = efficiency::base_score(job.code);
        let efficiency = match tokio::time::timeout(
            self.ai_timeout,
            self.assessor.compare_efficiency(&request),
        )
        .await
        {
            Ok(Ok(adjustment)) => efficiency::adjusted_score(efficiency_base, adjustment),
            _ => efficiency_base,
        };

        let criteria = GradingCriteria::new(
            correctness,
            efficiency,
            quality.readability,
            quality.style,
            quality.innovation,
        );

        let mut suggestions = feedback::suggestions(&criteria);
        if efficiency::grows_memory_in_loop(job.code) {
            suggestions.push(
                "A collection grows inside a loop; check whether its size is bounded.".to_string(),
            );
        }

        let total = criteria.total;
        self.history.record(total).await;
        let percentile = self.history.percentile(total).await;

        GradingResult {
            feedback: feedback::assemble(&criteria),
            suggestions,
            overall_grade: criteria::letter_grade(total).to_string(),
            percentile,
            criteria,
        }
    }

    /// All-zero result for a submission turned away before execution
    /// (quota denial, security rejection, unsupported language). Not
    /// recorded into the history.
    pub async fn rejection_result(&self, message: &str) -> GradingResult {
        let criteria = GradingCriteria::zero();
        let percentile = self.history.percentile(0).await;
        GradingResult {
            feedback: vec![FeedbackEntry {
                category: Category::Correctness,
                message: message.to_string(),
            }],
            suggestions: Vec::new(),
            overall_grade: criteria::letter_grade(criteria.total).to_string(),
            percentile,
            criteria,
        }
    }

    /// All-zero result for a submission whose code never produced usable
    /// test outcomes. Not recorded into the history: a crashed run says
    /// nothing about where passing scores sit.
    async fn execution_failure_result(&self, execution: &ExecutionResult) -> GradingResult {
        let message = match execution.verdict {
            ExecutionVerdict::TimedOut => "Execution exceeded the time limit.",
            ExecutionVerdict::Crashed => "The program crashed before reporting results.",
            ExecutionVerdict::ContractViolation => {
                "The program produced no readable test results."
            }
            ExecutionVerdict::Completed => unreachable!("completed runs are graded normally"),
        };
        let criteria = GradingCriteria::zero();
        let percentile = self.history.percentile(0).await;
        GradingResult {
            feedback: vec![FeedbackEntry {
                category: Category::Correctness,
                message: message.to_string(),
            }],
            suggestions: vec!["Make the program run to completion before optimizing.".to_string()],
            overall_grade: criteria::letter_grade(criteria.total).to_string(),
            percentile,
            criteria,
        }
    }

    async fn assess_with_fallback(&self, request: &AssessmentRequest) -> QualityAssessment {
        match tokio::time::timeout(self.ai_timeout, self.assessor.assess(request)).await {
            Ok(Ok(quality)) => quality,
            Ok(Err(e)) => {
                log::warn!(
                    "{} assessor failed ({}), falling back to heuristic",
                    self.assessor.name(),
                    e
                );
                self.heuristic(request).await
            }
            Err(_) => {
                log::warn!(
                    "{} assessor exceeded {:?}, falling back to heuristic",
                    self.assessor.name(),
                    self.ai_timeout
                );
                self.heuristic(request).await
            }
        }
    }

    async fn heuristic(&self, request: &AssessmentRequest) -> QualityAssessment {
        HeuristicAssessor
            .assess(request)
            .await
            .unwrap_or(QualityAssessment {
                readability: 6,
                style: 4,
                innovation: 3,
            })
    }
}

/// Pass-ratio mapping with a full-pass bonus: partial credit tops out at 35,
/// the last 5 points require every test green.
fn correctness_score(passed: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    let ratio = passed as f64 / total as f64;
    let base = (ratio * 35.0).round() as u32;
    if passed == total { base + 5 } else { base }
}
