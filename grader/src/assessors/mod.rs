//! Pluggable quality-assessment backends.
//!
//! ## Overview
//!
//! A [`QualityAssessor`] scores the subjective rubric categories
//! (readability, style, innovation) for one submission. The pipeline calls
//! whichever backend it was constructed with and silently falls back to the
//! deterministic [`heuristic`] assessor whenever the primary backend errors
//! or overruns its time budget, so grading always completes.

pub mod gemini;
pub mod heuristic;

use async_trait::async_trait;

use crate::error::GraderError;

/// Everything a backend may look at when judging code quality.
#[derive(Debug, Clone)]
pub struct AssessmentRequest {
    /// Natural-language statement of the problem being solved.
    pub problem_description: String,
    /// The submitted source code, verbatim.
    pub code: String,
    /// Language tag, e.g. `python` or `javascript`.
    pub language: String,
    /// Instructor reference solution, when one exists.
    pub reference_solution: Option<String>,
    /// Fraction of executed tests that passed, 0.0..=1.0.
    pub pass_ratio: f64,
}

/// Subjective sub-scores returned by a backend. Values outside the rubric
/// ceilings are clamped by the pipeline, never trusted.
#[derive(Debug, Clone, Copy)]
pub struct QualityAssessment {
    pub readability: u32,
    pub style: u32,
    pub innovation: u32,
}

#[async_trait]
pub trait QualityAssessor: Send + Sync {
    /// Short backend name for logging.
    fn name(&self) -> &'static str;

    /// Scores the subjective categories for one submission.
    async fn assess(&self, request: &AssessmentRequest) -> Result<QualityAssessment, GraderError>;

    /// Optional signed adjustment (-5..=5) to the efficiency score, comparing
    /// the submission against the reference solution. Backends without an
    /// opinion return an error and the base efficiency score stands.
    async fn compare_efficiency(&self, _request: &AssessmentRequest) -> Result<i32, GraderError> {
        Err(GraderError::BackendUnavailable(
            "efficiency comparison not supported".to_string(),
        ))
    }
}
