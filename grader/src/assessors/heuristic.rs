//! Deterministic fallback assessor.
//!
//! Scores the subjective categories from simple lexical signals so grading
//! still completes when no AI backend is reachable. Innovation stays at a
//! neutral midpoint since no lexical signal can judge it honestly.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{AssessmentRequest, QualityAssessment, QualityAssessor};
use crate::criteria::{INNOVATION_MAX, READABILITY_MAX, STYLE_MAX};
use crate::error::GraderError;

static COMMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?m)^\s*(#|//)|"{3}|'{3}|/\*"#).expect("comment regex"));

static SINGLE_LETTER_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*(?:def\s+|function\s+|(?:let|const|var)\s+)([A-Za-z_])\b[^A-Za-z0-9_]")
        .expect("name regex")
});

static FUNCTION_DEF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*(def\s+\w+|function\s+\w+|\w+\s*=\s*\(.*\)\s*=>)").expect("def regex"));

pub struct HeuristicAssessor;

impl HeuristicAssessor {
    fn readability(code: &str) -> u32 {
        let mut score = 6;
        if COMMENT_RE.is_match(code) {
            score += 6;
        }
        if !SINGLE_LETTER_NAME_RE.is_match(code) {
            score += 4;
        }
        if FUNCTION_DEF_RE.find_iter(code).count() >= 2 {
            score += 4;
        }
        score.min(READABILITY_MAX)
    }

    fn style(code: &str) -> u32 {
        let mut score = 4;
        if code.lines().all(|l| l.chars().count() <= 100) {
            score += 3;
        }
        // Mixed snake_case and camelCase in one file reads as inconsistency.
        let has_snake = code.contains('_');
        let has_camel = code
            .split(|c: char| !c.is_alphanumeric())
            .any(|w| w.chars().any(|c| c.is_lowercase()) && w.chars().any(|c| c.is_uppercase()));
        if !(has_snake && has_camel) {
            score += 3;
        }
        score.min(STYLE_MAX)
    }
}

#[async_trait]
impl QualityAssessor for HeuristicAssessor {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    async fn assess(&self, request: &AssessmentRequest) -> Result<QualityAssessment, GraderError> {
        Ok(QualityAssessment {
            readability: Self::readability(&request.code),
            style: Self::style(&request.code),
            innovation: 3.min(INNOVATION_MAX),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(code: &str) -> AssessmentRequest {
        AssessmentRequest {
            problem_description: "sum two numbers".to_string(),
            code: code.to_string(),
            language: "python".to_string(),
            reference_solution: None,
            pass_ratio: 1.0,
        }
    }

    #[tokio::test]
    async fn test_documented_code_scores_higher() {
        let assessor = HeuristicAssessor;
        let plain = assessor.assess(&request("def add(a, b):\n    return a + b\n")).await.unwrap();
        let documented = assessor
            .assess(&request("# adds two numbers\ndef add(first, second):\n    return first + second\n"))
            .await
            .unwrap();
        assert!(documented.readability > plain.readability);
    }

    #[tokio::test]
    async fn test_scores_within_ceilings() {
        let assessor = HeuristicAssessor;
        let code = "# doc\ndef first_part(value):\n    return value\n\ndef second_part(value):\n    return value * 2\n";
        let q = assessor.assess(&request(code)).await.unwrap();
        assert!(q.readability <= READABILITY_MAX);
        assert!(q.style <= STYLE_MAX);
        assert!(q.innovation <= INNOVATION_MAX);
    }

    #[tokio::test]
    async fn test_long_lines_lose_style_points() {
        let assessor = HeuristicAssessor;
        let long_line = format!("def f():\n    return {}\n", "1 + ".repeat(60) + "1");
        let q = assessor.assess(&request(&long_line)).await.unwrap();
        let short = assessor.assess(&request("def f():\n    return 1\n")).await.unwrap();
        assert!(q.style < short.style);
    }
}
