//! Rubric types: the five-category criteria breakdown and the final
//! grading result handed back to the caller.

use serde::Serialize;

pub const CORRECTNESS_MAX: u32 = 40;
pub const EFFICIENCY_MAX: u32 = 25;
pub const READABILITY_MAX: u32 = 20;
pub const STYLE_MAX: u32 = 10;
pub const INNOVATION_MAX: u32 = 5;
pub const TOTAL_MAX: u32 = 100;

/// The five rubric categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Correctness,
    Efficiency,
    Readability,
    Style,
    Innovation,
}

impl Category {
    pub fn ceiling(self) -> u32 {
        match self {
            Category::Correctness => CORRECTNESS_MAX,
            Category::Efficiency => EFFICIENCY_MAX,
            Category::Readability => READABILITY_MAX,
            Category::Style => STYLE_MAX,
            Category::Innovation => INNOVATION_MAX,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Category::Correctness => "correctness",
            Category::Efficiency => "efficiency",
            Category::Readability => "readability",
            Category::Style => "style",
            Category::Innovation => "innovation",
        };
        f.write_str(s)
    }
}

/// Five sub-scores plus their total. Construct via [`GradingCriteria::new`],
/// which clamps each sub-score to its ceiling and derives the total, so the
/// `total == sum` invariant holds for every value that can exist.
#[derive(Debug, Clone, Serialize)]
pub struct GradingCriteria {
    pub correctness: u32,
    pub efficiency: u32,
    pub readability: u32,
    pub style: u32,
    pub innovation: u32,
    pub total: u32,
}

impl GradingCriteria {
    pub fn new(
        correctness: u32,
        efficiency: u32,
        readability: u32,
        style: u32,
        innovation: u32,
    ) -> Self {
        let correctness = correctness.min(CORRECTNESS_MAX);
        let efficiency = efficiency.min(EFFICIENCY_MAX);
        let readability = readability.min(READABILITY_MAX);
        let style = style.min(STYLE_MAX);
        let innovation = innovation.min(INNOVATION_MAX);
        let total =
            (correctness + efficiency + readability + style + innovation).min(TOTAL_MAX);
        Self {
            correctness,
            efficiency,
            readability,
            style,
            innovation,
            total,
        }
    }

    pub fn zero() -> Self {
        Self::new(0, 0, 0, 0, 0)
    }

    pub fn score_for(&self, category: Category) -> u32 {
        match category {
            Category::Correctness => self.correctness,
            Category::Efficiency => self.efficiency,
            Category::Readability => self.readability,
            Category::Style => self.style,
            Category::Innovation => self.innovation,
        }
    }
}

/// One deterministic feedback sentence for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackEntry {
    pub category: Category,
    pub message: String,
}

/// Final grading output for one submission.
#[derive(Debug, Clone, Serialize)]
pub struct GradingResult {
    pub criteria: GradingCriteria,
    pub feedback: Vec<FeedbackEntry>,
    pub suggestions: Vec<String>,
    pub overall_grade: String,
    /// Rank against the historical score distribution, 0..=100.
    pub percentile: f64,
}

/// Letter grade via fixed descending thresholds.
pub fn letter_grade(total: u32) -> &'static str {
    match total {
        95..=u32::MAX => "A+",
        90..=94 => "A",
        85..=89 => "B+",
        80..=84 => "B",
        75..=79 => "C+",
        70..=74 => "C",
        60..=69 => "D",
        _ => "F",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_is_sum_and_capped() {
        let c = GradingCriteria::new(40, 25, 20, 10, 5);
        assert_eq!(c.total, 100);
        let c = GradingCriteria::new(10, 5, 5, 2, 1);
        assert_eq!(c.total, 23);
    }

    #[test]
    fn test_sub_scores_clamped_to_ceilings() {
        let c = GradingCriteria::new(99, 99, 99, 99, 99);
        assert_eq!(c.correctness, CORRECTNESS_MAX);
        assert_eq!(c.efficiency, EFFICIENCY_MAX);
        assert_eq!(c.readability, READABILITY_MAX);
        assert_eq!(c.style, STYLE_MAX);
        assert_eq!(c.innovation, INNOVATION_MAX);
        assert_eq!(c.total, TOTAL_MAX);
    }

    #[test]
    fn test_letter_grade_thresholds() {
        assert_eq!(letter_grade(100), "A+");
        assert_eq!(letter_grade(95), "A+");
        assert_eq!(letter_grade(94), "A");
        assert_eq!(letter_grade(90), "A");
        assert_eq!(letter_grade(85), "B+");
        assert_eq!(letter_grade(80), "B");
        assert_eq!(letter_grade(75), "C+");
        assert_eq!(letter_grade(70), "C");
        assert_eq!(letter_grade(60), "D");
        assert_eq!(letter_grade(59), "F");
        assert_eq!(letter_grade(0), "F");
    }
}
