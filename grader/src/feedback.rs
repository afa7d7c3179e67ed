//! Deterministic, template-based feedback.
//!
//! One sentence per category, chosen purely from fixed score bands, so
//! tests can assert on band selection without mocking any backend. AI
//! wording never leaks into these sentences.

use crate::criteria::{Category, GradingCriteria};

/// Score band relative to the category ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Excellent,
    Good,
    Fair,
    Poor,
}

pub fn band_for(score: u32, ceiling: u32) -> Band {
    if ceiling == 0 {
        return Band::Poor;
    }
    let ratio = score as f64 / ceiling as f64;
    if ratio >= 0.9 {
        Band::Excellent
    } else if ratio >= 0.7 {
        Band::Good
    } else if ratio >= 0.5 {
        Band::Fair
    } else {
        Band::Poor
    }
}

pub fn sentence_for(category: Category, band: Band) -> &'static str {
    match (category, band) {
        (Category::Correctness, Band::Excellent) => "All or nearly all tests pass.",
        (Category::Correctness, Band::Good) => "Most tests pass, but some cases still fail.",
        (Category::Correctness, Band::Fair) => "Around half of the tests pass.",
        (Category::Correctness, Band::Poor) => "Most tests fail; revisit the core logic.",

        (Category::Efficiency, Band::Excellent) => "The solution avoids unnecessary iteration.",
        (Category::Efficiency, Band::Good) => "Reasonably efficient, with limited looping.",
        (Category::Efficiency, Band::Fair) => "Several loops suggest avoidable repeated work.",
        (Category::Efficiency, Band::Poor) => {
            "Heavy nested iteration dominates; reconsider the approach."
        }

        (Category::Readability, Band::Excellent) => "Clear structure and naming throughout.",
        (Category::Readability, Band::Good) => "Mostly readable, with minor rough spots.",
        (Category::Readability, Band::Fair) => "Hard to follow in places; add documentation.",
        (Category::Readability, Band::Poor) => "Difficult to read; restructure and document.",

        (Category::Style, Band::Excellent) => "Consistent with the language's conventions.",
        (Category::Style, Band::Good) => "Generally conventional, with small lapses.",
        (Category::Style, Band::Fair) => "Several style-convention violations.",
        (Category::Style, Band::Poor) => "Widespread departures from conventional style.",

        (Category::Innovation, Band::Excellent) => "A notably creative approach.",
        (Category::Innovation, Band::Good) => "Shows some original thinking.",
        (Category::Innovation, Band::Fair) => "A standard approach, competently applied.",
        (Category::Innovation, Band::Poor) => "A routine solution with no distinctive ideas.",
    }
}

/// Improvement suggestion for categories stuck in the lower bands.
fn suggestion_for(category: Category) -> &'static str {
    match category {
        Category::Correctness => "Work through the failing cases by hand before re-submitting.",
        Category::Efficiency => "Look for repeated scans that could be replaced by a single pass.",
        Category::Readability => "Name intermediate values and document non-obvious steps.",
        Category::Style => "Follow the language's naming and formatting conventions.",
        Category::Innovation => "Consider whether a different data structure simplifies the problem.",
    }
}

pub const ALL_CATEGORIES: [Category; 5] = [
    Category::Correctness,
    Category::Efficiency,
    Category::Readability,
    Category::Style,
    Category::Innovation,
];

/// Assembles the per-category sentences for a criteria breakdown.
pub fn assemble(criteria: &GradingCriteria) -> Vec<crate::criteria::FeedbackEntry> {
    ALL_CATEGORIES
        .iter()
        .map(|&category| {
            let band = band_for(criteria.score_for(category), category.ceiling());
            crate::criteria::FeedbackEntry {
                category,
                message: sentence_for(category, band).to_string(),
            }
        })
        .collect()
}

/// Suggestions for every category in the Fair or Poor band.
pub fn suggestions(criteria: &GradingCriteria) -> Vec<String> {
    ALL_CATEGORIES
        .iter()
        .filter(|&&category| {
            matches!(
                band_for(criteria.score_for(category), category.ceiling()),
                Band::Fair | Band::Poor
            )
        })
        .map(|&category| suggestion_for(category).to_string())
        .collect()
}
