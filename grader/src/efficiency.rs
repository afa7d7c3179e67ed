//! Static efficiency proxy.
//!
//! Without profiling inside the sandbox, loop density is the stand-in
//! signal: fewer loops score higher, on the theory that for the small
//! problems graded here a loop-free or single-pass solution is usually
//! the better one. A backend comparison against the reference solution
//! can later adjust the score by a few points in either direction.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::criteria::EFFICIENCY_MAX;

static LOOP_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?m)^\s*for\b").expect("for regex"),
        Regex::new(r"(?m)^\s*while\b").expect("while regex"),
        Regex::new(r"\.(?:forEach|map|filter|reduce)\s*\(").expect("iterator regex"),
    ]
});

static GROWTH_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        // Collection growing inside what is almost certainly a loop body.
        Regex::new(r"\.append\s*\(").expect("append regex"),
        Regex::new(r"\.push\s*\(").expect("push regex"),
        Regex::new(r"\+=\s*\[").expect("extend regex"),
    ]
});

pub fn loop_count(code: &str) -> usize {
    LOOP_RES.iter().map(|re| re.find_iter(code).count()).sum()
}

/// True when the code both loops and grows a collection, a rough signal
/// for unbounded memory use worth a feedback nudge. Never affects the score.
pub fn grows_memory_in_loop(code: &str) -> bool {
    loop_count(code) > 0 && GROWTH_RES.iter().any(|re| re.is_match(code))
}

/// Base efficiency score from the loop count alone.
pub fn base_score(code: &str) -> u32 {
    match loop_count(code) {
        0 => EFFICIENCY_MAX,
        1 => 21,
        2 => 17,
        n => (17_i64 - 3 * (n as i64 - 2)).max(5) as u32,
    }
}

/// Applies a signed backend adjustment, clamped to the category range.
pub fn adjusted_score(base: u32, adjustment: i32) -> u32 {
    (base as i64 + adjustment.clamp(-5, 5) as i64).clamp(0, EFFICIENCY_MAX as i64) as u32
}
