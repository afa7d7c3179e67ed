//! In-memory score history used for percentile ranking.
//!
//! The percentile is computed against scores this process has actually
//! graded, so a fresh engine reports a neutral 50th percentile until
//! real data accumulates. Persistence lives with the caller, not here.

use tokio::sync::Mutex;

/// Per-problem score history. Keyed externally; one instance covers one
/// distribution (typically one problem).
#[derive(Default)]
pub struct ScoreHistory {
    scores: Mutex<Vec<u32>>,
}

impl ScoreHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(&self, total: u32) {
        self.scores.lock().await.push(total);
    }

    /// Percentage of recorded scores at or below `total`. An empty history
    /// ranks everything at the 50th percentile rather than a misleading
    /// 0 or 100.
    pub async fn percentile(&self, total: u32) -> f64 {
        let scores = self.scores.lock().await;
        if scores.is_empty() {
            return 50.0;
        }
        let at_or_below = scores.iter().filter(|&&s| s <= total).count();
        at_or_below as f64 / scores.len() as f64 * 100.0
    }

    pub async fn len(&self) -> usize {
        self.scores.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.scores.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_history_is_neutral() {
        let history = ScoreHistory::new();
        assert_eq!(history.percentile(87).await, 50.0);
    }

    #[tokio::test]
    async fn test_percentile_counts_at_or_below() {
        let history = ScoreHistory::new();
        for score in [10, 20, 30, 40] {
            history.record(score).await;
        }
        assert_eq!(history.percentile(30).await, 75.0);
        assert_eq!(history.percentile(5).await, 0.0);
        assert_eq!(history.percentile(100).await, 100.0);
    }
}
