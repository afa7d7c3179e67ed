//! # Execution Quota Tracker
//!
//! Sliding-window rate limiter applied per identity before any sandbox is
//! created. The tracker is an owned, injectable component (no module-level
//! state) so tests can build independent trackers without interference.

use crate::audit::{AuditEvent, AuditSink};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Per-identity sliding-window limiter.
///
/// On every check the identity's timestamp list is pruned to the trailing
/// window; a new execution is admitted iff the remaining count is below the
/// ceiling, and a timestamp is recorded only when admitted. All updates run
/// under one async mutex, so two concurrent submissions can never both take
/// the last slot.
pub struct ExecutionQuotaTracker {
    ceiling: usize,
    window: Duration,
    state: Mutex<HashMap<String, Vec<Instant>>>,
    audit: Arc<dyn AuditSink>,
}

impl ExecutionQuotaTracker {
    pub fn new(ceiling: usize, window: Duration, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            ceiling,
            window,
            state: Mutex::new(HashMap::new()),
            audit,
        }
    }

    /// Checks whether `identity` may execute now, recording the attempt if
    /// admitted. Denials are audit-logged with the current window occupancy.
    pub async fn check_and_record(&self, identity: &str) -> bool {
        let now = Instant::now();
        let mut state = self.state.lock().await;

        let entries = state.entry(identity.to_string()).or_default();
        entries.retain(|t| now.duration_since(*t) < self.window);

        if entries.len() >= self.ceiling {
            self.audit.record(AuditEvent::new(
                "quota_denied",
                identity,
                json!({
                    "window_occupancy": entries.len(),
                    "ceiling": self.ceiling,
                    "window_secs": self.window.as_secs_f64(),
                }),
            ));
            return false;
        }

        entries.push(now);
        true
    }

    /// Current occupancy of the identity's window, pruning as a side effect.
    pub async fn occupancy(&self, identity: &str) -> usize {
        let now = Instant::now();
        let mut state = self.state.lock().await;
        match state.get_mut(identity) {
            Some(entries) => {
                entries.retain(|t| now.duration_since(*t) < self.window);
                entries.len()
            }
            None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemoryAuditSink;

    fn tracker(ceiling: usize, window: Duration) -> (ExecutionQuotaTracker, Arc<MemoryAuditSink>) {
        let sink = Arc::new(MemoryAuditSink::new());
        let tracker = ExecutionQuotaTracker::new(ceiling, window, sink.clone());
        (tracker, sink)
    }

    #[tokio::test]
    async fn test_ceiling_admits_then_denies() {
        let (tracker, sink) = tracker(10, Duration::from_secs(60));

        for i in 0..10 {
            assert!(
                tracker.check_and_record("player-x").await,
                "call {} within ceiling should be admitted",
                i + 1
            );
        }
        assert!(
            !tracker.check_and_record("player-x").await,
            "11th call in the window must be denied"
        );

        let denial = sink
            .events()
            .into_iter()
            .find(|e| e.event_type == "quota_denied")
            .expect("denial should be audited");
        assert_eq!(denial.identity, "player-x");
        assert_eq!(denial.detail["window_occupancy"], 10);
    }

    #[tokio::test]
    async fn test_identities_are_independent() {
        let (tracker, _) = tracker(1, Duration::from_secs(60));

        assert!(tracker.check_and_record("a").await);
        assert!(!tracker.check_and_record("a").await);
        assert!(tracker.check_and_record("b").await);
    }

    #[tokio::test]
    async fn test_window_expiry_readmits() {
        let (tracker, _) = tracker(1, Duration::from_millis(80));

        assert!(tracker.check_and_record("a").await);
        assert!(!tracker.check_and_record("a").await);

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(
            tracker.check_and_record("a").await,
            "expired entries must be pruned and the slot freed"
        );
    }

    #[tokio::test]
    async fn test_denied_calls_do_not_record() {
        let (tracker, _) = tracker(2, Duration::from_secs(60));

        assert!(tracker.check_and_record("a").await);
        assert!(tracker.check_and_record("a").await);
        assert!(!tracker.check_and_record("a").await);
        assert_eq!(tracker.occupancy("a").await, 2);
    }

    #[tokio::test]
    async fn test_concurrent_contention_admits_exactly_ceiling() {
        let sink: Arc<MemoryAuditSink> = Arc::new(MemoryAuditSink::new());
        let tracker = Arc::new(ExecutionQuotaTracker::new(
            5,
            Duration::from_secs(60),
            sink,
        ));

        let mut handles = Vec::new();
        for _ in 0..20 {
            let t = tracker.clone();
            handles.push(tokio::spawn(
                async move { t.check_and_record("burst").await },
            ));
        }

        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 5, "exactly the ceiling may be admitted");
    }
}
