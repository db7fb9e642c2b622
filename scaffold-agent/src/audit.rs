//! Audit trail for oracle invocations.
//!
//! Keeps a bounded in-memory record of every suggestion call so a session
//! can show what was asked, how long it took, and what came back.

use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use tokio::sync::RwLock;

/// Maximum entries in the audit log before pruning.
const MAX_AUDIT_ENTRIES: usize = 1_000;

/// How one oracle call ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    /// Parsed payload with this many suggestions
    Suggested(usize),
    /// Output carried no recoverable JSON
    Malformed,
    /// Transport or backend failure
    Failed(String),
    /// The configured timeout elapsed
    TimedOut,
}

/// An entry in the audit log.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    /// When the call started
    pub at: DateTime<Utc>,
    /// Subject the suggestion was requested for
    pub subject: String,
    /// Chapter being analyzed
    pub chapter: String,
    /// Backend/model that served the call
    pub model: String,
    /// Wall-clock duration
    pub duration_ms: u64,
    /// How the call ended
    pub outcome: CallOutcome,
}

impl AuditEntry {
    /// Create an entry stamped with the current time.
    pub fn new(
        subject: impl Into<String>,
        chapter: impl Into<String>,
        model: impl Into<String>,
        duration_ms: u64,
        outcome: CallOutcome,
    ) -> Self {
        Self {
            at: Utc::now(),
            subject: subject.into(),
            chapter: chapter.into(),
            model: model.into(),
            duration_ms,
            outcome,
        }
    }
}

/// Audit log for tracking oracle invocations.
pub struct AuditLog {
    /// Log entries (newest first)
    entries: RwLock<VecDeque<AuditEntry>>,
    /// Maximum entries to retain
    max_entries: usize,
}

impl AuditLog {
    /// Create a new audit log.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(VecDeque::new()),
            max_entries: MAX_AUDIT_ENTRIES,
        }
    }

    /// Create with custom max entries.
    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(VecDeque::new()),
            max_entries,
        }
    }

    /// Record one call.
    pub async fn record(&self, entry: AuditEntry) {
        let mut entries = self.entries.write().await;
        entries.push_front(entry);

        // Prune if over limit
        while entries.len() > self.max_entries {
            entries.pop_back();
        }
    }

    /// Get recent entries.
    pub async fn recent(&self, limit: usize) -> Vec<AuditEntry> {
        let entries = self.entries.read().await;
        entries.iter().take(limit).cloned().collect()
    }

    /// Get statistics.
    pub async fn stats(&self) -> AuditStats {
        let entries = self.entries.read().await;

        let total = entries.len();
        let suggested = entries
            .iter()
            .filter(|e| matches!(e.outcome, CallOutcome::Suggested(_)))
            .count();
        let malformed = entries
            .iter()
            .filter(|e| e.outcome == CallOutcome::Malformed)
            .count();
        let failed = entries
            .iter()
            .filter(|e| matches!(e.outcome, CallOutcome::Failed(_) | CallOutcome::TimedOut))
            .count();

        let avg_duration_ms = if total > 0 {
            entries.iter().map(|e| e.duration_ms).sum::<u64>() / total as u64
        } else {
            0
        };

        AuditStats {
            total_calls: total,
            suggested,
            malformed,
            failed,
            avg_duration_ms,
        }
    }

    /// Clear the log.
    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        entries.clear();
    }

    /// Get count.
    pub async fn count(&self) -> usize {
        let entries = self.entries.read().await;
        entries.len()
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics from the audit log.
#[derive(Debug, Clone)]
pub struct AuditStats {
    /// Total calls logged
    pub total_calls: usize,
    /// Calls that produced a parsed payload
    pub suggested: usize,
    /// Calls whose output was unrecoverable
    pub malformed: usize,
    /// Calls that failed or timed out
    pub failed: usize,
    /// Average call duration
    pub avg_duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_audit_log_records_newest_first() {
        let log = AuditLog::new();

        log.record(AuditEntry::new(
            "Maths",
            "Polynomials",
            "llama3",
            120,
            CallOutcome::Suggested(2),
        ))
        .await;
        log.record(AuditEntry::new(
            "Maths",
            "Circles",
            "llama3",
            90,
            CallOutcome::Malformed,
        ))
        .await;

        let recent = log.recent(10).await;
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].chapter, "Circles");

        let stats = log.stats().await;
        assert_eq!(stats.total_calls, 2);
        assert_eq!(stats.suggested, 1);
        assert_eq!(stats.malformed, 1);
        assert_eq!(stats.avg_duration_ms, 105);
    }

    #[tokio::test]
    async fn test_audit_log_prunes_at_capacity() {
        let log = AuditLog::with_max_entries(2);

        for i in 0..4 {
            log.record(AuditEntry::new(
                "Maths",
                format!("Chapter {}", i),
                "llama3",
                10,
                CallOutcome::Suggested(0),
            ))
            .await;
        }

        assert_eq!(log.count().await, 2);
        let recent = log.recent(10).await;
        assert_eq!(recent[0].chapter, "Chapter 3");
        assert_eq!(recent[1].chapter, "Chapter 2");
    }
}
