use crate::models::AuditEntry;
use chrono::Utc;
use std::collections::VecDeque;

pub const AUDIT_CAP: usize = 200;

/// Append-only action history, newest first, capped at the 200 most recent
/// entries. Recording never fails.
#[derive(Debug, Clone, Default)]
pub struct AuditLog {
    entries: VecDeque<AuditEntry>,
}

impl AuditLog {
    pub fn seed(entries: Vec<AuditEntry>) -> Self {
        let mut log = Self {
            entries: entries.into(),
        };
        log.entries.truncate(AUDIT_CAP);
        log
    }

    pub fn record(&mut self, action: impl Into<String>) {
        self.entries.push_front(AuditEntry {
            ts: Utc::now(),
            action: action.into(),
        });
        self.entries.truncate(AUDIT_CAP);
    }

    pub fn entries(&self) -> impl Iterator<Item = &AuditEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_vec(&self) -> Vec<AuditEntry> {
        self.entries.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{AuditLog, AUDIT_CAP};

    #[test]
    fn newest_entry_comes_first() {
        let mut log = AuditLog::default();
        log.record("first");
        log.record("second");
        let entries = log.to_vec();
        assert_eq!(entries[0].action, "second");
        assert_eq!(entries[1].action, "first");
    }

    #[test]
    fn log_never_exceeds_the_cap() {
        let mut log = AuditLog::default();
        for i in 0..AUDIT_CAP + 50 {
            log.record(format!("action {i}"));
        }
        assert_eq!(log.len(), AUDIT_CAP);
        // The survivors are the most recent ones.
        assert_eq!(log.to_vec()[0].action, format!("action {}", AUDIT_CAP + 49));
        assert_eq!(
            log.to_vec()[AUDIT_CAP - 1].action,
            format!("action {}", 50)
        );
    }

    #[test]
    fn seeding_truncates_oversized_history() {
        let mut log = AuditLog::default();
        for i in 0..AUDIT_CAP + 10 {
            log.record(format!("action {i}"));
        }
        let reloaded = AuditLog::seed(log.to_vec());
        assert_eq!(reloaded.len(), AUDIT_CAP);
    }
}
