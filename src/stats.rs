use crate::error::RecordError;
use std::collections::BTreeMap;

/// Counters for one ingest phase
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PhaseStats {
    pub lines_read: u64,
    pub upserted: u64,
    pub skipped: u64,
    pub unresolved_authors: u64,
    skipped_by_kind: BTreeMap<&'static str, u64>,
}

impl PhaseStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_lines(&mut self) {
        self.lines_read += 1;
    }

    pub fn inc_upserted(&mut self) {
        self.upserted += 1;
    }

    pub fn add_unresolved_authors(&mut self, count: u64) {
        self.unresolved_authors += count;
    }

    pub fn record_skip(&mut self, error: &RecordError) {
        self.skipped += 1;
        *self.skipped_by_kind.entry(error.label()).or_insert(0) += 1;
    }

    pub fn skipped_for(&self, label: &str) -> u64 {
        self.skipped_by_kind.get(label).copied().unwrap_or(0)
    }

    /// Skip counts ordered by label
    pub fn skipped_by_kind(&self) -> impl Iterator<Item = (&'static str, u64)> + '_ {
        self.skipped_by_kind.iter().map(|(k, v)| (*k, *v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values_are_zero() {
        let stats = PhaseStats::new();
        assert_eq!(stats.lines_read, 0);
        assert_eq!(stats.upserted, 0);
        assert_eq!(stats.skipped, 0);
        assert_eq!(stats.unresolved_authors, 0);
        assert_eq!(stats.skipped_by_kind().count(), 0);
    }

    #[test]
    fn record_skip_counts_by_kind() {
        let mut stats = PhaseStats::new();
        stats.record_skip(&RecordError::NoPayload);
        stats.record_skip(&RecordError::NoPayload);
        stats.record_skip(&RecordError::MissingField("key"));

        assert_eq!(stats.skipped, 3);
        assert_eq!(stats.skipped_for("no_payload"), 2);
        assert_eq!(stats.skipped_for("missing_field"), 1);
        assert_eq!(stats.skipped_for("invalid_date"), 0);
        assert_eq!(
            stats.skipped_by_kind().collect::<Vec<_>>(),
            vec![("missing_field", 1), ("no_payload", 2)]
        );
    }

    #[test]
    fn mixed_operations() {
        let mut stats = PhaseStats::new();
        stats.inc_lines();
        stats.inc_upserted();
        stats.inc_lines();
        stats.record_skip(&RecordError::NoPayload);
        stats.add_unresolved_authors(3);

        assert_eq!(stats.lines_read, 2);
        assert_eq!(stats.upserted, 1);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.unresolved_authors, 3);
    }
}
