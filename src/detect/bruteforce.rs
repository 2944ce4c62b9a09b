//! Per-source failure counting and brute-force thresholding.

use std::collections::HashMap;

use crate::parser::FailureEvent;

/// Accumulates failure counts keyed by source identifier over one scan.
/// Built fresh per invocation; nothing is retained across scans.
#[derive(Debug, Default)]
pub struct SourceCounter {
    counts: HashMap<String, u64>,
    // first-seen order, used as the tiebreak when ranking
    order: Vec<String>,
}

impl SourceCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, event: &FailureEvent) {
        let entry = self.counts.entry(event.source.clone()).or_insert(0);
        if *entry == 0 {
            self.order.push(event.source.clone());
        }
        *entry += 1;
    }

    pub fn observe_all<'a, I: IntoIterator<Item = &'a FailureEvent>>(&mut self, events: I) {
        for event in events {
            self.observe(event);
        }
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn count(&self, source: &str) -> u64 {
        self.counts.get(source).copied().unwrap_or(0)
    }

    /// `(source, count)` pairs, highest count first, first-seen order as the
    /// tiebreak so output stays reproducible.
    pub fn ranked(&self) -> Vec<(String, u64)> {
        let mut ranked: Vec<(String, u64)> = self
            .order
            .iter()
            .map(|s| (s.clone(), self.counts[s]))
            .collect();
        // stable sort over the first-seen ordering keeps ties reproducible
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }

    /// Sources whose count meets or exceeds `threshold`, in ranked order.
    pub fn suspects(&self, threshold: u64) -> Vec<String> {
        self.ranked()
            .into_iter()
            .filter(|(_, count)| *count >= threshold)
            .map(|(source, _)| source)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(source: &str) -> FailureEvent {
        FailureEvent {
            source: source.to_string(),
            when: None,
        }
    }

    fn counter_with(sources: &[&str]) -> SourceCounter {
        let mut c = SourceCounter::new();
        for s in sources {
            c.observe(&event(s));
        }
        c
    }

    #[test]
    fn test_counts_accumulate() {
        let c = counter_with(&["10.0.0.1", "10.0.0.2", "10.0.0.1"]);
        assert_eq!(c.count("10.0.0.1"), 2);
        assert_eq!(c.count("10.0.0.2"), 1);
        assert_eq!(c.count("10.0.0.3"), 0);
        assert_eq!(c.total(), 3);
    }

    #[test]
    fn test_suspect_threshold_is_inclusive() {
        // threshold 5: four attempts is clean, five is a suspect
        let mut c = SourceCounter::new();
        for _ in 0..4 {
            c.observe(&event("192.0.2.1"));
        }
        for _ in 0..5 {
            c.observe(&event("192.0.2.2"));
        }
        assert_eq!(c.suspects(5), vec!["192.0.2.2".to_string()]);
    }

    #[test]
    fn test_ranked_descending_with_first_seen_tiebreak() {
        let c = counter_with(&["b", "a", "a", "c", "b"]);
        let ranked = c.ranked();
        assert_eq!(ranked[0], ("b".to_string(), 2));
        assert_eq!(ranked[1], ("a".to_string(), 2));
        assert_eq!(ranked[2], ("c".to_string(), 1));
    }

    #[test]
    fn test_fresh_counter_is_empty() {
        let c = SourceCounter::new();
        assert!(c.is_empty());
        assert!(c.suspects(1).is_empty());
    }
}
