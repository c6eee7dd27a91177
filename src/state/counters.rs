use std::collections::BTreeMap;

/// A running count paired with per-URL occurrences
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    count: u64,
    urls: BTreeMap<String, u64>,
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a tally from persisted parts
    ///
    /// The total is kept as given; it may legitimately differ from the sum of
    /// the per-URL counts when a table's count line was lost.
    pub fn from_parts(count: u64, urls: BTreeMap<String, u64>) -> Self {
        Self { count, urls }
    }

    /// Records one occurrence, returning the new per-URL count
    pub fn record(&mut self, url: &str) -> u64 {
        self.count += 1;
        let seen = self.urls.entry(url.to_string()).or_insert(0);
        *seen += 1;
        *seen
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn get(&self, url: &str) -> u64 {
        self.urls.get(url).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.urls.iter().map(|(url, count)| (url.as_str(), *count))
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0 && self.urls.is_empty()
    }

    /// Raises the total to at least `floor`
    pub fn raise_count_to(&mut self, floor: u64) {
        self.count = self.count.max(floor);
    }
}

/// Classification tallies kept across the crawl
///
/// Duplicates live in the [`DedupLedger`](super::DedupLedger) because their
/// per-URL counts are the ledger's own revisit counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Counters {
    pub invalid: Tally,
    pub out_of_scope: Tally,
    pub timeout: Tally,
    pub error: Tally,
}

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Timeouts count as errors too, so `error.count() >= timeout.count()`
    pub fn record_timeout(&mut self, url: &str) {
        self.timeout.record(url);
        self.error.record(url);
    }

    /// Restores `error.count() >= timeout.count()` after totals were loaded
    /// independently
    pub fn reconcile(&mut self) {
        let timeouts = self.timeout.count();
        self.error.raise_count_to(timeouts);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tally_record() {
        let mut tally = Tally::new();
        assert_eq!(tally.record("a"), 1);
        assert_eq!(tally.record("a"), 2);
        assert_eq!(tally.record("b"), 1);
        assert_eq!(tally.count(), 3);
        assert_eq!(tally.get("a"), 2);
        assert_eq!(tally.get("missing"), 0);
    }

    #[test]
    fn test_timeout_double_counted() {
        let mut counters = Counters::new();
        counters.record_timeout("https://x.com/slow");
        counters.error.record("https://x.com/broken");

        assert_eq!(counters.timeout.count(), 1);
        assert_eq!(counters.error.count(), 2);
        assert!(counters.error.count() >= counters.timeout.count());
        assert_eq!(counters.error.get("https://x.com/slow"), 1);
    }

    #[test]
    fn test_reconcile_lifts_error_total() {
        let mut counters = Counters::new();
        counters.timeout = Tally::from_parts(3, BTreeMap::new());
        counters.error = Tally::from_parts(0, BTreeMap::new());

        counters.reconcile();
        assert_eq!(counters.error.count(), 3);

        counters.error.record("https://x.com/broken");
        counters.reconcile();
        assert_eq!(counters.error.count(), 4);
    }

    #[test]
    fn test_from_parts_keeps_total() {
        let mut urls = BTreeMap::new();
        urls.insert("a".to_string(), 2);
        let tally = Tally::from_parts(0, urls);
        assert_eq!(tally.count(), 0);
        assert_eq!(tally.iter().collect::<Vec<_>>(), vec![("a", 2)]);
        assert!(!tally.is_empty());
    }
}
