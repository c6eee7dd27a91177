//! Deduplication ledger
//!
//! Tracks every admitted `(url, trigger id)` pair with a pair of revisit
//! counters. Whole-URL repeats and same-page fragment views are told apart so
//! that single-page applications neither explode the frontier nor collapse
//! every fragment-addressed view into one page.

use crate::url::split_fragment;
use std::collections::BTreeMap;

/// Counter pair kept per `(url, trigger id)`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerEntry {
    /// Times this exact pair was seen again after admission
    pub revisit_count: u64,

    /// Times a new fragment view of this URL was discovered
    pub fragment_revisit_count: u64,
}

/// Outcome of admitting a discovered link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// First sighting; a node should be created
    New,
    /// Exact pair already admitted
    Duplicate,
    /// Fragment view already admitted
    FragmentDuplicate,
}

/// Ledger of admitted URLs keyed by canonical URL, then trigger id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DedupLedger {
    entries: BTreeMap<String, BTreeMap<Option<String>, LedgerEntry>>,
    duplicate_count: u64,
}

impl DedupLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admits a canonical URL, deciding whether it becomes a new node
    ///
    /// 1. An already recorded pair is a `Duplicate` (or `FragmentDuplicate`
    ///    when the URL carries a trailing fragment); its revisit counter and
    ///    the global duplicate tally go up by one.
    /// 2. A first-seen fragment URL is `New`. If its base URL is already
    ///    recorded for the same trigger, the base's fragment counter goes up;
    ///    otherwise the base is recorded with zero counters.
    /// 3. Anything else is recorded with zero counters and is `New`.
    ///
    /// The check and the insert happen under one `&mut self`, so admission is
    /// atomic for whoever owns the ledger.
    pub fn admit(&mut self, url: &str, trigger_id: Option<&str>) -> Decision {
        let key = trigger_id.map(str::to_string);
        let fragment = split_fragment(url);

        if let Some(entry) = self.entries.get_mut(url).and_then(|m| m.get_mut(&key)) {
            entry.revisit_count += 1;
            self.duplicate_count += 1;
            return if fragment.is_some() {
                Decision::FragmentDuplicate
            } else {
                Decision::Duplicate
            };
        }

        if let Some((base, _)) = fragment {
            let base_entries = self.entries.entry(base.to_string()).or_default();
            match base_entries.get_mut(&key) {
                Some(base_entry) => base_entry.fragment_revisit_count += 1,
                None => {
                    base_entries.insert(key.clone(), LedgerEntry::default());
                }
            }
        }

        self.entries
            .entry(url.to_string())
            .or_default()
            .insert(key, LedgerEntry::default());
        Decision::New
    }

    /// Records a pair without classifying it (used for the root node)
    ///
    /// Returns false if the pair was already present.
    pub fn record(&mut self, url: &str, trigger_id: Option<&str>) -> bool {
        let key = trigger_id.map(str::to_string);
        let entries = self.entries.entry(url.to_string()).or_default();
        if entries.contains_key(&key) {
            return false;
        }
        entries.insert(key, LedgerEntry::default());
        true
    }

    /// Restores a persisted entry verbatim
    pub fn restore(&mut self, url: String, trigger_id: Option<String>, entry: LedgerEntry) {
        self.entries.entry(url).or_default().insert(trigger_id, entry);
    }

    pub fn contains(&self, url: &str, trigger_id: Option<&str>) -> bool {
        self.entry(url, trigger_id).is_some()
    }

    pub fn entry(&self, url: &str, trigger_id: Option<&str>) -> Option<&LedgerEntry> {
        let key = trigger_id.map(str::to_string);
        self.entries.get(url).and_then(|m| m.get(&key))
    }

    /// Total duplicate and fragment-duplicate sightings
    pub fn duplicate_count(&self) -> u64 {
        self.duplicate_count
    }

    pub fn set_duplicate_count(&mut self, count: u64) {
        self.duplicate_count = count;
    }

    /// Number of recorded `(url, trigger id)` pairs
    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates entries in url, then trigger id order
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>, &LedgerEntry)> {
        self.entries.iter().flat_map(|(url, triggers)| {
            triggers
                .iter()
                .map(move |(trigger, entry)| (url.as_str(), trigger.as_deref(), entry))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idempotent_admission() {
        let mut ledger = DedupLedger::new();
        assert_eq!(ledger.admit("https://x.com/a", None), Decision::New);
        assert_eq!(ledger.admit("https://x.com/a", None), Decision::Duplicate);
        assert_eq!(ledger.duplicate_count(), 1);
        assert_eq!(ledger.entry("https://x.com/a", None).unwrap().revisit_count, 1);

        for _ in 0..3 {
            assert_eq!(ledger.admit("https://x.com/a", None), Decision::Duplicate);
        }
        assert_eq!(ledger.duplicate_count(), 4);
        assert_eq!(ledger.entry("https://x.com/a", None).unwrap().revisit_count, 4);
    }

    #[test]
    fn test_fragment_isolation() {
        let mut ledger = DedupLedger::new();
        assert_eq!(ledger.admit("https://x/page", None), Decision::New);
        assert_eq!(ledger.admit("https://x/page#a", None), Decision::New);
        assert_eq!(
            ledger.admit("https://x/page#a", None),
            Decision::FragmentDuplicate
        );

        let base = ledger.entry("https://x/page", None).unwrap();
        assert_eq!(base.fragment_revisit_count, 1);
        assert_eq!(base.revisit_count, 0);
        assert!(ledger.contains("https://x/page#a", None));
    }

    #[test]
    fn test_fragment_first_records_base() {
        let mut ledger = DedupLedger::new();
        assert_eq!(ledger.admit("https://x/page#b", None), Decision::New);
        assert_eq!(
            ledger.entry("https://x/page", None),
            Some(&LedgerEntry::default())
        );
        assert_eq!(ledger.admit("https://x/page", None), Decision::Duplicate);
    }

    #[test]
    fn test_distinct_fragments_are_each_new() {
        let mut ledger = DedupLedger::new();
        ledger.admit("https://x/page", None);
        assert_eq!(ledger.admit("https://x/page#a", None), Decision::New);
        assert_eq!(ledger.admit("https://x/page#b", None), Decision::New);
        assert_eq!(
            ledger.entry("https://x/page", None).unwrap().fragment_revisit_count,
            2
        );
    }

    #[test]
    fn test_trigger_ids_are_independent() {
        let mut ledger = DedupLedger::new();
        assert_eq!(ledger.admit("https://x/app#", None), Decision::New);
        assert_eq!(ledger.admit("https://x/app#", Some("tab-1")), Decision::New);
        assert_eq!(ledger.admit("https://x/app#", Some("tab-2")), Decision::New);
        assert_eq!(
            ledger.admit("https://x/app#", Some("tab-1")),
            Decision::Duplicate
        );
        assert_eq!(ledger.len(), 3);
    }

    #[test]
    fn test_record_root() {
        let mut ledger = DedupLedger::new();
        assert!(ledger.record("https://x.com", None));
        assert!(!ledger.record("https://x.com", None));
        assert_eq!(ledger.admit("https://x.com", None), Decision::Duplicate);
    }

    #[test]
    fn test_iter_order() {
        let mut ledger = DedupLedger::new();
        ledger.admit("https://x/b", None);
        ledger.admit("https://x/a", Some("t"));
        ledger.admit("https://x/a", None);

        let keys: Vec<_> = ledger.iter().map(|(u, t, _)| (u, t)).collect();
        assert_eq!(
            keys,
            vec![
                ("https://x/a", None),
                ("https://x/a", Some("t")),
                ("https://x/b", None)
            ]
        );
    }
}
