use parking_lot::RwLock;
use std::collections::HashMap;

use crate::stemmer::stem;

/// Memo of raw term -> stem, shared by index building and query evaluation.
///
/// Entries are only ever added. A hit is returned as stored; the stemmer is
/// not re-run to check it. Concurrent misses on the same term all compute the
/// same stem, so whichever insert lands first is kept.
#[derive(Debug, Default)]
pub struct NormalizationCache {
    stems: RwLock<HashMap<String, String>>,
}

impl NormalizationCache {
    pub fn new() -> Self { Self::default() }

    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self { stems: RwLock::new(pairs.into_iter().collect()) }
    }

    /// Stem of `raw`, computing and remembering it on a miss.
    pub fn normalize(&self, raw: &str) -> String {
        if let Some(cached) = self.stems.read().get(raw) {
            return cached.clone();
        }
        let computed = stem(raw);
        self.stems
            .write()
            .entry(raw.to_string())
            .or_insert_with(|| computed.clone());
        computed
    }

    pub fn get(&self, raw: &str) -> Option<String> {
        self.stems.read().get(raw).cloned()
    }

    pub fn len(&self) -> usize { self.stems.read().len() }

    pub fn is_empty(&self) -> bool { self.stems.read().is_empty() }

    /// All pairs sorted by raw term, for writing back to disk.
    pub fn snapshot(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .stems
            .read()
            .iter()
            .map(|(raw, stem)| (raw.clone(), stem.clone()))
            .collect();
        pairs.sort();
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn miss_computes_and_stores() {
        let cache = NormalizationCache::new();
        assert_eq!(cache.normalize("running"), "run");
        assert_eq!(cache.get("running").as_deref(), Some("run"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn hit_returns_stored_value_without_restemming() {
        // A stored value wins even when it disagrees with the algorithm.
        let cache = NormalizationCache::from_pairs([("running".to_string(), "runn".to_string())]);
        assert_eq!(cache.normalize("running"), "runn");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn snapshot_is_sorted() {
        let cache = NormalizationCache::new();
        cache.normalize("zebras");
        cache.normalize("apples");
        let raws: Vec<String> = cache.snapshot().into_iter().map(|(raw, _)| raw).collect();
        assert_eq!(raws, vec!["apples", "zebras"]);
    }

    #[test]
    fn concurrent_misses_agree() {
        let cache = Arc::new(NormalizationCache::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || cache.normalize("generalization"))
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), "gener");
        }
        assert_eq!(cache.len(), 1);
    }
}
