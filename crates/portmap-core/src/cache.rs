use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::port::{Port, PortId};
use crate::resolver::{IndexUnavailable, MediaLookup, ResolvedMedia};

/// Per-port media results, kept for the session.
///
/// Only successful lookups are stored; a port whose lookup failed is looked
/// up again next time. Two threads opening the same uncached port may both
/// run the lookup; lookups are idempotent and the first stored result wins.
#[derive(Default)]
pub struct MediaCache {
    entries: Mutex<HashMap<PortId, Arc<ResolvedMedia>>>,
}

impl MediaCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: PortId) -> Option<Arc<ResolvedMedia>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.get(&id).cloned()
    }

    pub fn get_or_lookup(
        &self,
        port: &Port,
        lookup: &dyn MediaLookup,
    ) -> Result<Arc<ResolvedMedia>, IndexUnavailable> {
        if let Some(hit) = self.get(port.id) {
            return Ok(hit);
        }
        let media = Arc::new(lookup.lookup(&port.media_dir)?);
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.entry(port.id).or_insert(media).clone())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct CountingLookup {
        calls: AtomicU64,
        fail: bool,
    }

    impl MediaLookup for CountingLookup {
        fn lookup(&self, folder: &str) -> Result<ResolvedMedia, IndexUnavailable> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(IndexUnavailable("offline".to_string()));
            }
            Ok(ResolvedMedia {
                photos: vec![format!("fotos/{folder}/a.jpg")],
                folder_used: folder.to_string(),
                found: true,
                ..ResolvedMedia::default()
            })
        }
    }

    fn port(id: usize, media_dir: &str) -> Port {
        Port {
            id: PortId(id),
            name: media_dir.to_string(),
            media_dir: media_dir.to_string(),
            lon: -44.1,
            lat: -2.4,
            attributes: Vec::new(),
        }
    }

    #[test]
    fn test_second_open_is_cached() {
        let lookup = CountingLookup { calls: AtomicU64::new(0), fail: false };
        let cache = MediaCache::new();
        let a = port(0, "A");

        let first = cache.get_or_lookup(&a, &lookup).unwrap();
        let second = cache.get_or_lookup(&a, &lookup).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 1);

        // Same folder, different port: its own entry
        cache.get_or_lookup(&port(1, "A"), &lookup).unwrap();
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_failures_are_not_cached() {
        let lookup = CountingLookup { calls: AtomicU64::new(0), fail: true };
        let cache = MediaCache::new();
        let a = port(0, "A");

        assert!(cache.get_or_lookup(&a, &lookup).is_err());
        assert!(cache.get_or_lookup(&a, &lookup).is_err());
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
        assert!(cache.get(a.id).is_none());
    }
}
