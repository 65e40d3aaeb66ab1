//! Reference operation cache with fingerprint keys and TTL eviction.
//!
//! Verifying many candidates against the same reference would otherwise
//! re-normalize the reference IR every time. The cache maps a fingerprint
//! of (language, reference source) to the reference's operation histogram.
//!
//! Keys are the first 8 bytes of a blake3 hash; every entry also stores the
//! full 32-byte hash and re-checks it on lookup, so a truncated-key
//! collision falls through to a recompute instead of returning a wrong
//! histogram. The eviction sweep is opportunistic: it runs when a writer
//! observes the map above the soft size limit, and costs one pass over the
//! entries. Concurrent readers and writers go through `DashMap`;
//! last-writer-wins on key collision.

use std::time::{Duration, Instant};

use dashmap::DashMap;

use codejudge_tac::OpHistogram;

#[derive(Debug, Clone)]
struct CacheEntry {
    content_hash: blake3::Hash,
    histogram: OpHistogram,
    inserted_at: Instant,
}

/// Process-scoped cache of reference operation histograms.
pub struct ReferenceCache {
    entries: DashMap<u64, CacheEntry>,
    ttl: Duration,
    soft_limit: usize,
}

impl ReferenceCache {
    pub fn new(ttl: Duration, soft_limit: usize) -> Self {
        ReferenceCache {
            entries: DashMap::new(),
            ttl,
            soft_limit,
        }
    }

    fn fingerprint(language: &str, source: &str) -> (u64, blake3::Hash) {
        let mut hasher = blake3::Hasher::new();
        hasher.update(language.as_bytes());
        hasher.update(&[0]);
        hasher.update(source.as_bytes());
        let hash = hasher.finalize();
        let mut key = [0u8; 8];
        key.copy_from_slice(&hash.as_bytes()[..8]);
        (u64::from_le_bytes(key), hash)
    }

    /// Returns the cached histogram for (language, source), computing and
    /// inserting it on a miss or an expired hit.
    pub fn get_or_insert_with(
        &self,
        language: &str,
        source: &str,
        compute: impl FnOnce() -> OpHistogram,
    ) -> OpHistogram {
        self.get_or_insert_at(Instant::now(), language, source, compute)
    }

    fn get_or_insert_at(
        &self,
        now: Instant,
        language: &str,
        source: &str,
        compute: impl FnOnce() -> OpHistogram,
    ) -> OpHistogram {
        let (key, content_hash) = Self::fingerprint(language, source);

        if let Some(entry) = self.entries.get(&key) {
            if entry.content_hash == content_hash
                && now.duration_since(entry.inserted_at) < self.ttl
            {
                return entry.histogram;
            }
        }

        let histogram = compute();
        self.entries.insert(
            key,
            CacheEntry {
                content_hash,
                histogram,
                inserted_at: now,
            },
        );
        if self.entries.len() > self.soft_limit {
            self.sweep_at(now);
        }
        histogram
    }

    /// Removes entries older than the TTL; returns how many were evicted.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    fn sweep_at(&self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| now.duration_since(entry.inserted_at) < self.ttl);
        let evicted = before - self.entries.len();
        if evicted > 0 {
            tracing::info!("swept {} expired reference fingerprint(s)", evicted);
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
