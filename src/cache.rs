//! Semantic result cache
//!
//! Caches retrieval results under a normalized form of the question text.
//! Normalization makes the cache a lossy, approximate index rather than an
//! exact map: queries differing only in case, whitespace or punctuation land
//! on the same key, and `get` additionally accepts fuzzy near-duplicates via
//! substring containment and a cheap character-overlap score. Under sustained
//! provider overload the cache can serve its most recent unexpired entry as a
//! stale stand-in instead of failing outright.

use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Cached keys shorter than this never participate in fuzzy matching; on
/// short strings the overlap score is mostly false positives.
const MIN_FUZZY_KEY_CHARS: usize = 10;
const SIMILARITY_THRESHOLD: f64 = 0.8;

#[derive(Debug, Clone)]
struct CacheEntry {
    result: String,
    created_at: Instant,
}

/// TTL-bounded, capacity-swept result cache keyed by normalized question text.
pub struct SemanticCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
    capacity: usize,
}

impl SemanticCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            capacity,
        }
    }

    /// Looks up a result: exact normalized-key match first, then a fuzzy scan
    /// over unexpired entries.
    pub async fn get(&self, question: &str) -> Option<String> {
        let key = normalize_key(question);
        let entries = self.entries.lock().await;

        if let Some(entry) = entries.get(&key) {
            if entry.created_at.elapsed() < self.ttl {
                debug!("cache hit (exact) for key: {}", key);
                return Some(entry.result.clone());
            }
        }

        for (cached_key, entry) in entries.iter() {
            if entry.created_at.elapsed() >= self.ttl {
                continue;
            }
            if cached_key.chars().count() > MIN_FUZZY_KEY_CHARS
                && (key.contains(cached_key.as_str())
                    || cached_key.contains(key.as_str())
                    || char_overlap(cached_key, &key) > SIMILARITY_THRESHOLD)
            {
                debug!("cache hit (fuzzy) for key: {}", cached_key);
                return Some(entry.result.clone());
            }
        }

        None
    }

    /// Stores a result. Exceeding capacity triggers a sweep of TTL-expired
    /// entries.
    pub async fn put(&self, question: &str, result: &str) {
        let key = normalize_key(question);
        let mut entries = self.entries.lock().await;
        entries.insert(
            key,
            CacheEntry {
                result: result.to_string(),
                created_at: Instant::now(),
            },
        );

        if entries.len() > self.capacity {
            let before = entries.len();
            let ttl = self.ttl;
            entries.retain(|_, entry| entry.created_at.elapsed() <= ttl);
            debug!(
                "cache swept: removed {} entries, {} remaining",
                before - entries.len(),
                entries.len()
            );
        }
    }

    /// Degraded path under sustained overload: the most-recently-created
    /// unexpired entry of any key, if one exists.
    pub async fn most_recent(&self) -> Option<String> {
        let entries = self.entries.lock().await;
        entries
            .values()
            .filter(|entry| entry.created_at.elapsed() < self.ttl)
            .max_by_key(|entry| entry.created_at)
            .map(|entry| entry.result.clone())
    }
}

/// Lowercases, trims, collapses whitespace and strips sentence punctuation.
pub fn normalize_key(text: &str) -> String {
    let lowered = text.trim().to_lowercase();
    let collapsed = lowered.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .chars()
        .filter(|c| !matches!(c, '?' | '!' | '.' | ',' | ';' | ':' | '-'))
        .collect()
}

/// Order-insensitive character-overlap score: the share of the shorter
/// string's characters found anywhere in the longer one, over the longer
/// length. Cheap and deliberately tolerant of reordering; known to produce
/// false positives on short strings, which the caller's length gate absorbs.
fn char_overlap(a: &str, b: &str) -> f64 {
    let a_len = a.chars().count();
    let b_len = b.chars().count();
    let (longer, shorter, longer_len) = if a_len >= b_len {
        (a, b, a_len)
    } else {
        (b, a, b_len)
    };
    if longer_len == 0 {
        return 1.0;
    }
    let matches = shorter.chars().filter(|c| longer.contains(*c)).count();
    matches as f64 / longer_len as f64
}
