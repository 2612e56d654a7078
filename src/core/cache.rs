//! In-memory prompt cache with LRU eviction and a TTL.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::task::Planner;

struct Entry {
    tasks: Planner,
    inserted: Instant,
    last_used: u64,
}

struct Inner {
    entries: HashMap<String, Entry>,
    clock: u64,
}

/// Cache of generated plans keyed by model and normalized prompt.
pub struct PlanCache {
    inner: Mutex<Inner>,
    capacity: usize,
    ttl: Duration,
}

impl std::fmt::Debug for PlanCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanCache")
            .field("capacity", &self.capacity)
            .field("ttl", &self.ttl)
            .field("len", &self.len())
            .finish()
    }
}

impl PlanCache {
    /// Create a cache holding at most `capacity` plans for `ttl` each.
    ///
    /// A capacity of zero disables caching.
    #[must_use]
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                clock: 0,
            }),
            capacity,
            ttl,
        }
    }

    /// Look up a fresh plan, refreshing its recency.
    #[must_use]
    pub fn get(&self, model: &str, prompt: &str) -> Option<Planner> {
        let key = cache_key(model, prompt);
        let mut inner = self.inner.lock();
        inner.clock += 1;
        let now = inner.clock;

        match inner.entries.get_mut(&key) {
            None => return None,
            Some(entry) if entry.inserted.elapsed() <= self.ttl => {
                entry.last_used = now;
                return Some(entry.tasks.clone());
            }
            Some(_) => {}
        }

        inner.entries.remove(&key);
        None
    }

    /// Store a plan, evicting the least recently used entry when full.
    pub fn insert(&self, model: &str, prompt: &str, tasks: Planner) {
        if self.capacity == 0 {
            return;
        }

        let key = cache_key(model, prompt);
        let mut inner = self.inner.lock();
        inner.clock += 1;
        let now = inner.clock;

        if !inner.entries.contains_key(&key) && inner.entries.len() >= self.capacity {
            let ttl = self.ttl;
            inner.entries.retain(|_, e| e.inserted.elapsed() <= ttl);

            if inner.entries.len() >= self.capacity {
                let oldest = inner
                    .entries
                    .iter()
                    .min_by_key(|(_, e)| e.last_used)
                    .map(|(k, _)| k.clone());
                if let Some(oldest) = oldest {
                    inner.entries.remove(&oldest);
                }
            }
        }

        inner.entries.insert(
            key,
            Entry {
                tasks,
                inserted: Instant::now(),
                last_used: now,
            },
        );
    }

    /// Number of cached plans (including not-yet-purged expired ones).
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.inner.lock().entries.clear();
    }
}

/// Normalize a prompt so trivially different phrasings share an entry.
#[must_use]
pub fn normalize_prompt(prompt: &str) -> String {
    prompt
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn cache_key(model: &str, prompt: &str) -> String {
    format!("{model}\u{0}{}", normalize_prompt(prompt))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::task::Task;

    const MODEL: &str = "gemini-2.5-flash";

    fn plan(name: &str) -> Planner {
        vec![Task::new(name, "09:00", "10:00")]
    }

    #[test]
    fn normalizes_whitespace_and_case() {
        assert_eq!(
            normalize_prompt("  Plan   my\tSaturday \n"),
            "plan my saturday"
        );
    }

    #[test]
    fn hit_after_insert_with_equivalent_prompt() {
        let cache = PlanCache::new(4, Duration::from_secs(60));
        cache.insert(MODEL, "Plan my day", plan("a"));

        let hit = cache.get(MODEL, "plan   MY day").unwrap();
        assert_eq!(hit[0].task_name, "a");
    }

    #[test]
    fn model_is_part_of_the_key() {
        let cache = PlanCache::new(4, Duration::from_secs(60));
        cache.insert(MODEL, "plan my day", plan("a"));
        assert!(cache.get("gemini-2.5-pro", "plan my day").is_none());
    }

    #[test]
    fn evicts_least_recently_used() {
        let cache = PlanCache::new(2, Duration::from_secs(60));
        cache.insert(MODEL, "one", plan("1"));
        cache.insert(MODEL, "two", plan("2"));

        // Touch "one" so "two" becomes the eviction candidate
        assert!(cache.get(MODEL, "one").is_some());
        cache.insert(MODEL, "three", plan("3"));

        assert_eq!(cache.len(), 2);
        assert!(cache.get(MODEL, "one").is_some());
        assert!(cache.get(MODEL, "two").is_none());
        assert!(cache.get(MODEL, "three").is_some());
    }

    #[test]
    fn reinserting_existing_key_does_not_evict() {
        let cache = PlanCache::new(2, Duration::from_secs(60));
        cache.insert(MODEL, "one", plan("1"));
        cache.insert(MODEL, "two", plan("2"));
        cache.insert(MODEL, "one", plan("1b"));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(MODEL, "one").unwrap()[0].task_name, "1b");
        assert!(cache.get(MODEL, "two").is_some());
    }

    #[test]
    fn expired_entries_are_dropped() {
        let cache = PlanCache::new(4, Duration::ZERO);
        cache.insert(MODEL, "one", plan("1"));
        std::thread::sleep(Duration::from_millis(5));

        assert!(cache.get(MODEL, "one").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn zero_capacity_disables_caching() {
        let cache = PlanCache::new(0, Duration::from_secs(60));
        cache.insert(MODEL, "one", plan("1"));
        assert!(cache.is_empty());
        assert!(cache.get(MODEL, "one").is_none());
    }

    #[test]
    fn clear_empties_cache() {
        let cache = PlanCache::new(4, Duration::from_secs(60));
        cache.insert(MODEL, "one", plan("1"));
        cache.clear();
        assert!(cache.is_empty());
    }
}
