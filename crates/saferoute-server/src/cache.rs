use dashmap::DashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

pub trait CacheEntry {
    fn touched_at(&self) -> Instant;
}

/// Drop entries idle for longer than `max_age`, then the least recently
/// touched ones until at most `max_entries` remain.
pub fn prune_cache<K, V>(cache: &DashMap<K, V>, max_entries: usize, max_age: Duration)
where
    K: Clone + Eq + Hash,
    V: CacheEntry,
{
    let now = Instant::now();
    cache.retain(|_, value| now.duration_since(value.touched_at()) <= max_age);

    if cache.len() <= max_entries {
        return;
    }

    let mut entries: Vec<(K, Instant)> = cache
        .iter()
        .map(|entry| (entry.key().clone(), entry.value().touched_at()))
        .collect();
    entries.sort_by_key(|(_, touched_at)| *touched_at);
    let excess = cache.len().saturating_sub(max_entries);
    for (key, _) in entries.into_iter().take(excess) {
        cache.remove(&key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Touched(Instant);

    impl CacheEntry for Touched {
        fn touched_at(&self) -> Instant {
            self.0
        }
    }

    #[test]
    fn prunes_oldest_beyond_capacity() {
        let cache = DashMap::new();
        let start = Instant::now();
        for i in 0..5u64 {
            cache.insert(i, Touched(start + Duration::from_millis(i)));
        }

        prune_cache(&cache, 3, Duration::from_secs(60));

        assert_eq!(cache.len(), 3);
        assert!(!cache.contains_key(&0));
        assert!(!cache.contains_key(&1));
        assert!(cache.contains_key(&4));
    }
}
