use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;

use lru::LruCache;

/// LRU cache from text to embedding vector.
///
/// Consulted before each embed call so re-runs over unchanged sources skip
/// the network entirely. Keys are 64-bit hashes of the input text; a
/// collision would serve the wrong vector, which is acceptable for a cache
/// at these sizes.
pub struct EmbeddingCache {
    entries: LruCache<u64, Vec<f32>>,
    hits: u64,
    misses: u64,
}

impl EmbeddingCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("capacity is at least 1");
        Self {
            entries: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    fn key(text: &str) -> u64 {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        hasher.finish()
    }

    pub fn get(&mut self, text: &str) -> Option<Vec<f32>> {
        match self.entries.get(&Self::key(text)) {
            Some(vector) => {
                self.hits += 1;
                Some(vector.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn put(&mut self, text: &str, embedding: Vec<f32>) {
        self.entries.put(Self::key(text), embedding);
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn miss_then_hit() {
        let mut cache = EmbeddingCache::new(16);
        assert!(cache.get("text").is_none());
        cache.put("text", vec![0.5; 4]);
        assert_eq!(cache.get("text").unwrap(), vec![0.5; 4]);
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);
    }

    #[test]
    fn capacity_evicts_oldest() {
        let mut cache = EmbeddingCache::new(2);
        cache.put("a", vec![1.0]);
        cache.put("b", vec![2.0]);
        cache.put("c", vec![3.0]);
        assert!(cache.get("a").is_none());
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let mut cache = EmbeddingCache::new(0);
        cache.put("x", vec![1.0]);
        assert!(cache.get("x").is_some());
    }
}
