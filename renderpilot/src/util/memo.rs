use std::collections::HashMap;
use std::hash::Hash;

/// Input-to-output cache with no eviction.
///
/// Each distinct key is computed at most once over the memoizer's lifetime.
///
/// ```
/// use renderpilot::util::Memoizer;
///
/// let mut squares = Memoizer::new();
/// assert_eq!(*squares.get(12u32, |x| x * x), 144);
/// assert_eq!(*squares.get(12u32, |_| unreachable!()), 144);
/// assert_eq!(squares.computations(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Memoizer<K, V> {
    entries: HashMap<K, V>,
    computations: u64,
}

impl<K: Eq + Hash, V> Memoizer<K, V> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            computations: 0,
        }
    }

    /// Look up `input`, computing it on first sight.
    pub fn get<F>(&mut self, input: K, compute: F) -> &V
    where
        F: FnOnce(&K) -> V,
    {
        let computations = &mut self.computations;
        self.entries.entry(input).or_insert_with_key(|key| {
            *computations += 1;
            compute(key)
        })
    }

    /// Look up `input` under a derived key.
    ///
    /// Inputs that map to the same key share one computation.
    pub fn get_with_key<I, KF, F>(&mut self, input: &I, key_fn: KF, compute: F) -> &V
    where
        I: ?Sized,
        KF: FnOnce(&I) -> K,
        F: FnOnce(&I) -> V,
    {
        let computations = &mut self.computations;
        self.entries.entry(key_fn(input)).or_insert_with(|| {
            *computations += 1;
            compute(input)
        })
    }

    /// Whether a key has been computed.
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of computations performed.
    pub fn computations(&self) -> u64 {
        self.computations
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget every entry. The computation counter is kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<K: Eq + Hash, V> Default for Memoizer<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_computes_once_per_key() {
        let mut memo = Memoizer::new();
        for _ in 0..3 {
            for n in 0..5u64 {
                assert_eq!(*memo.get(n, |n| n * 10), n * 10);
            }
        }
        assert_eq!(memo.computations(), 5);
        assert_eq!(memo.len(), 5);
    }

    #[test]
    fn test_custom_key_groups_inputs() {
        let mut memo: Memoizer<usize, String> = Memoizer::new();
        let first = memo
            .get_with_key("apple", |s: &str| s.len(), |s| s.to_uppercase())
            .clone();
        let second = memo
            .get_with_key("grape", |s: &str| s.len(), |s| s.to_uppercase())
            .clone();

        assert_eq!(first, "APPLE");
        // Same length, same key: the cached value wins.
        assert_eq!(second, "APPLE");
        assert_eq!(memo.computations(), 1);
    }

    #[test]
    fn test_clear_forces_recompute() {
        let mut memo = Memoizer::new();
        memo.get("a".to_string(), |s| s.len());
        assert!(memo.contains(&"a".to_string()));
        memo.clear();
        assert!(memo.is_empty());
        memo.get("a".to_string(), |s| s.len());
        assert_eq!(memo.computations(), 2);
    }
}
