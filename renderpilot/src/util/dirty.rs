use std::collections::HashMap;
use std::fmt;

/// Forwards per-slot values downstream only when they change.
///
/// The writer is called with the slot name and the new value. A `set` with
/// the value last written for that slot is suppressed.
///
/// ```
/// use renderpilot::util::DirtyStateBatcher;
///
/// let mut written = Vec::new();
/// let mut batcher = DirtyStateBatcher::new(|name: &str, v: &f64| written.push((name.to_string(), *v)));
/// batcher.set("scale", 1.0);
/// batcher.set("scale", 1.0);
/// batcher.set("scale", 0.9);
/// assert_eq!(batcher.writes(), 2);
/// drop(batcher);
/// assert_eq!(written.len(), 2);
/// ```
pub struct DirtyStateBatcher<V, W>
where
    W: FnMut(&str, &V),
{
    last: HashMap<String, V>,
    writer: W,
    writes: u64,
    suppressed: u64,
}

impl<V, W> DirtyStateBatcher<V, W>
where
    V: PartialEq,
    W: FnMut(&str, &V),
{
    pub fn new(writer: W) -> Self {
        Self {
            last: HashMap::new(),
            writer,
            writes: 0,
            suppressed: 0,
        }
    }

    /// Write `value` to `name` unless it equals the last written value.
    /// Returns whether the writer ran.
    pub fn set(&mut self, name: &str, value: V) -> bool {
        if self.last.get(name) == Some(&value) {
            self.suppressed += 1;
            return false;
        }
        (self.writer)(name, &value);
        self.writes += 1;
        self.last.insert(name.to_string(), value);
        true
    }

    /// Forget a slot so its next `set` always writes.
    pub fn invalidate(&mut self, name: &str) {
        self.last.remove(name);
    }

    /// Forget every slot, e.g. after the downstream target was recreated.
    pub fn clear(&mut self) {
        self.last.clear();
    }

    /// Last value written to a slot.
    pub fn last(&self, name: &str) -> Option<&V> {
        self.last.get(name)
    }

    pub fn writes(&self) -> u64 {
        self.writes
    }

    pub fn suppressed(&self) -> u64 {
        self.suppressed
    }
}

impl<V: fmt::Debug, W: FnMut(&str, &V)> fmt::Debug for DirtyStateBatcher<V, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirtyStateBatcher")
            .field("last", &self.last)
            .field("writes", &self.writes)
            .field("suppressed", &self.suppressed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_equal_values_suppressed() {
        let log = RefCell::new(Vec::new());
        let mut batcher =
            DirtyStateBatcher::new(|name: &str, v: &i32| log.borrow_mut().push((name.to_string(), *v)));

        assert!(batcher.set("a", 1));
        assert!(!batcher.set("a", 1));
        assert!(batcher.set("b", 1));
        assert!(batcher.set("a", 2));
        assert!(!batcher.set("b", 1));

        assert_eq!(batcher.writes(), 3);
        assert_eq!(batcher.suppressed(), 2);
        assert_eq!(batcher.last("a"), Some(&2));
        drop(batcher);
        assert_eq!(
            log.into_inner(),
            vec![
                ("a".to_string(), 1),
                ("b".to_string(), 1),
                ("a".to_string(), 2)
            ]
        );
    }

    #[test]
    fn test_invalidate_forces_write() {
        let mut count = 0;
        let mut batcher = DirtyStateBatcher::new(|_: &str, _: &bool| count += 1);
        batcher.set("flag", true);
        batcher.invalidate("flag");
        assert!(batcher.set("flag", true));
        batcher.clear();
        assert!(batcher.set("flag", true));
        drop(batcher);
        assert_eq!(count, 3);
    }
}
