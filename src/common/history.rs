//! Capped, append-only history with batch eviction

/// Ordered history that drops its oldest entries in batches
///
/// Once an append pushes the length past `max_capacity`, the oldest
/// `evict_count` entries are removed in a single `drain`, so the cost of
/// eviction is paid once per `evict_count` appends instead of on every one.
#[derive(Debug, Clone)]
pub struct BoundedHistory<T> {
    entries: Vec<T>,
    max_capacity: usize,
    evict_count: usize,
}

impl<T> BoundedHistory<T> {
    /// Create an empty history
    ///
    /// `max_capacity` and `evict_count` are raised to at least 1 so the
    /// length can never exceed the cap.
    pub fn new(max_capacity: usize, evict_count: usize) -> Self {
        let max_capacity = max_capacity.max(1);
        Self {
            entries: Vec::with_capacity(max_capacity + 1),
            max_capacity,
            evict_count: evict_count.max(1),
        }
    }

    /// Append an entry, evicting a batch of the oldest when over capacity
    ///
    /// Returns the number of entries evicted.
    pub fn push(&mut self, entry: T) -> usize {
        self.entries.push(entry);
        if self.entries.len() > self.max_capacity {
            let evicted = self.evict_count.min(self.entries.len());
            self.entries.drain(..evicted);
            return evicted;
        }
        0
    }

    pub fn as_slice(&self) -> &[T] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&T> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_capacity(&self) -> usize {
        self.max_capacity
    }

    pub fn evict_count(&self) -> usize {
        self.evict_count
    }
}

impl<T: Clone> BoundedHistory<T> {
    pub fn to_vec(&self) -> Vec<T> {
        self.entries.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_never_exceeds_capacity() {
        let mut history = BoundedHistory::new(5, 2);
        for i in 0..100 {
            history.push(i);
            assert!(history.len() <= 5);
        }
    }

    #[test]
    fn test_evicts_exact_batch_when_exceeded() {
        let mut history = BoundedHistory::new(4, 3);
        for i in 0..4 {
            assert_eq!(history.push(i), 0);
        }
        assert_eq!(history.as_slice(), &[0, 1, 2, 3]);

        // Fifth append exceeds the cap: exactly three oldest go
        assert_eq!(history.push(4), 3);
        assert_eq!(history.as_slice(), &[3, 4]);
    }

    #[test]
    fn test_keeps_insertion_order() {
        let mut history = BoundedHistory::new(3, 1);
        for i in 0..6 {
            history.push(i);
        }
        assert_eq!(history.to_vec(), vec![3, 4, 5]);
        assert_eq!(history.last(), Some(&5));
    }

    #[test]
    fn test_zero_parameters_are_raised() {
        let mut history = BoundedHistory::new(0, 0);
        assert_eq!(history.max_capacity(), 1);
        assert_eq!(history.evict_count(), 1);
        history.push('a');
        history.push('b');
        assert_eq!(history.as_slice(), &['b']);
    }
}
