use crate::domain::Envelope;
use std::collections::VecDeque;

/// FIFO of envelopes promoted for upload.
///
/// A promoted batch may overshoot the capacity while the cache is locked;
/// every flush drains it with [`ShipCache::take`] before releasing the lock.
#[derive(Debug)]
pub struct ShipCache {
    entries: VecDeque<Envelope>,
    capacity: usize,
}

impl ShipCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends a whole batch at the back, preserving its order.
    pub fn promote(&mut self, batch: Vec<Envelope>) {
        self.entries.extend(batch);
    }

    /// Removes and returns every entry, oldest first.
    pub fn take(&mut self) -> Vec<Envelope> {
        self.entries.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Auth;

    fn envelope(content: &str) -> Envelope {
        Envelope::new(
            Auth {
                project: "p".to_string(),
                user: "u".to_string(),
                sign: "s".to_string(),
            },
            content.to_string(),
        )
    }

    fn contents(envelopes: &[Envelope]) -> Vec<&str> {
        envelopes.iter().map(Envelope::content).collect()
    }

    #[test]
    fn take_returns_entries_in_promotion_order() {
        let mut cache = ShipCache::new(10);
        cache.promote(vec![envelope("a"), envelope("b")]);
        cache.promote(vec![envelope("c")]);

        let taken = cache.take();
        assert_eq!(contents(&taken), vec!["a", "b", "c"]);
        assert!(cache.is_empty());
    }

    #[test]
    fn take_leaves_cache_within_capacity() {
        let mut cache = ShipCache::new(2);
        cache.promote(vec![envelope("a"), envelope("b"), envelope("c"), envelope("d")]);
        assert_eq!(cache.len(), 4);

        assert_eq!(contents(&cache.take()), vec!["a", "b", "c", "d"]);
        assert!(cache.len() <= cache.capacity());
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        assert_eq!(ShipCache::new(0).capacity(), 1);
    }
}
