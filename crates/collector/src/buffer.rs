//! Batching buffer for raw items.

use normalizer::schema::RawItem;

/// Accumulates raw items and flushes them as one ordered batch when the
/// configured threshold is reached.
///
/// Lives in a single producing context; not thread-shared.
#[derive(Debug)]
pub struct BatchBuffer {
    items: Vec<RawItem>,
    threshold: usize,
}

impl BatchBuffer {
    /// Create a buffer with the given flush threshold (validated ≥ 1 by
    /// the configuration layer).
    pub fn new(threshold: usize) -> Self {
        Self {
            items: Vec::with_capacity(threshold),
            threshold,
        }
    }

    /// Append one item. Returns the full drained batch, in insertion
    /// order, exactly when the buffer reaches the threshold.
    pub fn add(&mut self, item: RawItem) -> Option<Vec<RawItem>> {
        self.items.push(item);
        if self.items.len() < self.threshold {
            return None;
        }
        self.flush()
    }

    /// Drain and return the buffered items, or `None` when empty.
    pub fn flush(&mut self) -> Option<Vec<RawItem>> {
        if self.items.is_empty() {
            return None;
        }
        Some(std::mem::take(&mut self.items))
    }

    /// End-of-stream flush: fewer than `threshold` items may remain when
    /// the source terminates. This is the only path that bypasses the
    /// size threshold.
    pub fn on_source_end(&mut self) -> Option<Vec<RawItem>> {
        self.flush()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(rank: u32) -> RawItem {
        RawItem {
            rank,
            name: Some(format!("asset-{rank}")),
            symbol: None,
            price: None,
            change_1h: None,
            change_24h: None,
            change_7d: None,
            market_cap: None,
            volume_24h: None,
            circulating_supply: None,
            logo_url: None,
            timestamp: None,
        }
    }

    #[test]
    fn test_reaching_threshold_flushes_exactly_once_in_order() {
        let mut buffer = BatchBuffer::new(3);

        assert!(buffer.add(item(1)).is_none());
        assert!(buffer.add(item(2)).is_none());
        let batch = buffer.add(item(3)).expect("third add must flush");

        assert_eq!(
            batch.iter().map(|i| i.rank).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert!(buffer.is_empty());

        // The next add starts a fresh batch.
        assert!(buffer.add(item(4)).is_none());
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_below_threshold_does_not_flush() {
        let mut buffer = BatchBuffer::new(10);
        for rank in 1..=9 {
            assert!(buffer.add(item(rank)).is_none());
        }
        assert_eq!(buffer.len(), 9);
    }

    #[test]
    fn test_source_end_flushes_remainder() {
        let mut buffer = BatchBuffer::new(10);
        buffer.add(item(1));
        buffer.add(item(2));

        let batch = buffer.on_source_end().expect("remainder must flush");
        assert_eq!(batch.len(), 2);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_source_end_on_empty_buffer_produces_nothing() {
        let mut buffer = BatchBuffer::new(10);
        assert!(buffer.on_source_end().is_none());
    }

    #[test]
    fn test_threshold_of_one_flushes_every_add() {
        let mut buffer = BatchBuffer::new(1);
        let batch = buffer.add(item(1)).expect("must flush immediately");
        assert_eq!(batch.len(), 1);
        assert!(buffer.is_empty());
    }
}
