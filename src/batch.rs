use std::time::{Duration, Instant};

use crate::search::common::LineDocument;

/// Pending documents waiting to be committed to the index.
///
/// Nothing in a batch is searchable until the indexer commits it.
#[derive(Debug)]
pub struct Batch {
    capacity: usize,
    documents: Vec<LineDocument>,
    started: Instant,
}

impl Batch {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            documents: Vec::with_capacity(capacity),
            started: Instant::now(),
        }
    }

    pub fn push(&mut self, document: LineDocument) {
        if self.documents.is_empty() {
            self.started = Instant::now();
        }
        self.documents.push(document);
    }

    pub fn is_full(&self) -> bool {
        self.documents.len() >= self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Time since the first pending document was added
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Take all pending documents, leaving the batch empty and reusable
    pub fn drain(&mut self) -> Vec<LineDocument> {
        std::mem::replace(&mut self.documents, Vec::with_capacity(self.capacity))
    }
}

/// Outcome of a load run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// True when an existing index was found and nothing was indexed
    pub skipped: bool,
    pub lines_indexed: u64,
    pub batches_flushed: usize,
    pub duration_ms: u64,
}

impl LoadReport {
    pub fn skipped() -> Self {
        Self {
            skipped: true,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_fills_at_capacity() {
        let mut batch = Batch::new(2);
        assert!(batch.is_empty());

        batch.push(LineDocument::new(0, "a"));
        assert!(!batch.is_full());

        batch.push(LineDocument::new(1, "b"));
        assert!(batch.is_full());
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn test_drain_empties_batch() {
        let mut batch = Batch::new(3);
        batch.push(LineDocument::new(0, "a"));
        batch.push(LineDocument::new(1, "b"));

        let drained = batch.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[1].line_number, 1);
        assert!(batch.is_empty());
        assert_eq!(batch.capacity(), 3);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut batch = Batch::new(0);
        assert_eq!(batch.capacity(), 1);
        batch.push(LineDocument::new(0, "a"));
        assert!(batch.is_full());
    }

    #[test]
    fn test_skipped_report() {
        let report = LoadReport::skipped();
        assert!(report.skipped);
        assert_eq!(report.lines_indexed, 0);
    }
}
