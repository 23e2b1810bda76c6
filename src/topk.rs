//! Bounded top-k result collector
//!
//! Keeps the k best (score, docid) pairs seen so far in a min-heap, and
//! exposes the minimum score a new candidate must exceed to enter. Results
//! are only readable through the consuming [`TopKQueue::finalize`], so
//! reading before finalization is impossible by construction.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::base::{DocId, Score};

/// One finalized result entry. Final ordering is score descending, ties
/// broken by ascending document ID for reproducible output.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TopEntry {
    pub score: Score,
    pub docid: DocId,
}

impl std::fmt::Display for TopEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{})", self.docid, self.score)
    }
}

/// Heap entry ordered so that the heap maximum is the worst entry: the one
/// with the lowest score, ties resolved toward the higher document ID.
#[derive(Clone, Copy)]
struct HeapEntry {
    score: Score,
    docid: DocId,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| self.docid.cmp(&other.docid))
    }
}

pub struct TopKQueue {
    heap: BinaryHeap<HeapEntry>,
    k: usize,
    initial_threshold: Score,
}

impl TopKQueue {
    pub fn new(k: usize) -> Self {
        Self::with_threshold(k, Score::NEG_INFINITY)
    }

    /// A queue that additionally rejects every candidate not exceeding
    /// `threshold`, used when a per-query threshold hint is supplied
    pub fn with_threshold(k: usize, threshold: Score) -> Self {
        assert!(k >= 1, "top-k capacity must be at least 1");
        Self {
            heap: BinaryHeap::with_capacity(k + 1),
            k,
            initial_threshold: threshold,
        }
    }

    /// Minimum score a new candidate must exceed to have any chance of
    /// entering; negative infinity while the queue is not full (unless an
    /// initial threshold was given)
    pub fn threshold(&self) -> Score {
        if self.heap.len() == self.k {
            // Entries only entered above the initial threshold, so the
            // current minimum is at least as strict
            self.heap.peek().expect("non-empty at capacity").score
        } else {
            self.initial_threshold
        }
    }

    pub fn would_enter(&self, score: Score) -> bool {
        score > self.threshold()
    }

    /// Offers a candidate. Below capacity every candidate above the initial
    /// threshold enters; at capacity the candidate must beat the current
    /// minimum, which it then evicts.
    pub fn insert(&mut self, score: Score, docid: DocId) {
        if !self.would_enter(score) {
            return;
        }
        self.heap.push(HeapEntry { score, docid });
        if self.heap.len() > self.k {
            self.heap.pop();
        }
    }

    /// Consumes the queue, returning entries sorted by descending score
    /// (ties toward the lower document ID) with duplicate document IDs
    /// removed, keeping the highest-scored occurrence.
    pub fn finalize(self) -> Vec<TopEntry> {
        let mut entries: Vec<TopEntry> = self
            .heap
            .into_iter()
            .map(|e| TopEntry {
                score: e.score,
                docid: e.docid,
            })
            .collect();

        entries.sort_by(|a, b| {
            a.docid
                .cmp(&b.docid)
                .then_with(|| b.score.total_cmp(&a.score))
        });
        entries.dedup_by_key(|e| e.docid);
        entries.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.docid.cmp(&b.docid))
        });
        entries
    }
}
