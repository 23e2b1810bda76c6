//! Score accumulators for term-at-a-time evaluation
//!
//! An accumulator holds one partial score per document while a TAAT
//! algorithm walks the posting lists term by term. Workers reuse one
//! accumulator across sequential queries; `reset` must be called before
//! each query and is the only thing standing between two queries' scores.

use crate::base::{DocId, Score};
use crate::topk::TopKQueue;

pub trait Accumulator: Send {
    /// Prepares the accumulator for a query over `num_docs` documents,
    /// clearing any previous contributions
    fn reset(&mut self, num_docs: usize);

    /// Adds a term's contribution for one document
    fn accumulate(&mut self, docid: DocId, score: Score);

    /// Offers every accumulated document to the top-k queue
    fn collect(&self, topk: &mut TopKQueue);
}

/// Dense buffer, zeroed in full on every reset
#[derive(Default)]
pub struct SimpleAccumulator {
    scores: Vec<Score>,
}

impl SimpleAccumulator {
    pub fn new(num_docs: usize) -> Self {
        Self {
            scores: vec![0.; num_docs],
        }
    }
}

impl Accumulator for SimpleAccumulator {
    fn reset(&mut self, num_docs: usize) {
        self.scores.clear();
        self.scores.resize(num_docs, 0.);
    }

    fn accumulate(&mut self, docid: DocId, score: Score) {
        self.scores[docid as usize] += score;
    }

    fn collect(&self, topk: &mut TopKQueue) {
        for (docid, &score) in self.scores.iter().enumerate() {
            if score > 0. {
                topk.insert(score, docid as DocId);
            }
        }
    }
}

/// Documents per lazy block
const BLOCK: usize = 128;

/// Blocked accumulator with generation counters: reset touches only one
/// counter per block, and blocks no term contributed to are skipped both at
/// accumulation (zeroed on first touch) and in the final collection pass.
/// Functionally equivalent to [`SimpleAccumulator`].
#[derive(Default)]
pub struct LazyAccumulator {
    scores: Vec<Score>,
    generations: Vec<u32>,
    generation: u32,
    num_docs: usize,
}

impl LazyAccumulator {
    pub fn new(num_docs: usize) -> Self {
        let mut accumulator = Self::default();
        accumulator.reset(num_docs);
        accumulator
    }

    fn num_blocks(&self) -> usize {
        self.generations.len()
    }
}

impl Accumulator for LazyAccumulator {
    fn reset(&mut self, num_docs: usize) {
        let blocks = (num_docs + BLOCK - 1) / BLOCK;
        if blocks != self.num_blocks() {
            self.scores = vec![0.; blocks * BLOCK];
            self.generations = vec![0; blocks];
            self.generation = 1;
        } else {
            self.generation += 1;
        }
        self.num_docs = num_docs;
    }

    fn accumulate(&mut self, docid: DocId, score: Score) {
        let block = docid as usize / BLOCK;
        if self.generations[block] != self.generation {
            self.scores[block * BLOCK..(block + 1) * BLOCK].fill(0.);
            self.generations[block] = self.generation;
        }
        self.scores[docid as usize] += score;
    }

    fn collect(&self, topk: &mut TopKQueue) {
        for (block, &generation) in self.generations.iter().enumerate() {
            if generation != self.generation {
                // No contribution landed in this block
                continue;
            }
            let start = block * BLOCK;
            let end = ((block + 1) * BLOCK).min(self.num_docs);
            for docid in start..end {
                let score = self.scores[docid];
                if score > 0. {
                    topk.insert(score, docid as DocId);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect_sorted(accumulator: &dyn Accumulator, k: usize) -> Vec<(DocId, Score)> {
        let mut topk = TopKQueue::new(k);
        accumulator.collect(&mut topk);
        topk.finalize().iter().map(|e| (e.docid, e.score)).collect()
    }

    #[test]
    fn test_simple_and_lazy_agree() {
        let mut simple = SimpleAccumulator::new(1000);
        let mut lazy = LazyAccumulator::new(1000);

        for accumulator in [&mut simple as &mut dyn Accumulator, &mut lazy] {
            accumulator.reset(1000);
            accumulator.accumulate(3, 0.5);
            accumulator.accumulate(700, 1.5);
            accumulator.accumulate(3, 0.25);
            accumulator.accumulate(999, 0.1);
        }

        let expected = vec![(700, 1.5), (3, 0.75), (999, 0.1)];
        assert_eq!(collect_sorted(&simple, 10), expected);
        assert_eq!(collect_sorted(&lazy, 10), expected);
    }

    #[test]
    fn test_reset_clears_previous_query() {
        for accumulator in [
            &mut SimpleAccumulator::new(500) as &mut dyn Accumulator,
            &mut LazyAccumulator::new(500),
        ] {
            accumulator.reset(500);
            accumulator.accumulate(42, 9.);

            accumulator.reset(500);
            accumulator.accumulate(7, 1.);

            assert_eq!(collect_sorted(accumulator, 10), vec![(7, 1.)]);
        }
    }

    #[test]
    fn test_lazy_skips_untouched_blocks() {
        let mut lazy = LazyAccumulator::new(BLOCK * 64);
        lazy.reset(BLOCK * 64);
        lazy.accumulate((BLOCK * 63) as DocId, 2.);

        assert_eq!(collect_sorted(&lazy, 5), vec![((BLOCK * 63) as DocId, 2.)]);
    }

    #[test]
    fn test_resize_between_queries() {
        let mut lazy = LazyAccumulator::new(100);
        lazy.reset(100);
        lazy.accumulate(99, 1.);
        lazy.reset(1000);
        lazy.accumulate(999, 2.);
        assert_eq!(collect_sorted(&lazy, 10), vec![(999, 2.)]);
    }
}
