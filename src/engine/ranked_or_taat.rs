//! Term-at-a-time disjunctive evaluation
//!
//! Walks one posting list at a time, folding every contribution into the
//! accumulator; no candidate is materialized until all terms are done, when
//! a single collection pass feeds the top-k queue. The accumulator variant
//! (dense or lazy) is the caller's choice and does not change results.

use crate::accumulator::Accumulator;
use crate::base::END;
use crate::cursor::ScoredCursor;
use crate::engine::SearchStats;
use crate::topk::TopKQueue;

pub fn ranked_or_taat(
    cursors: Vec<ScoredCursor>,
    accumulator: &mut dyn Accumulator,
    topk: &mut TopKQueue,
    stats: &mut SearchStats,
) {
    for mut cursor in cursors {
        while cursor.docid() != END {
            stats.iterations += 1;
            accumulator.accumulate(cursor.docid(), cursor.score());
            cursor.next();
        }
    }
    accumulator.collect(topk);
}
