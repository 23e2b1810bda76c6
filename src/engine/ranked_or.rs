//! Exhaustive disjunctive evaluation
//!
//! Visits every posting of every term in document order, scoring each
//! matching document in full. No pruning: this is the correctness baseline
//! every exact pruning algorithm must agree with.

use crate::base::{Result, END};
use crate::cursor::ScoredCursor;
use crate::engine::SearchStats;
use crate::topk::TopKQueue;

pub fn ranked_or(
    mut cursors: Vec<ScoredCursor>,
    topk: &mut TopKQueue,
    stats: &mut SearchStats,
) -> Result<()> {
    let mut current = cursors.iter().map(ScoredCursor::docid).min().unwrap_or(END);

    while current != END {
        stats.iterations += 1;

        let mut score = 0.;
        let mut next_doc = END;
        for cursor in cursors.iter_mut() {
            if cursor.docid() == current {
                score += cursor.score();
                cursor.next();
            }
            next_doc = next_doc.min(cursor.docid());
        }

        topk.insert(score, current);
        stats.inserts += 1;
        current = next_doc;
    }

    Ok(())
}
