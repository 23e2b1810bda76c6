//! Exhaustive conjunctive evaluation
//!
//! Intersects all posting lists by repeated `next_geq`, driven by the
//! shortest list; only documents present in every list are scored.

use crate::base::{Result, END};
use crate::cursor::ScoredCursor;
use crate::engine::SearchStats;
use crate::topk::TopKQueue;

pub fn ranked_and(
    mut cursors: Vec<ScoredCursor>,
    topk: &mut TopKQueue,
    stats: &mut SearchStats,
) -> Result<()> {
    if cursors.is_empty() {
        return Ok(());
    }

    // The shortest list drives the intersection
    cursors.sort_by_key(ScoredCursor::len);

    let mut candidate = cursors[0].docid();
    let mut i = 1;
    while candidate != END {
        stats.iterations += 1;

        while i < cursors.len() {
            cursors[i].next_geq(candidate)?;
            if cursors[i].docid() != candidate {
                // Mismatch: restart the agreement check from this document
                candidate = cursors[i].docid();
                i = 0;
                break;
            }
            i += 1;
        }

        if i == cursors.len() {
            let score: f32 = cursors.iter().map(ScoredCursor::score).sum();
            topk.insert(score, candidate);
            stats.inserts += 1;

            cursors[0].next();
            candidate = cursors[0].docid();
            i = 1;
        }
    }

    Ok(())
}
