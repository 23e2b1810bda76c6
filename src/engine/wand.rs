//! WAND
//!
//! Broder, A. Z., Carmel, D., Herscovici, M., Soffer, A. & Zien, J.
//! Efficient query evaluation using a two-level retrieval process.
//! CIKM 2003. DOI 10.1145/956863.956944.
//!
//! Cursors are kept ordered by current document ID; the pivot is the first
//! cursor at which the running sum of term upper bounds exceeds the top-k
//! threshold. Documents before the pivot can never enter the top-k and are
//! skipped wholesale.

use log::debug;

use crate::base::{Result, Score, END};
use crate::cursor::MaxScoredCursor;
use crate::engine::SearchStats;
use crate::topk::TopKQueue;

/// Index of the pivot cursor, if the remaining upper-bound mass can still
/// beat `threshold`
fn find_pivot(cursors: &[MaxScoredCursor], threshold: Score) -> Option<usize> {
    let mut upper_bound = 0.;
    for (ix, cursor) in cursors.iter().enumerate() {
        upper_bound += cursor.max_score();
        if upper_bound > threshold {
            return Some(ix);
        }
    }
    None
}

pub fn wand(
    mut cursors: Vec<MaxScoredCursor>,
    topk: &mut TopKQueue,
    stats: &mut SearchStats,
) -> Result<()> {
    if cursors.is_empty() {
        return Ok(());
    }

    loop {
        stats.iterations += 1;
        cursors.sort_by_key(MaxScoredCursor::docid);

        let Some(pivot) = find_pivot(&cursors, topk.threshold()) else {
            // Not enough mass left anywhere
            break;
        };
        let pivot_doc = cursors[pivot].docid();
        if pivot_doc == END {
            break;
        }

        if cursors[0].docid() == pivot_doc {
            // All cursors up to the pivot sit on the pivot document
            debug!("Scoring candidate {}", pivot_doc);
            let mut score = 0.;
            for cursor in cursors.iter_mut() {
                if cursor.docid() != pivot_doc {
                    break;
                }
                score += cursor.score();
                cursor.next();
            }
            topk.insert(score, pivot_doc);
            stats.inserts += 1;
        } else {
            // Not enough mass at the pivot yet: move a lagging cursor up
            cursors[0].next_geq(pivot_doc)?;
        }
    }

    Ok(())
}
