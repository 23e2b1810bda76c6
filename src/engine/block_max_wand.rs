//! Block-Max WAND
//!
//! Ding, S. & Suel, T. Faster top-k document retrieval using block-max
//! indexes. SIGIR 2011.
//!
//! WAND's pivot search, refined with block-level bounds: once a pivot is
//! found by global term bounds, the block maxima covering the pivot
//! document decide whether it is worth scoring at all. If not, the whole
//! region up to the nearest block boundary is skipped in one deep seek.

use crate::base::{DocId, Result, Score, END};
use crate::cursor::BlockMaxScoredCursor;
use crate::engine::SearchStats;
use crate::topk::TopKQueue;

/// Pivot index by global bounds, extended over any following cursors that
/// already sit on the pivot document (their mass counts too)
fn find_pivot(cursors: &[BlockMaxScoredCursor], threshold: Score) -> Option<usize> {
    let mut upper_bound = 0.;
    for (ix, cursor) in cursors.iter().enumerate() {
        upper_bound += cursor.max_score();
        if upper_bound > threshold {
            let pivot_doc = cursor.docid();
            let mut pivot = ix;
            while pivot + 1 < cursors.len() && cursors[pivot + 1].docid() == pivot_doc {
                pivot += 1;
            }
            return Some(pivot);
        }
    }
    None
}

/// Among `cursors[..=pivot]` positioned before `target`, the one with the
/// largest term bound; advancing the strongest list first converges fastest
fn advance_strongest(
    cursors: &mut [BlockMaxScoredCursor],
    pivot: usize,
    target: DocId,
) -> Result<()> {
    let mut pick: Option<usize> = None;
    for ix in 0..=pivot {
        if cursors[ix].docid() < target {
            match pick {
                Some(best) if cursors[best].max_score() >= cursors[ix].max_score() => {}
                _ => pick = Some(ix),
            }
        }
    }
    if let Some(ix) = pick {
        cursors[ix].next_geq(target)?;
    }
    Ok(())
}

pub fn block_max_wand(
    mut cursors: Vec<BlockMaxScoredCursor>,
    topk: &mut TopKQueue,
    stats: &mut SearchStats,
) -> Result<()> {
    if cursors.is_empty() {
        return Ok(());
    }

    loop {
        stats.iterations += 1;
        cursors.sort_by_key(BlockMaxScoredCursor::docid);

        let Some(pivot) = find_pivot(&cursors, topk.threshold()) else {
            break;
        };
        let pivot_doc = cursors[pivot].docid();
        if pivot_doc == END {
            break;
        }

        // Block-level refinement of the pivot's upper bound
        let mut block_upper_bound = 0.;
        for cursor in cursors[..=pivot].iter_mut() {
            cursor.shallow_seek(pivot_doc);
            block_upper_bound += cursor.block_max_score();
        }

        if block_upper_bound > topk.threshold() {
            if cursors[0].docid() == pivot_doc {
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
                advance_strongest(&mut cursors, pivot, pivot_doc)?;
            }
        } else {
            // Even the block maxima cannot beat the threshold: jump past
            // the earliest block boundary among the pivot's cursors
            stats.block_skips += 1;
            let boundary = cursors[..=pivot]
                .iter()
                .map(BlockMaxScoredCursor::block_boundary)
                .min()
                .expect("pivot range is non-empty");
            let mut next_doc = boundary.saturating_add(1);
            if pivot + 1 < cursors.len() {
                next_doc = next_doc.min(cursors[pivot + 1].docid());
            }
            for cursor in cursors[..=pivot].iter_mut() {
                if cursor.docid() < next_doc {
                    cursor.next_geq(next_doc)?;
                }
            }
        }
    }

    Ok(())
}
