//! Block-Max MaxScore
//!
//! MaxScore's essential/non-essential partition, with block-level bounds
//! applied on both sides: a candidate whose essential block maxima plus the
//! whole non-essential mass cannot beat the threshold is dropped before any
//! scoring, and a non-essential probe only deep-seeks when the block
//! maximum at the candidate's position leaves the outcome open.

use crate::base::{Result, END};
use crate::cursor::BlockMaxScoredCursor;
use crate::engine::maxscore::suffix_bounds;
use crate::engine::SearchStats;
use crate::topk::TopKQueue;

pub fn block_max_maxscore(
    mut cursors: Vec<BlockMaxScoredCursor>,
    topk: &mut TopKQueue,
    stats: &mut SearchStats,
) -> Result<()> {
    if cursors.is_empty() {
        return Ok(());
    }

    cursors.sort_by(|a, b| b.max_score().total_cmp(&a.max_score()));
    let n = cursors.len();
    let bounds = suffix_bounds(cursors.iter().map(BlockMaxScoredCursor::max_score));

    let mut non_essential = n;

    loop {
        stats.iterations += 1;

        while non_essential > 0 && bounds[non_essential - 1] <= topk.threshold() {
            non_essential -= 1;
        }
        if non_essential == 0 {
            break;
        }

        let candidate = cursors[..non_essential]
            .iter()
            .map(BlockMaxScoredCursor::docid)
            .min()
            .expect("essential set is non-empty");
        if candidate == END {
            break;
        }

        // Block-level filter on the candidate: essential block maxima plus
        // the full non-essential bound
        let mut block_upper_bound = bounds[non_essential];
        for cursor in cursors[..non_essential].iter_mut() {
            if cursor.docid() == candidate {
                cursor.shallow_seek(candidate);
                block_upper_bound += cursor.block_max_score();
            }
        }
        if block_upper_bound <= topk.threshold() {
            stats.block_skips += 1;
            for cursor in cursors[..non_essential].iter_mut() {
                if cursor.docid() == candidate {
                    cursor.next();
                }
            }
            continue;
        }

        let mut score = 0.;
        for cursor in cursors[..non_essential].iter_mut() {
            if cursor.docid() == candidate {
                score += cursor.score();
                cursor.next();
            }
        }
        stats.essential_docs += 1;

        for ix in non_essential..n {
            if score + bounds[ix] <= topk.threshold() {
                stats.pruned_lookups += (n - ix) as u64;
                break;
            }
            // The block maximum decides whether the deep seek is worth it
            cursors[ix].shallow_seek(candidate);
            if score + cursors[ix].block_max_score() + bounds[ix + 1] <= topk.threshold() {
                stats.pruned_lookups += 1;
                continue;
            }
            stats.lookups += 1;
            cursors[ix].next_geq(candidate)?;
            if cursors[ix].docid() == candidate {
                score += cursors[ix].score();
            }
        }

        topk.insert(score, candidate);
        stats.inserts += 1;
    }

    Ok(())
}
