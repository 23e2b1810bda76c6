//! MaxScore
//!
//! Turtle, H. & Flood, J. Query evaluation: strategies and optimizations.
//! Information Processing & Management 31(6), 1995.
//!
//! Terms are sorted by descending upper bound and split into an essential
//! prefix and a non-essential suffix whose cumulative bound cannot lift a
//! document past the threshold on its own. Candidates come from essential
//! lists only; non-essential lists are probed per candidate, in decreasing
//! bound order, and only while they could still change the outcome. The
//! essential set shrinks monotonically as the threshold rises.

use crate::base::{Result, Score, END};
use crate::cursor::MaxScoredCursor;
use crate::engine::SearchStats;
use crate::topk::TopKQueue;

/// Suffix sums of the sorted term bounds: `bounds[i]` is the best score
/// terms `i..` can jointly add to any document
pub(super) fn suffix_bounds(bounds_of: impl Iterator<Item = Score> + DoubleEndedIterator) -> Vec<Score> {
    let mut suffix: Vec<Score> = bounds_of.rev().collect();
    for i in 1..suffix.len() {
        suffix[i] += suffix[i - 1];
    }
    suffix.reverse();
    suffix.push(0.);
    suffix
}

pub fn maxscore(
    mut cursors: Vec<MaxScoredCursor>,
    topk: &mut TopKQueue,
    stats: &mut SearchStats,
) -> Result<()> {
    if cursors.is_empty() {
        return Ok(());
    }

    cursors.sort_by(|a, b| b.max_score().total_cmp(&a.max_score()));
    let n = cursors.len();
    let bounds = suffix_bounds(cursors.iter().map(MaxScoredCursor::max_score));

    // First index of the non-essential suffix
    let mut non_essential = n;

    loop {
        stats.iterations += 1;

        // Shrink the essential prefix as the threshold rises; it never
        // grows back
        while non_essential > 0 && bounds[non_essential - 1] <= topk.threshold() {
            non_essential -= 1;
        }
        if non_essential == 0 {
            // Even the full bound mass cannot beat the threshold
            break;
        }

        let candidate = cursors[..non_essential]
            .iter()
            .map(MaxScoredCursor::docid)
            .min()
            .expect("essential set is non-empty");
        if candidate == END {
            break;
        }

        let mut score = 0.;
        for cursor in cursors[..non_essential].iter_mut() {
            if cursor.docid() == candidate {
                score += cursor.score();
                cursor.next();
            }
        }
        stats.essential_docs += 1;

        // Probe non-essential lists while they can still matter
        for ix in non_essential..n {
            if score + bounds[ix] <= topk.threshold() {
                stats.pruned_lookups += (n - ix) as u64;
                break;
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
