//! Query evaluation engine
//!
//! The algorithm is resolved once per run into a closed [`Algorithm`]
//! variant; per-query dispatch is a plain `match`, never a string
//! comparison. Each worker carries its own [`WorkerState`] so that
//! algorithm-local storage (the TAAT accumulators) is owned, reset per
//! query and never shared.

pub mod block_max_maxscore;
pub mod block_max_wand;
pub mod maxscore;
pub mod ranked_and;
pub mod ranked_or;
pub mod ranked_or_taat;
pub mod wand;

use std::fmt;
use std::str::FromStr;

use crate::accumulator::{Accumulator, LazyAccumulator, SimpleAccumulator};
use crate::base::{Error, Result, Score};
use crate::bounds::TermBounds;
use crate::cursor::{make_block_max_scored_cursors, make_max_scored_cursors, make_scored_cursors};
use crate::index::ForwardIndex;
use crate::query::Query;
use crate::scorer::Scorer;
use crate::topk::{TopEntry, TopKQueue};

/// The supported query evaluation strategies
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Algorithm {
    Wand,
    BlockMaxWand,
    MaxScore,
    BlockMaxMaxScore,
    RankedAnd,
    RankedOr,
    RankedOrTaat,
    RankedOrTaatLazy,
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        match name {
            "wand" => Ok(Algorithm::Wand),
            "block_max_wand" => Ok(Algorithm::BlockMaxWand),
            "maxscore" => Ok(Algorithm::MaxScore),
            "block_max_maxscore" => Ok(Algorithm::BlockMaxMaxScore),
            "ranked_and" => Ok(Algorithm::RankedAnd),
            "ranked_or" => Ok(Algorithm::RankedOr),
            "ranked_or_taat" => Ok(Algorithm::RankedOrTaat),
            "ranked_or_taat_lazy" => Ok(Algorithm::RankedOrTaatLazy),
            other => Err(Error::UnknownAlgorithm(other.to_string())),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Algorithm::Wand => "wand",
            Algorithm::BlockMaxWand => "block_max_wand",
            Algorithm::MaxScore => "maxscore",
            Algorithm::BlockMaxMaxScore => "block_max_maxscore",
            Algorithm::RankedAnd => "ranked_and",
            Algorithm::RankedOr => "ranked_or",
            Algorithm::RankedOrTaat => "ranked_or_taat",
            Algorithm::RankedOrTaatLazy => "ranked_or_taat_lazy",
        };
        write!(f, "{}", name)
    }
}

/// Per-query diagnostic counters; advisory only, never part of correctness
#[derive(Clone, Copy, Default, Debug)]
pub struct SearchStats {
    /// Number of terms in the query
    pub terms: usize,
    /// Main loop iterations
    pub iterations: u64,
    /// Documents scored through the essential-term path
    pub essential_docs: u64,
    /// Probes into non-essential lists
    pub lookups: u64,
    /// Probes skipped thanks to (block) upper bounds
    pub pruned_lookups: u64,
    /// Whole blocks skipped
    pub block_skips: u64,
    /// Candidates offered to the top-k queue
    pub inserts: u64,
}

/// Worker-owned mutable state, constructed once per worker and reset per
/// query. Only the TAAT variants need any.
pub struct WorkerState {
    accumulator: Option<Box<dyn Accumulator>>,
}

impl WorkerState {
    pub fn for_algorithm(algorithm: Algorithm, num_docs: usize) -> Self {
        let accumulator: Option<Box<dyn Accumulator>> = match algorithm {
            Algorithm::RankedOrTaat => Some(Box::new(SimpleAccumulator::new(num_docs))),
            Algorithm::RankedOrTaatLazy => Some(Box::new(LazyAccumulator::new(num_docs))),
            _ => None,
        };
        Self { accumulator }
    }
}

/// One algorithm bound to the shared read-only index, bounds and scorer.
/// The engine itself is immutable and shared across all workers.
pub struct QueryEngine<'a> {
    index: &'a dyn ForwardIndex,
    bounds: &'a dyn TermBounds,
    scorer: &'a dyn Scorer,
    algorithm: Algorithm,
    k: usize,
    weighted: bool,
}

impl<'a> QueryEngine<'a> {
    pub fn new(
        index: &'a dyn ForwardIndex,
        bounds: &'a dyn TermBounds,
        scorer: &'a dyn Scorer,
        algorithm: Algorithm,
        k: usize,
        weighted: bool,
    ) -> Self {
        Self {
            index,
            bounds,
            scorer,
            algorithm,
            k,
            weighted,
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn num_docs(&self) -> usize {
        self.index.num_docs()
    }

    /// Evaluates one query to completion on the calling thread
    pub fn evaluate(
        &self,
        query: &Query,
        state: &mut WorkerState,
    ) -> Result<(Vec<TopEntry>, SearchStats)> {
        let mut stats = SearchStats {
            terms: query.terms.len(),
            ..SearchStats::default()
        };
        let mut topk =
            TopKQueue::with_threshold(self.k, query.threshold.unwrap_or(Score::NEG_INFINITY));

        match self.algorithm {
            Algorithm::Wand => {
                let cursors =
                    make_max_scored_cursors(self.index, self.bounds, self.scorer, query, self.weighted);
                wand::wand(cursors, &mut topk, &mut stats)?;
            }
            Algorithm::BlockMaxWand => {
                let cursors = make_block_max_scored_cursors(
                    self.index,
                    self.bounds,
                    self.scorer,
                    query,
                    self.weighted,
                );
                block_max_wand::block_max_wand(cursors, &mut topk, &mut stats)?;
            }
            Algorithm::MaxScore => {
                let cursors =
                    make_max_scored_cursors(self.index, self.bounds, self.scorer, query, self.weighted);
                maxscore::maxscore(cursors, &mut topk, &mut stats)?;
            }
            Algorithm::BlockMaxMaxScore => {
                let cursors = make_block_max_scored_cursors(
                    self.index,
                    self.bounds,
                    self.scorer,
                    query,
                    self.weighted,
                );
                block_max_maxscore::block_max_maxscore(cursors, &mut topk, &mut stats)?;
            }
            Algorithm::RankedAnd => {
                let cursors = make_scored_cursors(self.index, self.scorer, query, self.weighted);
                ranked_and::ranked_and(cursors, &mut topk, &mut stats)?;
            }
            Algorithm::RankedOr => {
                let cursors = make_scored_cursors(self.index, self.scorer, query, self.weighted);
                ranked_or::ranked_or(cursors, &mut topk, &mut stats)?;
            }
            Algorithm::RankedOrTaat | Algorithm::RankedOrTaatLazy => {
                let cursors = make_scored_cursors(self.index, self.scorer, query, self.weighted);
                let accumulator = state
                    .accumulator
                    .as_mut()
                    .expect("TAAT worker state carries an accumulator");
                accumulator.reset(self.index.num_docs());
                ranked_or_taat::ranked_or_taat(cursors, accumulator.as_mut(), &mut topk, &mut stats);
            }
        }

        Ok((topk.finalize(), stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_algorithm_round_trip() {
        for name in [
            "wand",
            "block_max_wand",
            "maxscore",
            "block_max_maxscore",
            "ranked_and",
            "ranked_or",
            "ranked_or_taat",
            "ranked_or_taat_lazy",
        ] {
            let algorithm: Algorithm = name.parse().unwrap();
            assert_eq!(algorithm.to_string(), name);
        }
    }

    #[test]
    fn test_unknown_algorithm() {
        assert!(matches!(
            "block_max_or".parse::<Algorithm>(),
            Err(Error::UnknownAlgorithm(_))
        ));
    }
}
