//! Parallel batch execution
//!
//! Queries are independent: a fixed-size rayon pool runs them in parallel,
//! one query per task, each evaluated serially against the shared read-only
//! engine. Every worker gets its own [`WorkerState`] (via `map_init`), and
//! results are collected into positionally ordered slots so output order
//! always matches input order regardless of completion order.

use log::warn;
use rayon::prelude::*;

use crate::base::{Error, Result};
use crate::engine::{QueryEngine, SearchStats, WorkerState};
use crate::query::Query;
use crate::topk::TopEntry;

/// Everything the result sink needs for one query
pub struct QueryOutput {
    /// Query identifier, or the batch position when the query had none
    pub id: String,
    pub topk: Vec<TopEntry>,
    pub stats: SearchStats,
    /// Set when this query's evaluation was aborted; `topk` is then empty
    pub failed: bool,
}

/// Runs a batch of queries on `threads` workers, returning one output per
/// query in input order
pub fn execute_batch(
    engine: &QueryEngine,
    queries: &[Query],
    threads: usize,
) -> Result<Vec<QueryOutput>> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| Error::Config(format!("cannot build thread pool: {}", e)))?;

    let outputs = pool.install(|| {
        queries
            .par_iter()
            .enumerate()
            .map_init(
                || WorkerState::for_algorithm(engine.algorithm(), engine.num_docs()),
                |state, (position, query)| run_one(engine, state, position, query),
            )
            .collect()
    });

    Ok(outputs)
}

/// A per-query failure resolves to an empty, flagged slot; it never takes
/// the batch down
fn run_one(
    engine: &QueryEngine,
    state: &mut WorkerState,
    position: usize,
    query: &Query,
) -> QueryOutput {
    let id = query.id_or(position);
    match engine.evaluate(query, state) {
        Ok((topk, stats)) => QueryOutput {
            id,
            topk,
            stats,
            failed: false,
        },
        Err(e) => {
            warn!("Query {} aborted: {}", id, e);
            QueryOutput {
                id,
                topk: Vec::new(),
                stats: SearchStats {
                    terms: query.terms.len(),
                    ..SearchStats::default()
                },
                failed: true,
            }
        }
    }
}
