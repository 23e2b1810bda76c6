//! Batch query evaluation over a built index, printing results in TREC run
//! format (`qid iteration docid rank score run_id`).

use std::path::PathBuf;
use std::process::exit;
use std::time::Instant;

use clap::Parser;
use log::{error, info};

use prunerank::base::{Error, Result};
use prunerank::bounds::load_bounds;
use prunerank::engine::{Algorithm, QueryEngine};
use prunerank::executor::execute_batch;
use prunerank::index::load_index;
use prunerank::query::{attach_thresholds, read_queries};
use prunerank::scorer::{self, ScorerParams};

#[derive(Parser)]
#[command(about = "Retrieves top-k query results in TREC format")]
struct Args {
    /// Index directory
    #[arg(long)]
    index: PathBuf,

    /// Term/block upper-bound data file
    #[arg(long)]
    bounds: PathBuf,

    /// Expect the bounds file to hold quantized data
    #[arg(long)]
    quantized: bool,

    /// Query file, one `id:term term ...` line per query
    #[arg(long)]
    queries: PathBuf,

    /// Per-query score thresholds, one per line
    #[arg(long)]
    thresholds: Option<PathBuf>,

    /// Query algorithm
    #[arg(long, default_value = "block_max_wand")]
    algorithm: String,

    /// Scorer name
    #[arg(long, default_value = "bm25")]
    scorer: String,

    #[arg(long, default_value_t = 0.9)]
    k1: f32,

    #[arg(long, default_value_t = 0.4)]
    b: f32,

    /// Number of results per query
    #[arg(short, default_value_t = 10)]
    k: usize,

    /// Worker threads
    #[arg(long, default_value_t = num_threads())]
    threads: usize,

    /// Weight terms by their multiplicity within the query
    #[arg(long)]
    weighted: bool,

    /// Run identifier
    #[arg(short, long, default_value = "R0")]
    run: String,
}

fn num_threads() -> usize {
    std::thread::available_parallelism().map_or(1, |n| n.get())
}

fn main() {
    env_logger::init();
    if let Err(e) = run(Args::parse()) {
        error!("{}", e);
        exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    // Configuration errors surface before anything is loaded
    let algorithm: Algorithm = args.algorithm.parse()?;
    let params = ScorerParams {
        name: args.scorer.clone(),
        k1: args.k1,
        b: args.b,
    };

    let index = load_index(&args.index)?;
    let bounds = load_bounds(&args.bounds)?;
    if bounds.is_quantized() != args.quantized {
        return Err(Error::Config(format!(
            "bounds file {} quantized data, but --quantized is {}",
            if bounds.is_quantized() {
                "holds"
            } else {
                "does not hold"
            },
            args.quantized
        )));
    }
    let scorer = scorer::from_params(&params, &index)?;

    let mut queries = read_queries(&args.queries)?;
    if let Some(thresholds) = &args.thresholds {
        attach_thresholds(&mut queries, thresholds)?;
    }
    info!(
        "Evaluating {} queries with {} on {} threads",
        queries.len(),
        algorithm,
        args.threads
    );

    let engine = QueryEngine::new(
        &index,
        &bounds,
        scorer.as_ref(),
        algorithm,
        args.k,
        args.weighted,
    );

    let start = Instant::now();
    let outputs = execute_batch(&engine, &queries, args.threads)?;
    info!("Batch evaluated in {:?}", start.elapsed());

    for output in &outputs {
        for (rank, entry) in output.topk.iter().enumerate() {
            println!(
                "{} Q0 {} {} {} {}",
                output.id,
                entry.docid,
                rank + 1,
                entry.score,
                args.run
            );
        }
        info!(
            "qid:{} terms:{} iterations:{} essential:{} lookups:{} pruned:{} block_skips:{} inserts:{}{}",
            output.id,
            output.stats.terms,
            output.stats.iterations,
            output.stats.essential_docs,
            output.stats.lookups,
            output.stats.pruned_lookups,
            output.stats.block_skips,
            output.stats.inserts,
            if output.failed { " FAILED" } else { "" }
        );
    }

    Ok(())
}
