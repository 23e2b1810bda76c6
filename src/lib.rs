//! Top-k query processing over statically built inverted indexes.
//!
//! The crate evaluates ranked queries with a family of dynamic pruning
//! strategies (WAND, Block-Max WAND, MaxScore, Block-Max MaxScore, ranked
//! AND/OR and term-at-a-time variants) that exploit per-term and per-block
//! score upper bounds to skip postings without changing exact results.

pub mod accumulator;
pub mod base;
pub mod bounds;
pub mod cursor;
pub mod engine;
pub mod executor;
pub mod index;
pub mod query;
pub mod scorer;
pub mod topk;
