//! Term and block score upper bounds
//!
//! For every term the bound data records the maximum score any posting of
//! that term can produce, and a per-block maximum together with the block's
//! last document ID. Pruning algorithms only ever rely on the bounds being
//! conservative: a bound may over-estimate, never under-estimate.
//!
//! Two storage variants exist, raw (f32 per block) and quantized (one byte
//! per block plus a per-term scale). Both hide behind [`TermBounds`] so the
//! query algorithms never see the difference.

use std::fs::File;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::base::{DocId, Error, Result, Score, TermId, END};
use crate::index::ForwardIndex;
use crate::scorer::Scorer;

/// Default number of postings covered by one block
pub const DEFAULT_BLOCK_SIZE: usize = 64;

#[derive(Serialize, Deserialize, Clone, Copy, Debug)]
pub struct BlockBound {
    /// Last document ID covered by this block
    pub last_docid: DocId,
    /// Upper bound on the score of any posting in the block
    pub max_score: Score,
}

/// Per-term and per-block score upper bounds
pub trait TermBounds: Send + Sync {
    /// Global upper bound for a term (0 for out-of-vocabulary terms)
    fn term_bound(&self, term: TermId) -> Score;

    /// Number of blocks of a term's posting list
    fn num_blocks(&self, term: TermId) -> usize;

    /// Bound of one block; `block` must be < `num_blocks(term)`
    fn block(&self, term: TermId, block: usize) -> BlockBound;
}

/// Bounds stored as plain f32 values
#[derive(Serialize, Deserialize)]
pub struct RawBounds {
    term_bounds: Vec<Score>,
    blocks: Vec<Vec<BlockBound>>,
}

impl RawBounds {
    /// Builds bounds by scanning every posting list with the scorer that
    /// will be used at query time. Using any other scorer at query time
    /// voids the pruning guarantee.
    pub fn build(index: &dyn ForwardIndex, scorer: &dyn Scorer, block_size: usize) -> Self {
        assert!(block_size > 0);
        let mut term_bounds = Vec::with_capacity(index.num_terms());
        let mut blocks = Vec::with_capacity(index.num_terms());

        for term in 0..index.num_terms() {
            let mut cursor = index.cursor(term);
            let mut term_max: Score = 0.;
            let mut term_blocks = Vec::new();
            let mut in_block = 0;
            let mut block_max: Score = 0.;
            let mut last_docid: DocId = 0;

            while cursor.docid() != END {
                let score = scorer.score(term, cursor.docid(), cursor.freq());
                block_max = block_max.max(score);
                term_max = term_max.max(score);
                last_docid = cursor.docid();
                in_block += 1;
                if in_block == block_size {
                    term_blocks.push(BlockBound {
                        last_docid,
                        max_score: block_max,
                    });
                    in_block = 0;
                    block_max = 0.;
                }
                cursor.next();
            }
            if in_block > 0 {
                term_blocks.push(BlockBound {
                    last_docid,
                    max_score: block_max,
                });
            }

            term_bounds.push(term_max);
            blocks.push(term_blocks);
        }

        Self {
            term_bounds,
            blocks,
        }
    }
}

impl TermBounds for RawBounds {
    fn term_bound(&self, term: TermId) -> Score {
        self.term_bounds.get(term).copied().unwrap_or(0.)
    }

    fn num_blocks(&self, term: TermId) -> usize {
        self.blocks.get(term).map_or(0, Vec::len)
    }

    fn block(&self, term: TermId, block: usize) -> BlockBound {
        self.blocks[term][block]
    }
}

/// Bounds with one byte per block bound and a per-term scale factor.
/// Quantization rounds up, so decoded bounds still dominate real scores.
#[derive(Serialize, Deserialize)]
pub struct QuantizedBounds {
    term_bounds: Vec<Score>,
    scales: Vec<f32>,
    blocks: Vec<Vec<(DocId, u8)>>,
}

impl QuantizedBounds {
    pub fn build(index: &dyn ForwardIndex, scorer: &dyn Scorer, block_size: usize) -> Self {
        let raw = RawBounds::build(index, scorer, block_size);
        Self::from_raw(&raw)
    }

    fn from_raw(raw: &RawBounds) -> Self {
        let scales: Vec<f32> = raw.term_bounds.iter().map(|&m| m / u8::MAX as f32).collect();
        let blocks = raw
            .blocks
            .iter()
            .zip(&scales)
            .map(|(term_blocks, &scale)| {
                term_blocks
                    .iter()
                    .map(|b| {
                        let q = if scale > 0. {
                            (b.max_score / scale).ceil().min(u8::MAX as f32) as u8
                        } else {
                            0
                        };
                        (b.last_docid, q)
                    })
                    .collect()
            })
            .collect();

        Self {
            term_bounds: raw.term_bounds.clone(),
            scales,
            blocks,
        }
    }
}

impl TermBounds for QuantizedBounds {
    fn term_bound(&self, term: TermId) -> Score {
        self.term_bounds.get(term).copied().unwrap_or(0.)
    }

    fn num_blocks(&self, term: TermId) -> usize {
        self.blocks.get(term).map_or(0, Vec::len)
    }

    fn block(&self, term: TermId, block: usize) -> BlockBound {
        let (last_docid, q) = self.blocks[term][block];
        BlockBound {
            last_docid,
            max_score: self.scales[term] * q as f32,
        }
    }
}

/// On-disk container, self-describing so the loader knows the variant
#[derive(Serialize, Deserialize)]
pub enum AnyBounds {
    Raw(RawBounds),
    Quantized(QuantizedBounds),
}

impl AnyBounds {
    pub fn is_quantized(&self) -> bool {
        matches!(self, AnyBounds::Quantized(_))
    }
}

impl TermBounds for AnyBounds {
    fn term_bound(&self, term: TermId) -> Score {
        match self {
            AnyBounds::Raw(b) => b.term_bound(term),
            AnyBounds::Quantized(b) => b.term_bound(term),
        }
    }

    fn num_blocks(&self, term: TermId) -> usize {
        match self {
            AnyBounds::Raw(b) => b.num_blocks(term),
            AnyBounds::Quantized(b) => b.num_blocks(term),
        }
    }

    fn block(&self, term: TermId, block: usize) -> BlockBound {
        match self {
            AnyBounds::Raw(b) => b.block(term, block),
            AnyBounds::Quantized(b) => b.block(term, block),
        }
    }
}

pub fn save_bounds(bounds: &AnyBounds, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    ciborium::ser::into_writer(bounds, file)
        .map_err(|e| Error::Corrupt(format!("cannot write bounds data: {}", e)))
}

pub fn load_bounds(path: &Path) -> Result<AnyBounds> {
    let file = File::options().read(true).open(path)?;
    let bounds: AnyBounds = ciborium::de::from_reader(file)
        .map_err(|e| Error::Corrupt(format!("cannot read bounds data: {}", e)))?;
    info!(
        "Loaded {} bounds data from {}",
        if bounds.is_quantized() {
            "quantized"
        } else {
            "raw"
        },
        path.display()
    );
    Ok(bounds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::MemoryIndex;
    use crate::scorer::Quantized;

    fn sample_index() -> MemoryIndex {
        let mut index = MemoryIndex::new(1);
        for docid in 0..10 {
            index.add(docid, &[0], &[(docid % 5) + 1]);
        }
        index
    }

    #[test]
    fn test_raw_bounds_cover_scores() {
        let index = sample_index();
        let bounds = RawBounds::build(&index, &Quantized, 4);
        assert_eq!(bounds.term_bound(0), 5.);
        assert_eq!(bounds.num_blocks(0), 3);
        // Block 0 covers documents 0..=3 with frequencies 1..=4
        let b = bounds.block(0, 0);
        assert_eq!(b.last_docid, 3);
        assert_eq!(b.max_score, 4.);
        // Last block ends at the last posting
        assert_eq!(bounds.block(0, 2).last_docid, 9);
    }

    #[test]
    fn test_quantized_bounds_dominate_raw() {
        let index = sample_index();
        let raw = RawBounds::build(&index, &Quantized, 4);
        let quantized = QuantizedBounds::build(&index, &Quantized, 4);

        assert_eq!(quantized.term_bound(0), raw.term_bound(0));
        for block in 0..raw.num_blocks(0) {
            let r = raw.block(0, block);
            let q = quantized.block(0, block);
            assert_eq!(q.last_docid, r.last_docid);
            assert!(q.max_score >= r.max_score);
        }
    }

    #[test]
    fn test_out_of_vocabulary_term() {
        let index = sample_index();
        let bounds = RawBounds::build(&index, &Quantized, 4);
        assert_eq!(bounds.term_bound(42), 0.);
        assert_eq!(bounds.num_blocks(42), 0);
    }
}
