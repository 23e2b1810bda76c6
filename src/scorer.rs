//! Scoring functions
//!
//! A scorer is a pure function of (term, document, frequency) plus the
//! collection statistics captured at construction. Scorers are resolved once
//! per run from [`ScorerParams`]; an unknown name is a configuration error.

use crate::base::{DocId, Error, Result, Score, TermId};
use crate::index::ForwardIndex;

pub trait Scorer: Send + Sync {
    /// Score of one posting. Never advances anything.
    fn score(&self, term: TermId, docid: DocId, freq: u32) -> Score;
}

/// Named scoring function and its tunable parameters
#[derive(Clone, Debug)]
pub struct ScorerParams {
    pub name: String,
    pub k1: f32,
    pub b: f32,
}

impl Default for ScorerParams {
    fn default() -> Self {
        Self {
            name: "bm25".to_string(),
            k1: 0.9,
            b: 0.4,
        }
    }
}

/// Resolves the configured scorer against an index
pub fn from_params(params: &ScorerParams, index: &dyn ForwardIndex) -> Result<Box<dyn Scorer>> {
    match params.name.as_str() {
        "bm25" => Ok(Box::new(Bm25::new(params.k1, params.b, index))),
        "quantized" => Ok(Box::new(Quantized)),
        other => Err(Error::UnknownScorer(other.to_string())),
    }
}

/// BM25 over collection statistics copied out of the index at construction,
/// so scoring never goes back to the index
pub struct Bm25 {
    k1: f32,
    b: f32,
    avg_doc_len: f32,
    doc_lens: Vec<u32>,
    idf: Vec<Score>,
}

impl Bm25 {
    pub fn new(k1: f32, b: f32, index: &dyn ForwardIndex) -> Self {
        let num_docs = index.num_docs();
        let doc_lens: Vec<u32> = (0..num_docs).map(|d| index.doc_len(d as DocId)).collect();
        let total: u64 = doc_lens.iter().map(|&l| l as u64).sum();
        let avg_doc_len = if num_docs > 0 {
            total as f32 / num_docs as f32
        } else {
            1.
        };

        let idf = (0..index.num_terms())
            .map(|term| {
                let df = index.term_len(term) as f32;
                let n = num_docs as f32;
                ((n - df + 0.5) / (df + 0.5) + 1.).ln()
            })
            .collect();

        Self {
            k1,
            b,
            avg_doc_len,
            doc_lens,
            idf,
        }
    }
}

impl Scorer for Bm25 {
    fn score(&self, term: TermId, docid: DocId, freq: u32) -> Score {
        let f = freq as f32;
        let doc_len = self.doc_lens[docid as usize] as f32;
        let norm = self.k1 * (1. - self.b + self.b * doc_len / self.avg_doc_len);
        self.idf[term] * (f * (self.k1 + 1.)) / (f + norm)
    }
}

/// For quantized/impact indexes: the stored frequency already is the
/// (integer) impact, used as the score directly
pub struct Quantized;

impl Scorer for Quantized {
    fn score(&self, _term: TermId, _docid: DocId, freq: u32) -> Score {
        freq as Score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::MemoryIndex;

    #[test]
    fn test_unknown_scorer() {
        let index = MemoryIndex::new(0);
        let params = ScorerParams {
            name: "tfidf2000".to_string(),
            ..ScorerParams::default()
        };
        assert!(matches!(
            from_params(&params, &index),
            Err(Error::UnknownScorer(_))
        ));
    }

    #[test]
    fn test_bm25_prefers_rare_terms() {
        let mut index = MemoryIndex::new(2);
        // Term 0 appears everywhere, term 1 only in document 0
        index.add(0, &[0, 1], &[1, 1]);
        index.add(1, &[0], &[1]);
        index.add(2, &[0], &[1]);

        let bm25 = Bm25::new(0.9, 0.4, &index);
        assert!(bm25.score(1, 0, 1) > bm25.score(0, 0, 1));
    }

    #[test]
    fn test_quantized_is_identity() {
        assert_eq!(Quantized.score(3, 7, 42), 42.);
    }
}
