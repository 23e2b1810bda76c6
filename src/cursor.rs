//! Scored cursors
//!
//! The scoring adapter: wraps a raw posting cursor with a scorer and a query
//! weight so that every algorithm consumes cursors uniformly. Three layers
//! mirror what the algorithms need: plain scored cursors (exhaustive
//! traversal), max-scored cursors (term-level bounds for WAND/MaxScore) and
//! block-max cursors (block-level bounds for the block-max variants).

use log::debug;

use crate::base::{DocId, Error, Result, Score, TermId, END};
use crate::bounds::TermBounds;
use crate::index::{EmptyCursor, ForwardIndex, PostingCursor};
use crate::query::Query;
use crate::scorer::Scorer;

/// A posting cursor bound to a scorer and a query weight
pub struct ScoredCursor<'a> {
    cursor: Box<dyn PostingCursor + 'a>,
    scorer: &'a dyn Scorer,
    term: TermId,
    weight: f32,
}

impl<'a> ScoredCursor<'a> {
    fn new(
        index: &'a dyn ForwardIndex,
        scorer: &'a dyn Scorer,
        term: TermId,
        weight: f32,
    ) -> Self {
        let cursor: Box<dyn PostingCursor> = if term < index.num_terms() {
            index.cursor(term)
        } else {
            // Out-of-vocabulary terms match nothing (which kills
            // conjunctive queries, as it must)
            debug!("Term {} is not in the vocabulary", term);
            Box::new(EmptyCursor)
        };
        Self {
            cursor,
            scorer,
            term,
            weight,
        }
    }

    #[inline]
    pub fn docid(&self) -> DocId {
        self.cursor.docid()
    }

    /// Advances one posting. A single-step advance walks a sorted list and
    /// cannot regress in either cursor implementation; the check is
    /// confined to debug builds.
    #[inline]
    pub fn next(&mut self) {
        let before = self.cursor.docid();
        self.cursor.next();
        debug_assert!(
            self.cursor.docid() >= before,
            "cursor moved backwards on next()"
        );
    }

    /// Deep skip to the first document >= `target`. A cursor that lands
    /// below its previous position is an internal defect and aborts the
    /// query rather than risking a wrong top-k.
    pub fn next_geq(&mut self, target: DocId) -> Result<()> {
        let before = self.cursor.docid();
        self.cursor.next_geq(target);
        let after = self.cursor.docid();
        if after < before {
            return Err(Error::CursorRegression(before, after));
        }
        Ok(())
    }

    /// Score at the current position; never advances
    #[inline]
    pub fn score(&self) -> Score {
        self.weight
            * self
                .scorer
                .score(self.term, self.cursor.docid(), self.cursor.freq())
    }

    pub fn len(&self) -> usize {
        self.cursor.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cursor.is_empty()
    }
}

/// A scored cursor carrying its term-level score upper bound
pub struct MaxScoredCursor<'a> {
    inner: ScoredCursor<'a>,
    max_score: Score,
}

impl<'a> MaxScoredCursor<'a> {
    #[inline]
    pub fn docid(&self) -> DocId {
        self.inner.docid()
    }

    #[inline]
    pub fn next(&mut self) {
        self.inner.next();
    }

    pub fn next_geq(&mut self, target: DocId) -> Result<()> {
        self.inner.next_geq(target)
    }

    #[inline]
    pub fn score(&self) -> Score {
        self.inner.score()
    }

    /// Weight-scaled upper bound on any score this cursor can produce;
    /// constant for the cursor's lifetime
    #[inline]
    pub fn max_score(&self) -> Score {
        self.max_score
    }
}

/// A max-scored cursor that additionally tracks the block covering its
/// position, for block-granular skip decisions.
///
/// Block accessors are valid after a [`shallow_seek`](Self::shallow_seek)
/// at or beyond the current document; a shallow seek moves only the block
/// pointer and never touches postings.
pub struct BlockMaxScoredCursor<'a> {
    inner: ScoredCursor<'a>,
    max_score: Score,
    bounds: &'a dyn TermBounds,
    term: TermId,
    weight: f32,
    block: usize,
    num_blocks: usize,
}

impl<'a> BlockMaxScoredCursor<'a> {
    #[inline]
    pub fn docid(&self) -> DocId {
        self.inner.docid()
    }

    #[inline]
    pub fn next(&mut self) {
        self.inner.next();
    }

    pub fn next_geq(&mut self, target: DocId) -> Result<()> {
        self.shallow_seek(target);
        self.inner.next_geq(target)
    }

    #[inline]
    pub fn score(&self) -> Score {
        self.inner.score()
    }

    #[inline]
    pub fn max_score(&self) -> Score {
        self.max_score
    }

    /// Positions the block pointer on the block containing `target`
    /// (or the last block if the list ends earlier)
    pub fn shallow_seek(&mut self, target: DocId) {
        while self.block + 1 < self.num_blocks
            && self.bounds.block(self.term, self.block).last_docid < target
        {
            self.block += 1;
        }
    }

    /// Weight-scaled upper bound of the current block
    pub fn block_max_score(&self) -> Score {
        if self.num_blocks == 0 {
            return 0.;
        }
        self.weight * self.bounds.block(self.term, self.block).max_score
    }

    /// Last document ID covered by the current block
    pub fn block_boundary(&self) -> DocId {
        if self.num_blocks == 0 {
            return END;
        }
        self.bounds.block(self.term, self.block).last_docid
    }
}

/// Builds one scored cursor per distinct query term
pub fn make_scored_cursors<'a>(
    index: &'a dyn ForwardIndex,
    scorer: &'a dyn Scorer,
    query: &Query,
    weighted: bool,
) -> Vec<ScoredCursor<'a>> {
    query
        .term_weights(weighted)
        .into_iter()
        .map(|(term, weight)| ScoredCursor::new(index, scorer, term, weight))
        .collect()
}

/// Scored cursors with term-level upper bounds
pub fn make_max_scored_cursors<'a>(
    index: &'a dyn ForwardIndex,
    bounds: &'a dyn TermBounds,
    scorer: &'a dyn Scorer,
    query: &Query,
    weighted: bool,
) -> Vec<MaxScoredCursor<'a>> {
    query
        .term_weights(weighted)
        .into_iter()
        .map(|(term, weight)| MaxScoredCursor {
            inner: ScoredCursor::new(index, scorer, term, weight),
            max_score: weight * bounds.term_bound(term),
        })
        .collect()
}

/// Scored cursors with term- and block-level upper bounds
pub fn make_block_max_scored_cursors<'a>(
    index: &'a dyn ForwardIndex,
    bounds: &'a dyn TermBounds,
    scorer: &'a dyn Scorer,
    query: &Query,
    weighted: bool,
) -> Vec<BlockMaxScoredCursor<'a>> {
    query
        .term_weights(weighted)
        .into_iter()
        .map(|(term, weight)| BlockMaxScoredCursor {
            inner: ScoredCursor::new(index, scorer, term, weight),
            max_score: weight * bounds.term_bound(term),
            bounds,
            term,
            weight,
            block: 0,
            num_blocks: bounds.num_blocks(term),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::RawBounds;
    use crate::index::MemoryIndex;
    use crate::scorer::Quantized;

    fn sample_index() -> MemoryIndex {
        let mut index = MemoryIndex::new(1);
        for docid in 0..8 {
            index.add(docid, &[0], &[docid + 1]);
        }
        index
    }

    #[test]
    fn test_weight_scaling() {
        let index = sample_index();
        let bounds = RawBounds::build(&index, &Quantized, 4);
        let query = Query::new(vec![0, 0]);

        let cursors = make_max_scored_cursors(&index, &bounds, &Quantized, &query, true);
        assert_eq!(cursors.len(), 1);
        assert_eq!(cursors[0].max_score(), 2. * 8.);
        assert_eq!(cursors[0].score(), 2. * 1.);
    }

    #[test]
    fn test_block_cursor_shallow_seek() {
        let index = sample_index();
        let bounds = RawBounds::build(&index, &Quantized, 4);
        let query = Query::new(vec![0]);

        let mut cursors = make_block_max_scored_cursors(&index, &bounds, &Quantized, &query, false);
        let cursor = &mut cursors[0];
        assert_eq!(cursor.block_boundary(), 3);
        assert_eq!(cursor.block_max_score(), 4.);

        cursor.shallow_seek(5);
        assert_eq!(cursor.block_boundary(), 7);
        assert_eq!(cursor.block_max_score(), 8.);
        // Postings untouched by the shallow seek
        assert_eq!(cursor.docid(), 0);
    }

    struct DescendingCursor {
        docid: DocId,
    }

    impl PostingCursor for DescendingCursor {
        fn docid(&self) -> DocId {
            self.docid
        }

        fn freq(&self) -> u32 {
            1
        }

        fn next(&mut self) {
            self.docid -= 1;
        }

        fn next_geq(&mut self, _target: DocId) {}

        fn len(&self) -> usize {
            2
        }
    }

    struct DescendingIndex;

    impl ForwardIndex for DescendingIndex {
        fn num_docs(&self) -> usize {
            10
        }

        fn num_terms(&self) -> usize {
            1
        }

        fn doc_len(&self, _docid: DocId) -> u32 {
            1
        }

        fn term_len(&self, _term: TermId) -> usize {
            2
        }

        fn cursor(&self, _term: TermId) -> Box<dyn PostingCursor + '_> {
            Box::new(DescendingCursor { docid: 5 })
        }
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "cursor moved backwards")]
    fn test_backwards_step_detected() {
        let mut cursors =
            make_scored_cursors(&DescendingIndex, &Quantized, &Query::new(vec![0]), false);
        cursors[0].next();
    }

    #[test]
    fn test_out_of_vocabulary_cursor() {
        let index = sample_index();
        let bounds = RawBounds::build(&index, &Quantized, 4);
        let query = Query::new(vec![99]);

        let cursors = make_max_scored_cursors(&index, &bounds, &Quantized, &query, false);
        assert_eq!(cursors[0].docid(), END);
        assert_eq!(cursors[0].max_score(), 0.);
    }
}
