//! Index traits and the in-memory implementation
//!
//! An index exposes, per term, a posting list cursor. Cursors are created
//! fresh for each query evaluation and borrow the index for their lifetime;
//! the index itself is read-only and shared across worker threads.

pub mod disk;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::base::{DocId, TermId, END};

pub use disk::{load_index, save_index, MmapIndex};

/// A single posting: document ID and within-document term frequency
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub struct Posting {
    pub docid: DocId,
    pub freq: u32,
}

impl fmt::Display for Posting {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({},{})", self.docid, self.freq)
    }
}

/// Iterator over one term's posting list, with skip support.
///
/// `docid` is monotonically non-decreasing as the cursor advances and
/// reports [`END`] once the list is exhausted.
pub trait PostingCursor: Send {
    /// Current document ID, or [`END`] when exhausted
    fn docid(&self) -> DocId;

    /// Term frequency at the current position (valid while not exhausted)
    fn freq(&self) -> u32;

    /// Advances by exactly one posting
    fn next(&mut self);

    /// Moves to the first posting whose document ID is >= `target`.
    /// A no-op if the current position already satisfies the target.
    fn next_geq(&mut self, target: DocId);

    /// Total number of postings in the list
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Read-only view over a built index
pub trait ForwardIndex: Send + Sync {
    /// Total number of documents in the collection
    fn num_docs(&self) -> usize;

    /// Number of terms in the vocabulary
    fn num_terms(&self) -> usize;

    /// Length (token count) of a document
    fn doc_len(&self, docid: DocId) -> u32;

    /// Number of postings for a term
    fn term_len(&self, term: TermId) -> usize;

    /// Returns a cursor over the posting list of `term`
    fn cursor(&self, term: TermId) -> Box<dyn PostingCursor + '_>;
}

/// A cursor over an empty posting list, used for terms absent from the
/// vocabulary so that conjunctive queries see them as matching nothing.
pub struct EmptyCursor;

impl PostingCursor for EmptyCursor {
    fn docid(&self) -> DocId {
        END
    }

    fn freq(&self) -> u32 {
        0
    }

    fn next(&mut self) {}

    fn next_geq(&mut self, _target: DocId) {}

    fn len(&self) -> usize {
        0
    }
}

/// Uncompressed index kept in memory; used by tests and as the source
/// representation for [`save_index`].
pub struct MemoryIndex {
    postings: Vec<Vec<Posting>>,
    doc_lens: Vec<u32>,
}

impl MemoryIndex {
    pub fn new(num_terms: usize) -> Self {
        Self {
            postings: vec![Vec::new(); num_terms],
            doc_lens: Vec::new(),
        }
    }

    /// Adds one document. Documents must be added in increasing `docid`
    /// order so that posting lists stay sorted.
    pub fn add(&mut self, docid: DocId, terms: &[TermId], freqs: &[u32]) {
        assert_eq!(terms.len(), freqs.len());
        assert_eq!(docid as usize, self.doc_lens.len(), "documents must be added in order");

        let mut doc_len = 0;
        for (&term, &freq) in terms.iter().zip(freqs) {
            self.postings[term].push(Posting { docid, freq });
            doc_len += freq;
        }
        self.doc_lens.push(doc_len);
    }

    pub fn postings(&self, term: TermId) -> &[Posting] {
        &self.postings[term]
    }

    pub(crate) fn doc_lens(&self) -> &[u32] {
        &self.doc_lens
    }
}

impl ForwardIndex for MemoryIndex {
    fn num_docs(&self) -> usize {
        self.doc_lens.len()
    }

    fn num_terms(&self) -> usize {
        self.postings.len()
    }

    fn doc_len(&self, docid: DocId) -> u32 {
        self.doc_lens[docid as usize]
    }

    fn term_len(&self, term: TermId) -> usize {
        self.postings[term].len()
    }

    fn cursor(&self, term: TermId) -> Box<dyn PostingCursor + '_> {
        Box::new(MemoryCursor {
            postings: &self.postings[term],
            position: 0,
        })
    }
}

struct MemoryCursor<'a> {
    postings: &'a [Posting],
    position: usize,
}

impl PostingCursor for MemoryCursor<'_> {
    fn docid(&self) -> DocId {
        match self.postings.get(self.position) {
            Some(p) => p.docid,
            None => END,
        }
    }

    fn freq(&self) -> u32 {
        self.postings[self.position].freq
    }

    fn next(&mut self) {
        if self.position < self.postings.len() {
            self.position += 1;
        }
    }

    fn next_geq(&mut self, target: DocId) {
        if self.docid() >= target {
            return;
        }
        // Binary search over the remaining postings
        let rest = &self.postings[self.position..];
        self.position += rest.partition_point(|p| p.docid < target);
    }

    fn len(&self) -> usize {
        self.postings.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_index() -> MemoryIndex {
        let mut index = MemoryIndex::new(2);
        index.add(0, &[0], &[1]);
        index.add(1, &[0, 1], &[2, 1]);
        index.add(2, &[1], &[3]);
        index.add(3, &[0, 1], &[1, 1]);
        index
    }

    #[test]
    fn test_cursor_walk() {
        let index = sample_index();
        let mut cursor = index.cursor(0);
        assert_eq!(cursor.docid(), 0);
        assert_eq!(cursor.freq(), 1);
        cursor.next();
        assert_eq!(cursor.docid(), 1);
        assert_eq!(cursor.freq(), 2);
        cursor.next();
        assert_eq!(cursor.docid(), 3);
        cursor.next();
        assert_eq!(cursor.docid(), END);
        cursor.next();
        assert_eq!(cursor.docid(), END);
    }

    #[test]
    fn test_cursor_next_geq() {
        let index = sample_index();
        let mut cursor = index.cursor(0);
        cursor.next_geq(2);
        assert_eq!(cursor.docid(), 3);
        // Idempotent if already satisfied
        cursor.next_geq(2);
        assert_eq!(cursor.docid(), 3);
        cursor.next_geq(10);
        assert_eq!(cursor.docid(), END);
    }

    #[test]
    fn test_doc_lens() {
        let index = sample_index();
        assert_eq!(index.num_docs(), 4);
        assert_eq!(index.doc_len(1), 3);
        assert_eq!(index.term_len(1), 3);
    }
}
