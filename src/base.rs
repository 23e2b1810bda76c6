pub type TermId = usize;
pub type DocId = u32;
pub type Score = f32;

/// Document ID reported by an exhausted cursor
pub const END: DocId = DocId::MAX;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("unknown algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("unknown scorer: {0}")]
    UnknownScorer(String),

    #[error("corrupt index data: {0}")]
    Corrupt(String),

    /// A cursor reported a smaller document ID after an advance. This is an
    /// internal defect: the affected query is aborted rather than allowed
    /// to produce a wrong top-k.
    #[error("cursor moved backwards ({0} to {1})")]
    CursorRegression(DocId, DocId),
}

pub type Result<T> = std::result::Result<T, Error>;
