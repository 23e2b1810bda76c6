//! On-disk index format
//!
//! Postings are stored as fixed-width little-endian `(docid, freq)` pairs in
//! `postings.bin`; collection metadata (document lengths and per-term
//! offsets) lives in `index.cbor`. The posting file is memory-mapped at load
//! time and shared read-only across all query workers.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use memmap2::{Mmap, MmapOptions};
use serde::{Deserialize, Serialize};

use crate::base::{DocId, Error, Result, TermId, END};
use crate::index::{ForwardIndex, MemoryIndex, PostingCursor};

pub const INDEX_CBOR: &str = "index.cbor";
pub const POSTINGS_BIN: &str = "postings.bin";

/// Bytes per posting: docid (u32) + frequency (u32)
const POSTING_WIDTH: usize = 8;

#[derive(Serialize, Deserialize)]
struct TermMeta {
    /// Byte offset of the first posting in the posting file
    offset: u64,
    /// Number of postings
    length: usize,
}

#[derive(Serialize, Deserialize)]
struct IndexMeta {
    doc_lens: Vec<u32>,
    terms: Vec<TermMeta>,
}

/// Writes an in-memory index to `path` in the on-disk format
pub fn save_index(index: &MemoryIndex, path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)?;

    let mut meta = IndexMeta {
        doc_lens: index.doc_lens().to_vec(),
        terms: Vec::with_capacity(index.num_terms()),
    };

    let mut writer = BufWriter::new(File::create(path.join(POSTINGS_BIN))?);
    let mut offset = 0u64;
    for term in 0..index.num_terms() {
        let postings = index.postings(term);
        meta.terms.push(TermMeta {
            offset,
            length: postings.len(),
        });
        for posting in postings {
            writer.write_u32::<LittleEndian>(posting.docid)?;
            writer.write_u32::<LittleEndian>(posting.freq)?;
        }
        offset += (postings.len() * POSTING_WIDTH) as u64;
    }
    writer.flush()?;

    let meta_file = File::create(path.join(INDEX_CBOR))?;
    ciborium::ser::into_writer(&meta, meta_file)
        .map_err(|e| Error::Corrupt(format!("cannot write index metadata: {}", e)))?;
    Ok(())
}

/// Memory-mapped read-only index
pub struct MmapIndex {
    meta: IndexMeta,
    mmap: Mmap,
}

/// Opens an index directory written by [`save_index`]
pub fn load_index(path: &Path) -> Result<MmapIndex> {
    let meta_file = File::options().read(true).open(path.join(INDEX_CBOR))?;
    let meta: IndexMeta = ciborium::de::from_reader(meta_file)
        .map_err(|e| Error::Corrupt(format!("cannot read index metadata: {}", e)))?;

    let file = File::options().read(true).open(path.join(POSTINGS_BIN))?;
    let mmap = unsafe { MmapOptions::new().map(&file)? };

    // Validate offsets before any cursor touches the map
    for (term, tm) in meta.terms.iter().enumerate() {
        let end = tm.offset as usize + tm.length * POSTING_WIDTH;
        if end > mmap.len() {
            return Err(Error::Corrupt(format!(
                "posting list of term {} extends past the posting file",
                term
            )));
        }
    }

    Ok(MmapIndex { meta, mmap })
}

impl ForwardIndex for MmapIndex {
    fn num_docs(&self) -> usize {
        self.meta.doc_lens.len()
    }

    fn num_terms(&self) -> usize {
        self.meta.terms.len()
    }

    fn doc_len(&self, docid: DocId) -> u32 {
        self.meta.doc_lens[docid as usize]
    }

    fn term_len(&self, term: TermId) -> usize {
        self.meta.terms[term].length
    }

    fn cursor(&self, term: TermId) -> Box<dyn PostingCursor + '_> {
        let tm = &self.meta.terms[term];
        let start = tm.offset as usize;
        let end = start + tm.length * POSTING_WIDTH;
        Box::new(MmapCursor {
            data: &self.mmap[start..end],
            length: tm.length,
            position: 0,
        })
    }
}

struct MmapCursor<'a> {
    data: &'a [u8],
    length: usize,
    position: usize,
}

impl MmapCursor<'_> {
    #[inline]
    fn docid_at(&self, position: usize) -> DocId {
        LittleEndian::read_u32(&self.data[position * POSTING_WIDTH..])
    }
}

impl PostingCursor for MmapCursor<'_> {
    fn docid(&self) -> DocId {
        if self.position < self.length {
            self.docid_at(self.position)
        } else {
            END
        }
    }

    fn freq(&self) -> u32 {
        LittleEndian::read_u32(&self.data[self.position * POSTING_WIDTH + 4..])
    }

    fn next(&mut self) {
        if self.position < self.length {
            self.position += 1;
        }
    }

    fn next_geq(&mut self, target: DocId) {
        if self.docid() >= target {
            return;
        }
        let mut lo = self.position + 1;
        let mut hi = self.length;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.docid_at(mid) < target {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        self.position = lo;
    }

    fn len(&self) -> usize {
        self.length
    }
}
