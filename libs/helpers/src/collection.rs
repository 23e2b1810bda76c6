use std::collections::HashMap;

use log::debug;
use rand::{rngs::StdRng, SeedableRng};

use crate::documents::{create_document, document_vectors, TestDocument};
use prunerank::{
    base::{DocId, Score, TermId},
    index::{MemoryIndex, Posting},
    scorer::Scorer,
    topk::TopEntry,
};

/// A randomly generated collection together with a plain reference copy of
/// its posting lists, for brute-force comparison
pub struct TestCollection {
    pub vocabulary_size: usize,
    pub index: MemoryIndex,
    pub all_terms: HashMap<TermId, Vec<Posting>>,
    pub documents: Vec<TestDocument>,
}

impl TestCollection {
    pub fn new(
        vocabulary_size: usize,
        document_count: usize,
        lambda_words: f32,
        max_words: usize,
        seed: Option<u64>,
    ) -> Self {
        let mut index = MemoryIndex::new(vocabulary_size);
        let mut all_terms = HashMap::<TermId, Vec<Posting>>::new();
        let mut documents = Vec::<TestDocument>::new();
        let mut rng = if let Some(seed) = seed {
            StdRng::seed_from_u64(seed)
        } else {
            StdRng::from_entropy()
        };

        for ix in 0..document_count {
            let docid = ix as DocId;
            let document = create_document(lambda_words, max_words, vocabulary_size, &mut rng);

            let (terms, freqs) = document_vectors(&document);
            index.add(docid, &terms, &freqs);

            for tf in document.terms.iter() {
                all_terms.entry(tf.term).or_default().push(Posting {
                    docid,
                    freq: tf.freq,
                });
            }

            documents.push(document);
        }

        debug!(
            "Generated a collection of {} documents over {} terms",
            document_count, vocabulary_size
        );
        Self {
            vocabulary_size,
            index,
            all_terms,
            documents,
        }
    }

    /// Exhaustive disjunctive reference evaluation against the raw posting
    /// lists, sorted by descending score and ascending docid
    pub fn brute_force_or(
        &self,
        weights: &[(TermId, f32)],
        scorer: &dyn Scorer,
        k: usize,
    ) -> Vec<TopEntry> {
        let mut scores = HashMap::<DocId, Score>::new();
        for &(term, weight) in weights {
            if let Some(postings) = self.all_terms.get(&term) {
                for posting in postings {
                    *scores.entry(posting.docid).or_insert(0.) +=
                        weight * scorer.score(term, posting.docid, posting.freq);
                }
            }
        }
        sorted_topk(scores, k)
    }

    /// Exhaustive conjunctive reference: only documents carrying every
    /// query term are scored
    pub fn brute_force_and(
        &self,
        weights: &[(TermId, f32)],
        scorer: &dyn Scorer,
        k: usize,
    ) -> Vec<TopEntry> {
        let mut scores = HashMap::<DocId, Score>::new();
        let mut counts = HashMap::<DocId, usize>::new();
        for &(term, weight) in weights {
            let postings = self.all_terms.get(&term);
            for posting in postings.into_iter().flatten() {
                *scores.entry(posting.docid).or_insert(0.) +=
                    weight * scorer.score(term, posting.docid, posting.freq);
                *counts.entry(posting.docid).or_insert(0) += 1;
            }
        }
        scores.retain(|docid, _| counts[docid] == weights.len());
        sorted_topk(scores, k)
    }
}

fn sorted_topk(scores: HashMap<DocId, Score>, k: usize) -> Vec<TopEntry> {
    let mut entries: Vec<TopEntry> = scores
        .into_iter()
        .map(|(docid, score)| TopEntry { score, docid })
        .collect();
    entries.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.docid.cmp(&b.docid))
    });
    entries.truncate(k);
    entries
}
