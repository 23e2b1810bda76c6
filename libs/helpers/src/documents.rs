use rand::RngCore;
use rand_distr::{Distribution, Poisson};
use std::cmp::min;

use prunerank::base::TermId;

pub struct TermFreq {
    pub term: TermId,
    pub freq: u32,
}

pub struct TestDocument {
    pub terms: Vec<TermFreq>,
}

pub fn create_document(
    lambda_words: f32,
    max_words: usize,
    vocabulary_size: usize,
    rng: &mut dyn RngCore,
) -> TestDocument {
    let poisson = Poisson::new(lambda_words).unwrap();
    let num_words = 1 + poisson.sample(rng) as usize;

    let term_ids =
        rand::seq::index::sample(rng, vocabulary_size, min(num_words, max_words)).into_vec();
    let freq_distribution = Poisson::new(1.5f32).unwrap();

    let mut document = TestDocument { terms: Vec::new() };
    for term in term_ids {
        document.terms.push(TermFreq {
            term,
            freq: 1 + freq_distribution.sample(rng) as u32,
        });
    }

    document
}

pub fn document_vectors(document: &TestDocument) -> (Vec<TermId>, Vec<u32>) {
    let terms = document.terms.iter().map(|tf| tf.term).collect();
    let freqs = document.terms.iter().map(|tf| tf.freq).collect();
    (terms, freqs)
}
