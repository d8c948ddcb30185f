//! Document-side BM25 term weighting.
//!
//! Produces the sparse vector stored beside each chunk in the vector index.
//! Only the term-frequency saturation component is computed here; inverse
//! document frequency is applied at query time by the search side, so the
//! weight of a term depends solely on the chunk itself and the tenant's
//! average document length.

use std::collections::{BTreeMap, HashMap};

use crate::vector::SparseVector;

const K1: f64 = 1.2;
const B: f64 = 0.75;

/// BM25 weighting with parameters precomputed for one avgdl.
#[derive(Debug, Clone, Copy)]
pub struct Bm25Weights {
    k1: f64,
    k1_plus_1: f64,
    one_minus_b: f64,
    b_over_avg_len: f64,
}

impl Bm25Weights {
    pub fn new(average_document_length: f64) -> Self {
        // avgdl <= 0 cannot occur after a valid flush, but a snapshot file
        // edited by hand could carry one; degrade to the neutral default.
        let avgdl = if average_document_length > 0.0 {
            average_document_length
        } else {
            1.0
        };
        Bm25Weights {
            k1: K1,
            k1_plus_1: K1 + 1.0,
            one_minus_b: 1.0 - B,
            b_over_avg_len: B / avgdl,
        }
    }

    /// Weight every term of a chunk, returning a sparse vector sorted by
    /// term index. Colliding term indices accumulate.
    pub fn weigh(&self, term_frequencies: &HashMap<String, u32>, term_length: u64) -> SparseVector {
        let length_norm =
            self.k1 * (self.one_minus_b + self.b_over_avg_len * term_length as f64);

        let mut accumulated: BTreeMap<u32, f64> = BTreeMap::new();
        for (term, &tf) in term_frequencies {
            if tf == 0 {
                continue;
            }
            let tf = tf as f64;
            let weight = tf * self.k1_plus_1 / (tf + length_norm);
            *accumulated.entry(term_index(term)).or_insert(0.0) += weight;
        }

        let mut sparse = SparseVector::default();
        for (index, value) in accumulated {
            sparse.indices.push(index);
            sparse.values.push(value as f32);
        }
        sparse
    }
}

/// Map a term to a stable sparse index. FNV-1a, 32-bit: deterministic
/// across platforms and compilations.
fn term_index(term: &str) -> u32 {
    let mut hash: u32 = 2_166_136_261;
    for byte in term.bytes() {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(16_777_619);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    fn freqs(pairs: &[(&str, u32)]) -> HashMap<String, u32> {
        pairs.iter().map(|(t, f)| (t.to_string(), *f)).collect()
    }

    #[test]
    fn deterministic_for_identical_inputs() {
        let weights = Bm25Weights::new(100.0);
        let tf = freqs(&[("invoice", 3), ("total", 1)]);

        let a = weights.weigh(&tf, 80);
        let b = weights.weigh(&tf, 80);
        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
        assert!(a.indices.windows(2).all(|w| w[0] < w[1]), "sorted by index");
    }

    #[test]
    fn term_frequency_saturates() {
        let weights = Bm25Weights::new(100.0);

        let w1 = weights.weigh(&freqs(&[("invoice", 1)]), 100).values[0];
        let w3 = weights.weigh(&freqs(&[("invoice", 3)]), 100).values[0];
        let w30 = weights.weigh(&freqs(&[("invoice", 30)]), 100).values[0];

        assert!(w3 > w1, "more occurrences weigh more");
        // Diminishing returns: tripling tf from 1 gains more than from 3.
        assert!(w3 - w1 > w30 - w3);
        // Saturation ceiling is k1 + 1.
        assert!(w30 < (K1 + 1.0) as f32);
    }

    #[test]
    fn longer_documents_weigh_less() {
        let weights = Bm25Weights::new(100.0);
        let tf = freqs(&[("invoice", 2)]);

        let short = weights.weigh(&tf, 50).values[0];
        let long = weights.weigh(&tf, 400).values[0];
        assert!(short > long);
    }

    #[test]
    fn avgdl_at_the_document_length_is_neutral() {
        // At len == avgdl the length normalization reduces to k1 alone.
        let weights = Bm25Weights::new(200.0);
        let w = weights.weigh(&freqs(&[("invoice", 1)]), 200).values[0];
        let expected = (K1 + 1.0) / (1.0 + K1);
        assert!((f64::from(w) - expected).abs() < 1e-6);
    }

    #[test]
    fn zero_frequency_terms_are_dropped() {
        let weights = Bm25Weights::new(100.0);
        let sparse = weights.weigh(&freqs(&[("ghost", 0), ("real", 1)]), 10);
        assert_eq!(sparse.len(), 1);
    }

    #[test]
    fn nonpositive_avgdl_degrades_to_neutral() {
        let bad = Bm25Weights::new(0.0);
        let neutral = Bm25Weights::new(1.0);
        let tf = freqs(&[("invoice", 2)]);
        assert_eq!(bad.weigh(&tf, 10), neutral.weigh(&tf, 10));
    }
}
