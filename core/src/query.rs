use crate::index::{SparseVector, Vocabulary};
use crate::vocabulary::count_terms;
use crate::weights::{idf, weighted_vector};

/// Project a query into the frozen vocabulary's weight space. Tokens the
/// vocabulary does not know contribute nothing; an empty vector is a valid result.
pub fn vectorize(query: &str, vocabulary: &Vocabulary, df: &[u32], num_docs: u32) -> SparseVector {
    if vocabulary.is_empty() { return SparseVector::new(); }
    let counts = count_terms(query);
    weighted_vector(&counts, vocabulary, |tid| idf(df.get(tid as usize).copied().unwrap_or(0), num_docs))
}
