use crate::index::{DocVector, SparseVector, TermId, Vocabulary};
use crate::vocabulary::TermCounts;

/// `ln(N / df)`. No smoothing: every vocabulary term has `df >= 1`.
/// A term present in every document gets weight 0 and drops out of vectors.
pub fn idf(df: u32, num_docs: u32) -> f32 {
    if df == 0 || num_docs == 0 { return 0.0; }
    (f64::from(num_docs) / f64::from(df)).ln() as f32
}

/// Raw-count TF times IDF over the tokens that made it into the vocabulary.
pub(crate) fn weighted_vector<F>(counts: &TermCounts, vocabulary: &Vocabulary, idf_of: F) -> SparseVector
where
    F: Fn(TermId) -> f32,
{
    let pairs: Vec<(TermId, f32)> = counts
        .iter()
        .filter_map(|(token, &tf)| {
            let tid = vocabulary.id(token)?;
            Some((tid, tf as f32 * idf_of(tid)))
        })
        .collect();
    SparseVector::from_unsorted(pairs)
}

/// One weighted vector per document, aligned with `doc_terms`.
pub fn weigh(doc_terms: &[TermCounts], vocabulary: &Vocabulary, df: &[u32], num_docs: u32) -> Vec<DocVector> {
    let idf_table: Vec<f32> = df.iter().map(|&d| idf(d, num_docs)).collect();
    doc_terms
        .iter()
        .map(|counts| DocVector::new(weighted_vector(counts, vocabulary, |tid| idf_table[tid as usize])))
        .collect()
}
