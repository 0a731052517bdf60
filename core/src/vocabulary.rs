use crate::index::{IndexConfig, Vocabulary};
use crate::normalizer::normalize;
use rayon::prelude::*;
use std::collections::HashMap;

/// Raw token -> occurrence count within one text.
pub type TermCounts = HashMap<String, u32>;

pub struct VocabularyBuild {
    pub vocabulary: Vocabulary,
    /// Document frequency per term id.
    pub df: Vec<u32>,
    /// Per-document term counts, aligned with the input order. Keyed by raw
    /// token, so tokens that were filtered out are still present.
    pub doc_terms: Vec<TermCounts>,
}

pub fn count_terms(text: &str) -> TermCounts {
    let mut counts = TermCounts::new();
    for token in normalize(text) {
        *counts.entry(token).or_insert(0) += 1;
    }
    counts
}

/// Scan the corpus once and keep the tokens that pass the document-frequency
/// filters and the size cap.
pub fn build_vocabulary<S: AsRef<str> + Sync>(documents: &[S], config: &IndexConfig) -> VocabularyBuild {
    let doc_terms: Vec<TermCounts> = documents.par_iter().map(|d| count_terms(d.as_ref())).collect();

    let (vocabulary, df) = {
        let mut df_raw: HashMap<&str, u32> = HashMap::new();
        let mut tf_total: HashMap<&str, u64> = HashMap::new();
        for counts in &doc_terms {
            for (token, &count) in counts {
                *df_raw.entry(token.as_str()).or_insert(0) += 1;
                *tf_total.entry(token.as_str()).or_insert(0) += u64::from(count);
            }
        }
        let scanned = df_raw.len();

        let max_df = config.max_document_frequency_ratio * documents.len() as f64;
        let mut kept: Vec<(&str, u32)> = df_raw
            .into_iter()
            .filter(|&(_, df)| df >= config.min_document_frequency && f64::from(df) <= max_df)
            .collect();
        let after_df_filters = kept.len();

        if kept.len() > config.max_vocabulary_size {
            kept.sort_unstable_by(|a, b| tf_total[b.0].cmp(&tf_total[a.0]).then_with(|| a.0.cmp(b.0)));
            kept.truncate(config.max_vocabulary_size);
        }
        kept.sort_unstable_by(|a, b| a.0.cmp(b.0));

        let df: Vec<u32> = kept.iter().map(|&(_, df)| df).collect();
        let vocabulary = Vocabulary::from_sorted(kept.into_iter().map(|(t, _)| t.to_string()).collect());
        tracing::debug!(scanned, after_df_filters, vocabulary_size = vocabulary.len(), "vocabulary filtered");
        (vocabulary, df)
    };

    VocabularyBuild { vocabulary, df, doc_terms }
}
