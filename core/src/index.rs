use crate::error::BuildError;
use crate::vocabulary::build_vocabulary;
use crate::weights::weigh;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;

pub type TermId = u32;
pub type DocId = u32;

/// Sparse weighted vector. Entries are sorted by strictly increasing term id
/// and every stored weight is finite and > 0.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    entries: Vec<(TermId, f32)>,
}

impl SparseVector {
    pub fn new() -> Self { Self::default() }

    /// Build from pairs in any order. Non-positive weights are dropped and
    /// repeated term ids are summed.
    pub fn from_unsorted(mut pairs: Vec<(TermId, f32)>) -> Self {
        pairs.sort_unstable_by_key(|&(t, _)| t);
        let mut entries: Vec<(TermId, f32)> = Vec::with_capacity(pairs.len());
        for (term, weight) in pairs {
            match entries.last_mut() {
                Some(last) if last.0 == term => last.1 += weight,
                _ => entries.push((term, weight)),
            }
        }
        entries.retain(|&(_, w)| w.is_finite() && w > 0.0);
        Self { entries }
    }

    pub fn entries(&self) -> &[(TermId, f32)] { &self.entries }
    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn weight(&self, term: TermId) -> Option<f32> {
        self.entries.binary_search_by_key(&term, |&(t, _)| t).ok().map(|i| self.entries[i].1)
    }

    /// L2 magnitude.
    pub fn norm(&self) -> f32 {
        self.entries.iter().map(|&(_, w)| w * w).sum::<f32>().sqrt()
    }

    /// Dot product by merging both id-sorted entry lists.
    pub fn dot(&self, other: &SparseVector) -> f32 {
        let (a, b) = (&self.entries, &other.entries);
        let mut sum = 0.0f32;
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            match a[i].0.cmp(&b[j].0) {
                std::cmp::Ordering::Equal => {
                    sum += a[i].1 * b[j].1;
                    i += 1;
                    j += 1;
                }
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
            }
        }
        sum
    }
}

/// Bijection between retained tokens and dense ids `0..len`.
/// Ids follow lexicographic token order.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    terms: Vec<String>,
    dictionary: HashMap<String, TermId>,
}

impl Vocabulary {
    /// `terms` must already be sorted and free of duplicates.
    pub(crate) fn from_sorted(terms: Vec<String>) -> Self {
        debug_assert!(terms.windows(2).all(|w| w[0] < w[1]));
        let dictionary = terms.iter().enumerate().map(|(i, t)| (t.clone(), i as TermId)).collect();
        Self { terms, dictionary }
    }

    pub fn len(&self) -> usize { self.terms.len() }
    pub fn is_empty(&self) -> bool { self.terms.is_empty() }
    pub fn id(&self, token: &str) -> Option<TermId> { self.dictionary.get(token).copied() }
    pub fn term(&self, id: TermId) -> Option<&str> { self.terms.get(id as usize).map(String::as_str) }
    pub fn terms(&self) -> &[String] { &self.terms }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Tokens found in fewer documents are dropped.
    pub min_document_frequency: u32,
    /// Tokens found in more than `ratio * N` documents are dropped.
    pub max_document_frequency_ratio: f64,
    /// Keep at most this many tokens, highest corpus-wide term frequency first.
    pub max_vocabulary_size: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self { min_document_frequency: 2, max_document_frequency_ratio: 0.8, max_vocabulary_size: 5000 }
    }
}

impl IndexConfig {
    pub fn validate(&self) -> Result<(), BuildError> {
        if self.min_document_frequency < 1 {
            return Err(BuildError::InvalidConfig(format!(
                "min_document_frequency must be >= 1, got {}",
                self.min_document_frequency
            )));
        }
        let ratio = self.max_document_frequency_ratio;
        if !(ratio > 0.0 && ratio <= 1.0) {
            return Err(BuildError::InvalidConfig(format!(
                "max_document_frequency_ratio must be in (0, 1], got {ratio}"
            )));
        }
        if self.max_vocabulary_size < 1 {
            return Err(BuildError::InvalidConfig("max_vocabulary_size must be >= 1".into()));
        }
        Ok(())
    }
}

/// A document's weighted vector with its precomputed L2 norm.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocVector {
    pub vector: SparseVector,
    pub norm: f32,
}

impl DocVector {
    pub fn new(vector: SparseVector) -> Self {
        let norm = vector.norm();
        Self { vector, norm }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    pub document_count: usize,
    pub vocabulary_size: usize,
    pub min_document_frequency: u32,
    pub max_document_frequency_ratio: f64,
    pub max_vocabulary_size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredResult {
    pub doc_id: DocId,
    /// Cosine similarity in [0, 1].
    pub score: f32,
    /// 1-based position in the result list.
    pub rank: usize,
}

/// The built corpus. Immutable once constructed; share it behind `&` or `Arc`.
#[derive(Debug, Clone)]
pub struct Index {
    config: IndexConfig,
    num_docs: u32,
    vocabulary: Vocabulary,
    df: Vec<u32>,
    docs: Vec<DocVector>,
}

impl Index {
    /// Build the index from the full ordered corpus. Document ids are positions
    /// in `documents`.
    pub fn build<S: AsRef<str> + Sync>(documents: &[S], config: IndexConfig) -> Result<Self, BuildError> {
        config.validate()?;
        if documents.is_empty() {
            return Err(BuildError::EmptyCorpus);
        }
        let start = Instant::now();
        let num_docs = u32::try_from(documents.len())
            .map_err(|_| BuildError::InvalidConfig(format!("corpus of {} documents exceeds u32 ids", documents.len())))?;

        let built = build_vocabulary(documents, &config);
        let docs = weigh(&built.doc_terms, &built.vocabulary, &built.df, num_docs);
        let empty_docs = docs.iter().filter(|d| d.vector.is_empty()).count();

        let elapsed = start.elapsed();
        tracing::info!(
            num_docs,
            vocabulary_size = built.vocabulary.len(),
            empty_docs,
            took_ms = elapsed.as_millis() as u64,
            "index built"
        );
        Ok(Self { config, num_docs, vocabulary: built.vocabulary, df: built.df, docs })
    }

    /// `build`, except an empty corpus yields the degenerate empty index.
    pub fn build_or_empty<S: AsRef<str> + Sync>(documents: &[S], config: IndexConfig) -> Result<Self, BuildError> {
        match Self::build(documents, config) {
            Err(BuildError::EmptyCorpus) => Self::empty(config),
            other => other,
        }
    }

    /// The degenerate index over zero documents.
    pub fn empty(config: IndexConfig) -> Result<Self, BuildError> {
        config.validate()?;
        tracing::warn!("corpus is empty; publishing an index with no documents");
        Ok(Self { config, num_docs: 0, vocabulary: Vocabulary::default(), df: Vec::new(), docs: Vec::new() })
    }

    pub fn config(&self) -> &IndexConfig { &self.config }
    pub fn num_docs(&self) -> u32 { self.num_docs }
    pub fn vocabulary(&self) -> &Vocabulary { &self.vocabulary }
    /// Document frequency per term id.
    pub fn df(&self) -> &[u32] { &self.df }
    pub fn docs(&self) -> &[DocVector] { &self.docs }
    pub fn doc(&self, doc_id: DocId) -> Option<&DocVector> { self.docs.get(doc_id as usize) }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            document_count: self.num_docs as usize,
            vocabulary_size: self.vocabulary.len(),
            min_document_frequency: self.config.min_document_frequency,
            max_document_frequency_ratio: self.config.max_document_frequency_ratio,
            max_vocabulary_size: self.config.max_vocabulary_size,
        }
    }
}
