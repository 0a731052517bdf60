use crate::corpus::Corpus;
use crate::error::{PublishError, QueryError};
use crate::index::{DocId, Index, IndexStats, ScoredResult};
use crate::normalizer::clean_text;
use crate::query::vectorize;
use crate::rank::rank;
use serde::Serialize;
use std::sync::OnceLock;
use std::time::Instant;

/// A ranked hit with the raw and normalized text attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub rank: usize,
    pub doc_id: DocId,
    pub score: f32,
    pub text: String,
    pub cleaned_text: String,
}

/// Vectorize `text` against `index` and rank. `top_k == 0` is rejected.
pub fn query(index: &Index, text: &str, top_k: usize) -> Result<Vec<ScoredResult>, QueryError> {
    if top_k == 0 {
        return Err(QueryError::InvalidTopK(top_k));
    }
    let start = Instant::now();
    let qv = vectorize(text, index.vocabulary(), index.df(), index.num_docs());
    let results = rank(&qv, index, top_k);
    tracing::debug!(query_terms = qv.len(), hits = results.len(), took_us = start.elapsed().as_micros() as u64, "query ranked");
    Ok(results)
}

struct Published {
    index: Index,
    corpus: Corpus,
}

/// Holds the one process-wide index. Published at most once, then read
/// concurrently without locking. A build that cannot complete is recorded
/// instead, and every later read reports it.
#[derive(Default)]
pub struct SearchEngine {
    published: OnceLock<Published>,
    failure: OnceLock<String>,
}

impl SearchEngine {
    pub fn new() -> Self { Self::default() }

    /// Build-and-publish shortcut for callers that already hold both halves.
    pub fn ready(index: Index, corpus: Corpus) -> Result<Self, PublishError> {
        let engine = Self::new();
        engine.publish(index, corpus)?;
        Ok(engine)
    }

    /// Make `index` visible to queries. The corpus must hold exactly the
    /// documents the index was built from, in the same order.
    pub fn publish(&self, index: Index, corpus: Corpus) -> Result<(), PublishError> {
        if self.failure.get().is_some() {
            return Err(PublishError::AlreadyFailed);
        }
        if index.num_docs() as usize != corpus.len() {
            return Err(PublishError::CorpusMismatch { index: index.num_docs() as usize, corpus: corpus.len() });
        }
        let num_docs = index.num_docs();
        self.published.set(Published { index, corpus }).map_err(|_| PublishError::AlreadyPublished)?;
        tracing::info!(num_docs, "index published");
        Ok(())
    }

    /// Record that the index will never be published. Returns false when an
    /// index is already live or a failure was already recorded.
    pub fn fail(&self, reason: impl Into<String>) -> bool {
        if self.is_ready() {
            return false;
        }
        let reason = reason.into();
        tracing::error!(reason = %reason, "index marked as failed");
        self.failure.set(reason).is_ok()
    }

    pub fn is_ready(&self) -> bool { self.published.get().is_some() }

    /// Why the build failed, if it did.
    pub fn failure(&self) -> Option<&str> { self.failure.get().map(String::as_str) }

    fn published(&self) -> Result<&Published, QueryError> {
        match self.published.get() {
            Some(p) => Ok(p),
            None if self.failure.get().is_some() => Err(QueryError::BuildFailed),
            None => Err(QueryError::IndexNotReady),
        }
    }

    pub fn index(&self) -> Result<&Index, QueryError> { self.published().map(|p| &p.index) }

    pub fn corpus(&self) -> Result<&Corpus, QueryError> { self.published().map(|p| &p.corpus) }

    pub fn query(&self, text: &str, top_k: usize) -> Result<Vec<ScoredResult>, QueryError> {
        query(&self.published()?.index, text, top_k)
    }

    pub fn stats(&self) -> Result<IndexStats, QueryError> { Ok(self.published()?.index.stats()) }

    /// Raw text by document id; `None` for an id outside the corpus.
    pub fn document_text(&self, doc_id: DocId) -> Result<Option<&str>, QueryError> {
        Ok(self.published()?.corpus.get(doc_id))
    }

    /// `query` with the raw and cleaned text of every hit attached.
    pub fn search(&self, text: &str, top_k: usize) -> Result<Vec<SearchHit>, QueryError> {
        let published = self.published()?;
        let results = query(&published.index, text, top_k)?;
        Ok(results
            .into_iter()
            .filter_map(|r| {
                let raw = published.corpus.get(r.doc_id)?;
                Some(SearchHit { rank: r.rank, doc_id: r.doc_id, score: r.score, text: raw.to_string(), cleaned_text: clean_text(raw) })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::IndexConfig;

    const DOCS: [&str; 3] = ["strong border policy now", "we need strong borders", "healthcare reform now"];

    fn config() -> IndexConfig {
        IndexConfig { min_document_frequency: 1, ..Default::default() }
    }

    #[test]
    fn not_ready_before_publish() {
        let engine = SearchEngine::new();
        assert!(!engine.is_ready());
        assert_eq!(engine.query("border", 3).unwrap_err(), QueryError::IndexNotReady);
        assert_eq!(engine.stats().unwrap_err(), QueryError::IndexNotReady);
        assert_eq!(engine.document_text(0).unwrap_err(), QueryError::IndexNotReady);
        assert_eq!(engine.search("border", 3).unwrap_err(), QueryError::IndexNotReady);
    }

    #[test]
    fn publishes_once() {
        let engine = SearchEngine::new();
        let index = Index::build(&DOCS, config()).unwrap();
        engine.publish(index.clone(), Corpus::from_texts(DOCS)).unwrap();
        assert!(engine.is_ready());
        assert_eq!(engine.publish(index, Corpus::from_texts(DOCS)).unwrap_err(), PublishError::AlreadyPublished);
    }

    #[test]
    fn failed_build_is_reported_and_final() {
        let engine = SearchEngine::new();
        assert!(engine.fail("corpus path does not exist"));
        assert!(!engine.is_ready());
        assert_eq!(engine.failure(), Some("corpus path does not exist"));
        assert_eq!(engine.query("border", 3).unwrap_err(), QueryError::BuildFailed);
        assert_eq!(engine.stats().unwrap_err(), QueryError::BuildFailed);
        assert!(!engine.fail("second reason"));
        assert_eq!(engine.failure(), Some("corpus path does not exist"));
        let index = Index::build(&DOCS, config()).unwrap();
        assert_eq!(engine.publish(index, Corpus::from_texts(DOCS)).unwrap_err(), PublishError::AlreadyFailed);
    }

    #[test]
    fn fail_after_publish_is_ignored() {
        let engine = SearchEngine::ready(Index::build(&DOCS, config()).unwrap(), Corpus::from_texts(DOCS)).unwrap();
        assert!(!engine.fail("late"));
        assert_eq!(engine.failure(), None);
        assert!(engine.query("border", 1).is_ok());
    }

    #[test]
    fn rejects_mismatched_corpus() {
        let index = Index::build(&DOCS, config()).unwrap();
        let err = SearchEngine::ready(index, Corpus::from_texts(["only one"])).err().unwrap();
        assert_eq!(err, PublishError::CorpusMismatch { index: 3, corpus: 1 });
    }

    #[test]
    fn zero_top_k_is_invalid() {
        let engine = SearchEngine::ready(Index::build(&DOCS, config()).unwrap(), Corpus::from_texts(DOCS)).unwrap();
        assert_eq!(engine.query("border", 0).unwrap_err(), QueryError::InvalidTopK(0));
    }

    #[test]
    fn search_attaches_text() {
        let engine = SearchEngine::ready(Index::build(&DOCS, config()).unwrap(), Corpus::from_texts(DOCS)).unwrap();
        let hits = engine.search("strong border", 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].rank, 1);
        assert_eq!(hits[0].text, DOCS[hits[0].doc_id as usize]);
        assert_eq!(hits[0].cleaned_text, clean_text(&hits[0].text));
        assert_eq!(engine.document_text(2).unwrap(), Some("healthcare reform now"));
        assert_eq!(engine.document_text(9).unwrap(), None);
    }
}
