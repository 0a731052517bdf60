//! TF-IDF / cosine retrieval over a small, fixed corpus of short texts.
//!
//! Build once with [`Index::build`], publish through [`SearchEngine`], then
//! query concurrently. Weights are raw term count times `ln(N / df)`.

pub mod corpus;
pub mod engine;
pub mod error;
pub mod index;
pub mod normalizer;
pub mod query;
pub mod rank;
pub mod vocabulary;
pub mod weights;

pub use corpus::{Corpus, CorpusOptions};
pub use engine::{query, SearchEngine, SearchHit};
pub use error::{BuildError, PublishError, QueryError};
pub use index::{DocId, DocVector, Index, IndexConfig, IndexStats, ScoredResult, SparseVector, TermId, Vocabulary};
