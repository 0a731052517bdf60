use thiserror::Error;

/// Failures of `Index::build`. Neither produces a partial index.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    #[error("corpus is empty")]
    EmptyCorpus,

    #[error("invalid index configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryError {
    #[error("index has not been published yet")]
    IndexNotReady,

    #[error("index build failed")]
    BuildFailed,

    #[error("top_k must be at least 1, got {0}")]
    InvalidTopK(usize),
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishError {
    #[error("an index has already been published")]
    AlreadyPublished,

    #[error("index build was already marked as failed")]
    AlreadyFailed,

    #[error("index covers {index} documents but the corpus holds {corpus}")]
    CorpusMismatch { index: usize, corpus: usize },
}
