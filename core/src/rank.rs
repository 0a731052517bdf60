use crate::index::{DocId, DocVector, Index, ScoredResult, SparseVector};
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// Ordered so that a greater candidate ranks higher: better score first,
/// lower doc id on ties.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    doc_id: DocId,
    score: f32,
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score.total_cmp(&other.score).then_with(|| other.doc_id.cmp(&self.doc_id))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool { self.cmp(other) == Ordering::Equal }
}

impl Eq for Candidate {}

/// Cosine similarity clamped to [0, 1]. Zero when either side has no weight.
pub fn cosine(query: &SparseVector, query_norm: f32, doc: &DocVector) -> f32 {
    if query_norm == 0.0 || doc.norm == 0.0 { return 0.0; }
    (query.dot(&doc.vector) / (query_norm * doc.norm)).clamp(0.0, 1.0)
}

/// Score every document against `query` and return the best `top_k`
/// (clamped to `[1, N]`), with 1-based ranks.
///
/// An empty query vector yields no results. Otherwise the output holds
/// exactly `min(top_k, N)` entries; zero-score documents fill the tail in
/// ascending id order.
pub fn rank(query: &SparseVector, index: &Index, top_k: usize) -> Vec<ScoredResult> {
    let n = index.docs().len();
    let query_norm = query.norm();
    if n == 0 || query_norm == 0.0 {
        return Vec::new();
    }
    let k = top_k.clamp(1, n);

    // Min-heap of the k best seen so far.
    let mut heap: BinaryHeap<Reverse<Candidate>> = BinaryHeap::with_capacity(k + 1);
    for (i, doc) in index.docs().iter().enumerate() {
        let candidate = Candidate { doc_id: i as DocId, score: cosine(query, query_norm, doc) };
        if heap.len() < k {
            heap.push(Reverse(candidate));
        } else if heap.peek().is_some_and(|Reverse(worst)| candidate > *worst) {
            heap.pop();
            heap.push(Reverse(candidate));
        }
    }

    let mut top: Vec<Candidate> = heap.into_iter().map(|Reverse(c)| c).collect();
    top.sort_unstable_by(|a, b| b.cmp(a));
    top.into_iter()
        .enumerate()
        .map(|(i, c)| ScoredResult { doc_id: c.doc_id, score: c.score, rank: i + 1 })
        .collect()
}
