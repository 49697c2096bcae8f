//! Similarity matching over the corpus.
//!
//! Matching is a linear scan: every record's vector is compared to the query
//! vector by cosine distance and the results are stable-sorted ascending, so
//! ties keep their corpus insertion order. No index is maintained.

use serde::Serialize;

use crate::model::{Corpus, FunctionRecord};

/// Cosine distance between two vectors, or an explicit marker when the
/// distance is undefined.
///
/// Cosine distance is undefined when either vector has zero norm. That case
/// is surfaced as [`Distance::Indeterminate`] rather than a NaN; for ranking
/// purposes it orders as 1.0 (the distance of orthogonal vectors).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Distance {
    Finite(f32),
    Indeterminate,
}

impl Distance {
    /// Value used for ordering and display. `Indeterminate` maps to 1.0.
    pub fn value(&self) -> f32 {
        match self {
            Distance::Finite(d) => *d,
            Distance::Indeterminate => 1.0,
        }
    }

    pub fn is_indeterminate(&self) -> bool {
        matches!(self, Distance::Indeterminate)
    }
}

/// One corpus record annotated with its distance to a query target.
#[derive(Debug, Clone, Serialize)]
pub struct Scored {
    pub record: FunctionRecord,
    pub distance: Distance,
}

/// Cosine distance (1 − cosine similarity) between `a` and `b`.
///
/// 0 = identical direction, up to 2 = opposite direction.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> Distance {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Distance::Indeterminate;
    }
    // Clamp at zero: identical directions can drift to -epsilon in f32.
    Distance::Finite((1.0 - dot / (norm_a.sqrt() * norm_b.sqrt())).max(0.0))
}

/// Score every corpus record against `target` and return them ordered by
/// ascending distance (closest first).
///
/// The output always has exactly as many entries as the corpus. Records
/// without a vector should not exist in a well-formed corpus; if one is
/// encountered anyway it scores as indeterminate rather than panicking.
pub fn rank(corpus: &Corpus, target: &[f32]) -> Vec<Scored> {
    let mut scored: Vec<Scored> = corpus
        .iter()
        .map(|record| {
            let distance = match &record.vector {
                Some(v) => cosine_distance(v, target),
                None => Distance::Indeterminate,
            };
            Scored { record: record.clone(), distance }
        })
        .collect();

    // Stable sort preserves corpus order for equal distances.
    scored.sort_by(|a, b| {
        a.distance.value().partial_cmp(&b.distance.value()).unwrap_or(std::cmp::Ordering::Equal)
    });
    scored
}
