//! Exhaustive cosine-similarity matching.
//!
//! ```text
//!   queries (N×D) ──normalize──┐
//!                              ├── N×M similarities ── argmax per row ── (id, score)
//!   taxonomy (M×D, unit rows) ─┘
//! ```
//!
//! The taxonomy is small, so every query is compared with every row. Ties
//! resolve to the lowest column index.

use crate::error::{Error, Result};
use crate::round::{round_to, STORED_SCORE_DECIMALS};
use crate::simd::dot_product_simd;
use crate::taxonomy::TaxonomyIndex;
use crate::vector::Vector;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Best taxonomy match for one query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub taxonomy_id: i64,
    /// Cosine similarity, rounded to 5 decimals.
    pub score: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SimilarityMatcher;

impl SimilarityMatcher {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// One result per query, in query order. A best match is always
    /// returned, however low its score.
    pub fn match_vectors(&self, queries: &[Vector], index: &TaxonomyIndex) -> Result<Vec<MatchResult>> {
        if index.is_empty() {
            return Err(Error::EmptyTaxonomy);
        }
        if queries.is_empty() {
            return Err(Error::EmptyBatch);
        }
        for q in queries {
            if q.dim() != index.dim() {
                return Err(Error::InvalidDimension {
                    expected: index.dim(),
                    actual: q.dim(),
                });
            }
        }

        let results: Vec<MatchResult> = queries
            .par_iter()
            .map(|q| best_match(&q.normalized(), index))
            .collect();

        debug!(queries = queries.len(), taxonomy = index.len(), "Matched batch");
        Ok(results)
    }

    /// Column-oriented form: matched ids and scores as parallel sequences.
    pub fn match_ids(&self, queries: &[Vector], index: &TaxonomyIndex) -> Result<(Vec<i64>, Vec<f64>)> {
        Ok(self
            .match_vectors(queries, index)?
            .into_iter()
            .map(|m| (m.taxonomy_id, m.score))
            .unzip())
    }
}

fn best_match(query: &Vector, index: &TaxonomyIndex) -> MatchResult {
    let q = query.as_slice();
    let mut best_col = 0;
    let mut best = dot_product_simd(q, index.row(0));

    for col in 1..index.len() {
        let sim = dot_product_simd(q, index.row(col));
        // strictly greater keeps the first maximum; NaN never wins
        if sim > best || (best.is_nan() && !sim.is_nan()) {
            best = sim;
            best_col = col;
        }
    }

    MatchResult {
        taxonomy_id: index.ids()[best_col],
        score: round_to(f64::from(best), STORED_SCORE_DECIMALS),
    }
}
