//! Taxonomy catalogue records and the in-memory vector matrix the matcher
//! scans.

use crate::error::{Error, Result};
use crate::vector::Vector;
use serde::{Deserialize, Serialize};

/// Catalogue record: one canonical ingredient concept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyEntry {
    pub id: i64,
    pub name: String,
    pub category_id: Option<i64>,
}

/// One row of the taxonomy vector table. `taxonomy_id` is not unique:
/// singular and plural forms share an id.
#[derive(Debug, Clone, PartialEq)]
pub struct TaxonomyRow {
    pub row_id: i64,
    pub taxonomy_id: i64,
    pub vector: Vector,
}

impl TaxonomyRow {
    /// Build a row from its stored text form.
    pub fn parse(row_id: i64, taxonomy_id: i64, vector_text: &str) -> Result<Self> {
        Ok(Self {
            row_id,
            taxonomy_id,
            vector: parse_vector_text(row_id, vector_text)?,
        })
    }
}

/// Parse `[0.1, 0.2, ...]`. Enclosing brackets and whitespace are stripped
/// before splitting on commas.
pub fn parse_vector_text(row_id: i64, text: &str) -> Result<Vector> {
    let inner = text.trim_matches(|c: char| c == '[' || c == ']' || c.is_whitespace());
    if inner.is_empty() {
        return Err(Error::InvalidVector {
            row: row_id,
            reason: "no components".to_string(),
        });
    }

    let mut data = Vec::new();
    for part in inner.split(',') {
        let part = part.trim();
        let value: f32 = part.parse().map_err(|_| Error::InvalidVector {
            row: row_id,
            reason: format!("'{}' is not a number", part),
        })?;
        if !value.is_finite() {
            return Err(Error::InvalidVector {
                row: row_id,
                reason: format!("non-finite component '{}'", part),
            });
        }
        data.push(value);
    }
    Ok(Vector::new(data))
}

/// Row-normalized M×D matrix plus the taxonomy id of each row.
#[derive(Debug, Clone)]
pub struct TaxonomyIndex {
    ids: Vec<i64>,
    matrix: Vec<f32>,
    dim: usize,
}

impl TaxonomyIndex {
    /// Build from parsed rows. Every row must share one dimension, and that
    /// dimension must equal `expected_dim` when given.
    pub fn from_rows(rows: Vec<TaxonomyRow>, expected_dim: Option<usize>) -> Result<Self> {
        let first = rows.first().ok_or(Error::EmptyTaxonomy)?;
        let dim = first.vector.dim();

        if let Some(expected) = expected_dim {
            if dim != expected {
                return Err(Error::InvalidDimension {
                    expected,
                    actual: dim,
                });
            }
        }

        let mut ids = Vec::with_capacity(rows.len());
        let mut matrix = Vec::with_capacity(rows.len() * dim);
        for row in rows {
            if row.vector.dim() != dim {
                return Err(Error::InvalidDimension {
                    expected: dim,
                    actual: row.vector.dim(),
                });
            }
            ids.push(row.taxonomy_id);
            matrix.extend_from_slice(row.vector.normalized().as_slice());
        }

        Ok(Self { ids, matrix, dim })
    }

    /// Build directly from vectors and their ids.
    pub fn from_vectors(vectors: &[Vector], ids: &[i64]) -> Result<Self> {
        if vectors.len() != ids.len() {
            return Err(Error::LengthMismatch {
                context: "taxonomy vectors and ids",
                expected: vectors.len(),
                actual: ids.len(),
            });
        }
        let rows = vectors
            .iter()
            .zip(ids)
            .enumerate()
            .map(|(i, (v, &id))| TaxonomyRow {
                row_id: i as i64,
                taxonomy_id: id,
                vector: v.clone(),
            })
            .collect();
        Self::from_rows(rows, None)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }

    #[inline]
    #[must_use]
    pub fn ids(&self) -> &[i64] {
        &self.ids
    }

    /// Unit-length row `i`.
    #[inline]
    #[must_use]
    pub fn row(&self, i: usize) -> &[f32] {
        &self.matrix[i * self.dim..(i + 1) * self.dim]
    }
}
