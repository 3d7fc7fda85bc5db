//! # Pantry Core
//!
//! Matching core for Pantry: free-text ingredient names in, taxonomy ids out.
//!
//! - [`TextNormalizer`] - letters-only, lowercase, stopword-free text
//! - [`Embedder`] - boundary to the embedding model, plus the offline [`HashEmbedder`]
//! - [`TaxonomyIndex`] - unit-normalized taxonomy vectors with their ids
//! - [`SimilarityMatcher`] - exhaustive cosine matching, first maximum wins
//! - [`ReferenceContext`] - loaded taxonomy and stopwords with explicit reload
//! - [`Table`] - nullable text rows shared with the aggregation and storage crates
//!
//! ## Example
//!
//! ```rust
//! use pantry_core::{SimilarityMatcher, TaxonomyIndex, Vector};
//!
//! let taxonomy = vec![
//!     Vector::new(vec![0.6, 0.8]),
//!     Vector::new(vec![1.0, 0.0]),
//!     Vector::new(vec![1.0, 1.0]),
//! ];
//! let index = TaxonomyIndex::from_vectors(&taxonomy, &[1, 2, 2]).unwrap();
//!
//! let queries = vec![Vector::new(vec![1.0, 1.0]), Vector::new(vec![0.6, 0.8])];
//! let (ids, scores) = SimilarityMatcher::new().match_ids(&queries, &index).unwrap();
//! assert_eq!(ids, vec![2, 1]);
//! assert_eq!(scores, vec![1.0, 1.0]);
//! ```

pub mod context;
pub mod embedder;
pub mod error;
pub mod matcher;
pub mod round;
pub mod table;
pub mod taxonomy;
pub mod text;
pub mod vector;

/// Dot-product kernels (AVX2/FMA on x86_64, scalar elsewhere)
pub mod simd;

pub use context::{ReferenceContext, ReferenceData, ReferenceLoader};
pub use embedder::{encode_checked, Embedder, HashEmbedder};
pub use error::{BoxError, Error, Result};
pub use matcher::{MatchResult, SimilarityMatcher};
pub use round::round_to;
pub use table::{Cell, Table};
pub use taxonomy::{parse_vector_text, TaxonomyEntry, TaxonomyIndex, TaxonomyRow};
pub use text::{StopwordSet, TextNormalizer};
pub use vector::Vector;
