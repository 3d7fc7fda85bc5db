//! # Pantry
//!
//! Matches free-text ingredient names to a curated taxonomy and aggregates
//! per-taxonomy nutritional and allergen reference values from many observed
//! source records.
//!
//! ## Quick Start
//!
//! ### From the command line
//!
//! ```bash
//! pantry --data-dir ./data vectorise
//! pantry --data-dir ./data match "Crab BB X1kg" "Aubergines"
//! pantry --data-dir ./data score
//! pantry --data-dir ./data aggregate
//! pantry --data-dir ./data properties 1 66 117
//! ```
//!
//! ### As a library
//!
//! ```rust
//! use pantry::prelude::*;
//!
//! let normalizer = TextNormalizer::new(StopwordSet::from_words(["bb", "x", "kg"]));
//! assert_eq!(normalizer.normalize(&["Crab BB X1kg"]), vec!["crab"]);
//!
//! let stats = group_stats(PropertyType::MacroNutrient, &[5.0, 2.0, 8.0]).unwrap();
//! assert_eq!(stats.reference, 5.0);
//! assert_eq!(stats.mean_absolute_deviation, 3.0);
//! ```
//!
//! ## Crate Structure
//!
//! - `pantry-core` - text normalization, embedder boundary, taxonomy index, matcher, reference context
//! - `pantry-aggregate` - reshaping, unit normalization, reference statistics, tabular projection, property fill
//! - `pantry-storage` - CSV tables with replace-then-swap writes
//! - `pantry-api` - match and property-fill request/response shapes and service

pub mod config;
pub mod error;
pub mod pipeline;

pub use config::PantryConfig;
pub use error::{PantryError, Result};

// Re-export core types
pub use pantry_core::{
    Embedder, HashEmbedder, MatchResult, ReferenceContext, ReferenceLoader, SimilarityMatcher, StopwordSet, Table,
    TaxonomyEntry, TaxonomyIndex, TaxonomyRow, TextNormalizer, Vector,
};

// Re-export aggregation
pub use pantry_aggregate::{
    group_stats, AggregationPlan, AllergenLabels, EntityId, EntityKey, LongRecord, Measurement, PropertyFill,
    PropertyType, ReferenceAggregator, ReferenceProfile, Reshaper, TabularProfile, TabularProjector, UnitTable,
};

// Re-export storage and API
pub use pantry_api::{IngredientService, MatchRequest, MatchResponse, PropertiesRequest, PropertiesResponse};
pub use pantry_storage::{PantryStore, TableNames, TableStore};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        group_stats, AggregationPlan, AllergenLabels, Embedder, EntityId, EntityKey, HashEmbedder, IngredientService,
        MatchRequest, MatchResponse, PantryConfig, PantryError, PantryStore, PropertiesRequest, PropertiesResponse,
        PropertyType, ReferenceAggregator, ReferenceContext, ReferenceProfile, Reshaper, SimilarityMatcher,
        StopwordSet, Table, TabularProjector, TaxonomyIndex, TextNormalizer, UnitTable, Vector,
    };
}

/// Dot-product kernels
pub mod simd {
    pub use pantry_core::simd::{dot_product_simd, norm_simd};
}
