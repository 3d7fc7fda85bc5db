//! Runtime configuration.
//!
//! Every field has a default; a JSON file only needs the fields it changes:
//!
//! ```json
//! {
//!   "data_dir": "/var/lib/pantry",
//!   "match_threshold": 0.85,
//!   "unit_conversions": { "mg": { "factor": 0.001, "unit": "g" } }
//! }
//! ```

use crate::error::{PantryError, Result};
use pantry_aggregate::{AggregationPlan, AllergenLabels, EntityKey, UnitTable, DEFAULT_DATA_SOURCE, DEFAULT_MATCH_THRESHOLD};
use pantry_storage::TableNames;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Embedding dimension of the reference deployment.
pub const DEFAULT_EMBEDDING_DIM: usize = 768;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PantryConfig {
    pub data_dir: PathBuf,
    pub tables: TableNames,
    pub embedding_dim: usize,
    pub match_threshold: f64,
    pub data_source: String,
    pub unit_conversions: UnitTable,
    pub allergen_labels: AllergenLabels,
}

impl Default for PantryConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            tables: TableNames::default(),
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            data_source: DEFAULT_DATA_SOURCE.to_string(),
            unit_conversions: UnitTable::default(),
            allergen_labels: AllergenLabels::default(),
        }
    }
}

impl PantryConfig {
    /// Defaults, overridden by the file at `path` when given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)?;
                serde_json::from_str(&text)?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.embedding_dim == 0 {
            return Err(PantryError::Config("embedding_dim must be positive".to_string()));
        }
        if !(-1.0..=1.0).contains(&self.match_threshold) {
            return Err(PantryError::Config(format!(
                "match_threshold {} must lie in [-1, 1]",
                self.match_threshold
            )));
        }
        if self.allergen_labels.absent == self.allergen_labels.present {
            return Err(PantryError::Config("allergen labels must differ".to_string()));
        }
        Ok(())
    }

    /// Aggregation plan keyed by `key`, filtered at the match threshold.
    #[must_use]
    pub fn aggregation_plan(&self, key: EntityKey) -> AggregationPlan {
        AggregationPlan {
            key,
            min_score: Some(self.match_threshold),
            data_source: self.data_source.clone(),
            units: self.unit_conversions.clone(),
        }
    }
}
