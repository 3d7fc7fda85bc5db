//! Wide observation rows to long-form records.
//!
//! ```text
//!  observation ──┬── score row                (always, unless the score is null)
//!                ├── quantity rows            (value AND unit present)
//!                └── allergen rows            (flag present)
//! ```

use crate::observation::{EntityId, EntityKey, Observation};
use crate::schema::{quantity_property, PropertyType, ALLERGEN_COLUMNS, QUANTITY_STEMS, SCORE_PROPERTY};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// The value of a record, tagged by the statistic it will receive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "property_type", rename_all = "snake_case")]
pub enum Measurement {
    Score { value: f64 },
    MacroNutrient { value: f64, unit: String },
    Allergen { value: f64 },
}

impl Measurement {
    #[must_use]
    pub fn property_type(&self) -> PropertyType {
        match self {
            Measurement::Score { .. } => PropertyType::Score,
            Measurement::MacroNutrient { .. } => PropertyType::MacroNutrient,
            Measurement::Allergen { .. } => PropertyType::Allergen,
        }
    }

    #[must_use]
    pub fn value(&self) -> f64 {
        match self {
            Measurement::Score { value }
            | Measurement::MacroNutrient { value, .. }
            | Measurement::Allergen { value } => *value,
        }
    }

    #[must_use]
    pub fn unit(&self) -> Option<&str> {
        match self {
            Measurement::MacroNutrient { unit, .. } => Some(unit.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LongRecord {
    pub entity: EntityId,
    pub ingredient_id: i64,
    /// Lower-cased property name
    pub property: String,
    pub measurement: Measurement,
    pub data_source: Arc<str>,
}

impl LongRecord {
    #[inline]
    #[must_use]
    pub fn property_type(&self) -> PropertyType {
        self.measurement.property_type()
    }
}

#[derive(Debug, Clone)]
pub struct Reshaper {
    key: EntityKey,
    data_source: Arc<str>,
}

impl Reshaper {
    #[must_use]
    pub fn new(key: EntityKey, data_source: &str) -> Self {
        Self {
            key,
            data_source: Arc::from(data_source),
        }
    }

    /// Score records first, then quantities, then allergens. Observations
    /// whose entity key is null produce nothing.
    #[must_use]
    pub fn reshape(&self, observations: &[Observation]) -> Vec<LongRecord> {
        let keyed: Vec<(EntityId, &Observation)> = observations
            .iter()
            .filter_map(|o| self.key.select(o).map(|e| (e, o)))
            .collect();

        let properties: Vec<String> = QUANTITY_STEMS.iter().map(|s| quantity_property(s)).collect();
        let allergens: Vec<String> = ALLERGEN_COLUMNS.iter().map(|c| c.to_lowercase()).collect();

        let mut out = Vec::new();

        for (entity, obs) in &keyed {
            if let Some(value) = obs.matched_score {
                out.push(self.record(entity, obs, SCORE_PROPERTY.to_string(), Measurement::Score { value }));
            }
        }

        for (entity, obs) in &keyed {
            for (property, q) in properties.iter().zip(&obs.quantities) {
                if let (Some(value), Some(unit)) = (q.value, &q.unit) {
                    let m = Measurement::MacroNutrient {
                        value,
                        unit: unit.clone(),
                    };
                    out.push(self.record(entity, obs, property.clone(), m));
                }
            }
        }

        for (entity, obs) in &keyed {
            for (property, flag) in allergens.iter().zip(&obs.allergens) {
                if let Some(value) = *flag {
                    out.push(self.record(entity, obs, property.clone(), Measurement::Allergen { value }));
                }
            }
        }

        debug!(
            observations = observations.len(),
            keyed = keyed.len(),
            records = out.len(),
            "Reshaped observations"
        );
        out
    }

    fn record(&self, entity: &EntityId, obs: &Observation, property: String, measurement: Measurement) -> LongRecord {
        LongRecord {
            entity: entity.clone(),
            ingredient_id: obs.ingredient_id,
            property,
            measurement,
            data_source: Arc::clone(&self.data_source),
        }
    }
}
