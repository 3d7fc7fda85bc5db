//! Reference statistics per (entity, property type, property).

use crate::error::{AggregateError, Result};
use crate::observation::{EntityId, EntityKey, Observation};
use crate::reshape::{LongRecord, Reshaper};
use crate::schema::PropertyType;
use crate::units::UnitTable;
use ordered_float::OrderedFloat;
use pantry_core::round::{round_to, REFERENCE_DECIMALS};
use pantry_core::Table;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// Default minimum match score for observations entering aggregation.
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.8;

/// Default data-source tag carried by long-form records.
pub const DEFAULT_DATA_SOURCE: &str = "kafoodle_pantry";

/// Aggregated reference value of one property for one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceProfile {
    pub entity: EntityId,
    pub property_type: PropertyType,
    pub property: String,
    pub n_rows: usize,
    pub reference_value: f64,
    pub mean_absolute_deviation: f64,
}

/// Central statistic and dispersion of one group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupStats {
    pub n: usize,
    pub reference: f64,
    pub mean_absolute_deviation: f64,
}

/// Arithmetic mean. `None` for an empty slice.
#[must_use]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Median; the average of the two middle values for even counts.
#[must_use]
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted: Vec<OrderedFloat<f64>> = values.iter().copied().map(OrderedFloat).collect();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid].0)
    } else {
        Some((sorted[mid - 1].0 + sorted[mid].0) / 2.0)
    }
}

/// Σ|v − reference| / (n − 1), and exactly 0 for a single value.
#[must_use]
pub fn mean_absolute_deviation(values: &[f64], reference: f64) -> f64 {
    if values.len() <= 1 {
        return 0.0;
    }
    let total: f64 = values.iter().map(|v| (v - reference).abs()).sum();
    total / (values.len() - 1) as f64
}

/// Statistics for one group, by property type. `None` for an empty group.
#[must_use]
pub fn group_stats(property_type: PropertyType, values: &[f64]) -> Option<GroupStats> {
    let reference = match property_type {
        PropertyType::Score => mean(values)?,
        PropertyType::MacroNutrient | PropertyType::Allergen => median(values)?,
    };
    Some(GroupStats {
        n: values.len(),
        reference,
        mean_absolute_deviation: mean_absolute_deviation(values, reference),
    })
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceAggregator;

impl ReferenceAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// One profile per (entity, property type, property), ordered by
    /// property type, then entity, then property. Values and deviations are
    /// rounded to 4 decimals after the deviation is computed.
    #[must_use]
    pub fn aggregate(&self, records: &[LongRecord]) -> Vec<ReferenceProfile> {
        let mut groups: BTreeMap<(PropertyType, &EntityId, &str), Vec<f64>> = BTreeMap::new();
        for r in records {
            groups
                .entry((r.property_type(), &r.entity, r.property.as_str()))
                .or_default()
                .push(r.measurement.value());
        }

        groups
            .into_iter()
            .filter_map(|((property_type, entity, property), values)| {
                let stats = group_stats(property_type, &values)?;
                Some(ReferenceProfile {
                    entity: entity.clone(),
                    property_type,
                    property: property.to_string(),
                    n_rows: stats.n,
                    reference_value: round_to(stats.reference, REFERENCE_DECIMALS),
                    mean_absolute_deviation: round_to(stats.mean_absolute_deviation, REFERENCE_DECIMALS),
                })
            })
            .collect()
    }
}

/// One aggregation run: which column identifies entities, which rows are
/// kept, how records are tagged and which unit conversions apply.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationPlan {
    pub key: EntityKey,
    /// Keep only observations whose match score is at least this value.
    /// Rows with a null score are dropped when set.
    pub min_score: Option<f64>,
    pub data_source: String,
    pub units: UnitTable,
}

impl Default for AggregationPlan {
    fn default() -> Self {
        Self {
            key: EntityKey::TaxonomyId,
            min_score: Some(DEFAULT_MATCH_THRESHOLD),
            data_source: DEFAULT_DATA_SOURCE.to_string(),
            units: UnitTable::default(),
        }
    }
}

impl AggregationPlan {
    #[must_use]
    pub fn by_matched_ingredient() -> Self {
        Self {
            key: EntityKey::MatchedIngredient,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(t) = self.min_score {
            if !(-1.0..=1.0).contains(&t) {
                return Err(AggregateError::InvalidThreshold(t));
            }
        }
        Ok(())
    }

    /// Observations passing the score filter.
    #[must_use]
    pub fn filter<'a>(&self, observations: &'a [Observation]) -> Vec<&'a Observation> {
        observations
            .iter()
            .filter(|o| match self.min_score {
                Some(t) => o.matched_score.is_some_and(|s| s >= t),
                None => true,
            })
            .collect()
    }

    /// Filter → reshape → normalize units → aggregate.
    pub fn run(&self, table: &Table) -> Result<Vec<ReferenceProfile>> {
        self.validate()?;
        let observations = Observation::from_table(table, self.key)?;
        let kept: Vec<Observation> = self.filter(&observations).into_iter().cloned().collect();

        let records = Reshaper::new(self.key, &self.data_source).reshape(&kept);
        let records = self.units.normalize_units(records);
        let profiles = ReferenceAggregator::new().aggregate(&records);

        info!(
            key = ?self.key,
            observations = observations.len(),
            kept = kept.len(),
            records = records.len(),
            profiles = profiles.len(),
            "Aggregation complete"
        );
        Ok(profiles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::tests::table_with;
    use crate::reshape::Measurement;
    use std::sync::Arc;

    fn record(entity: i64, property: &str, measurement: Measurement) -> LongRecord {
        LongRecord {
            entity: EntityId::Taxonomy(entity),
            ingredient_id: 0,
            property: property.to_string(),
            measurement,
            data_source: Arc::from("test"),
        }
    }

    fn nutrient(entity: i64, value: f64) -> LongRecord {
        record(
            entity,
            "fat",
            Measurement::MacroNutrient {
                value,
                unit: "g".to_string(),
            },
        )
    }

    #[test]
    fn test_median_and_deviation() {
        let records: Vec<_> = [5.0, 2.0, 8.0].iter().map(|v| nutrient(1, *v)).collect();
        let profiles = ReferenceAggregator::new().aggregate(&records);
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].n_rows, 3);
        assert_eq!(profiles[0].reference_value, 5.0);
        assert_eq!(profiles[0].mean_absolute_deviation, 3.0);
    }

    #[test]
    fn test_single_observation_has_zero_deviation() {
        let profiles = ReferenceAggregator::new().aggregate(&[nutrient(1, 42.0)]);
        assert_eq!(profiles[0].n_rows, 1);
        assert_eq!(profiles[0].mean_absolute_deviation, 0.0);
    }

    #[test]
    fn test_even_median() {
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn test_score_uses_mean() {
        let records: Vec<_> = [0.9, 0.8, 1.0]
            .iter()
            .map(|v| record(1, "score", Measurement::Score { value: *v }))
            .collect();
        let profiles = ReferenceAggregator::new().aggregate(&records);
        assert_eq!(profiles[0].reference_value, 0.9);
        // (0 + 0.1 + 0.1) / 2
        assert_eq!(profiles[0].mean_absolute_deviation, 0.1);
    }

    #[test]
    fn test_allergen_prevalence_not_binarized() {
        let records: Vec<_> = [0.0, 1.0, 1.0, 0.0]
            .iter()
            .map(|v| record(1, "milk", Measurement::Allergen { value: *v }))
            .collect();
        let profiles = ReferenceAggregator::new().aggregate(&records);
        assert_eq!(profiles[0].reference_value, 0.5);
        assert_eq!(profiles[0].mean_absolute_deviation, 0.6667);
    }

    #[test]
    fn test_groups_by_entity_and_property() {
        let records = vec![nutrient(2, 1.0), nutrient(1, 3.0), nutrient(1, 5.0)];
        let profiles = ReferenceAggregator::new().aggregate(&records);
        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[0].entity, EntityId::Taxonomy(1));
        assert_eq!(profiles[0].reference_value, 4.0);
        assert_eq!(profiles[1].entity, EntityId::Taxonomy(2));
    }

    #[test]
    fn test_plan_filters_before_reshape() {
        let table = table_with(&[
            &[("ingredient_id", "1"), ("taxonomy_id", "5"), ("matched_score", "0.95"), ("fat_quantity", "10"), ("fat_unit", "g")],
            &[("ingredient_id", "2"), ("taxonomy_id", "5"), ("matched_score", "0.5"), ("fat_quantity", "99"), ("fat_unit", "g")],
            &[("ingredient_id", "3"), ("taxonomy_id", "5"), ("fat_quantity", "99"), ("fat_unit", "g")],
        ]);
        let profiles = AggregationPlan::default().run(&table).unwrap();
        let fat = profiles.iter().find(|p| p.property == "fat").unwrap();
        assert_eq!(fat.n_rows, 1);
        assert_eq!(fat.reference_value, 10.0);
        let score = profiles.iter().find(|p| p.property == "score").unwrap();
        assert_eq!(score.n_rows, 1);
    }

    #[test]
    fn test_plan_by_matched_ingredient() {
        let table = table_with(&[
            &[("ingredient_id", "1"), ("taxonomy_id", "5"), ("matched_ingredient", "crab"), ("matched_score", "0.9"), ("salt_quantity", "1500"), ("salt_unit", "mg")],
            &[("ingredient_id", "2"), ("taxonomy_id", "6"), ("matched_ingredient", "crab"), ("matched_score", "0.9"), ("salt_quantity", "2"), ("salt_unit", "g")],
        ]);
        let profiles = AggregationPlan::by_matched_ingredient().run(&table).unwrap();
        let salt = profiles.iter().find(|p| p.property == "salt").unwrap();
        assert_eq!(salt.entity, EntityId::Name("crab".to_string()));
        assert_eq!(salt.n_rows, 2);
        assert_eq!(salt.reference_value, 1.75);
    }

    #[test]
    fn test_invalid_threshold() {
        let plan = AggregationPlan {
            min_score: Some(1.5),
            ..AggregationPlan::default()
        };
        assert!(matches!(plan.run(&table_with(&[])), Err(AggregateError::InvalidThreshold(_))));
    }
}
