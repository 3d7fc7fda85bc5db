//! Static unit conversion table.

use crate::reshape::{LongRecord, Measurement};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitConversion {
    pub factor: f64,
    pub unit: String,
}

/// Source unit → (factor, canonical unit). Unit keys match exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitTable {
    conversions: BTreeMap<String, UnitConversion>,
}

impl Default for UnitTable {
    fn default() -> Self {
        let mut conversions = BTreeMap::new();
        conversions.insert(
            "mg".to_string(),
            UnitConversion {
                factor: 1.0 / 1000.0,
                unit: "g".to_string(),
            },
        );
        conversions.insert(
            "kj".to_string(),
            UnitConversion {
                factor: 1.0 / 4.184,
                unit: "kcal".to_string(),
            },
        );
        Self { conversions }
    }
}

impl UnitTable {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            conversions: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, from: &str, factor: f64, to: &str) -> Self {
        self.conversions.insert(
            from.to_string(),
            UnitConversion {
                factor,
                unit: to.to_string(),
            },
        );
        self
    }

    #[must_use]
    pub fn get(&self, unit: &str) -> Option<&UnitConversion> {
        self.conversions.get(unit)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.conversions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conversions.is_empty()
    }

    /// Rescale one record. Units without an entry pass through.
    #[must_use]
    pub fn convert(&self, mut record: LongRecord) -> LongRecord {
        if let Measurement::MacroNutrient { value, unit } = &mut record.measurement {
            if let Some(conv) = self.conversions.get(unit.as_str()) {
                *value *= conv.factor;
                *unit = conv.unit.clone();
            }
        }
        record
    }

    #[must_use]
    pub fn normalize_units(&self, records: Vec<LongRecord>) -> Vec<LongRecord> {
        records.into_iter().map(|r| self.convert(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::EntityId;
    use std::sync::Arc;

    fn nutrient(value: f64, unit: &str) -> LongRecord {
        LongRecord {
            entity: EntityId::Taxonomy(1),
            ingredient_id: 1,
            property: "salt".to_string(),
            measurement: Measurement::MacroNutrient {
                value,
                unit: unit.to_string(),
            },
            data_source: Arc::from("test"),
        }
    }

    #[test]
    fn test_default_conversions() {
        let table = UnitTable::default();
        let out = table.normalize_units(vec![nutrient(500.0, "mg"), nutrient(418.4, "kj"), nutrient(3.0, "g")]);
        assert!((out[0].measurement.value() - 0.5).abs() < 1e-12);
        assert_eq!(out[0].measurement.unit(), Some("g"));
        assert!((out[1].measurement.value() - 100.0).abs() < 1e-9);
        assert_eq!(out[1].measurement.unit(), Some("kcal"));
        assert_eq!(out[2], nutrient(3.0, "g"));
    }

    #[test]
    fn test_unit_match_is_exact() {
        let out = UnitTable::default().convert(nutrient(500.0, "MG"));
        assert_eq!(out, nutrient(500.0, "MG"));
    }

    #[test]
    fn test_non_quantities_untouched() {
        let mut r = nutrient(1.0, "mg");
        r.measurement = Measurement::Allergen { value: 1.0 };
        assert_eq!(UnitTable::default().convert(r.clone()), r);
    }

    #[test]
    fn test_deserialize() {
        let table: UnitTable = serde_json::from_str(r#"{"oz": {"factor": 28.35, "unit": "g"}}"#).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("oz").unwrap().unit, "g");
    }
}
