//! Property fill: stored reference values per requested id.

use crate::schema::{PropertyType, RESPONSE_PROPERTIES};
use pantry_core::Result;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// One stored reference value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceValueRow {
    pub taxonomy_id: i64,
    pub property_type: PropertyType,
    pub property: String,
    pub reference_value: f64,
}

/// Source of stored reference values. Implementations return no score rows.
pub trait PropertySource: Send + Sync {
    fn fetch(&self, ids: &BTreeSet<i64>) -> Result<Vec<ReferenceValueRow>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FillValue {
    Number(f64),
    Flag(bool),
}

impl FillValue {
    /// Allergens become booleans (`0 → false`, anything else → true).
    #[must_use]
    pub fn from_row(row: &ReferenceValueRow) -> Self {
        match row.property_type {
            PropertyType::Allergen => FillValue::Flag(row.reference_value != 0.0),
            _ => FillValue::Number(row.reference_value),
        }
    }
}

/// Response object for one requested id. `values` follows
/// [`RESPONSE_PROPERTIES`].
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyFill {
    pub id: i64,
    pub has_data: bool,
    pub values: Vec<Option<FillValue>>,
}

impl PropertyFill {
    #[must_use]
    pub fn empty(id: i64) -> Self {
        Self {
            id,
            has_data: false,
            values: vec![None; RESPONSE_PROPERTIES.len()],
        }
    }

    #[must_use]
    pub fn get(&self, property: &str) -> Option<FillValue> {
        RESPONSE_PROPERTIES
            .iter()
            .position(|p| *p == property)
            .and_then(|i| self.values[i])
    }
}

impl Serialize for PropertyFill {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2 + RESPONSE_PROPERTIES.len()))?;
        map.serialize_entry("id", &self.id)?;
        map.serialize_entry("has_data", &self.has_data)?;
        for (name, value) in RESPONSE_PROPERTIES.iter().zip(&self.values) {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// One object per requested id, in request order with duplicates kept.
/// Score rows and properties outside the response catalogue are ignored.
#[must_use]
pub fn fill_properties(ids: &[i64], rows: &[ReferenceValueRow]) -> Vec<PropertyFill> {
    let mut by_id: BTreeMap<i64, PropertyFill> = BTreeMap::new();
    for row in rows.iter().filter(|r| r.property_type != PropertyType::Score) {
        let fill = by_id.entry(row.taxonomy_id).or_insert_with(|| PropertyFill::empty(row.taxonomy_id));
        fill.has_data = true;
        if let Some(slot) = RESPONSE_PROPERTIES.iter().position(|p| *p == row.property) {
            fill.values[slot] = Some(FillValue::from_row(row));
        }
    }

    ids.iter()
        .map(|id| by_id.get(id).cloned().unwrap_or_else(|| PropertyFill::empty(*id)))
        .collect()
}

/// Collapse duplicate ids, fetch once, re-expand to the request shape.
pub fn lookup_properties<P: PropertySource + ?Sized>(source: &P, ids: &[i64]) -> Result<Vec<PropertyFill>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let unique: BTreeSet<i64> = ids.iter().copied().collect();
    let rows = source.fetch(&unique)?;
    debug!(requested = ids.len(), unique = unique.len(), rows = rows.len(), "Fetched reference values");
    Ok(fill_properties(ids, &rows))
}
