//! Wide per-entity view of the reference profiles, plus the dashboard
//! export rows.

use crate::aggregate::ReferenceProfile;
use crate::observation::{EntityId, EntityKey};
use crate::schema::{PropertyType, DASHBOARD_COLUMNS, SCORE_PROPERTY, TABULAR_ID_COLUMNS, TABULAR_PROPERTIES};
use ahash::AHashMap;
use pantry_core::{Cell, TaxonomyEntry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Presentation labels for a binarized allergen value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllergenLabels {
    pub absent: String,
    pub present: String,
}

impl Default for AllergenLabels {
    fn default() -> Self {
        Self {
            absent: "N".to_string(),
            present: "Y".to_string(),
        }
    }
}

impl AllergenLabels {
    /// Ceil the prevalence, then 0 → absent, 1 → present. Anything else has
    /// no label.
    #[must_use]
    pub fn encode(&self, prevalence: f64) -> Option<&str> {
        let ceiled = prevalence.ceil();
        if ceiled == 0.0 {
            Some(self.absent.as_str())
        } else if ceiled == 1.0 {
            Some(self.present.as_str())
        } else {
            None
        }
    }
}

/// Descriptive fields joined onto each entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityDescriptor {
    pub name: Option<String>,
    pub category_id: Option<i64>,
}

/// Entity and category lookups used by the projection joins.
#[derive(Debug, Clone, Default)]
pub struct EntityCatalogue {
    entities: AHashMap<EntityId, EntityDescriptor>,
    categories: AHashMap<i64, String>,
}

impl EntityCatalogue {
    /// Index taxonomy entries under the same key the aggregation used.
    #[must_use]
    pub fn from_taxonomy<I>(entries: &[TaxonomyEntry], categories: I, key: EntityKey) -> Self
    where
        I: IntoIterator<Item = (i64, String)>,
    {
        let entities = entries
            .iter()
            .map(|e| {
                let id = match key {
                    EntityKey::TaxonomyId => EntityId::Taxonomy(e.id),
                    EntityKey::MatchedIngredient => EntityId::Name(e.name.clone()),
                };
                let descriptor = EntityDescriptor {
                    name: Some(e.name.clone()),
                    category_id: e.category_id,
                };
                (id, descriptor)
            })
            .collect();
        Self {
            entities,
            categories: categories.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn name(&self, entity: &EntityId) -> Option<&str> {
        self.entities.get(entity).and_then(|d| d.name.as_deref())
    }

    #[must_use]
    pub fn category(&self, entity: &EntityId) -> Option<&str> {
        self.entities
            .get(entity)
            .and_then(|d| d.category_id)
            .and_then(|c| self.categories.get(&c))
            .map(String::as_str)
    }
}

/// A projected property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Number(f64),
    Label(String),
}

impl PropertyValue {
    #[must_use]
    pub fn to_cell(&self) -> String {
        match self {
            PropertyValue::Number(v) => v.to_string(),
            PropertyValue::Label(l) => l.clone(),
        }
    }
}

/// One row of the wide view. `values` follows [`TABULAR_PROPERTIES`].
#[derive(Debug, Clone, PartialEq)]
pub struct TabularProfile {
    pub entity: EntityId,
    pub product_name: Option<String>,
    pub category: Option<String>,
    pub number_data_points: Option<usize>,
    pub values: Vec<Option<PropertyValue>>,
}

impl TabularProfile {
    #[must_use]
    pub fn headers() -> Vec<&'static str> {
        TABULAR_ID_COLUMNS.iter().chain(TABULAR_PROPERTIES.iter()).copied().collect()
    }

    #[must_use]
    pub fn get(&self, property: &str) -> Option<&PropertyValue> {
        TABULAR_PROPERTIES
            .iter()
            .position(|p| *p == property)
            .and_then(|i| self.values[i].as_ref())
    }

    /// Cells in [`TabularProfile::headers`] order.
    #[must_use]
    pub fn to_cells(&self) -> Vec<Cell> {
        let mut cells = Vec::with_capacity(TABULAR_ID_COLUMNS.len() + self.values.len());
        cells.push(Some(self.entity.to_string()));
        cells.push(self.product_name.clone());
        cells.push(self.category.clone());
        cells.push(self.number_data_points.map(|n| n.to_string()));
        cells.extend(self.values.iter().map(|v| v.as_ref().map(PropertyValue::to_cell)));
        cells
    }
}

#[derive(Debug, Clone, Default)]
pub struct TabularProjector {
    labels: AllergenLabels,
}

impl TabularProjector {
    #[must_use]
    pub fn new(labels: AllergenLabels) -> Self {
        Self { labels }
    }

    /// One row per entity, ordered by entity. Entities missing from the
    /// catalogue keep their row with null descriptive fields.
    #[must_use]
    pub fn project(&self, profiles: &[ReferenceProfile], catalogue: &EntityCatalogue) -> Vec<TabularProfile> {
        let mut rows: BTreeMap<&EntityId, TabularProfile> = BTreeMap::new();

        for p in profiles {
            let row = rows.entry(&p.entity).or_insert_with(|| TabularProfile {
                entity: p.entity.clone(),
                product_name: catalogue.name(&p.entity).map(str::to_string),
                category: catalogue.category(&p.entity).map(str::to_string),
                number_data_points: None,
                values: vec![None; TABULAR_PROPERTIES.len()],
            });

            if p.property_type == PropertyType::Score && p.property == SCORE_PROPERTY {
                row.number_data_points = Some(p.n_rows);
                continue;
            }

            let Some(slot) = TABULAR_PROPERTIES.iter().position(|c| *c == p.property) else {
                continue;
            };
            row.values[slot] = match p.property_type {
                PropertyType::Allergen => self
                    .labels
                    .encode(p.reference_value)
                    .map(|l| PropertyValue::Label(l.to_string())),
                _ => Some(PropertyValue::Number(p.reference_value)),
            };
        }

        debug!(profiles = profiles.len(), entities = rows.len(), "Projected profiles");
        rows.into_values().collect()
    }
}

/// One dashboard export row: a profile joined with its descriptive fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardRow {
    pub taxonomy_id: EntityId,
    pub property_type: PropertyType,
    pub property: String,
    pub n_rows: usize,
    pub reference_value: f64,
    pub mean_absolute_deviation: f64,
    pub data_source: String,
    pub ingredient_name: Option<String>,
    pub category: Option<String>,
}

impl DashboardRow {
    #[must_use]
    pub fn headers() -> &'static [&'static str] {
        &DASHBOARD_COLUMNS
    }

    #[must_use]
    pub fn to_cells(&self) -> Vec<Cell> {
        vec![
            Some(self.taxonomy_id.to_string()),
            Some(self.property_type.to_string()),
            Some(self.property.clone()),
            Some(self.n_rows.to_string()),
            Some(self.reference_value.to_string()),
            Some(self.mean_absolute_deviation.to_string()),
            Some(self.data_source.clone()),
            self.ingredient_name.clone(),
            self.category.clone(),
        ]
    }
}

#[must_use]
pub fn dashboard_rows(profiles: &[ReferenceProfile], catalogue: &EntityCatalogue, data_source: &str) -> Vec<DashboardRow> {
    profiles
        .iter()
        .map(|p| DashboardRow {
            taxonomy_id: p.entity.clone(),
            property_type: p.property_type,
            property: p.property.clone(),
            n_rows: p.n_rows,
            reference_value: p.reference_value,
            mean_absolute_deviation: p.mean_absolute_deviation,
            data_source: data_source.to_string(),
            ingredient_name: catalogue.name(&p.entity).map(str::to_string),
            category: catalogue.category(&p.entity).map(str::to_string),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(entity: i64, property_type: PropertyType, property: &str, n: usize, value: f64) -> ReferenceProfile {
        ReferenceProfile {
            entity: EntityId::Taxonomy(entity),
            property_type,
            property: property.to_string(),
            n_rows: n,
            reference_value: value,
            mean_absolute_deviation: 0.0,
        }
    }

    fn catalogue() -> EntityCatalogue {
        let entries = vec![TaxonomyEntry {
            id: 1,
            name: "crab".to_string(),
            category_id: Some(10),
        }];
        EntityCatalogue::from_taxonomy(&entries, [(10, "Seafood".to_string())], EntityKey::TaxonomyId)
    }

    #[test]
    fn test_labels() {
        let labels = AllergenLabels::default();
        assert_eq!(labels.encode(0.0), Some("N"));
        assert_eq!(labels.encode(0.25), Some("Y"));
        assert_eq!(labels.encode(1.0), Some("Y"));
        assert_eq!(labels.encode(1.5), None);
    }

    #[test]
    fn test_project_pivots_and_joins() {
        let profiles = vec![
            profile(1, PropertyType::Score, "score", 4, 0.93),
            profile(1, PropertyType::MacroNutrient, "fat", 4, 1.2),
            profile(1, PropertyType::Allergen, "crustaceans", 4, 0.5),
            profile(1, PropertyType::Allergen, "milk", 4, 0.0),
            profile(1, PropertyType::Allergen, "gluten", 4, 1.0),
            profile(2, PropertyType::MacroNutrient, "salt", 1, 0.3),
        ];
        let rows = TabularProjector::default().project(&profiles, &catalogue());
        assert_eq!(rows.len(), 2);

        let crab = &rows[0];
        assert_eq!(crab.product_name.as_deref(), Some("crab"));
        assert_eq!(crab.category.as_deref(), Some("Seafood"));
        assert_eq!(crab.number_data_points, Some(4));
        assert_eq!(crab.get("fat"), Some(&PropertyValue::Number(1.2)));
        assert_eq!(crab.get("crustaceans"), Some(&PropertyValue::Label("Y".into())));
        assert_eq!(crab.get("milk"), Some(&PropertyValue::Label("N".into())));
        assert_eq!(crab.get("energy"), None);

        let unknown = &rows[1];
        assert_eq!(unknown.product_name, None);
        assert_eq!(unknown.category, None);
        assert_eq!(unknown.number_data_points, None);
    }

    #[test]
    fn test_cells_follow_headers() {
        let rows = TabularProjector::default().project(&[profile(1, PropertyType::MacroNutrient, "energy", 2, 95.5)], &catalogue());
        let cells = rows[0].to_cells();
        let headers = TabularProfile::headers();
        assert_eq!(cells.len(), headers.len());
        assert_eq!(headers[4], "energy");
        assert_eq!(cells[0].as_deref(), Some("1"));
        assert_eq!(cells[4].as_deref(), Some("95.5"));
    }

    #[test]
    fn test_dashboard_rows() {
        let rows = dashboard_rows(
            &[profile(1, PropertyType::MacroNutrient, "fat", 2, 1.0), profile(9, PropertyType::Score, "score", 2, 0.9)],
            &catalogue(),
            "kafoodle_pantry",
        );
        assert_eq!(rows[0].ingredient_name.as_deref(), Some("crab"));
        assert_eq!(rows[0].to_cells().len(), DashboardRow::headers().len());
        assert_eq!(rows[1].category, None);
        assert_eq!(rows[1].to_cells()[1].as_deref(), Some("score"));
    }
}
