//! Typed access to the Pantry tables.

use crate::error::{Result, StorageError};
use crate::table_store::TableStore;
use pantry_aggregate::schema::REFERENCE_COLUMNS;
use pantry_aggregate::{
    DashboardRow, EntityKey, PropertySource, PropertyType, ReferenceProfile, ReferenceValueRow, TabularProfile,
};
use pantry_core::{ReferenceLoader, Table, TaxonomyEntry, TaxonomyRow, Vector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::info;

/// Decimals written for taxonomy vector components.
pub const VECTOR_TEXT_DECIMALS: usize = 5;

/// File names of each table inside the data directory. Aggregation keyed by
/// matched ingredient name writes to the `matched_*` tables; property fill
/// only ever reads `reference_values`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableNames {
    pub taxonomy_vectors: String,
    pub stopwords: String,
    pub taxonomy: String,
    pub categories: String,
    pub ingredients: String,
    pub observations: String,
    pub reference_values: String,
    pub summary: String,
    pub dashboard: String,
    pub matched_reference_values: String,
    pub matched_summary: String,
    pub matched_dashboard: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            taxonomy_vectors: "pantry__taxonomy_vector.csv".to_string(),
            stopwords: "pantry__stopwords.csv".to_string(),
            taxonomy: "pantry__taxonomy.csv".to_string(),
            categories: "ste__ingredient_categories.csv".to_string(),
            ingredients: "ingredients.csv".to_string(),
            observations: "pantry__ingredients_scored.csv".to_string(),
            reference_values: "pantry__taxonomy_ref_values.csv".to_string(),
            summary: "pantry__summary.csv".to_string(),
            dashboard: "pantry_dashboard.csv".to_string(),
            matched_reference_values: "pantry__matched_ref_values.csv".to_string(),
            matched_summary: "pantry__matched_summary.csv".to_string(),
            matched_dashboard: "pantry_matched_dashboard.csv".to_string(),
        }
    }
}

impl TableNames {
    #[must_use]
    pub fn reference_sink(&self, key: EntityKey) -> &str {
        match key {
            EntityKey::TaxonomyId => &self.reference_values,
            EntityKey::MatchedIngredient => &self.matched_reference_values,
        }
    }

    #[must_use]
    pub fn summary_sink(&self, key: EntityKey) -> &str {
        match key {
            EntityKey::TaxonomyId => &self.summary,
            EntityKey::MatchedIngredient => &self.matched_summary,
        }
    }

    #[must_use]
    pub fn dashboard_sink(&self, key: EntityKey) -> &str {
        match key {
            EntityKey::TaxonomyId => &self.dashboard,
            EntityKey::MatchedIngredient => &self.matched_dashboard,
        }
    }
}

/// A new taxonomy vector row, before an id is assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTaxonomyVector {
    pub taxonomy_id: i64,
    pub ingredient_name: String,
    pub vector: Vector,
}

const VECTOR_COLUMNS: [&str; 4] = ["id", "taxonomy_id", "ingredient_name", "vector_representation"];

#[derive(Debug, Clone)]
pub struct PantryStore {
    store: TableStore,
    names: TableNames,
}

impl PantryStore {
    pub fn open<P: AsRef<Path>>(data_dir: P, names: TableNames) -> Result<Self> {
        Ok(Self {
            store: TableStore::new(data_dir)?,
            names,
        })
    }

    #[must_use]
    pub fn tables(&self) -> &TableStore {
        &self.store
    }

    #[must_use]
    pub fn names(&self) -> &TableNames {
        &self.names
    }

    pub fn taxonomy_rows(&self) -> Result<Vec<TaxonomyRow>> {
        let name = &self.names.taxonomy_vectors;
        let table = self.store.read(name)?;
        let cols = table.require_columns(&["id", "taxonomy_id", "vector_representation"])?;

        (0..table.len())
            .map(|r| -> Result<TaxonomyRow> {
                let row_id = int_cell(&table, name, "id", r, cols[0])?;
                let taxonomy_id = int_cell(&table, name, "taxonomy_id", r, cols[1])?;
                let text = table.get(r, cols[2]).unwrap_or_default();
                Ok(TaxonomyRow::parse(row_id, taxonomy_id, text)?)
            })
            .collect()
    }

    /// Ingredient names already present in the vector table.
    pub fn vectorised_names(&self) -> Result<BTreeSet<String>> {
        let Some(table) = self.store.read_optional(&self.names.taxonomy_vectors)? else {
            return Ok(BTreeSet::new());
        };
        Ok(table
            .column("ingredient_name")?
            .into_iter()
            .flatten()
            .map(str::to_string)
            .collect())
    }

    /// Append rows to the vector table, assigning ids after the current
    /// maximum. Returns the number of rows appended.
    pub fn append_taxonomy_vectors(&self, rows: &[NewTaxonomyVector]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }
        let name = &self.names.taxonomy_vectors;
        let mut table = self.store.read_optional(name)?.unwrap_or_else(|| Table::new(VECTOR_COLUMNS));
        let id_col = table.require_column("id")?;

        let mut next_id = 0;
        for r in 0..table.len() {
            next_id = next_id.max(int_cell(&table, name, "id", r, id_col)? + 1);
        }

        let order = table.require_columns(&VECTOR_COLUMNS)?;
        for (offset, row) in rows.iter().enumerate() {
            let values = [
                (next_id + offset as i64).to_string(),
                row.taxonomy_id.to_string(),
                row.ingredient_name.clone(),
                row.vector.to_bracketed(VECTOR_TEXT_DECIMALS),
            ];
            let mut cells = vec![None; table.headers().len()];
            for (idx, value) in order.iter().zip(values) {
                cells[*idx] = Some(value);
            }
            table.push_row(cells)?;
        }

        self.store.write(name, &table)?;
        info!(appended = rows.len(), total = table.len(), "Taxonomy vectors appended");
        Ok(rows.len())
    }

    pub fn stopwords(&self) -> Result<Vec<String>> {
        let table = self.store.read(&self.names.stopwords)?;
        Ok(table
            .column("stopword")?
            .into_iter()
            .flatten()
            .map(str::to_string)
            .collect())
    }

    pub fn taxonomy_entries(&self) -> Result<Vec<TaxonomyEntry>> {
        let name = &self.names.taxonomy;
        let table = self.store.read(name)?;
        let cols = table.require_columns(&["id", "ingredient_name", "category_id"])?;

        (0..table.len())
            .map(|r| -> Result<TaxonomyEntry> {
                Ok(TaxonomyEntry {
                    id: int_cell(&table, name, "id", r, cols[0])?,
                    name: table.get(r, cols[1]).unwrap_or_default().to_string(),
                    category_id: opt_int_cell(&table, name, "category_id", r, cols[2])?,
                })
            })
            .collect()
    }

    pub fn categories(&self) -> Result<Vec<(i64, String)>> {
        let name = &self.names.categories;
        let table = self.store.read(name)?;
        let cols = table.require_columns(&["id", "name"])?;
        (0..table.len())
            .map(|r| -> Result<(i64, String)> {
                let id = int_cell(&table, name, "id", r, cols[0])?;
                Ok((id, table.get(r, cols[1]).unwrap_or_default().to_string()))
            })
            .collect()
    }

    pub fn ingredients(&self) -> Result<Table> {
        let table = self.store.read(&self.names.ingredients)?;
        table.require_column("ingredient_name")?;
        Ok(table)
    }

    pub fn observations(&self) -> Result<Table> {
        self.store.read(&self.names.observations)
    }

    pub fn write_observations(&self, table: &Table) -> Result<()> {
        self.store.write(&self.names.observations, table)
    }

    /// Replace the reference-value table of `key`. The first column is named
    /// after the key column.
    pub fn write_reference_profiles(&self, key: EntityKey, profiles: &[ReferenceProfile]) -> Result<()> {
        let mut headers = REFERENCE_COLUMNS;
        headers[0] = key.column();
        let mut table = Table::new(headers);
        for p in profiles {
            table.push_row(vec![
                Some(p.entity.to_string()),
                Some(p.property_type.to_string()),
                Some(p.property.clone()),
                Some(p.n_rows.to_string()),
                Some(p.reference_value.to_string()),
                Some(p.mean_absolute_deviation.to_string()),
            ])?;
        }
        self.store.write(self.names.reference_sink(key), &table)
    }

    /// Stored reference values for `ids`, excluding score rows.
    pub fn reference_values(&self, ids: &BTreeSet<i64>) -> Result<Vec<ReferenceValueRow>> {
        let name = &self.names.reference_values;
        let table = self.store.read(name)?;
        let cols = table.require_columns(&["taxonomy_id", "property_type", "property", "reference_value"])?;

        let mut out = Vec::new();
        for r in 0..table.len() {
            let taxonomy_id = int_cell(&table, name, "taxonomy_id", r, cols[0])?;
            if !ids.contains(&taxonomy_id) {
                continue;
            }
            let raw_type = table.get(r, cols[1]).unwrap_or_default();
            let property_type: PropertyType = raw_type
                .parse()
                .map_err(|_| invalid(name, "property_type", r, raw_type))?;
            if property_type == PropertyType::Score {
                continue;
            }
            let raw_value = table.get(r, cols[3]).unwrap_or_default();
            let reference_value: f64 = raw_value
                .parse()
                .map_err(|_| invalid(name, "reference_value", r, raw_value))?;
            out.push(ReferenceValueRow {
                taxonomy_id,
                property_type,
                property: table.get(r, cols[2]).unwrap_or_default().to_string(),
                reference_value,
            });
        }
        Ok(out)
    }

    pub fn write_summary(&self, key: EntityKey, rows: &[TabularProfile]) -> Result<()> {
        let mut table = Table::new(TabularProfile::headers());
        for row in rows {
            table.push_row(row.to_cells())?;
        }
        self.store.write(self.names.summary_sink(key), &table)
    }

    pub fn write_dashboard(&self, key: EntityKey, rows: &[DashboardRow]) -> Result<()> {
        let mut table = Table::new(DashboardRow::headers().iter().copied());
        for row in rows {
            table.push_row(row.to_cells())?;
        }
        self.store.write(self.names.dashboard_sink(key), &table)
    }
}

impl ReferenceLoader for PantryStore {
    fn load_taxonomy(&self) -> pantry_core::Result<Vec<TaxonomyRow>> {
        Ok(self.taxonomy_rows()?)
    }

    fn load_stopwords(&self) -> pantry_core::Result<Vec<String>> {
        Ok(self.stopwords()?)
    }
}

impl PropertySource for PantryStore {
    fn fetch(&self, ids: &BTreeSet<i64>) -> pantry_core::Result<Vec<ReferenceValueRow>> {
        Ok(self.reference_values(ids)?)
    }
}

fn invalid(table: &str, column: &str, row: usize, value: &str) -> StorageError {
    StorageError::InvalidValue {
        table: table.to_string(),
        column: column.to_string(),
        row,
        value: value.to_string(),
    }
}

fn opt_int_cell(table: &Table, name: &str, column: &str, row: usize, idx: usize) -> Result<Option<i64>> {
    let Some(text) = table.get(row, idx) else {
        return Ok(None);
    };
    let trimmed = text.trim();
    if let Ok(v) = trimmed.parse::<i64>() {
        return Ok(Some(v));
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() && v.fract() == 0.0 => Ok(Some(v as i64)),
        _ => Err(invalid(name, column, row, text)),
    }
}

fn int_cell(table: &Table, name: &str, column: &str, row: usize, idx: usize) -> Result<i64> {
    opt_int_cell(table, name, column, row, idx)?.ok_or_else(|| invalid(name, column, row, ""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pantry_aggregate::EntityId;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> PantryStore {
        PantryStore::open(dir.path(), TableNames::default()).unwrap()
    }

    fn write(dir: &TempDir, name: &str, body: &str) {
        std::fs::write(dir.path().join(name), body).unwrap();
    }

    #[test]
    fn test_taxonomy_rows() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "pantry__taxonomy_vector.csv",
            "id,taxonomy_id,ingredient_name,vector_representation\n1,1,crab,\"[1, 0]\"\n2,2,lobster,\"[0.6, 0.8]\"\n3,1,crabs,\"[1, 1]\"\n",
        );
        let rows = store(&dir).taxonomy_rows().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].taxonomy_id, 2);
        assert_eq!(rows[1].vector.as_slice(), &[0.6, 0.8]);
        assert_eq!(rows[2].row_id, 3);
    }

    #[test]
    fn test_bad_vector_text_fails() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "pantry__taxonomy_vector.csv",
            "id,taxonomy_id,ingredient_name,vector_representation\n1,1,crab,\"[1, x]\"\n",
        );
        let err = store(&dir).load_taxonomy().unwrap_err();
        assert!(matches!(err, pantry_core::Error::InvalidVector { row: 1, .. }));
    }

    #[test]
    fn test_missing_table_is_wrapped_source_failure() {
        let dir = TempDir::new().unwrap();
        let err = store(&dir).load_stopwords().unwrap_err();
        assert!(matches!(err, pantry_core::Error::Source(_)));
    }

    #[test]
    fn test_append_taxonomy_vectors() {
        let dir = TempDir::new().unwrap();
        let s = store(&dir);
        let first = vec![NewTaxonomyVector {
            taxonomy_id: 4,
            ingredient_name: "crab".into(),
            vector: Vector::new(vec![0.1, -0.2]),
        }];
        assert_eq!(s.append_taxonomy_vectors(&first).unwrap(), 1);
        let second = vec![NewTaxonomyVector {
            taxonomy_id: 4,
            ingredient_name: "crabs".into(),
            vector: Vector::new(vec![0.3, 0.4]),
        }];
        s.append_taxonomy_vectors(&second).unwrap();

        let table = s.tables().read("pantry__taxonomy_vector.csv").unwrap();
        assert_eq!(table.column("id").unwrap(), vec![Some("0"), Some("1")]);
        assert_eq!(
            table.column("vector_representation").unwrap()[0],
            Some("[0.10000,-0.20000]")
        );
        assert_eq!(s.vectorised_names().unwrap(), BTreeSet::from(["crab".to_string(), "crabs".to_string()]));
    }

    #[test]
    fn test_reference_values_roundtrip() {
        let dir = TempDir::new().unwrap();
        let s = store(&dir);
        let profile = |id, t, p: &str, v| ReferenceProfile {
            entity: EntityId::Taxonomy(id),
            property_type: t,
            property: p.to_string(),
            n_rows: 2,
            reference_value: v,
            mean_absolute_deviation: 0.0,
        };
        s.write_reference_profiles(EntityKey::TaxonomyId, &[
            profile(1, PropertyType::Score, "score", 0.93),
            profile(1, PropertyType::MacroNutrient, "fat", 1.25),
            profile(66, PropertyType::Allergen, "milk", 0.5),
            profile(7, PropertyType::Allergen, "milk", 1.0),
        ])
        .unwrap();

        let rows = s.fetch(&BTreeSet::from([1, 66, 117])).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].property, "fat");
        assert_eq!(rows[0].reference_value, 1.25);
        assert_eq!(rows[1].taxonomy_id, 66);
        assert_eq!(rows[1].property_type, PropertyType::Allergen);
    }

    #[test]
    fn test_matched_profiles_use_own_table() {
        let dir = TempDir::new().unwrap();
        let s = store(&dir);
        s.write_reference_profiles(
            EntityKey::TaxonomyId,
            &[ReferenceProfile {
                entity: EntityId::Taxonomy(1),
                property_type: PropertyType::MacroNutrient,
                property: "fat".into(),
                n_rows: 1,
                reference_value: 3.0,
                mean_absolute_deviation: 0.0,
            }],
        )
        .unwrap();
        s.write_reference_profiles(
            EntityKey::MatchedIngredient,
            &[ReferenceProfile {
                entity: EntityId::Name("crab".into()),
                property_type: PropertyType::MacroNutrient,
                property: "fat".into(),
                n_rows: 1,
                reference_value: 4.0,
                mean_absolute_deviation: 0.0,
            }],
        )
        .unwrap();

        let matched = s.tables().read("pantry__matched_ref_values.csv").unwrap();
        assert_eq!(matched.headers()[0], "matched_ingredient");
        assert_eq!(matched.column("matched_ingredient").unwrap(), vec![Some("crab")]);

        let rows = s.fetch(&BTreeSet::from([1])).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].reference_value, 3.0);
    }
}
