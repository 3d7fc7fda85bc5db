//! Property catalogue.
//!
//! Fixed column sets of the observation table, the statistic each property
//! type gets, and the column orders of the tabular and API views.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Statistical treatment class of a property.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    /// Match confidence, aggregated with the mean
    Score,
    /// Quantity with a unit, aggregated with the median
    MacroNutrient,
    /// 0/1 flag, aggregated with the median (a prevalence, not re-binarized)
    Allergen,
}

impl PropertyType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::Score => "score",
            PropertyType::MacroNutrient => "macro_nutrient",
            PropertyType::Allergen => "allergen",
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PropertyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "score" => Ok(PropertyType::Score),
            "macro_nutrient" => Ok(PropertyType::MacroNutrient),
            "allergen" => Ok(PropertyType::Allergen),
            other => Err(format!("unknown property type '{}'", other)),
        }
    }
}

pub const INGREDIENT_ID_COLUMN: &str = "ingredient_id";
pub const TAXONOMY_ID_COLUMN: &str = "taxonomy_id";
pub const MATCHED_INGREDIENT_COLUMN: &str = "matched_ingredient";
pub const MATCHED_SCORE_COLUMN: &str = "matched_score";

/// Property name stored for match scores.
pub const SCORE_PROPERTY: &str = "score";

/// Quantity stems. Each has a `<stem>_quantity` and a `<stem>_unit` column.
pub const QUANTITY_STEMS: [&str; 8] = [
    "energy",
    "fibre",
    "protein",
    "salt",
    "fat",
    "saturated_fat",
    "carbohydrate",
    "sugar",
];

/// Allergen flag columns as they appear in the observation table.
pub const ALLERGEN_COLUMNS: [&str; 26] = [
    "GLUTEN",
    "GLUTEN_WHEAT",
    "GLUTEN_RYE",
    "GLUTEN_BARLEY",
    "GLUTEN_OATS",
    "CRUSTACEANS",
    "EGGS",
    "FISH",
    "PEANUTS",
    "SOYA",
    "MILK",
    "NUTS",
    "NUTS_ALMONDS",
    "NUTS_HAZELNUTS",
    "NUTS_WALNUTS",
    "NUTS_CASHEWS",
    "NUTS_PECANS",
    "NUTS_BRAZIL",
    "NUTS_PISTACHIOS",
    "NUTS_MACADAMIA",
    "SESAME_SEEDS",
    "SULPHUR_DIOXIDE",
    "MOLLUSCS",
    "CELERY",
    "MUSTARD",
    "LUPIN",
];

/// Leading descriptive columns of the tabular view.
pub const TABULAR_ID_COLUMNS: [&str; 4] = ["taxonomy_id", "product_name", "category", "number_data_points"];

/// Property columns of the tabular view, macro-nutrients then allergens.
pub const TABULAR_PROPERTIES: [&str; 32] = [
    "energy",
    "fat",
    "saturated",
    "carbohydrate",
    "fibre",
    "sugar",
    "protein",
    "salt",
    "gluten_wheat",
    "gluten_rye",
    "gluten_barley",
    "gluten_oats",
    "crustaceans",
    "eggs",
    "fish",
    "peanuts",
    "soya",
    "milk",
    "nuts_almonds",
    "nuts_hazelnuts",
    "nuts_walnuts",
    "nuts_cashews",
    "nuts_pecans",
    "nuts_brazil",
    "nuts_pistachios",
    "nuts_macadamia",
    "sesame_seeds",
    "sulphur_dioxide",
    "molluscs",
    "celery",
    "mustard",
    "lupin",
];

/// Properties carried by every property-fill response object.
pub const RESPONSE_PROPERTIES: [&str; 34] = [
    "energy",
    "fat",
    "saturated",
    "carbohydrate",
    "fibre",
    "sugar",
    "protein",
    "salt",
    "gluten_wheat",
    "gluten_rye",
    "gluten_barley",
    "gluten_oats",
    "gluten",
    "crustaceans",
    "eggs",
    "fish",
    "peanuts",
    "soya",
    "milk",
    "nuts",
    "nuts_almonds",
    "nuts_hazelnuts",
    "nuts_walnuts",
    "nuts_cashews",
    "nuts_pecans",
    "nuts_brazil",
    "nuts_pistachios",
    "nuts_macadamia",
    "sesame_seeds",
    "sulphur_dioxide",
    "molluscs",
    "celery",
    "mustard",
    "lupin",
];

/// Columns of the dashboard export.
pub const DASHBOARD_COLUMNS: [&str; 9] = [
    "taxonomy_id",
    "property_type",
    "property",
    "n_rows",
    "reference_value",
    "mean_absolute_deviation",
    "data_source",
    "ingredient_name",
    "category",
];

/// Columns of the persisted reference-value table.
pub const REFERENCE_COLUMNS: [&str; 6] = [
    "taxonomy_id",
    "property_type",
    "property",
    "n_rows",
    "reference_value",
    "mean_absolute_deviation",
];

#[inline]
#[must_use]
pub fn quantity_column(stem: &str) -> String {
    format!("{}_quantity", stem)
}

#[inline]
#[must_use]
pub fn unit_column(stem: &str) -> String {
    format!("{}_unit", stem)
}

/// Stored property name: text before the first underscore, lower-cased.
#[must_use]
pub fn quantity_property(stem: &str) -> String {
    stem.split('_').next().unwrap_or(stem).to_lowercase()
}

/// Every column an observation table must carry, besides the entity key.
#[must_use]
pub fn required_observation_columns() -> Vec<String> {
    let mut cols = vec![INGREDIENT_ID_COLUMN.to_string(), MATCHED_SCORE_COLUMN.to_string()];
    for stem in QUANTITY_STEMS {
        cols.push(quantity_column(stem));
        cols.push(unit_column(stem));
    }
    cols.extend(ALLERGEN_COLUMNS.iter().map(|c| c.to_string()));
    cols
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_type_roundtrip() {
        for t in [PropertyType::Score, PropertyType::MacroNutrient, PropertyType::Allergen] {
            assert_eq!(t.as_str().parse::<PropertyType>().unwrap(), t);
        }
        assert!("mode".parse::<PropertyType>().is_err());
        assert_eq!(serde_json::to_string(&PropertyType::MacroNutrient).unwrap(), "\"macro_nutrient\"");
    }

    #[test]
    fn test_quantity_property() {
        assert_eq!(quantity_property("saturated_fat"), "saturated");
        assert_eq!(quantity_property("energy"), "energy");
    }

    #[test]
    fn test_tabular_covers_declared_properties() {
        let stored: Vec<String> = QUANTITY_STEMS.iter().map(|s| quantity_property(s)).collect();
        for p in &TABULAR_PROPERTIES[..8] {
            assert!(stored.iter().any(|s| s == p), "{} not produced by any quantity stem", p);
        }
        for p in &TABULAR_PROPERTIES[8..] {
            assert!(ALLERGEN_COLUMNS.iter().any(|c| c.to_lowercase() == *p));
        }
    }

    #[test]
    fn test_required_columns() {
        let cols = required_observation_columns();
        assert_eq!(cols.len(), 2 + 16 + 26);
        assert!(cols.contains(&"saturated_fat_unit".to_string()));
    }
}
