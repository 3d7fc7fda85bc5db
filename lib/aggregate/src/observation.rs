//! Typed observation rows extracted from a raw [`Table`].

use crate::error::{AggregateError, Result};
use crate::schema::{
    quantity_column, required_observation_columns, unit_column, ALLERGEN_COLUMNS, INGREDIENT_ID_COLUMN,
    MATCHED_INGREDIENT_COLUMN, MATCHED_SCORE_COLUMN, QUANTITY_STEMS, TAXONOMY_ID_COLUMN,
};
use pantry_core::Table;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of the thing a profile describes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Taxonomy(i64),
    Name(String),
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Taxonomy(id) => write!(f, "{}", id),
            EntityId::Name(name) => f.write_str(name),
        }
    }
}

/// Selects the grouping column of an aggregation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKey {
    #[default]
    TaxonomyId,
    MatchedIngredient,
}

impl EntityKey {
    #[must_use]
    pub fn column(&self) -> &'static str {
        match self {
            EntityKey::TaxonomyId => TAXONOMY_ID_COLUMN,
            EntityKey::MatchedIngredient => MATCHED_INGREDIENT_COLUMN,
        }
    }

    /// Entity of an observation, or `None` when its key cell is null.
    #[must_use]
    pub fn select(&self, obs: &Observation) -> Option<EntityId> {
        match self {
            EntityKey::TaxonomyId => obs.taxonomy_id.map(EntityId::Taxonomy),
            EntityKey::MatchedIngredient => obs.matched_ingredient.clone().map(EntityId::Name),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Quantity {
    pub value: Option<f64>,
    pub unit: Option<String>,
}

/// One source row. Quantities follow [`QUANTITY_STEMS`], allergen flags
/// follow [`ALLERGEN_COLUMNS`].
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub ingredient_id: i64,
    pub taxonomy_id: Option<i64>,
    pub matched_ingredient: Option<String>,
    pub matched_score: Option<f64>,
    pub quantities: Vec<Quantity>,
    pub allergens: Vec<Option<f64>>,
}

impl Observation {
    /// Extract observations. Fails on the first missing column or
    /// unparseable cell; nothing is skipped.
    pub fn from_table(table: &Table, key: EntityKey) -> Result<Vec<Observation>> {
        let mut required = required_observation_columns();
        required.push(key.column().to_string());
        for name in &required {
            if table.column_index(name).is_none() {
                return Err(AggregateError::MissingColumn(name.clone()));
            }
        }

        let col = |name: &str| table.column_index(name);
        let ingredient_col = col(INGREDIENT_ID_COLUMN);
        let taxonomy_col = col(TAXONOMY_ID_COLUMN);
        let matched_col = col(MATCHED_INGREDIENT_COLUMN);
        let score_col = col(MATCHED_SCORE_COLUMN);
        let quantity_cols: Vec<(Option<usize>, Option<usize>)> = QUANTITY_STEMS
            .iter()
            .map(|s| (col(quantity_column(s).as_str()), col(unit_column(s).as_str())))
            .collect();
        let allergen_cols: Vec<Option<usize>> = ALLERGEN_COLUMNS.iter().map(|c| col(*c)).collect();

        let cell = |row: usize, idx: Option<usize>| idx.and_then(|i| table.get(row, i));

        let mut out = Vec::with_capacity(table.len());
        for row in 0..table.len() {
            let ingredient_id = parse_int(cell(row, ingredient_col), INGREDIENT_ID_COLUMN, row)?.ok_or_else(|| {
                AggregateError::InvalidValue {
                    column: INGREDIENT_ID_COLUMN.to_string(),
                    row,
                    value: String::new(),
                }
            })?;

            let mut quantities = Vec::with_capacity(QUANTITY_STEMS.len());
            for (stem, (q, u)) in QUANTITY_STEMS.iter().zip(&quantity_cols) {
                quantities.push(Quantity {
                    value: parse_number(cell(row, *q), &quantity_column(stem), row)?,
                    unit: cell(row, *u).map(str::to_string),
                });
            }

            let mut allergens = Vec::with_capacity(ALLERGEN_COLUMNS.len());
            for (name, idx) in ALLERGEN_COLUMNS.iter().zip(&allergen_cols) {
                allergens.push(parse_flag(cell(row, *idx), name, row)?);
            }

            out.push(Observation {
                ingredient_id,
                taxonomy_id: parse_int(cell(row, taxonomy_col), TAXONOMY_ID_COLUMN, row)?,
                matched_ingredient: cell(row, matched_col).map(str::to_string),
                matched_score: parse_number(cell(row, score_col), MATCHED_SCORE_COLUMN, row)?,
                quantities,
                allergens,
            });
        }
        Ok(out)
    }
}

fn invalid(column: &str, row: usize, value: &str) -> AggregateError {
    AggregateError::InvalidValue {
        column: column.to_string(),
        row,
        value: value.to_string(),
    }
}

/// Finite number, or `None` for a null cell.
pub(crate) fn parse_number(cell: Option<&str>, column: &str, row: usize) -> Result<Option<f64>> {
    match cell {
        None => Ok(None),
        Some(text) => match text.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(Some(v)),
            _ => Err(invalid(column, row, text)),
        },
    }
}

/// Integer id. Whole floats such as `12.0` are accepted.
pub(crate) fn parse_int(cell: Option<&str>, column: &str, row: usize) -> Result<Option<i64>> {
    let Some(text) = cell else {
        return Ok(None);
    };
    let trimmed = text.trim();
    if let Ok(v) = trimmed.parse::<i64>() {
        return Ok(Some(v));
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64 => Ok(Some(v as i64)),
        _ => Err(invalid(column, row, text)),
    }
}

/// Allergen flag: a number, or `true`/`false`.
fn parse_flag(cell: Option<&str>, column: &str, row: usize) -> Result<Option<f64>> {
    match cell.map(str::trim) {
        Some(t) if t.eq_ignore_ascii_case("true") => Ok(Some(1.0)),
        Some(t) if t.eq_ignore_ascii_case("false") => Ok(Some(0.0)),
        other => parse_number(other, column, row),
    }
}
