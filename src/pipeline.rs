//! Batch jobs over the data directory: scoring, taxonomy vectorisation and
//! the aggregation rebuild.

use crate::config::PantryConfig;
use crate::error::Result;
use ahash::AHashSet;
use pantry_aggregate::{dashboard_rows, EntityCatalogue, EntityKey, TabularProjector};
use pantry_core::{encode_checked, Embedder, ReferenceContext, Table, TaxonomyEntry};
use pantry_storage::{NewTaxonomyVector, PantryStore};
use std::collections::BTreeSet;
use tracing::info;

pub const INGREDIENT_NAME_COLUMN: &str = "ingredient_name";

/// Match every `ingredient_name` of `table` and append `taxonomy_id` and
/// `matched_score` columns. Null names are matched as empty strings.
pub fn score_ingredients<E: Embedder + ?Sized>(context: &ReferenceContext, embedder: &E, mut table: Table) -> Result<Table> {
    if table.is_empty() {
        table.require_column(INGREDIENT_NAME_COLUMN)?;
        table.set_column("taxonomy_id", Vec::new())?;
        table.set_column("matched_score", Vec::new())?;
        return Ok(table);
    }

    let names: Vec<String> = table
        .column(INGREDIENT_NAME_COLUMN)?
        .into_iter()
        .map(|n| n.unwrap_or_default().to_string())
        .collect();

    let results = context.match_texts(embedder, &names)?;
    table.set_column("taxonomy_id", results.iter().map(|m| Some(m.taxonomy_id.to_string())).collect())?;
    table.set_column("matched_score", results.iter().map(|m| Some(m.score.to_string())).collect())?;

    info!(ingredients = names.len(), "Scored ingredients");
    Ok(table)
}

/// Embed taxonomy names not yet present in `existing`. Each distinct
/// (id, name) pair is embedded once, in catalogue order.
pub fn vectorise_taxonomy<E: Embedder + ?Sized>(
    entries: &[TaxonomyEntry],
    existing: &BTreeSet<String>,
    embedder: &E,
) -> Result<Vec<NewTaxonomyVector>> {
    let mut seen = AHashSet::new();
    let fresh: Vec<&TaxonomyEntry> = entries
        .iter()
        .filter(|e| !existing.contains(&e.name))
        .filter(|e| seen.insert((e.id, e.name.clone())))
        .collect();

    if fresh.is_empty() {
        info!("No new taxonomy names to vectorise");
        return Ok(Vec::new());
    }

    let names: Vec<String> = fresh.iter().map(|e| e.name.clone()).collect();
    let vectors = encode_checked(embedder, &names)?;

    Ok(fresh
        .into_iter()
        .zip(vectors)
        .map(|(e, vector)| NewTaxonomyVector {
            taxonomy_id: e.id,
            ingredient_name: e.name.clone(),
            vector,
        })
        .collect())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregationReport {
    pub profiles: usize,
    pub entities: usize,
}

/// Rebuild the reference-value, summary and dashboard tables of `key` from
/// the scored observations. Each table is replaced whole.
pub fn rebuild_reference_tables(store: &PantryStore, config: &PantryConfig, key: EntityKey) -> Result<AggregationReport> {
    let observations = store.observations()?;
    let profiles = config.aggregation_plan(key).run(&observations)?;

    let catalogue = EntityCatalogue::from_taxonomy(&store.taxonomy_entries()?, store.categories()?, key);
    let summary = TabularProjector::new(config.allergen_labels.clone()).project(&profiles, &catalogue);
    let dashboard = dashboard_rows(&profiles, &catalogue, &config.data_source);

    store.write_reference_profiles(key, &profiles)?;
    store.write_summary(key, &summary)?;
    store.write_dashboard(key, &dashboard)?;

    let report = AggregationReport {
        profiles: profiles.len(),
        entities: summary.len(),
    };
    info!(profiles = report.profiles, entities = report.entities, "Reference tables rebuilt");
    Ok(report)
}
