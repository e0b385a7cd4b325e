//! Raw metadata → normalized app catalog.

use std::collections::HashSet;

use pipeline_core::fields::{FieldLookup, APP_ID_KEYS};
use pipeline_core::models::AppCatalogRow;
use serde_json::Value;

/// Map metadata records to catalog rows, keeping the first row per app id.
///
/// Records that resolve to no app id share a single `None` key, so only the
/// first of them survives.
pub fn build_apps_catalog(records: &[Value]) -> Vec<AppCatalogRow> {
    let mut seen: HashSet<Option<String>> = HashSet::new();

    records
        .iter()
        .map(map_catalog_row)
        .filter(|row| seen.insert(row.app_id.clone()))
        .collect()
}

/// Map one metadata record. Missing keys become `None`.
pub fn map_catalog_row(record: &Value) -> AppCatalogRow {
    let raw = |key: &str| FieldLookup::get(record, key).cloned();
    let text = |key: &str| FieldLookup::get(record, key).and_then(FieldLookup::as_text);

    AppCatalogRow {
        app_id: FieldLookup::text(record, APP_ID_KEYS),
        title: text("title"),
        developer: text("developer"),
        score: raw("score"),
        ratings: raw("ratings"),
        installs: raw("installs"),
        genre: text("genre"),
        price: raw("price"),
    }
}
