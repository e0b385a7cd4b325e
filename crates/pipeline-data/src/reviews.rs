//! Tagged raw reviews → normalized review table.

use pipeline_core::fields::{FieldLookup, APP_NAME_KEYS, SOURCE_APP_ID_KEY};
use pipeline_core::models::AppReviewRow;
use pipeline_core::timestamps::TimestampProcessor;
use serde_json::Value;

/// Map every review record to a row. Duplicates are kept as-is.
pub fn build_apps_reviews(records: &[Value]) -> Vec<AppReviewRow> {
    records.iter().map(map_review_row).collect()
}

/// Map one review record.
///
/// `app_id` always comes from the reader's `_source_app_id` tag, never from
/// the record body. `at` is coerced: anything unparsable becomes `None`.
pub fn map_review_row(record: &Value) -> AppReviewRow {
    let text = |key: &str| FieldLookup::get(record, key).and_then(FieldLookup::as_text);

    AppReviewRow {
        app_id: text(SOURCE_APP_ID_KEY),
        app_name: FieldLookup::text(record, APP_NAME_KEYS),
        review_id: text("reviewId"),
        user_name: text("userName"),
        score: FieldLookup::get(record, "score").and_then(FieldLookup::as_number),
        content: text("content"),
        thumbs_up_count: FieldLookup::get(record, "thumbsUpCount")
            .and_then(FieldLookup::as_integer),
        at: FieldLookup::get(record, "at").and_then(TimestampProcessor::parse),
    }
}
