//! CSV persistence for the normalized and summary tables.
//!
//! Every write replaces the target file in full. Empty cells stand for null.

use std::fs::File;
use std::path::Path;

use csv::StringRecord;
use pipeline_core::error::{PipelineError, Result};
use pipeline_core::fields::FieldLookup;
use pipeline_core::formatting::{
    format_date, format_float, format_number, format_optional, format_timestamp,
};
use pipeline_core::models::{
    AppCatalogRow, AppKpiRow, AppReviewRow, DailyMetrics, ReviewTable, CATALOG_COLUMNS,
    KPI_COLUMNS, REVIEW_COLUMNS,
};
use pipeline_core::timestamps::TimestampProcessor;
use serde_json::Value;
use tracing::debug;

use crate::kpi::CatalogTitles;

/// File name of the normalized catalog.
pub const APPS_CATALOG_FILE: &str = "apps_catalog.csv";
/// File name of the normalized review table.
pub const APPS_REVIEWS_FILE: &str = "apps_reviews.csv";
/// File name of the per-app summary.
pub const APP_KPIS_FILE: &str = "app_kpis.csv";
/// File name of the per-day summary.
pub const DAILY_METRICS_FILE: &str = "daily_metrics.csv";

// ── Writers ───────────────────────────────────────────────────────────────────

/// Write `apps_catalog.csv`.
pub fn write_apps_catalog(path: &Path, rows: &[AppCatalogRow]) -> Result<()> {
    let raw = |v: &Option<Value>| v.as_ref().and_then(FieldLookup::as_text).unwrap_or_default();
    let text = |v: &Option<String>| v.clone().unwrap_or_default();

    write_table(
        path,
        CATALOG_COLUMNS,
        rows.iter().map(|r| {
            vec![
                text(&r.app_id),
                text(&r.title),
                text(&r.developer),
                raw(&r.score),
                raw(&r.ratings),
                raw(&r.installs),
                text(&r.genre),
                raw(&r.price),
            ]
        }),
    )
}

/// Write `apps_reviews.csv`.
pub fn write_apps_reviews(path: &Path, rows: &[AppReviewRow]) -> Result<()> {
    let text = |v: &Option<String>| v.clone().unwrap_or_default();

    write_table(
        path,
        REVIEW_COLUMNS,
        rows.iter().map(|r| {
            vec![
                text(&r.app_id),
                text(&r.app_name),
                text(&r.review_id),
                text(&r.user_name),
                format_optional(r.score.as_ref(), |s| format_number(*s)),
                text(&r.content),
                format_optional(r.thumbs_up_count.as_ref(), |n| n.to_string()),
                format_optional(r.at.as_ref(), format_timestamp),
            ]
        }),
    )
}

/// Write `app_kpis.csv`.
pub fn write_app_kpis(path: &Path, rows: &[AppKpiRow]) -> Result<()> {
    write_table(
        path,
        KPI_COLUMNS,
        rows.iter().map(|r| {
            vec![
                r.app_id.clone(),
                r.app_name.clone(),
                r.num_reviews.to_string(),
                format_float(r.avg_rating),
                format_float(r.pct_low_ratings),
                format_optional(r.first_review_at.as_ref(), format_timestamp),
                format_optional(r.last_review_at.as_ref(), format_timestamp),
            ]
        }),
    )
}

/// Write `daily_metrics.csv` in the shape recorded on `daily`.
pub fn write_daily_metrics(path: &Path, daily: &DailyMetrics) -> Result<()> {
    write_table(
        path,
        daily.columns(),
        daily.rows.iter().map(|r| {
            let mut cells = vec![r.app_id.clone()];
            if daily.include_app_name {
                cells.push(r.app_name.clone().unwrap_or_default());
            }
            cells.push(format_date(&r.date));
            cells.push(r.daily_reviews.to_string());
            cells.push(format_float(r.daily_avg_rating));
            cells
        }),
    )
}

fn write_table(
    path: &Path,
    header: &[&str],
    rows: impl Iterator<Item = Vec<String>>,
) -> Result<()> {
    let file = File::create(path).map_err(|source| PipelineError::FileWrite {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = csv::Writer::from_writer(file);

    writer.write_record(header)?;
    let mut count = 0usize;
    for row in rows {
        writer.write_record(&row)?;
        count += 1;
    }
    writer.flush().map_err(|source| PipelineError::FileWrite {
        path: path.to_path_buf(),
        source,
    })?;

    debug!("Wrote {} rows to {}", count, path.display());
    Ok(())
}

// ── Readers ───────────────────────────────────────────────────────────────────

/// Read the `appId → title` map from `apps_catalog.csv`.
///
/// A catalog without a `title` column yields an empty name for every app.
pub fn read_catalog_titles(path: &Path) -> Result<CatalogTitles> {
    let mut reader = open_table(path)?;
    let header = reader.headers()?.clone();
    let id_idx = require_column(&header, path, "appId")?;
    let title_idx = column_index(&header, "title");

    let mut titles = CatalogTitles::new();
    for record in reader.records() {
        let record = record?;
        if let Some(app_id) = cell(&record, Some(id_idx)) {
            titles.insert(app_id, cell(&record, title_idx));
        }
    }
    Ok(titles)
}

/// Read `apps_reviews.csv`, noting which optional columns were present.
///
/// `app_id` is required. Numbers and timestamps are re-coerced; cells that do
/// not parse become null.
pub fn read_review_table(path: &Path) -> Result<ReviewTable> {
    let mut reader = open_table(path)?;
    let header = reader.headers()?.clone();

    let app_id = require_column(&header, path, "app_id")?;
    let app_name = column_index(&header, "app_name");
    let review_id = column_index(&header, "reviewId");
    let user_name = column_index(&header, "userName");
    let score = column_index(&header, "score");
    let content = column_index(&header, "content");
    let thumbs = column_index(&header, "thumbsUpCount");
    let at = column_index(&header, "at");

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(AppReviewRow {
            app_id: cell(&record, Some(app_id)),
            app_name: cell(&record, app_name),
            review_id: cell(&record, review_id),
            user_name: cell(&record, user_name),
            score: cell(&record, score)
                .and_then(|s| FieldLookup::as_number(&Value::String(s))),
            content: cell(&record, content),
            thumbs_up_count: cell(&record, thumbs)
                .and_then(|s| FieldLookup::as_integer(&Value::String(s))),
            at: cell(&record, at).and_then(|s| TimestampProcessor::parse_str(&s)),
        });
    }

    Ok(ReviewTable {
        rows,
        has_app_name: app_name.is_some(),
        has_at: at.is_some(),
    })
}

fn open_table(path: &Path) -> Result<csv::Reader<File>> {
    if !path.exists() {
        return Err(PipelineError::MissingInput(path.to_path_buf()));
    }
    let file = File::open(path).map_err(|source| PipelineError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(csv::Reader::from_reader(file))
}

fn column_index(header: &StringRecord, name: &str) -> Option<usize> {
    header.iter().position(|h| h == name)
}

fn require_column(header: &StringRecord, path: &Path, name: &str) -> Result<usize> {
    column_index(header, name).ok_or_else(|| PipelineError::MissingColumn {
        table: path.display().to_string(),
        column: name.to_string(),
    })
}

fn cell(record: &StringRecord, idx: Option<usize>) -> Option<String> {
    idx.and_then(|i| record.get(i))
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pipeline_core::models::DailyMetricRow;
    use serde_json::json;
    use tempfile::TempDir;

    fn review(app: &str, score: Option<f64>, at: &str) -> AppReviewRow {
        AppReviewRow {
            app_id: Some(app.to_string()),
            app_name: Some("Name, with comma".to_string()),
            review_id: Some("r1".to_string()),
            user_name: Some("u".to_string()),
            score,
            content: Some("line one\nline \"two\"".to_string()),
            thumbs_up_count: Some(3),
            at: TimestampProcessor::parse_str(at),
        }
    }

    #[test]
    fn test_catalog_written_with_header_and_nulls() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(APPS_CATALOG_FILE);
        let rows = vec![AppCatalogRow {
            app_id: Some("com.x".to_string()),
            title: Some("X".to_string()),
            score: Some(json!(4.2)),
            ..Default::default()
        }];
        write_apps_catalog(&path, &rows).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "appId,title,developer,score,ratings,installs,genre,price\ncom.x,X,,4.2,,,,\n"
        );
    }

    #[test]
    fn test_catalog_titles_read_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(APPS_CATALOG_FILE);
        let rows = vec![
            AppCatalogRow {
                app_id: Some("com.x".to_string()),
                title: Some("X".to_string()),
                ..Default::default()
            },
            AppCatalogRow {
                app_id: Some("com.y".to_string()),
                ..Default::default()
            },
        ];
        write_apps_catalog(&path, &rows).unwrap();

        let titles = read_catalog_titles(&path).unwrap();
        assert_eq!(titles.len(), 2);
        assert_eq!(titles.display_name("com.x"), "X");
        assert_eq!(titles.display_name("com.y"), "");
    }

    #[test]
    fn test_reviews_round_trip_through_csv() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(APPS_REVIEWS_FILE);
        let rows = vec![
            review("com.x", Some(5.0), "2024-03-01T10:00:00"),
            review("com.x", None, "garbage"),
        ];
        write_apps_reviews(&path, &rows).unwrap();

        let table = read_review_table(&path).unwrap();
        assert!(table.has_app_name);
        assert!(table.has_at);
        assert_eq!(table.rows, rows);
    }

    #[test]
    fn test_review_score_written_without_fraction() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(APPS_REVIEWS_FILE);
        write_apps_reviews(&path, &[review("com.x", Some(5.0), "2024-03-01T10:00:00")]).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains(",5,"));
        assert!(content.contains("2024-03-01 10:00:00"));
    }

    #[test]
    fn test_read_review_table_without_optional_columns() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(APPS_REVIEWS_FILE);
        std::fs::write(&path, "app_id,reviewId,score\ncom.x,r1,4\ncom.x,r2,\n").unwrap();

        let table = read_review_table(&path).unwrap();
        assert!(!table.has_app_name);
        assert!(!table.has_at);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].score, Some(4.0));
        assert_eq!(table.rows[1].score, None);
    }

    #[test]
    fn test_read_missing_table_is_missing_input() {
        let dir = TempDir::new().unwrap();
        let err = read_review_table(&dir.path().join(APPS_REVIEWS_FILE)).unwrap_err();
        assert!(matches!(err, PipelineError::MissingInput(_)));
    }

    #[test]
    fn test_read_table_without_id_column_is_structural_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(APPS_CATALOG_FILE);
        std::fs::write(&path, "title\nX\n").unwrap();
        let err = read_catalog_titles(&path).unwrap_err();
        assert!(matches!(err, PipelineError::MissingColumn { .. }));
    }

    #[test]
    fn test_kpis_written_in_fixed_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(APP_KPIS_FILE);
        let ts = TimestampProcessor::parse_str("2024-01-01T00:00:00");
        let rows = vec![AppKpiRow {
            app_id: "com.x".to_string(),
            app_name: String::new(),
            num_reviews: 2,
            avg_rating: f64::NAN,
            pct_low_ratings: 0.0,
            first_review_at: ts,
            last_review_at: None,
        }];
        write_app_kpis(&path, &rows).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "app_id,app_name,num_reviews,avg_rating,pct_low_ratings,first_review_at,last_review_at\n\
             com.x,,2,,0.0,2024-01-01 00:00:00,\n"
        );
    }

    #[test]
    fn test_daily_written_in_both_shapes() {
        let dir = TempDir::new().unwrap();
        let row = DailyMetricRow {
            app_id: "com.x".to_string(),
            app_name: Some("X".to_string()),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            daily_reviews: 3,
            daily_avg_rating: 3.0,
        };

        let with_name = dir.path().join("with.csv");
        let mut daily = DailyMetrics {
            rows: vec![row],
            include_app_name: true,
        };
        write_daily_metrics(&with_name, &daily).unwrap();
        assert_eq!(
            std::fs::read_to_string(&with_name).unwrap(),
            "app_id,app_name,date,daily_reviews,daily_avg_rating\ncom.x,X,2024-01-01,3,3.0\n"
        );

        let without_name = dir.path().join("without.csv");
        daily.include_app_name = false;
        write_daily_metrics(&without_name, &daily).unwrap();
        assert_eq!(
            std::fs::read_to_string(&without_name).unwrap(),
            "app_id,date,daily_reviews,daily_avg_rating\ncom.x,2024-01-01,3,3.0\n"
        );
    }

    #[test]
    fn test_write_replaces_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(APP_KPIS_FILE);
        std::fs::write(&path, "stale content that is longer than the new table\n".repeat(10))
            .unwrap();
        write_app_kpis(&path, &[]).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "app_id,app_name,num_reviews,avg_rating,pct_low_ratings,first_review_at,last_review_at\n"
        );
    }
}
