use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Columns of `apps_catalog.csv`, in order.
pub const CATALOG_COLUMNS: &[&str] = &[
    "appId",
    "title",
    "developer",
    "score",
    "ratings",
    "installs",
    "genre",
    "price",
];

/// Columns of `apps_reviews.csv`, in order.
pub const REVIEW_COLUMNS: &[&str] = &[
    "app_id",
    "app_name",
    "reviewId",
    "userName",
    "score",
    "content",
    "thumbsUpCount",
    "at",
];

/// Columns of `app_kpis.csv`, in order.
pub const KPI_COLUMNS: &[&str] = &[
    "app_id",
    "app_name",
    "num_reviews",
    "avg_rating",
    "pct_low_ratings",
    "first_review_at",
    "last_review_at",
];

/// Columns of `daily_metrics.csv` when app names are available.
pub const DAILY_COLUMNS: &[&str] = &[
    "app_id",
    "app_name",
    "date",
    "daily_reviews",
    "daily_avg_rating",
];

/// Columns of `daily_metrics.csv` when the review table had no `app_name`.
pub const DAILY_COLUMNS_WITHOUT_NAME: &[&str] =
    &["app_id", "date", "daily_reviews", "daily_avg_rating"];

/// Ratings strictly below this score count as low.
pub const LOW_RATING_THRESHOLD: f64 = 2.0;

/// One app in the normalized catalog.
///
/// Source values other than the identifier and the free-text fields are kept
/// as raw JSON so that numbers, strings like `"1,000,000+"` and nulls survive
/// unchanged into the table.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AppCatalogRow {
    pub app_id: Option<String>,
    pub title: Option<String>,
    pub developer: Option<String>,
    pub score: Option<Value>,
    pub ratings: Option<Value>,
    pub installs: Option<Value>,
    pub genre: Option<String>,
    pub price: Option<Value>,
}

/// One review in the normalized review table.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AppReviewRow {
    /// Filename-derived source app; `None` only for rows read back from a
    /// table with an empty cell.
    pub app_id: Option<String>,
    pub app_name: Option<String>,
    pub review_id: Option<String>,
    pub user_name: Option<String>,
    pub score: Option<f64>,
    pub content: Option<String>,
    pub thumbs_up_count: Option<i64>,
    /// Review time; unparsable source values are coerced to `None`.
    pub at: Option<NaiveDateTime>,
}

/// Review rows plus the optional columns the source table actually carried.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReviewTable {
    pub rows: Vec<AppReviewRow>,
    pub has_app_name: bool,
    pub has_at: bool,
}

impl ReviewTable {
    /// A table built in memory always carries every column.
    pub fn complete(rows: Vec<AppReviewRow>) -> Self {
        Self {
            rows,
            has_app_name: true,
            has_at: true,
        }
    }
}

/// Per-app summary statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppKpiRow {
    pub app_id: String,
    /// Catalog title, or the empty string when the app is not catalogued.
    pub app_name: String,
    pub num_reviews: usize,
    /// Mean score; `NaN` when the group has no scores.
    pub avg_rating: f64,
    /// Share of scores below [`LOW_RATING_THRESHOLD`], within `[0, 1]`.
    pub pct_low_ratings: f64,
    pub first_review_at: Option<NaiveDateTime>,
    pub last_review_at: Option<NaiveDateTime>,
}

/// Per-app, per-day statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyMetricRow {
    pub app_id: String,
    pub app_name: Option<String>,
    pub date: NaiveDate,
    pub daily_reviews: usize,
    /// Mean score for the day; `NaN` when the day has no scores.
    pub daily_avg_rating: f64,
}

/// The daily table together with its output shape.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyMetrics {
    pub rows: Vec<DailyMetricRow>,
    /// `false` when the review table had no `app_name` column; the column is
    /// then omitted from the output rather than written empty.
    pub include_app_name: bool,
}

impl DailyMetrics {
    /// Header for the shape this table will be written in.
    pub fn columns(&self) -> &'static [&'static str] {
        if self.include_app_name {
            DAILY_COLUMNS
        } else {
            DAILY_COLUMNS_WITHOUT_NAME
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_table_complete_has_all_columns() {
        let table = ReviewTable::complete(vec![AppReviewRow::default()]);
        assert!(table.has_app_name);
        assert!(table.has_at);
        assert_eq!(table.rows.len(), 1);
    }

    #[test]
    fn test_daily_columns_follow_shape() {
        let mut daily = DailyMetrics {
            rows: vec![],
            include_app_name: true,
        };
        assert_eq!(daily.columns()[1], "app_name");
        daily.include_app_name = false;
        assert_eq!(daily.columns(), &["app_id", "date", "daily_reviews", "daily_avg_rating"]);
    }

    #[test]
    fn test_column_counts() {
        assert_eq!(CATALOG_COLUMNS.len(), 8);
        assert_eq!(REVIEW_COLUMNS.len(), 8);
        assert_eq!(KPI_COLUMNS.len(), 7);
    }
}
