//! Per-app, per-day review metrics.
//!
//! Groups reviews by `(app_id, calendar day of at)`. Rows without a review
//! time or app id fall out of every group.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use pipeline_core::error::{PipelineError, Result};
use pipeline_core::models::{DailyMetricRow, DailyMetrics, ReviewTable};

use crate::kpi::ScoreStats;

/// Name used for the review table in structural errors.
pub const REVIEWS_TABLE: &str = "apps_reviews";

/// Aggregate `reviews` by app and calendar day, ordered by `(app_id, date)`.
///
/// Errors with [`PipelineError::MissingColumn`] when the table has no `at`
/// column at all. When the table carries `app_name`, the last non-null name
/// seen for each app is attached to all of its rows; otherwise the output has
/// no `app_name` column.
pub fn compute_daily_metrics(reviews: &ReviewTable) -> Result<DailyMetrics> {
    if !reviews.has_at {
        return Err(PipelineError::MissingColumn {
            table: REVIEWS_TABLE.to_string(),
            column: "at".to_string(),
        });
    }

    let mut groups: BTreeMap<(&str, NaiveDate), ScoreStats> = BTreeMap::new();
    let mut latest_names: HashMap<&str, &str> = HashMap::new();

    for row in &reviews.rows {
        let Some(app_id) = row.app_id.as_deref() else {
            continue;
        };
        if let Some(name) = row.app_name.as_deref() {
            latest_names.insert(app_id, name);
        }
        let Some(at) = row.at else {
            continue;
        };
        groups.entry((app_id, at.date())).or_default().add_row(row);
    }

    let include_app_name = reviews.has_app_name;
    let rows = groups
        .into_iter()
        .map(|((app_id, date), stats)| DailyMetricRow {
            app_id: app_id.to_string(),
            app_name: if include_app_name {
                latest_names.get(app_id).map(|n| n.to_string())
            } else {
                None
            },
            date,
            daily_reviews: stats.reviews,
            daily_avg_rating: stats.mean(),
        })
        .collect();

    Ok(DailyMetrics {
        rows,
        include_app_name,
    })
}
