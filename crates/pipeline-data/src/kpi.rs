//! Per-app summary statistics.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDateTime;
use pipeline_core::models::{
    AppCatalogRow, AppKpiRow, AppReviewRow, ReviewTable, LOW_RATING_THRESHOLD,
};

// ── CatalogTitles ─────────────────────────────────────────────────────────────

/// `appId → title` lookup built from the catalog table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogTitles {
    titles: HashMap<String, Option<String>>,
}

impl CatalogTitles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a catalog entry. The first entry for an app id is kept.
    pub fn insert(&mut self, app_id: String, title: Option<String>) {
        self.titles.entry(app_id).or_insert(title);
    }

    /// Build from in-memory catalog rows; rows without an app id are ignored.
    pub fn from_rows(rows: &[AppCatalogRow]) -> Self {
        let mut titles = Self::new();
        for row in rows {
            if let Some(id) = &row.app_id {
                titles.insert(id.clone(), row.title.clone());
            }
        }
        titles
    }

    /// Display name for `app_id`: the catalog title, or `""` when the app is
    /// not catalogued or has no title.
    pub fn display_name(&self, app_id: &str) -> &str {
        self.titles
            .get(app_id)
            .and_then(|t| t.as_deref())
            .unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }
}

// ── ScoreStats ────────────────────────────────────────────────────────────────

/// Running counters shared by the per-app and per-day aggregations.
#[derive(Debug, Clone, Default)]
pub struct ScoreStats {
    /// Rows with a review id.
    pub reviews: usize,
    pub score_sum: f64,
    /// Rows with a non-null score.
    pub scored: usize,
    /// Rows with a score below [`LOW_RATING_THRESHOLD`].
    pub low: usize,
}

impl ScoreStats {
    pub fn add_row(&mut self, row: &AppReviewRow) {
        if row.review_id.is_some() {
            self.reviews += 1;
        }
        if let Some(score) = row.score {
            self.score_sum += score;
            self.scored += 1;
            if score < LOW_RATING_THRESHOLD {
                self.low += 1;
            }
        }
    }

    /// Arithmetic mean of the non-null scores; `NaN` when there are none.
    pub fn mean(&self) -> f64 {
        if self.scored == 0 {
            f64::NAN
        } else {
            self.score_sum / self.scored as f64
        }
    }

    /// Share of low scores among the non-null scores; `0.0` when there are
    /// none.
    pub fn low_fraction(&self) -> f64 {
        if self.scored == 0 {
            0.0
        } else {
            self.low as f64 / self.scored as f64
        }
    }
}

// ── Aggregation ───────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct AppAccumulator {
    stats: ScoreStats,
    first: Option<NaiveDateTime>,
    last: Option<NaiveDateTime>,
}

impl AppAccumulator {
    fn add_row(&mut self, row: &AppReviewRow) {
        self.stats.add_row(row);
        if let Some(at) = row.at {
            self.first = Some(self.first.map_or(at, |f| f.min(at)));
            self.last = Some(self.last.map_or(at, |l| l.max(at)));
        }
    }
}

/// Compute one KPI row per distinct non-null `app_id`, ordered by app id.
///
/// A table read without an `at` column simply yields null first/last review
/// times.
pub fn compute_app_kpis(titles: &CatalogTitles, reviews: &ReviewTable) -> Vec<AppKpiRow> {
    let mut groups: BTreeMap<&str, AppAccumulator> = BTreeMap::new();

    for row in &reviews.rows {
        let Some(app_id) = row.app_id.as_deref() else {
            continue;
        };
        groups.entry(app_id).or_default().add_row(row);
    }

    groups
        .into_iter()
        .map(|(app_id, acc)| AppKpiRow {
            app_id: app_id.to_string(),
            app_name: titles.display_name(app_id).to_string(),
            num_reviews: acc.stats.reviews,
            avg_rating: acc.stats.mean(),
            pct_low_ratings: acc.stats.low_fraction(),
            first_review_at: acc.first,
            last_review_at: acc.last,
        })
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn row(
        app: Option<&str>,
        id: &str,
        score: Option<f64>,
        at: Option<NaiveDateTime>,
    ) -> AppReviewRow {
        AppReviewRow {
            app_id: app.map(str::to_string),
            review_id: Some(id.to_string()),
            score,
            at,
            ..Default::default()
        }
    }

    fn titles() -> CatalogTitles {
        let mut t = CatalogTitles::new();
        t.insert("com.x".to_string(), Some("X".to_string()));
        t.insert("com.untitled".to_string(), None);
        t
    }

    #[test]
    fn test_kpis_basic_group() {
        let table = ReviewTable::complete(vec![
            row(Some("com.x"), "1", Some(1.0), Some(ts(2, 9))),
            row(Some("com.x"), "2", Some(1.0), Some(ts(1, 8))),
            row(Some("com.x"), "3", Some(5.0), Some(ts(3, 7))),
        ]);
        let kpis = compute_app_kpis(&titles(), &table);

        assert_eq!(kpis.len(), 1);
        let k = &kpis[0];
        assert_eq!(k.app_id, "com.x");
        assert_eq!(k.app_name, "X");
        assert_eq!(k.num_reviews, 3);
        assert!((k.avg_rating - 7.0 / 3.0).abs() < 1e-9);
        assert!((k.pct_low_ratings - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(k.first_review_at, Some(ts(1, 8)));
        assert_eq!(k.last_review_at, Some(ts(3, 7)));
    }

    #[test]
    fn test_kpis_skip_null_app_id() {
        let table = ReviewTable::complete(vec![
            row(None, "1", Some(1.0), None),
            row(Some("com.x"), "2", Some(4.0), None),
        ]);
        let kpis = compute_app_kpis(&titles(), &table);
        assert_eq!(kpis.len(), 1);
        assert_eq!(kpis[0].num_reviews, 1);
    }

    #[test]
    fn test_kpis_uncatalogued_app_gets_empty_name() {
        let table = ReviewTable::complete(vec![
            row(Some("com.unknown"), "1", Some(3.0), None),
            row(Some("com.untitled"), "2", Some(3.0), None),
        ]);
        let kpis = compute_app_kpis(&titles(), &table);
        assert_eq!(kpis[0].app_id, "com.unknown");
        assert_eq!(kpis[0].app_name, "");
        assert_eq!(kpis[1].app_name, "");
    }

    #[test]
    fn test_kpis_no_scores_policy() {
        let table = ReviewTable::complete(vec![
            row(Some("com.x"), "1", None, None),
            row(Some("com.x"), "2", None, None),
        ]);
        let k = &compute_app_kpis(&titles(), &table)[0];
        assert_eq!(k.num_reviews, 2);
        assert!(k.avg_rating.is_nan());
        assert_eq!(k.pct_low_ratings, 0.0);
        assert!(k.first_review_at.is_none());
        assert!(k.last_review_at.is_none());
    }

    #[test]
    fn test_kpis_null_scores_excluded_from_denominator() {
        let table = ReviewTable::complete(vec![
            row(Some("com.x"), "1", Some(1.0), None),
            row(Some("com.x"), "2", None, None),
            row(Some("com.x"), "3", Some(4.0), None),
        ]);
        let k = &compute_app_kpis(&titles(), &table)[0];
        assert_eq!(k.num_reviews, 3);
        assert_eq!(k.avg_rating, 2.5);
        assert_eq!(k.pct_low_ratings, 0.5);
    }

    #[test]
    fn test_kpis_num_reviews_counts_review_ids() {
        let mut anonymous = row(Some("com.x"), "x", Some(5.0), None);
        anonymous.review_id = None;
        let table =
            ReviewTable::complete(vec![anonymous, row(Some("com.x"), "1", Some(5.0), None)]);
        let k = &compute_app_kpis(&titles(), &table)[0];
        assert_eq!(k.num_reviews, 1);
        assert_eq!(k.avg_rating, 5.0);
    }

    #[test]
    fn test_kpis_ordered_by_app_id() {
        let table = ReviewTable::complete(vec![
            row(Some("com.z"), "1", Some(3.0), None),
            row(Some("com.a"), "2", Some(3.0), None),
        ]);
        let ids: Vec<String> = compute_app_kpis(&titles(), &table)
            .into_iter()
            .map(|k| k.app_id)
            .collect();
        assert_eq!(ids, vec!["com.a", "com.z"]);
    }

    #[test]
    fn test_pct_low_ratings_within_unit_interval() {
        let scores = [0.0, 1.0, 1.5, 2.0, 2.5, 5.0];
        for n in 0..=scores.len() {
            let rows = scores[..n]
                .iter()
                .enumerate()
                .map(|(i, s)| row(Some("com.x"), &i.to_string(), Some(*s), None))
                .collect();
            for k in compute_app_kpis(&titles(), &ReviewTable::complete(rows)) {
                assert!((0.0..=1.0).contains(&k.pct_low_ratings));
            }
        }
    }

    #[test]
    fn test_catalog_titles_first_wins() {
        let rows = vec![
            AppCatalogRow {
                app_id: Some("com.x".to_string()),
                title: Some("First".to_string()),
                ..Default::default()
            },
            AppCatalogRow {
                app_id: Some("com.x".to_string()),
                title: Some("Second".to_string()),
                ..Default::default()
            },
            AppCatalogRow::default(),
        ];
        let titles = CatalogTitles::from_rows(&rows);
        assert_eq!(titles.len(), 1);
        assert_eq!(titles.display_name("com.x"), "First");
    }
}
