//! Transform and serving steps.
//!
//! Each step reads the latest on-disk snapshot and writes a full replacement
//! of its outputs. The transform step turns the raw store into the normalized
//! catalog and review tables; the serving step derives the KPI and daily
//! tables from those.

use std::path::{Path, PathBuf};

use pipeline_core::error::{PipelineError, Result};
use pipeline_data::catalog::build_apps_catalog;
use pipeline_data::daily::compute_daily_metrics;
use pipeline_data::kpi::compute_app_kpis;
use pipeline_data::reader::load_raw_store;
use pipeline_data::reviews::build_apps_reviews;
use pipeline_data::tables::{
    read_catalog_titles, read_review_table, write_app_kpis, write_apps_catalog,
    write_apps_reviews, write_daily_metrics, APPS_CATALOG_FILE, APPS_REVIEWS_FILE, APP_KPIS_FILE,
    DAILY_METRICS_FILE,
};
use tracing::info;

// ── Configuration ─────────────────────────────────────────────────────────────

/// Directories the pipeline reads from and writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub raw_dir: PathBuf,
    pub processed_dir: PathBuf,
}

impl PipelineConfig {
    pub fn new(raw_dir: impl Into<PathBuf>, processed_dir: impl Into<PathBuf>) -> Self {
        Self {
            raw_dir: raw_dir.into(),
            processed_dir: processed_dir.into(),
        }
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.processed_dir.join(APPS_CATALOG_FILE)
    }

    pub fn reviews_path(&self) -> PathBuf {
        self.processed_dir.join(APPS_REVIEWS_FILE)
    }

    pub fn kpis_path(&self) -> PathBuf {
        self.processed_dir.join(APP_KPIS_FILE)
    }

    pub fn daily_path(&self) -> PathBuf {
        self.processed_dir.join(DAILY_METRICS_FILE)
    }
}

/// Which steps [`Pipeline::run`] executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stages {
    pub transform: bool,
    pub serve: bool,
}

impl Default for Stages {
    fn default() -> Self {
        Self {
            transform: true,
            serve: true,
        }
    }
}

// ── Reports ───────────────────────────────────────────────────────────────────

/// Outcome of a transform run. `None` means that table was not written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformReport {
    pub catalog_rows: Option<usize>,
    pub review_rows: Option<usize>,
}

impl TransformReport {
    /// `true` when the raw store was empty and nothing was written.
    pub fn is_empty(&self) -> bool {
        self.catalog_rows.is_none() && self.review_rows.is_none()
    }
}

/// Outcome of a serving run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServeReport {
    pub kpi_rows: usize,
    pub daily_rows: usize,
    /// Whether `daily_metrics.csv` carries the `app_name` column.
    pub daily_has_app_name: bool,
}

/// Outcome of [`Pipeline::run`]; skipped steps are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub transform: Option<TransformReport>,
    pub serve: Option<ServeReport>,
}

// ── Pipeline ──────────────────────────────────────────────────────────────────

/// Batch pipeline over one raw and one processed directory.
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the enabled steps in order: transform, then serve.
    ///
    /// When the transform step finds no raw files and no normalized tables
    /// are left from an earlier run, the run ends there successfully. Tables
    /// from an earlier run are still served.
    pub fn run(&self, stages: Stages) -> Result<RunReport> {
        let mut report = RunReport::default();
        if stages.transform {
            let transform = self.run_transform()?;
            let nothing_written = transform.is_empty();
            report.transform = Some(transform);
            if nothing_written && !self.has_normalized_tables() {
                return Ok(report);
            }
        }
        if stages.serve {
            report.serve = Some(self.run_serve()?);
        }
        Ok(report)
    }

    /// Normalize the raw store into `apps_catalog.csv` and `apps_reviews.csv`.
    ///
    /// An empty raw store is not an error: nothing is written and the
    /// returned report is empty.
    pub fn run_transform(&self) -> Result<TransformReport> {
        let raw = load_raw_store(&self.config.raw_dir);
        let mut report = TransformReport::default();

        if raw.is_empty() {
            info!(
                "No raw files found in {}. Run the ingestion step first.",
                self.config.raw_dir.display()
            );
            return Ok(report);
        }

        ensure_dir(&self.config.processed_dir)?;

        if raw.metadata.is_empty() {
            info!("No metadata files to transform.");
        } else {
            let catalog = build_apps_catalog(&raw.metadata);
            let path = self.config.catalog_path();
            write_apps_catalog(&path, &catalog)?;
            info!("Wrote {} apps to {}", catalog.len(), path.display());
            report.catalog_rows = Some(catalog.len());
        }

        if raw.reviews.is_empty() {
            info!("No reviews files to transform.");
        } else {
            let reviews = build_apps_reviews(&raw.reviews);
            let path = self.config.reviews_path();
            write_apps_reviews(&path, &reviews)?;
            info!("Wrote {} reviews to {}", reviews.len(), path.display());
            report.review_rows = Some(reviews.len());
        }

        Ok(report)
    }

    /// Derive `app_kpis.csv` and `daily_metrics.csv` from the normalized
    /// tables.
    ///
    /// Both summaries are computed before either is written, so a structural
    /// error leaves the previous outputs untouched.
    pub fn run_serve(&self) -> Result<ServeReport> {
        let catalog_path = self.config.catalog_path();
        let reviews_path = self.config.reviews_path();
        for path in [&catalog_path, &reviews_path] {
            if !path.exists() {
                return Err(PipelineError::MissingInput(path.to_path_buf()));
            }
        }

        let titles = read_catalog_titles(&catalog_path)?;
        let reviews = read_review_table(&reviews_path)?;

        let kpis = compute_app_kpis(&titles, &reviews);
        let daily = compute_daily_metrics(&reviews)?;

        let kpis_path = self.config.kpis_path();
        let daily_path = self.config.daily_path();
        write_app_kpis(&kpis_path, &kpis)?;
        write_daily_metrics(&daily_path, &daily)?;

        info!(
            "Wrote app KPIs to {} ({} rows)",
            kpis_path.display(),
            kpis.len()
        );
        info!(
            "Wrote daily metrics to {} ({} rows)",
            daily_path.display(),
            daily.rows.len()
        );

        Ok(ServeReport {
            kpi_rows: kpis.len(),
            daily_rows: daily.rows.len(),
            daily_has_app_name: daily.include_app_name,
        })
    }

    fn has_normalized_tables(&self) -> bool {
        self.config.catalog_path().exists() && self.config.reviews_path().exists()
    }
}

fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|source| PipelineError::FileWrite {
        path: dir.to_path_buf(),
        source,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
