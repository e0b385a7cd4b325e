//! Boundary to the app-store ingestion client.
//!
//! The pipeline never talks to the network itself. A client implementing
//! [`AppStoreClient`] fetches metadata and reviews; [`RawStoreWriter`] lays
//! them out in the raw directory using the naming convention the reader
//! expects.

use std::io::Write;
use std::path::{Path, PathBuf};

use pipeline_core::error::{PipelineError, Result};
use pipeline_data::reader::RawFileKind;
use serde_json::Value;
use tracing::{info, warn};

/// Reviews fetched per app when the caller does not say otherwise.
pub const DEFAULT_REVIEW_COUNT: usize = 100;

/// Source of raw app-store records.
pub trait AppStoreClient {
    /// Fetch the metadata object for one app.
    fn fetch_metadata(&self, app_id: &str) -> Result<Value>;

    /// Fetch up to `count` reviews for one app, newest first.
    fn fetch_reviews(&self, app_id: &str, count: usize) -> Result<Vec<Value>>;
}

// ── RawStoreWriter ────────────────────────────────────────────────────────────

/// Writes client results into a raw directory.
#[derive(Debug, Clone)]
pub struct RawStoreWriter {
    raw_dir: PathBuf,
}

impl RawStoreWriter {
    pub fn new(raw_dir: impl Into<PathBuf>) -> Self {
        Self {
            raw_dir: raw_dir.into(),
        }
    }

    pub fn raw_dir(&self) -> &Path {
        &self.raw_dir
    }

    /// Write `{app_id}_meta.json` as pretty-printed JSON, replacing any
    /// previous run's file.
    pub fn save_metadata(&self, app_id: &str, metadata: &Value) -> Result<PathBuf> {
        let path = self.prepare(RawFileKind::Metadata, app_id)?;
        let json = serde_json::to_string_pretty(metadata)?;
        std::fs::write(&path, json).map_err(|source| PipelineError::FileWrite {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    /// Write `{app_id}_reviews.jsonl`, one compact object per line. The file
    /// is truncated first.
    pub fn save_reviews(&self, app_id: &str, reviews: &[Value]) -> Result<PathBuf> {
        let path = self.prepare(RawFileKind::Reviews, app_id)?;
        let write_err = |source: std::io::Error| PipelineError::FileWrite {
            path: path.clone(),
            source,
        };

        let file = std::fs::File::create(&path).map_err(write_err)?;
        let mut out = std::io::BufWriter::new(file);
        for review in reviews {
            serde_json::to_writer(&mut out, review)?;
            out.write_all(b"\n").map_err(write_err)?;
        }
        out.flush().map_err(write_err)?;
        Ok(path)
    }

    fn prepare(&self, kind: RawFileKind, app_id: &str) -> Result<PathBuf> {
        if app_id.is_empty() || app_id.contains(['/', '\\']) {
            return Err(PipelineError::Config(format!("invalid app id '{}'", app_id)));
        }
        std::fs::create_dir_all(&self.raw_dir).map_err(|source| PipelineError::FileWrite {
            path: self.raw_dir.clone(),
            source,
        })?;
        Ok(self.raw_dir.join(kind.file_name(app_id)))
    }
}

// ── Ingestion run ─────────────────────────────────────────────────────────────

/// Result of [`ingest_apps`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub succeeded: Vec<String>,
    /// `(app_id, error message)` for every app that could not be ingested.
    pub failed: Vec<(String, String)>,
    pub reviews_written: usize,
}

/// Fetch and persist metadata and up to `review_count` reviews for each app.
///
/// A failing app is logged and recorded in the report; the remaining apps are
/// still processed. Metadata already written for an app whose reviews then
/// fail is left in place.
pub fn ingest_apps<C: AppStoreClient + ?Sized>(
    client: &C,
    writer: &RawStoreWriter,
    app_ids: &[String],
    review_count: usize,
) -> IngestReport {
    let mut report = IngestReport::default();

    for app_id in app_ids {
        match ingest_one(client, writer, app_id, review_count) {
            Ok(written) => {
                report.succeeded.push(app_id.clone());
                report.reviews_written += written;
            }
            Err(e) => {
                warn!("Error fetching {}: {}", app_id, e);
                report.failed.push((app_id.clone(), e.to_string()));
            }
        }
    }

    info!(
        "Ingested {} of {} apps into {}",
        report.succeeded.len(),
        app_ids.len(),
        writer.raw_dir().display()
    );
    report
}

/// Ingest every app named in `apps_file` with [`DEFAULT_REVIEW_COUNT`]
/// reviews each.
///
/// An unreadable or malformed apps file fails before anything is fetched.
pub fn ingest_app_list<C: AppStoreClient + ?Sized>(
    client: &C,
    writer: &RawStoreWriter,
    apps_file: &Path,
) -> Result<IngestReport> {
    let app_ids = load_app_list(apps_file)?;
    Ok(ingest_apps(client, writer, &app_ids, DEFAULT_REVIEW_COUNT))
}

fn ingest_one<C: AppStoreClient + ?Sized>(
    client: &C,
    writer: &RawStoreWriter,
    app_id: &str,
    review_count: usize,
) -> Result<usize> {
    let metadata = client.fetch_metadata(app_id)?;
    let meta_path = writer.save_metadata(app_id, &metadata)?;

    let mut reviews = client.fetch_reviews(app_id, review_count)?;
    reviews.truncate(review_count);
    let reviews_path = writer.save_reviews(app_id, &reviews)?;

    info!(
        "Saved metadata to {} and {} reviews to {}",
        meta_path.display(),
        reviews.len(),
        reviews_path.display()
    );
    Ok(reviews.len())
}

/// Read an apps file: a JSON list of app id strings.
pub fn load_app_list(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(PipelineError::Config(format!(
            "Apps file not found: {}",
            path.display()
        )));
    }
    let content = std::fs::read_to_string(path).map_err(|source| PipelineError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = serde_json::from_str(&content)?;

    let not_a_list =
        || PipelineError::Config("apps file must contain a JSON list of app package names".into());
    value
        .as_array()
        .ok_or_else(not_a_list)?
        .iter()
        .map(|v| v.as_str().map(str::to_string).ok_or_else(not_a_list))
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
