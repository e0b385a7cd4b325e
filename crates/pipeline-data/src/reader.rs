//! Raw store discovery and loading.
//!
//! The ingestion client leaves one `{app_id}_meta.json` object and one
//! `{app_id}_reviews.jsonl` file per app in a flat directory. Files that
//! cannot be parsed are skipped with a warning; nothing here fails the run.

use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use pipeline_core::error::{PipelineError, Result};
use pipeline_core::fields::SOURCE_APP_ID_KEY;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

// ── File kinds ────────────────────────────────────────────────────────────────

/// The two per-app file naming conventions of the raw store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawFileKind {
    /// `{app_id}_meta.json`: a single JSON object.
    Metadata,
    /// `{app_id}_reviews.jsonl`: one JSON object per line.
    Reviews,
}

impl RawFileKind {
    fn pattern(self) -> &'static Regex {
        static META: OnceLock<Regex> = OnceLock::new();
        static REVIEWS: OnceLock<Regex> = OnceLock::new();
        match self {
            Self::Metadata => {
                META.get_or_init(|| Regex::new(r"^(.+)_meta\.json$").expect("regex is valid"))
            }
            Self::Reviews => REVIEWS
                .get_or_init(|| Regex::new(r"^(.+?)_reviews\.jsonl$").expect("regex is valid")),
        }
    }

    /// Extract the app id from a file name of this kind.
    pub fn app_id_from_name(self, file_name: &str) -> Option<String> {
        self.pattern()
            .captures(file_name)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }

    /// File name this kind uses for `app_id`.
    pub fn file_name(self, app_id: &str) -> String {
        match self {
            Self::Metadata => format!("{}_meta.json", app_id),
            Self::Reviews => format!("{}_reviews.jsonl", app_id),
        }
    }
}

/// A discovered raw file and the app id encoded in its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFile {
    pub path: PathBuf,
    pub app_id: String,
}

/// Everything the reader found in one raw directory.
#[derive(Debug, Clone, Default)]
pub struct RawStore {
    pub metadata: Vec<Value>,
    pub reviews: Vec<Value>,
}

impl RawStore {
    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty() && self.reviews.is_empty()
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Find the files of `kind` directly inside `raw_dir`, sorted by path.
pub fn find_raw_files(raw_dir: &Path, kind: RawFileKind) -> Vec<RawFile> {
    if !raw_dir.exists() {
        warn!("Raw data path does not exist: {}", raw_dir.display());
        return Vec::new();
    }

    let mut files: Vec<RawFile> = walkdir::WalkDir::new(raw_dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let app_id = kind.app_id_from_name(entry.file_name().to_str()?)?;
            Some(RawFile {
                path: entry.into_path(),
                app_id,
            })
        })
        .collect();

    files.sort_by(|a, b| a.path.cmp(&b.path));
    files
}

/// `*_meta.json` files in `raw_dir`.
pub fn find_metadata_files(raw_dir: &Path) -> Vec<RawFile> {
    find_raw_files(raw_dir, RawFileKind::Metadata)
}

/// `*_reviews.jsonl` files in `raw_dir`.
pub fn find_review_files(raw_dir: &Path) -> Vec<RawFile> {
    find_raw_files(raw_dir, RawFileKind::Reviews)
}

/// Load every metadata object in `raw_dir`, in path order.
pub fn load_metadata_records(raw_dir: &Path) -> Vec<Value> {
    let files = find_metadata_files(raw_dir);
    let mut records = Vec::with_capacity(files.len());

    for file in &files {
        match read_metadata_file(&file.path) {
            Ok(record) => records.push(record),
            Err(e) => warn!("Skipping {}: {}", file.path.display(), e),
        }
    }

    debug!(
        "Loaded {} metadata records from {} files",
        records.len(),
        files.len()
    );
    records
}

/// Load every review in `raw_dir`, tagging each with the app id taken from
/// its file name under `_source_app_id`.
pub fn load_review_records(raw_dir: &Path) -> Vec<Value> {
    let files = find_review_files(raw_dir);
    let mut records = Vec::new();

    for file in &files {
        match read_review_file(&file.path, &file.app_id) {
            Ok(batch) => {
                debug!("File {}: {} reviews", file.path.display(), batch.len());
                records.extend(batch);
            }
            Err(e) => warn!("Skipping {}: {}", file.path.display(), e),
        }
    }

    records
}

/// Load both halves of the raw store.
pub fn load_raw_store(raw_dir: &Path) -> RawStore {
    RawStore {
        metadata: load_metadata_records(raw_dir),
        reviews: load_review_records(raw_dir),
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn read_metadata_file(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path).map_err(|source| PipelineError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = serde_json::from_str(&content)?;
    if !value.is_object() {
        return Err(PipelineError::MalformedRecord {
            path: path.to_path_buf(),
            reason: "expected a JSON object".to_string(),
        });
    }
    Ok(value)
}

/// Parse a whole JSONL file. Any bad line rejects the file.
fn read_review_file(path: &Path, app_id: &str) -> Result<Vec<Value>> {
    let file = std::fs::File::open(path).map_err(|source| PipelineError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = std::io::BufReader::new(file);
    let mut records = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| PipelineError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let mut record: Value =
            serde_json::from_str(trimmed).map_err(|e| PipelineError::MalformedRecord {
                path: path.to_path_buf(),
                reason: format!("line {}: {}", idx + 1, e),
            })?;
        let Some(obj) = record.as_object_mut() else {
            return Err(PipelineError::MalformedRecord {
                path: path.to_path_buf(),
                reason: format!("line {}: expected a JSON object", idx + 1),
            });
        };
        obj.insert(
            SOURCE_APP_ID_KEY.to_string(),
            Value::String(app_id.to_string()),
        );
        records.push(record);
    }

    Ok(records)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
