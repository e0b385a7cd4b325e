//! Runtime orchestration for the review pipeline.
//!
//! Sequences the transform and serving steps over explicit directories and
//! defines the boundary to the app-store ingestion client.

pub mod ingest;
pub mod pipeline;

pub use pipeline_core as core;
pub use pipeline_data as data;
