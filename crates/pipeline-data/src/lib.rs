//! Transform and serving layer of the review pipeline.
//!
//! Discovers and parses raw app-store dumps, builds the normalized catalog and
//! review tables, reads and writes them as CSV, and derives the per-app and
//! per-day summary tables.

pub mod catalog;
pub mod daily;
pub mod kpi;
pub mod reader;
pub mod reviews;
pub mod tables;

pub use pipeline_core as core;
