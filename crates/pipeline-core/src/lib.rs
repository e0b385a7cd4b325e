//! Shared types for the app-review pipeline.
//!
//! Holds the normalized table rows, the error type, field-synonym lookup,
//! timestamp coercion, cell formatting and the CLI settings.

pub mod error;
pub mod fields;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod timestamps;
