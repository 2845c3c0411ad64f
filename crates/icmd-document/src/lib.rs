//! icmd-document: loading and validating ICMD result documents.
//!
//! The raw loader only parses JSON. Everything that interprets the layout
//! (models, elements, parameter trees) happens in [`Document::from_raw`],
//! which rejects malformed input before any extraction runs. Two model
//! layouts are accepted: plain parameter trees and the tool's
//! coords/data_vars datasets ([`dataset`]).

pub mod dataset;
pub mod flatten;
pub mod load;
pub mod schema;
pub mod validate;

use std::path::PathBuf;

pub use flatten::{PATH_SEPARATOR, join_path};
pub use load::{RawDocument, load_raw};
pub use schema::*;
pub use validate::ValidationError;

pub type DocumentResult<T> = Result<T, DocumentError>;

#[derive(thiserror::Error, Debug)]
pub enum DocumentError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid JSON in {origin}: {source}")]
    Json {
        origin: String,
        source: serde_json::Error,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Load a document from disk and validate it.
pub fn load_document(path: &std::path::Path) -> DocumentResult<Document> {
    load_document_with(path, &LoadOptions::default())
}

pub fn load_document_with(
    path: &std::path::Path,
    options: &LoadOptions,
) -> DocumentResult<Document> {
    let raw = load_raw(path)?;
    Document::from_raw_with(&raw, options)
}
