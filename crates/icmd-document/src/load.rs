//! Raw JSON loading. No schema interpretation happens here.

use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::{DocumentError, DocumentResult};

/// Parsed but uninterpreted JSON document.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    origin: String,
    root: Value,
}

impl RawDocument {
    /// Parse JSON text. `origin` is only used in error messages.
    pub fn parse(origin: impl Into<String>, text: &str) -> DocumentResult<Self> {
        let origin = origin.into();
        let root = serde_json::from_str(text).map_err(|source| DocumentError::Json {
            origin: origin.clone(),
            source,
        })?;
        Ok(Self { origin, root })
    }

    pub fn from_value(origin: impl Into<String>, root: Value) -> Self {
        Self {
            origin: origin.into(),
            root,
        }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn root(&self) -> &Value {
        &self.root
    }
}

/// Read and parse a JSON file. The file is fully read and closed before
/// parsing starts.
pub fn load_raw(path: &Path) -> DocumentResult<RawDocument> {
    let content = std::fs::read_to_string(path).map_err(|source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), bytes = content.len(), "read document");
    RawDocument::parse(path.display().to_string(), &content)
}
