use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::model::RawDocument;

pub(super) fn load_layout_json(path: &Path, max_pages: Option<usize>) -> Result<RawDocument> {
    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let mut document: RawDocument = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse layout json {}", path.display()))?;

    if let Some(max_pages) = max_pages {
        document.pages.truncate(max_pages);
    }

    Ok(document)
}
