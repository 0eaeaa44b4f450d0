//! Explicit metadata record sources.
//!
//! Two flavors: the authoritative `codemeta.json`, which short-circuits
//! automatic extraction entirely when well-formed, and the
//! `codemeta-harvest.json` hint file, which joins the merge at the highest
//! rank.

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::path::Path;

use crate::extract::Extractor;
use crate::models::{ProjectContext, SourceKind};

/// Extractor for `codemeta-harvest.json` hint files (rank 1).
///
/// The payload is passed through verbatim; a malformed file is caught by the
/// validator like any other extractor output.
pub struct HarvestHintsExtractor;

impl Extractor for HarvestHintsExtractor {
    fn kind(&self) -> SourceKind {
        SourceKind::HarvestHints
    }

    fn extract(&self, source: &Path, _ctx: &ProjectContext) -> Result<String> {
        std::fs::read_to_string(source)
            .with_context(|| format!("Failed to read {}", source.display()))
    }
}

/// Parse an authoritative `codemeta.json`, requiring a JSON object.
///
/// Returns `Err` for a malformed file, in which case the caller falls back
/// to automatic extraction.
pub fn read_authoritative(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    if !value.is_object() {
        bail!("{} is not a JSON object", path.display());
    }
    Ok(value)
}
