//! Contributor-list extractor (AUTHORS / CONTRIBUTORS / MAINTAINERS, rank 4).
//!
//! These files are free-form one-name-per-line lists, often with markdown
//! bullets or comment lines mixed in. Every plausible line becomes a
//! contributor entry.

use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::path::Path;

use crate::extract::Extractor;
use crate::extractor_manifest::parse_person;
use crate::models::{ProjectContext, SourceKind};

pub struct AuthorsExtractor;

impl Extractor for AuthorsExtractor {
    fn kind(&self) -> SourceKind {
        SourceKind::AuthorsFile
    }

    fn extract(&self, source: &Path, _ctx: &ProjectContext) -> Result<String> {
        let content = std::fs::read_to_string(source)
            .with_context(|| format!("Failed to read {}", source.display()))?;

        let people: Vec<Value> = content
            .lines()
            .filter_map(clean_line)
            .map(|entry| parse_person(&entry))
            .collect();

        let record = if people.is_empty() {
            json!({})
        } else {
            json!({ "contributor": people })
        };
        Ok(serde_json::to_string(&record)?)
    }
}

/// Strip bullets and decoration; drop headings, comments, and blanks.
fn clean_line(line: &str) -> Option<String> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with("//") {
        return None;
    }
    let trimmed = trimmed
        .trim_start_matches(['-', '*', '+'])
        .trim_start_matches(char::is_whitespace);
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bulleted_and_plain_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("AUTHORS.md");
        std::fs::write(
            &path,
            "# Authors\n\n- Ada Lovelace <ada@example.org>\n* Grace Hopper\nAlan Turing\n\n",
        )
        .unwrap();

        let ctx = ProjectContext {
            identifier: "p".into(),
            checkout_root: dir.path().to_path_buf(),
            work_dir: dir.path().to_path_buf(),
            source_url: None,
            ref_name: "main".into(),
            is_release: false,
        };
        let payload = AuthorsExtractor.extract(&path, &ctx).unwrap();
        let value: Value = serde_json::from_str(&payload).unwrap();
        let contributors = value["contributor"].as_array().unwrap();
        assert_eq!(contributors.len(), 3);
        assert_eq!(contributors[0]["email"], "ada@example.org");
        assert_eq!(contributors[1]["familyName"], "Hopper");
    }

    #[test]
    fn empty_file_yields_empty_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("AUTHORS");
        std::fs::write(&path, "# nothing but a heading\n").unwrap();

        let ctx = ProjectContext {
            identifier: "p".into(),
            checkout_root: dir.path().to_path_buf(),
            work_dir: dir.path().to_path_buf(),
            source_url: None,
            ref_name: "main".into(),
            is_release: false,
        };
        let payload = AuthorsExtractor.extract(&path, &ctx).unwrap();
        assert_eq!(payload, "{}");
    }
}
