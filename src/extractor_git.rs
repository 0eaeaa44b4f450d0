//! Git-history extractor (rank 5).
//!
//! Derives citation-relevant facts from the checkout's commit history: the
//! contributor list in commit order and the first/last commit dates. This is
//! a dispatch side effect rather than a file parse; the "source file" handed
//! in is the checkout root itself.

use anyhow::{anyhow, Result};
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::path::Path;

use crate::checkout::git_in;
use crate::extract::Extractor;
use crate::extractor_manifest::parse_person;
use crate::models::{ProjectContext, SourceKind};

pub struct GitHistoryExtractor;

impl Extractor for GitHistoryExtractor {
    fn kind(&self) -> SourceKind {
        SourceKind::GitHistory
    }

    fn extract(&self, source: &Path, _ctx: &ProjectContext) -> Result<String> {
        let mut record = serde_json::Map::new();

        let contributors = contributors(source)?;
        if !contributors.is_empty() {
            record.insert("contributor".into(), Value::Array(contributors));
        }
        if let Some(created) = first_commit_date(source) {
            record.insert("dateCreated".into(), json!(created));
        }
        if let Some(modified) = last_commit_date(source) {
            record.insert("dateModified".into(), json!(modified));
        }

        Ok(serde_json::to_string(&Value::Object(record))?)
    }
}

/// Unique commit authors, most recent first, deduplicated by email.
fn contributors(repo: &Path) -> Result<Vec<Value>> {
    let output = git_in(repo, &["log", "--format=%an <%ae>"])
        .map_err(|detail| anyhow!("git log failed: {detail}"))?;

    let mut seen = HashSet::new();
    let mut people = Vec::new();
    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let email = line
            .rfind('<')
            .map(|i| line[i..].to_lowercase())
            .unwrap_or_else(|| line.to_lowercase());
        if seen.insert(email) {
            people.push(parse_person(line));
        }
    }
    Ok(people)
}

fn first_commit_date(repo: &Path) -> Option<String> {
    let output = git_in(repo, &["log", "--reverse", "--format=%ct"]).ok()?;
    epoch_to_date(output.lines().next()?)
}

fn last_commit_date(repo: &Path) -> Option<String> {
    let output = git_in(repo, &["log", "-1", "--format=%ct"]).ok()?;
    epoch_to_date(output.lines().next()?)
}

fn epoch_to_date(epoch: &str) -> Option<String> {
    let secs = epoch.trim().parse::<i64>().ok()?;
    let dt = Utc.timestamp_opt(secs, 0).single()?;
    Some(dt.format("%Y-%m-%d").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_formats_as_date() {
        assert_eq!(epoch_to_date("1700000000").as_deref(), Some("2023-11-14"));
        assert_eq!(epoch_to_date("garbage"), None);
    }
}
