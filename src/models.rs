//! Core data types used throughout the harvester.
//!
//! These types represent the metadata sources, partial records, and resolved
//! refs that flow through the harvest pipeline.

use std::fmt;
use std::path::PathBuf;

use serde_json::Value;

/// Branch names that are treated as moving mainline refs rather than releases.
pub const MAINLINE_BRANCHES: &[&str] = &["main", "master", "develop", "trunk", "HEAD"];

/// A recognized metadata source family.
///
/// Each kind carries a fixed priority rank; a lower rank wins conflicts
/// during reconciliation. The authoritative record has no meaningful rank
/// because, when present and well-formed, it replaces the merge entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// A `codemeta.json` already present in the checkout.
    AuthoritativeRecord,
    /// A `codemeta-harvest.json` with hand-curated fields to fold in.
    HarvestHints,
    /// A `CITATION.cff` citation file.
    CitationFile,
    /// A language build manifest (Cargo.toml, pyproject.toml, package.json).
    LanguageManifest,
    /// A plain-text AUTHORS / CONTRIBUTORS / MAINTAINERS listing.
    AuthorsFile,
    /// Facts derived from the git history of the checkout.
    GitHistory,
    /// A README scraped for documentation links.
    Readme,
    /// Install or build instruction documents.
    InstallInstructions,
}

impl SourceKind {
    /// Priority rank for this kind. Lower value = higher precedence.
    pub fn rank(&self) -> u8 {
        match self {
            SourceKind::AuthoritativeRecord => 0,
            SourceKind::HarvestHints => 1,
            SourceKind::CitationFile => 2,
            SourceKind::LanguageManifest => 3,
            SourceKind::AuthorsFile => 4,
            SourceKind::GitHistory => 5,
            SourceKind::Readme => 6,
            SourceKind::InstallInstructions => 7,
        }
    }

    /// Stable label used in staging filenames and log lines.
    pub fn label(&self) -> &'static str {
        match self {
            SourceKind::AuthoritativeRecord => "codemeta",
            SourceKind::HarvestHints => "harvest-hints",
            SourceKind::CitationFile => "citation",
            SourceKind::LanguageManifest => "manifest",
            SourceKind::AuthorsFile => "authors",
            SourceKind::GitHistory => "git-history",
            SourceKind::Readme => "readme",
            SourceKind::InstallInstructions => "install",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A git reference resolved for one harvest run. Immutable once resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRef {
    /// Tag, branch, or commit name as checked out.
    pub name: String,
    /// Whether the ref describes a released version rather than a moving
    /// mainline branch. Extractors and the reconciler change behavior on this.
    pub is_release: bool,
}

impl ResolvedRef {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let is_release = !MAINLINE_BRANCHES.contains(&name.as_str());
        Self { name, is_release }
    }
}

/// One extractor's raw contribution for one project, staged before validation.
///
/// `seq` increases monotonically per run and disambiguates records that share
/// a rank. The payload is the extractor's verbatim output; it is not trusted
/// to be well-formed until the validator has seen it.
#[derive(Debug, Clone)]
pub struct PartialRecord {
    pub rank: u8,
    pub seq: u32,
    pub kind: SourceKind,
    pub identifier: String,
    pub payload: String,
}

/// A partial record that survived validation, ready for the merge.
#[derive(Debug, Clone)]
pub struct ValidRecord {
    pub rank: u8,
    pub seq: u32,
    pub kind: SourceKind,
    pub value: Value,
}

/// Per-project context handed to every extractor invocation.
#[derive(Debug, Clone)]
pub struct ProjectContext {
    pub identifier: String,
    /// Root of the working copy (where `.git` lives).
    pub checkout_root: PathBuf,
    /// Run-scoped scratch directory for derived artifacts.
    pub work_dir: PathBuf,
    /// Canonical repository URL, when harvesting a remote project.
    pub source_url: Option<String>,
    /// Name of the checked-out ref, for building web links into the repo.
    pub ref_name: String,
    /// True when the resolved ref is not a conventional mainline branch.
    pub is_release: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_are_total_and_follow_precedence() {
        let ordered = [
            SourceKind::HarvestHints,
            SourceKind::CitationFile,
            SourceKind::LanguageManifest,
            SourceKind::AuthorsFile,
            SourceKind::GitHistory,
            SourceKind::Readme,
            SourceKind::InstallInstructions,
        ];
        for pair in ordered.windows(2) {
            assert!(pair[0].rank() < pair[1].rank(), "{} !< {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn mainline_branches_are_not_releases() {
        assert!(!ResolvedRef::new("main").is_release);
        assert!(!ResolvedRef::new("master").is_release);
        assert!(!ResolvedRef::new("develop").is_release);
        assert!(ResolvedRef::new("v1.2.0").is_release);
        assert!(ResolvedRef::new("release-2024").is_release);
    }
}
