//! Source presence scanning.
//!
//! A single declarative catalog maps source kinds to the exact filenames that
//! betray them. Scanning iterates the catalog once per directory; there is no
//! per-filename branching anywhere else in the pipeline.

use std::path::{Path, PathBuf};

use crate::models::SourceKind;

/// One catalog row: a source kind and the filenames that announce it.
pub struct CatalogEntry {
    pub kind: SourceKind,
    pub filenames: &'static [&'static str],
    /// When false, only the first matching filename per directory is used
    /// (README variants are alternatives); when true, every match is a
    /// separate source (a project can carry several build manifests).
    pub all_matches: bool,
}

/// Fixed catalog of recognized sources, in rank order.
pub const CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        kind: SourceKind::HarvestHints,
        filenames: &["codemeta-harvest.json"],
        all_matches: false,
    },
    CatalogEntry {
        kind: SourceKind::CitationFile,
        filenames: &["CITATION.cff", "citation.cff"],
        all_matches: false,
    },
    CatalogEntry {
        kind: SourceKind::LanguageManifest,
        filenames: &["Cargo.toml", "pyproject.toml", "package.json"],
        all_matches: true,
    },
    CatalogEntry {
        kind: SourceKind::AuthorsFile,
        filenames: &[
            "AUTHORS",
            "AUTHORS.md",
            "CONTRIBUTORS",
            "CONTRIBUTORS.md",
            "MAINTAINERS",
            "MAINTAINERS.md",
        ],
        all_matches: true,
    },
    CatalogEntry {
        kind: SourceKind::Readme,
        filenames: &["README.md", "README.rst", "README.txt", "README"],
        all_matches: false,
    },
    CatalogEntry {
        kind: SourceKind::InstallInstructions,
        filenames: &["INSTALL.md", "INSTALL", "BUILDING.md"],
        all_matches: false,
    },
];

/// Filename of the authoritative record, detected separately because it
/// short-circuits automatic extraction instead of joining the merge.
pub const AUTHORITATIVE_RECORD: &str = "codemeta.json";

/// Determine which sources are present.
///
/// Extra scan directories are visited first and the scan root last, so the
/// root's contributions are staged later; precedence between directories is
/// carried by rank, not directory order. Git history is reported whenever
/// the checkout root contains a `.git` directory.
pub fn scan(
    checkout_root: &Path,
    scan_root: &Path,
    extra_dirs: &[PathBuf],
) -> Vec<(SourceKind, PathBuf)> {
    let mut found = Vec::new();

    let mut dirs: Vec<&Path> = extra_dirs.iter().map(|d| d.as_path()).collect();
    dirs.push(scan_root);

    for dir in dirs {
        for entry in CATALOG {
            for filename in entry.filenames {
                let candidate = dir.join(filename);
                if candidate.is_file() {
                    found.push((entry.kind, candidate));
                    if !entry.all_matches {
                        break;
                    }
                }
            }
        }
    }

    if checkout_root.join(".git").is_dir() {
        found.push((SourceKind::GitHistory, checkout_root.to_path_buf()));
    }

    found
}

/// Path of the authoritative record inside the scan root, if present.
pub fn authoritative_record_path(scan_root: &Path) -> Option<PathBuf> {
    let candidate = scan_root.join(AUTHORITATIVE_RECORD);
    candidate.is_file().then_some(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn recognizes_sources_by_exact_filename() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Cargo.toml"), "[package]").unwrap();
        fs::write(dir.path().join("CITATION.cff"), "title: x").unwrap();
        fs::write(dir.path().join("random.txt"), "").unwrap();

        let found = scan(dir.path(), dir.path(), &[]);
        let kinds: Vec<_> = found.iter().map(|(k, _)| *k).collect();
        assert!(kinds.contains(&SourceKind::LanguageManifest));
        assert!(kinds.contains(&SourceKind::CitationFile));
        assert_eq!(kinds.len(), 2);
    }

    #[test]
    fn readme_variants_are_alternatives_manifests_are_not() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("README.md"), "#").unwrap();
        fs::write(dir.path().join("README"), "").unwrap();
        fs::write(dir.path().join("Cargo.toml"), "").unwrap();
        fs::write(dir.path().join("package.json"), "{}").unwrap();

        let found = scan(dir.path(), dir.path(), &[]);
        let readmes = found
            .iter()
            .filter(|(k, _)| *k == SourceKind::Readme)
            .count();
        let manifests = found
            .iter()
            .filter(|(k, _)| *k == SourceKind::LanguageManifest)
            .count();
        assert_eq!(readmes, 1);
        assert_eq!(manifests, 2);
    }

    #[test]
    fn extra_dirs_are_scanned_before_the_root() {
        let dir = tempfile::tempdir().unwrap();
        let extra = dir.path().join("meta");
        fs::create_dir_all(&extra).unwrap();
        fs::write(extra.join("AUTHORS"), "Jo Doe").unwrap();
        fs::write(dir.path().join("AUTHORS"), "Root Author").unwrap();

        let found = scan(dir.path(), dir.path(), &[extra.clone()]);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].1, extra.join("AUTHORS"));
        assert_eq!(found[1].1, dir.path().join("AUTHORS"));
    }

    #[test]
    fn zero_sources_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let found = scan(dir.path(), dir.path(), &[]);
        assert!(found.is_empty());
    }

    #[test]
    fn git_history_reported_when_checkout_has_git_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();

        let found = scan(dir.path(), dir.path(), &[]);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, SourceKind::GitHistory);
    }

    #[test]
    fn authoritative_record_detected_separately() {
        let dir = tempfile::tempdir().unwrap();
        assert!(authoritative_record_path(dir.path()).is_none());
        fs::write(dir.path().join("codemeta.json"), "{}").unwrap();
        assert!(authoritative_record_path(dir.path()).is_some());
    }
}
