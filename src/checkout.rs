//! Cache and checkout management.
//!
//! Maintains one persistent clone per project identifier under the cache
//! directory. A project is cloned on first harvest and fetched on later ones;
//! the requested ref (explicit, latest semantic-version tag, or the default
//! branch) is then checked out forced and detached.
//!
//! All git operations shell out to the `git` CLI; stderr from a failed
//! invocation is surfaced in the returned error.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::HarvestError;
use crate::models::ResolvedRef;

/// Manages the per-project checkout cache.
pub struct CheckoutManager {
    cache_dir: PathBuf,
}

impl CheckoutManager {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    /// Cache entry directory for a project identifier.
    pub fn entry_dir(&self, identifier: &str) -> PathBuf {
        self.cache_dir.join(identifier)
    }

    /// Ensure a clean checkout of `source_url` at the requested ref.
    ///
    /// Returns the checkout path and the resolved ref. Clone, fetch, and
    /// checkout failures are distinct project-fatal errors; a failed clone
    /// removes the partial cache entry so the next run starts from scratch.
    pub fn ensure_checkout(
        &self,
        identifier: &str,
        source_url: &str,
        explicit_ref: Option<&str>,
    ) -> Result<(PathBuf, ResolvedRef), HarvestError> {
        std::fs::create_dir_all(&self.cache_dir).map_err(|e| HarvestError::DirectorySetup {
            path: self.cache_dir.clone(),
            detail: e.to_string(),
        })?;

        let entry = self.entry_dir(identifier);

        if entry.join(".git").exists() {
            git_in(&entry, &["fetch", "--tags", "--force", "origin"]).map_err(|detail| {
                HarvestError::FetchFailed {
                    identifier: identifier.to_string(),
                    detail,
                }
            })?;
        } else {
            // Blob-filtered rather than shallow: ref resolution needs the
            // full tag list and the git-history extractor needs all commits.
            let result = git(&[
                "clone",
                "--filter=blob:none",
                source_url,
                &entry.to_string_lossy(),
            ]);
            if let Err(detail) = result {
                // A half-created entry must not pass the `.git` probe above
                // on the next run.
                let _ = std::fs::remove_dir_all(&entry);
                return Err(HarvestError::CloneFailed {
                    url: source_url.to_string(),
                    detail,
                });
            }
        }

        let (ref_name, checkout_target) = match explicit_ref {
            Some(r) => (r.to_string(), r.to_string()),
            None => self.resolve_ref(identifier, &entry)?,
        };

        git_in(&entry, &["checkout", "--force", "--detach", &checkout_target]).map_err(
            |detail| HarvestError::CheckoutFailed {
                reference: ref_name.clone(),
                detail,
            },
        )?;

        Ok((entry, ResolvedRef::new(ref_name)))
    }

    /// Pick the latest semantic-version tag, falling back to the default
    /// branch when no tag parses as a version.
    fn resolve_ref(
        &self,
        identifier: &str,
        entry: &Path,
    ) -> Result<(String, String), HarvestError> {
        let tags: Vec<String> = git_in(entry, &["tag", "--list"])
            .unwrap_or_default()
            .lines()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();

        if let Some(tag) = latest_version_tag(&tags) {
            return Ok((tag.clone(), tag));
        }

        match default_branch(entry) {
            Some(branch) => {
                let target = format!("origin/{branch}");
                Ok((branch, target))
            }
            None => Err(HarvestError::InvalidRef {
                identifier: identifier.to_string(),
            }),
        }
    }
}

/// Current branch name of an existing working copy (for local-directory
/// harvests that bypass the cache).
pub fn current_branch(dir: &Path) -> Option<String> {
    let name = git_in(dir, &["rev-parse", "--abbrev-ref", "HEAD"]).ok()?;
    let name = name.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Probe for a usable `git` binary. A missing dependency is fatal.
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

/// Pick the tag with the greatest semantic version among `tags`.
///
/// A tag qualifies when, after an optional leading `v`/`V`, it consists of
/// dot-separated numeric components. Components are compared numerically in
/// order, so `v1.10.0` beats `v1.3.0`.
pub fn latest_version_tag(tags: &[String]) -> Option<String> {
    tags.iter()
        .filter_map(|tag| parse_version(tag).map(|v| (v, tag)))
        .max_by(|a, b| a.0.cmp(&b.0))
        .map(|(_, tag)| tag.clone())
}

fn parse_version(tag: &str) -> Option<Vec<u64>> {
    let trimmed = tag
        .strip_prefix('v')
        .or_else(|| tag.strip_prefix('V'))
        .unwrap_or(tag);
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .split('.')
        .map(|part| part.parse::<u64>().ok())
        .collect()
}

fn default_branch(entry: &Path) -> Option<String> {
    if let Ok(out) = git_in(entry, &["symbolic-ref", "--short", "refs/remotes/origin/HEAD"]) {
        let name = out.trim().trim_start_matches("origin/").to_string();
        if !name.is_empty() {
            return Some(name);
        }
    }
    // origin/HEAD can be unset after a plain fetch; probe the usual names.
    for candidate in ["main", "master"] {
        if git_in(entry, &["rev-parse", "--verify", &format!("origin/{candidate}")]).is_ok() {
            return Some(candidate.to_string());
        }
    }
    None
}

/// Run git without a working directory (clone).
fn git(args: &[&str]) -> Result<String, String> {
    run_git(Command::new("git").args(args))
}

/// Run git inside a working copy.
pub(crate) fn git_in(dir: &Path, args: &[&str]) -> Result<String, String> {
    run_git(Command::new("git").current_dir(dir).args(args))
}

fn run_git(cmd: &mut Command) -> Result<String, String> {
    match cmd.output() {
        Ok(out) if out.status.success() => Ok(String::from_utf8_lossy(&out.stdout).to_string()),
        Ok(out) => {
            let stderr = String::from_utf8_lossy(&out.stderr);
            Err(stderr.trim().to_string())
        }
        Err(e) => Err(format!("failed to execute git: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn version_comparison_is_numeric_not_lexicographic() {
        let tags = tags(&["v1.2.0", "v1.10.0", "v1.3.0"]);
        assert_eq!(latest_version_tag(&tags).as_deref(), Some("v1.10.0"));
    }

    #[test]
    fn non_version_tags_are_ignored() {
        let tags = tags(&["nightly", "v0.9.1", "release-candidate", "0.10"]);
        assert_eq!(latest_version_tag(&tags).as_deref(), Some("0.10"));
    }

    #[test]
    fn no_version_tags_yields_none() {
        let tags = tags(&["nightly", "latest", "v1.0-beta"]);
        assert_eq!(latest_version_tag(&tags), None);
    }

    #[test]
    fn leading_v_is_optional() {
        assert_eq!(parse_version("v2.1.3"), Some(vec![2, 1, 3]));
        assert_eq!(parse_version("2.1.3"), Some(vec![2, 1, 3]));
        assert_eq!(parse_version("V4"), Some(vec![4]));
        assert_eq!(parse_version("v"), None);
        assert_eq!(parse_version("v1.2rc1"), None);
    }
}
