//! Harvest error taxonomy.
//!
//! Three tiers with distinct propagation rules:
//!
//! - **fatal** — halts the whole run (missing dependency, cache setup).
//! - **project-fatal** — aborts the current project, the batch continues
//!   (invalid configuration, clone/fetch/checkout failure, unresolvable ref,
//!   no sources, failed reconciliation).
//! - **recoverable** — logged and excluded from the merge set (one extractor
//!   failing, a malformed partial record, a failed service endpoint).
//!   Escalates to project-fatal under `--strict`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("missing required dependency: {0}")]
    MissingDependency(String),

    #[error("cannot create directory {path}: {detail}")]
    DirectorySetup { path: PathBuf, detail: String },

    #[error("invalid configuration for '{identifier}': {detail}")]
    InvalidConfig { identifier: String, detail: String },

    #[error("clone of {url} failed: {detail}")]
    CloneFailed { url: String, detail: String },

    #[error("fetch for '{identifier}' failed: {detail}")]
    FetchFailed { identifier: String, detail: String },

    #[error("checkout of ref '{reference}' failed: {detail}")]
    CheckoutFailed { reference: String, detail: String },

    #[error("no ref could be resolved for '{identifier}'")]
    InvalidRef { identifier: String },

    #[error("no metadata sources found for '{identifier}'")]
    NoMetadataSources { identifier: String },

    #[error("reconciliation failed for '{identifier}': {detail}")]
    ReconcileFailed { identifier: String, detail: String },

    #[error("{kind} extractor failed on {path}: {detail}")]
    ExtractorFailed {
        kind: String,
        path: PathBuf,
        detail: String,
    },

    #[error("malformed partial record from {kind}: {detail}")]
    MalformedRecord { kind: String, detail: String },

    #[error("service {url} failed: {detail}")]
    ServiceFailed { url: String, detail: String },
}

impl HarvestError {
    /// True for errors that must halt the entire batch.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            HarvestError::MissingDependency(_) | HarvestError::DirectorySetup { .. }
        )
    }

    /// True for errors that are logged and skipped (outside strict mode).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            HarvestError::ExtractorFailed { .. }
                | HarvestError::MalformedRecord { .. }
                | HarvestError::ServiceFailed { .. }
        )
    }

    /// True for errors that abort the current project but not the batch.
    pub fn is_project_fatal(&self) -> bool {
        !self.is_fatal() && !self.is_recoverable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_tiers_are_disjoint() {
        let errors = [
            HarvestError::MissingDependency("git".into()),
            HarvestError::CloneFailed {
                url: "https://example.org/r.git".into(),
                detail: "timeout".into(),
            },
            HarvestError::NoMetadataSources {
                identifier: "proj".into(),
            },
            HarvestError::MalformedRecord {
                kind: "citation".into(),
                detail: "not an object".into(),
            },
        ];
        for err in &errors {
            let tiers = [err.is_fatal(), err.is_project_fatal(), err.is_recoverable()];
            assert_eq!(tiers.iter().filter(|t| **t).count(), 1, "{err}");
        }
    }

    #[test]
    fn classification_matches_taxonomy() {
        assert!(HarvestError::MissingDependency("git".into()).is_fatal());
        assert!(HarvestError::InvalidRef {
            identifier: "p".into()
        }
        .is_project_fatal());
        assert!(HarvestError::ServiceFailed {
            url: "https://api.example.org".into(),
            detail: "500".into()
        }
        .is_recoverable());
    }
}
