//! Extractor dispatch and partial-record staging.
//!
//! Every recognized source is handed to the extractor registered for its
//! kind through one uniform contract: produce a raw JSON payload or fail.
//! Payloads are staged as rank-tagged [`PartialRecord`]s in an in-memory
//! ordered collection; nothing downstream depends on directory listing order.

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::error::HarvestError;
use crate::logging::HarvestLog;
use crate::models::{PartialRecord, ProjectContext, SourceKind};
use crate::{
    extractor_authors::AuthorsExtractor,
    extractor_cff::CitationExtractor,
    extractor_docs::{InstallExtractor, ReadmeExtractor},
    extractor_git::GitHistoryExtractor,
    extractor_manifest::ManifestExtractor,
    extractor_record::HarvestHintsExtractor,
};

/// A format-specific metadata extractor.
///
/// The core assumes nothing about an extractor beyond this contract: given a
/// source file and the project context, return a raw JSON payload or fail.
/// Validation of the payload happens later, uniformly for all extractors.
pub trait Extractor: Send + Sync {
    /// The source kind this extractor handles.
    fn kind(&self) -> SourceKind;

    /// Produce a partial metadata record as a raw JSON string.
    fn extract(&self, source: &Path, ctx: &ProjectContext) -> Result<String>;
}

/// Registry of extractors, one per source kind.
pub struct ExtractorRegistry {
    extractors: Vec<Box<dyn Extractor>>,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self {
            extractors: Vec::new(),
        }
    }

    /// Registry pre-loaded with all built-in extractors.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(HarvestHintsExtractor));
        registry.register(Box::new(CitationExtractor));
        registry.register(Box::new(ManifestExtractor));
        registry.register(Box::new(AuthorsExtractor));
        registry.register(Box::new(GitHistoryExtractor));
        registry.register(Box::new(ReadmeExtractor));
        registry.register(Box::new(InstallExtractor));
        registry
    }

    pub fn register(&mut self, extractor: Box<dyn Extractor>) {
        self.extractors.push(extractor);
    }

    pub fn find(&self, kind: SourceKind) -> Option<&dyn Extractor> {
        self.extractors
            .iter()
            .find(|e| e.kind() == kind)
            .map(|e| e.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Run-scoped staging area for partial records.
///
/// Records live in memory; when a dump directory is configured
/// (`--keep-intermediate`) each record is also written out as
/// `NN-<kind>-<seq>.json` for debugging. The dump directory is cleared on
/// construction so leftovers retained from a previous run are never mistaken
/// for current-run output.
pub struct StagingArea {
    identifier: String,
    records: Vec<PartialRecord>,
    next_seq: u32,
    dump_dir: Option<PathBuf>,
}

impl StagingArea {
    pub fn new(identifier: &str, dump_dir: Option<PathBuf>) -> Result<Self> {
        if let Some(dir) = &dump_dir {
            if dir.exists() {
                std::fs::remove_dir_all(dir)?;
            }
            std::fs::create_dir_all(dir)?;
        }
        Ok(Self {
            identifier: identifier.to_string(),
            records: Vec::new(),
            next_seq: 0,
            dump_dir,
        })
    }

    /// Stage one extractor payload, tagging it with the kind's rank and the
    /// next sub-sequence number.
    pub fn stage(&mut self, kind: SourceKind, payload: String) -> Result<()> {
        let record = PartialRecord {
            rank: kind.rank(),
            seq: self.next_seq,
            kind,
            identifier: self.identifier.clone(),
            payload,
        };
        self.next_seq += 1;

        if let Some(dir) = &self.dump_dir {
            let name = format!("{:02}-{}-{}.json", record.rank, record.kind.label(), record.seq);
            std::fs::write(dir.join(name), &record.payload)?;
        }

        self.records.push(record);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<PartialRecord> {
        self.records
    }
}

/// Invoke the matching extractor for every present source and stage the
/// results.
///
/// An extractor failure (or a source kind without a registered extractor) is
/// recoverable: it is logged and the source is skipped. Under strict mode the
/// first failure aborts the project.
pub fn dispatch(
    sources: &[(SourceKind, PathBuf)],
    registry: &ExtractorRegistry,
    ctx: &ProjectContext,
    staging: &mut StagingArea,
    log: &mut HarvestLog,
    strict: bool,
) -> Result<(), HarvestError> {
    for (kind, path) in sources {
        let Some(extractor) = registry.find(*kind) else {
            log.warn(format!("no extractor registered for {kind}, skipping"));
            continue;
        };

        log.debug(format!("extracting {kind} from {}", path.display()));
        match extractor.extract(path, ctx) {
            Ok(payload) => {
                staging.stage(*kind, payload).map_err(|e| {
                    HarvestError::ExtractorFailed {
                        kind: kind.to_string(),
                        path: path.clone(),
                        detail: format!("failed to stage output: {e}"),
                    }
                })?;
            }
            Err(e) => {
                let err = HarvestError::ExtractorFailed {
                    kind: kind.to_string(),
                    path: path.clone(),
                    detail: e.to_string(),
                };
                if strict {
                    log.error(err.to_string());
                    return Err(err);
                }
                log.warn(format!("{err} (source skipped)"));
            }
        }
    }
    Ok(())
}
