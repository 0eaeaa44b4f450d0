//! Per-project harvest orchestration.
//!
//! One harvest is a fixed sequence of stages executed strictly in order:
//! checkout, source scan, extractor dispatch, validation, reconciliation,
//! service augmentation, output. Each stage consumes the previous stage's
//! completed output; nothing runs concurrently. An existing well-formed
//! `codemeta.json` in the scan root short-circuits the extraction stages
//! entirely unless `--ignore-existing` or `--regenerate` is set.

use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::checkout::{current_branch, CheckoutManager};
use crate::config::ProjectConfig;
use crate::error::HarvestError;
use crate::extract::{dispatch, ExtractorRegistry, StagingArea};
use crate::extractor_record::read_authoritative;
use crate::logging::HarvestLog;
use crate::models::{ProjectContext, ResolvedRef};
use crate::reconcile::{merge_records, write_final_record, Overrides};
use crate::scan::{authoritative_record_path, scan};
use crate::service::augment;
use crate::validate::validate_records;

/// Run-wide options, shared by every project in a batch.
#[derive(Debug, Clone)]
pub struct HarvestOptions {
    /// Checkout cache root. Entries persist across runs.
    pub cache_dir: PathBuf,
    /// Directory receiving `<identifier>.codemeta.json` and the harvest log.
    pub output_dir: PathBuf,
    /// Re-harvest even when the output file already exists.
    pub regenerate: bool,
    /// Harvest from scratch even when the checkout carries a `codemeta.json`.
    pub ignore_existing: bool,
    /// Base URI for the final record's `@id`.
    pub base_uri: Option<String>,
    /// `key=value` fields forced into every final record.
    pub extra: Vec<(String, String)>,
    /// Keep per-record staging dumps under the cache for inspection.
    pub keep_intermediate: bool,
    /// Escalate recoverable errors to project-fatal.
    pub strict: bool,
    /// Print the final record to stdout instead of writing the output file.
    pub stdout: bool,
}

/// How a single project's harvest ended.
#[derive(Debug, PartialEq, Eq)]
pub enum HarvestOutcome {
    /// Final record written to this path.
    Written(PathBuf),
    /// Final record printed to stdout.
    Printed,
    /// Output already present and `--regenerate` not given.
    SkippedExisting(PathBuf),
}

/// Harvest one configured remote project.
pub fn run_harvest(
    config: &ProjectConfig,
    opts: &HarvestOptions,
    registry: &ExtractorRegistry,
    log: &mut HarvestLog,
) -> Result<HarvestOutcome, HarvestError> {
    let identifier = config.identifier.clone();
    let output_path = opts
        .output_dir
        .join(format!("{identifier}.codemeta.json"));

    if output_path.is_file() && !opts.regenerate && !opts.stdout {
        log.info(format!(
            "{} exists, skipping (use --regenerate to re-harvest)",
            output_path.display()
        ));
        return Ok(HarvestOutcome::SkippedExisting(output_path));
    }

    let source_url = config
        .source_url()
        .map_err(|e| HarvestError::InvalidConfig {
            identifier: identifier.clone(),
            detail: e.to_string(),
        })?
        .to_string();

    let manager = CheckoutManager::new(&opts.cache_dir);
    log.info(format!("checking out {source_url}"));
    let (checkout_root, resolved) =
        manager.ensure_checkout(&identifier, &source_url, config.reference.as_deref())?;
    log.info(format!(
        "checked out ref '{}'{}",
        resolved.name,
        if resolved.is_release { " (release)" } else { "" }
    ));

    let pipeline = Pipeline {
        identifier,
        checkout_root,
        resolved,
        source_url: Some(source_url),
        code_repository: config.source.clone(),
        scan_subdir: config.root.clone(),
        scandirs: config.scandirs.clone(),
        services: config.services.clone(),
        output_path,
    };
    pipeline.run(opts, registry, log)
}

/// Harvest the current working directory without touching the cache.
///
/// Used when no config targets are given: the directory itself is the
/// checkout, the identifier defaults to the directory name, and the ref is
/// whatever branch the working copy has checked out. On success the record
/// is additionally installed as the directory's `codemeta.json` when none
/// existed (or `--regenerate` was given).
pub fn run_harvest_cwd(
    dir: &Path,
    identifier: Option<&str>,
    opts: &HarvestOptions,
    registry: &ExtractorRegistry,
    log: &mut HarvestLog,
) -> Result<HarvestOutcome, HarvestError> {
    let identifier = match identifier {
        Some(id) => id.to_string(),
        None => dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| HarvestError::InvalidConfig {
                identifier: dir.display().to_string(),
                detail: "cannot derive an identifier from the directory name".into(),
            })?,
    };

    let output_path = opts
        .output_dir
        .join(format!("{identifier}.codemeta.json"));
    if output_path.is_file() && !opts.regenerate && !opts.stdout {
        log.info(format!(
            "{} exists, skipping (use --regenerate to re-harvest)",
            output_path.display()
        ));
        return Ok(HarvestOutcome::SkippedExisting(output_path));
    }

    let resolved = current_branch(dir)
        .map(ResolvedRef::new)
        .unwrap_or_else(|| ResolvedRef::new("HEAD"));

    let pipeline = Pipeline {
        identifier,
        checkout_root: dir.to_path_buf(),
        resolved,
        source_url: None,
        code_repository: None,
        scan_subdir: None,
        scandirs: Vec::new(),
        services: Vec::new(),
        output_path,
    };
    let outcome = pipeline.run(opts, registry, log)?;

    // Install the result as the directory's own codemeta.json, unless one is
    // already there and this run was not asked to replace it.
    if let HarvestOutcome::Written(path) = &outcome {
        let installed = dir.join("codemeta.json");
        if !installed.exists() || opts.regenerate {
            match std::fs::copy(path, &installed) {
                Ok(_) => log.info(format!("installed {}", installed.display())),
                Err(e) => log.warn(format!(
                    "could not install {}: {e}",
                    installed.display()
                )),
            }
        }
    }
    Ok(outcome)
}

/// Everything the stage sequence needs, resolved before it starts.
struct Pipeline {
    identifier: String,
    checkout_root: PathBuf,
    resolved: ResolvedRef,
    source_url: Option<String>,
    code_repository: Option<String>,
    scan_subdir: Option<String>,
    scandirs: Vec<String>,
    services: Vec<String>,
    output_path: PathBuf,
}

impl Pipeline {
    fn run(
        self,
        opts: &HarvestOptions,
        registry: &ExtractorRegistry,
        log: &mut HarvestLog,
    ) -> Result<HarvestOutcome, HarvestError> {
        match self.produce_record(opts, registry, log) {
            Ok(record) => self.emit(&record, opts, log),
            Err(err) => {
                // A failed harvest must not leave output from a previous run
                // behind as if it were current.
                if opts.regenerate && self.output_path.is_file() {
                    let _ = std::fs::remove_file(&self.output_path);
                }
                Err(err)
            }
        }
    }

    fn produce_record(
        &self,
        opts: &HarvestOptions,
        registry: &ExtractorRegistry,
        log: &mut HarvestLog,
    ) -> Result<Value, HarvestError> {
        let scan_root = match &self.scan_subdir {
            Some(sub) => self.checkout_root.join(sub),
            None => self.checkout_root.clone(),
        };

        let overrides = Overrides {
            identifier: self.identifier.clone(),
            code_repository: self.code_repository.clone(),
            base_uri: opts.base_uri.clone(),
            release_tag: self
                .resolved
                .is_release
                .then(|| self.resolved.name.clone()),
            extra: opts.extra.clone(),
        };

        // An authoritative record replaces extraction wholesale; only
        // command-line overrides and services still apply. `--regenerate`
        // bypasses it too, otherwise a record installed by a previous run
        // would short-circuit its own regeneration.
        if !opts.ignore_existing && !opts.regenerate {
            if let Some(path) = authoritative_record_path(&scan_root) {
                match read_authoritative(&path) {
                    Ok(record) => {
                        log.info(format!(
                            "using authoritative record {}",
                            path.display()
                        ));
                        let merged = apply_overrides_to_authoritative(record, &overrides);
                        return augment(merged, &self.services, opts.strict, log);
                    }
                    Err(e) => {
                        log.warn(format!(
                            "ignoring malformed {}: {e}",
                            path.display()
                        ));
                    }
                }
            }
        }

        let work_dir = opts.cache_dir.join("work").join(&self.identifier);
        std::fs::create_dir_all(&work_dir).map_err(|e| HarvestError::DirectorySetup {
            path: work_dir.clone(),
            detail: e.to_string(),
        })?;

        let extra_dirs: Vec<PathBuf> = self.scandirs.iter().map(|d| scan_root.join(d)).collect();
        let sources = scan(&self.checkout_root, &scan_root, &extra_dirs);
        log.info(format!("found {} metadata source(s)", sources.len()));

        let ctx = ProjectContext {
            identifier: self.identifier.clone(),
            checkout_root: self.checkout_root.clone(),
            work_dir,
            source_url: self.source_url.clone(),
            ref_name: self.resolved.name.clone(),
            is_release: self.resolved.is_release,
        };

        let dump_dir = opts
            .keep_intermediate
            .then(|| opts.cache_dir.join("staging").join(&self.identifier));
        let mut staging =
            StagingArea::new(&self.identifier, dump_dir).map_err(|e| {
                HarvestError::DirectorySetup {
                    path: opts.cache_dir.join("staging"),
                    detail: e.to_string(),
                }
            })?;

        dispatch(&sources, registry, &ctx, &mut staging, log, opts.strict)?;

        let valid = validate_records(staging.into_records(), opts.strict, log)?;
        log.info(format!("{} record(s) entering reconciliation", valid.len()));

        let merged = merge_records(&self.identifier, valid, &overrides)?;
        augment(merged, &self.services, opts.strict, log)
    }

    fn emit(
        &self,
        record: &Value,
        opts: &HarvestOptions,
        log: &mut HarvestLog,
    ) -> Result<HarvestOutcome, HarvestError> {
        if opts.stdout {
            let pretty =
                serde_json::to_string_pretty(record).map_err(|e| HarvestError::ReconcileFailed {
                    identifier: self.identifier.clone(),
                    detail: e.to_string(),
                })?;
            println!("{pretty}");
            return Ok(HarvestOutcome::Printed);
        }

        write_final_record(&self.identifier, record, &self.output_path)?;
        log.info(format!("wrote {}", self.output_path.display()));
        Ok(HarvestOutcome::Written(self.output_path.clone()))
    }
}

/// Overrides still win over an authoritative record, identically to the
/// merged case.
fn apply_overrides_to_authoritative(record: Value, overrides: &Overrides) -> Value {
    // Reuse the merge path with a single synthetic record so override
    // semantics cannot drift between the two code paths.
    use crate::models::{SourceKind, ValidRecord};
    let synthetic = ValidRecord {
        rank: SourceKind::AuthoritativeRecord.rank(),
        seq: 0,
        kind: SourceKind::AuthoritativeRecord,
        value: record,
    };
    // Single well-formed object record: the merge cannot fail.
    merge_records(&overrides.identifier, vec![synthetic], overrides)
        .unwrap_or(Value::Object(serde_json::Map::new()))
}
