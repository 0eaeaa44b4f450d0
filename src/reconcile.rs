//! Priority reconciliation.
//!
//! Surviving partial records are merged into one final record with
//! deterministic conflict resolution: records are ordered by `(rank, seq)`
//! ascending and applied to an empty object in reverse, so each later
//! application overwrites overlapping fields and the numerically lowest
//! `(rank, seq)` — the highest-precedence source — is applied last and wins.
//! Authoritative override fields are applied after the merge and win over
//! every extracted field.

use serde_json::{json, Map, Value};
use std::path::Path;

use crate::error::HarvestError;
use crate::models::ValidRecord;

const CODEMETA_CONTEXT: &str = "https://doi.org/10.5063/schema/codemeta-2.0";

/// Authoritative fields that always take precedence over extracted ones.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Forced project identifier.
    pub identifier: String,
    /// Canonical repository URL from the project configuration.
    pub code_repository: Option<String>,
    /// Base URI for the emitted linked-data `@id`.
    pub base_uri: Option<String>,
    /// The checked-out release tag, when the resolved ref is not a mainline
    /// branch. Marks the record as describing a released version.
    pub release_tag: Option<String>,
    /// Passthrough `key=value` fields from the command line.
    pub extra: Vec<(String, String)>,
}

/// Merge the candidate set into a final record.
///
/// Fails with `NoMetadataSources` when the candidate set is empty; no final
/// record may be produced in that case.
pub fn merge_records(
    identifier: &str,
    mut records: Vec<ValidRecord>,
    overrides: &Overrides,
) -> Result<Value, HarvestError> {
    if records.is_empty() {
        return Err(HarvestError::NoMetadataSources {
            identifier: identifier.to_string(),
        });
    }

    records.sort_by_key(|r| (r.rank, r.seq));

    let mut merged = Map::new();
    for record in records.iter().rev() {
        let Some(fields) = record.value.as_object() else {
            return Err(HarvestError::ReconcileFailed {
                identifier: identifier.to_string(),
                detail: format!("{} record is not an object", record.kind),
            });
        };
        for (key, value) in fields {
            merged.insert(key.clone(), value.clone());
        }
    }

    apply_overrides(&mut merged, overrides);
    Ok(Value::Object(merged))
}

fn apply_overrides(merged: &mut Map<String, Value>, overrides: &Overrides) {
    merged
        .entry("@context".to_string())
        .or_insert(json!(CODEMETA_CONTEXT));
    merged
        .entry("@type".to_string())
        .or_insert(json!("SoftwareSourceCode"));

    merged.insert("identifier".into(), json!(overrides.identifier));
    if let Some(repo) = &overrides.code_repository {
        merged.insert("codeRepository".into(), json!(repo));
    }
    if let Some(base) = &overrides.base_uri {
        let id = format!("{}/{}", base.trim_end_matches('/'), overrides.identifier);
        merged.insert("@id".into(), json!(id));
    }
    if let Some(tag) = &overrides.release_tag {
        merged.insert("released".into(), json!(true));
        // A release checkout without a version from any source still gets
        // one: the tag itself.
        merged
            .entry("version".to_string())
            .or_insert(json!(tag.trim_start_matches(['v', 'V'])));
    }
    for (key, value) in &overrides.extra {
        merged.insert(key.clone(), json!(value));
    }
}

/// Write the final record, removing any partial output on failure so a
/// failed reconciliation leaves no file behind.
pub fn write_final_record(
    identifier: &str,
    record: &Value,
    path: &Path,
) -> Result<(), HarvestError> {
    let pretty = serde_json::to_string_pretty(record).map_err(|e| {
        HarvestError::ReconcileFailed {
            identifier: identifier.to_string(),
            detail: e.to_string(),
        }
    })?;

    if let Err(e) = std::fs::write(path, pretty) {
        let _ = std::fs::remove_file(path);
        return Err(HarvestError::ReconcileFailed {
            identifier: identifier.to_string(),
            detail: format!("cannot write {}: {e}", path.display()),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceKind;

    fn valid(kind: SourceKind, seq: u32, value: Value) -> ValidRecord {
        ValidRecord {
            rank: kind.rank(),
            seq,
            kind,
            value,
        }
    }

    fn plain_overrides() -> Overrides {
        Overrides {
            identifier: "proj".into(),
            ..Default::default()
        }
    }

    #[test]
    fn lower_rank_wins_regardless_of_input_order() {
        let hints = valid(SourceKind::HarvestHints, 3, json!({"name": "from-hints"}));
        let manifest = valid(
            SourceKind::LanguageManifest,
            1,
            json!({"name": "from-manifest", "version": "2.0"}),
        );

        for records in [
            vec![hints.clone(), manifest.clone()],
            vec![manifest.clone(), hints.clone()],
        ] {
            let merged = merge_records("proj", records, &plain_overrides()).unwrap();
            assert_eq!(merged["name"], "from-hints");
            // Fields only the lower-precedence source defines still survive.
            assert_eq!(merged["version"], "2.0");
        }
    }

    #[test]
    fn same_rank_earlier_staged_record_wins() {
        let first = valid(SourceKind::LanguageManifest, 0, json!({"name": "first"}));
        let second = valid(SourceKind::LanguageManifest, 1, json!({"name": "second"}));

        let merged = merge_records("proj", vec![second, first], &plain_overrides()).unwrap();
        assert_eq!(merged["name"], "first");
    }

    #[test]
    fn empty_candidate_set_fails_without_a_record() {
        let err = merge_records("proj", Vec::new(), &plain_overrides()).unwrap_err();
        assert!(matches!(err, HarvestError::NoMetadataSources { .. }));
    }

    #[test]
    fn overrides_beat_every_extracted_field() {
        let hints = valid(
            SourceKind::HarvestHints,
            0,
            json!({"identifier": "wrong", "codeRepository": "https://example.org/old.git"}),
        );
        let overrides = Overrides {
            identifier: "proj".into(),
            code_repository: Some("https://example.org/canonical.git".into()),
            base_uri: Some("https://tools.example.org/".into()),
            release_tag: None,
            extra: vec![("developmentStatus".into(), "active".into())],
        };

        let merged = merge_records("proj", vec![hints], &overrides).unwrap();
        assert_eq!(merged["identifier"], "proj");
        assert_eq!(merged["codeRepository"], "https://example.org/canonical.git");
        assert_eq!(merged["@id"], "https://tools.example.org/proj");
        assert_eq!(merged["developmentStatus"], "active");
    }

    #[test]
    fn release_tag_marks_record_and_backfills_version() {
        let readme = valid(SourceKind::Readme, 0, json!({"readme": "r"}));
        let overrides = Overrides {
            identifier: "proj".into(),
            release_tag: Some("v1.10.0".into()),
            ..Default::default()
        };

        let merged = merge_records("proj", vec![readme], &overrides).unwrap();
        assert_eq!(merged["released"], true);
        assert_eq!(merged["version"], "1.10.0");

        // A version from a real source is not overwritten by the tag.
        let cff = valid(SourceKind::CitationFile, 0, json!({"version": "1.10"}));
        let merged = merge_records("proj", vec![cff], &overrides).unwrap();
        assert_eq!(merged["version"], "1.10");
    }

    #[test]
    fn context_and_type_are_defaulted_not_forced() {
        let hints = valid(SourceKind::HarvestHints, 0, json!({"@type": "SoftwareApplication"}));
        let merged = merge_records("proj", vec![hints], &plain_overrides()).unwrap();
        assert_eq!(merged["@type"], "SoftwareApplication");
        assert_eq!(merged["@context"], CODEMETA_CONTEXT);
    }

    #[test]
    fn failed_write_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        // Target is a directory: the write must fail and clean up.
        let target = dir.path().join("out.codemeta.json");
        std::fs::create_dir_all(&target).unwrap();

        let err = write_final_record("proj", &json!({"name": "x"}), &target).unwrap_err();
        assert!(matches!(err, HarvestError::ReconcileFailed { .. }));
    }
}
