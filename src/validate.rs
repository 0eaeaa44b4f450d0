//! Partial-record validation.
//!
//! Every staged payload must parse as a JSON object before it may enter the
//! merge. Invalid records are discarded with a recoverable error (strict mode
//! aborts the project instead). The surviving candidate set is recomputed in
//! a second pass over the staged collection; the merge never consumes a
//! listing taken before invalidation.

use crate::error::HarvestError;
use crate::logging::HarvestLog;
use crate::models::{PartialRecord, ValidRecord};

/// Validate staged records and produce the candidate set for the merge.
pub fn validate_records(
    records: Vec<PartialRecord>,
    strict: bool,
    log: &mut HarvestLog,
) -> Result<Vec<ValidRecord>, HarvestError> {
    // First pass: decide which records survive.
    let mut survivors = Vec::with_capacity(records.len());
    for record in records {
        match check(&record) {
            Ok(()) => survivors.push(record),
            Err(err) => {
                if strict {
                    log.error(err.to_string());
                    return Err(err);
                }
                log.warn(format!("{err} (record discarded)"));
            }
        }
    }

    // Second pass: rebuild the candidate set from the survivors only.
    let mut valid = Vec::with_capacity(survivors.len());
    for record in &survivors {
        let value = serde_json::from_str(&record.payload).map_err(|e| {
            HarvestError::MalformedRecord {
                kind: record.kind.to_string(),
                detail: e.to_string(),
            }
        })?;
        valid.push(ValidRecord {
            rank: record.rank,
            seq: record.seq,
            kind: record.kind,
            value,
        });
    }
    Ok(valid)
}

fn check(record: &PartialRecord) -> Result<(), HarvestError> {
    let parsed: serde_json::Value =
        serde_json::from_str(&record.payload).map_err(|e| HarvestError::MalformedRecord {
            kind: record.kind.to_string(),
            detail: e.to_string(),
        })?;
    if !parsed.is_object() {
        return Err(HarvestError::MalformedRecord {
            kind: record.kind.to_string(),
            detail: "payload is not a JSON object".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceKind;

    fn record(kind: SourceKind, seq: u32, payload: &str) -> PartialRecord {
        PartialRecord {
            rank: kind.rank(),
            seq,
            kind,
            identifier: "proj".into(),
            payload: payload.into(),
        }
    }

    #[test]
    fn malformed_record_is_excluded_not_fatal() {
        let records = vec![
            record(SourceKind::HarvestHints, 0, "{\"name\": \"a\"}"),
            record(SourceKind::CitationFile, 1, "{not json"),
            record(SourceKind::Readme, 2, "{\"readme\": \"r\"}"),
        ];

        let mut log = HarvestLog::stderr_only();
        let valid = validate_records(records, false, &mut log).unwrap();
        assert_eq!(valid.len(), 2);
        assert!(valid.iter().all(|r| r.kind != SourceKind::CitationFile));
    }

    #[test]
    fn non_object_payload_is_invalid() {
        let records = vec![record(SourceKind::HarvestHints, 0, "[1, 2, 3]")];
        let mut log = HarvestLog::stderr_only();
        let valid = validate_records(records, false, &mut log).unwrap();
        assert!(valid.is_empty());
    }

    #[test]
    fn strict_mode_aborts_on_first_invalid_record() {
        let records = vec![
            record(SourceKind::HarvestHints, 0, "{\"name\": \"a\"}"),
            record(SourceKind::CitationFile, 1, "{not json"),
        ];

        let mut log = HarvestLog::stderr_only();
        let err = validate_records(records, true, &mut log).unwrap_err();
        assert!(matches!(err, HarvestError::MalformedRecord { .. }));
    }
}
