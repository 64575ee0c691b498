//! On-disk encodings of the ledger.
//!
//! ```text
//! Json:   {"lastUpdate": ..., "repoUrl": ..., "entries": {...}}
//! Script: window.BENCHMARK_DATA = {"lastUpdate": ...}
//! ```
//!
//! Both use two-space pretty printing and no trailing newline, which is what
//! the dashboard page writes and reads.

use std::path::Path;

use serde::Deserialize;

use crate::error::{LedgerError, Result};
use crate::ledger::validate_entry;
use crate::schema::BenchmarkSuiteRecord;

/// Assignment prefix of the dashboard `data.js` file.
pub const SCRIPT_PREFIX: &str = "window.BENCHMARK_DATA = ";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerFormat {
    #[default]
    Json,
    Script,
}

impl LedgerFormat {
    /// `.js` files are scripts, everything else is plain JSON.
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("js") => LedgerFormat::Script,
            _ => LedgerFormat::Json,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerFormat::Json => "json",
            LedgerFormat::Script => "script",
        }
    }

    pub fn encode(&self, record: &BenchmarkSuiteRecord) -> Result<String> {
        let json = serde_json::to_string_pretty(record)?;
        Ok(match self {
            LedgerFormat::Json => json,
            LedgerFormat::Script => format!("{SCRIPT_PREFIX}{json}"),
        })
    }
}

/// Parses either encoding. The script prefix is accepted whatever the
/// configured format is, so a ledger can be migrated between the two.
/// Stored entries must satisfy the same rules as appended ones. `path` is
/// only used for error reporting.
pub fn decode(path: &Path, text: &str) -> Result<BenchmarkSuiteRecord> {
    let body = strip_script_prefix(text);
    let body = body.trim_end().trim_end_matches(';');
    if body.trim().is_empty() {
        return Err(LedgerError::malformed(path, "ledger file is empty"));
    }
    let record: BenchmarkSuiteRecord =
        serde_json::from_str(body).map_err(|e| LedgerError::malformed(path, e.to_string()))?;

    for (label, entries) in &record.entries {
        for (i, entry) in entries.iter().enumerate() {
            validate_entry(entry).map_err(|e| {
                LedgerError::malformed(path, format!("suite {label:?} entry {i}: {e}"))
            })?;
        }
    }
    Ok(record)
}

fn strip_script_prefix(text: &str) -> &str {
    let text = text.trim_start_matches('\u{feff}').trim_start();
    match text.strip_prefix("window.BENCHMARK_DATA") {
        Some(rest) => rest.trim_start().strip_prefix('=').unwrap_or(rest),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::tests::entry;

    fn record() -> BenchmarkSuiteRecord {
        let mut r = BenchmarkSuiteRecord::empty("https://github.com/terminusdb/terminusdb");
        r.append("Benchmark", entry("c1", 1613474250685, &[("insert", 5.1299485846389645)]))
            .unwrap();
        r
    }

    #[test]
    fn test_for_path() {
        assert_eq!(LedgerFormat::for_path(Path::new("dev/bench/data.js")), LedgerFormat::Script);
        assert_eq!(LedgerFormat::for_path(Path::new("DATA.JS")), LedgerFormat::Script);
        assert_eq!(LedgerFormat::for_path(Path::new("ledger.json")), LedgerFormat::Json);
        assert_eq!(LedgerFormat::for_path(Path::new("ledger")), LedgerFormat::Json);
    }

    #[test]
    fn test_script_encoding_shape() {
        let text = LedgerFormat::Script.encode(&record()).unwrap();
        assert!(text.starts_with("window.BENCHMARK_DATA = {\n  \"lastUpdate\": 1613474250685,\n"));
        assert!(text.ends_with('}'));
        assert!(text.contains("\"value\": 5.1299485846389645,"));
    }

    #[test]
    fn test_decode_accepts_both_encodings() {
        let r = record();
        let p = Path::new("x");
        let json = LedgerFormat::Json.encode(&r).unwrap();
        let script = LedgerFormat::Script.encode(&r).unwrap();
        assert_eq!(decode(p, &json).unwrap(), r);
        assert_eq!(decode(p, &script).unwrap(), r);
        assert_eq!(decode(p, &format!("{script};\n")).unwrap(), r);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let p = Path::new("x");
        for text in ["", "   ", "window.BENCHMARK_DATA = ", "{\"entries\": {}}", "not json"] {
            let err = decode(p, text).unwrap_err();
            assert!(matches!(err, LedgerError::MalformedLedger { .. }), "{text:?}");
        }
    }

    fn with_entries(entries: &str) -> String {
        format!(r#"{{"lastUpdate": 1, "repoUrl": "r", "entries": {entries}}}"#)
    }

    const ENTRY: &str = r#"{
        "commit": {
            "author": {"email": "e", "name": "n"},
            "committer": {"email": "e", "name": "n"},
            "id": "c1", "message": "", "timestamp": "", "tree_id": "", "url": ""
        },
        "date": 1,
        "tool": "pytest",
        "benches": [{"name": "insert", "value": 5.0, "unit": "iter/sec"}]
    }"#;

    #[test]
    fn test_decode_rejects_duplicate_suite_labels() {
        let text = with_entries(&format!(r#"{{"B": [{ENTRY}], "B": []}}"#));
        let err = decode(Path::new("x"), &text).unwrap_err();
        match err {
            LedgerError::MalformedLedger { reason, .. } => assert!(reason.contains("duplicate"), "{reason}"),
            other => panic!("unexpected error: {other}"),
        }

        let distinct = with_entries(&format!(r#"{{"A": [{ENTRY}], "B": [{ENTRY}]}}"#));
        assert_eq!(decode(Path::new("x"), &distinct).unwrap().entries.len(), 2);
    }

    #[test]
    fn test_decode_rejects_invalid_stored_entries() {
        let empty_benches = ENTRY.replace(
            r#"[{"name": "insert", "value": 5.0, "unit": "iter/sec"}]"#,
            "[]",
        );
        let empty_id = ENTRY.replace(r#""id": "c1""#, r#""id": """#);
        for bad in [empty_benches, empty_id] {
            let text = with_entries(&format!(r#"{{"B": [{ENTRY}, {bad}]}}"#));
            assert!(matches!(
                decode(Path::new("x"), &text),
                Err(LedgerError::MalformedLedger { .. })
            ));
        }
    }

    #[test]
    fn test_decode_keeps_every_float_digit() {
        let text = with_entries(&format!(r#"{{"B": [{ENTRY}]}}"#)).replace(
            r#""value": 5.0"#,
            r#""value": 15.428861363325765"#,
        );
        let record = decode(Path::new("x"), &text).unwrap();
        let value = record.entries_for("B")[0].benches[0].value;
        assert_eq!(value.to_string(), "15.428861363325765");
    }

    #[test]
    fn test_decode_rejects_wrong_types() {
        let text = r#"{"lastUpdate": "soon", "repoUrl": "r", "entries": {}}"#;
        assert!(matches!(
            decode(Path::new("x"), text),
            Err(LedgerError::MalformedLedger { .. })
        ));
    }
}
