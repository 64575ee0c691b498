//! Persisted shape of the benchmark ledger.
//!
//! Key names match the dashboard `data.js` format exactly. Every struct keeps
//! the fields it does not know about in `unknown`, which is flattened back
//! after the known fields on write so a superset producer round-trips.

use std::fmt;

use indexmap::IndexMap;
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Fields this crate does not model, kept in file order.
pub type UnknownFields = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub email: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(flatten)]
    pub unknown: UnknownFields,
}

impl Identity {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
            username: None,
            unknown: UnknownFields::new(),
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }
}

/// Version-control metadata captured when the run happened. All values are
/// opaque to the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    pub author: Identity,
    pub committer: Identity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distinct: Option<bool>,
    pub id: String,
    pub message: String,
    pub timestamp: String,
    pub tree_id: String,
    pub url: String,

    #[serde(flatten)]
    pub unknown: UnknownFields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchMeasurement {
    pub name: String,
    pub value: f64,
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<String>,

    #[serde(flatten)]
    pub unknown: UnknownFields,
}

impl BenchMeasurement {
    pub fn new(name: impl Into<String>, value: f64, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value,
            unit: unit.into(),
            range: None,
            extra: None,
            unknown: UnknownFields::new(),
        }
    }
}

/// One benchmark run tied to one commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitBenchmarkEntry {
    pub commit: Commit,
    /// Execution time in ms since the epoch, not the commit time.
    pub date: u64,
    pub tool: String,
    pub benches: Vec<BenchMeasurement>,

    #[serde(flatten)]
    pub unknown: UnknownFields,
}

impl CommitBenchmarkEntry {
    pub fn new(
        commit: Commit,
        date: u64,
        tool: impl Into<String>,
        benches: Vec<BenchMeasurement>,
    ) -> Self {
        Self {
            commit,
            date,
            tool: tool.into(),
            benches,
            unknown: UnknownFields::new(),
        }
    }

    pub fn bench(&self, name: &str) -> Option<&BenchMeasurement> {
        self.benches.iter().find(|b| b.name == name)
    }
}

/// The whole ledger, as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkSuiteRecord {
    pub last_update: u64,
    pub repo_url: String,
    #[serde(deserialize_with = "unique_suite_labels")]
    pub entries: IndexMap<String, Vec<CommitBenchmarkEntry>>,

    #[serde(flatten)]
    pub unknown: UnknownFields,
}

/// Rejects a repeated suite label instead of letting the last one win, which
/// would drop every entry recorded under the earlier key.
fn unique_suite_labels<'de, D>(
    deserializer: D,
) -> Result<IndexMap<String, Vec<CommitBenchmarkEntry>>, D::Error>
where
    D: Deserializer<'de>,
{
    struct UniqueLabels;

    impl<'de> Visitor<'de> for UniqueLabels {
        type Value = IndexMap<String, Vec<CommitBenchmarkEntry>>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map from suite label to benchmark entries")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut out = IndexMap::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((label, entries)) = map.next_entry::<String, Vec<CommitBenchmarkEntry>>()? {
                if out.contains_key(&label) {
                    return Err(de::Error::custom(format_args!("duplicate suite label {label:?}")));
                }
                out.insert(label, entries);
            }
            Ok(out)
        }
    }

    deserializer.deserialize_map(UniqueLabels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_names_are_exact() {
        let mut record = BenchmarkSuiteRecord::empty("https://example.com/repo");
        let commit = Commit {
            author: Identity::new("a", "a@example.com").with_username("a1"),
            committer: Identity::new("c", "c@example.com"),
            distinct: Some(true),
            id: "abc".into(),
            message: "m".into(),
            timestamp: "2021-02-16T12:15:37+01:00".into(),
            tree_id: "t".into(),
            url: "u".into(),
            unknown: UnknownFields::new(),
        };
        let mut bench = BenchMeasurement::new("b", 1.5, "iter/sec");
        bench.range = Some("stddev: 0.1".into());
        record
            .append("Benchmark", CommitBenchmarkEntry::new(commit, 7, "pytest", vec![bench]))
            .unwrap();

        let v = serde_json::to_value(&record).unwrap();
        assert_eq!(v["lastUpdate"], json!(7));
        assert_eq!(v["repoUrl"], json!("https://example.com/repo"));
        let entry = &v["entries"]["Benchmark"][0];
        assert_eq!(entry["commit"]["tree_id"], json!("t"));
        assert_eq!(entry["commit"]["author"]["username"], json!("a1"));
        assert!(entry["commit"]["committer"].get("username").is_none());
        assert_eq!(entry["benches"][0]["range"], json!("stddev: 0.1"));
        assert!(entry["benches"][0].get("extra").is_none());
    }

    #[test]
    fn test_unknown_fields_survive() {
        let raw = json!({
            "name": "x",
            "value": 2,
            "unit": "ms",
            "biggerIsBetter": false
        });
        let bench: BenchMeasurement = serde_json::from_value(raw).unwrap();
        assert_eq!(bench.value, 2.0);
        assert_eq!(bench.unknown.get("biggerIsBetter"), Some(&json!(false)));

        let back = serde_json::to_string(&bench).unwrap();
        assert_eq!(
            back,
            r#"{"name":"x","value":2.0,"unit":"ms","biggerIsBetter":false}"#
        );
    }

    #[test]
    fn test_entry_bench_lookup() {
        let commit: Commit = serde_json::from_value(json!({
            "author": {"email": "e", "name": "n"},
            "committer": {"email": "e", "name": "n"},
            "id": "1", "message": "", "timestamp": "", "tree_id": "", "url": ""
        }))
        .unwrap();
        let entry = CommitBenchmarkEntry::new(
            commit,
            1,
            "pytest",
            vec![BenchMeasurement::new("a", 1.0, "x"), BenchMeasurement::new("b", 2.0, "x")],
        );
        assert_eq!(entry.bench("b").map(|b| b.value), Some(2.0));
        assert!(entry.bench("c").is_none());
    }
}
