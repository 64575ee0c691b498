use std::env;
use std::path::PathBuf;

use serde::Deserialize;

use crate::format::LedgerFormat;

pub const DEFAULT_SUITE_LABEL: &str = "Benchmark";
pub const DEFAULT_LEDGER_PATH: &str = "dev/bench/data.js";

/// Where the ledger lives and how new entries are labelled.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct LedgerConfig {
    #[serde(default = "default_path")]
    pub path: PathBuf,
    pub repo_url: String,
    /// Overrides the extension-based choice.
    #[serde(default)]
    pub format: Option<LedgerFormat>,
    #[serde(default = "default_suite_label")]
    pub suite_label: String,
}

fn default_path() -> PathBuf {
    PathBuf::from(DEFAULT_LEDGER_PATH)
}

fn default_suite_label() -> String {
    DEFAULT_SUITE_LABEL.to_string()
}

impl LedgerConfig {
    pub fn new(path: impl Into<PathBuf>, repo_url: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            repo_url: repo_url.into(),
            format: None,
            suite_label: default_suite_label(),
        }
    }

    /// Reads `BENCH_LEDGER_PATH`, `BENCH_LEDGER_REPO_URL`, `BENCH_LEDGER_SUITE`
    /// and `BENCH_LEDGER_FORMAT` (`json` or `script`). The repository URL falls
    /// back to the GitHub Actions variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let repo_url = get("BENCH_LEDGER_REPO_URL")
            .or_else(|| {
                let repo = get("GITHUB_REPOSITORY")?;
                let server = get("GITHUB_SERVER_URL").unwrap_or_else(|| "https://github.com".into());
                Some(format!("{}/{}", server.trim_end_matches('/'), repo))
            })
            .unwrap_or_default();

        let format = get("BENCH_LEDGER_FORMAT").and_then(|f| match f.to_ascii_lowercase().as_str() {
            "json" => Some(LedgerFormat::Json),
            "script" | "js" => Some(LedgerFormat::Script),
            _ => None,
        });

        Self {
            path: get("BENCH_LEDGER_PATH").map_or_else(default_path, PathBuf::from),
            repo_url,
            format,
            suite_label: get("BENCH_LEDGER_SUITE").unwrap_or_else(default_suite_label),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let cfg = LedgerConfig::from_lookup(lookup(&[]));
        assert_eq!(cfg.path, PathBuf::from("dev/bench/data.js"));
        assert_eq!(cfg.repo_url, "");
        assert_eq!(cfg.format, None);
        assert_eq!(cfg.suite_label, "Benchmark");
    }

    #[test]
    fn test_github_fallback() {
        let cfg = LedgerConfig::from_lookup(lookup(&[
            ("GITHUB_REPOSITORY", "terminusdb/terminusdb"),
            ("GITHUB_SERVER_URL", "https://github.com/"),
        ]));
        assert_eq!(cfg.repo_url, "https://github.com/terminusdb/terminusdb");
    }

    #[test]
    fn test_explicit_vars_win() {
        let cfg = LedgerConfig::from_lookup(lookup(&[
            ("BENCH_LEDGER_REPO_URL", "https://example.com/r"),
            ("GITHUB_REPOSITORY", "ignored/ignored"),
            ("BENCH_LEDGER_PATH", "out/ledger.json"),
            ("BENCH_LEDGER_FORMAT", "Script"),
            ("BENCH_LEDGER_SUITE", "Nightly"),
        ]));
        assert_eq!(cfg.repo_url, "https://example.com/r");
        assert_eq!(cfg.path, PathBuf::from("out/ledger.json"));
        assert_eq!(cfg.format, Some(LedgerFormat::Script));
        assert_eq!(cfg.suite_label, "Nightly");
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let cfg: LedgerConfig =
            serde_json::from_str(r#"{"repo_url": "r", "format": "script"}"#).unwrap();
        assert_eq!(cfg.path, PathBuf::from(DEFAULT_LEDGER_PATH));
        assert_eq!(cfg.format, Some(LedgerFormat::Script));
        assert_eq!(cfg.suite_label, DEFAULT_SUITE_LABEL);
    }
}
