//! Commit metadata from the CI environment.
//!
//! GitHub push events carry a `head_commit` object whose shape is exactly the
//! ledger's [`Commit`], so it is deserialized as-is.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::schema::Commit;

#[derive(Debug, thiserror::Error)]
pub enum CiError {
    #[error("GITHUB_EVENT_PATH is not set")]
    NoEventPath,

    #[error("failed to read event payload {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid event payload {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("event payload {0} has no head_commit")]
    NoHeadCommit(PathBuf),
}

#[derive(Deserialize)]
struct PushEvent {
    head_commit: Option<Commit>,
}

pub fn commit_from_event_file(path: &Path) -> Result<Commit, CiError> {
    let text = fs::read_to_string(path).map_err(|source| CiError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let event: PushEvent = serde_json::from_str(&text).map_err(|source| CiError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    event
        .head_commit
        .ok_or_else(|| CiError::NoHeadCommit(path.to_path_buf()))
}

/// Reads the payload named by `GITHUB_EVENT_PATH`.
pub fn commit_from_env() -> Result<Commit, CiError> {
    let path = env::var_os("GITHUB_EVENT_PATH").ok_or(CiError::NoEventPath)?;
    commit_from_event_file(Path::new(&path)).inspect_err(|e| {
        warn!(error = %e, "could not load commit metadata from the CI event");
    })
}
