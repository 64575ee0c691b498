//! File-backed ledger storage.
//!
//! Every append is a full read, append, rewrite cycle. The rewrite goes to a
//! temporary file next to the ledger which is synced and renamed over it, so
//! a reader sees either the previous record or the new one.

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::config::LedgerConfig;
use crate::error::{LedgerError, Result};
use crate::format::{self, LedgerFormat};
use crate::ledger::validate_entry;
use crate::schema::{BenchmarkSuiteRecord, CommitBenchmarkEntry};

/// SHA-256 of the persisted bytes, or `Absent` when no ledger exists yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Fingerprint {
    Absent,
    Sha256([u8; 32]),
}

impl Fingerprint {
    fn of(bytes: &[u8]) -> Self {
        Fingerprint::Sha256(Sha256::digest(bytes).into())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fingerprint::Absent => f.write_str("absent"),
            Fingerprint::Sha256(d) => write!(f, "sha256:{}", hex::encode(d)),
        }
    }
}

/// Handle to one ledger file.
///
/// Appends through the same handle are serialized, so a `LedgerStore` can be
/// shared between threads. Separate processes should use
/// [`LedgerStore::append_if_unchanged`].
#[derive(Debug)]
pub struct LedgerStore {
    path: PathBuf,
    repo_url: String,
    format: LedgerFormat,
    write_lock: Mutex<()>,
}

impl LedgerStore {
    /// Format follows the file extension; see [`LedgerFormat::for_path`].
    pub fn new(path: impl Into<PathBuf>, repo_url: impl Into<String>) -> Self {
        let path = path.into();
        let format = LedgerFormat::for_path(&path);
        Self {
            path,
            repo_url: repo_url.into(),
            format,
            write_lock: Mutex::new(()),
        }
    }

    pub fn open(config: &LedgerConfig) -> Self {
        let store = Self::new(&config.path, &config.repo_url);
        match config.format {
            Some(format) => store.with_format(format),
            None => store,
        }
    }

    pub fn with_format(mut self, format: LedgerFormat) -> Self {
        self.format = format;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> LedgerFormat {
        self.format
    }

    /// The persisted record, or an empty one if nothing was written yet.
    pub fn read(&self) -> Result<BenchmarkSuiteRecord> {
        self.load().map(|(record, _)| record)
    }

    pub fn fingerprint(&self) -> Result<Fingerprint> {
        Ok(self.read_bytes()?.map_or(Fingerprint::Absent, |b| Fingerprint::of(&b)))
    }

    /// Appends `entry` to `entries[label]` and persists the whole record.
    /// Returns the new length of the suite.
    pub fn append(&self, label: &str, entry: CommitBenchmarkEntry) -> Result<usize> {
        validate_entry(&entry)?;
        let _guard = self.write_lock.lock();

        let (mut record, _) = self.load()?;
        let commit_id = entry.commit.id.clone();
        let len = record.append(label, entry)?;
        self.persist(&record)?;

        info!(suite = label, commit = %commit_id, entries = len, path = %self.path.display(), "appended benchmark entry");
        Ok(len)
    }

    /// Like [`Self::append`], but fails with [`LedgerError::Conflict`] when the
    /// file no longer matches `expected`. Returns the new suite length and the
    /// fingerprint of what was written.
    pub fn append_if_unchanged(
        &self,
        label: &str,
        entry: CommitBenchmarkEntry,
        expected: &Fingerprint,
    ) -> Result<(usize, Fingerprint)> {
        validate_entry(&entry)?;
        let _guard = self.write_lock.lock();

        let (mut record, current) = self.load()?;
        if &current != expected {
            warn!(path = %self.path.display(), %expected, %current, "ledger changed since it was read");
            return Err(LedgerError::Conflict {
                path: self.path.clone(),
            });
        }

        let commit_id = entry.commit.id.clone();
        let len = record.append(label, entry)?;
        let written = self.persist(&record)?;

        info!(suite = label, commit = %commit_id, entries = len, path = %self.path.display(), "appended benchmark entry");
        Ok((len, written))
    }

    fn read_bytes(&self) -> Result<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(LedgerError::storage(&self.path, e)),
        }
    }

    fn load(&self) -> Result<(BenchmarkSuiteRecord, Fingerprint)> {
        let Some(bytes) = self.read_bytes()? else {
            debug!(path = %self.path.display(), "no ledger yet, starting empty");
            return Ok((BenchmarkSuiteRecord::empty(&self.repo_url), Fingerprint::Absent));
        };

        let text = std::str::from_utf8(&bytes)
            .map_err(|e| LedgerError::malformed(&self.path, format!("not utf-8: {e}")))?;
        let record = format::decode(&self.path, text)?;
        debug!(path = %self.path.display(), bytes = bytes.len(), suites = record.entries.len(), "loaded ledger");
        Ok((record, Fingerprint::of(&bytes)))
    }

    fn persist(&self, record: &BenchmarkSuiteRecord) -> Result<Fingerprint> {
        let text = self.format.encode(record)?;

        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|e| LedgerError::storage(dir, e))?;

        // Dropping the temp file on any error below removes it.
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| LedgerError::storage(dir, e))?;
        tmp.write_all(text.as_bytes())
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| LedgerError::storage(tmp.path(), e))?;
        tmp.persist(&self.path)
            .map_err(|e| LedgerError::storage(&self.path, e.error))?;

        debug!(path = %self.path.display(), bytes = text.len(), format = self.format.as_str(), "persisted ledger");
        Ok(Fingerprint::of(text.as_bytes()))
    }
}
