//! In-memory ledger operations.
//!
//! These never touch storage; [`crate::store::LedgerStore`] wraps them in a
//! load, mutate, persist cycle.

use indexmap::{IndexMap, IndexSet};

use crate::error::{LedgerError, Result};
use crate::schema::{BenchmarkSuiteRecord, CommitBenchmarkEntry, UnknownFields};

impl BenchmarkSuiteRecord {
    /// A valid ledger with no entries.
    pub fn empty(repo_url: impl Into<String>) -> Self {
        Self {
            last_update: 0,
            repo_url: repo_url.into(),
            entries: IndexMap::new(),
            unknown: UnknownFields::new(),
        }
    }

    /// Appends `entry` under `label` and returns the new length of that
    /// suite. Existing entries are not touched and duplicates are kept; use
    /// [`Self::contains_commit`] to skip a commit that was already recorded.
    pub fn append(&mut self, label: &str, entry: CommitBenchmarkEntry) -> Result<usize> {
        validate_entry(&entry)?;

        self.last_update = self.last_update.max(entry.date);
        let suite = self.entries.entry(label.to_string()).or_default();
        suite.push(entry);
        Ok(suite.len())
    }

    pub fn entries_for(&self, label: &str) -> &[CommitBenchmarkEntry] {
        self.entries.get(label).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn suite_labels(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn contains_commit(&self, label: &str, commit_id: &str) -> bool {
        self.entries_for(label)
            .iter()
            .any(|e| e.commit.id == commit_id)
    }

    /// Distinct benchmark names recorded under `label`, in first-seen order.
    pub fn benchmark_names(&self, label: &str) -> Vec<&str> {
        let names: IndexSet<&str> = self
            .entries_for(label)
            .iter()
            .flat_map(|e| e.benches.iter().map(|b| b.name.as_str()))
            .collect();
        names.into_iter().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.values().all(Vec::is_empty)
    }
}

pub(crate) fn validate_entry(entry: &CommitBenchmarkEntry) -> Result<()> {
    if entry.commit.id.trim().is_empty() {
        return Err(LedgerError::InvalidEntry("commit id is empty".into()));
    }
    if entry.benches.is_empty() {
        return Err(LedgerError::InvalidEntry(format!(
            "commit {} has no benchmark measurements",
            entry.commit.id
        )));
    }
    // Non-finite values encode as `null`, which would make the file unreadable.
    if let Some(b) = entry.benches.iter().find(|b| !b.value.is_finite()) {
        return Err(LedgerError::InvalidEntry(format!(
            "benchmark {} of commit {} has non-finite value {}",
            b.name, entry.commit.id, b.value
        )));
    }
    Ok(())
}
