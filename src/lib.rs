//! Append-only history of CI benchmark runs, stored in the format the
//! benchmark dashboard reads (`data.js`), plus small test helpers.
//!
//! ```no_run
//! use bench_ledger::{extract, harness, LedgerConfig, LedgerStore};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = LedgerConfig::from_env();
//! let store = LedgerStore::open(&config);
//!
//! let commit = bench_ledger::ci::commit_from_env()?;
//! let output = std::fs::read_to_string("output.json")?;
//! let entry = extract::pytest_entry(commit, harness::now_millis(), &output)?;
//!
//! if !store.read()?.contains_commit(&config.suite_label, &entry.commit.id) {
//!     store.append(&config.suite_label, entry)?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod ci;
pub mod config;
pub mod error;
pub mod extract;
pub mod format;
pub mod harness;
pub mod ledger;
pub mod predicate;
pub mod query;
pub mod schema;
pub mod store;

pub use config::LedgerConfig;
pub use error::LedgerError;
pub use format::LedgerFormat;
pub use query::{Query, TrendPoint};
pub use schema::{BenchMeasurement, BenchmarkSuiteRecord, Commit, CommitBenchmarkEntry, Identity};
pub use store::{Fingerprint, LedgerStore};
