//! Trend projection over one suite, for plotting a single benchmark.

use std::iter::FusedIterator;
use std::slice;

use crate::schema::{BenchmarkSuiteRecord, Commit, CommitBenchmarkEntry};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendPoint<'a> {
    pub commit: &'a Commit,
    pub date: u64,
    pub value: f64,
}

/// A filtered view over `entries[label]`. Nothing is computed until it is
/// iterated, and it can be iterated any number of times.
#[derive(Debug, Clone, Copy)]
pub struct Query<'a> {
    entries: &'a [CommitBenchmarkEntry],
    benchmark: &'a str,
}

impl<'a> Query<'a> {
    pub fn iter(&self) -> TrendIter<'a> {
        TrendIter {
            inner: self.entries.iter(),
            benchmark: self.benchmark,
        }
    }

    pub fn benchmark(&self) -> &'a str {
        self.benchmark
    }
}

impl<'a> IntoIterator for Query<'a> {
    type Item = TrendPoint<'a>;
    type IntoIter = TrendIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a> IntoIterator for &Query<'a> {
    type Item = TrendPoint<'a>;
    type IntoIter = TrendIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Debug, Clone)]
pub struct TrendIter<'a> {
    inner: slice::Iter<'a, CommitBenchmarkEntry>,
    benchmark: &'a str,
}

impl<'a> Iterator for TrendIter<'a> {
    type Item = TrendPoint<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let benchmark = self.benchmark;
        self.inner.by_ref().find_map(|entry| {
            entry.bench(benchmark).map(|b| TrendPoint {
                commit: &entry.commit,
                date: entry.date,
                value: b.value,
            })
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.inner.size_hint().1)
    }
}

impl FusedIterator for TrendIter<'_> {}

impl BenchmarkSuiteRecord {
    /// Chronological `(commit, date, value)` points for `benchmark` within
    /// `label`. An unknown label or name yields an empty sequence.
    pub fn query<'a>(&'a self, label: &str, benchmark: &'a str) -> Query<'a> {
        Query {
            entries: self.entries_for(label),
            benchmark,
        }
    }
}
