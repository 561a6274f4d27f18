//! Read-only aggregations over a ledger snapshot.
//!
//! Every function here is a pure fold over `&[LedgerEntry]`: group by a key,
//! then count or average. An empty ledger yields an empty result.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::ledger::LedgerEntry;

/// Default number of titles in the most-borrowed ranking
pub const DEFAULT_TOP_N: usize = 10;

/// Counts per key in first-encountered order
fn tally_by<'a, F>(entries: &'a [LedgerEntry], key: F) -> Vec<(String, usize)>
where
    F: Fn(&'a LedgerEntry) -> &'a str,
{
    let mut positions: BTreeMap<&str, usize> = BTreeMap::new();
    let mut counts: Vec<(String, usize)> = Vec::new();

    for entry in entries {
        let label = key(entry);
        match positions.get(label).and_then(|&pos| counts.get_mut(pos)) {
            Some((_, count)) => *count = count.saturating_add(1),
            None => {
                positions.insert(label, counts.len());
                counts.push((label.to_string(), 1));
            }
        }
    }

    counts
}

/// Sort descending by count; the sort is stable so ties keep scan order
fn ranked(mut counts: Vec<(String, usize)>) -> Vec<(String, usize)> {
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// Number of borrows per genre, most borrowed first
#[must_use]
pub fn genre_counts(entries: &[LedgerEntry]) -> Vec<(String, usize)> {
    ranked(tally_by(entries, |entry| entry.genre.as_str()))
}

/// The `n` most borrowed titles, ties broken by first appearance
#[must_use]
pub fn top_books(entries: &[LedgerEntry], n: usize) -> Vec<(String, usize)> {
    let mut counts = ranked(tally_by(entries, |entry| entry.book_title.as_str()));
    counts.truncate(n);
    counts
}

/// Number of borrows per student name, most active first
#[must_use]
pub fn student_counts(entries: &[LedgerEntry]) -> Vec<(String, usize)> {
    ranked(tally_by(entries, |entry| entry.student_name.as_str()))
}

/// Number of borrows per borrow date, oldest first
#[must_use]
pub fn daily_counts(entries: &[LedgerEntry]) -> BTreeMap<NaiveDate, usize> {
    let mut counts = BTreeMap::new();
    for entry in entries {
        let count: &mut usize = counts.entry(entry.borrow_date).or_default();
        *count = count.saturating_add(1);
    }
    counts
}

/// Number of borrows per `YYYY-MM` month, oldest first
#[must_use]
pub fn monthly_counts(entries: &[LedgerEntry]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for entry in entries {
        let count: &mut usize = counts.entry(entry.month()).or_default();
        *count = count.saturating_add(1);
    }
    counts
}

/// Average loan length per title over returned entries, longest first
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn average_duration_by_title(entries: &[LedgerEntry]) -> Vec<(String, f64)> {
    let mut totals: Vec<(String, u64, u64)> = Vec::new();

    for entry in entries {
        let Some(days) = entry.duration else { continue };
        match totals.iter_mut().find(|(title, _, _)| *title == entry.book_title) {
            Some((_, sum, n)) => {
                *sum = sum.saturating_add(u64::from(days));
                *n = n.saturating_add(1);
            }
            None => totals.push((entry.book_title.clone(), u64::from(days), 1)),
        }
    }

    let mut averages: Vec<(String, f64)> =
        totals.into_iter().map(|(title, sum, n)| (title, sum as f64 / n as f64)).collect();
    averages.sort_by(|a, b| b.1.total_cmp(&a.1));
    averages
}

/// Each genre's share of all borrows in percent, in `genre_counts` order
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn genre_shares(entries: &[LedgerEntry]) -> Vec<(String, f64)> {
    let total = entries.len() as f64;
    genre_counts(entries)
        .into_iter()
        .map(|(genre, count)| (genre, count as f64 * 100.0 / total))
        .collect()
}

/// How many times each student borrowed each title
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentBookMatrix {
    /// Row labels, sorted
    students: Vec<String>,
    /// Column labels, sorted
    titles: Vec<String>,
    /// Non-zero cells keyed by (student, title)
    cells: BTreeMap<(String, String), usize>,
}

impl StudentBookMatrix {
    /// Pivot the ledger into a student x title count grid
    #[must_use]
    pub fn from_entries(entries: &[LedgerEntry]) -> Self {
        let mut students = BTreeSet::new();
        let mut titles = BTreeSet::new();
        let mut cells: BTreeMap<(String, String), usize> = BTreeMap::new();

        for entry in entries {
            students.insert(entry.student_name.clone());
            titles.insert(entry.book_title.clone());
            let cell = cells.entry((entry.student_name.clone(), entry.book_title.clone())).or_default();
            *cell = cell.saturating_add(1);
        }

        Self {
            students: students.into_iter().collect(),
            titles: titles.into_iter().collect(),
            cells,
        }
    }

    /// Row labels
    #[must_use]
    pub fn students(&self) -> &[String] {
        &self.students
    }

    /// Column labels
    #[must_use]
    pub fn titles(&self) -> &[String] {
        &self.titles
    }

    /// Count for one cell; zero where the student never borrowed the title
    #[must_use]
    pub fn count(&self, student: &str, title: &str) -> usize {
        self.cells.get(&(student.to_string(), title.to_string())).copied().unwrap_or(0)
    }

    /// One row of counts in `titles` order
    #[must_use]
    pub fn row(&self, student: &str) -> Vec<usize> {
        self.titles.iter().map(|title| self.count(student, title)).collect()
    }

    /// Largest cell value
    #[must_use]
    pub fn max_count(&self) -> usize {
        self.cells.values().copied().max().unwrap_or(0)
    }

    /// Whether the ledger had no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }
}
