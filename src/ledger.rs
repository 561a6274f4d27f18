//! Append-only record of borrow events and their completion by a return.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::catalog::{Book, Student};

/// A single borrow event, optionally completed by a return
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LedgerEntry {
    /// Borrowing student's SRN
    pub srn: String,
    /// Student name copied at borrow time
    pub student_name: String,
    /// Borrowed book's catalog key
    pub book_id: String,
    /// Book title copied at borrow time
    pub book_title: String,
    /// Book genre copied at borrow time
    pub genre: String,
    /// Day the book left the library
    pub borrow_date: NaiveDate,
    /// Day the book came back; `None` while the loan is open
    #[serde(default)]
    pub return_date: Option<NaiveDate>,
    /// Whole days between borrow and return, set on return
    #[serde(default)]
    pub duration: Option<u32>,
}

impl LedgerEntry {
    /// Open a new entry for `student` borrowing `book` on `date`
    #[must_use]
    pub fn open(srn: &str, student: &Student, book_id: &str, book: &Book, date: NaiveDate) -> Self {
        Self {
            srn: srn.to_string(),
            student_name: student.name.clone(),
            book_id: book_id.to_string(),
            book_title: book.title.clone(),
            genre: book.genre.clone(),
            borrow_date: date,
            return_date: None,
            duration: None,
        }
    }

    /// Whether the book has not been returned yet
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.return_date.is_none()
    }

    /// Borrow month as `YYYY-MM`
    #[must_use]
    pub fn month(&self) -> String {
        self.borrow_date.format("%Y-%m").to_string()
    }

    /// Whether this entry belongs to `srn` borrowing `book_id`
    #[must_use]
    pub fn matches(&self, srn: &str, book_id: &str) -> bool {
        self.srn == srn && self.book_id == book_id
    }

    /// Close the entry on `date` and return the loan duration in days.
    ///
    /// A return date earlier than the borrow date is clamped to the borrow
    /// date so durations are never negative.
    pub fn close(&mut self, date: NaiveDate) -> u32 {
        let returned = date.max(self.borrow_date);
        let days = u32::try_from(returned.signed_duration_since(self.borrow_date).num_days())
            .unwrap_or(u32::MAX);
        self.return_date = Some(returned);
        self.duration = Some(days);
        days
    }

    /// Undo `close`, making the entry open again
    pub(crate) fn reopen(&mut self) {
        self.return_date = None;
        self.duration = None;
    }
}

/// Ordered sequence of ledger entries
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Ledger {
    /// Entries in append order
    entries: Vec<LedgerEntry>,
}

impl Ledger {
    /// All entries in append order
    #[must_use]
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Number of recorded borrows
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been borrowed yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lookup one entry by position
    #[must_use]
    pub fn get(&self, idx: usize) -> Option<&LedgerEntry> {
        self.entries.get(idx)
    }

    /// Append a new entry and return its position
    pub fn append(&mut self, entry: LedgerEntry) -> usize {
        let idx = self.entries.len();
        self.entries.push(entry);
        idx
    }

    /// Position of the most recent open entry for `srn` and `book_id`
    #[must_use]
    pub fn latest_open(&self, srn: &str, book_id: &str) -> Option<usize> {
        self.entries.iter().rposition(|entry| entry.matches(srn, book_id) && entry.is_open())
    }

    /// Close the entry at `idx` on `date`, returning the duration in days
    pub fn close(&mut self, idx: usize, date: NaiveDate) -> Option<u32> {
        self.entries.get_mut(idx).map(|entry| entry.close(date))
    }

    /// Reopen the entry at `idx`
    pub(crate) fn reopen(&mut self, idx: usize) {
        if let Some(entry) = self.entries.get_mut(idx) {
            entry.reopen();
        }
    }

    /// Remove the most recently appended entry
    pub(crate) fn discard_last(&mut self) -> Option<LedgerEntry> {
        self.entries.pop()
    }

    /// Entries for one student in append order
    #[must_use]
    pub fn for_student(&self, srn: &str) -> Vec<&LedgerEntry> {
        self.entries.iter().filter(|entry| entry.srn == srn).collect()
    }

    /// Iterate all entries in append order
    pub fn iter(&self) -> std::slice::Iter<'_, LedgerEntry> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a Ledger {
    type Item = &'a LedgerEntry;
    type IntoIter = std::slice::Iter<'a, LedgerEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
