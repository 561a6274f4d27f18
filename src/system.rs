use std::{
    collections::BTreeMap,
    fmt,
    path::PathBuf,
};

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::{
    catalog::{Book, BookListing, Session, Student},
    clock::Clock,
    error::{LibraryError, LibraryResult},
    events::LedgerEvent,
    ledger::{Ledger, LedgerEntry},
    observers::{ActivityLogger, LedgerObserver},
    persistence::{self, LibraryDocument},
};

/// Outcome of a successful borrow or return
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    /// The book is now on loan
    Borrowed {
        /// Catalog key
        book_id: String,
        /// Book title
        title: String,
        /// Borrow date
        on: NaiveDate,
    },
    /// The book is back in the library
    Returned {
        /// Catalog key
        book_id: String,
        /// Book title
        title: String,
        /// Return date
        on: NaiveDate,
        /// Whole days the book was out
        duration_days: u32,
    },
}

impl Confirmation {
    /// Title of the book the confirmation is about
    #[must_use]
    pub fn title(&self) -> &str {
        match self {
            Self::Borrowed { title, .. } | Self::Returned { title, .. } => title,
        }
    }
}

impl fmt::Display for Confirmation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Borrowed { title, .. } => write!(f, "Successfully borrowed '{title}'"),
            Self::Returned { title, duration_days, .. } => {
                write!(f, "Successfully returned '{title}' after {duration_days} day(s)")
            }
        }
    }
}

/// Catalog of books and the borrow ledger, backed by one JSON document
pub struct CatalogStore {
    /// Where the document is persisted
    path: PathBuf,
    /// In-memory snapshot, owned exclusively by the store
    document: LibraryDocument,
    /// Supplies borrow and return dates
    clock: Box<dyn Clock>,
    /// Registered ledger change observers
    observers: Vec<Box<dyn LedgerObserver>>,
}

// Manual implementation of Debug for CatalogStore
impl fmt::Debug for CatalogStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogStore")
            .field("path", &self.path)
            .field("books", &self.document.books.len())
            .field("students", &self.document.students.len())
            .field("ledger_len", &self.document.history.len())
            .field("clock", &self.clock)
            .field("observers_count", &self.observers.len())
            .finish()
    }
}

impl CatalogStore {
    /// Open the store backed by `path`, seeding a default catalog if the file
    /// does not exist yet
    ///
    /// # Errors
    ///
    /// Returns a `LibraryError::MalformedState` if the document is invalid and
    /// a `LibraryError::Persistence` if it cannot be read or the seed written
    pub fn open(path: impl Into<PathBuf>, clock: impl Clock + 'static) -> LibraryResult<Self> {
        let path = path.into();
        let document = persistence::load_or_seed(&path)?;
        Ok(Self::with_document(path, document, clock))
    }

    /// Build a store around an already-loaded document without touching disk
    #[must_use]
    pub fn with_document(
        path: impl Into<PathBuf>,
        document: LibraryDocument,
        clock: impl Clock + 'static,
    ) -> Self {
        let mut store =
            Self { path: path.into(), document, clock: Box::new(clock), observers: Vec::new() };
        store.register_observer(Box::new(ActivityLogger));
        store
    }

    /// Register an observer to be notified of ledger changes
    pub fn register_observer(&mut self, observer: Box<dyn LedgerObserver>) {
        self.observers.push(observer);
    }

    /// The current in-memory document
    #[must_use]
    pub fn document(&self) -> &LibraryDocument {
        &self.document
    }

    /// Read-only ledger snapshot for reporting
    #[must_use]
    pub fn ledger(&self) -> &Ledger {
        &self.document.history
    }

    /// Persist the whole document
    ///
    /// # Errors
    ///
    /// Returns a `LibraryError::Persistence` if the document cannot be written
    pub fn save(&self) -> LibraryResult<()> {
        persistence::save(&self.path, &self.document)
    }

    /// True iff the SRN exists and the secret matches exactly
    #[must_use]
    pub fn authenticate_student(&self, srn: &str, secret: &str) -> bool {
        self.document.students.get(srn).is_some_and(|student| student.password == secret)
    }

    /// True iff the username and secret match the admin credential
    #[must_use]
    pub fn authenticate_admin(&self, username: &str, secret: &str) -> bool {
        let admin = &self.document.admin;
        admin.username == username && admin.password == secret
    }

    /// Log a student in
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::InvalidCredentials` for an unknown SRN or a wrong secret
    pub fn login_student(&self, srn: &str, secret: &str) -> LibraryResult<Session> {
        if self.authenticate_student(srn, secret) {
            Ok(Session::Student(srn.to_string()))
        } else {
            debug!(srn, "student login rejected");
            Err(LibraryError::InvalidCredentials)
        }
    }

    /// Log the administrator in
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::InvalidCredentials` if the credential does not match
    pub fn login_admin(&self, username: &str, secret: &str) -> LibraryResult<Session> {
        if self.authenticate_admin(username, secret) {
            Ok(Session::Admin)
        } else {
            debug!(username, "admin login rejected");
            Err(LibraryError::InvalidCredentials)
        }
    }

    /// Lookup one student by SRN
    #[must_use]
    pub fn student(&self, srn: &str) -> Option<&Student> {
        self.document.students.get(srn)
    }

    /// Display name for an SRN
    #[must_use]
    pub fn student_name(&self, srn: &str) -> Option<&str> {
        self.student(srn).map(|student| student.name.as_str())
    }

    /// Lookup one book by identifier
    #[must_use]
    pub fn book(&self, book_id: &str) -> Option<&Book> {
        self.document.books.get(book_id)
    }

    /// Books ordered by identifier, optionally only the available ones
    #[must_use]
    pub fn list_books(&self, available_only: bool) -> Vec<BookListing<'_>> {
        self.document
            .books
            .iter()
            .filter(|(_, book)| !available_only || book.available)
            .map(|(id, book)| BookListing { id, book })
            .collect()
    }

    /// Books grouped by genre; genres and the books inside them are sorted
    #[must_use]
    pub fn books_by_genre(&self, available_only: bool) -> BTreeMap<&str, Vec<BookListing<'_>>> {
        let mut grouped: BTreeMap<&str, Vec<BookListing<'_>>> = BTreeMap::new();
        for listing in self.list_books(available_only) {
            grouped.entry(listing.book.genre.as_str()).or_default().push(listing);
        }
        grouped
    }

    /// Borrow a book for a student
    ///
    /// # Errors
    ///
    /// - `LibraryError::BookNotFound` if the book is not in the catalog
    /// - `LibraryError::BookUnavailable` if the book is already on loan
    /// - `LibraryError::UnknownStudent` if the SRN is not registered
    /// - `LibraryError::Persistence` if the new state cannot be saved; the
    ///   in-memory change is rolled back
    pub fn borrow(&mut self, srn: &str, book_id: &str) -> LibraryResult<Confirmation> {
        let book = self
            .document
            .books
            .get(book_id)
            .ok_or_else(|| LibraryError::BookNotFound(book_id.to_string()))?;
        if !book.available {
            return Err(LibraryError::BookUnavailable(book_id.to_string()));
        }
        let student = self
            .document
            .students
            .get(srn)
            .ok_or_else(|| LibraryError::UnknownStudent(srn.to_string()))?;

        let today = self.clock.today();
        let entry = LedgerEntry::open(srn, student, book_id, book, today);
        let title = entry.book_title.clone();

        self.set_available(book_id, false);
        let idx = self.document.history.append(entry);

        if let Err(e) = self.save() {
            warn!(srn, book_id, error = %e, "borrow not persisted, rolling back");
            self.document.history.discard_last();
            self.set_available(book_id, true);
            return Err(e);
        }

        self.notify(LedgerEvent::Borrowed, idx);
        Ok(Confirmation::Borrowed { book_id: book_id.to_string(), title, on: today })
    }

    /// Return a book the student currently has on loan
    ///
    /// # Errors
    ///
    /// - `LibraryError::NoActiveBorrow` if the student has no open entry for the book
    /// - `LibraryError::Persistence` if the new state cannot be saved; the
    ///   in-memory change is rolled back
    pub fn return_book(&mut self, srn: &str, book_id: &str) -> LibraryResult<Confirmation> {
        let idx = self.document.history.latest_open(srn, book_id).ok_or_else(|| {
            LibraryError::NoActiveBorrow { srn: srn.to_string(), book_id: book_id.to_string() }
        })?;

        let today = self.clock.today();
        let duration_days = self.document.history.close(idx, today).unwrap_or_default();
        self.set_available(book_id, true);

        if let Err(e) = self.save() {
            warn!(srn, book_id, error = %e, "return not persisted, rolling back");
            self.document.history.reopen(idx);
            self.set_available(book_id, false);
            return Err(e);
        }

        self.notify(LedgerEvent::Returned, idx);

        let (title, on) = self
            .document
            .history
            .get(idx)
            .map(|entry| (entry.book_title.clone(), entry.return_date.unwrap_or(today)))
            .unwrap_or_default();
        Ok(Confirmation::Returned { book_id: book_id.to_string(), title, on, duration_days })
    }

    /// All entries for a student, open or closed, in append order
    #[must_use]
    pub fn history_for(&self, srn: &str) -> Vec<&LedgerEntry> {
        self.document.history.for_student(srn)
    }

    /// The student's loans that have not been returned yet
    #[must_use]
    pub fn open_loans(&self, srn: &str) -> Vec<&LedgerEntry> {
        let mut loans = self.document.history.for_student(srn);
        loans.retain(|entry| entry.is_open());
        loans
    }

    /// Flip a book's availability flag
    fn set_available(&mut self, book_id: &str, available: bool) {
        if let Some(book) = self.document.books.get_mut(book_id) {
            book.available = available;
        }
    }

    /// Tell every observer about the entry at `idx`
    fn notify(&self, event: LedgerEvent, idx: usize) {
        if let Some(entry) = self.document.history.get(idx) {
            for observer in &self.observers {
                observer.on_ledger_change(event, entry);
            }
        }
    }
}

// Include tests module
#[cfg(test)]
mod tests;
