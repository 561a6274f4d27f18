//! The on-disk library document and its load/save rules.

use std::{
    collections::{BTreeMap, BTreeSet},
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    catalog::{AdminAccount, Book, Student},
    error::{LibraryError, LibraryResult},
    ledger::Ledger,
};

/// The whole persisted state: credentials, catalog and ledger
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LibraryDocument {
    /// Registered students keyed by SRN
    pub students: BTreeMap<String, Student>,
    /// The administrator credential
    pub admin: AdminAccount,
    /// Catalog keyed by book identifier
    pub books: BTreeMap<String, Book>,
    /// Borrow ledger in append order
    #[serde(rename = "borrow_history", alias = "history", default)]
    pub history: Ledger,
}

impl LibraryDocument {
    /// The deterministic catalog written when no document exists yet
    #[must_use]
    pub fn seed() -> Self {
        let students = [
            ("R25EH017", "Anish Kumar"),
            ("R25EH018", "Anish Madhav"),
            ("R25EH032", "Chinmay"),
            ("R25EH052", "Edwin John"),
        ]
        .into_iter()
        .map(|(srn, name)| (srn.to_string(), Student::new(name, "pass123")))
        .collect();

        let books = [
            ("B001", "Python Programming", "Technology"),
            ("B002", "Data Science Handbook", "Technology"),
            ("B003", "The Great Gatsby", "Fiction"),
            ("B004", "1984", "Fiction"),
            ("B005", "Sapiens", "History"),
            ("B006", "Educated", "Biography"),
            ("B007", "Atomic Habits", "Self-Help"),
            ("B008", "The Alchemist", "Fiction"),
            ("B009", "Machine Learning Basics", "Technology"),
            ("B010", "Brief History of Time", "Science"),
        ]
        .into_iter()
        .map(|(id, title, genre)| (id.to_string(), Book::new(title, genre)))
        .collect();

        Self {
            students,
            admin: AdminAccount { username: "admin".to_string(), password: "admin123".to_string() },
            books,
            history: Ledger::default(),
        }
    }

    /// Check the cross-record invariants between the catalog and the ledger
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::MalformedState` if:
    /// - an entry has a return date without a duration or the reverse
    /// - a closed entry's duration disagrees with its dates
    /// - a book has more than one open entry
    /// - an open entry names a book missing from the catalog
    /// - a book's availability disagrees with its open entries
    pub fn validate(&self) -> LibraryResult<()> {
        let mut on_loan = BTreeSet::new();

        for (idx, entry) in self.history.iter().enumerate() {
            match (entry.return_date, entry.duration) {
                (None, None) => {
                    if !on_loan.insert(entry.book_id.as_str()) {
                        return Err(malformed(format!(
                            "book {} has more than one open entry (entry {idx})",
                            entry.book_id
                        )));
                    }
                }
                (Some(returned), Some(days)) => {
                    let expected = returned.signed_duration_since(entry.borrow_date).num_days();
                    if expected != i64::from(days) {
                        return Err(malformed(format!(
                            "entry {idx} records {days} days but its dates span {expected}"
                        )));
                    }
                }
                _ => {
                    return Err(malformed(format!(
                        "entry {idx} must set return_date and duration together"
                    )));
                }
            }
        }

        for book_id in &on_loan {
            if !self.books.contains_key(*book_id) {
                return Err(malformed(format!("open entry for unknown book {book_id}")));
            }
        }

        for (book_id, book) in &self.books {
            if book.available == on_loan.contains(book_id.as_str()) {
                return Err(malformed(format!(
                    "book {book_id} is marked available={} but {} an open entry",
                    book.available,
                    if book.available { "has" } else { "has no" }
                )));
            }
        }

        Ok(())
    }

    /// Serialize as pretty JSON with four-space indentation
    ///
    /// # Errors
    ///
    /// Returns a `LibraryError::Persistence` if serialization fails
    pub fn to_json(&self) -> LibraryResult<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut serializer)
            .map_err(|e| LibraryError::Persistence(format!("Failed to serialize: {e}")))?;

        String::from_utf8(buf)
            .map_err(|e| LibraryError::Persistence(format!("Serialized document is not UTF-8: {e}")))
    }

    /// Parse and validate a document
    ///
    /// # Errors
    ///
    /// Returns a `LibraryError::MalformedState` if the JSON does not match the
    /// document layout or breaks a catalog invariant
    pub fn from_json(contents: &str) -> LibraryResult<Self> {
        let document: Self = serde_json::from_str(contents)
            .map_err(|e| malformed(format!("Failed to parse JSON: {e}")))?;
        document.validate()?;
        Ok(document)
    }
}

/// Build a `MalformedState` error
fn malformed(msg: String) -> LibraryError {
    LibraryError::MalformedState(msg)
}

/// Load the document at `path`, seeding and persisting the default catalog
/// when the file does not exist
///
/// # Errors
///
/// Returns a `LibraryError::Persistence` if the file cannot be read or the
/// seed cannot be written, and `LibraryError::MalformedState` if the contents
/// are invalid
pub fn load_or_seed(path: &Path) -> LibraryResult<LibraryDocument> {
    if !path.exists() {
        info!(path = %path.display(), "no library document found, seeding default catalog");
        let document = LibraryDocument::seed();
        save(path, &document)?;
        return Ok(document);
    }

    debug!(path = %path.display(), "loading library document");
    let contents = fs::read_to_string(path)
        .map_err(|e| LibraryError::Persistence(format!("Failed to read {}: {e}", path.display())))?;

    LibraryDocument::from_json(&contents)
}

/// Write the whole document, replacing `path` atomically
///
/// # Errors
///
/// Returns a `LibraryError::Persistence` if:
/// - The document cannot be serialized
/// - The parent directory or temporary file cannot be created
/// - The temporary file cannot be renamed over `path`; the temporary file
///   is removed again
pub fn save(path: &Path, document: &LibraryDocument) -> LibraryResult<()> {
    let serialized = document.to_json()?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| {
                LibraryError::Persistence(format!("Failed to create {}: {e}", parent.display()))
            })?;
        }
    }

    let staging = staging_path(path);
    fs::write(&staging, serialized.as_bytes()).map_err(|e| {
        LibraryError::Persistence(format!("Failed to write {}: {e}", staging.display()))
    })?;
    if let Err(e) = fs::rename(&staging, path) {
        if let Err(cleanup) = fs::remove_file(&staging) {
            debug!(path = %staging.display(), error = %cleanup, "staging file not removed");
        }
        return Err(LibraryError::Persistence(format!(
            "Failed to replace {}: {e}",
            path.display()
        )));
    }

    debug!(path = %path.display(), entries = document.history.len(), "library document saved");
    Ok(())
}

/// Sibling path the document is staged at before the rename
fn staging_path(path: &Path) -> PathBuf {
    let mut staged: OsString = path.as_os_str().to_os_string();
    staged.push(".tmp");
    PathBuf::from(staged)
}
