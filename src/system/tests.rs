use std::{cell::RefCell, rc::Rc};

use chrono::NaiveDate;
use tempfile::TempDir;

use crate::{
    catalog::Session,
    clock::FixedClock,
    error::LibraryError,
    events::LedgerEvent,
    ledger::LedgerEntry,
    observers::LedgerObserver,
    persistence::LibraryDocument,
    system::{CatalogStore, Confirmation},
};

/// First day used by the fixed clock in these tests
fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 10).unwrap_or_default()
}

/// Helper function to set up a store over the seed catalog in a temp dir
#[allow(clippy::expect_used)]
fn setup_test_store() -> (TempDir, FixedClock, CatalogStore) {
    let dir = TempDir::new().expect("temp dir");
    let clock = FixedClock::new(start_date());
    let store = CatalogStore::open(dir.path().join("library_db.json"), clock.clone())
        .expect("seeded store should open");
    (dir, clock, store)
}

/// Records every change it is told about
#[derive(Debug, Default)]
struct RecordingObserver {
    /// Events seen so far, with the affected book
    seen: Rc<RefCell<Vec<(LedgerEvent, String)>>>,
}

impl LedgerObserver for RecordingObserver {
    fn on_ledger_change(&self, event: LedgerEvent, entry: &LedgerEntry) {
        self.seen.borrow_mut().push((event, entry.book_id.clone()));
    }
}

#[test]
fn test_open_seeds_and_persists() {
    let (dir, _clock, store) = setup_test_store();

    assert!(dir.path().join("library_db.json").exists());
    assert_eq!(store.list_books(false).len(), 10);
    assert!(store.ledger().is_empty());
}

#[test]
fn test_authentication() {
    let (_dir, _clock, store) = setup_test_store();

    assert!(store.authenticate_student("R25EH017", "pass123"));
    assert!(!store.authenticate_student("R25EH017", "wrong"));
    assert!(!store.authenticate_student("NOBODY", "pass123"));
    assert!(store.authenticate_admin("admin", "admin123"));
    assert!(!store.authenticate_admin("admin", "pass123"));

    assert_eq!(
        store.login_student("R25EH032", "pass123").ok(),
        Some(Session::Student("R25EH032".to_string()))
    );
    assert!(matches!(store.login_admin("root", "admin123"), Err(LibraryError::InvalidCredentials)));
    assert!(matches!(
        store.login_student("NOBODY", "pass123"),
        Err(LibraryError::InvalidCredentials)
    ));
}

#[test]
fn test_borrow_flips_availability_and_appends() {
    let (_dir, _clock, mut store) = setup_test_store();

    // Borrow the book
    let result = store.borrow("R25EH017", "B001");
    assert!(matches!(result, Ok(Confirmation::Borrowed { ref title, .. }) if title == "Python Programming"));

    assert_eq!(store.book("B001").map(|b| b.available), Some(false));
    assert_eq!(store.ledger().len(), 1);

    let entry = store.ledger().get(0);
    assert!(entry.is_some_and(|e| e.is_open() && e.borrow_date == start_date()));
    assert!(entry.is_some_and(|e| e.student_name == "Anish Kumar" && e.genre == "Technology"));
}

#[test]
fn test_failed_borrow_leaves_state_untouched() {
    let (_dir, _clock, mut store) = setup_test_store();
    drop(store.borrow("R25EH017", "B001"));
    let before = store.document().clone();

    // Unavailable book
    assert!(matches!(store.borrow("R25EH018", "B001"), Err(LibraryError::BookUnavailable(_))));
    // Unknown book
    assert!(matches!(store.borrow("R25EH018", "B999"), Err(LibraryError::BookNotFound(_))));
    // Unknown student
    assert!(matches!(store.borrow("NOBODY", "B002"), Err(LibraryError::UnknownStudent(_))));

    assert_eq!(store.document(), &before);
}

#[test]
fn test_return_sets_duration_and_frees_book() {
    let (_dir, clock, mut store) = setup_test_store();
    drop(store.borrow("R25EH017", "B005"));

    clock.advance_days(3);
    let result = store.return_book("R25EH017", "B005");

    assert!(matches!(result, Ok(Confirmation::Returned { duration_days: 3, .. })));
    assert_eq!(store.book("B005").map(|b| b.available), Some(true));

    let entry = store.ledger().get(0);
    assert!(entry.is_some_and(|e| e.duration == Some(3)));
    assert!(entry.is_some_and(|e| e.return_date == NaiveDate::from_ymd_opt(2025, 3, 13)));
}

#[test]
fn test_return_without_open_entry_fails() {
    let (_dir, _clock, mut store) = setup_test_store();

    // Nothing borrowed yet
    assert!(matches!(
        store.return_book("R25EH017", "B001"),
        Err(LibraryError::NoActiveBorrow { .. })
    ));

    // Someone else holds the book
    drop(store.borrow("R25EH017", "B001"));
    let before = store.document().clone();
    assert!(matches!(
        store.return_book("R25EH018", "B001"),
        Err(LibraryError::NoActiveBorrow { .. })
    ));
    assert_eq!(store.document(), &before);

    // Already closed
    drop(store.return_book("R25EH017", "B001"));
    assert!(matches!(
        store.return_book("R25EH017", "B001"),
        Err(LibraryError::NoActiveBorrow { .. })
    ));
}

#[test]
fn test_history_and_open_loans() {
    let (_dir, clock, mut store) = setup_test_store();
    drop(store.borrow("R25EH017", "B001"));
    drop(store.borrow("R25EH018", "B002"));
    clock.advance_days(1);
    drop(store.borrow("R25EH017", "B003"));
    drop(store.return_book("R25EH017", "B001"));

    let history: Vec<&str> =
        store.history_for("R25EH017").into_iter().map(|e| e.book_id.as_str()).collect();
    assert_eq!(history, vec!["B001", "B003"]);

    let open: Vec<&str> =
        store.open_loans("R25EH017").into_iter().map(|e| e.book_id.as_str()).collect();
    assert_eq!(open, vec!["B003"]);

    assert!(store.history_for("R25EH052").is_empty());
}

#[test]
fn test_list_books_orders_and_filters() {
    let (_dir, _clock, mut store) = setup_test_store();
    drop(store.borrow("R25EH017", "B002"));

    let ids: Vec<&str> = store.list_books(true).into_iter().map(|l| l.id).collect();
    assert_eq!(ids, vec!["B001", "B003", "B004", "B005", "B006", "B007", "B008", "B009", "B010"]);

    let grouped = store.books_by_genre(false);
    let genres: Vec<&str> = grouped.keys().copied().collect();
    assert_eq!(genres, vec!["Biography", "Fiction", "History", "Science", "Self-Help", "Technology"]);
    assert_eq!(grouped.get("Technology").map(Vec::len), Some(3));
    assert_eq!(store.books_by_genre(true).get("Technology").map(Vec::len), Some(2));
}

#[test]
fn test_mutations_are_persisted() {
    let (dir, clock, mut store) = setup_test_store();
    drop(store.borrow("R25EH032", "B004"));

    let reopened = CatalogStore::open(dir.path().join("library_db.json"), clock);
    assert!(reopened.is_ok_and(|r| r.document() == store.document()));
}

#[test]
#[allow(clippy::expect_used)]
fn test_failed_save_rolls_back() {
    let dir = TempDir::new().expect("temp dir");
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"file").expect("write blocker");

    let mut document = LibraryDocument::seed();
    let mut store = CatalogStore::with_document(
        blocker.join("library_db.json"),
        document.clone(),
        FixedClock::new(start_date()),
    );

    assert!(matches!(store.borrow("R25EH017", "B001"), Err(LibraryError::Persistence(_))));
    assert_eq!(store.document(), &document);

    // A return that cannot be saved must leave the loan open
    if let Some(book) = document.books.get_mut("B001") {
        book.available = false;
    }
    let student = document.students.get("R25EH017").cloned().expect("seed student");
    let book = document.books.get("B001").cloned().expect("seed book");
    document.history.append(LedgerEntry::open("R25EH017", &student, "B001", &book, start_date()));
    let mut store = CatalogStore::with_document(
        blocker.join("library_db.json"),
        document.clone(),
        FixedClock::new(start_date()),
    );

    assert!(matches!(store.return_book("R25EH017", "B001"), Err(LibraryError::Persistence(_))));
    assert_eq!(store.document(), &document);
}

#[test]
fn test_observers_see_persisted_changes_only() {
    let (_dir, _clock, mut store) = setup_test_store();
    let observer = RecordingObserver::default();
    let seen = Rc::clone(&observer.seen);
    store.register_observer(Box::new(observer));

    drop(store.borrow("R25EH017", "B007"));
    drop(store.borrow("R25EH018", "B007"));
    drop(store.return_book("R25EH017", "B007"));

    assert_eq!(
        *seen.borrow(),
        vec![(LedgerEvent::Borrowed, "B007".to_string()), (LedgerEvent::Returned, "B007".to_string())]
    );
}
