//! Library catalog with a borrow/return ledger.
//!
//! This crate provides a catalog store that authenticates students and an
//! administrator, records every borrow and return in an append-only ledger
//! persisted as one JSON document, and derives borrowing activity reports
//! from that ledger.

pub mod catalog;
pub mod clock;
pub mod config;
pub mod console;
pub mod error;
pub mod events;
pub mod ledger;
pub mod observers;
pub mod persistence;
pub mod reporting;
pub mod system;
pub mod visualization;

pub use catalog::{AdminAccount, Book, BookListing, Session, Student};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use console::Console;
pub use error::{LibraryError, LibraryResult};
pub use events::LedgerEvent;
pub use ledger::{Ledger, LedgerEntry};
pub use persistence::LibraryDocument;
pub use reporting::StudentBookMatrix;
pub use system::{CatalogStore, Confirmation};
pub use visualization::{ReportKind, ReportRenderer};
