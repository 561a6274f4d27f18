use tracing::info;

use crate::{events::LedgerEvent, ledger::LedgerEntry};

/// Trait for ledger change observation
pub trait LedgerObserver {
    /// Called after a borrow or return has been persisted
    fn on_ledger_change(&self, event: LedgerEvent, entry: &LedgerEntry);
}

/// Logs every persisted ledger change
#[derive(Debug)]
pub struct ActivityLogger;

impl LedgerObserver for ActivityLogger {
    fn on_ledger_change(&self, event: LedgerEvent, entry: &LedgerEntry) {
        match event {
            LedgerEvent::Borrowed => info!(
                srn = %entry.srn,
                book_id = %entry.book_id,
                date = %entry.borrow_date,
                "book {event}: {}",
                entry.book_title
            ),
            LedgerEvent::Returned => info!(
                srn = %entry.srn,
                book_id = %entry.book_id,
                days = entry.duration.unwrap_or_default(),
                "book {event}: {}",
                entry.book_title
            ),
        }
    }
}
