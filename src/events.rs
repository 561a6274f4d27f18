use std::fmt;

use serde::{Deserialize, Serialize};

/// Ledger mutations that observers are told about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum LedgerEvent {
    /// A book left the library and a new entry was opened
    Borrowed,
    /// A book came back and its entry was closed
    Returned,
}

impl fmt::Display for LedgerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Borrowed => write!(f, "borrowed"),
            Self::Returned => write!(f, "returned"),
        }
    }
}
