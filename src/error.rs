use thiserror::Error;

/// Errors raised by catalog, ledger and persistence operations
#[derive(Debug, Error)]
pub enum LibraryError {
    /// Login failed; never says whether the id or the secret was wrong
    #[error("Invalid credentials!")]
    InvalidCredentials,
    /// The book identifier is not in the catalog
    #[error("Book not found: {0}")]
    BookNotFound(String),
    /// The book is already on loan
    #[error("Book {0} is currently unavailable!")]
    BookUnavailable(String),
    /// No open ledger entry matches the student and book
    #[error("No active borrow record found for book {book_id} (student {srn})")]
    NoActiveBorrow {
        /// Student who attempted the return
        srn: String,
        /// Book the student tried to return
        book_id: String,
    },
    /// The SRN does not belong to a registered student
    #[error("Unknown student: {0}")]
    UnknownStudent(String),
    /// The persisted document could not be parsed or breaks a catalog invariant
    #[error("Malformed library state: {0}")]
    MalformedState(String),
    /// The document could not be serialized or written
    #[error("Persistence error: {0}")]
    Persistence(String),
    /// Console input or output failed
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl LibraryError {
    /// Whether the error is a recoverable, user-facing outcome of a menu action
    #[must_use]
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials
                | Self::BookNotFound(_)
                | Self::BookUnavailable(_)
                | Self::NoActiveBorrow { .. }
                | Self::UnknownStudent(_)
                | Self::Persistence(_)
        )
    }
}

/// Result alias used throughout the crate
pub type LibraryResult<T> = Result<T, LibraryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_facing_split() {
        assert!(LibraryError::BookUnavailable("B001".to_string()).is_user_facing());
        assert!(LibraryError::InvalidCredentials.is_user_facing());
        assert!(!LibraryError::MalformedState("bad".to_string()).is_user_facing());
        assert!(!LibraryError::Io(std::io::Error::other("closed")).is_user_facing());
    }

    #[test]
    fn test_messages_name_the_book() {
        let err = LibraryError::NoActiveBorrow { srn: "S1".to_string(), book_id: "B001".to_string() };
        assert!(err.to_string().contains("B001"));
        assert_eq!(LibraryError::InvalidCredentials.to_string(), "Invalid credentials!");
    }
}
