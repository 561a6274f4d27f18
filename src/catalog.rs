use serde::{Deserialize, Serialize};

/// A book in the catalog; the identifier is its key in the catalog map
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Book {
    /// Display title
    pub title: String,
    /// Genre used for grouping and reporting
    pub genre: String,
    /// False while an open ledger entry exists for this book
    pub available: bool,
}

impl Book {
    /// Create an available book
    #[must_use]
    pub fn new(title: &str, genre: &str) -> Self {
        Self { title: title.to_string(), genre: genre.to_string(), available: true }
    }

    /// Get a human-readable availability label
    #[must_use]
    pub fn status_label(&self) -> &'static str {
        if self.available { "Available" } else { "Borrowed" }
    }
}

/// A registered student; the SRN is its key in the student map
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Student {
    /// Display name
    pub name: String,
    /// Plain-text login secret
    pub password: String,
}

impl Student {
    /// Create a student record
    #[must_use]
    pub fn new(name: &str, password: &str) -> Self {
        Self { name: name.to_string(), password: password.to_string() }
    }
}

/// The single administrator credential
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AdminAccount {
    /// Login name
    pub username: String,
    /// Plain-text login secret
    pub password: String,
}

/// A catalog book paired with its identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookListing<'a> {
    /// Catalog key
    pub id: &'a str,
    /// The book record
    pub book: &'a Book,
}

/// Who is logged in at the console
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    /// A student, by SRN
    Student(String),
    /// The administrator
    Admin,
}
