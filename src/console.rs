//! Interactive menus over any line-oriented input and output.

use std::io::{BufRead, Write};

use colored::Colorize;

use crate::{
    catalog::Session,
    error::{LibraryError, LibraryResult},
    system::{CatalogStore, Confirmation},
    visualization::{ReportKind, ReportRenderer},
};

/// Width of the menu banners
const BANNER_WIDTH: usize = 40;

/// Width of the book listing rules
const LISTING_WIDTH: usize = 70;

/// Admin menu choices after "View All Books", in menu order
const ADMIN_REPORTS: [ReportKind; 9] = [
    ReportKind::Genres,
    ReportKind::TopBooks,
    ReportKind::Frequency,
    ReportKind::Matrix,
    ReportKind::Monthly,
    ReportKind::Ranking,
    ReportKind::GenrePie,
    ReportKind::Durations,
    ReportKind::Dashboard,
];

/// Menu-driven session over a catalog store
#[derive(Debug)]
pub struct Console<'s, R, W> {
    /// The store every action goes through
    store: &'s mut CatalogStore,
    /// Where answers are read from
    input: R,
    /// Where menus and results are written
    output: W,
    /// Length of the most-borrowed ranking
    top_n: usize,
}

impl<'s, R: BufRead, W: Write> Console<'s, R, W> {
    /// Create a console over `store`
    pub fn new(store: &'s mut CatalogStore, input: R, output: W, top_n: usize) -> Self {
        Self { store, input, output, top_n }
    }

    /// Run the main menu until the user exits or input ends
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::Io` if the terminal cannot be read or written;
    /// domain errors are shown to the user and never returned
    pub fn run(&mut self) -> LibraryResult<()> {
        loop {
            self.banner("LIBRARY MANAGEMENT SYSTEM")?;
            writeln!(self.output, "1. Student Login")?;
            writeln!(self.output, "2. Admin Login")?;
            writeln!(self.output, "3. Exit")?;

            let Some(choice) = self.prompt("\nEnter choice: ")? else { break };
            match choice.as_str() {
                "1" => {
                    if !self.student_login()? {
                        break;
                    }
                }
                "2" => {
                    if !self.admin_login()? {
                        break;
                    }
                }
                "3" => break,
                _ => self.error_line("Invalid choice!")?,
            }
        }

        writeln!(self.output, "{}", "Thank you for using the Library System!".green())?;
        Ok(())
    }

    /// Prompt for a student login and run the student menu; false once input ends
    fn student_login(&mut self) -> LibraryResult<bool> {
        let Some(srn) = self.prompt("Enter SRN: ")? else { return Ok(false) };
        let Some(password) = self.prompt_secret("Enter Password: ")? else { return Ok(false) };
        let srn = srn.to_uppercase();

        match self.store.login_student(&srn, &password) {
            Ok(Session::Student(srn)) => {
                let name = self.store.student_name(&srn).unwrap_or(&srn).to_string();
                writeln!(self.output, "\n{}", format!("Welcome, {name}!").green().bold())?;
                self.student_menu(&srn, &name)
            }
            Ok(Session::Admin) => Ok(true),
            Err(e) => self.recover(e).map(|()| true),
        }
    }

    /// Prompt for the admin credential and run the admin menu; false once input ends
    fn admin_login(&mut self) -> LibraryResult<bool> {
        let Some(username) = self.prompt("Enter Admin Username: ")? else { return Ok(false) };
        let Some(password) = self.prompt_secret("Enter Admin Password: ")? else {
            return Ok(false);
        };

        match self.store.login_admin(&username, &password) {
            Ok(_) => {
                writeln!(self.output, "\n{}", "Admin access granted!".green().bold())?;
                self.admin_menu()
            }
            Err(e) => self.recover(e).map(|()| true),
        }
    }

    /// Student actions; false once input ends
    fn student_menu(&mut self, srn: &str, name: &str) -> LibraryResult<bool> {
        loop {
            self.banner(&format!("STUDENT MENU - {name}"))?;
            writeln!(self.output, "1. View Available Books (by Genre)")?;
            writeln!(self.output, "2. Borrow Book")?;
            writeln!(self.output, "3. Return Book")?;
            writeln!(self.output, "4. View My Borrowing History")?;
            writeln!(self.output, "5. Logout")?;

            let Some(choice) = self.prompt("\nEnter choice: ")? else { return Ok(false) };
            match choice.as_str() {
                "1" => self.show_books_by_genre(true)?,
                "2" => {
                    let Some(book_id) = self.prompt("Enter Book ID to borrow: ")? else {
                        return Ok(false);
                    };
                    let outcome = self.store.borrow(srn, &book_id.to_uppercase());
                    self.confirm(outcome)?;
                }
                "3" => {
                    let Some(book_id) = self.prompt("Enter Book ID to return: ")? else {
                        return Ok(false);
                    };
                    let outcome = self.store.return_book(srn, &book_id.to_uppercase());
                    self.confirm(outcome)?;
                }
                "4" => {
                    let history = self.store.history_for(srn);
                    let table = ReportRenderer::history_table(&history);
                    if !history.is_empty() {
                        writeln!(self.output, "\n--- Your Borrowing History ---")?;
                    }
                    writeln!(self.output, "{table}")?;
                }
                "5" => {
                    writeln!(self.output, "Logging out...")?;
                    return Ok(true);
                }
                _ => self.error_line("Invalid choice!")?,
            }
        }
    }

    /// Admin actions; false once input ends
    #[allow(clippy::arithmetic_side_effects)]
    fn admin_menu(&mut self) -> LibraryResult<bool> {
        let logout = ADMIN_REPORTS.len() + 2;
        loop {
            self.banner("ADMIN MENU")?;
            writeln!(self.output, "1. View All Books (by Genre)")?;
            for (i, kind) in ADMIN_REPORTS.iter().enumerate() {
                writeln!(self.output, "{}. {}", i + 2, kind.title())?;
            }
            writeln!(self.output, "{logout}. Logout")?;

            let Some(choice) = self.prompt("\nEnter choice: ")? else { return Ok(false) };
            match choice.parse::<usize>() {
                Ok(1) => self.show_books_by_genre(false)?,
                Ok(n) if n == logout => {
                    writeln!(self.output, "Logging out...")?;
                    return Ok(true);
                }
                Ok(n) if n >= 2 => match ADMIN_REPORTS.get(n - 2) {
                    Some(kind) => self.report(*kind)?,
                    None => self.error_line("Invalid choice!")?,
                },
                _ => self.error_line("Invalid choice!")?,
            }
        }
    }

    /// Print one report over the current ledger
    fn report(&mut self, kind: ReportKind) -> LibraryResult<()> {
        let chart = ReportRenderer::render(kind, self.store.ledger().entries(), self.top_n);
        writeln!(self.output, "\n{}", kind.title().bold())?;
        write!(self.output, "{chart}")?;
        Ok(())
    }

    /// Print the catalog grouped by genre
    fn show_books_by_genre(&mut self, available_only: bool) -> LibraryResult<()> {
        let rule = "=".repeat(LISTING_WIDTH);
        let heading = if available_only { "AVAILABLE BOOKS BY GENRE" } else { "ALL BOOKS BY GENRE" };
        writeln!(self.output, "\n{rule}\n{heading}\n{rule}")?;

        let grouped = self.store.books_by_genre(available_only);
        if grouped.is_empty() {
            writeln!(self.output, "\nNo books available at the moment.")?;
            return Ok(());
        }

        for (genre, listings) in &grouped {
            writeln!(self.output, "\n📚 {}", genre.to_uppercase().bold())?;
            writeln!(self.output, "{}", "-".repeat(LISTING_WIDTH))?;
            for listing in listings {
                let status = if listing.book.available {
                    format!("✓ {}", listing.book.status_label()).green()
                } else {
                    format!("✗ {}", listing.book.status_label()).red()
                };
                writeln!(self.output, "  [{}] {:<40} {status}", listing.id, listing.book.title)?;
            }
        }
        writeln!(self.output, "\n{rule}")?;
        Ok(())
    }

    /// Show the outcome of a borrow or return
    fn confirm(&mut self, outcome: LibraryResult<Confirmation>) -> LibraryResult<()> {
        match outcome {
            Ok(confirmation) => {
                writeln!(self.output, "{}", confirmation.to_string().green())?;
                Ok(())
            }
            Err(e) => self.recover(e),
        }
    }

    /// Show a user-facing error, or propagate anything else
    fn recover(&mut self, error: LibraryError) -> LibraryResult<()> {
        if error.is_user_facing() {
            self.error_line(&error.to_string())
        } else {
            Err(error)
        }
    }

    /// Print an error message
    fn error_line(&mut self, message: &str) -> LibraryResult<()> {
        writeln!(self.output, "{}", message.red())?;
        Ok(())
    }

    /// Print a menu banner
    fn banner(&mut self, title: &str) -> LibraryResult<()> {
        let rule = "=".repeat(BANNER_WIDTH);
        writeln!(self.output, "\n{rule}\n{}\n{rule}", title.bold())?;
        Ok(())
    }

    /// Ask for one trimmed line; `None` when input is exhausted
    fn prompt(&mut self, label: &str) -> LibraryResult<Option<String>> {
        Ok(self.read_answer(label)?.map(|line| line.trim().to_string()))
    }

    /// Ask for a secret, keeping everything but the line terminator
    fn prompt_secret(&mut self, label: &str) -> LibraryResult<Option<String>> {
        Ok(self.read_answer(label)?.map(|line| line.trim_end_matches(['\r', '\n']).to_string()))
    }

    /// Write `label` and read the raw answer line
    fn read_answer(&mut self, label: &str) -> LibraryResult<Option<String>> {
        write!(self.output, "{label}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use chrono::NaiveDate;
    use tempfile::TempDir;

    use super::*;
    use crate::clock::FixedClock;

    /// Run a scripted session against a fresh seeded store
    #[allow(clippy::expect_used)]
    fn run_script(script: &str) -> (String, CatalogStore, TempDir) {
        let dir = TempDir::new().expect("temp dir");
        let clock = FixedClock::new(NaiveDate::from_ymd_opt(2025, 4, 1).unwrap_or_default());
        let mut store =
            CatalogStore::open(dir.path().join("library_db.json"), clock).expect("store opens");

        let mut output = Vec::new();
        Console::new(&mut store, Cursor::new(script.to_string()), &mut output, 10)
            .run()
            .expect("session runs");

        (String::from_utf8_lossy(&output).into_owned(), store, dir)
    }

    #[test]
    fn test_student_borrows_and_returns() {
        let (out, store, _dir) =
            run_script("1\nr25eh017\npass123\n2\nb003\n3\nB003\n4\n5\n3\n");

        assert!(out.contains("Welcome, Anish Kumar!"));
        assert!(out.contains("Successfully borrowed 'The Great Gatsby'"));
        assert!(out.contains("Successfully returned 'The Great Gatsby' after 0 day(s)"));
        assert!(out.contains("--- Your Borrowing History ---"));
        assert!(out.contains("Thank you for using the Library System!"));
        assert_eq!(store.ledger().len(), 1);
        assert_eq!(store.book("B003").map(|b| b.available), Some(true));
    }

    #[test]
    fn test_errors_are_shown_not_returned() {
        let (out, store, _dir) = run_script("1\nR25EH018\npass123\n2\nB999\n3\nB001\n9\n5\n1\nR25EH018\nbad\n3\n");

        assert!(out.contains("Book not found: B999"));
        assert!(out.contains("No active borrow record found for book B001"));
        assert!(out.contains("Invalid choice!"));
        assert!(out.contains("Invalid credentials!"));
        assert!(store.ledger().is_empty());
    }

    #[test]
    fn test_admin_reports_and_listing() {
        let (out, _store, _dir) = run_script("2\nadmin\nadmin123\n1\n2\n10\n11\n3\n");

        assert!(out.contains("Admin access granted!"));
        assert!(out.contains("ALL BOOKS BY GENRE"));
        assert!(out.contains("[B004] 1984"));
        assert!(out.contains("No borrowing data available!"));
        assert!(out.contains("ADMIN ANALYTICS DASHBOARD"));
        assert!(out.contains("Logging out..."));
    }

    #[test]
    fn test_password_whitespace_is_significant() {
        let (out, _store, _dir) = run_script(concat!(
            "1\nR25EH017\n pass123 \n",
            "2\nadmin\nadmin123\t\n",
            "1\nR25EH017\npass123\r\n5\n",
            "3\n"
        ));

        assert_eq!(out.matches("Invalid credentials!").count(), 2);
        assert!(out.contains("Welcome, Anish Kumar!"));
    }

    #[test]
    fn test_end_of_input_exits_cleanly() {
        let (out, _store, _dir) = run_script("1\nR25EH017\n");
        assert!(out.contains("Thank you for using the Library System!"));
    }
}
