use clap::ValueEnum;

use crate::{
    ledger::LedgerEntry,
    reporting::{self, StudentBookMatrix},
};

/// Widest bar drawn by the bar charts
const BAR_WIDTH: usize = 40;

/// Shading used by the heatmap, from empty to busiest
const HEAT_SHADES: [char; 5] = [' ', '.', ':', '*', '#'];

/// Notice printed instead of a chart when nothing has been borrowed
pub const NO_DATA: &str = "No borrowing data available!";

/// Notice printed when no loan has been returned yet
pub const NO_DURATIONS: &str = "No completed borrows with duration data!";

/// The admin reports, in dashboard order
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportKind {
    /// Borrows per genre
    Genres,
    /// Most borrowed titles
    TopBooks,
    /// Borrows per day
    Frequency,
    /// Student x title heatmap
    Matrix,
    /// Borrows per month
    Monthly,
    /// Students ranked by borrows
    Ranking,
    /// Genre share of all borrows
    GenrePie,
    /// Average loan length per title
    Durations,
    /// Every report above in order
    Dashboard,
}

impl ReportKind {
    /// The individual reports in the order the dashboard shows them
    pub const ALL: [Self; 8] = [
        Self::Genres,
        Self::TopBooks,
        Self::Frequency,
        Self::Matrix,
        Self::Monthly,
        Self::Ranking,
        Self::GenrePie,
        Self::Durations,
    ];

    /// Heading shown above the report
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Genres => "Genre Analysis",
            Self::TopBooks => "Most Borrowed Books",
            Self::Frequency => "Borrowing Frequency",
            Self::Matrix => "Student-Book Matrix",
            Self::Monthly => "Monthly Trends",
            Self::Ranking => "Student Ranking",
            Self::GenrePie => "Popular Genres",
            Self::Durations => "Duration Analysis",
            Self::Dashboard => "Admin Analytics Dashboard",
        }
    }
}

/// Text rendering of ledger reports
#[derive(Debug)]
pub struct ReportRenderer;

impl ReportRenderer {
    /// Render one report over a ledger snapshot
    #[must_use]
    pub fn render(kind: ReportKind, entries: &[LedgerEntry], top_n: usize) -> String {
        if kind == ReportKind::Dashboard {
            return Self::dashboard(entries, top_n);
        }
        if entries.is_empty() {
            return format!("{NO_DATA}\n");
        }

        match kind {
            ReportKind::Genres => Self::bar_chart(
                "Books Borrowed by Genre",
                &as_values(reporting::genre_counts(entries)),
                "borrows",
            ),
            ReportKind::TopBooks => Self::bar_chart(
                &format!("Top {top_n} Most Borrowed Books"),
                &as_values(reporting::top_books(entries, top_n)),
                "borrows",
            ),
            ReportKind::Frequency => Self::frequency(entries),
            ReportKind::Matrix => Self::heatmap(&StudentBookMatrix::from_entries(entries)),
            ReportKind::Monthly => Self::bar_chart(
                "Monthly Borrowing Trends",
                &as_values(reporting::monthly_counts(entries).into_iter().collect()),
                "borrows",
            ),
            ReportKind::Ranking => Self::ranking(&reporting::student_counts(entries)),
            ReportKind::GenrePie => Self::pie(&reporting::genre_shares(entries)),
            ReportKind::Durations => {
                let averages = reporting::average_duration_by_title(entries);
                if averages.is_empty() {
                    format!("{NO_DURATIONS}\n")
                } else {
                    Self::bar_chart("Average Borrowing Duration by Book", &averages, "days")
                }
            }
            ReportKind::Dashboard => Self::dashboard(entries, top_n),
        }
    }

    /// Every report, numbered, in dashboard order
    #[must_use]
    #[allow(clippy::arithmetic_side_effects)]
    pub fn dashboard(entries: &[LedgerEntry], top_n: usize) -> String {
        let mut out = String::new();
        out.push_str(&"=".repeat(50));
        out.push_str("\nADMIN ANALYTICS DASHBOARD\n");
        out.push_str(&"=".repeat(50));
        out.push('\n');

        for (i, kind) in ReportKind::ALL.iter().enumerate() {
            out.push_str(&format!("\n{}. {}\n", i + 1, kind.title()));
            out.push_str(&Self::render(*kind, entries, top_n));
        }
        out
    }

    /// Horizontal bars scaled so the largest value fills `BAR_WIDTH`
    #[must_use]
    pub fn bar_chart(title: &str, rows: &[(String, f64)], unit: &str) -> String {
        let mut out = format!("=== {title} ===\n");
        let label_width = rows.iter().map(|(label, _)| label.chars().count()).max().unwrap_or(0);
        let max = rows.iter().map(|(_, value)| *value).fold(0.0_f64, f64::max);

        for (label, value) in rows {
            let bar = "#".repeat(bar_len(*value, max));
            out.push_str(&format!("{label:<label_width$} | {bar} {} {unit}\n", format_value(*value)));
        }
        out
    }

    /// Student ranking with `#n` position labels
    #[must_use]
    #[allow(clippy::arithmetic_side_effects)]
    fn ranking(counts: &[(String, usize)]) -> String {
        let mut out = String::from("=== Student Borrowing Ranking ===\n");
        let label_width = counts.iter().map(|(name, _)| name.chars().count()).max().unwrap_or(0);
        let max = counts.iter().map(|(_, count)| *count).max().unwrap_or(0);

        for (i, (name, count)) in counts.iter().enumerate() {
            let bar = "#".repeat(bar_len(to_f64(*count), to_f64(max)));
            out.push_str(&format!("{name:<label_width$} | {bar} {count} #{}\n", i + 1));
        }
        out
    }

    /// Borrows per day as a dated series
    fn frequency(entries: &[LedgerEntry]) -> String {
        let daily = reporting::daily_counts(entries);
        let max = daily.values().copied().max().unwrap_or(0);
        let mut out = String::from("=== Borrowing Frequency Over Time ===\n");

        for (date, count) in &daily {
            let bar = "o".repeat(bar_len(to_f64(*count), to_f64(max)));
            out.push_str(&format!("{date} | {bar} {count}\n"));
        }
        out
    }

    /// Student x title grid with counts and shading
    #[must_use]
    pub fn heatmap(matrix: &StudentBookMatrix) -> String {
        if matrix.is_empty() {
            return format!("{NO_DATA}\n");
        }

        let name_width = matrix.students().iter().map(|s| s.chars().count()).max().unwrap_or(0);
        let mut out = String::from("=== Student-Book Borrowing Matrix ===\n");

        out.push_str(&format!("{:name_width$}", ""));
        for (i, _) in matrix.titles().iter().enumerate() {
            out.push_str(&format!(" | T{:<3}", i.saturating_add(1)));
        }
        out.push('\n');

        for student in matrix.students() {
            out.push_str(&format!("{student:<name_width$}"));
            for count in matrix.row(student) {
                let shade = shade_for(count, matrix.max_count());
                out.push_str(&format!(" | {count:>2}{shade} "));
            }
            out.push('\n');
        }

        out.push_str("\nTitles:\n");
        for (i, title) in matrix.titles().iter().enumerate() {
            out.push_str(&format!("  T{} = {title}\n", i.saturating_add(1)));
        }
        out
    }

    /// Genre shares as percentage rows
    fn pie(shares: &[(String, f64)]) -> String {
        let mut out = String::from("=== Most Popular Genres ===\n");
        let label_width = shares.iter().map(|(genre, _)| genre.chars().count()).max().unwrap_or(0);

        for (genre, pct) in shares {
            let wedge = "@".repeat(bar_len(*pct, 100.0));
            out.push_str(&format!("{genre:<label_width$} {pct:>5.1}% {wedge}\n"));
        }
        out
    }

    /// Generate a markdown table of a student's history
    #[must_use]
    #[allow(clippy::arithmetic_side_effects)]
    pub fn history_table(entries: &[&LedgerEntry]) -> String {
        if entries.is_empty() {
            return "No borrowing history found!".to_string();
        }

        let mut table =
            String::from("| # | Book ID | Title | Genre | Borrowed | Returned | Days |\n");
        table.push_str("|---|---------|-------|-------|----------|----------|------|\n");

        for (i, entry) in entries.iter().enumerate() {
            table.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} | {} |\n",
                i + 1,
                entry.book_id,
                entry.book_title,
                entry.genre,
                entry.borrow_date,
                entry.return_date.map_or_else(|| "-".to_string(), |d| d.to_string()),
                entry.duration.map_or_else(|| "-".to_string(), |d| d.to_string()),
            ));
        }

        table
    }
}

/// Convert counts into chart values
fn as_values(counts: Vec<(String, usize)>) -> Vec<(String, f64)> {
    counts.into_iter().map(|(label, count)| (label, to_f64(count))).collect()
}

/// Lossy count conversion for chart scaling
#[allow(clippy::cast_precision_loss)]
fn to_f64(count: usize) -> f64 {
    count as f64
}

/// Bar length for `value` on a scale where `max` fills `BAR_WIDTH`
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn bar_len(value: f64, max: f64) -> usize {
    if max <= 0.0 || value <= 0.0 {
        return 0;
    }
    let len = (value / max * BAR_WIDTH as f64).round() as usize;
    len.clamp(1, BAR_WIDTH)
}

/// Whole numbers without decimals, averages with one
fn format_value(value: f64) -> String {
    if value.fract() == 0.0 { format!("{value:.0}") } else { format!("{value:.1}") }
}

/// Heatmap shade for a cell
#[allow(clippy::arithmetic_side_effects, clippy::integer_division)]
fn shade_for(count: usize, max: usize) -> char {
    if count == 0 || max == 0 {
        return ' ';
    }
    let top = HEAT_SHADES.len() - 1;
    let level = (count * top).div_ceil(max).clamp(1, top);
    HEAT_SHADES.get(level).copied().unwrap_or('#')
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::catalog::{Book, Student};

    /// An open entry dated in early 2025
    fn borrowed(name: &str, title: &str, genre: &str, d: u32) -> LedgerEntry {
        let date = NaiveDate::from_ymd_opt(2025, 1, d).unwrap_or_default();
        LedgerEntry::open(name, &Student::new(name, "pw"), title, &Book::new(title, genre), date)
    }

    /// A small ledger with two genres and one repeat borrower
    fn sample() -> Vec<LedgerEntry> {
        vec![
            borrowed("Alice", "Sapiens", "History", 1),
            borrowed("Bob", "1984", "Fiction", 2),
            borrowed("Alice", "The Alchemist", "Fiction", 2),
        ]
    }

    #[test]
    fn test_every_report_handles_empty_ledger() {
        for kind in ReportKind::ALL {
            assert_eq!(ReportRenderer::render(kind, &[], 10), format!("{NO_DATA}\n"));
        }
        assert!(ReportRenderer::render(ReportKind::Dashboard, &[], 10).contains("8. Duration Analysis"));
    }

    #[test]
    fn test_bar_chart_scales_to_largest() {
        let chart = ReportRenderer::render(ReportKind::Genres, &sample(), 10);
        let lines: Vec<&str> = chart.lines().collect();

        assert_eq!(lines.first(), Some(&"=== Books Borrowed by Genre ==="));
        assert!(lines.get(1).is_some_and(|l| l.starts_with("Fiction |") && l.contains(&"#".repeat(40))));
        assert!(lines.get(2).is_some_and(|l| l.contains(&"#".repeat(20)) && l.ends_with("1 borrows")));
    }

    #[test]
    fn test_ranking_numbers_students() {
        let chart = ReportRenderer::render(ReportKind::Ranking, &sample(), 10);
        assert!(chart.contains("Alice | "));
        assert!(chart.lines().nth(1).is_some_and(|l| l.ends_with("2 #1")));
        assert!(chart.lines().nth(2).is_some_and(|l| l.ends_with("1 #2")));
    }

    #[test]
    fn test_durations_need_returned_entries() {
        let chart = ReportRenderer::render(ReportKind::Durations, &sample(), 10);
        assert_eq!(chart, format!("{NO_DURATIONS}\n"));
    }

    #[test]
    fn test_heatmap_lists_titles() {
        let chart = ReportRenderer::render(ReportKind::Matrix, &sample(), 10);
        assert!(chart.contains("T1 = 1984"));
        assert!(chart.contains("T3 = The Alchemist"));
        assert!(chart.lines().any(|l| l.starts_with("Bob  ") && l.contains(" 1# ")));
    }

    #[test]
    fn test_history_table() {
        let entries = sample();
        let refs: Vec<&LedgerEntry> = entries.iter().collect();
        let table = ReportRenderer::history_table(&refs);

        assert!(table.contains("| 1 | Sapiens | Sapiens | History | 2025-01-01 | - | - |"));
        assert_eq!(ReportRenderer::history_table(&[]), "No borrowing history found!");
    }
}
