//! LaTeX building blocks shared by every report
//!
//! Free text never reaches a document without going through [`escape`].

use std::fmt::Write as _;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::aggregate::{DivideByZero, MonthKey};
use crate::constants;
use crate::expenses::Category;

/// Escape characters that LaTeX would otherwise interpret
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' | '_' | '#' | '%' | '$' | '{' | '}' => {
                out.push('\\');
                out.push(c);
            }
            '\\' => out.push_str("\\textbackslash{}"),
            '~' => out.push_str("\\textasciitilde{}"),
            '^' => out.push_str("\\textasciicircum{}"),
            // A blank line would end the paragraph mid-row
            c if c.is_control() => out.push(' '),
            _ => out.push(c),
        }
    }
    out
}

/// Truncate to the display limit, then escape
pub fn description_cell(text: &str) -> String {
    let truncated: String = text.chars().take(constants::DESCRIPTION_MAX_CHARS).collect();
    escape(&truncated)
}

/// Round to cents and drop the sign of a zero result
fn cents(value: Decimal) -> Decimal {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    if rounded.is_zero() {
        Decimal::ZERO
    } else {
        rounded
    }
}

/// Plain two-decimal amount, e.g. `1234.50`
pub fn amount(value: Decimal) -> String {
    format!("{:.2}", cents(value))
}

/// Currency cell, e.g. `\$1234.50`
pub fn money(value: Decimal) -> String {
    format!("\\${}", amount(value))
}

/// Currency cell for an average, `\$0.00` when nothing was averaged
pub fn average(value: Result<Decimal, DivideByZero>) -> String {
    money(value.unwrap_or_else(|DivideByZero| {
        tracing::debug!("average over zero records rendered as 0.00");
        Decimal::ZERO
    }))
}

/// Share of a total at integer precision, e.g. `42\%`
pub fn percent(part: Decimal, whole: Decimal) -> String {
    if whole.is_zero() {
        return "0\\%".to_string();
    }
    let Some(share) = part
        .checked_div(whole)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
    else {
        tracing::warn!(%part, %whole, "share out of range");
        return "--\\%".to_string();
    };
    let share = share.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let share = if share.is_zero() { Decimal::ZERO } else { share };
    format!("{}\\%", share.trunc())
}

/// `MM/DD` date cell
pub fn date_cell(date: Option<NaiveDate>) -> String {
    match date {
        Some(d) => d.format("%m/%d").to_string(),
        None => constants::UNDATED_CELL.to_string(),
    }
}

/// Section heading for a month, e.g. `August 2025`
pub fn month_heading(key: &MonthKey) -> String {
    escape(&key.label())
}

/// Color name used for a category's rows
pub fn category_color(category: Category) -> &'static str {
    match category {
        Category::Business => "businessgreen",
        Category::Personal => "personalblue",
        Category::CustomerPurchase => "customerorange",
        Category::Uncategorized => "financialgray",
    }
}

/// Category label colored for a table cell
pub fn category_cell(category: Category) -> String {
    format!("\\textcolor{{{}}}{{{}}}", category_color(category), category)
}

// =============================================================================
// Document Structure
// =============================================================================

/// Page geometry for a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Portrait,
    /// Wide tables (itemized listings)
    Landscape,
}

/// Document preamble through `\maketitle`
pub struct Preamble<'a> {
    /// Running header text
    pub header: &'a str,
    /// Title block; may contain markup
    pub title: String,
    pub author: &'a str,
    pub date_line: String,
    pub layout: Layout,
}

impl Preamble<'_> {
    pub fn render(&self) -> String {
        let geometry = match self.layout {
            Layout::Portrait => "margin=1in",
            Layout::Landscape => "margin=0.75in,landscape",
        };

        let mut out = String::new();
        out.push_str("\\documentclass[11pt,letterpaper]{article}\n");
        out.push_str("\\usepackage[utf8]{inputenc}\n");
        out.push_str("\\usepackage[T1]{fontenc}\n");
        let _ = writeln!(out, "\\usepackage[{}]{{geometry}}", geometry);
        out.push_str("\\usepackage{longtable}\n");
        out.push_str("\\usepackage{booktabs}\n");
        out.push_str("\\usepackage{xcolor}\n");
        out.push_str("\\usepackage{fancyhdr}\n\n");

        out.push_str("\\definecolor{titleblue}{RGB}{102,126,234}\n");
        out.push_str("\\definecolor{successgreen}{RGB}{76,175,80}\n");
        out.push_str("\\definecolor{businessgreen}{RGB}{46,125,50}\n");
        out.push_str("\\definecolor{personalblue}{RGB}{25,118,210}\n");
        out.push_str("\\definecolor{customerorange}{RGB}{255,152,0}\n");
        out.push_str("\\definecolor{financialgray}{RGB}{117,117,117}\n\n");

        out.push_str("\\pagestyle{fancy}\n");
        out.push_str("\\fancyhf{}\n");
        let _ = writeln!(
            out,
            "\\fancyhead[L]{{\\small\\textcolor{{titleblue}}{{{}}}}}",
            escape(self.header)
        );
        out.push_str("\\fancyhead[R]{\\small\\thepage}\n");
        out.push_str("\\renewcommand{\\headrulewidth}{0.5pt}\n\n");

        let _ = writeln!(out, "\\title{{{}}}", self.title);
        let _ = writeln!(out, "\\author{{{}}}", escape(self.author));
        let _ = writeln!(out, "\\date{{{}}}\n", self.date_line);

        out.push_str("\\begin{document}\n\n");
        out.push_str("\\maketitle\n\n");
        out
    }
}

/// Close the document
pub fn end_document(out: &mut String) {
    out.push_str("\\end{document}\n");
}

/// Long date used in title blocks, e.g. `January 28, 2026`
pub fn long_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// Two-column Metric/Value table
pub fn metric_table(out: &mut String, rows: &[(&str, String)]) {
    out.push_str("\\begin{tabular}{ll}\n");
    out.push_str("\\toprule\n");
    out.push_str("\\textbf{Metric} & \\textbf{Value} \\\\\n");
    out.push_str("\\midrule\n");
    for (metric, value) in rows {
        let _ = writeln!(out, "{} & {} \\\\", metric, value);
    }
    out.push_str("\\bottomrule\n");
    out.push_str("\\end{tabular}\n\n");
}

/// Open a `longtable` whose header repeats on every page
pub fn begin_longtable(out: &mut String, columns: &str, headers: &[&str]) {
    let header_row = headers
        .iter()
        .map(|h| format!("\\textbf{{{}}}", h))
        .collect::<Vec<_>>()
        .join(" & ");

    let _ = writeln!(out, "\\begin{{longtable}}{{{}}}", columns);
    out.push_str("\\toprule\n");
    let _ = writeln!(out, "{} \\\\", header_row);
    out.push_str("\\midrule\n");
    out.push_str("\\endfirsthead\n");
    let _ = writeln!(
        out,
        "\\multicolumn{{{}}}{{c}}{{{{\\tablename\\ \\thetable{{}} -- continued from previous page}}}} \\\\",
        headers.len()
    );
    out.push_str("\\toprule\n");
    let _ = writeln!(out, "{} \\\\", header_row);
    out.push_str("\\midrule\n");
    out.push_str("\\endhead\n");
    out.push_str("\\bottomrule\n");
    out.push_str("\\endfoot\n");
    out.push_str("\\bottomrule\n");
    out.push_str("\\endlastfoot\n\n");
}

/// Bold total row followed by `\end{longtable}`
pub fn end_longtable_with_total(out: &mut String, label: &str, columns: usize, total: Decimal) {
    let padding = " &".repeat(columns.saturating_sub(2));
    out.push_str("\\midrule\n");
    let _ = writeln!(
        out,
        "\\textbf{{{}}} &{} \\textbf{{{}}} \\\\",
        label,
        padding,
        money(total)
    );
    out.push_str("\\end{longtable}\n");
}
