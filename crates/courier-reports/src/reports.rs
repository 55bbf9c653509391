//! Report generation (LaTeX documents per report kind)

use std::fmt::Write as _;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::aggregate::{
    add_amounts, group_by_month, group_refs_by_month, merge_by_month, merchant_totals, sum_amounts,
    CategoryTotals, MasterTotals, MonthKey, MonthSummary,
};
use crate::constants;
use crate::dispatch::ReportError;
use crate::expenses::{classify, partition, Category};
use crate::latex::{self, Layout, Preamble};
use crate::records::{ExpenseRecord, TripRecord};

/// Report kinds the engine can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    MasterSummary,
    BusinessExpenses,
    ItemizedExpenses,
    MonthlyReport,
}

/// Static metadata for one report kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportDefinition {
    pub kind: ReportKind,
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub filename: &'static str,
}

/// Every registered report, in menu order
pub const REPORTS: [ReportDefinition; 4] = [
    ReportDefinition {
        kind: ReportKind::MasterSummary,
        id: "master-summary",
        title: "Master Summary",
        description: "Executive summary of trips, earnings, expenses, and net profit",
        filename: constants::MASTER_SUMMARY_FILENAME,
    },
    ReportDefinition {
        kind: ReportKind::BusinessExpenses,
        id: "business-expenses",
        title: "Business Expenses",
        description: "Deductible business expenses by month for tax documentation",
        filename: constants::BUSINESS_EXPENSES_FILENAME,
    },
    ReportDefinition {
        kind: ReportKind::ItemizedExpenses,
        id: "itemized-expenses",
        title: "Itemized Expenses",
        description: "Every expense by month, tagged by category, with category totals",
        filename: constants::ITEMIZED_EXPENSES_FILENAME,
    },
    ReportDefinition {
        kind: ReportKind::MonthlyReport,
        id: "monthly-report",
        title: "Monthly Performance",
        description: "Trips, earnings, expenses, and net profit for each month",
        filename: constants::MONTHLY_REPORT_FILENAME,
    },
];

/// Formats one report kind
pub type Formatter = fn(&ReportData<'_>, &ReportSettings) -> String;

impl ReportKind {
    pub const ALL: [ReportKind; 4] = [
        ReportKind::MasterSummary,
        ReportKind::BusinessExpenses,
        ReportKind::ItemizedExpenses,
        ReportKind::MonthlyReport,
    ];

    pub fn definition(self) -> &'static ReportDefinition {
        match self {
            ReportKind::MasterSummary => &REPORTS[0],
            ReportKind::BusinessExpenses => &REPORTS[1],
            ReportKind::ItemizedExpenses => &REPORTS[2],
            ReportKind::MonthlyReport => &REPORTS[3],
        }
    }

    pub fn id(self) -> &'static str {
        self.definition().id
    }

    /// Valid ids, for error messages
    pub fn ids() -> Vec<&'static str> {
        ReportKind::ALL.iter().map(|k| k.id()).collect()
    }

    pub fn formatter(self) -> Formatter {
        match self {
            ReportKind::MasterSummary => master_summary,
            ReportKind::BusinessExpenses => business_expenses,
            ReportKind::ItemizedExpenses => itemized_expenses,
            ReportKind::MonthlyReport => monthly_report,
        }
    }
}

impl FromStr for ReportKind {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReportKind::ALL
            .into_iter()
            .find(|k| k.id() == s.trim())
            .ok_or_else(|| ReportError::UnsupportedReportKind {
                requested: s.to_string(),
                available: ReportKind::ids(),
            })
    }
}

impl std::fmt::Display for ReportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Bundled report inputs
pub struct ReportData<'a> {
    pub trips: &'a [TripRecord],
    pub expenses: &'a [ExpenseRecord],
}

/// Presentation settings that don't come from records
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSettings {
    /// Company name in titles and headers
    pub business_name: String,
    /// Author line for detail reports (defaults to the business name)
    pub author: String,
    /// Date printed as "Generated"
    pub generated_on: NaiveDate,
}

impl ReportSettings {
    pub fn new(business_name: impl Into<String>, generated_on: NaiveDate) -> Self {
        let business_name = business_name.into();
        Self {
            author: business_name.clone(),
            business_name,
            generated_on,
        }
    }
}

// =============================================================================
// Master Summary
// =============================================================================

/// Executive summary of the whole snapshot
pub fn master_summary(data: &ReportData<'_>, settings: &ReportSettings) -> String {
    let totals = MasterTotals::compute(data.trips, data.expenses);
    let categories = &totals.categories;
    let all = categories.total();
    let merchants = merchant_totals(data.expenses);

    let header = format!("{} - Financial Summary", settings.business_name);
    let mut out = Preamble {
        header: &header,
        title: format!(
            "\\textcolor{{titleblue}}{{\\textbf{{\\LARGE {}}}\\\\[0.3cm]\\Large Financial Reconciliation Report}}",
            latex::escape(&settings.business_name)
        ),
        author: "",
        date_line: format!("Generated: {}", latex::long_date(settings.generated_on)),
        layout: Layout::Portrait,
    }
    .render();

    out.push_str("\\section*{Executive Summary}\n\n");
    out.push_str(
        "This financial reconciliation report summarizes all recorded trips, earnings, and expenses.\n\n",
    );
    out.push_str("\\subsection*{Key Metrics}\n\n");
    latex::metric_table(
        &mut out,
        &[
            ("Total Trips", totals.trip_count.to_string()),
            ("Gross Earnings", latex::money(totals.total_earnings)),
            ("Average per Trip", latex::average(totals.average_per_trip())),
            ("Business Expenses", latex::money(categories.business.amount)),
            (
                "Customer Purchases (informational)",
                latex::money(categories.customer_purchase.amount),
            ),
            ("Net Business Profit", latex::money(totals.net_business_profit())),
            ("Personal Spending", latex::money(categories.personal.amount)),
            ("Net After Withdrawals", latex::money(totals.net_after_withdrawals())),
        ],
    );
    out.push_str("\\vspace{1cm}\n\n");

    out.push_str("\\section*{Expense Analysis}\n\n");
    latex::metric_table(
        &mut out,
        &[
            ("Total Transactions", all.count.to_string()),
            ("Total Amount", latex::money(all.amount)),
            ("Average per Transaction", latex::average(totals.average_per_transaction())),
            ("Uncategorized Expenses", latex::money(categories.uncategorized.amount)),
            ("Unique Merchants", merchants.len().to_string()),
        ],
    );
    out.push_str(
        "Customer purchases are reimbursable and are not deducted from profit. \
         Uncategorized expenses are listed for review and are not deducted either.\n\n",
    );

    out.push_str("\\subsection*{Most Visited Merchants}\n\n");
    if merchants.is_empty() {
        out.push_str("\\textit{No merchants recorded.}\n\n");
    } else {
        out.push_str("\\begin{tabular}{lrr}\n");
        out.push_str("\\toprule\n");
        out.push_str("\\textbf{Merchant} & \\textbf{Visits} & \\textbf{Total Spent} \\\\\n");
        out.push_str("\\midrule\n");
        for merchant in merchants.iter().take(constants::TOP_MERCHANTS) {
            let _ = writeln!(
                out,
                "{} & {}x & {} \\\\",
                latex::description_cell(&merchant.name),
                merchant.visits,
                latex::money(merchant.amount)
            );
        }
        out.push_str("\\bottomrule\n");
        out.push_str("\\end{tabular}\n\n");
    }
    out.push_str("\\vspace{1cm}\n\n");

    out.push_str("\\centerline{\\textcolor{titleblue}{\\textbf{---  END OF SUMMARY  ---}}}\n\n");
    out.push_str("\\vspace{0.5cm}\n\n");
    out.push_str(
        "\\centerline{\\textit{This is a master summary document. See individual reports for detailed analysis.}}\n\n",
    );

    latex::end_document(&mut out);
    out
}

// =============================================================================
// Business Expenses
// =============================================================================

/// Business-category expenses only, month by month
pub fn business_expenses(data: &ReportData<'_>, settings: &ReportSettings) -> String {
    let split = partition(data.expenses);
    let business = split.get(Category::Business);
    let grand_total = sum_amounts(business.iter().copied(), |e| e.amount);
    let generated = latex::long_date(settings.generated_on);

    let mut out = Preamble {
        header: "Business Expenses Report",
        title: "\\textcolor{titleblue}{\\textbf{Business Expense Report}}".to_string(),
        author: &settings.author,
        date_line: generated.clone(),
        layout: Layout::Portrait,
    }
    .render();

    out.push_str("\\section*{Summary}\n");
    out.push_str("\\begin{itemize}\n");
    let _ = writeln!(
        out,
        "    \\item \\textbf{{Total Business Expenses:}} {}",
        latex::money(grand_total)
    );
    let _ = writeln!(out, "    \\item \\textbf{{Total Transactions:}} {}", business.len());
    let _ = writeln!(out, "    \\item \\textbf{{Generated:}} {}", generated);
    out.push_str("\\end{itemize}\n\n");
    out.push_str(
        "\\textit{Only expenses categorized as business are listed. Personal spending and customer purchases are excluded.}\n\n",
    );

    if business.is_empty() {
        out.push_str("\\textit{No business expenses recorded.}\n\n");
        latex::end_document(&mut out);
        return out;
    }
    out.push_str("\\newpage\n\n");

    for group in group_refs_by_month(business.iter().copied(), |e| e.posted_date) {
        let month_total = sum_amounts(group.records.iter().copied(), |e| e.amount);
        let _ = writeln!(out, "\\section*{{{}}}", latex::month_heading(&group.key));
        let _ = writeln!(
            out,
            "\\textit{{Total: {} ({} transactions)}}\n",
            latex::money(month_total),
            group.records.len()
        );

        latex::begin_longtable(&mut out, "llr", &["Date", "Description", "Amount"]);
        for expense in &group.records {
            let _ = writeln!(
                out,
                "{} & {} & {} \\\\",
                latex::date_cell(expense.posted_date),
                latex::description_cell(&expense.description),
                latex::money(expense.amount)
            );
        }
        latex::end_longtable_with_total(&mut out, "Month Total", 3, month_total);
        out.push_str("\\newpage\n\n");
    }

    latex::end_document(&mut out);
    out
}

// =============================================================================
// Itemized Expenses
// =============================================================================

/// Every expense, month by month, with each row tagged by category
pub fn itemized_expenses(data: &ReportData<'_>, settings: &ReportSettings) -> String {
    let totals = CategoryTotals::from_expenses(data.expenses);
    let all = totals.total();
    let generated = latex::long_date(settings.generated_on);

    let mut out = Preamble {
        header: "Itemized Expenses Report",
        title: "\\textcolor{titleblue}{\\textbf{Itemized Expense Report}}".to_string(),
        author: &settings.author,
        date_line: generated.clone(),
        layout: Layout::Landscape,
    }
    .render();

    out.push_str("\\section*{Summary}\n");
    out.push_str("\\begin{itemize}\n");
    let _ = writeln!(out, "    \\item \\textbf{{Total Spending:}} {}", latex::money(all.amount));
    let _ = writeln!(out, "    \\item \\textbf{{Total Transactions:}} {}", all.count);
    let _ = writeln!(out, "    \\item \\textbf{{Generated:}} {}", generated);
    out.push_str("\\end{itemize}\n\n");

    out.push_str("\\subsection*{Category Totals}\n\n");
    out.push_str("\\begin{tabular}{lrrr}\n");
    out.push_str("\\toprule\n");
    out.push_str(
        "\\textbf{Category} & \\textbf{Amount} & \\textbf{\\% of Total} & \\textbf{Transactions} \\\\\n",
    );
    out.push_str("\\midrule\n");
    for category in Category::ALL {
        let total = totals.get(category);
        let _ = writeln!(
            out,
            "{} & {} & {} & {} \\\\",
            latex::category_cell(category),
            latex::money(total.amount),
            latex::percent(total.amount, all.amount),
            total.count
        );
    }
    out.push_str("\\midrule\n");
    let _ = writeln!(
        out,
        "\\textbf{{Grand Total}} & \\textbf{{{}}} & \\textbf{{{}}} & \\textbf{{{}}} \\\\",
        latex::money(all.amount),
        if all.count == 0 { "0\\%" } else { "100\\%" },
        all.count
    );
    out.push_str("\\bottomrule\n");
    out.push_str("\\end{tabular}\n\n");

    if data.expenses.is_empty() {
        out.push_str("\\textit{No expenses recorded.}\n\n");
        latex::end_document(&mut out);
        return out;
    }
    out.push_str("\\newpage\n\n");

    for group in group_by_month(data.expenses, |e| e.posted_date) {
        let month_total = sum_amounts(group.records.iter().copied(), |e| e.amount);
        let _ = writeln!(out, "\\section*{{{}}}", latex::month_heading(&group.key));
        let _ = writeln!(
            out,
            "\\textit{{Total: {} ({} transactions)}}\n",
            latex::money(month_total),
            group.records.len()
        );

        latex::begin_longtable(&mut out, "lllr", &["Date", "Description", "Category", "Amount"]);
        for expense in &group.records {
            let _ = writeln!(
                out,
                "{} & {} & {} & {} \\\\",
                latex::date_cell(expense.posted_date),
                latex::description_cell(&expense.description),
                latex::category_cell(classify(expense)),
                latex::money(expense.amount)
            );
        }
        latex::end_longtable_with_total(&mut out, "Month Total", 4, month_total);
        out.push_str("\\newpage\n\n");
    }

    category_trends(&mut out, data.expenses);

    latex::end_document(&mut out);
    out
}

/// Category totals for each month, largest category first
fn category_trends(out: &mut String, expenses: &[ExpenseRecord]) {
    out.push_str("\\section*{Category Totals by Month}\n\n");

    for group in group_by_month(expenses, |e| e.posted_date) {
        let totals = CategoryTotals::from_expenses(group.records.iter().copied());
        let month = totals.total();
        let mut rows: Vec<_> = Category::ALL
            .into_iter()
            .map(|category| (category, totals.get(category)))
            .filter(|(_, total)| total.count > 0)
            .collect();
        rows.sort_by(|a, b| b.1.amount.cmp(&a.1.amount));

        let _ = writeln!(out, "\\subsection*{{{}}}\n", latex::month_heading(&group.key));
        out.push_str("\\begin{tabular}{lrr}\n");
        out.push_str("\\toprule\n");
        out.push_str(
            "\\textbf{Category} & \\textbf{Transactions} & \\textbf{Total} \\\\\n",
        );
        out.push_str("\\midrule\n");
        for (category, total) in rows {
            let _ = writeln!(
                out,
                "{} & {} & {} \\\\",
                latex::category_cell(category),
                total.count,
                latex::money(total.amount)
            );
        }
        out.push_str("\\midrule\n");
        let _ = writeln!(
            out,
            "\\textbf{{Month Total}} & {} & \\textbf{{{}}} \\\\",
            month.count,
            latex::money(month.amount)
        );
        out.push_str("\\bottomrule\n");
        out.push_str("\\end{tabular}\n\n");
        out.push_str("\\vspace{0.5cm}\n\n");
    }
}

// =============================================================================
// Monthly Report
// =============================================================================

fn month_rows(summary: &MonthSummary) -> [(&'static str, String); 5] {
    [
        ("Trips Completed", summary.trip_count.to_string()),
        ("Total Earnings", latex::money(summary.earnings)),
        ("Total Expenses", latex::money(summary.expenses)),
        ("Net Profit", latex::money(summary.net_profit())),
        ("Avg per Trip", latex::average(summary.average_per_trip())),
    ]
}

/// Per-month performance over trips and expenses
pub fn monthly_report(data: &ReportData<'_>, settings: &ReportSettings) -> String {
    let months: Vec<MonthSummary> = merge_by_month(data.trips, data.expenses)
        .iter()
        .map(MonthSummary::from_bucket)
        .collect();

    let mut out = Preamble {
        header: "Monthly Performance Report",
        title: "\\textcolor{titleblue}{\\textbf{Monthly Performance Report}}".to_string(),
        author: &settings.author,
        date_line: latex::long_date(settings.generated_on),
        layout: Layout::Portrait,
    }
    .render();

    out.push_str("\\section*{Monthly Breakdown}\n\n");

    if months.is_empty() {
        out.push_str("\\textit{No trips or expenses recorded.}\n\n");
        latex::end_document(&mut out);
        return out;
    }

    for summary in &months {
        let _ = writeln!(out, "\\subsection*{{{}}}\n", latex::month_heading(&summary.key));
        latex::metric_table(&mut out, &month_rows(summary));
        out.push_str("\\vspace{0.5cm}\n\n");
    }

    let period = MonthSummary::combine(MonthKey::Undated, &months);
    out.push_str("\\section*{Period Totals}\n\n");
    let _ = writeln!(out, "\\textit{{{} months}}\n", months.len());
    latex::metric_table(&mut out, &month_rows(&period));

    latex::end_document(&mut out);
    out
}

/// Net of a set of months, used by the console summary
pub fn period_net(months: &[MonthSummary]) -> Decimal {
    months
        .iter()
        .map(MonthSummary::net_profit)
        .fold(Decimal::ZERO, add_amounts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn settings() -> ReportSettings {
        ReportSettings::new("JTech Logistics", ymd(2026, 1, 28))
    }

    fn trip(fare: i64, date: NaiveDate) -> TripRecord {
        TripRecord {
            id: None,
            pickup_time: None,
            drop_off_time: date.and_hms_opt(18, 0, 0),
            fare_amount: Decimal::new(fare, 0),
            distance_miles: Decimal::ZERO,
            pickup_location: String::new(),
            dropoff_location: String::new(),
            status: "completed".to_string(),
        }
    }

    fn expense(amount: i64, date: NaiveDate, category: &str, description: &str) -> ExpenseRecord {
        ExpenseRecord {
            id: None,
            posted_date: Some(date),
            description: description.to_string(),
            amount: Decimal::new(amount, 0),
            category: Some(category.to_string()),
            merchant: String::new(),
        }
    }

    fn august_trips() -> Vec<TripRecord> {
        vec![trip(30, ymd(2025, 8, 20)), trip(20, ymd(2025, 8, 15))]
    }

    #[test]
    fn test_parse_report_kind() {
        for kind in ReportKind::ALL {
            assert_eq!(kind.id().parse::<ReportKind>().unwrap(), kind);
        }
        assert_eq!(
            " monthly-report ".parse::<ReportKind>().unwrap(),
            ReportKind::MonthlyReport
        );
    }

    #[test]
    fn test_parse_unknown_kind_lists_valid_ids() {
        let err = "nonexistent".parse::<ReportKind>().unwrap_err();
        match err {
            ReportError::UnsupportedReportKind { requested, available } => {
                assert_eq!(requested, "nonexistent");
                assert_eq!(
                    available,
                    [
                        "master-summary",
                        "business-expenses",
                        "itemized-expenses",
                        "monthly-report"
                    ]
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_definitions_match_kinds() {
        for kind in ReportKind::ALL {
            assert_eq!(kind.definition().kind, kind);
            assert!(kind.definition().filename.ends_with(".tex"));
        }
        assert_eq!(ReportKind::MonthlyReport.definition().filename, "monthly_report.tex");
    }

    #[test]
    fn test_monthly_report_example() {
        let trips = august_trips();
        let expenses = vec![expense(5, ymd(2025, 8, 10), "business", "Charging")];
        let doc = monthly_report(
            &ReportData {
                trips: &trips,
                expenses: &expenses,
            },
            &settings(),
        );

        assert!(doc.contains("\\subsection*{August 2025}"));
        assert!(doc.contains("Trips Completed & 2 \\\\"));
        assert!(doc.contains("Total Earnings & \\$50.00 \\\\"));
        assert!(doc.contains("Total Expenses & \\$5.00 \\\\"));
        assert!(doc.contains("Net Profit & \\$45.00 \\\\"));
        assert!(doc.contains("Avg per Trip & \\$25.00 \\\\"));
        assert!(doc.ends_with("\\end{document}\n"));
    }

    #[test]
    fn test_monthly_report_one_sided_months() {
        let trips = vec![trip(40, ymd(2025, 9, 3))];
        let expenses = vec![expense(12, ymd(2025, 10, 1), "personal", "Lunch")];
        let doc = monthly_report(
            &ReportData {
                trips: &trips,
                expenses: &expenses,
            },
            &settings(),
        );

        let september = doc.find("\\subsection*{September 2025}").unwrap();
        let october = doc.find("\\subsection*{October 2025}").unwrap();
        assert!(september < october);

        let october_section = &doc[october..];
        assert!(october_section.contains("Trips Completed & 0 \\\\"));
        assert!(october_section.contains("Total Earnings & \\$0.00 \\\\"));
        assert!(october_section.contains("Avg per Trip & \\$0.00 \\\\"));

        let september_section = &doc[september..october];
        assert!(september_section.contains("Total Expenses & \\$0.00 \\\\"));
        assert!(!doc.contains("NaN"));
    }

    #[test]
    fn test_monthly_report_period_totals() {
        let trips = vec![trip(40, ymd(2025, 9, 3)), trip(20, ymd(2025, 8, 3))];
        let expenses = vec![expense(10, ymd(2025, 8, 1), "business", "Fuel")];
        let doc = monthly_report(
            &ReportData {
                trips: &trips,
                expenses: &expenses,
            },
            &settings(),
        );

        let totals = &doc[doc.find("\\section*{Period Totals}").unwrap()..];
        assert!(totals.contains("\\textit{2 months}"));
        assert!(totals.contains("Total Earnings & \\$60.00 \\\\"));
        assert!(totals.contains("Net Profit & \\$50.00 \\\\"));
        assert!(totals.contains("Avg per Trip & \\$30.00 \\\\"));
    }

    #[test]
    fn test_master_summary_example() {
        let trips = august_trips();
        let expenses = vec![
            expense(5, ymd(2025, 8, 10), "business", "Charging"),
            expense(10, ymd(2025, 8, 11), "personal", "Dinner"),
            expense(42, ymd(2025, 8, 12), "customer_purchase", "Groceries for customer"),
        ];
        let doc = master_summary(
            &ReportData {
                trips: &trips,
                expenses: &expenses,
            },
            &settings(),
        );

        assert!(doc.contains("Total Trips & 2 \\\\"));
        assert!(doc.contains("Gross Earnings & \\$50.00 \\\\"));
        assert!(doc.contains("Average per Trip & \\$25.00 \\\\"));
        assert!(doc.contains("Business Expenses & \\$5.00 \\\\"));
        assert!(doc.contains("Customer Purchases (informational) & \\$42.00 \\\\"));
        assert!(doc.contains("Net Business Profit & \\$45.00 \\\\"));
        assert!(doc.contains("Personal Spending & \\$10.00 \\\\"));
        assert!(doc.contains("Net After Withdrawals & \\$35.00 \\\\"));
        assert!(doc.contains("Generated: January 28, 2026"));
        // No per-record listing
        assert!(!doc.contains("Groceries for customer"));
    }

    #[test]
    fn test_master_summary_without_records() {
        let doc = master_summary(
            &ReportData {
                trips: &[],
                expenses: &[],
            },
            &settings(),
        );

        assert!(doc.contains("Average per Trip & \\$0.00 \\\\"));
        assert!(doc.contains("Average per Transaction & \\$0.00 \\\\"));
        assert!(!doc.contains("NaN"));
    }

    #[test]
    fn test_business_expenses_filters_category() {
        let expenses = vec![
            expense(15, ymd(2025, 9, 2), "business", "EV charging"),
            expense(99, ymd(2025, 9, 1), "personal", "Concert tickets"),
            expense(5, ymd(2025, 8, 10), "business", "Parking"),
            expense(30, ymd(2025, 8, 9), "customer_purchase", "Customer order"),
        ];
        let doc = business_expenses(
            &ReportData {
                trips: &[],
                expenses: &expenses,
            },
            &settings(),
        );

        assert!(doc.contains("EV charging"));
        assert!(doc.contains("Parking"));
        assert!(!doc.contains("Concert tickets"));
        assert!(!doc.contains("Customer order"));
        assert!(doc.contains("\\textbf{Total Business Expenses:} \\$20.00"));
        assert!(doc.contains("\\textbf{Total Transactions:} 2"));

        let september = doc.find("\\section*{September 2025}").unwrap();
        let august = doc.find("\\section*{August 2025}").unwrap();
        assert!(september < august);
        assert!(doc.contains("09/02 & EV charging & \\$15.00 \\\\"));
        assert!(doc.contains("\\textbf{Month Total} & & \\textbf{\\$5.00} \\\\"));
    }

    #[test]
    fn test_business_expenses_empty() {
        let expenses = vec![expense(99, ymd(2025, 9, 1), "personal", "Concert tickets")];
        let doc = business_expenses(
            &ReportData {
                trips: &[],
                expenses: &expenses,
            },
            &settings(),
        );

        assert!(doc.contains("No business expenses recorded."));
        assert!(!doc.contains("\\begin{longtable}"));
    }

    #[test]
    fn test_itemized_expenses_category_totals_and_rows() {
        let expenses = vec![
            expense(10, ymd(2025, 8, 20), "business", "Tolls & fees"),
            expense(30, ymd(2025, 8, 15), "personal", "Snack_bar #7"),
            ExpenseRecord {
                category: None,
                ..expense(60, ymd(2025, 7, 2), "", "Mystery")
            },
        ];
        let doc = itemized_expenses(
            &ReportData {
                trips: &[],
                expenses: &expenses,
            },
            &settings(),
        );

        assert!(doc.contains("\\usepackage[margin=0.75in,landscape]{geometry}"));
        assert!(doc.contains(
            "\\textcolor{businessgreen}{Business} & \\$10.00 & 10\\% & 1 \\\\"
        ));
        assert!(doc.contains(
            "\\textcolor{financialgray}{Uncategorized} & \\$60.00 & 60\\% & 1 \\\\"
        ));
        assert!(doc.contains(
            "\\textbf{Grand Total} & \\textbf{\\$100.00} & \\textbf{100\\%} & \\textbf{3} \\\\"
        ));

        // Category totals precede the month tables
        let totals = doc.find("\\subsection*{Category Totals}").unwrap();
        let first_month = doc.find("\\section*{August 2025}").unwrap();
        assert!(totals < first_month);

        assert!(doc.contains(
            "08/20 & Tolls \\& fees & \\textcolor{businessgreen}{Business} & \\$10.00 \\\\"
        ));
        assert!(doc.contains(
            "08/15 & Snack\\_bar \\#7 & \\textcolor{personalblue}{Personal} & \\$30.00 \\\\"
        ));
        assert!(doc.contains("\\section*{July 2025}"));
        assert!(doc.contains("\\textbf{Month Total} & & & \\textbf{\\$40.00} \\\\"));
    }

    #[test]
    fn test_formatters_are_deterministic() {
        let trips = august_trips();
        let expenses = vec![
            expense(5, ymd(2025, 8, 10), "business", "Charging"),
            expense(8, ymd(2025, 7, 10), "personal", "Coffee"),
        ];
        let data = ReportData {
            trips: &trips,
            expenses: &expenses,
        };

        for kind in ReportKind::ALL {
            let first = (kind.formatter())(&data, &settings());
            let second = (kind.formatter())(&data, &settings());
            assert_eq!(first, second, "{} output changed between runs", kind);
        }
    }

    #[test]
    fn test_period_net() {
        let trips = august_trips();
        let expenses = vec![expense(5, ymd(2025, 8, 10), "business", "Charging")];
        let months: Vec<_> = merge_by_month(&trips, &expenses)
            .iter()
            .map(MonthSummary::from_bucket)
            .collect();
        assert_eq!(period_net(&months), Decimal::new(45, 0));
    }

    #[test]
    fn test_master_summary_merchants() {
        let at = |merchant: &str, amount: i64| ExpenseRecord {
            merchant: merchant.to_string(),
            ..expense(amount, ymd(2025, 8, 10), "business", "Stop")
        };
        let mut expenses = vec![
            at("Shell", 40),
            at("Tom & Jerry's", 12),
            at("Shell", 35),
            at("", 9),
        ];
        // Only the top merchants are listed
        for n in 0..constants::TOP_MERCHANTS {
            expenses.push(at(&format!("Kiosk {n:02}"), 1));
        }
        let doc = master_summary(
            &ReportData {
                trips: &[],
                expenses: &expenses,
            },
            &settings(),
        );

        let unique = constants::TOP_MERCHANTS + 2;
        assert!(doc.contains(&format!("Unique Merchants & {unique} \\\\")));
        let table = &doc[doc.find("\\subsection*{Most Visited Merchants}").unwrap()..];
        assert!(table.contains("Shell & 2x & \\$75.00 \\\\"));
        assert!(table.contains("Tom \\& Jerry's & 1x & \\$12.00 \\\\"));
        assert!(table.find("Shell").unwrap() < table.find("Tom").unwrap());
        assert!(table.contains("Kiosk 07"));
        assert!(!table.contains("Kiosk 08"));
    }

    #[test]
    fn test_master_summary_without_merchants() {
        let expenses = vec![expense(5, ymd(2025, 8, 10), "business", "Charging")];
        let doc = master_summary(
            &ReportData {
                trips: &[],
                expenses: &expenses,
            },
            &settings(),
        );

        assert!(doc.contains("Unique Merchants & 0 \\\\"));
        assert!(doc.contains("No merchants recorded."));
    }

    #[test]
    fn test_itemized_expenses_category_trends() {
        let expenses = vec![
            expense(10, ymd(2025, 8, 20), "business", "Tolls"),
            expense(30, ymd(2025, 8, 15), "personal", "Dinner"),
            expense(5, ymd(2025, 8, 14), "business", "Parking"),
            expense(60, ymd(2025, 7, 2), "customer_purchase", "Order"),
        ];
        let doc = itemized_expenses(
            &ReportData {
                trips: &[],
                expenses: &expenses,
            },
            &settings(),
        );

        let trends = &doc[doc.find("\\section*{Category Totals by Month}").unwrap()..];
        let august = trends.find("\\subsection*{August 2025}").unwrap();
        let july = trends.find("\\subsection*{July 2025}").unwrap();
        assert!(august < july);

        // Largest category first, empty categories omitted
        let august_table = &trends[august..july];
        let personal = august_table
            .find("\\textcolor{personalblue}{Personal} & 1 & \\$30.00 \\\\")
            .unwrap();
        let business = august_table
            .find("\\textcolor{businessgreen}{Business} & 2 & \\$15.00 \\\\")
            .unwrap();
        assert!(personal < business);
        assert!(!august_table.contains("Customer Purchase"));
        assert!(august_table.contains("\\textbf{Month Total} & 3 & \\textbf{\\$45.00} \\\\"));
        assert!(trends[july..].contains("\\textbf{Month Total} & 1 & \\textbf{\\$60.00} \\\\"));
    }

    #[test]
    fn test_extreme_amounts_render_without_panicking() {
        let trips = vec![
            TripRecord {
                fare_amount: Decimal::MAX,
                ..trip(0, ymd(2025, 8, 20))
            },
            TripRecord {
                fare_amount: Decimal::MAX,
                ..trip(0, ymd(2025, 8, 21))
            },
        ];
        let expenses = vec![
            ExpenseRecord {
                amount: Decimal::MAX,
                ..expense(0, ymd(2025, 8, 10), "business", "Huge")
            },
            ExpenseRecord {
                amount: Decimal::MIN,
                ..expense(0, ymd(2025, 8, 11), "personal", "Refund")
            },
            expense(3, ymd(2025, 8, 12), "personal", "Coffee"),
        ];
        let data = ReportData {
            trips: &trips,
            expenses: &expenses,
        };

        for kind in ReportKind::ALL {
            let doc = (kind.formatter())(&data, &settings());
            assert!(doc.ends_with("\\end{document}\n"), "{} truncated", kind);
        }
    }

    #[test]
    fn test_multiline_description_stays_on_one_row() {
        let expenses = vec![expense(7, ymd(2025, 8, 3), "business", "Fuel\n\nstop\tnorth")];
        let doc = itemized_expenses(
            &ReportData {
                trips: &[],
                expenses: &expenses,
            },
            &settings(),
        );

        assert!(doc.contains(
            "08/03 & Fuel  stop north & \\textcolor{businessgreen}{Business} & \\$7.00 \\\\\n"
        ));
    }
}
