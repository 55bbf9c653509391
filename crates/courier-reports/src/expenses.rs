//! Expense categories, classification, and CSV import/export
//!
//! Every expense belongs to exactly one category. Stored labels that are
//! missing or unknown classify as `Uncategorized`.

use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::records::{coerce_amount, coerce_date, ExpenseRecord};

/// Expense category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Business,
    Personal,
    CustomerPurchase,
    Uncategorized,
}

impl Category {
    /// All categories in report order
    pub const ALL: [Category; 4] = [
        Category::Business,
        Category::Personal,
        Category::CustomerPurchase,
        Category::Uncategorized,
    ];

    /// Label persisted in the record store
    pub fn label(self) -> &'static str {
        match self {
            Category::Business => "business",
            Category::Personal => "personal",
            Category::CustomerPurchase => "customer_purchase",
            Category::Uncategorized => "uncategorized",
        }
    }

    /// Strict parse of a stored or user-supplied label
    ///
    /// Case, surrounding whitespace, and `-`/space separators are ignored.
    pub fn parse(raw: &str) -> Option<Category> {
        let normalized: String = raw
            .trim()
            .chars()
            .map(|c| if c == '-' || c == ' ' { '_' } else { c.to_ascii_lowercase() })
            .collect();

        match normalized.as_str() {
            "business" => Some(Category::Business),
            "personal" => Some(Category::Personal),
            "customer_purchase" => Some(Category::CustomerPurchase),
            "uncategorized" => Some(Category::Uncategorized),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Business => write!(f, "Business"),
            Category::Personal => write!(f, "Personal"),
            Category::CustomerPurchase => write!(f, "Customer Purchase"),
            Category::Uncategorized => write!(f, "Uncategorized"),
        }
    }
}

/// Assign an expense to its category
pub fn classify(expense: &ExpenseRecord) -> Category {
    match expense.category.as_deref().and_then(Category::parse) {
        Some(category) => category,
        None => Category::Uncategorized,
    }
}

/// Expenses split into their four disjoint categories
#[derive(Debug, Default)]
pub struct CategorySplit<'a> {
    pub business: Vec<&'a ExpenseRecord>,
    pub personal: Vec<&'a ExpenseRecord>,
    pub customer_purchase: Vec<&'a ExpenseRecord>,
    pub uncategorized: Vec<&'a ExpenseRecord>,
}

impl<'a> CategorySplit<'a> {
    pub fn get(&self, category: Category) -> &[&'a ExpenseRecord] {
        match category {
            Category::Business => &self.business,
            Category::Personal => &self.personal,
            Category::CustomerPurchase => &self.customer_purchase,
            Category::Uncategorized => &self.uncategorized,
        }
    }

    pub fn len(&self) -> usize {
        Category::ALL.iter().map(|c| self.get(*c).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Partition expenses by category, preserving input order within each part
pub fn partition(expenses: &[ExpenseRecord]) -> CategorySplit<'_> {
    let mut split = CategorySplit::default();
    for expense in expenses {
        let bucket = match classify(expense) {
            Category::Business => &mut split.business,
            Category::Personal => &mut split.personal,
            Category::CustomerPurchase => &mut split.customer_purchase,
            Category::Uncategorized => &mut split.uncategorized,
        };
        bucket.push(expense);
    }
    split
}

// =============================================================================
// CSV Import/Export
// =============================================================================

/// Expense row as it appears in CSV exports
#[derive(Debug, Serialize, Deserialize)]
struct ExpenseCsvRow {
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    amount: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    merchant: Option<String>,
}

/// Load expenses from a CSV file (for importing/migration)
pub fn load_from_csv(path: &Path) -> Result<Vec<ExpenseRecord>> {
    let mut rdr = csv::Reader::from_path(path)?;
    let mut expenses = Vec::new();
    for result in rdr.deserialize() {
        let row: ExpenseCsvRow = result?;
        expenses.push(ExpenseRecord {
            id: None, // CSV imports don't have IDs
            posted_date: coerce_date(row.date.as_deref()),
            description: row.description.unwrap_or_default(),
            amount: coerce_amount(row.amount.as_deref()),
            category: row.category.filter(|c| !c.trim().is_empty()),
            merchant: row.merchant.unwrap_or_default(),
        });
    }
    Ok(expenses)
}

/// Export expenses to CSV (for backup)
pub fn export_to_csv(expenses: &[ExpenseRecord], path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for expense in expenses {
        wtr.serialize(ExpenseCsvRow {
            date: expense.posted_date.map(|d| d.format("%Y-%m-%d").to_string()),
            description: Some(expense.description.clone()),
            amount: Some(expense.amount.to_string()),
            category: Some(classify(expense).label().to_string()),
            merchant: Some(expense.merchant.clone()),
        })?;
    }
    wtr.flush()?;
    Ok(())
}
