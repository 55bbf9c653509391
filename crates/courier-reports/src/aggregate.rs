//! Month grouping and financial totals
//!
//! Groups are keyed by calendar `(year, month)` and emitted in first-seen
//! order. Sums use `Decimal`, so category totals add up to the grand total
//! exactly.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::warn;

use crate::constants;
use crate::expenses::{classify, Category};
use crate::records::{ExpenseRecord, TripRecord};

/// Grouping key for monthly aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MonthKey {
    Month { year: i32, month: u32 },
    /// Record had no usable date
    Undated,
}

impl MonthKey {
    pub fn of(date: Option<NaiveDate>) -> Self {
        match date {
            Some(d) => MonthKey::Month {
                year: d.year(),
                month: d.month(),
            },
            None => MonthKey::Undated,
        }
    }

    /// Display label, e.g. "August 2025"
    pub fn label(&self) -> String {
        match *self {
            MonthKey::Month { year, month } => NaiveDate::from_ymd_opt(year, month, 1)
                .map(|d| d.format("%B %Y").to_string())
                .unwrap_or_else(|| format!("{:04}-{:02}", year, month)),
            MonthKey::Undated => constants::UNDATED_HEADING.to_string(),
        }
    }
}

/// Records that fall in one month
#[derive(Debug)]
pub struct MonthGroup<'a, T> {
    pub key: MonthKey,
    pub records: Vec<&'a T>,
}

/// Group records by the month of `date_of`, in first-seen order
pub fn group_by_month<'a, T, F>(records: &'a [T], date_of: F) -> Vec<MonthGroup<'a, T>>
where
    F: Fn(&T) -> Option<NaiveDate>,
{
    group_refs_by_month(records.iter(), date_of)
}

/// [`group_by_month`] over already-borrowed records (e.g. one category)
pub fn group_refs_by_month<'a, T, I, F>(records: I, date_of: F) -> Vec<MonthGroup<'a, T>>
where
    T: 'a,
    I: IntoIterator<Item = &'a T>,
    F: Fn(&T) -> Option<NaiveDate>,
{
    let mut groups: Vec<MonthGroup<'a, T>> = Vec::new();
    let mut index: HashMap<MonthKey, usize> = HashMap::new();

    for record in records {
        let key = MonthKey::of(date_of(record));
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push(MonthGroup {
                key,
                records: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].records.push(record);
    }

    groups
}

/// Trips and expenses sharing one month
#[derive(Debug)]
pub struct MonthlyBucket<'a> {
    pub key: MonthKey,
    pub trips: Vec<&'a TripRecord>,
    pub expenses: Vec<&'a ExpenseRecord>,
}

/// Merge trips and expenses into one month keyspace
///
/// Months are ordered by first appearance among the trips, then among the
/// expenses. A month with only trips or only expenses still gets a bucket.
pub fn merge_by_month<'a>(
    trips: &'a [TripRecord],
    expenses: &'a [ExpenseRecord],
) -> Vec<MonthlyBucket<'a>> {
    let mut buckets: Vec<MonthlyBucket<'a>> = Vec::new();
    let mut index: HashMap<MonthKey, usize> = HashMap::new();

    let mut slot_for = |key: MonthKey, buckets: &mut Vec<MonthlyBucket<'a>>| {
        *index.entry(key).or_insert_with(|| {
            buckets.push(MonthlyBucket {
                key,
                trips: Vec::new(),
                expenses: Vec::new(),
            });
            buckets.len() - 1
        })
    };

    for trip in trips {
        let slot = slot_for(MonthKey::of(trip.drop_off_date()), &mut buckets);
        buckets[slot].trips.push(trip);
    }
    for expense in expenses {
        let slot = slot_for(MonthKey::of(expense.posted_date), &mut buckets);
        buckets[slot].expenses.push(expense);
    }

    buckets
}

// =============================================================================
// Sums and Averages
// =============================================================================

/// Sum an amount field over a set of records
pub fn sum_amounts<'a, T, I, F>(records: I, amount_of: F) -> Decimal
where
    T: 'a,
    I: IntoIterator<Item = &'a T>,
    F: Fn(&T) -> Decimal,
{
    records
        .into_iter()
        .map(amount_of)
        .fold(Decimal::ZERO, add_amounts)
}

/// `total + amount`, clamped to the representable range instead of overflowing
pub fn add_amounts(total: Decimal, amount: Decimal) -> Decimal {
    total.checked_add(amount).unwrap_or_else(|| {
        warn!(%total, %amount, "amount total out of range, clamped");
        total.saturating_add(amount)
    })
}

/// `total - amount`, clamped like [`add_amounts`]
pub fn sub_amounts(total: Decimal, amount: Decimal) -> Decimal {
    total.checked_sub(amount).unwrap_or_else(|| {
        warn!(%total, %amount, "amount difference out of range, clamped");
        total.saturating_sub(amount)
    })
}

/// Number of records, malformed ones included
pub fn count_records<T>(records: &[T]) -> usize {
    records.len()
}

/// Average requested over zero records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot average over zero records")]
pub struct DivideByZero;

/// `total / count`, or [`DivideByZero`] when there are no records
pub fn average_per_record(total: Decimal, count: usize) -> Result<Decimal, DivideByZero> {
    if count == 0 {
        return Err(DivideByZero);
    }
    Ok(total / Decimal::from(count as u64))
}

/// Sum and count for one category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryTotal {
    pub amount: Decimal,
    pub count: usize,
}

/// Per-category totals accumulated in a single pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryTotals {
    pub business: CategoryTotal,
    pub personal: CategoryTotal,
    pub customer_purchase: CategoryTotal,
    pub uncategorized: CategoryTotal,
}

impl CategoryTotals {
    pub fn from_expenses<'a, I>(expenses: I) -> Self
    where
        I: IntoIterator<Item = &'a ExpenseRecord>,
    {
        let mut totals = CategoryTotals::default();
        for expense in expenses {
            let entry = totals.get_mut(classify(expense));
            entry.amount = add_amounts(entry.amount, expense.amount);
            entry.count += 1;
        }
        totals
    }

    pub fn get(&self, category: Category) -> CategoryTotal {
        match category {
            Category::Business => self.business,
            Category::Personal => self.personal,
            Category::CustomerPurchase => self.customer_purchase,
            Category::Uncategorized => self.uncategorized,
        }
    }

    fn get_mut(&mut self, category: Category) -> &mut CategoryTotal {
        match category {
            Category::Business => &mut self.business,
            Category::Personal => &mut self.personal,
            Category::CustomerPurchase => &mut self.customer_purchase,
            Category::Uncategorized => &mut self.uncategorized,
        }
    }

    /// Grand total over every category
    pub fn total(&self) -> CategoryTotal {
        Category::ALL
            .iter()
            .map(|c| self.get(*c))
            .fold(CategoryTotal::default(), |acc, t| CategoryTotal {
                amount: add_amounts(acc.amount, t.amount),
                count: acc.count + t.count,
            })
    }
}

// =============================================================================
// Merchants
// =============================================================================

/// Visits and spend at one merchant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerchantTotal {
    pub name: String,
    pub visits: usize,
    pub amount: Decimal,
}

/// Per-merchant totals, most visited first
///
/// Ties go to the higher spend, then to the name. Blank merchants are skipped.
pub fn merchant_totals(expenses: &[ExpenseRecord]) -> Vec<MerchantTotal> {
    let mut totals: Vec<MerchantTotal> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for expense in expenses {
        let name = expense.merchant.trim();
        if name.is_empty() {
            continue;
        }
        let slot = *index.entry(name).or_insert_with(|| {
            totals.push(MerchantTotal {
                name: name.to_string(),
                visits: 0,
                amount: Decimal::ZERO,
            });
            totals.len() - 1
        });
        totals[slot].visits += 1;
        totals[slot].amount = add_amounts(totals[slot].amount, expense.amount);
    }

    totals.sort_by(|a, b| {
        b.visits
            .cmp(&a.visits)
            .then_with(|| b.amount.cmp(&a.amount))
            .then_with(|| a.name.cmp(&b.name))
    });
    totals
}

/// Figures for the master summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterTotals {
    pub trip_count: usize,
    pub total_earnings: Decimal,
    pub categories: CategoryTotals,
}

impl MasterTotals {
    pub fn compute(trips: &[TripRecord], expenses: &[ExpenseRecord]) -> Self {
        Self {
            trip_count: count_records(trips),
            total_earnings: sum_amounts(trips, |t| t.fare_amount),
            categories: CategoryTotals::from_expenses(expenses),
        }
    }

    pub fn average_per_trip(&self) -> Result<Decimal, DivideByZero> {
        average_per_record(self.total_earnings, self.trip_count)
    }

    /// Earnings less business expenses. Customer purchases are reimbursable
    /// and don't reduce profit.
    pub fn net_business_profit(&self) -> Decimal {
        sub_amounts(self.total_earnings, self.categories.business.amount)
    }

    /// Net business profit less personal spending
    pub fn net_after_withdrawals(&self) -> Decimal {
        sub_amounts(self.net_business_profit(), self.categories.personal.amount)
    }

    pub fn average_per_transaction(&self) -> Result<Decimal, DivideByZero> {
        let total = self.categories.total();
        average_per_record(total.amount, total.count)
    }
}

/// Performance figures for one month
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthSummary {
    pub key: MonthKey,
    pub trip_count: usize,
    pub earnings: Decimal,
    pub expenses: Decimal,
    pub expense_count: usize,
}

impl MonthSummary {
    pub fn from_bucket(bucket: &MonthlyBucket<'_>) -> Self {
        Self {
            key: bucket.key,
            trip_count: bucket.trips.len(),
            earnings: sum_amounts(bucket.trips.iter().copied(), |t| t.fare_amount),
            expenses: sum_amounts(bucket.expenses.iter().copied(), |e| e.amount),
            expense_count: bucket.expenses.len(),
        }
    }

    pub fn net_profit(&self) -> Decimal {
        sub_amounts(self.earnings, self.expenses)
    }

    pub fn average_per_trip(&self) -> Result<Decimal, DivideByZero> {
        average_per_record(self.earnings, self.trip_count)
    }

    /// Combine several months into one period total
    pub fn combine<'a, I>(key: MonthKey, months: I) -> Self
    where
        I: IntoIterator<Item = &'a MonthSummary>,
    {
        months.into_iter().fold(
            MonthSummary {
                key,
                trip_count: 0,
                earnings: Decimal::ZERO,
                expenses: Decimal::ZERO,
                expense_count: 0,
            },
            |mut acc, m| {
                acc.trip_count += m.trip_count;
                acc.earnings = add_amounts(acc.earnings, m.earnings);
                acc.expenses = add_amounts(acc.expenses, m.expenses);
                acc.expense_count += m.expense_count;
                acc
            },
        )
    }
}
