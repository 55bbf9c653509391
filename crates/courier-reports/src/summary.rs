//! Console P&L summary

use chrono::Datelike;
use rust_decimal::Decimal;

use crate::aggregate::{merge_by_month, MasterTotals, MonthSummary};
use crate::expenses::Category;
use crate::latex::amount;
use crate::records::{ExpenseRecord, TripRecord};
use crate::reports::period_net;

/// Keep only records dated in `year`; undated records are dropped
pub fn filter_year(
    trips: &[TripRecord],
    expenses: &[ExpenseRecord],
    year: i32,
) -> (Vec<TripRecord>, Vec<ExpenseRecord>) {
    let trips = trips
        .iter()
        .filter(|t| t.drop_off_date().is_some_and(|d| d.year() == year))
        .cloned()
        .collect();
    let expenses = expenses
        .iter()
        .filter(|e| e.posted_date.is_some_and(|d| d.year() == year))
        .cloned()
        .collect();
    (trips, expenses)
}

fn dollars(value: Decimal) -> String {
    format!("${:>10}", amount(value))
}

/// Print summary to console
pub fn print_summary(trips: &[TripRecord], expenses: &[ExpenseRecord], year: Option<i32>) {
    let totals = MasterTotals::compute(trips, expenses);
    let months: Vec<MonthSummary> = merge_by_month(trips, expenses)
        .iter()
        .map(MonthSummary::from_bucket)
        .collect();

    println!("\n============================================================");
    match year {
        Some(year) => println!("                FINANCIAL SUMMARY ({})", year),
        None => println!("                    FINANCIAL SUMMARY"),
    }
    println!("============================================================\n");

    println!("EARNINGS:");
    println!("  Trips:                {:>10}", totals.trip_count);
    println!("  Gross Earnings:       {}", dollars(totals.total_earnings));
    println!(
        "  Average per Trip:     {}",
        dollars(totals.average_per_trip().unwrap_or(Decimal::ZERO))
    );

    println!("\nEXPENSES:");
    for category in Category::ALL {
        let total = totals.categories.get(category);
        println!(
            "  {:<20}  {}  ({} txn)",
            format!("{}:", category),
            dollars(total.amount),
            total.count
        );
    }
    println!("  ─────────────────────────────────────────────");
    println!(
        "  Total Spending:       {}",
        dollars(totals.categories.total().amount)
    );

    println!("\nPROFIT/LOSS:");
    println!("  Net Business Profit:  {}", dollars(totals.net_business_profit()));
    println!("  Net After Withdrawals:{}", dollars(totals.net_after_withdrawals()));

    if !months.is_empty() {
        println!("\nBY MONTH:");
        for month in &months {
            println!(
                "  {:<16} {:>4} trips  {}  net {}",
                month.key.label(),
                month.trip_count,
                dollars(month.earnings),
                dollars(month.net_profit())
            );
        }
        println!("  ─────────────────────────────────────────────");
        println!("  Net over {} month(s):   {}", months.len(), dollars(period_net(&months)));
    }

    println!("============================================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_filter_year_drops_other_years_and_undated() {
        let date = |y| NaiveDate::from_ymd_opt(y, 3, 1);
        let trip = |d: Option<NaiveDate>| TripRecord {
            id: None,
            pickup_time: None,
            drop_off_time: d.and_then(|d| d.and_hms_opt(9, 0, 0)),
            fare_amount: Decimal::ONE,
            distance_miles: Decimal::ZERO,
            pickup_location: String::new(),
            dropoff_location: String::new(),
            status: "completed".to_string(),
        };
        let expense = |d: Option<NaiveDate>| ExpenseRecord {
            id: None,
            posted_date: d,
            description: String::new(),
            amount: Decimal::ONE,
            category: None,
            merchant: String::new(),
        };

        let trips = vec![trip(date(2025)), trip(date(2024)), trip(None)];
        let expenses = vec![expense(None), expense(date(2025))];
        let (trips, expenses) = filter_year(&trips, &expenses, 2025);

        assert_eq!(trips.len(), 1);
        assert_eq!(expenses.len(), 1);
        assert_eq!(expenses[0].posted_date, date(2025));
    }

    #[test]
    fn test_dollars_pads_and_normalizes() {
        assert_eq!(dollars(Decimal::new(4500, 2)), "$     45.00");
        assert_eq!(dollars(Decimal::new(-1, 3)), "$      0.00");
    }
}
