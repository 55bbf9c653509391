//! Trip and expense records plus the read-only source they come from
//!
//! Upstream data is not validated. Amounts and timestamps that fail to parse
//! are coerced here (amount to zero, timestamp to `None`) so one bad row never
//! blocks a report.

use std::future::Future;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::constants;

/// Completed trip
#[derive(Debug, Clone, PartialEq)]
pub struct TripRecord {
    /// Database ID (None for trips not loaded from the store)
    pub id: Option<i64>,
    pub pickup_time: Option<String>,
    /// Grouping key for monthly aggregation
    pub drop_off_time: Option<NaiveDateTime>,
    pub fare_amount: Decimal,
    pub distance_miles: Decimal,
    pub pickup_location: String,
    pub dropoff_location: String,
    pub status: String,
}

impl TripRecord {
    /// Date the trip counts toward
    pub fn drop_off_date(&self) -> Option<NaiveDate> {
        self.drop_off_time.map(|t| t.date())
    }
}

/// Posted expense
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseRecord {
    /// Database ID (None for expenses not loaded from the store)
    pub id: Option<i64>,
    /// Grouping key for monthly aggregation
    pub posted_date: Option<NaiveDate>,
    /// Free text, display only
    pub description: String,
    pub amount: Decimal,
    /// Stored category label, classified by `expenses::classify`
    pub category: Option<String>,
    pub merchant: String,
}

// =============================================================================
// Record Source
// =============================================================================

/// Errors raised while reading records
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("database query failed")]
    Database(#[from] sqlx::Error),
    #[error("record source unavailable: {0}")]
    Unavailable(String),
}

/// Read-only supplier of trips and expenses
///
/// Both listings are ordered descending by their timestamp field.
pub trait RecordSource {
    fn list_trips(&self) -> impl Future<Output = Result<Vec<TripRecord>, SourceError>> + Send;

    fn list_expenses(&self) -> impl Future<Output = Result<Vec<ExpenseRecord>, SourceError>> + Send;
}

/// Records already held in memory
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub trips: Vec<TripRecord>,
    pub expenses: Vec<ExpenseRecord>,
}

impl Snapshot {
    pub fn new(trips: Vec<TripRecord>, expenses: Vec<ExpenseRecord>) -> Self {
        Self { trips, expenses }
    }
}

impl RecordSource for Snapshot {
    async fn list_trips(&self) -> Result<Vec<TripRecord>, SourceError> {
        Ok(self.trips.clone())
    }

    async fn list_expenses(&self) -> Result<Vec<ExpenseRecord>, SourceError> {
        Ok(self.expenses.clone())
    }
}

// =============================================================================
// Field Coercion
// =============================================================================

/// Parse a stored amount, treating missing, non-numeric, or out-of-range
/// values as zero
pub fn coerce_amount(raw: Option<&str>) -> Decimal {
    let Some(text) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Decimal::ZERO;
    };

    let cleaned: String = text.chars().filter(|c| *c != '$' && *c != ',').collect();
    let Ok(amount) =
        Decimal::from_str(&cleaned).or_else(|_| Decimal::from_scientific(&cleaned))
    else {
        tracing::warn!(value = %text, "non-numeric amount coerced to 0");
        return Decimal::ZERO;
    };

    if amount.abs() > Decimal::from(constants::MAX_RECORD_AMOUNT) {
        tracing::warn!(value = %text, "out-of-range amount coerced to 0");
        return Decimal::ZERO;
    }
    amount
}

/// Parse a stored timestamp in any of the formats the store has seen
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS` (optionally with `T` and fractional
/// seconds) and bare `YYYY-MM-DD`. Offsets keep their local wall-clock date.
pub fn coerce_timestamp(raw: Option<&str>) -> Option<NaiveDateTime> {
    let text = raw.map(str::trim).filter(|s| !s.is_empty())?;

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(dt.naive_local());
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }

    // Date prefix of anything else timestamp-shaped
    let parsed = text
        .get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0));
    if parsed.is_none() {
        tracing::warn!(value = %text, "unparseable timestamp treated as undated");
    }
    parsed
}

/// Date-only variant of [`coerce_timestamp`]
pub fn coerce_date(raw: Option<&str>) -> Option<NaiveDate> {
    coerce_timestamp(raw).map(|t| t.date())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_amount_valid() {
        assert_eq!(coerce_amount(Some("20.50")), Decimal::new(2050, 2));
        assert_eq!(coerce_amount(Some(" 7 ")), Decimal::new(7, 0));
        assert_eq!(coerce_amount(Some("$1,234.56")), Decimal::new(123456, 2));
        assert_eq!(coerce_amount(Some("-3.25")), Decimal::new(-325, 2));
    }

    #[test]
    fn test_coerce_amount_out_of_range_is_zero() {
        assert_eq!(coerce_amount(Some("1000000000000000000000000000")), Decimal::ZERO);
        assert_eq!(coerce_amount(Some("79228162514264337593543950335")), Decimal::ZERO);
        assert_eq!(coerce_amount(Some("-2e15")), Decimal::ZERO);
        assert_eq!(coerce_amount(Some("999999999999")), Decimal::new(999_999_999_999, 0));
    }

    #[test]
    fn test_coerce_amount_malformed_is_zero() {
        assert_eq!(coerce_amount(None), Decimal::ZERO);
        assert_eq!(coerce_amount(Some("")), Decimal::ZERO);
        assert_eq!(coerce_amount(Some("n/a")), Decimal::ZERO);
        assert_eq!(coerce_amount(Some("12.3.4")), Decimal::ZERO);
    }

    #[test]
    fn test_coerce_timestamp_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 8, 15).unwrap();

        for raw in [
            "2025-08-15",
            "2025-08-15 18:30:00",
            "2025-08-15T18:30:00",
            "2025-08-15T18:30:00.250",
            "2025-08-15T18:30:00+00:00",
            "2025-08-15T23:30:00-05:00",
            "2025-08-15 18:30:00+00",
        ] {
            assert_eq!(coerce_date(Some(raw)), Some(expected), "format: {}", raw);
        }
    }

    #[test]
    fn test_coerce_timestamp_keeps_local_date_of_offset() {
        // 23:30 at -05:00 is the 16th in UTC, but the wall-clock date is the 15th
        let parsed = coerce_timestamp(Some("2025-08-15T23:30:00-05:00")).unwrap();
        assert_eq!(parsed.date(), NaiveDate::from_ymd_opt(2025, 8, 15).unwrap());
    }

    #[test]
    fn test_coerce_timestamp_malformed_is_none() {
        assert_eq!(coerce_timestamp(None), None);
        assert_eq!(coerce_timestamp(Some("   ")), None);
        assert_eq!(coerce_timestamp(Some("yesterday")), None);
        assert_eq!(coerce_timestamp(Some("2025-13-40")), None);
    }

    #[tokio::test]
    async fn test_snapshot_source_returns_records() {
        let snapshot = Snapshot::new(
            Vec::new(),
            vec![ExpenseRecord {
                id: None,
                posted_date: NaiveDate::from_ymd_opt(2025, 8, 10),
                description: "Charging".to_string(),
                amount: Decimal::new(5, 0),
                category: Some("business".to_string()),
                merchant: String::new(),
            }],
        );

        assert!(snapshot.list_trips().await.unwrap().is_empty());
        assert_eq!(snapshot.list_expenses().await.unwrap().len(), 1);
    }
}
