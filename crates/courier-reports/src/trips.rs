//! Trip CSV import/export
//!
//! Column names follow the trip activity export: `pickup_time`, `dropoff_time`,
//! `fare_amount`, `distance`, `pickup_location`, `dropoff_location`, `status`.

use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::records::{coerce_amount, coerce_timestamp, TripRecord};

/// Status assigned to imported trips that don't carry one
pub const DEFAULT_STATUS: &str = "completed";

#[derive(Debug, Serialize, Deserialize)]
struct TripCsvRow {
    #[serde(default)]
    pickup_time: Option<String>,
    #[serde(default)]
    dropoff_time: Option<String>,
    #[serde(default)]
    fare_amount: Option<String>,
    #[serde(default)]
    distance: Option<String>,
    #[serde(default)]
    pickup_location: Option<String>,
    #[serde(default)]
    dropoff_location: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

/// Load trips from a CSV file
pub fn load_from_csv(path: &Path) -> Result<Vec<TripRecord>> {
    let mut rdr = csv::Reader::from_path(path)?;
    let mut trips = Vec::new();
    for result in rdr.deserialize() {
        let row: TripCsvRow = result?;
        trips.push(TripRecord {
            id: None,
            pickup_time: row.pickup_time.filter(|s| !s.trim().is_empty()),
            drop_off_time: coerce_timestamp(row.dropoff_time.as_deref()),
            fare_amount: coerce_amount(row.fare_amount.as_deref()),
            distance_miles: coerce_amount(row.distance.as_deref()),
            pickup_location: row.pickup_location.unwrap_or_default(),
            dropoff_location: row.dropoff_location.unwrap_or_default(),
            status: row
                .status
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_STATUS.to_string()),
        });
    }
    Ok(trips)
}

/// Export trips to CSV (for backup)
pub fn export_to_csv(trips: &[TripRecord], path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for trip in trips {
        wtr.serialize(TripCsvRow {
            pickup_time: trip.pickup_time.clone(),
            dropoff_time: trip
                .drop_off_time
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string()),
            fare_amount: Some(trip.fare_amount.to_string()),
            distance: Some(trip.distance_miles.to_string()),
            pickup_location: Some(trip.pickup_location.clone()),
            dropoff_location: Some(trip.dropoff_location.clone()),
            status: Some(trip.status.clone()),
        })?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    #[test]
    fn test_load_from_csv_coerces_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trips.csv");
        std::fs::write(
            &path,
            "pickup_time,dropoff_time,fare_amount,distance,pickup_location,dropoff_location,status\n\
             2025-08-15 17:40:00,2025-08-15 18:05:00,$20.50,4.2,Depot,Main St,\n\
             ,garbage,n/a,,,,cancelled\n",
        )
        .unwrap();

        let trips = load_from_csv(&path).unwrap();

        assert_eq!(trips.len(), 2);
        assert_eq!(trips[0].drop_off_date(), NaiveDate::from_ymd_opt(2025, 8, 15));
        assert_eq!(trips[0].fare_amount, Decimal::new(2050, 2));
        assert_eq!(trips[0].status, DEFAULT_STATUS);

        assert_eq!(trips[1].pickup_time, None);
        assert_eq!(trips[1].drop_off_time, None);
        assert_eq!(trips[1].fare_amount, Decimal::ZERO);
        assert_eq!(trips[1].status, "cancelled");
    }

    #[test]
    fn test_export_then_load_keeps_dates_and_fares() {
        let trips = vec![TripRecord {
            id: Some(7),
            pickup_time: None,
            drop_off_time: NaiveDate::from_ymd_opt(2025, 9, 1).and_then(|d| d.and_hms_opt(8, 15, 0)),
            fare_amount: Decimal::new(1299, 2),
            distance_miles: Decimal::new(31, 1),
            pickup_location: "Depot".to_string(),
            dropoff_location: "Elm St, Apt 4".to_string(),
            status: "completed".to_string(),
        }];

        let file = tempfile::NamedTempFile::new().unwrap();
        export_to_csv(&trips, file.path()).unwrap();
        let loaded = load_from_csv(file.path()).unwrap();

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, None);
        assert_eq!(loaded[0].drop_off_time, trips[0].drop_off_time);
        assert_eq!(loaded[0].fare_amount, trips[0].fare_amount);
        assert_eq!(loaded[0].dropoff_location, "Elm St, Apt 4");
    }
}
