//! SQLite record store for trips and expenses
//!
//! Amounts are stored as text so decimals survive exactly. They are read back
//! through `CAST(... AS TEXT)` and coerced, so rows written by other tools with
//! REAL or malformed values still load.

use std::path::Path;

use anyhow::{Context, Result};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::expenses::classify;
use crate::records::{
    coerce_amount, coerce_date, coerce_timestamp, ExpenseRecord, RecordSource, SourceError,
    TripRecord,
};
use crate::trips::DEFAULT_STATUS;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Record store database wrapper
pub struct Store {
    pool: SqlitePool,
}

/// Row type for trips query
#[derive(FromRow)]
struct TripRow {
    id: i64,
    pickup_time: Option<String>,
    drop_off_time: Option<String>,
    fare_amount: Option<String>,
    distance_miles: Option<String>,
    pickup_location: Option<String>,
    dropoff_location: Option<String>,
    status: Option<String>,
}

/// Row type for expenses query
#[derive(FromRow)]
struct ExpenseRow {
    id: i64,
    posted_date: Option<String>,
    description: Option<String>,
    amount: Option<String>,
    category: Option<String>,
    merchant: Option<String>,
}

impl From<TripRow> for TripRecord {
    fn from(r: TripRow) -> Self {
        TripRecord {
            id: Some(r.id),
            pickup_time: r.pickup_time,
            drop_off_time: coerce_timestamp(r.drop_off_time.as_deref()),
            fare_amount: coerce_amount(r.fare_amount.as_deref()),
            distance_miles: coerce_amount(r.distance_miles.as_deref()),
            pickup_location: r.pickup_location.unwrap_or_default(),
            dropoff_location: r.dropoff_location.unwrap_or_default(),
            status: r.status.unwrap_or_else(|| DEFAULT_STATUS.to_string()),
        }
    }
}

impl From<ExpenseRow> for ExpenseRecord {
    fn from(r: ExpenseRow) -> Self {
        ExpenseRecord {
            id: Some(r.id),
            posted_date: coerce_date(r.posted_date.as_deref()),
            description: r.description.unwrap_or_default(),
            amount: coerce_amount(r.amount.as_deref()),
            category: r.category,
            merchant: r.merchant.unwrap_or_default(),
        }
    }
}

impl Store {
    /// Open or create the record database
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // SQLx requires the file to exist for SQLite
        if !path.exists() {
            std::fs::File::create(path)?;
        }

        let url = format!("sqlite:{}", path.display());
        let pool = SqlitePool::connect(&url)
            .await
            .with_context(|| format!("Failed to open record database {}", path.display()))?;

        sqlx::query("PRAGMA journal_mode=WAL")
            .execute(&pool)
            .await?;
        sqlx::query("PRAGMA busy_timeout=5000")
            .execute(&pool)
            .await?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Private in-memory database (tests, one-off runs)
    pub async fn open_in_memory() -> Result<Self> {
        // One connection, or each would see its own empty database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .context("Failed to open in-memory database")?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            "
            CREATE TABLE IF NOT EXISTS trips (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                pickup_time TEXT,
                drop_off_time TEXT,
                fare_amount TEXT NOT NULL DEFAULT '0',
                distance_miles TEXT NOT NULL DEFAULT '0',
                pickup_location TEXT,
                dropoff_location TEXT,
                status TEXT NOT NULL DEFAULT 'completed',
                created_at TEXT DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_trips_drop_off ON trips(drop_off_time);

            CREATE TABLE IF NOT EXISTS expenses (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                posted_date TEXT,
                description TEXT NOT NULL DEFAULT '',
                amount TEXT NOT NULL DEFAULT '0',
                category TEXT,
                merchant TEXT,
                created_at TEXT DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_expenses_posted ON expenses(posted_date);
            ",
        )
        .execute(&self.pool)
        .await
        .context("Failed to initialize record schema")?;

        Ok(())
    }

    // =========================================================================
    // Trips
    // =========================================================================

    /// All trips, most recent drop-off first
    pub async fn get_trips(&self) -> Result<Vec<TripRecord>, SourceError> {
        let rows: Vec<TripRow> = sqlx::query_as(
            "SELECT id, pickup_time, drop_off_time,
                    CAST(fare_amount AS TEXT) AS fare_amount,
                    CAST(distance_miles AS TEXT) AS distance_miles,
                    pickup_location, dropoff_location, status
             FROM trips
             ORDER BY drop_off_time DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Loaded trips");
        Ok(rows.into_iter().map(TripRecord::from).collect())
    }

    /// Add a new trip, returns the ID
    pub async fn add_trip(&self, trip: &TripRecord) -> Result<i64> {
        let mut conn = self.pool.acquire().await?;
        insert_trip(&mut conn, trip).await
    }

    /// Delete a trip by ID
    pub async fn delete_trip(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM trips WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Import multiple trips in one transaction
    pub async fn import_trips(&self, trips: &[TripRecord]) -> Result<usize> {
        let mut tx = self.pool.begin().await?;
        for trip in trips {
            insert_trip(&mut tx, trip).await?;
        }
        tx.commit().await?;
        Ok(trips.len())
    }

    // =========================================================================
    // Expenses
    // =========================================================================

    /// All expenses, most recent first
    pub async fn get_expenses(&self) -> Result<Vec<ExpenseRecord>, SourceError> {
        let rows: Vec<ExpenseRow> = sqlx::query_as(
            "SELECT id, posted_date, description,
                    CAST(amount AS TEXT) AS amount,
                    category, merchant
             FROM expenses
             ORDER BY posted_date DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Loaded expenses");
        Ok(rows.into_iter().map(ExpenseRecord::from).collect())
    }

    /// Add a new expense, returns the ID
    ///
    /// The category is stored normalized; unknown labels become `uncategorized`.
    pub async fn add_expense(&self, expense: &ExpenseRecord) -> Result<i64> {
        let mut conn = self.pool.acquire().await?;
        insert_expense(&mut conn, expense).await
    }

    /// Delete an expense by ID
    pub async fn delete_expense(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Import multiple expenses in one transaction
    ///
    /// A failing row rolls back the whole batch.
    pub async fn import_expenses(&self, expenses: &[ExpenseRecord]) -> Result<usize> {
        let mut tx = self.pool.begin().await?;
        for expense in expenses {
            insert_expense(&mut tx, expense).await?;
        }
        tx.commit().await?;
        Ok(expenses.len())
    }

    // =========================================================================
    // Utilities
    // =========================================================================

    /// Row counts per table
    pub async fn stats(&self) -> Result<StoreStats> {
        let trips: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM trips")
            .fetch_one(&self.pool)
            .await?;
        let expenses: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM expenses")
            .fetch_one(&self.pool)
            .await?;

        Ok(StoreStats {
            trips: trips.0 as u64,
            expenses: expenses.0 as u64,
        })
    }

    #[cfg(test)]
    async fn insert_raw_trip(&self, drop_off_time: Option<&str>, fare_amount: &str) -> Result<()> {
        sqlx::query("INSERT INTO trips (drop_off_time, fare_amount) VALUES (?, ?)")
            .bind(drop_off_time)
            .bind(fare_amount)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

async fn insert_trip(conn: &mut SqliteConnection, trip: &TripRecord) -> Result<i64> {
    let result = sqlx::query(
        "INSERT INTO trips (pickup_time, drop_off_time, fare_amount, distance_miles,
                            pickup_location, dropoff_location, status)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&trip.pickup_time)
    .bind(
        trip.drop_off_time
            .map(|t| t.format(TIMESTAMP_FORMAT).to_string()),
    )
    .bind(trip.fare_amount.to_string())
    .bind(trip.distance_miles.to_string())
    .bind(&trip.pickup_location)
    .bind(&trip.dropoff_location)
    .bind(&trip.status)
    .execute(conn)
    .await?;

    Ok(result.last_insert_rowid())
}

async fn insert_expense(conn: &mut SqliteConnection, expense: &ExpenseRecord) -> Result<i64> {
    let result = sqlx::query(
        "INSERT INTO expenses (posted_date, description, amount, category, merchant)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(expense.posted_date.map(|d| d.format(DATE_FORMAT).to_string()))
    .bind(&expense.description)
    .bind(expense.amount.to_string())
    .bind(classify(expense).label())
    .bind(&expense.merchant)
    .execute(conn)
    .await?;

    Ok(result.last_insert_rowid())
}

impl RecordSource for Store {
    async fn list_trips(&self) -> Result<Vec<TripRecord>, SourceError> {
        self.get_trips().await
    }

    async fn list_expenses(&self) -> Result<Vec<ExpenseRecord>, SourceError> {
        self.get_expenses().await
    }
}

/// Store statistics
#[derive(Debug)]
pub struct StoreStats {
    pub trips: u64,
    pub expenses: u64,
}

impl std::fmt::Display for StoreStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} trips, {} expenses", self.trips, self.expenses)
    }
}
