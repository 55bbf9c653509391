//! Courier Reports
//!
//! Manages trip and expense records and renders them into typeset financial
//! reports for printing.

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

use courier_reports::config::{Config, FileConfig};
use courier_reports::records::coerce_timestamp;
use courier_reports::{
    aggregate, constants, expenses, summary, trips, Category, Dispatcher, ExpenseRecord,
    GeneratedDocument, RecordSource, ReportError, Store, TripRecord, REPORTS,
};

#[derive(Parser, Debug)]
#[command(name = "courier-reports")]
#[command(about = "Financial reports for courier trips and expenses")]
struct Args {
    /// Data directory for the record database
    #[arg(short, long, default_value = "./data", global = true)]
    data_dir: PathBuf,

    /// Output directory for generated reports (default: <data-dir>/reports)
    #[arg(short, long, global = true)]
    output_dir: Option<PathBuf>,

    /// Config file path
    #[arg(short, long, default_value = constants::CONFIG_FILENAME, global = true)]
    config: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a report (or all of them) into the output directory
    Generate {
        /// Report id, e.g. monthly-report (see `reports`)
        #[arg(required_unless_present = "all")]
        report: Option<String>,

        /// Generate every report
        #[arg(long, conflicts_with = "report")]
        all: bool,

        /// Generation date printed on the documents (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// List available reports
    Reports,

    /// Print a P&L summary to the console
    Summary {
        /// Only count records from this year
        #[arg(long)]
        year: Option<i32>,
    },

    /// Manage trips
    Trip {
        #[command(subcommand)]
        action: TripCommand,
    },

    /// Manage expenses
    Expense {
        #[command(subcommand)]
        action: ExpenseCommand,
    },
}

#[derive(Subcommand, Debug)]
enum TripCommand {
    /// List all trips
    List,

    /// Add a trip
    Add {
        /// Drop-off time (YYYY-MM-DD HH:MM:SS, or YYYY-MM-DD)
        #[arg(long)]
        dropoff: String,

        /// Fare in USD
        #[arg(long)]
        fare: String,

        /// Pickup time (optional)
        #[arg(long)]
        pickup: Option<String>,

        /// Distance in miles
        #[arg(long, default_value = "0")]
        distance: String,

        /// Pickup location
        #[arg(long, default_value = "")]
        from: String,

        /// Drop-off location
        #[arg(long, default_value = "")]
        to: String,

        /// Trip status
        #[arg(long, default_value = trips::DEFAULT_STATUS)]
        status: String,
    },

    /// Delete a trip by ID
    Delete {
        /// Trip ID to delete
        id: i64,
    },

    /// Import trips from CSV file
    Import {
        /// Path to CSV file
        file: PathBuf,
    },

    /// Export trips to CSV file
    Export {
        /// Path to output CSV file
        file: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
enum ExpenseCommand {
    /// List all expenses
    List,

    /// Add an expense
    Add {
        /// Date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,

        /// Description
        #[arg(long)]
        description: String,

        /// Amount in USD
        #[arg(long)]
        amount: String,

        /// Category (business, personal, customer_purchase, uncategorized)
        #[arg(long)]
        category: String,

        /// Merchant (optional)
        #[arg(long, default_value = "")]
        merchant: String,
    },

    /// Delete an expense by ID
    Delete {
        /// Expense ID to delete
        id: i64,
    },

    /// Import expenses from CSV file
    Import {
        /// Path to CSV file
        file: PathBuf,
    },

    /// Export expenses to CSV file
    Export {
        /// Path to output CSV file
        file: PathBuf,
    },
}

/// Route library logs to stderr; RUST_LOG overrides the default level
fn init_logging(verbose: bool) {
    let default = if verbose {
        "courier_reports=debug"
    } else {
        "courier_reports=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    run(args).await
}

/// Run one subcommand; only commands that touch records open the database
async fn run(args: Args) -> Result<()> {
    let file_config = FileConfig::load_or_default(&args.config)?;
    let config = Config::from_file(&file_config, args.data_dir, args.output_dir)?;

    match args.command {
        Command::Reports => {
            list_reports();
            Ok(())
        }
        Command::Generate { report, all, date } => {
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            let store = open_store(&config).await?;
            run_generate(&config, store, report.as_deref(), all, date).await
        }
        Command::Summary { year } => run_summary(&open_store(&config).await?, year).await,
        Command::Trip { action } => handle_trip_command(action, &open_store(&config).await?).await,
        Command::Expense { action } => {
            handle_expense_command(action, &open_store(&config).await?).await
        }
    }
}

async fn open_store(config: &Config) -> Result<Store> {
    Store::open(&config.database_path()).await
}

// =============================================================================
// Reports
// =============================================================================

fn list_reports() {
    println!("{:<20} {:<24} Description", "ID", "File");
    println!("{}", "-".repeat(80));
    for definition in &REPORTS {
        println!(
            "{:<20} {:<24} {}",
            definition.id, definition.filename, definition.description
        );
    }
}

async fn run_generate(
    config: &Config,
    store: Store,
    report: Option<&str>,
    all: bool,
    date: NaiveDate,
) -> Result<()> {
    let stats = store.stats().await?;
    println!("Generating from {} ({})", config.database_path().display(), stats);

    let dispatcher = Dispatcher::new(store, config.report_settings(date));
    let result = match report {
        Some(id) if !all => dispatcher.generate_by_id(id).await.map(|doc| vec![doc]),
        _ => dispatcher.generate_all().await,
    };

    let documents = match result {
        Ok(documents) => documents,
        Err(err) => {
            report_failure(&err);
            return Err(err.into());
        }
    };

    std::fs::create_dir_all(&config.output_dir).with_context(|| {
        format!("Failed to create output directory {}", config.output_dir.display())
    })?;
    for document in &documents {
        let path = write_document(&config.output_dir, document)?;
        println!(
            "  Wrote {} ({} bytes, {})",
            path.display(),
            document.content.len(),
            document.content_type
        );
    }
    println!("\nGenerated {} report(s)", documents.len());
    Ok(())
}

/// Print the structured error body callers at the web boundary would receive
fn report_failure(err: &ReportError) {
    match serde_json::to_string_pretty(&err.to_json()) {
        Ok(body) => eprintln!("{}", body),
        Err(_) => eprintln!("{}", err),
    }
}

fn write_document(dir: &Path, document: &GeneratedDocument) -> Result<PathBuf> {
    let path = dir.join(document.filename);
    std::fs::write(&path, &document.content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

async fn run_summary(store: &Store, year: Option<i32>) -> Result<()> {
    let trips = store.list_trips().await?;
    let expenses = store.list_expenses().await?;

    match year {
        Some(year) => {
            let (trips, expenses) = summary::filter_year(&trips, &expenses, year);
            summary::print_summary(&trips, &expenses, Some(year));
        }
        None => summary::print_summary(&trips, &expenses, None),
    }
    Ok(())
}

// =============================================================================
// Trips
// =============================================================================

/// Handle trip management subcommands
async fn handle_trip_command(action: TripCommand, store: &Store) -> Result<()> {
    match action {
        TripCommand::List => {
            let trips = store.get_trips().await?;
            if trips.is_empty() {
                println!("No trips recorded.");
                println!("\nUse 'courier-reports trip add' to add trips");
                println!("Or 'courier-reports trip import <file.csv>' to import from CSV");
            } else {
                println!(
                    "{:<5} {:<17} {:<20} {:<20} {:>10}  Status",
                    "ID", "Drop-off", "From", "To", "Fare"
                );
                println!("{}", "-".repeat(90));

                let mut total = Decimal::ZERO;
                for trip in &trips {
                    let id = trip.id.map(|i| i.to_string()).unwrap_or_default();
                    let dropoff = trip
                        .drop_off_time
                        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_else(|| constants::UNDATED_HEADING.to_string());
                    println!(
                        "{:<5} {:<17} {:<20} {:<20} ${:>9.2}  {}",
                        id,
                        dropoff,
                        truncate(&trip.pickup_location, 19),
                        truncate(&trip.dropoff_location, 19),
                        trip.fare_amount,
                        trip.status,
                    );
                    total = aggregate::add_amounts(total, trip.fare_amount);
                }
                println!("{}", "-".repeat(90));
                println!("{:>64} ${:>9.2}", "Total:", total);
                println!("\n{} trip(s)", trips.len());
            }
            Ok(())
        }

        TripCommand::Add {
            dropoff,
            fare,
            pickup,
            distance,
            from,
            to,
            status,
        } => {
            let Some(drop_off_time) = coerce_timestamp(Some(dropoff.as_str())) else {
                bail!("Invalid drop-off time '{}'. Use YYYY-MM-DD HH:MM:SS", dropoff);
            };

            let trip = TripRecord {
                id: None,
                pickup_time: pickup,
                drop_off_time: Some(drop_off_time),
                fare_amount: parse_amount(&fare)?,
                distance_miles: parse_amount(&distance)?,
                pickup_location: from,
                dropoff_location: to,
                status,
            };

            let id = store.add_trip(&trip).await?;
            println!(
                "Added trip #{}: {} - ${:.2}",
                id,
                drop_off_time.format("%Y-%m-%d %H:%M"),
                trip.fare_amount
            );
            Ok(())
        }

        TripCommand::Delete { id } => {
            if store.delete_trip(id).await? {
                println!("Deleted trip #{}", id);
            } else {
                println!("Trip #{} not found", id);
            }
            Ok(())
        }

        TripCommand::Import { file } => {
            let trips = trips::load_from_csv(&file)?;
            let count = store.import_trips(&trips).await?;
            println!("Imported {} trips from {}", count, file.display());
            Ok(())
        }

        TripCommand::Export { file } => {
            let trips = store.get_trips().await?;
            trips::export_to_csv(&trips, &file)?;
            println!("Exported {} trips to {}", trips.len(), file.display());
            Ok(())
        }
    }
}

// =============================================================================
// Expenses
// =============================================================================

/// Handle expense management subcommands
async fn handle_expense_command(action: ExpenseCommand, store: &Store) -> Result<()> {
    match action {
        ExpenseCommand::List => {
            let expenses = store.get_expenses().await?;
            if expenses.is_empty() {
                println!("No expenses recorded.");
                println!("\nUse 'courier-reports expense add' to add expenses");
                println!("Or 'courier-reports expense import <file.csv>' to import from CSV");
            } else {
                println!(
                    "{:<5} {:<12} {:<15} {:<18} {:>10}  Description",
                    "ID", "Date", "Merchant", "Category", "Amount"
                );
                println!("{}", "-".repeat(90));

                let mut total = Decimal::ZERO;
                for expense in &expenses {
                    let id = expense.id.map(|i| i.to_string()).unwrap_or_default();
                    let date = expense
                        .posted_date
                        .map(|d| d.format("%Y-%m-%d").to_string())
                        .unwrap_or_else(|| constants::UNDATED_HEADING.to_string());
                    println!(
                        "{:<5} {:<12} {:<15} {:<18} ${:>9.2}  {}",
                        id,
                        date,
                        truncate(&expense.merchant, 14),
                        expenses::classify(expense).to_string(),
                        expense.amount,
                        truncate(&expense.description, 30),
                    );
                    total = aggregate::add_amounts(total, expense.amount);
                }
                println!("{}", "-".repeat(90));
                println!("{:>53} ${:>9.2}", "Total:", total);
                println!("\n{} expense(s)", expenses.len());
            }
            Ok(())
        }

        ExpenseCommand::Add {
            date,
            description,
            amount,
            category,
            merchant,
        } => {
            let category = parse_category(&category)?;

            let expense = ExpenseRecord {
                id: None,
                posted_date: Some(date),
                description,
                amount: parse_amount(&amount)?,
                category: Some(category.label().to_string()),
                merchant,
            };

            let id = store.add_expense(&expense).await?;
            println!(
                "Added expense #{}: {} - ${:.2} ({})",
                id, expense.description, expense.amount, category
            );
            Ok(())
        }

        ExpenseCommand::Delete { id } => {
            if store.delete_expense(id).await? {
                println!("Deleted expense #{}", id);
            } else {
                println!("Expense #{} not found", id);
            }
            Ok(())
        }

        ExpenseCommand::Import { file } => {
            let expenses = expenses::load_from_csv(&file)?;
            let count = store.import_expenses(&expenses).await?;
            println!("Imported {} expenses from {}", count, file.display());
            Ok(())
        }

        ExpenseCommand::Export { file } => {
            let expenses = store.get_expenses().await?;
            expenses::export_to_csv(&expenses, &file)?;
            println!("Exported {} expenses to {}", expenses.len(), file.display());
            Ok(())
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn parse_category(s: &str) -> Result<Category> {
    match Category::parse(s) {
        Some(category) => Ok(category),
        None => bail!(
            "Invalid category '{}'. Use: business, personal, customer_purchase, uncategorized",
            s
        ),
    }
}

/// Strict amount parse for user input (imports are coerced instead)
fn parse_amount(s: &str) -> Result<Decimal> {
    let cleaned: String = s.trim().chars().filter(|c| *c != '$' && *c != ',').collect();
    Decimal::from_str(&cleaned).with_context(|| format!("Invalid amount '{}'", s))
}

/// Truncate string for display
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
