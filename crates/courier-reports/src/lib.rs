//! Courier earnings report generation
//!
//! Turns trip and expense records into typeset financial documents: a master
//! summary, business-only expenses, itemized expenses, and a monthly
//! performance report.

pub mod aggregate;
pub mod config;
pub mod constants;
pub mod dispatch;
pub mod expenses;
pub mod latex;
pub mod records;
pub mod reports;
pub mod store;
pub mod summary;
pub mod trips;

pub use dispatch::{Dispatcher, ErrorPayload, GeneratedDocument, ReportError};
pub use expenses::Category;
pub use records::{ExpenseRecord, RecordSource, Snapshot, SourceError, TripRecord};
pub use reports::{ReportDefinition, ReportKind, ReportSettings, REPORTS};
pub use store::Store;
