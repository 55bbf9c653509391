//! Centralized constants for the courier report engine
//!
//! Business-specific values (company name, author line) come from config.toml.

// =============================================================================
// Document Output
// =============================================================================

/// Content type attached to every generated document
pub const DOCUMENT_CONTENT_TYPE: &str = "document/markup";

/// Master summary output filename
pub const MASTER_SUMMARY_FILENAME: &str = "master_summary.tex";

/// Business expenses output filename
pub const BUSINESS_EXPENSES_FILENAME: &str = "business_expenses.tex";

/// Itemized expenses output filename
pub const ITEMIZED_EXPENSES_FILENAME: &str = "itemized_expenses.tex";

/// Monthly report output filename
pub const MONTHLY_REPORT_FILENAME: &str = "monthly_report.tex";

// =============================================================================
// Formatting
// =============================================================================

/// Maximum characters of a description shown in a table cell
pub const DESCRIPTION_MAX_CHARS: usize = 50;

/// Date cell rendered for records without a usable date
pub const UNDATED_CELL: &str = "--/--";

/// Section heading for records without a usable date
pub const UNDATED_HEADING: &str = "Undated";

// =============================================================================
// Records
// =============================================================================

/// Largest absolute amount (USD) accepted from a stored record
pub const MAX_RECORD_AMOUNT: i64 = 1_000_000_000_000;

/// Merchants listed in the master summary
pub const TOP_MERCHANTS: usize = 10;

// =============================================================================
// File Names
// =============================================================================

/// Record store database filename
pub const DATABASE_FILENAME: &str = "records.sqlite";

/// Default config file path
pub const CONFIG_FILENAME: &str = "config.toml";

// =============================================================================
// Defaults
// =============================================================================

/// Business name used when config.toml does not set one
pub const DEFAULT_BUSINESS_NAME: &str = "JTech Logistics";
