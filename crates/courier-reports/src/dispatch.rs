//! Report request dispatch
//!
//! Resolves a report id, fetches a fresh snapshot from the record source, and
//! hands it to the matching formatter. Nothing is cached between requests.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::constants::DOCUMENT_CONTENT_TYPE;
use crate::records::{RecordSource, SourceError};
use crate::reports::{ReportData, ReportKind, ReportSettings};

/// Errors surfaced to the report caller
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Invalid report type: {requested}")]
    UnsupportedReportKind {
        requested: String,
        available: Vec<&'static str>,
    },
    #[error("Failed to fetch {collection}")]
    UpstreamFetchFailure {
        collection: &'static str,
        #[source]
        source: SourceError,
    },
}

/// Structured error body returned to callers
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ErrorPayload {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub available: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ReportError {
    pub fn payload(&self) -> ErrorPayload {
        match self {
            ReportError::UnsupportedReportKind {
                requested,
                available,
            } => ErrorPayload {
                error: "Invalid report type".to_string(),
                requested: Some(requested.clone()),
                available: available.clone(),
                detail: None,
            },
            ReportError::UpstreamFetchFailure { collection, source } => ErrorPayload {
                error: format!("Failed to fetch {}", collection),
                requested: None,
                available: Vec::new(),
                detail: Some(source.to_string()),
            },
        }
    }

    /// JSON form of [`ReportError::payload`]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self.payload()).unwrap_or_else(|_| {
            serde_json::json!({ "error": self.to_string() })
        })
    }
}

/// A rendered report ready for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedDocument {
    pub kind: ReportKind,
    pub content: Vec<u8>,
    pub content_type: &'static str,
    pub filename: &'static str,
}

impl GeneratedDocument {
    /// Document text (formatters only emit UTF-8)
    pub fn text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.content)
    }
}

/// Routes report requests to formatters over a record source
pub struct Dispatcher<S> {
    source: S,
    settings: ReportSettings,
}

impl<S: RecordSource> Dispatcher<S> {
    pub fn new(source: S, settings: ReportSettings) -> Self {
        Self { source, settings }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Generate a report by its public id, e.g. `monthly-report`
    pub async fn generate_by_id(&self, id: &str) -> Result<GeneratedDocument, ReportError> {
        let kind = id.parse::<ReportKind>().inspect_err(|_| {
            warn!(requested = id, "Unsupported report kind");
        })?;
        self.generate(kind).await
    }

    /// Fetch a fresh snapshot and render one report
    pub async fn generate(&self, kind: ReportKind) -> Result<GeneratedDocument, ReportError> {
        let definition = kind.definition();
        debug!(report = definition.id, "Fetching records");

        let trips = self.source.list_trips().await.map_err(|source| {
            ReportError::UpstreamFetchFailure {
                collection: "trips",
                source,
            }
        })?;
        let expenses = self.source.list_expenses().await.map_err(|source| {
            ReportError::UpstreamFetchFailure {
                collection: "expenses",
                source,
            }
        })?;

        let data = ReportData {
            trips: &trips,
            expenses: &expenses,
        };
        let content = (kind.formatter())(&data, &self.settings);

        info!(
            report = definition.id,
            trips = trips.len(),
            expenses = expenses.len(),
            bytes = content.len(),
            "Generated report"
        );

        Ok(GeneratedDocument {
            kind,
            content: content.into_bytes(),
            content_type: DOCUMENT_CONTENT_TYPE,
            filename: definition.filename,
        })
    }

    /// Generate every report, stopping at the first failure
    pub async fn generate_all(&self) -> Result<Vec<GeneratedDocument>, ReportError> {
        let mut documents = Vec::with_capacity(ReportKind::ALL.len());
        for kind in ReportKind::ALL {
            documents.push(self.generate(kind).await?);
        }
        Ok(documents)
    }
}
