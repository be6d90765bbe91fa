use crate::domain::orchestrator::{GenerationRequest, GenerationResponse};
use crate::error::RosterServiceError;

/// Where generation requests come from. Tabular ingestion (spreadsheets,
/// CSV) lives behind this seam and outside this crate; the in-repo
/// implementation only reads ready-made JSON payloads.
#[cfg_attr(feature = "test-support", mockall::automock)]
pub trait DataSource: Send + Sync {
    fn load_request(&self) -> Result<GenerationRequest, RosterServiceError>;
}

/// Where finished responses go. Spreadsheet export is an external concern;
/// the in-repo implementation writes JSON.
#[cfg_attr(feature = "test-support", mockall::automock)]
pub trait Exporter: Send + Sync {
    fn export(&self, response: &GenerationResponse) -> Result<(), RosterServiceError>;
}
