use std::path::PathBuf;

use crate::domain::orchestrator::{GenerationRequest, GenerationResponse};
use crate::domain::source::{DataSource, Exporter};
use crate::error::RosterServiceError;

/// Reads a generation request payload from a JSON file.
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DataSource for JsonFileSource {
    fn load_request(&self) -> Result<GenerationRequest, RosterServiceError> {
        let raw = std::fs::read_to_string(&self.path)?;
        serde_json::from_str(&raw)
            .map_err(|e| RosterServiceError::InvalidInput(format!("Malformed request payload: {e}")))
    }
}

/// Writes the response payload as pretty JSON, to a file or stdout.
pub struct JsonExporter {
    path: Option<PathBuf>,
}

impl JsonExporter {
    pub fn to_file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn to_stdout() -> Self {
        Self { path: None }
    }
}

impl Exporter for JsonExporter {
    fn export(&self, response: &GenerationResponse) -> Result<(), RosterServiceError> {
        let rendered = serde_json::to_string_pretty(response)?;
        match &self.path {
            Some(path) => std::fs::write(path, rendered)?,
            None => println!("{rendered}"),
        }
        Ok(())
    }
}
