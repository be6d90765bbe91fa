use std::env;
use std::process::ExitCode;
use std::sync::Arc;

use roster_service::config::ServiceConfig;
use roster_service::domain::orchestrator::Orchestrator;
use roster_service::domain::source::{DataSource, Exporter};
use roster_service::error::RosterServiceError;
use roster_service::infrastructure::json::{JsonExporter, JsonFileSource};
use roster_service::infrastructure::solver::LocalSearchSolver;

fn main() -> ExitCode {
    shared::telemetry::init_telemetry();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Roster generation failed: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), RosterServiceError> {
    let mut args = env::args().skip(1);
    let request_path = args.next().ok_or_else(|| {
        RosterServiceError::InvalidInput("Usage: roster-service <request.json> [output.json]".into())
    })?;
    let output_path = args.next();

    let config_path = env::var("ROSTER_CONFIG_PATH").unwrap_or_else(|_| "roster.toml".to_string());
    let config = ServiceConfig::load(&config_path)?;

    let source = JsonFileSource::new(&request_path);
    let exporter = match output_path {
        Some(path) => JsonExporter::to_file(path),
        None => JsonExporter::to_stdout(),
    };

    let orchestrator = Orchestrator::new(config, Arc::new(LocalSearchSolver));

    let request = source.load_request()?;
    tracing::info!(
        store_id = %request.store.store_id,
        employees = request.employees.len(),
        days = request.days.len(),
        "Loaded generation request"
    );

    let response = orchestrator.generate(&request)?;
    exporter.export(&response)?;

    Ok(())
}
