use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::types::{Conflict, Employee, RosterEntry, Station, Store};
use uuid::Uuid;

use crate::config::ServiceConfig;
use crate::domain::demand::{DemandReport, analyze_demand};
use crate::domain::engine::{PeakCoverage, SchedulerEngine};
use crate::domain::matcher::{SkillMatchReport, match_skills};
use crate::domain::repair::{AppliedResolution, RepairEngine};
use crate::domain::solver::{SolveParams, Solver};
use crate::domain::validator::{ValidationReport, Validator};
use crate::error::RosterServiceError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum WorkflowStage {
    Init,
    Demand,
    Match,
    Schedule,
    Validate,
    Resolve,
    Final,
    Complete,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowEntry {
    pub timestamp: DateTime<Utc>,
    pub stage: WorkflowStage,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub store: Store,
    pub employees: Vec<Employee>,
    pub days: Vec<String>,
    #[serde(default = "default_time_limit")]
    pub time_limit_seconds: u64,
}

fn default_time_limit() -> u64 {
    180
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
    Success,
    Partial,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionSummary {
    pub resolutions_applied: usize,
    pub unresolved_count: usize,
    pub resolutions: Vec<AppliedResolution>,
    pub unresolved_conflicts: Vec<Conflict>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub status: GenerationStatus,
    pub roster: Vec<RosterEntry>,
    pub days: Vec<String>,
    pub total_employees: usize,
    pub generation_time_seconds: f64,
    pub demand_analysis: DemandReport,
    pub skill_matching: SkillMatchReport,
    pub initial_validation: ValidationReport,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution_summary: Option<ResolutionSummary>,
    pub final_validation: ValidationReport,
    pub workflow_log: Vec<WorkflowEntry>,
    pub peak_coverage: PeakCoverage,
}

/// Sequences the pipeline: demand → match → schedule → validate → repair →
/// revalidate. Owns the artifacts between phases and the workflow log; no
/// component ever observes a later phase's output.
pub struct Orchestrator {
    config: ServiceConfig,
    solver: Arc<dyn Solver>,
}

impl Orchestrator {
    pub fn new(config: ServiceConfig, solver: Arc<dyn Solver>) -> Self {
        Self { config, solver }
    }

    #[tracing::instrument(
        skip(self, request),
        fields(
            run_id = %Uuid::new_v4(),
            store_id = %request.store.store_id,
            employees = request.employees.len(),
            days = request.days.len(),
        )
    )]
    pub fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, RosterServiceError> {
        let started = Instant::now();
        validate_request(request)?;

        let mut log = Vec::new();
        log_step(&mut log, WorkflowStage::Init, "Starting roster generation workflow");

        log_step(&mut log, WorkflowStage::Demand, "Analyzing staffing demand patterns");
        let demand_analysis = analyze_demand(&request.store, &request.days);
        log_step(
            &mut log,
            WorkflowStage::Demand,
            format!("Completed: {} days analyzed", request.days.len()),
        );

        log_step(&mut log, WorkflowStage::Match, "Matching employee skills to stations");
        let station_requirements = BTreeMap::from([
            (Station::Kitchen, request.store.normal_requirements.kitchen_staff),
            (Station::Counter, request.store.normal_requirements.counter_staff),
            (Station::McCafe, request.store.normal_requirements.mccafe_staff),
        ]);
        let skill_matching = match_skills(&request.employees, &station_requirements);
        log_step(
            &mut log,
            WorkflowStage::Match,
            format!("Completed: {} employees matched", request.employees.len()),
        );

        log_step(
            &mut log,
            WorkflowStage::Schedule,
            "Generating optimized roster with CP solver",
        );
        let engine = SchedulerEngine::new(
            request.employees.clone(),
            request.store.clone(),
            self.config.constraints.clone(),
            request.days.clone(),
            Arc::clone(&self.solver),
        );
        let params = SolveParams {
            time_limit: Duration::from_secs(request.time_limit_seconds),
            num_workers: self.config.solver.num_workers,
            seed: self.config.solver.seed,
        };
        let scheduled = engine.generate(&params);
        log_step(
            &mut log,
            WorkflowStage::Schedule,
            format!("Completed in {}s", scheduled.solve_time_seconds),
        );

        log_step(&mut log, WorkflowStage::Validate, "Validating roster against constraints");
        let validator = Validator::new(self.config.constraints.clone());
        let initial_validation = validator.validate(&scheduled.roster, &request.days, &request.store);
        log_step(
            &mut log,
            WorkflowStage::Validate,
            format!("Found {} conflicts", initial_validation.total_conflicts),
        );

        let (roster, resolution_summary) = if initial_validation.is_valid {
            (scheduled.roster.clone(), None)
        } else {
            log_step(&mut log, WorkflowStage::Resolve, "Resolving scheduling conflicts");
            let repair = RepairEngine::new(&request.employees);
            let outcome = repair.repair(&initial_validation.conflicts, &scheduled.roster);
            log_step(
                &mut log,
                WorkflowStage::Resolve,
                format!("Applied {} resolutions", outcome.resolutions_applied),
            );
            (
                outcome.modified_roster,
                Some(ResolutionSummary {
                    resolutions_applied: outcome.resolutions_applied,
                    unresolved_count: outcome.unresolved_count,
                    resolutions: outcome.resolutions,
                    unresolved_conflicts: outcome.unresolved_conflicts,
                }),
            )
        };

        log_step(&mut log, WorkflowStage::Final, "Running final validation");
        let final_validation = validator.validate(&roster, &request.days, &request.store);

        let status = if final_validation.is_valid {
            GenerationStatus::Success
        } else {
            GenerationStatus::Partial
        };
        let elapsed = round2(started.elapsed().as_secs_f64());
        log_step(
            &mut log,
            WorkflowStage::Complete,
            format!("Workflow completed in {elapsed:.2}s"),
        );
        tracing::info!(?status, elapsed, "Roster generation workflow finished");

        Ok(GenerationResponse {
            status,
            roster,
            days: request.days.clone(),
            total_employees: request.employees.len(),
            generation_time_seconds: elapsed,
            demand_analysis,
            skill_matching,
            initial_validation,
            resolution_summary,
            final_validation,
            workflow_log: log,
            peak_coverage: scheduled.peak_coverage,
        })
    }
}

fn validate_request(request: &GenerationRequest) -> Result<(), RosterServiceError> {
    let mut seen = BTreeSet::new();
    for employee in &request.employees {
        if employee.id.is_empty() {
            return Err(RosterServiceError::InvalidInput(
                "Employee with empty id".to_string(),
            ));
        }
        if !seen.insert(employee.id.as_str()) {
            return Err(RosterServiceError::InvalidInput(format!(
                "Duplicate employee id: {}",
                employee.id
            )));
        }
    }
    Ok(())
}

fn log_step(log: &mut Vec<WorkflowEntry>, stage: WorkflowStage, message: impl Into<String>) {
    let message = message.into();
    tracing::info!(?stage, %message, "Workflow step");
    log.push(WorkflowEntry {
        timestamp: Utc::now(),
        stage,
        message,
    });
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
