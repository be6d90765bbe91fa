use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use shared::calendar;
use shared::types::{Constraints, Employee, RosterEntry, ShiftRecord, Store};

use crate::domain::model::{RosterModel, edge_window_min};
use crate::domain::solver::{SolveParams, SolveStatus, Solver};

/// Lifecycle of one generation: the model is assembled, handed to the
/// solver, and the run ends in a decoded (`Optimal`/`Feasible`) or
/// availability-driven (`Heuristic`) roster.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleStatus {
    Building,
    Solving,
    Optimal,
    Feasible,
    Heuristic,
}

impl ScheduleStatus {
    fn from_solve(status: SolveStatus) -> Self {
        match status {
            SolveStatus::Optimal => ScheduleStatus::Optimal,
            SolveStatus::Feasible => ScheduleStatus::Feasible,
            SolveStatus::Infeasible | SolveStatus::Unknown => ScheduleStatus::Heuristic,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayCoverage {
    pub count: u32,
    pub required: u32,
    pub met: bool,
    pub is_weekend: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageSummary {
    pub lunch_peak_met: bool,
    pub dinner_peak_met: bool,
    pub opening_covered: bool,
    pub closing_covered: bool,
}

/// Per-day coverage metrics plus the weekend-vs-weekday rollup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeakCoverage {
    pub lunch_peak: BTreeMap<String, DayCoverage>,
    pub dinner_peak: BTreeMap<String, DayCoverage>,
    pub opening: BTreeMap<String, DayCoverage>,
    pub closing: BTreeMap<String, DayCoverage>,
    pub weekend_coverage_increase_percent: f64,
    pub weekend_target_percent: f64,
    pub meets_weekend_target: bool,
    pub summary: CoverageSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerResult {
    pub status: ScheduleStatus,
    pub solve_time_seconds: f64,
    pub roster: Vec<RosterEntry>,
    pub days: Vec<String>,
    pub store_id: String,
    pub total_employees: usize,
    pub managers_count: usize,
    pub crew_count: usize,
    pub peak_coverage: PeakCoverage,
}

/// Builds the constraint model, runs the solver, and decodes the outcome
/// into a roster. Infeasible or unknown outcomes fall back to an
/// availability-driven assignment; the validator surfaces whatever that
/// breaks.
pub struct SchedulerEngine {
    employees: Vec<Employee>,
    store: Store,
    constraints: Constraints,
    days: Vec<String>,
    solver: Arc<dyn Solver>,
}

impl SchedulerEngine {
    pub fn new(
        employees: Vec<Employee>,
        store: Store,
        constraints: Constraints,
        days: Vec<String>,
        solver: Arc<dyn Solver>,
    ) -> Self {
        Self {
            employees,
            store,
            constraints,
            days,
            solver,
        }
    }

    #[tracing::instrument(skip(self, params), fields(employees = self.employees.len(), days = self.days.len()))]
    pub fn generate(&self, params: &SolveParams) -> SchedulerResult {
        let started = Instant::now();

        let mut status = ScheduleStatus::Building;
        tracing::debug!(?status, "Assembling constraint model");
        let model = RosterModel::build(&self.employees, &self.store, &self.constraints, &self.days);

        status = ScheduleStatus::Solving;
        tracing::debug!(?status, num_vars = model.cp.num_vars, "Invoking solver");
        let outcome = self.solver.solve(&model.cp, params);

        status = ScheduleStatus::from_solve(outcome.status);
        let roster = if outcome.status.has_assignment() {
            self.decode(&model, &outcome.assignment)
        } else {
            tracing::warn!(
                solver_status = ?outcome.status,
                "Solver produced no assignment, using availability fallback"
            );
            self.fallback()
        };

        let peak_coverage = self.peak_coverage(&roster);
        let managers_count = self.employees.iter().filter(|e| e.is_manager).count();

        tracing::info!(?status, objective = outcome.objective, "Roster generated");

        SchedulerResult {
            status,
            solve_time_seconds: round2(started.elapsed().as_secs_f64()),
            roster,
            days: self.days.clone(),
            store_id: self.store.store_id.clone(),
            total_employees: self.employees.len(),
            managers_count,
            crew_count: self.employees.len() - managers_count,
            peak_coverage,
        }
    }

    fn decode(&self, model: &RosterModel, assignment: &[bool]) -> Vec<RosterEntry> {
        self.employees
            .iter()
            .enumerate()
            .map(|(ei, employee)| {
                let mut shifts = BTreeMap::new();
                for (di, day) in self.days.iter().enumerate() {
                    let record = match model.assigned_shift(assignment, ei, di) {
                        Some(code) => ShiftRecord::from_code(code, Some(employee.primary_station)),
                        None => ShiftRecord::day_off(),
                    };
                    shifts.insert(day.clone(), record);
                }
                Self::entry_for(employee, shifts)
            })
            .collect()
    }

    /// Best-effort roster when the model has no solution: take the first
    /// shift each employee offers per day. No constraint is enforced here.
    fn fallback(&self) -> Vec<RosterEntry> {
        self.employees
            .iter()
            .map(|employee| {
                let mut shifts = BTreeMap::new();
                for day in &self.days {
                    let first = employee
                        .availability
                        .get(day)
                        .and_then(|codes| codes.first().copied());
                    let record = match first {
                        Some(code) if !code.is_day_off() => {
                            ShiftRecord::from_code(code, Some(employee.primary_station))
                        }
                        _ => ShiftRecord::day_off(),
                    };
                    shifts.insert(day.clone(), record);
                }
                Self::entry_for(employee, shifts)
            })
            .collect()
    }

    fn entry_for(employee: &Employee, shifts: BTreeMap<String, ShiftRecord>) -> RosterEntry {
        let mut entry = RosterEntry {
            employee_id: employee.id.clone(),
            employee_name: employee.name.clone(),
            employee_type: employee.employee_type,
            is_manager: employee.is_manager,
            primary_station: employee.primary_station,
            shifts,
            total_hours: 0.0,
        };
        entry.recompute_total_hours();
        entry
    }

    fn peak_coverage(&self, roster: &[RosterEntry]) -> PeakCoverage {
        let total_peak = self.store.peak_requirements.total_staff();
        let edge_required = edge_window_min(self.store.normal_requirements.total_staff());

        let mut lunch_peak = BTreeMap::new();
        let mut dinner_peak = BTreeMap::new();
        let mut opening = BTreeMap::new();
        let mut closing = BTreeMap::new();

        let mut weekend_sum = 0u32;
        let mut weekday_sum = 0u32;
        let mut weekend_days = 0u32;
        let mut weekday_days = 0u32;

        for day in &self.days {
            let is_weekend = calendar::is_weekend(day);

            let mut lunch_count = 0u32;
            let mut dinner_count = 0u32;
            let mut opening_count = 0u32;
            let mut closing_count = 0u32;
            for entry in roster {
                let Some(record) = entry.shifts.get(day) else {
                    continue;
                };
                if !record.is_working() {
                    continue;
                }
                let code = record.shift_code;
                if code.covers_lunch_peak() {
                    lunch_count += 1;
                }
                if code.covers_dinner_peak() {
                    dinner_count += 1;
                }
                if code.is_opening() {
                    opening_count += 1;
                }
                if code.is_closing() {
                    closing_count += 1;
                }
            }

            let peak_required = self.constraints.peak_requirement(total_peak, is_weekend);
            lunch_peak.insert(
                day.clone(),
                DayCoverage {
                    count: lunch_count,
                    required: peak_required,
                    met: lunch_count >= peak_required,
                    is_weekend,
                },
            );
            dinner_peak.insert(
                day.clone(),
                DayCoverage {
                    count: dinner_count,
                    required: peak_required,
                    met: dinner_count >= peak_required,
                    is_weekend,
                },
            );
            opening.insert(
                day.clone(),
                DayCoverage {
                    count: opening_count,
                    required: edge_required,
                    met: opening_count >= edge_required,
                    is_weekend,
                },
            );
            closing.insert(
                day.clone(),
                DayCoverage {
                    count: closing_count,
                    required: edge_required,
                    met: closing_count >= edge_required,
                    is_weekend,
                },
            );

            if is_weekend {
                weekend_sum += lunch_count + dinner_count;
                weekend_days += 1;
            } else {
                weekday_sum += lunch_count + dinner_count;
                weekday_days += 1;
            }
        }

        let avg_weekday = if weekday_days > 0 {
            f64::from(weekday_sum) / f64::from(weekday_days)
        } else {
            0.0
        };
        let avg_weekend = if weekend_days > 0 {
            f64::from(weekend_sum) / f64::from(weekend_days)
        } else {
            0.0
        };
        let increase_percent = if avg_weekday > 0.0 {
            round1((avg_weekend / avg_weekday - 1.0) * 100.0)
        } else {
            0.0
        };
        let target = self.constraints.weekend_coverage_increase_percent;

        let summary = CoverageSummary {
            lunch_peak_met: lunch_peak.values().all(|c| c.met),
            dinner_peak_met: dinner_peak.values().all(|c| c.met),
            opening_covered: opening.values().all(|c| c.met),
            closing_covered: closing.values().all(|c| c.met),
        };

        PeakCoverage {
            lunch_peak,
            dinner_peak,
            opening,
            closing,
            weekend_coverage_increase_percent: increase_percent,
            weekend_target_percent: target,
            meets_weekend_target: increase_percent >= target * 0.9,
            summary,
        }
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use shared::shifts::ShiftCode;
    use shared::types::{EmployeeType, LocationType, StaffingRequirement, Station};

    use super::*;
    use crate::domain::solver::{MockSolver, SolveOutcome};

    fn store(total_each: u32) -> Store {
        let req = StaffingRequirement {
            kitchen_staff: total_each / 2,
            counter_staff: total_each - total_each / 2,
            ..StaffingRequirement::default()
        };
        Store {
            store_id: "store_1".to_string(),
            location_type: LocationType::Suburban,
            normal_requirements: req,
            peak_requirements: req,
            opening_time: "06:30".to_string(),
            closing_time: "23:00".to_string(),
            lunch_peak_start: 11,
            lunch_peak_end: 14,
            dinner_peak_start: 17,
            dinner_peak_end: 21,
            min_managers_on_duty: 1,
            peak_managers_on_duty: 2,
        }
    }

    fn employee(id: &str, available: &[(&str, &[ShiftCode])]) -> Employee {
        Employee {
            id: id.to_string(),
            name: id.to_string(),
            employee_type: EmployeeType::Casual,
            primary_station: Station::Counter,
            certified_stations: vec![],
            is_manager: false,
            availability: available
                .iter()
                .map(|(day, codes)| (day.to_string(), codes.to_vec()))
                .collect(),
        }
    }

    fn engine_with(solver: MockSolver, employees: Vec<Employee>, days: Vec<String>) -> SchedulerEngine {
        SchedulerEngine::new(
            employees,
            store(4),
            Constraints::default(),
            days,
            Arc::new(solver),
        )
    }

    #[test]
    fn feasible_outcome_is_decoded_from_the_assignment() {
        let days = vec!["2026-08-03".to_string()];
        let employees = vec![employee("e1", &[("2026-08-03", &[ShiftCode::DayShift])])];

        let mut solver = MockSolver::new();
        solver.expect_solve().returning(|model, _| {
            let mut assignment = vec![false; model.num_vars];
            // single employee, single day: S is variable 0
            assignment[0] = true;
            SolveOutcome {
                status: SolveStatus::Feasible,
                assignment,
                objective: 0,
            }
        });

        let result = engine_with(solver, employees, days).generate(&SolveParams::default());

        assert_eq!(result.status, ScheduleStatus::Feasible);
        let record = &result.roster[0].shifts["2026-08-03"];
        assert_eq!(record.shift_code, ShiftCode::DayShift);
        assert_eq!(record.hours, 8.5);
        assert_eq!(record.station, Some(Station::Counter));
        assert_eq!(result.roster[0].total_hours, 8.5);
    }

    #[test]
    fn unassigned_days_become_day_off() {
        let days = vec!["2026-08-03".to_string(), "2026-08-04".to_string()];
        let employees = vec![employee("e1", &[("2026-08-03", &[ShiftCode::DayShift])])];

        let mut solver = MockSolver::new();
        solver.expect_solve().returning(|model, _| {
            let mut assignment = vec![false; model.num_vars];
            assignment[0] = true;
            SolveOutcome {
                status: SolveStatus::Optimal,
                assignment,
                objective: 0,
            }
        });

        let result = engine_with(solver, employees, days).generate(&SolveParams::default());

        assert_eq!(result.status, ScheduleStatus::Optimal);
        assert_eq!(result.roster[0].shifts.len(), 2);
        assert!(!result.roster[0].shifts["2026-08-04"].is_working());
    }

    #[test]
    fn infeasible_outcome_falls_back_to_first_offered_shift() {
        let days = vec!["2026-08-03".to_string()];
        let employees = vec![
            employee("e1", &[("2026-08-03", &[ShiftCode::SecondHalf, ShiftCode::DayShift])]),
            employee("e2", &[]),
            employee("e3", &[("2026-08-03", &[ShiftCode::DayOff])]),
        ];

        let mut solver = MockSolver::new();
        solver.expect_solve().returning(|model, _| {
            SolveOutcome::without_assignment(SolveStatus::Infeasible, model.num_vars)
        });

        let result = engine_with(solver, employees, days).generate(&SolveParams::default());

        assert_eq!(result.status, ScheduleStatus::Heuristic);
        assert_eq!(
            result.roster[0].shifts["2026-08-03"].shift_code,
            ShiftCode::SecondHalf
        );
        assert!(!result.roster[1].shifts["2026-08-03"].is_working());
        assert!(!result.roster[2].shifts["2026-08-03"].is_working());
    }

    #[test]
    fn peak_coverage_counts_and_requirements() {
        // Saturday: peak total 4 -> ceil(4 * 1.2) = 5 required
        let days = vec!["2026-08-01".to_string()];
        let employees: Vec<Employee> = (0..3)
            .map(|i| {
                employee(
                    &format!("e{i}"),
                    &[("2026-08-01", &[ShiftCode::FullDay])],
                )
            })
            .collect();

        let mut solver = MockSolver::new();
        solver.expect_solve().returning(|model, _| {
            let mut assignment = vec![false; model.num_vars];
            // assign 3F (catalog index 3) to all three employees
            for e in 0..3 {
                assignment[e * 6 + 3] = true;
            }
            SolveOutcome {
                status: SolveStatus::Feasible,
                assignment,
                objective: 0,
            }
        });

        let result = engine_with(solver, employees, days).generate(&SolveParams::default());
        let lunch = &result.peak_coverage.lunch_peak["2026-08-01"];
        assert_eq!(lunch.count, 3);
        assert_eq!(lunch.required, 5);
        assert!(!lunch.met);
        assert!(lunch.is_weekend);
        // 3F is neither opening nor closing
        assert_eq!(result.peak_coverage.opening["2026-08-01"].count, 0);
        assert!(!result.peak_coverage.summary.lunch_peak_met);
    }

    #[test]
    fn manager_and_crew_counts() {
        let days = vec!["2026-08-03".to_string()];
        let mut manager = employee("m1", &[]);
        manager.is_manager = true;
        let employees = vec![manager, employee("e1", &[])];

        let mut solver = MockSolver::new();
        solver.expect_solve().returning(|model, _| {
            SolveOutcome::without_assignment(SolveStatus::Unknown, model.num_vars)
        });

        let result = engine_with(solver, employees, days).generate(&SolveParams::default());
        assert_eq!(result.total_employees, 2);
        assert_eq!(result.managers_count, 1);
        assert_eq!(result.crew_count, 1);
    }
}
