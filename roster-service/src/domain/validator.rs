use serde::{Deserialize, Serialize};
use shared::calendar;
use shared::types::{Conflict, ConflictKind, Constraints, PeakPeriod, RosterEntry, Severity, Store};

/// Outcome of one validation pass. `is_valid` depends only on hard
/// conflicts (critical or high); warnings never invalidate a roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub conflicts: Vec<Conflict>,
    pub warnings: Vec<Conflict>,
    pub total_conflicts: usize,
    pub total_warnings: usize,
    pub hard_constraint_violations: usize,
}

impl ValidationReport {
    fn from_findings(conflicts: Vec<Conflict>, warnings: Vec<Conflict>) -> Self {
        let hard_constraint_violations = conflicts.iter().filter(|c| c.is_hard()).count();
        Self {
            is_valid: hard_constraint_violations == 0,
            total_conflicts: conflicts.len(),
            total_warnings: warnings.len(),
            conflicts,
            warnings,
            hard_constraint_violations,
        }
    }
}

/// Re-checks a roster against the full constraint taxonomy, with no
/// knowledge of how the roster was produced. Pure over its inputs.
pub struct Validator {
    constraints: Constraints,
}

impl Validator {
    pub fn new(constraints: Constraints) -> Self {
        Self { constraints }
    }

    #[tracing::instrument(skip(self, roster, store), fields(days = days.len()))]
    pub fn validate(
        &self,
        roster: &[RosterEntry],
        days: &[String],
        store: &Store,
    ) -> ValidationReport {
        let mut conflicts = Vec::new();
        let mut warnings = Vec::new();

        for entry in roster {
            self.check_employee(entry, days, &mut conflicts, &mut warnings);
        }
        self.check_daily_coverage(roster, days, store, &mut conflicts);

        let report = ValidationReport::from_findings(conflicts, warnings);
        tracing::info!(
            conflicts = report.total_conflicts,
            warnings = report.total_warnings,
            is_valid = report.is_valid,
            "Roster validated"
        );
        report
    }

    fn check_employee(
        &self,
        entry: &RosterEntry,
        days: &[String],
        conflicts: &mut Vec<Conflict>,
        warnings: &mut Vec<Conflict>,
    ) {
        let mut total_hours = 0.0;
        let mut prev_day: Option<&str> = None;
        let mut prev_working = false;
        let mut prev_closing = false;
        let mut consecutive_work_days = 0u32;

        for day in days {
            let record = entry.shifts.get(day);
            let working = record.is_some_and(|r| r.is_working());

            if let Some(record) = record.filter(|r| r.is_working()) {
                total_hours += record.hours;
                consecutive_work_days += 1;

                if prev_working && prev_closing && record.shift_code.is_opening() {
                    conflicts.push(Conflict {
                        kind: ConflictKind::RestPeriodViolation,
                        severity: Severity::Critical,
                        description: format!(
                            "{}: Less than {}h rest between {} and {}",
                            entry.employee_name,
                            self.constraints.min_rest_between_shifts_hours,
                            prev_day.unwrap_or_default(),
                            day
                        ),
                        employee_id: Some(entry.employee_id.clone()),
                        days: vec![prev_day.unwrap_or_default().to_string(), day.clone()],
                        station: None,
                        period: None,
                    });
                }
            } else {
                consecutive_work_days = 0;
            }

            if consecutive_work_days > self.constraints.max_consecutive_days {
                conflicts.push(Conflict {
                    kind: ConflictKind::LaborLawViolation,
                    severity: Severity::High,
                    description: format!(
                        "{}: Working more than {} consecutive days",
                        entry.employee_name, self.constraints.max_consecutive_days
                    ),
                    employee_id: Some(entry.employee_id.clone()),
                    days: vec![day.clone()],
                    station: None,
                    period: None,
                });
            }

            prev_closing = record.is_some_and(|r| r.shift_code.is_closing());
            prev_working = working;
            prev_day = Some(day);
        }

        let (min_weekly, max_weekly) = self.constraints.hour_limits(entry.employee_type);
        let weeks = f64::from(calendar::horizon_weeks(days.len()));

        if total_hours < min_weekly * weeks {
            warnings.push(Conflict {
                kind: ConflictKind::MinHoursNotMet,
                severity: Severity::Medium,
                description: format!(
                    "{}: {:.1}h is below minimum {:.1}h",
                    entry.employee_name,
                    total_hours,
                    min_weekly * weeks
                ),
                employee_id: Some(entry.employee_id.clone()),
                days: vec![],
                station: None,
                period: None,
            });
        }

        if total_hours > max_weekly * weeks {
            conflicts.push(Conflict {
                kind: ConflictKind::MaxHoursExceeded,
                severity: Severity::High,
                description: format!(
                    "{}: {:.1}h exceeds maximum {:.1}h",
                    entry.employee_name,
                    total_hours,
                    max_weekly * weeks
                ),
                employee_id: Some(entry.employee_id.clone()),
                days: vec![],
                station: None,
                period: None,
            });
        }
    }

    fn check_daily_coverage(
        &self,
        roster: &[RosterEntry],
        days: &[String],
        store: &Store,
        conflicts: &mut Vec<Conflict>,
    ) {
        let min_staff = store.normal_requirements.total_staff();
        let total_peak = store.peak_requirements.total_staff();

        for day in days {
            let is_weekend = calendar::is_weekend(day);

            let mut staff_count = 0u32;
            let mut manager_count = 0u32;
            let mut lunch_count = 0u32;
            let mut dinner_count = 0u32;
            for entry in roster {
                let Some(record) = entry.shifts.get(day).filter(|r| r.is_working()) else {
                    continue;
                };
                staff_count += 1;
                if entry.is_manager {
                    manager_count += 1;
                }
                if record.shift_code.covers_lunch_peak() {
                    lunch_count += 1;
                }
                if record.shift_code.covers_dinner_peak() {
                    dinner_count += 1;
                }
            }

            if staff_count < min_staff {
                conflicts.push(Conflict {
                    kind: ConflictKind::Understaffed,
                    severity: Severity::High,
                    description: format!(
                        "{day}: Only {staff_count} staff scheduled, need {min_staff}"
                    ),
                    employee_id: None,
                    days: vec![day.clone()],
                    station: None,
                    period: None,
                });
            }

            if manager_count < self.constraints.min_managers_always {
                conflicts.push(Conflict {
                    kind: ConflictKind::NoManager,
                    severity: Severity::Critical,
                    description: format!("{day}: No manager scheduled for duty"),
                    employee_id: None,
                    days: vec![day.clone()],
                    station: None,
                    period: None,
                });
            }

            let required_peak = self.constraints.peak_requirement(total_peak, is_weekend);
            let uplift_note = if is_weekend { " (+20% weekend)" } else { "" };

            if lunch_count < required_peak {
                conflicts.push(Conflict {
                    kind: ConflictKind::PeakUnderstaffed,
                    severity: Severity::High,
                    description: format!(
                        "{day}: Lunch peak ({:02}:00-{:02}:00) has {lunch_count} staff, need {required_peak}{uplift_note}",
                        store.lunch_peak_start, store.lunch_peak_end
                    ),
                    employee_id: None,
                    days: vec![day.clone()],
                    station: None,
                    period: Some(PeakPeriod::LunchPeak),
                });
            }

            if dinner_count < required_peak {
                conflicts.push(Conflict {
                    kind: ConflictKind::PeakUnderstaffed,
                    severity: Severity::High,
                    description: format!(
                        "{day}: Dinner peak ({:02}:00-{:02}:00) has {dinner_count} staff, need {required_peak}{uplift_note}",
                        store.dinner_peak_start, store.dinner_peak_end
                    ),
                    employee_id: None,
                    days: vec![day.clone()],
                    station: None,
                    period: Some(PeakPeriod::DinnerPeak),
                });
            }
        }
    }
}
