use serde::{Deserialize, Serialize};
use shared::shifts::ShiftCode;
use shared::types::{
    ChangeField, ChangeValue, Conflict, ConflictKind, Employee, Resolution, ResolutionChange,
    RosterEntry, ShiftRecord,
};

/// Only the best few options are kept per conflict.
const MAX_OPTIONS: usize = 5;
/// How many of the longest shifts are considered when trimming hours.
const TRIM_CANDIDATES: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppliedResolution {
    pub conflict: Conflict,
    pub resolution: Resolution,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairOutcome {
    pub modified_roster: Vec<RosterEntry>,
    pub resolutions_applied: usize,
    pub unresolved_count: usize,
    pub resolutions: Vec<AppliedResolution>,
    pub unresolved_conflicts: Vec<Conflict>,
}

/// Proposes and applies local fixes for validation conflicts, most severe
/// first. Works on its own copy of the roster; the single pass never loops,
/// re-validation is the orchestrator's job.
pub struct RepairEngine<'a> {
    employees: &'a [Employee],
}

impl<'a> RepairEngine<'a> {
    pub fn new(employees: &'a [Employee]) -> Self {
        Self { employees }
    }

    #[tracing::instrument(skip_all, fields(conflicts = conflicts.len()))]
    pub fn repair(&self, conflicts: &[Conflict], roster: &[RosterEntry]) -> RepairOutcome {
        let mut working = roster.to_vec();

        let mut ordered: Vec<&Conflict> = conflicts.iter().collect();
        ordered.sort_by_key(|c| c.severity);

        let mut resolutions = Vec::new();
        let mut unresolved = Vec::new();

        for conflict in ordered {
            let mut options = self.suggest_resolutions(conflict, &working);
            let applied = if options.is_empty() {
                false
            } else {
                let best = options.remove(0);
                if apply_resolution(&mut working, &best) {
                    resolutions.push(AppliedResolution {
                        conflict: conflict.clone(),
                        resolution: best,
                    });
                    true
                } else {
                    false
                }
            };
            if !applied {
                unresolved.push(conflict.clone());
            }
        }

        tracing::info!(
            applied = resolutions.len(),
            unresolved = unresolved.len(),
            "Repair pass finished"
        );

        RepairOutcome {
            modified_roster: working,
            resolutions_applied: resolutions.len(),
            unresolved_count: unresolved.len(),
            resolutions,
            unresolved_conflicts: unresolved,
        }
    }

    /// Ranked candidate fixes for one conflict, best (lowest impact) first.
    pub fn suggest_resolutions(&self, conflict: &Conflict, roster: &[RosterEntry]) -> Vec<Resolution> {
        let mut options = match conflict.kind {
            ConflictKind::RestPeriodViolation => rest_period_options(conflict),
            ConflictKind::MaxHoursExceeded => max_hours_options(conflict, roster),
            ConflictKind::MinHoursNotMet => min_hours_options(conflict, roster),
            ConflictKind::Understaffed => self.extra_staff_options(conflict, roster, false),
            ConflictKind::NoManager => self.extra_staff_options(conflict, roster, true),
            ConflictKind::SkillMismatch => self.skill_mismatch_options(conflict, roster),
            _ => vec![Resolution {
                description: format!("Manual review required for {}", conflict.kind),
                impact_score: 10.0,
                changes: vec![],
            }],
        };
        options.sort_by(|a, b| a.impact_score.total_cmp(&b.impact_score));
        options.truncate(MAX_OPTIONS);
        options
    }

    /// Candidates for drafting extra staff onto an understaffed day: anyone
    /// off that day with an availability entry for it. An employee with no
    /// availability at all also counts as reachable.
    fn extra_staff_options(
        &self,
        conflict: &Conflict,
        roster: &[RosterEntry],
        managers_only: bool,
    ) -> Vec<Resolution> {
        let mut options = Vec::new();
        for day in &conflict.days {
            for employee in self.employees {
                if managers_only && !employee.is_manager {
                    continue;
                }
                let Some(entry) = roster.iter().find(|e| e.employee_id == employee.id) else {
                    continue;
                };
                let off_that_day = entry
                    .shifts
                    .get(day)
                    .is_some_and(|record| !record.is_working());
                if off_that_day && employee.has_availability_for(day) {
                    let description = if managers_only {
                        format!("Add Manager {} to work on {day}", employee.name)
                    } else {
                        format!("Add {} to work on {day}", employee.name)
                    };
                    options.push(Resolution {
                        description,
                        impact_score: if managers_only { 1.0 } else { 1.5 },
                        changes: vec![ResolutionChange::set_shift(
                            &employee.id,
                            day,
                            ShiftCode::DayShift,
                        )],
                    });
                }
            }
        }
        options
    }

    fn skill_mismatch_options(&self, conflict: &Conflict, roster: &[RosterEntry]) -> Vec<Resolution> {
        let Some(station) = conflict.station else {
            return Vec::new();
        };
        let Some(day) = conflict.days.first() else {
            return Vec::new();
        };

        let mut options = Vec::new();
        for employee in self.employees {
            if !employee.can_work_station(station) {
                continue;
            }
            let Some(entry) = roster.iter().find(|e| e.employee_id == employee.id) else {
                continue;
            };
            let current = entry.shifts.get(day).and_then(|record| record.station);
            if current != Some(station) {
                options.push(Resolution {
                    description: format!("Reassign {} to {station} on {day}", employee.name),
                    impact_score: 2.0,
                    changes: vec![ResolutionChange::set_station(&employee.id, day, station)],
                });
            }
        }
        options
    }
}

fn rest_period_options(conflict: &Conflict) -> Vec<Resolution> {
    let Some(employee_id) = conflict.employee_id.as_deref() else {
        return Vec::new();
    };
    if conflict.days.len() < 2 {
        return Vec::new();
    }
    let (first_day, second_day) = (&conflict.days[0], &conflict.days[1]);

    vec![
        Resolution {
            description: format!("Change shift on {first_day} to First Half (ends earlier)"),
            impact_score: 2.0,
            changes: vec![ResolutionChange::set_shift(
                employee_id,
                first_day,
                ShiftCode::FirstHalf,
            )],
        },
        Resolution {
            description: format!("Change shift on {second_day} to Second Half (starts later)"),
            impact_score: 2.0,
            changes: vec![ResolutionChange::set_shift(
                employee_id,
                second_day,
                ShiftCode::SecondHalf,
            )],
        },
        Resolution {
            description: format!("Give day off on {second_day}"),
            impact_score: 4.0,
            changes: vec![ResolutionChange::set_shift(
                employee_id,
                second_day,
                ShiftCode::DayOff,
            )],
        },
    ]
}

fn max_hours_options(conflict: &Conflict, roster: &[RosterEntry]) -> Vec<Resolution> {
    let Some(employee_id) = conflict.employee_id.as_deref() else {
        return Vec::new();
    };
    let Some(entry) = roster.iter().find(|e| e.employee_id == employee_id) else {
        return Vec::new();
    };

    let mut worked: Vec<(&String, f64, ShiftCode)> = entry
        .shifts
        .iter()
        .filter(|(_, record)| record.hours > 0.0)
        .map(|(day, record)| (day, record.hours, record.shift_code))
        .collect();
    worked.sort_by(|a, b| b.1.total_cmp(&a.1));

    let mut options = Vec::new();
    for (day, hours, code) in worked.into_iter().take(TRIM_CANDIDATES) {
        options.push(Resolution {
            description: format!("Remove shift on {day} ({hours:.1}h)"),
            impact_score: hours / 2.0,
            changes: vec![ResolutionChange::set_shift(
                employee_id,
                day,
                ShiftCode::DayOff,
            )],
        });
        if code == ShiftCode::FullDay {
            options.push(Resolution {
                description: format!("Reduce {day} to half shift (1F)"),
                impact_score: hours / 4.0,
                changes: vec![ResolutionChange::set_shift(
                    employee_id,
                    day,
                    ShiftCode::FirstHalf,
                )],
            });
        }
    }
    options
}

fn min_hours_options(conflict: &Conflict, roster: &[RosterEntry]) -> Vec<Resolution> {
    let Some(employee_id) = conflict.employee_id.as_deref() else {
        return Vec::new();
    };
    let Some(entry) = roster.iter().find(|e| e.employee_id == employee_id) else {
        return Vec::new();
    };

    entry
        .shifts
        .iter()
        .filter(|(_, record)| !record.is_working())
        .map(|(day, _)| Resolution {
            description: format!(
                "Add Day Shift on {day} (+{:.1}h)",
                ShiftCode::DayShift.hours()
            ),
            impact_score: 1.0,
            changes: vec![ResolutionChange::set_shift(
                employee_id,
                day,
                ShiftCode::DayShift,
            )],
        })
        .collect()
}

/// Applies every change of a resolution, or nothing at all. A change lands
/// only when its (employee, day) target exists in the working roster.
fn apply_resolution(roster: &mut [RosterEntry], resolution: &Resolution) -> bool {
    if resolution.changes.is_empty() {
        return false;
    }

    let targets_exist = resolution.changes.iter().all(|change| {
        roster
            .iter()
            .find(|e| e.employee_id == change.employee_id)
            .is_some_and(|entry| entry.shifts.contains_key(&change.day))
    });
    if !targets_exist {
        return false;
    }

    for change in &resolution.changes {
        let Some(entry) = roster
            .iter_mut()
            .find(|e| e.employee_id == change.employee_id)
        else {
            return false;
        };
        let Some(record) = entry.shifts.get_mut(&change.day) else {
            return false;
        };
        match (change.field, change.new_value) {
            (ChangeField::ShiftCode, ChangeValue::Shift(code)) => {
                let station = if code.is_day_off() {
                    None
                } else {
                    record.station.or(Some(entry.primary_station))
                };
                *record = ShiftRecord::from_code(code, station);
                entry.recompute_total_hours();
            }
            (ChangeField::Station, ChangeValue::Station(station)) => {
                record.station = Some(station);
            }
            _ => return false,
        }
    }
    true
}
