use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::shifts::ShiftCode;

// region: Workforce

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum EmployeeType {
    FullTime,
    PartTime,
    Casual,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Station {
    Kitchen,
    Counter,
    McCafe,
    Dessert,
    MultiStation,
    MultiStationMcCafe,
}

impl Station {
    pub fn is_multi(self) -> bool {
        matches!(self, Station::MultiStation | Station::MultiStationMcCafe)
    }
}

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Station::Kitchen => "Kitchen",
            Station::Counter => "Counter",
            Station::McCafe => "McCafe",
            Station::Dessert => "Dessert",
            Station::MultiStation => "MultiStation",
            Station::MultiStationMcCafe => "MultiStationMcCafe",
        };
        f.write_str(name)
    }
}

/// An employee as loaded from the workforce data. Immutable for the duration
/// of a generation run.
///
/// `availability` maps a day-key to the shift codes the employee offers for
/// that day, in preference order. A missing day-key means unavailable; a day
/// listing only `/` is equivalent to unavailable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub id: String,
    pub name: String,
    pub employee_type: EmployeeType,
    pub primary_station: Station,
    #[serde(default)]
    pub certified_stations: Vec<Station>,
    #[serde(default)]
    pub is_manager: bool,
    #[serde(default)]
    pub availability: BTreeMap<String, Vec<ShiftCode>>,
}

impl Employee {
    /// Station eligibility: primary match, explicit certification, or the
    /// multi-station rules (`MultiStation*` covers Kitchen/Counter, and
    /// `MultiStationMcCafe` additionally covers McCafe).
    pub fn can_work_station(&self, station: Station) -> bool {
        if self.primary_station == station {
            return true;
        }
        if self.certified_stations.contains(&station) {
            return true;
        }
        if self.primary_station.is_multi() && matches!(station, Station::Kitchen | Station::Counter)
        {
            return true;
        }
        self.primary_station == Station::MultiStationMcCafe && station == Station::McCafe
    }

    /// Whether the employee has an availability record for `day`. An employee
    /// with no availability at all counts as reachable; the repair engine
    /// relies on this when drafting extra staff.
    pub fn has_availability_for(&self, day: &str) -> bool {
        self.availability.is_empty() || self.availability.contains_key(day)
    }

    /// The shift codes the employee offers on `day`, excluding the day-off
    /// sentinel. Empty when the employee is unavailable.
    pub fn offered_shifts(&self, day: &str) -> Vec<ShiftCode> {
        self.availability
            .get(day)
            .map(|codes| codes.iter().copied().filter(|c| !c.is_day_off()).collect())
            .unwrap_or_default()
    }
}

// endregion: Workforce

// region: Store

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LocationType {
    CBDCore,
    Suburban,
    Highway,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StaffingRequirement {
    pub kitchen_staff: u32,
    pub counter_staff: u32,
    #[serde(default)]
    pub mccafe_staff: u32,
    #[serde(default)]
    pub dessert_station_staff: u32,
    #[serde(default)]
    pub offline_dessert_station_staff: u32,
}

impl StaffingRequirement {
    pub fn total_staff(&self) -> u32 {
        self.kitchen_staff
            + self.counter_staff
            + self.mccafe_staff
            + self.dessert_station_staff
            + self.offline_dessert_station_staff
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Store {
    pub store_id: String,
    pub location_type: LocationType,
    pub normal_requirements: StaffingRequirement,
    pub peak_requirements: StaffingRequirement,
    #[serde(default = "default_opening_time")]
    pub opening_time: String,
    #[serde(default = "default_closing_time")]
    pub closing_time: String,
    #[serde(default = "default_lunch_peak_start")]
    pub lunch_peak_start: u32,
    #[serde(default = "default_lunch_peak_end")]
    pub lunch_peak_end: u32,
    #[serde(default = "default_dinner_peak_start")]
    pub dinner_peak_start: u32,
    #[serde(default = "default_dinner_peak_end")]
    pub dinner_peak_end: u32,
    #[serde(default = "default_min_managers")]
    pub min_managers_on_duty: u32,
    #[serde(default = "default_peak_managers")]
    pub peak_managers_on_duty: u32,
}

fn default_opening_time() -> String {
    "06:30".to_string()
}

fn default_closing_time() -> String {
    "23:00".to_string()
}

fn default_lunch_peak_start() -> u32 {
    11
}

fn default_lunch_peak_end() -> u32 {
    14
}

fn default_dinner_peak_start() -> u32 {
    17
}

fn default_dinner_peak_end() -> u32 {
    21
}

fn default_min_managers() -> u32 {
    1
}

fn default_peak_managers() -> u32 {
    2
}

impl Store {
    pub fn requirements(&self, is_peak: bool) -> &StaffingRequirement {
        if is_peak {
            &self.peak_requirements
        } else {
            &self.normal_requirements
        }
    }

    pub fn is_peak_hour(&self, hour: u32) -> bool {
        (self.lunch_peak_start <= hour && hour < self.lunch_peak_end)
            || (self.dinner_peak_start <= hour && hour < self.dinner_peak_end)
    }

    pub fn has_mccafe(&self) -> bool {
        self.normal_requirements.mccafe_staff > 0
    }

    pub fn has_dessert_station(&self) -> bool {
        self.normal_requirements.dessert_station_staff > 0
    }
}

// endregion: Store

// region: Labor constraints

/// Labor-law and operational limits applied to every roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Constraints {
    pub min_rest_between_shifts_hours: f64,
    pub full_time_min_hours: f64,
    pub full_time_max_hours: f64,
    pub part_time_min_hours: f64,
    pub part_time_max_hours: f64,
    pub casual_min_hours: f64,
    pub casual_max_hours: f64,
    pub max_hours_per_day: f64,
    pub min_hours_per_shift: f64,
    pub break_after_hours: f64,
    pub break_duration_minutes: u32,
    pub min_managers_always: u32,
    pub min_managers_opening: u32,
    pub min_managers_closing: u32,
    pub min_managers_peak: u32,
    pub weekend_coverage_increase_percent: f64,
    pub max_consecutive_days: u32,
    pub preferred_consecutive_days_off: u32,
}

impl Default for Constraints {
    fn default() -> Self {
        Self {
            min_rest_between_shifts_hours: 10.0,
            full_time_min_hours: 35.0,
            full_time_max_hours: 38.0,
            part_time_min_hours: 20.0,
            part_time_max_hours: 32.0,
            casual_min_hours: 8.0,
            casual_max_hours: 24.0,
            max_hours_per_day: 12.0,
            min_hours_per_shift: 3.0,
            break_after_hours: 5.0,
            break_duration_minutes: 30,
            min_managers_always: 1,
            min_managers_opening: 1,
            min_managers_closing: 1,
            min_managers_peak: 2,
            weekend_coverage_increase_percent: 20.0,
            max_consecutive_days: 6,
            preferred_consecutive_days_off: 2,
        }
    }
}

impl Constraints {
    /// Weekly `(min, max)` hour bounds for an employee type.
    pub fn hour_limits(&self, employee_type: EmployeeType) -> (f64, f64) {
        match employee_type {
            EmployeeType::FullTime => (self.full_time_min_hours, self.full_time_max_hours),
            EmployeeType::PartTime => (self.part_time_min_hours, self.part_time_max_hours),
            EmployeeType::Casual => (self.casual_min_hours, self.casual_max_hours),
        }
    }

    /// Headcount required during a peak window, weekend-adjusted. Rounds up:
    /// a fractional body means one more person on the floor.
    pub fn peak_requirement(&self, total_peak: u32, is_weekend: bool) -> u32 {
        if is_weekend {
            let scaled =
                f64::from(total_peak) * (1.0 + self.weekend_coverage_increase_percent / 100.0);
            scaled.ceil() as u32
        } else {
            total_peak
        }
    }
}

// endregion: Labor constraints

// region: Conflicts and resolutions

/// Conflict taxonomy exposed on the surface. Several kinds are declared for
/// interoperability with older consumers and are never emitted by the
/// validator (`availability_conflict`, `double_booking`, `overstaffed`,
/// `uneven_distribution`, `preference_not_met`, `consecutive_days`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    LaborLawViolation,
    RestPeriodViolation,
    MaxHoursExceeded,
    MinHoursNotMet,
    SkillMismatch,
    Understaffed,
    NoManager,
    AvailabilityConflict,
    DoubleBooking,
    PreferenceNotMet,
    UnevenDistribution,
    ConsecutiveDays,
    Overstaffed,
    PeakUnderstaffed,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConflictKind::LaborLawViolation => "labor_law_violation",
            ConflictKind::RestPeriodViolation => "rest_period_violation",
            ConflictKind::MaxHoursExceeded => "max_hours_exceeded",
            ConflictKind::MinHoursNotMet => "min_hours_not_met",
            ConflictKind::SkillMismatch => "skill_mismatch",
            ConflictKind::Understaffed => "understaffed",
            ConflictKind::NoManager => "no_manager",
            ConflictKind::AvailabilityConflict => "availability_conflict",
            ConflictKind::DoubleBooking => "double_booking",
            ConflictKind::PreferenceNotMet => "preference_not_met",
            ConflictKind::UnevenDistribution => "uneven_distribution",
            ConflictKind::ConsecutiveDays => "consecutive_days",
            ConflictKind::Overstaffed => "overstaffed",
            ConflictKind::PeakUnderstaffed => "peak_understaffed",
        };
        f.write_str(name)
    }
}

/// Ordered so that sorting ranks the most urgent conflicts first.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    /// Hard conflicts make a roster invalid.
    pub fn is_hard(self) -> bool {
        matches!(self, Severity::Critical | Severity::High)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PeakPeriod {
    LunchPeak,
    DinnerPeak,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conflict {
    #[serde(rename = "type")]
    pub kind: ConflictKind,
    pub severity: Severity,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub days: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub station: Option<Station>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<PeakPeriod>,
}

impl Conflict {
    pub fn is_hard(&self) -> bool {
        self.severity.is_hard()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChangeField {
    ShiftCode,
    Station,
}

/// The replacement value of a roster change. Serializes as the bare surface
/// string (`"1F"`, `"Kitchen"`), matching the `field` it accompanies.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ChangeValue {
    Shift(ShiftCode),
    Station(Station),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionChange {
    pub employee_id: String,
    pub day: String,
    pub field: ChangeField,
    pub new_value: ChangeValue,
}

impl ResolutionChange {
    pub fn set_shift(
        employee_id: impl Into<String>,
        day: impl Into<String>,
        code: ShiftCode,
    ) -> Self {
        Self {
            employee_id: employee_id.into(),
            day: day.into(),
            field: ChangeField::ShiftCode,
            new_value: ChangeValue::Shift(code),
        }
    }

    pub fn set_station(
        employee_id: impl Into<String>,
        day: impl Into<String>,
        station: Station,
    ) -> Self {
        Self {
            employee_id: employee_id.into(),
            day: day.into(),
            field: ChangeField::Station,
            new_value: ChangeValue::Station(station),
        }
    }
}

/// A candidate fix for one conflict. Lower impact score is preferred.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resolution {
    pub description: String,
    pub impact_score: f64,
    pub changes: Vec<ResolutionChange>,
}

// endregion: Conflicts and resolutions

// region: Roster

/// One day's assignment on the roster: either a catalog shift or the day-off
/// sentinel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftRecord {
    pub shift_code: ShiftCode,
    pub shift_name: String,
    pub hours: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub station: Option<Station>,
}

impl ShiftRecord {
    /// Builds a coherent record from the catalog; name and hours always match
    /// the code.
    pub fn from_code(code: ShiftCode, station: Option<Station>) -> Self {
        Self {
            shift_code: code,
            shift_name: code.shift_name().to_string(),
            hours: code.hours(),
            station: if code.is_day_off() { None } else { station },
        }
    }

    pub fn day_off() -> Self {
        Self::from_code(ShiftCode::DayOff, None)
    }

    pub fn is_working(&self) -> bool {
        !self.shift_code.is_day_off()
    }
}

/// One employee's row in the roster. `shifts` holds an entry for every day
/// of the horizon; `total_hours` is derived from the shift records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterEntry {
    pub employee_id: String,
    pub employee_name: String,
    pub employee_type: EmployeeType,
    pub is_manager: bool,
    pub primary_station: Station,
    pub shifts: BTreeMap<String, ShiftRecord>,
    pub total_hours: f64,
}

impl RosterEntry {
    pub fn recompute_total_hours(&mut self) {
        self.total_hours = self.shifts.values().map(|s| s.hours).sum();
    }
}

// endregion: Roster

#[cfg(test)]
mod tests {
    use super::*;

    fn employee(primary: Station, certified: Vec<Station>) -> Employee {
        Employee {
            id: "e1".to_string(),
            name: "Avery".to_string(),
            employee_type: EmployeeType::Casual,
            primary_station: primary,
            certified_stations: certified,
            is_manager: false,
            availability: BTreeMap::new(),
        }
    }

    #[test]
    fn multi_station_covers_kitchen_and_counter() {
        let emp = employee(Station::MultiStation, vec![]);
        assert!(emp.can_work_station(Station::Kitchen));
        assert!(emp.can_work_station(Station::Counter));
        assert!(!emp.can_work_station(Station::McCafe));
    }

    #[test]
    fn multi_station_mccafe_also_covers_mccafe() {
        let emp = employee(Station::MultiStationMcCafe, vec![]);
        assert!(emp.can_work_station(Station::Kitchen));
        assert!(emp.can_work_station(Station::McCafe));
        assert!(!emp.can_work_station(Station::Dessert));
    }

    #[test]
    fn explicit_certification_counts() {
        let emp = employee(Station::Counter, vec![Station::Dessert]);
        assert!(emp.can_work_station(Station::Dessert));
        assert!(!emp.can_work_station(Station::Kitchen));
    }

    #[test]
    fn offered_shifts_filters_day_off() {
        let mut emp = employee(Station::Counter, vec![]);
        emp.availability.insert(
            "2026-08-03".to_string(),
            vec![ShiftCode::DayOff, ShiftCode::DayShift],
        );
        assert_eq!(emp.offered_shifts("2026-08-03"), vec![ShiftCode::DayShift]);
        assert!(emp.offered_shifts("2026-08-04").is_empty());
    }

    #[test]
    fn has_availability_for_treats_empty_map_as_reachable() {
        let mut emp = employee(Station::Counter, vec![]);
        assert!(emp.has_availability_for("2026-08-03"));
        emp.availability
            .insert("2026-08-04".to_string(), vec![ShiftCode::DayShift]);
        assert!(!emp.has_availability_for("2026-08-03"));
        assert!(emp.has_availability_for("2026-08-04"));
    }

    #[test]
    fn total_staff_sums_all_stations() {
        let req = StaffingRequirement {
            kitchen_staff: 3,
            counter_staff: 3,
            mccafe_staff: 1,
            dessert_station_staff: 1,
            offline_dessert_station_staff: 0,
        };
        assert_eq!(req.total_staff(), 8);
    }

    #[test]
    fn hour_limits_per_employee_type() {
        let constraints = Constraints::default();
        assert_eq!(
            constraints.hour_limits(EmployeeType::FullTime),
            (35.0, 38.0)
        );
        assert_eq!(
            constraints.hour_limits(EmployeeType::PartTime),
            (20.0, 32.0)
        );
        assert_eq!(constraints.hour_limits(EmployeeType::Casual), (8.0, 24.0));
    }

    #[test]
    fn peak_requirement_applies_weekend_uplift_rounding_up() {
        let constraints = Constraints::default();
        assert_eq!(constraints.peak_requirement(10, false), 10);
        assert_eq!(constraints.peak_requirement(10, true), 12);
        assert_eq!(constraints.peak_requirement(7, true), 9);
    }

    #[test]
    fn severity_orders_critical_first() {
        let mut severities = vec![
            Severity::Low,
            Severity::Critical,
            Severity::Medium,
            Severity::High,
        ];
        severities.sort();
        assert_eq!(
            severities,
            vec![
                Severity::Critical,
                Severity::High,
                Severity::Medium,
                Severity::Low
            ]
        );
        assert!(Severity::High.is_hard());
        assert!(!Severity::Medium.is_hard());
    }

    #[test]
    fn conflict_kind_surface_strings() {
        assert_eq!(
            serde_json::to_string(&ConflictKind::PeakUnderstaffed).unwrap(),
            "\"peak_understaffed\""
        );
        assert_eq!(
            serde_json::to_string(&ConflictKind::NoManager).unwrap(),
            "\"no_manager\""
        );
        assert_eq!(
            serde_json::to_string(&Severity::Critical).unwrap(),
            "\"critical\""
        );
    }

    #[test]
    fn change_value_serializes_bare() {
        let change = ResolutionChange::set_shift("e1", "2026-08-03", ShiftCode::FirstHalf);
        let json = serde_json::to_value(&change).unwrap();
        assert_eq!(json["field"], "shift_code");
        assert_eq!(json["new_value"], "1F");

        let change = ResolutionChange::set_station("e1", "2026-08-03", Station::Kitchen);
        let json = serde_json::to_value(&change).unwrap();
        assert_eq!(json["field"], "station");
        assert_eq!(json["new_value"], "Kitchen");
    }

    #[test]
    fn shift_record_from_code_is_coherent() {
        let record = ShiftRecord::from_code(ShiftCode::FullDay, Some(Station::Kitchen));
        assert_eq!(record.shift_name, "Full Day");
        assert_eq!(record.hours, 12.0);
        assert_eq!(record.station, Some(Station::Kitchen));

        let off = ShiftRecord::day_off();
        assert_eq!(off.hours, 0.0);
        assert!(off.station.is_none());
        assert!(!off.is_working());
    }

    #[test]
    fn roster_entry_recomputes_hours_from_records() {
        let mut entry = RosterEntry {
            employee_id: "e1".to_string(),
            employee_name: "Avery".to_string(),
            employee_type: EmployeeType::PartTime,
            is_manager: false,
            primary_station: Station::Counter,
            shifts: BTreeMap::from([
                (
                    "2026-08-03".to_string(),
                    ShiftRecord::from_code(ShiftCode::DayShift, None),
                ),
                ("2026-08-04".to_string(), ShiftRecord::day_off()),
                (
                    "2026-08-05".to_string(),
                    ShiftRecord::from_code(ShiftCode::FullDay, None),
                ),
            ]),
            total_hours: 0.0,
        };
        entry.recompute_total_hours();
        assert_eq!(entry.total_hours, 20.5);
    }
}
