use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use shared::calendar;
use shared::types::Store;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PeriodPriority {
    Critical,
    High,
    Medium,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemandPeriod {
    pub start: String,
    pub end: String,
    pub min_staff: u32,
    pub priority: PeriodPriority,
}

/// The six named day-parts of the trading day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayPeriods {
    pub opening: DemandPeriod,
    pub morning: DemandPeriod,
    pub lunch_peak: DemandPeriod,
    pub afternoon: DemandPeriod,
    pub dinner_peak: DemandPeriod,
    pub closing: DemandPeriod,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StationDemand {
    pub normal: u32,
    pub peak: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationRequirements {
    pub kitchen: StationDemand,
    pub counter: StationDemand,
    pub mccafe: StationDemand,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayDemand {
    pub is_weekend: bool,
    pub periods: DayPeriods,
    pub station_requirements: StationRequirements,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemandReport {
    pub demand_by_day: BTreeMap<String, DayDemand>,
    pub total_days: usize,
    pub weekend_days: usize,
}

/// Weekend uplift on staffed periods, as a fraction in tenths (1.2x).
const WEEKEND_NUM: u32 = 12;
const WEEKEND_DEN: u32 = 10;

fn weekend_scaled(total: u32, is_weekend: bool) -> u32 {
    if is_weekend {
        total * WEEKEND_NUM / WEEKEND_DEN
    } else {
        total
    }
}

/// Derives per-day staffing demand from the store configuration and the
/// calendar. Pure over its inputs; the result feeds reporting and the
/// validator's expectations, never the solver.
#[tracing::instrument(skip(store), fields(days = days.len()))]
pub fn analyze_demand(store: &Store, days: &[String]) -> DemandReport {
    let total_normal = store.normal_requirements.total_staff();
    let total_peak = store.peak_requirements.total_staff();
    let edge_min = (total_normal * 4 / 10).max(2);

    let mut demand_by_day = BTreeMap::new();
    let mut weekend_days = 0;

    for day in days {
        let is_weekend = calendar::is_weekend(day);
        if is_weekend {
            weekend_days += 1;
        }

        let periods = DayPeriods {
            opening: DemandPeriod {
                start: "06:30".to_string(),
                end: "08:00".to_string(),
                min_staff: edge_min,
                priority: PeriodPriority::High,
            },
            morning: DemandPeriod {
                start: "08:00".to_string(),
                end: "11:00".to_string(),
                min_staff: weekend_scaled(total_normal, is_weekend),
                priority: PeriodPriority::Medium,
            },
            lunch_peak: DemandPeriod {
                start: "11:00".to_string(),
                end: "14:00".to_string(),
                min_staff: weekend_scaled(total_peak, is_weekend),
                priority: PeriodPriority::Critical,
            },
            afternoon: DemandPeriod {
                start: "14:00".to_string(),
                end: "17:00".to_string(),
                min_staff: weekend_scaled(total_normal, is_weekend),
                priority: PeriodPriority::Medium,
            },
            dinner_peak: DemandPeriod {
                start: "17:00".to_string(),
                end: "21:00".to_string(),
                min_staff: weekend_scaled(total_peak, is_weekend),
                priority: PeriodPriority::Critical,
            },
            closing: DemandPeriod {
                start: "21:00".to_string(),
                end: "23:00".to_string(),
                min_staff: edge_min,
                priority: PeriodPriority::High,
            },
        };

        demand_by_day.insert(
            day.clone(),
            DayDemand {
                is_weekend,
                periods,
                station_requirements: StationRequirements {
                    kitchen: StationDemand {
                        normal: store.normal_requirements.kitchen_staff,
                        peak: store.peak_requirements.kitchen_staff,
                    },
                    counter: StationDemand {
                        normal: store.normal_requirements.counter_staff,
                        peak: store.peak_requirements.counter_staff,
                    },
                    mccafe: StationDemand {
                        normal: store.normal_requirements.mccafe_staff,
                        peak: store.peak_requirements.mccafe_staff,
                    },
                },
            },
        );
    }

    DemandReport {
        total_days: days.len(),
        weekend_days,
        demand_by_day,
    }
}

#[cfg(test)]
mod tests {
    use shared::types::{LocationType, StaffingRequirement};

    use super::*;

    fn store(normal_total: u32, peak_total: u32) -> Store {
        Store {
            store_id: "store_1".to_string(),
            location_type: LocationType::Suburban,
            normal_requirements: StaffingRequirement {
                kitchen_staff: normal_total / 2,
                counter_staff: normal_total - normal_total / 2,
                ..StaffingRequirement::default()
            },
            peak_requirements: StaffingRequirement {
                kitchen_staff: peak_total / 2,
                counter_staff: peak_total - peak_total / 2,
                ..StaffingRequirement::default()
            },
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

    #[test]
    fn sunday_applies_the_weekend_uplift_to_staffed_periods() {
        // 2026-08-02 is a Sunday; total normal 10
        let report = analyze_demand(&store(10, 12), &["2026-08-02".to_string()]);
        let day = &report.demand_by_day["2026-08-02"];

        assert!(day.is_weekend);
        assert_eq!(day.periods.morning.min_staff, 12);
        assert_eq!(day.periods.afternoon.min_staff, 12);
        assert_eq!(day.periods.lunch_peak.min_staff, 14);
        // opening and closing stay on the flat 40% floor
        assert_eq!(day.periods.opening.min_staff, 4);
        assert_eq!(day.periods.closing.min_staff, 4);
    }

    #[test]
    fn weekday_uses_flat_requirements() {
        let report = analyze_demand(&store(10, 12), &["2026-08-03".to_string()]);
        let day = &report.demand_by_day["2026-08-03"];

        assert!(!day.is_weekend);
        assert_eq!(day.periods.morning.min_staff, 10);
        assert_eq!(day.periods.lunch_peak.min_staff, 12);
        assert_eq!(day.periods.dinner_peak.min_staff, 12);
    }

    #[test]
    fn opening_floor_is_two_for_small_stores() {
        let report = analyze_demand(&store(4, 4), &["2026-08-03".to_string()]);
        let day = &report.demand_by_day["2026-08-03"];
        // 40% of 4 is 1, the floor of 2 wins
        assert_eq!(day.periods.opening.min_staff, 2);
    }

    #[test]
    fn priorities_follow_the_period_kind() {
        let report = analyze_demand(&store(10, 12), &["2026-08-03".to_string()]);
        let periods = &report.demand_by_day["2026-08-03"].periods;
        assert_eq!(periods.lunch_peak.priority, PeriodPriority::Critical);
        assert_eq!(periods.dinner_peak.priority, PeriodPriority::Critical);
        assert_eq!(periods.opening.priority, PeriodPriority::High);
        assert_eq!(periods.closing.priority, PeriodPriority::High);
        assert_eq!(periods.morning.priority, PeriodPriority::Medium);
        assert_eq!(periods.afternoon.priority, PeriodPriority::Medium);
    }

    #[test]
    fn rollup_counts_weekend_days() {
        let days: Vec<String> = (1..=7).map(|d| format!("2026-08-{d:02}")).collect();
        // Aug 2026: 1st Sat, 2nd Sun
        let report = analyze_demand(&store(10, 12), &days);
        assert_eq!(report.total_days, 7);
        assert_eq!(report.weekend_days, 2);
    }
}
