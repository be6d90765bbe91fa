use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use shared::types::{Employee, Station};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationCoverage {
    pub required: u32,
    pub available: u32,
    pub coverage_ratio: f64,
    pub is_sufficient: bool,
    pub qualified_employees: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shortage {
    pub station: Station,
    pub shortage: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossTrainingRecommendation {
    pub station: Station,
    pub candidates: Vec<String>,
    pub training_needed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillMatchReport {
    pub station_coverage: BTreeMap<Station, StationCoverage>,
    pub shortages: Vec<Shortage>,
    pub has_shortages: bool,
    pub total_employees: usize,
    pub cross_training_recommendations: Vec<CrossTrainingRecommendation>,
}

/// Maps employee skills onto station requirements: who can staff each
/// station, where coverage falls short, and who could be cross-trained to
/// close the gap. Order is deterministic (input order throughout).
#[tracing::instrument(skip(employees), fields(employees = employees.len()))]
pub fn match_skills(
    employees: &[Employee],
    station_requirements: &BTreeMap<Station, u32>,
) -> SkillMatchReport {
    let mut station_coverage = BTreeMap::new();
    let mut shortages = Vec::new();

    for (&station, &required) in station_requirements {
        let mut seen = BTreeSet::new();
        let mut qualified = Vec::new();
        for employee in employees {
            if employee.can_work_station(station) && seen.insert(employee.id.as_str()) {
                qualified.push(employee.id.clone());
            }
        }

        let available = qualified.len() as u32;
        let coverage_ratio = round2(f64::from(available) / f64::from(required.max(1)));

        station_coverage.insert(
            station,
            StationCoverage {
                required,
                available,
                coverage_ratio,
                is_sufficient: available >= required,
                qualified_employees: qualified,
            },
        );

        if available < required {
            shortages.push(Shortage {
                station,
                shortage: required - available,
            });
        }
    }

    let cross_training_recommendations = recommend_cross_training(employees, &shortages);

    SkillMatchReport {
        has_shortages: !shortages.is_empty(),
        total_employees: employees.len(),
        station_coverage,
        shortages,
        cross_training_recommendations,
    }
}

/// Kitchen and Counter trade staff through cross-training; other stations
/// have no complementary pool.
fn complement(station: Station) -> Option<Station> {
    match station {
        Station::Kitchen => Some(Station::Counter),
        Station::Counter => Some(Station::Kitchen),
        _ => None,
    }
}

fn recommend_cross_training(
    employees: &[Employee],
    shortages: &[Shortage],
) -> Vec<CrossTrainingRecommendation> {
    shortages
        .iter()
        .map(|shortage| {
            let candidates = complement(shortage.station)
                .map(|source| {
                    employees
                        .iter()
                        .filter(|e| {
                            e.primary_station == source
                                && !e.certified_stations.iter().any(|s| s.is_multi())
                        })
                        .take(shortage.shortage as usize)
                        .map(|e| e.name.clone())
                        .collect()
                })
                .unwrap_or_default();
            CrossTrainingRecommendation {
                station: shortage.station,
                candidates,
                training_needed: true,
            }
        })
        .collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
