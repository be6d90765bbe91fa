use std::io::ErrorKind;

use serde::Deserialize;
use shared::types::Constraints;

use crate::error::RosterServiceError;

/// Solver tuning knobs. The time limit is a wall-clock deadline for one
/// solve call; workers is the internal thread hint.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub time_limit_seconds: u64,
    pub num_workers: usize,
    pub seed: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_limit_seconds: 180,
            num_workers: 4,
            seed: 0,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub constraints: Constraints,
    pub solver: SolverConfig,
}

impl ServiceConfig {
    /// Loads the service configuration from a TOML file. A missing file is
    /// not an error; defaults apply.
    pub fn load(path: &str) -> Result<Self, RosterServiceError> {
        match std::fs::read_to_string(path) {
            Ok(raw) => Ok(toml::from_str(&raw)?),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(path, "No config file found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_solver_contract() {
        let config = ServiceConfig::default();
        assert_eq!(config.solver.time_limit_seconds, 180);
        assert_eq!(config.solver.num_workers, 4);
        assert_eq!(config.constraints.max_consecutive_days, 6);
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let config: ServiceConfig = toml::from_str(
            r#"
            [solver]
            time_limit_seconds = 30

            [constraints]
            casual_max_hours = 20.0
            "#,
        )
        .unwrap();
        assert_eq!(config.solver.time_limit_seconds, 30);
        assert_eq!(config.solver.num_workers, 4);
        assert_eq!(config.constraints.casual_max_hours, 20.0);
        assert_eq!(config.constraints.full_time_max_hours, 38.0);
    }
}
