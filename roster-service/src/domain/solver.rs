use std::time::Duration;

use crate::domain::model::CpModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    Optimal,
    Feasible,
    Infeasible,
    Unknown,
}

impl SolveStatus {
    /// Whether the outcome carries a usable assignment.
    pub fn has_assignment(self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Feasible)
    }
}

#[derive(Debug, Clone)]
pub struct SolveParams {
    pub time_limit: Duration,
    pub num_workers: usize,
    pub seed: u64,
}

impl Default for SolveParams {
    fn default() -> Self {
        Self {
            time_limit: Duration::from_secs(180),
            num_workers: 4,
            seed: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SolveOutcome {
    pub status: SolveStatus,
    /// One slot per model variable; only meaningful when
    /// `status.has_assignment()`.
    pub assignment: Vec<bool>,
    pub objective: i64,
}

impl SolveOutcome {
    pub fn without_assignment(status: SolveStatus, num_vars: usize) -> Self {
        Self {
            status,
            assignment: vec![false; num_vars],
            objective: 0,
        }
    }
}

/// Boundary to the constraint solver. Implementations must honor the model's
/// constraint families (forced-false literals, at-most-one groups, pairwise
/// incompatibilities, coverage minimums, weighted ceilings) and maximize the
/// linear objective on a best-effort basis under the wall-clock deadline.
///
/// Soundness contract: any assignment returned with `Optimal` or `Feasible`
/// satisfies every constraint; `Infeasible` is only reported when the model
/// is provably unsatisfiable. Anything else is `Unknown`.
#[cfg_attr(feature = "test-support", mockall::automock)]
pub trait Solver: Send + Sync {
    fn solve(&self, model: &CpModel, params: &SolveParams) -> SolveOutcome;
}
