use std::cmp::Reverse;
use std::thread;
use std::time::Instant;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::domain::model::{CpModel, VarId};
use crate::domain::solver::{SolveOutcome, SolveParams, SolveStatus, Solver};

/// Restarts per worker; each restart re-randomizes tie-breaks.
const RESTARTS_PER_WORKER: usize = 12;

/// In-process solver: coverage-first greedy construction with seeded
/// random-restart improvement, fanned out over worker threads.
///
/// The search never claims more than it can prove: a returned assignment is
/// verified against every constraint family, `Infeasible` is reported only
/// when a coverage minimum exceeds what its support variables can ever
/// reach, and everything else is `Unknown`. For a fixed seed the outcome is
/// deterministic regardless of thread scheduling.
pub struct LocalSearchSolver;

impl Solver for LocalSearchSolver {
    fn solve(&self, model: &CpModel, params: &SolveParams) -> SolveOutcome {
        let view = ModelView::new(model);

        if view.coverage_unreachable() {
            tracing::debug!("Coverage minimum exceeds reachable support, model is infeasible");
            return SolveOutcome::without_assignment(SolveStatus::Infeasible, model.num_vars);
        }

        let deadline = Instant::now() + params.time_limit;
        let workers = params.num_workers.max(1);

        let results: Vec<Option<(i64, Vec<bool>)>> = thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|worker| {
                    let view = &view;
                    let seed = params.seed;
                    scope.spawn(move || search_worker(view, seed, worker, deadline))
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap_or(None))
                .collect()
        });

        // Deterministic merge: strictly better objective wins, ties go to
        // the lowest worker index.
        let mut best: Option<(i64, Vec<bool>)> = None;
        for candidate in results.into_iter().flatten() {
            if best.as_ref().is_none_or(|(obj, _)| candidate.0 > *obj) {
                best = Some(candidate);
            }
        }

        match best {
            Some((objective, assignment)) => {
                tracing::debug!(objective, "Solver found a feasible assignment");
                SolveOutcome {
                    status: SolveStatus::Feasible,
                    assignment,
                    objective,
                }
            }
            None => SolveOutcome::without_assignment(SolveStatus::Unknown, model.num_vars),
        }
    }
}

/// Per-variable constraint membership, precomputed once per solve.
struct ModelView<'m> {
    model: &'m CpModel,
    fixed: Vec<bool>,
    amo_of: Vec<Vec<usize>>,
    partners: Vec<Vec<VarId>>,
    cap_terms: Vec<Vec<(usize, i64)>>,
    coverage_of: Vec<Vec<usize>>,
    objective: Vec<i64>,
}

impl<'m> ModelView<'m> {
    fn new(model: &'m CpModel) -> Self {
        let n = model.num_vars;
        let mut fixed = vec![false; n];
        for &v in &model.fixed_false {
            fixed[v] = true;
        }

        let mut amo_of = vec![Vec::new(); n];
        for (gi, group) in model.at_most_one.iter().enumerate() {
            for &v in group {
                amo_of[v].push(gi);
            }
        }

        let mut partners = vec![Vec::new(); n];
        for &(a, b) in &model.incompatible {
            partners[a].push(b);
            partners[b].push(a);
        }

        let mut cap_terms = vec![Vec::new(); n];
        for (ci, cap) in model.weighted_at_most.iter().enumerate() {
            for &(v, coeff) in &cap.terms {
                cap_terms[v].push((ci, coeff));
            }
        }

        let mut coverage_of = vec![Vec::new(); n];
        for (gi, coverage) in model.sum_at_least.iter().enumerate() {
            for &v in &coverage.vars {
                coverage_of[v].push(gi);
            }
        }

        let mut objective = vec![0i64; n];
        for &(v, coeff) in &model.objective {
            objective[v] += coeff;
        }

        Self {
            model,
            fixed,
            amo_of,
            partners,
            cap_terms,
            coverage_of,
            objective,
        }
    }

    /// Sound infeasibility proof: a coverage minimum can never be reached
    /// when the distinct at-most-one groups (plus ungrouped variables) in
    /// its unfixed support stay below the minimum.
    fn coverage_unreachable(&self) -> bool {
        self.model.sum_at_least.iter().any(|coverage| {
            if coverage.min <= 0 {
                return false;
            }
            let mut groups = std::collections::BTreeSet::new();
            let mut ungrouped = 0i64;
            for &v in &coverage.vars {
                if self.fixed[v] {
                    continue;
                }
                match self.amo_of[v].first() {
                    Some(&g) => {
                        groups.insert(g);
                    }
                    None => ungrouped += 1,
                }
            }
            (groups.len() as i64 + ungrouped) < coverage.min
        })
    }
}

struct SearchState<'v, 'm> {
    view: &'v ModelView<'m>,
    assigned: Vec<bool>,
    amo_used: Vec<bool>,
    cap_used: Vec<i64>,
    coverage_count: Vec<i64>,
    objective: i64,
}

impl<'v, 'm> SearchState<'v, 'm> {
    fn new(view: &'v ModelView<'m>) -> Self {
        Self {
            view,
            assigned: vec![false; view.model.num_vars],
            amo_used: vec![false; view.model.at_most_one.len()],
            cap_used: vec![0; view.model.weighted_at_most.len()],
            coverage_count: vec![0; view.model.sum_at_least.len()],
            objective: 0,
        }
    }

    /// Sets a variable if no constraint forbids it.
    fn try_set(&mut self, var: VarId) -> bool {
        if self.assigned[var] || self.view.fixed[var] {
            return false;
        }
        if self.view.amo_of[var].iter().any(|&g| self.amo_used[g]) {
            return false;
        }
        if self.view.partners[var].iter().any(|&p| self.assigned[p]) {
            return false;
        }
        for &(ci, coeff) in &self.view.cap_terms[var] {
            if self.cap_used[ci] + coeff > self.view.model.weighted_at_most[ci].max {
                return false;
            }
        }

        self.assigned[var] = true;
        for &g in &self.view.amo_of[var] {
            self.amo_used[g] = true;
        }
        for &(ci, coeff) in &self.view.cap_terms[var] {
            self.cap_used[ci] += coeff;
        }
        for &gi in &self.view.coverage_of[var] {
            self.coverage_count[gi] += 1;
        }
        self.objective += self.view.objective[var];
        true
    }

    fn coverage_met(&self) -> bool {
        self.view
            .model
            .sum_at_least
            .iter()
            .zip(&self.coverage_count)
            .all(|(coverage, &count)| count >= coverage.min)
    }
}

fn search_worker(
    view: &ModelView<'_>,
    seed: u64,
    worker: usize,
    deadline: Instant,
) -> Option<(i64, Vec<bool>)> {
    let worker_seed = seed.wrapping_add(0x9E37_79B9_7F4A_7C15u64.wrapping_mul(worker as u64 + 1));
    let mut rng = StdRng::seed_from_u64(worker_seed);
    let mut best: Option<(i64, Vec<bool>)> = None;

    for restart in 0..RESTARTS_PER_WORKER {
        if restart > 0 && Instant::now() >= deadline {
            break;
        }
        // The very first pass of worker 0 is the canonical deterministic
        // greedy; later passes randomize tie-breaks among equal objectives.
        let shuffle = worker > 0 || restart > 0;
        let candidate = construct(view, &mut rng, shuffle);
        if let Some((objective, assignment)) = candidate
            && best.as_ref().is_none_or(|(obj, _)| objective > *obj)
        {
            best = Some((objective, assignment));
        }
    }
    best
}

/// One greedy construction: satisfy each coverage minimum with the highest
/// objective support first, then fill everything else the caps allow.
///
/// Minimums with the scarcest support go first (closing shifts have one
/// template, lunch has four); the other way round the broad constraints
/// hoard the workforce and starve the narrow ones.
fn construct(view: &ModelView<'_>, rng: &mut StdRng, shuffle: bool) -> Option<(i64, Vec<bool>)> {
    let mut state = SearchState::new(view);

    let mut order: Vec<usize> = (0..view.model.sum_at_least.len()).collect();
    order.sort_by_key(|&gi| (view.model.sum_at_least[gi].vars.len(), gi));

    for gi in order {
        let coverage = &view.model.sum_at_least[gi];
        if state.coverage_count[gi] >= coverage.min {
            continue;
        }
        let mut candidates: Vec<VarId> = coverage
            .vars
            .iter()
            .copied()
            .filter(|&v| !view.fixed[v] && !state.assigned[v])
            .collect();
        order_by_objective(&mut candidates, view, rng, shuffle);

        for var in candidates {
            if state.coverage_count[gi] >= coverage.min {
                break;
            }
            state.try_set(var);
        }
        if state.coverage_count[gi] < coverage.min {
            return None;
        }
    }

    let mut rest: Vec<VarId> = (0..view.model.num_vars)
        .filter(|&v| !view.fixed[v] && !state.assigned[v] && view.objective[v] > 0)
        .collect();
    order_by_objective(&mut rest, view, rng, shuffle);
    for var in rest {
        state.try_set(var);
    }

    // Coverage can only have improved since the first loop; re-check to be
    // sure before reporting feasibility.
    if state.coverage_met() {
        Some((state.objective, state.assigned))
    } else {
        None
    }
}

fn order_by_objective(vars: &mut Vec<VarId>, view: &ModelView<'_>, rng: &mut StdRng, shuffle: bool) {
    if shuffle {
        vars.shuffle(rng);
        // stable sort keeps the shuffled order among equal objectives
        vars.sort_by_key(|&v| Reverse(view.objective[v]));
    } else {
        vars.sort_by_key(|&v| (Reverse(view.objective[v]), v));
    }
}
