//! Observation-constrained ("implementable") policies: an observation mapping `phi: S -> O`
//! partitions states into classes, and an *observation policy* `O -> A` is admissible only if
//! it picks an action available in every state of its class. This module finds such a policy
//! by two methods: reweighting state-level Q-values by occupancy (`solve_reweighted`), and
//! solving an L1-robust meta-MDP over observations where the adversary may pick the worst
//! real state of each class (`solve_robust`).
use crate::action::UncertaintyMode;
use crate::config::SolverOptions;
use crate::error::{Error, Result};
use crate::mdp::Mdp;
use crate::robust::backup::evaluate_fixed;
use crate::rmdp::Rmdp;
use crate::solver::{residual, vi_gauss_seidel};
use crate::types::{ActionId, OutcomeId, Probability, StateId, Value};

/// An observation mapping `phi: S -> O`, partitioning states into observation classes
/// ("fibers").
#[derive(Debug, Clone)]
pub struct ObservationMap {
    phi: Vec<usize>,
    num_observations: usize,
}

impl ObservationMap {
    pub fn new(phi: Vec<usize>) -> Self {
        let num_observations = phi.iter().copied().max().map(|m| m + 1).unwrap_or(0);
        ObservationMap { phi, num_observations }
    }

    pub fn num_states(&self) -> usize {
        self.phi.len()
    }

    pub fn num_observations(&self) -> usize {
        self.num_observations
    }

    pub fn observation_of(&self, state: StateId) -> usize {
        self.phi[state as usize]
    }

    /// States sharing observation `o`, in ascending order.
    pub fn fiber(&self, o: usize) -> Vec<StateId> {
        self.phi
            .iter()
            .enumerate()
            .filter(|&(_, &obs)| obs == o)
            .map(|(s, _)| s as StateId)
            .collect()
    }

    /// The largest action id available in *every* state of `o`'s fiber, i.e. the number of
    /// actions admissible for that observation (spec: "admissible iff action a is available in
    /// every state of its observation class").
    fn common_action_count(&self, mdp: &Mdp, o: usize) -> usize {
        self.fiber(o)
            .iter()
            .map(|&s| mdp.num_actions(s))
            .min()
            .unwrap_or(0)
    }

    /// Broadcast an observation policy to a state policy: `state_policy[s] = obs_policy[phi[s]]`.
    pub fn broadcast(&self, obs_policy: &[i64]) -> Result<Vec<i64>> {
        if obs_policy.len() != self.num_observations {
            return Err(Error::shape("observation policy", self.num_observations, obs_policy.len()));
        }
        Ok(self.phi.iter().map(|&o| obs_policy[o]).collect())
    }
}

/// Total discounted return of an observation policy under `mdp`, starting from `initial`
/// (dense probability vector over states), evaluated to `1e-8` precision.
pub fn evaluate_return(
    mdp: &Mdp,
    phi: &ObservationMap,
    obs_policy: &[i64],
    initial: &[Probability],
    gamma: Value,
) -> Result<Value> {
    let state_policy = phi.broadcast(obs_policy)?;
    let opts = SolverOptions {
        discount: gamma,
        residual_tolerance: 1e-8,
        max_iterations: 10_000,
        ..Default::default()
    };
    let (v, _, _) = crate::solver::fixed_policy::evaluate(mdp, &state_policy, None, &opts)?;
    if initial.len() != v.len() {
        return Err(Error::shape("initial distribution", v.len(), initial.len()));
    }
    Ok(initial.iter().zip(v.iter()).map(|(&p, &vi)| p as f64 * vi).sum())
}

/// Reweighted method: alternate computing the discounted state-occupancy of the current
/// observation policy, then for each observation choosing the action maximizing its
/// occupancy-weighted sum of per-state Q-values (spec §4.9).
pub fn solve_reweighted(
    mdp: &Mdp,
    phi: &ObservationMap,
    initial: &[Probability],
    gamma: Value,
    iterations: usize,
) -> Result<Vec<i64>> {
    let n_states = mdp.num_states();
    if initial.len() != n_states {
        return Err(Error::shape("initial distribution", n_states, initial.len()));
    }
    let common_counts: Vec<usize> = (0..phi.num_observations())
        .map(|o| phi.common_action_count(mdp, o))
        .collect();

    let mut obs_policy: Vec<i64> = common_counts
        .iter()
        .map(|&c| if c > 0 { 0 } else { -1 })
        .collect();

    for _ in 0..iterations.max(1) {
        let state_policy = phi.broadcast(&obs_policy)?;

        // Discounted state value under the current policy, used to compute per-state Q-values.
        let opts = SolverOptions {
            discount: gamma,
            residual_tolerance: 1e-10,
            max_iterations: 10_000,
            ..Default::default()
        };
        let (v, _, _) = crate::solver::fixed_policy::evaluate(mdp, &state_policy, None, &opts)?;

        // Discounted occupancy: mu(s') = initial(s') + gamma * sum_s P(s, pi(s), s') * mu(s),
        // found by forward iteration (mirrors the backward value-iteration recursion).
        let occupancy = discounted_occupancy(mdp, &state_policy, initial, gamma)?;

        for o in 0..phi.num_observations() {
            let count = common_counts[o];
            if count == 0 {
                continue;
            }
            let fiber = phi.fiber(o);
            let mut best_action = 0usize;
            let mut best_q = Value::NEG_INFINITY;
            for a in 0..count {
                let mut q = 0.0;
                for &s in &fiber {
                    let w = occupancy[s as usize];
                    if w > 0.0 {
                        q += w * evaluate_fixed(mdp, s, a as i64, None, &v, gamma)?;
                    }
                }
                if q > best_q {
                    best_q = q;
                    best_action = a;
                }
            }
            obs_policy[o] = best_action as i64;
        }
    }

    Ok(obs_policy)
}

fn discounted_occupancy(mdp: &Mdp, state_policy: &[i64], initial: &[Probability], gamma: Value) -> Result<Vec<f64>> {
    let n = mdp.num_states();
    let mut mu = vec![0.0; n];
    for _ in 0..500 {
        let mut mu_next: Vec<f64> = initial.iter().map(|&p| p as f64).collect();
        for s in 0..n {
            if mu[s] == 0.0 {
                continue;
            }
            let a = state_policy[s];
            if a < 0 {
                continue;
            }
            let action = mdp
                .state(s as StateId)
                .and_then(|st| st.action(a as ActionId))
                .ok_or_else(|| Error::out_of_range("action", a as usize, mdp.num_actions(s as StateId)))?;
            for (&sp, &p) in action.transition.indices().iter().zip(action.transition.probabilities()) {
                mu_next[sp as usize] += gamma * mu[s] * p as f64;
            }
        }
        let delta = residual(&mu, &mu_next);
        mu = mu_next;
        if delta < 1e-10 {
            break;
        }
    }
    Ok(mu)
}

/// Robust method: build an L1-robust meta-MDP whose states are observations and whose actions'
/// outcomes are the per-real-state transitions within that observation's fiber (reindexed onto
/// observation space), then solve it under [`UncertaintyMode::Robust`] with threshold `tau` —
/// the adversary effectively picks the worst real state of the observation for the chosen
/// action. The resulting greedy policy is already indexed by observation (spec §4.9).
pub fn solve_robust(mdp: &Mdp, phi: &ObservationMap, tau: f64, gamma: Value) -> Result<Vec<i64>> {
    let meta = build_meta_rmdp(mdp, phi, tau)?;
    let opts = SolverOptions {
        discount: gamma,
        residual_tolerance: 1e-10,
        max_iterations: 10_000,
        ..Default::default()
    };
    let sol = vi_gauss_seidel::solve_robust(&meta, &opts, UncertaintyMode::Robust)?;
    Ok(sol.policy)
}

fn build_meta_rmdp(mdp: &Mdp, phi: &ObservationMap, tau: f64) -> Result<Rmdp> {
    let n_obs = phi.num_observations();
    let mut rmdp = Rmdp::with_states(n_obs);
    for o in 0..n_obs {
        let fiber = phi.fiber(o);
        let count = fiber.iter().map(|&s| mdp.num_actions(s)).min().unwrap_or(0);
        for a in 0..count {
            for (k, &s) in fiber.iter().enumerate() {
                let action = mdp
                    .state(s)
                    .and_then(|st| st.action(a as ActionId))
                    .ok_or_else(|| Error::out_of_range("action", a, count))?;
                let tr = &action.transition;
                for (&sp, (&p, &r)) in tr.indices().iter().zip(tr.probabilities().iter().zip(tr.rewards())) {
                    let target_obs = phi.observation_of(sp);
                    rmdp.add_transition(o as StateId, a as ActionId, k as OutcomeId, target_obs as StateId, p, r)?;
                }
                rmdp.state_mut(o as StateId)
                    .action_mut(a as ActionId)
                    .set_base_probability(k as OutcomeId, 1.0 / fiber.len() as Probability)?;
            }
            rmdp.set_threshold(o as StateId, a as ActionId, tau)?;
        }
    }
    rmdp.normalize()?;
    Ok(rmdp)
}
