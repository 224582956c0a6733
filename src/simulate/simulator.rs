//! Forward simulation of an [`Mdp`] under a policy, producing [`Samples`] or discounted
//! returns. Seeded via [`rand::SeedableRng`] so runs are reproducible; the simulator borrows
//! the MDP immutably for the duration of the run (spec §5).
use crate::error::{Error, Result};
use crate::mdp::Mdp;
use crate::simulate::samples::{Sample, Samples};
use crate::transition::Transition;
use crate::types::{ActionId, StateId, Value};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// How actions are chosen at each step of a simulated episode.
#[derive(Debug, Clone)]
pub enum Policy {
    /// Uniformly random over the actions available at the current state.
    Random,
    /// One fixed action id per state, indexed by state id.
    Deterministic(Vec<ActionId>),
}

impl Policy {
    fn choose(&self, state: StateId, num_actions: usize, rng: &mut StdRng) -> Result<Option<ActionId>> {
        if num_actions == 0 {
            return Ok(None);
        }
        match self {
            Policy::Random => Ok(Some(rng.gen_range(0..num_actions) as ActionId)),
            Policy::Deterministic(actions) => {
                let a = *actions
                    .get(state as usize)
                    .ok_or_else(|| Error::out_of_range("policy state", state as usize, actions.len()))?;
                if a as usize >= num_actions {
                    return Err(Error::out_of_range("policy action", a as usize, num_actions));
                }
                Ok(Some(a))
            }
        }
    }
}

/// Sample a successor state and reward from `transition` with weights proportional to its
/// (possibly unnormalized) probabilities. Returns an error if the row has no positive mass.
fn sample_transition(transition: &Transition, rng: &mut StdRng) -> Result<(StateId, f64)> {
    let total: f64 = transition.probability_sum() as f64;
    if total <= 0.0 {
        return Err(Error::NotNormalized { sum: total });
    }
    let mut target = rng.gen_range(0.0..total);
    for (i, (&next, &p)) in transition
        .indices()
        .iter()
        .zip(transition.probabilities().iter())
        .enumerate()
    {
        let p = p as f64;
        if target < p || i == transition.len() - 1 {
            let r = transition.reward_at(i).unwrap_or(0.0);
            return Ok((next, r));
        }
        target -= p;
    }
    unreachable!("loop always returns on its last iteration");
}

/// Configuration for one call to [`simulate_policy`]/[`simulate_return`].
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub runs: usize,
    pub horizon: usize,
    /// Probability of terminating early after each step, independent of reaching a terminal
    /// state.
    pub prob_term: f64,
    /// Stop the whole simulation (across all runs) once this many transitions have been
    /// recorded, even mid-episode.
    pub tran_limit: Option<usize>,
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            runs: 1,
            horizon: 100,
            prob_term: 0.0,
            tran_limit: None,
            seed: 0,
        }
    }
}

/// Simulate `config.runs` episodes of `mdp` under `policy`, starting from `initial`
/// (a [`Transition`] whose indices are state ids; rewards are unused), and return the
/// resulting [`Samples`].
pub fn simulate_policy(
    mdp: &Mdp,
    initial: &Transition,
    policy: &Policy,
    config: &SimulationConfig,
) -> Result<Samples> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut samples = Samples::new();
    let mut total_transitions = 0usize;

    'runs: for run in 0..config.runs {
        let (mut state, _) = sample_transition(initial, &mut rng)?;
        samples.add_initial(state);
        for step in 0..config.horizon {
            let num_actions = mdp.num_actions(state);
            let Some(action) = policy.choose(state, num_actions, &mut rng)? else {
                break;
            };
            let action_ref = mdp
                .state(state)
                .and_then(|s| s.action(action))
                .ok_or_else(|| Error::out_of_range("action", action as usize, num_actions))?;
            let (next, reward) = sample_transition(&action_ref.transition, &mut rng)?;
            samples.add_sample(Sample {
                state_from: state,
                action,
                state_to: next,
                reward,
                weight: 1.0,
                step,
                run,
            });
            total_transitions += 1;
            state = next;
            if let Some(limit) = config.tran_limit {
                if total_transitions >= limit {
                    break 'runs;
                }
            }
            if config.prob_term > 0.0 && rng.gen_bool(config.prob_term) {
                break;
            }
        }
    }
    Ok(samples)
}

/// Simulate `config.runs` episodes and return `(starting_states, discounted_returns)`, one
/// entry per run, without keeping the full transition log.
pub fn simulate_return(
    mdp: &Mdp,
    initial: &Transition,
    policy: &Policy,
    config: &SimulationConfig,
    gamma: Value,
) -> Result<(Vec<StateId>, Vec<Value>)> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut starting_states = Vec::with_capacity(config.runs);
    let mut returns = Vec::with_capacity(config.runs);
    let mut total_transitions = 0usize;

    'runs: for _run in 0..config.runs {
        let (mut state, _) = sample_transition(initial, &mut rng)?;
        starting_states.push(state);
        let mut total_return = 0.0;
        let mut discount = 1.0;
        for _step in 0..config.horizon {
            let num_actions = mdp.num_actions(state);
            let Some(action) = policy.choose(state, num_actions, &mut rng)? else {
                break;
            };
            let action_ref = mdp
                .state(state)
                .and_then(|s| s.action(action))
                .ok_or_else(|| Error::out_of_range("action", action as usize, num_actions))?;
            let (next, reward) = sample_transition(&action_ref.transition, &mut rng)?;
            total_return += discount * reward;
            discount *= gamma;
            state = next;
            total_transitions += 1;
            if let Some(limit) = config.tran_limit {
                if total_transitions >= limit {
                    returns.push(total_return);
                    break 'runs;
                }
            }
            if config.prob_term > 0.0 && rng.gen_bool(config.prob_term) {
                break;
            }
        }
        returns.push(total_return);
    }
    Ok((starting_states, returns))
}
