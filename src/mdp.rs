//! The nominal (non-robust) MDP: an ordered, auto-extending container of [`State`]s.
use crate::action::UncertaintyMode;
use crate::error::{Error, Result};
use crate::robust::backup::Backup;
use crate::state::State;
use crate::transition::Transition;
use crate::types::{ActionId, Probability, Reward, StateId, Value};

use ndarray::Array3;
use serde::{Deserialize, Serialize};

/// A finite discrete MDP: states own actions own one transition each. Identifiers are dense,
/// 0-based indices equal to their position; the builder auto-extends storage when a referenced
/// identifier is beyond the current end.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mdp {
    states: Vec<State>,
}

impl Mdp {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an MDP with exactly `n` empty (terminal) states.
    pub fn with_states(n: usize) -> Self {
        Mdp {
            states: vec![State::new(); n],
        }
    }

    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn state(&self, id: StateId) -> Option<&State> {
        self.states.get(id as usize)
    }

    /// Mutable access to a state, auto-extending with empty (terminal) states as needed.
    pub fn state_mut(&mut self, id: StateId) -> &mut State {
        let id = id as usize;
        if id >= self.states.len() {
            self.states.resize_with(id + 1, State::new);
        }
        &mut self.states[id]
    }

    pub fn num_actions(&self, state: StateId) -> usize {
        self.state(state).map(State::num_actions).unwrap_or(0)
    }

    /// Add one `(from, action, to, p, r)` sample to the MDP, auto-extending states/actions.
    pub fn add_transition(
        &mut self,
        from: StateId,
        action: ActionId,
        to: StateId,
        p: Probability,
        r: Reward,
    ) -> Result<()> {
        self.state_mut(from)
            .action_mut(action)
            .transition
            .add_sample(to, p, r)
    }

    /// Overwrite the reward of an existing `(from, action, to)` entry. No-op if absent.
    pub fn set_reward(&mut self, from: StateId, action: ActionId, to: StateId, r: Reward) -> Result<()> {
        let state = self
            .states
            .get_mut(from as usize)
            .ok_or_else(|| Error::out_of_range("state", from as usize, self.states.len()))?;
        let action = state
            .action_mut(action);
        action.transition.set_reward(to, r);
        Ok(())
    }

    pub fn get_reward(&self, from: StateId, action: ActionId, to: StateId) -> Result<Option<Reward>> {
        let state = self
            .states
            .get(from as usize)
            .ok_or_else(|| Error::out_of_range("state", from as usize, self.states.len()))?;
        let action = state
            .action(action)
            .ok_or_else(|| Error::out_of_range("action", action as usize, state.num_actions()))?;
        Ok(action.transition.get_reward(to))
    }

    /// Build an MDP from dense matrices: `t[s][s'][a]` a transition probability, `r[s][a]` a
    /// reward. Entries with `t[s][s'][a] <= ignore_threshold` are discarded (the sparsity
    /// filter). `t` must be `[states, states, actions]` and `r` must be `[states, actions]`.
    pub fn from_matrices(t: &Array3<f64>, r: &ndarray::Array2<f64>, ignore_threshold: f64) -> Result<Self> {
        let (n_states, n_states2, n_actions) = t.dim();
        if n_states != n_states2 {
            return Err(Error::shape("transition matrix", n_states, n_states2));
        }
        let (r_states, r_actions) = r.dim();
        if r_states != n_states || r_actions != n_actions {
            return Err(Error::ShapeMismatch {
                what: "reward matrix",
                expected: n_states * n_actions,
                actual: r_states * r_actions,
            });
        }
        let mut mdp = Mdp::with_states(n_states);
        for s in 0..n_states {
            for a in 0..n_actions {
                for sp in 0..n_states {
                    let p = t[[s, sp, a]];
                    if p > ignore_threshold {
                        mdp.add_transition(s as StateId, a as ActionId, sp as StateId, p as Probability, r[[s, a]])?;
                    }
                }
            }
        }
        Ok(mdp)
    }

    /// Inverse of [`Mdp::from_matrices`]: requires a uniform action count per state, and
    /// returns `(T, R)` with `R[s,a] = sum_s' T[s,s',a] * reward(s,a,s')`.
    pub fn to_matrices(&self) -> Result<(Array3<f64>, ndarray::Array2<f64>)> {
        let n_states = self.num_states();
        let n_actions = self.states.first().map(State::num_actions).unwrap_or(0);
        for s in self.states.iter() {
            if s.num_actions() != n_actions {
                return Err(Error::Unsupported("to_matrices"));
            }
        }
        let mut t = Array3::<f64>::zeros((n_states, n_states, n_actions));
        let mut r = ndarray::Array2::<f64>::zeros((n_states, n_actions));
        for (s, state) in self.states.iter().enumerate() {
            for (a, action) in state.actions().iter().enumerate() {
                let tr = &action.transition;
                let mut reward_sum = 0.0;
                for ((&sp, &p), &rw) in tr.indices().iter().zip(tr.probabilities()).zip(tr.rewards()) {
                    t[[s, sp as usize, a]] = p as f64;
                    reward_sum += p as f64 * rw;
                }
                r[[s, a]] = reward_sum;
            }
        }
        Ok((t, r))
    }

    /// JSON-serializable tree: `state -> action -> sparse transition`.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::InvalidParameter {
            name: "json",
            reason: e.to_string(),
        })
    }

    /// Dense initial-state distribution, for use with [`crate::simulate::Simulator`].
    pub fn initial_distribution_from_dense(probabilities: &[Probability]) -> Result<Transition> {
        if probabilities.is_empty() {
            return Err(Error::InvalidParameter {
                name: "initial distribution",
                reason: "must have at least one state".into(),
            });
        }
        let mut t = Transition::new();
        for (s, &p) in probabilities.iter().enumerate() {
            if p > 0.0 {
                t.add_sample(s as StateId, p, 0.0)?;
            }
        }
        if !t.is_normalized() {
            return Err(Error::NotNormalized {
                sum: t.probability_sum() as f64,
            });
        }
        Ok(t)
    }
}

impl Backup for Mdp {
    fn num_states(&self) -> usize {
        self.states.len()
    }

    fn num_actions(&self, state: StateId) -> usize {
        Mdp::num_actions(self, state)
    }

    fn action_value(
        &self,
        state: StateId,
        action: ActionId,
        v: &[Value],
        gamma: Value,
        _mode: UncertaintyMode,
    ) -> Result<(Value, Option<Vec<Probability>>)> {
        let s = self
            .state(state)
            .ok_or_else(|| Error::out_of_range("state", state as usize, self.states.len()))?;
        let a = s
            .action(action)
            .ok_or_else(|| Error::out_of_range("action", action as usize, s.num_actions()))?;
        Ok((a.expected_value(v, gamma)?, None))
    }

    fn fixed_action_value(
        &self,
        state: StateId,
        action: ActionId,
        _nature: Option<&[Probability]>,
        v: &[Value],
        gamma: Value,
    ) -> Result<Value> {
        Ok(self.action_value(state, action, v, gamma, UncertaintyMode::Average)?.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_transition_auto_extends_states_and_actions() {
        let mut mdp = Mdp::new();
        mdp.add_transition(0, 0, 2, 1.0, 5.0).unwrap();
        assert_eq!(mdp.num_states(), 3);
        assert!(mdp.state(1).unwrap().is_terminal());
    }

    #[test]
    fn reward_merge_on_repeated_transition() {
        let mut mdp = Mdp::new();
        mdp.add_transition(0, 0, 1, 0.3, 10.0).unwrap();
        mdp.add_transition(0, 0, 1, 0.2, 20.0).unwrap();
        let tr = &mdp.state(0).unwrap().action(0).unwrap().transition;
        assert!((tr.probabilities()[0] - 0.5).abs() < 1e-12);
        assert!((tr.rewards()[0] - 14.0).abs() < 1e-12);
    }

    #[test]
    fn matrices_round_trip() {
        let mut mdp = Mdp::new();
        mdp.add_transition(0, 0, 0, 0.5, 1.0).unwrap();
        mdp.add_transition(0, 0, 1, 0.5, 2.0).unwrap();
        mdp.add_transition(1, 0, 1, 1.0, 0.0).unwrap();
        let (t, r) = mdp.to_matrices().unwrap();
        let mdp2 = Mdp::from_matrices(&t, &r, 1e-10).unwrap();
        let (t2, r2) = mdp2.to_matrices().unwrap();
        assert_eq!(t, t2);
        assert_eq!(r, r2);
    }

    #[test]
    fn from_matrices_applies_ignore_threshold() {
        let mut t = Array3::<f64>::zeros((2, 2, 1));
        t[[0, 0, 0]] = 1e-12;
        t[[0, 1, 0]] = 1.0 - 1e-12;
        let r = ndarray::Array2::<f64>::zeros((2, 1));
        let mdp = Mdp::from_matrices(&t, &r, 1e-10).unwrap();
        assert_eq!(mdp.state(0).unwrap().action(0).unwrap().transition.len(), 1);
    }
}
