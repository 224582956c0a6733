//! The L1-robust MDP: an ordered, auto-extending container of [`RobustState`]s, each action an
//! [`L1OutcomeAction`] whose adversary may redistribute mass over outcomes within an L1 ball.
use crate::action::UncertaintyMode;
use crate::error::{Error, Result};
use crate::robust::backup::Backup;
use crate::state::RobustState;
use crate::types::{ActionId, OutcomeId, Probability, Reward, StateId, Value};

use ndarray::Array3;
use serde::{Deserialize, Serialize};

/// A finite discrete L1-robust MDP.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rmdp {
    states: Vec<RobustState>,
}

impl Rmdp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_states(n: usize) -> Self {
        Rmdp {
            states: vec![RobustState::new(); n],
        }
    }

    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    pub fn states(&self) -> &[RobustState] {
        &self.states
    }

    pub fn state(&self, id: StateId) -> Option<&RobustState> {
        self.states.get(id as usize)
    }

    pub fn state_mut(&mut self, id: StateId) -> &mut RobustState {
        let id = id as usize;
        if id >= self.states.len() {
            self.states.resize_with(id + 1, RobustState::new);
        }
        &mut self.states[id]
    }

    pub fn num_actions(&self, state: StateId) -> usize {
        self.state(state).map(RobustState::num_actions).unwrap_or(0)
    }

    /// Add one `(from, action, outcome, to, p, r)` sample, auto-extending states, actions, and
    /// outcomes as needed.
    #[allow(clippy::too_many_arguments)]
    pub fn add_transition(
        &mut self,
        from: StateId,
        action: ActionId,
        outcome: OutcomeId,
        to: StateId,
        p: Probability,
        r: Reward,
    ) -> Result<()> {
        self.state_mut(from)
            .action_mut(action)
            .outcome_mut(outcome)
            .add_sample(to, p, r)
    }

    /// Overwrite the L1 threshold of a single `(state, action)`.
    pub fn set_threshold(&mut self, state: StateId, action: ActionId, t: f64) -> Result<()> {
        let n_states = self.states.len();
        let s = self
            .states
            .get_mut(state as usize)
            .ok_or_else(|| Error::out_of_range("state", state as usize, n_states))?;
        s.action_mut(action).set_threshold(t)
    }

    /// Overwrite the L1 threshold of every `(state, action)` in the RMDP.
    pub fn set_thresholds(&mut self, t: f64) -> Result<()> {
        for s in self.states.iter_mut() {
            for a in 0..s.num_actions() {
                s.action_mut(a as ActionId).set_threshold(t)?;
            }
        }
        Ok(())
    }

    /// Normalize every base distribution. Call once after all outcomes/base probabilities of
    /// an RMDP have been set, before solving.
    pub fn normalize(&mut self) -> Result<()> {
        for s in self.states.iter_mut() {
            for a in 0..s.num_actions() {
                s.action_mut(a as ActionId).normalize()?;
            }
        }
        Ok(())
    }

    /// Build an RMDP from dense matrices, selecting which `(action, outcome)` pair each slice
    /// of `t`/`r` populates via `actions`/`outcomes` (both length `n_action_outcome_pairs`).
    /// `actions` must contain each action id used at most once per action "slot": the pair
    /// `(actions[k], outcomes[k])` for varying `k` may repeat an action id only across
    /// distinct outcomes, never the same `(action, outcome)` pair twice (spec §6/§9: the
    /// "last write wins" behavior some implementations allow is explicitly rejected here).
    pub fn from_matrices(
        t: &Array3<f64>,
        r: &ndarray::Array2<f64>,
        actions: &[ActionId],
        outcomes: &[OutcomeId],
        ignore_threshold: f64,
    ) -> Result<Self> {
        let (n_states, n_states2, n_pairs) = t.dim();
        if n_states != n_states2 {
            return Err(Error::shape("transition matrix", n_states, n_states2));
        }
        if actions.len() != n_pairs || outcomes.len() != n_pairs {
            return Err(Error::ShapeMismatch {
                what: "actions/outcomes selector",
                expected: n_pairs,
                actual: actions.len().min(outcomes.len()),
            });
        }
        let (r_states, r_pairs) = r.dim();
        if r_states != n_states || r_pairs != n_pairs {
            return Err(Error::ShapeMismatch {
                what: "reward matrix",
                expected: n_states * n_pairs,
                actual: r_states * r_pairs,
            });
        }

        let mut seen = std::collections::HashSet::new();
        for k in 0..n_pairs {
            if !seen.insert((actions[k], outcomes[k])) {
                return Err(Error::InvalidParameter {
                    name: "actions/outcomes",
                    reason: format!(
                        "duplicate (action={}, outcome={}) pair at slot {k}",
                        actions[k], outcomes[k]
                    ),
                });
            }
        }

        let mut rmdp = Rmdp::with_states(n_states);
        for s in 0..n_states {
            for k in 0..n_pairs {
                let (a, o) = (actions[k], outcomes[k]);
                for sp in 0..n_states {
                    let p = t[[s, sp, k]];
                    if p > ignore_threshold {
                        rmdp.add_transition(s as StateId, a, o, sp as StateId, p as Probability, r[[s, k]])?;
                    }
                }
            }
        }
        Ok(rmdp)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::InvalidParameter {
            name: "json",
            reason: e.to_string(),
        })
    }
}

impl Backup for Rmdp {
    fn num_states(&self) -> usize {
        self.states.len()
    }

    fn num_actions(&self, state: StateId) -> usize {
        Rmdp::num_actions(self, state)
    }

    fn action_value(
        &self,
        state: StateId,
        action: ActionId,
        v: &[Value],
        gamma: Value,
        mode: UncertaintyMode,
    ) -> Result<(Value, Option<Vec<Probability>>)> {
        let s = self
            .state(state)
            .ok_or_else(|| Error::out_of_range("state", state as usize, self.states.len()))?;
        let a = s
            .action(action)
            .ok_or_else(|| Error::out_of_range("action", action as usize, s.num_actions()))?;
        let (ev, dist) = a.expected_value(v, gamma, mode)?;
        Ok((ev, Some(dist)))
    }

    fn fixed_action_value(
        &self,
        state: StateId,
        action: ActionId,
        nature: Option<&[Probability]>,
        v: &[Value],
        gamma: Value,
    ) -> Result<Value> {
        let s = self
            .state(state)
            .ok_or_else(|| Error::out_of_range("state", state as usize, self.states.len()))?;
        let a = s
            .action(action)
            .ok_or_else(|| Error::out_of_range("action", action as usize, s.num_actions()))?;
        match nature {
            Some(dist) => {
                if dist.len() != a.num_outcomes() {
                    return Err(Error::shape("nature distribution", a.num_outcomes(), dist.len()));
                }
                let mut total = 0.0;
                for (o, &p) in a.outcomes().iter().zip(dist.iter()) {
                    total += p as f64 * o.expected_value(v, gamma)?;
                }
                Ok(total)
            }
            None => Ok(a.expected_value(v, gamma, UncertaintyMode::Average)?.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_transition_auto_extends_outcomes() {
        let mut rmdp = Rmdp::new();
        rmdp.add_transition(0, 0, 1, 2, 1.0, 3.0).unwrap();
        assert_eq!(rmdp.state(0).unwrap().action(0).unwrap().num_outcomes(), 2);
    }

    #[test]
    fn from_matrices_rejects_duplicate_action_outcome_pairs() {
        let t = Array3::<f64>::zeros((2, 2, 2));
        let r = ndarray::Array2::<f64>::zeros((2, 2));
        let err = Rmdp::from_matrices(&t, &r, &[0, 0], &[0, 0], 1e-10).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { .. }));
    }
}
