//! Sparse transition rows: the `next_state -> (probability, reward)` map that backs every
//! action, outcome, and initial-state distribution in this crate.
use crate::error::{Error, Result};
use crate::types::{Probability, Reward, StateId, Value};

use serde::{Deserialize, Serialize};

/// A sparse row of a transition matrix: parallel, ascending-index arrays of next-state ids,
/// probabilities, and per-sample rewards.
///
/// Indices are unique and kept in ascending order at all times; probabilities are
/// non-negative. The row may be temporarily unnormalized (probabilities summing to
/// neither 0 nor 1) while it is being built up by repeated [`Transition::add_sample`] calls;
/// [`Transition::normalize`] is required before it is used in an expectation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    indices: Vec<StateId>,
    probabilities: Vec<Probability>,
    rewards: Vec<Reward>,
}

impl Transition {
    /// An empty transition (no successors yet).
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a transition from already-sorted, already-deduplicated parallel arrays.
    /// Intended for internal/test use where the invariant is known to hold by construction.
    pub fn from_sorted(indices: Vec<StateId>, probabilities: Vec<Probability>, rewards: Vec<Reward>) -> Self {
        debug_assert!(indices.windows(2).all(|w| w[0] < w[1]));
        debug_assert_eq!(indices.len(), probabilities.len());
        debug_assert_eq!(indices.len(), rewards.len());
        Transition {
            indices,
            probabilities,
            rewards,
        }
    }

    /// Number of distinct successor states.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// True when there are no successor states at all.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Ascending successor state ids.
    pub fn indices(&self) -> &[StateId] {
        &self.indices
    }

    /// Probabilities, parallel to [`Transition::indices`].
    pub fn probabilities(&self) -> &[Probability] {
        &self.probabilities
    }

    /// Rewards, parallel to [`Transition::indices`].
    pub fn rewards(&self) -> &[Reward] {
        &self.rewards
    }

    /// Sum of all probabilities in this row.
    pub fn probability_sum(&self) -> Probability {
        self.probabilities.iter().sum()
    }

    /// Returns `true` when probabilities sum to 0 or 1 within `1e-9`.
    pub fn is_normalized(&self) -> bool {
        let sum = self.probability_sum() as f64;
        sum.abs() < 1e-9 || (sum - 1.0).abs() < 1e-9
    }

    /// Position of `next` in the ascending index array, if present.
    fn position(&self, next: StateId) -> std::result::Result<usize, usize> {
        self.indices.binary_search(&next)
    }

    /// Append (or merge into an existing entry for) a `(next, p, r)` sample.
    ///
    /// If `next` is already present, probabilities add and the reward becomes the
    /// probability-weighted average: `r_new = (r_old * p_old + r * p) / (p_old + p)`.
    /// Appending a zero probability is legal; it leaves the row unchanged in effect but is
    /// still recorded (callers that want to drop zero-probability entries should filter
    /// before calling, per the "ignore threshold" convention used by dense ingestion).
    pub fn add_sample(&mut self, next: StateId, p: Probability, r: Reward) -> Result<()> {
        if p < 0.0 {
            return Err(Error::InvalidParameter {
                name: "probability",
                reason: format!("probability must be non-negative, got {p}"),
            });
        }
        match self.position(next) {
            Ok(i) => {
                let p_old = self.probabilities[i];
                let r_old = self.rewards[i];
                let p_new = p_old + p;
                self.rewards[i] = if p_new == 0.0 {
                    r_old
                } else {
                    (r_old * p_old as f64 + r * p as f64) / p_new as f64
                };
                self.probabilities[i] = p_new;
            }
            Err(i) => {
                self.indices.insert(i, next);
                self.probabilities.insert(i, p);
                self.rewards.insert(i, r);
            }
        }
        Ok(())
    }

    /// Overwrite the reward for an existing successor, by state id. No-op on an absent id.
    pub fn set_reward(&mut self, next: StateId, r: Reward) {
        if let Ok(i) = self.position(next) {
            self.rewards[i] = r;
        }
    }

    /// Reward for an existing successor, by state id.
    pub fn get_reward(&self, next: StateId) -> Option<Reward> {
        self.position(next).ok().map(|i| self.rewards[i])
    }

    /// Reward at a raw position (0-based, in ascending-index order).
    pub fn reward_at(&self, position: usize) -> Option<Reward> {
        self.rewards.get(position).copied()
    }

    /// Divide every probability by `total`, in place. Used by [`crate::simulate::SampledMDP`]
    /// to turn accumulated sample weights into a normalized transition.
    pub fn scale_probabilities(&mut self, total: f64) {
        if total == 0.0 {
            return;
        }
        for p in self.probabilities.iter_mut() {
            *p = (*p as f64 / total) as Probability;
        }
    }

    /// Expand this row to a dense probability vector of length `size` (zeros elsewhere).
    pub fn to_dense(&self, size: usize) -> Result<Vec<Probability>> {
        let mut dense = vec![0 as Probability; size];
        for (&i, &p) in self.indices.iter().zip(self.probabilities.iter()) {
            let i = i as usize;
            if i >= size {
                return Err(Error::out_of_range("next state", i, size));
            }
            dense[i] = p;
        }
        Ok(dense)
    }

    /// Expected value `sum_i p_i * (r_i + gamma * v[next_i])` under value function `v`.
    ///
    /// `v` must have at least as many entries as the largest successor id referenced by this
    /// row; out-of-range successors are reported as [`Error::OutOfRange`].
    pub fn expected_value(&self, v: &[Value], gamma: Value) -> Result<Value> {
        let mut total = 0.0;
        for ((&i, &p), &r) in self
            .indices
            .iter()
            .zip(self.probabilities.iter())
            .zip(self.rewards.iter())
        {
            let i = i as usize;
            let vi = *v
                .get(i)
                .ok_or_else(|| Error::out_of_range("next state", i, v.len()))?;
            total += p as f64 * (r + gamma * vi);
        }
        Ok(total)
    }
}
