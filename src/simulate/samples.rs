//! An append-only log of simulated transitions, plus a separate append-only list of
//! initial-state samples. Both are unordered multisets semantically; nothing is ever removed
//! except by dropping the store itself.
use crate::types::{ActionId, Reward, StateId};

use serde::{Deserialize, Serialize};

/// One simulated transition: `(state_from, action, state_to, reward, weight, step, run)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub state_from: StateId,
    pub action: ActionId,
    pub state_to: StateId,
    pub reward: Reward,
    pub weight: f64,
    pub step: usize,
    pub run: usize,
}

/// The result of one or more [`crate::simulate::Simulator`] runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Samples {
    transitions: Vec<Sample>,
    initial_states: Vec<StateId>,
}

impl Samples {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_sample(&mut self, sample: Sample) {
        self.transitions.push(sample);
    }

    pub fn add_initial(&mut self, state: StateId) {
        self.initial_states.push(state);
    }

    pub fn transitions(&self) -> &[Sample] {
        &self.transitions
    }

    pub fn initial_states(&self) -> &[StateId] {
        &self.initial_states
    }

    pub fn num_transitions(&self) -> usize {
        self.transitions.len()
    }

    pub fn num_runs(&self) -> usize {
        self.initial_states.len()
    }

    /// Merge another batch of samples into this store, in place. Adding samples never discards
    /// prior samples (spec §3).
    pub fn extend(&mut self, other: Samples) {
        self.transitions.extend(other.transitions);
        self.initial_states.extend(other.initial_states);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extend_appends_without_discarding() {
        let mut a = Samples::new();
        a.add_initial(0);
        a.add_sample(Sample {
            state_from: 0,
            action: 0,
            state_to: 1,
            reward: 1.0,
            weight: 1.0,
            step: 0,
            run: 0,
        });
        let mut b = Samples::new();
        b.add_initial(1);
        a.extend(b);
        assert_eq!(a.num_runs(), 2);
        assert_eq!(a.num_transitions(), 1);
    }
}
