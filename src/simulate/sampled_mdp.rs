//! Incremental maximum-likelihood estimation of an [`Mdp`] from [`Samples`].
//!
//! Per `(state, action)`, the estimator keeps a [`Transition`] and a running sum of sample
//! weights. On receipt of a sample it increments the transition's entry for the successor by
//! the sample weight and updates that entry's reward as the weighted mean, exactly as
//! [`crate::transition::Transition::add_sample`] already does — the `(s,a)` row stays
//! unnormalized (probabilities summing to the accumulated weight, not 1) until
//! [`SampledMdp::to_mdp`] divides every entry by the weight total.
use crate::error::Result;
use crate::mdp::Mdp;
use crate::simulate::samples::{Sample, Samples};
use crate::types::{ActionId, Probability, StateId};

use std::collections::HashMap;

/// An in-progress MDP estimate plus the per-(s,a) weight totals and initial-state histogram
/// needed to normalize it. Adding samples never discards prior samples (spec §3).
#[derive(Debug, Clone, Default)]
pub struct SampledMdp {
    mdp: Mdp,
    weights: HashMap<(StateId, ActionId), f64>,
    initial_counts: HashMap<StateId, f64>,
}

impl SampledMdp {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold every transition and initial-state sample in `samples` into the estimate.
    pub fn add_samples(&mut self, samples: &Samples) -> Result<()> {
        for &s in samples.initial_states() {
            *self.initial_counts.entry(s).or_insert(0.0) += 1.0;
        }
        for sample in samples.transitions() {
            self.add_sample(*sample)?;
        }
        Ok(())
    }

    /// Fold a single transition sample into the estimate.
    pub fn add_sample(&mut self, sample: Sample) -> Result<()> {
        self.mdp.add_transition(
            sample.state_from,
            sample.action,
            sample.state_to,
            sample.weight as Probability,
            sample.reward,
        )?;
        *self
            .weights
            .entry((sample.state_from, sample.action))
            .or_insert(0.0) += sample.weight;
        Ok(())
    }

    /// Total accumulated sample weight for `(state, action)`.
    pub fn weight(&self, state: StateId, action: ActionId) -> f64 {
        self.weights.get(&(state, action)).copied().unwrap_or(0.0)
    }

    /// Extract a normalized [`Mdp`]: every `(s,a)` row is divided by its accumulated weight, so
    /// probabilities sum to 1 wherever `W[s,a] > 0`; rows with no samples stay at their
    /// (terminal, all-zero) default.
    pub fn get_mdp(&self) -> Result<Mdp> {
        let mut mdp = self.mdp.clone();
        for s in 0..mdp.num_states() {
            let num_actions = mdp.num_actions(s as StateId);
            for a in 0..num_actions {
                let w = self.weight(s as StateId, a as ActionId);
                if w > 0.0 {
                    mdp.state_mut(s as StateId)
                        .action_mut(a as ActionId)
                        .transition
                        .scale_probabilities(w);
                }
            }
        }
        Ok(mdp)
    }

    /// Normalized histogram of initial-state samples, over the observed states of the current
    /// MDP estimate.
    pub fn initial_distribution(&self) -> Vec<Probability> {
        let n = self.mdp.num_states().max(
            self.initial_counts
                .keys()
                .map(|&s| s as usize + 1)
                .max()
                .unwrap_or(0),
        );
        let total: f64 = self.initial_counts.values().sum();
        let mut dist = vec![0 as Probability; n];
        if total > 0.0 {
            for (&s, &count) in self.initial_counts.iter() {
                dist[s as usize] = (count / total) as Probability;
            }
        }
        dist
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulate::simulator::{simulate_policy, Policy, SimulationConfig};

    #[test]
    fn sample_round_trip_recovers_true_transition_probabilities() {
        let mut true_mdp = Mdp::new();
        true_mdp.add_transition(0, 0, 1, 0.3, 1.0).unwrap();
        true_mdp.add_transition(0, 0, 2, 0.7, -1.0).unwrap();
        true_mdp.add_transition(1, 0, 1, 1.0, 0.0).unwrap();
        true_mdp.add_transition(2, 0, 2, 1.0, 0.0).unwrap();

        let initial = Mdp::initial_distribution_from_dense(&[1.0, 0.0, 0.0]).unwrap();
        let config = SimulationConfig {
            runs: 20_000,
            horizon: 1,
            seed: 42,
            ..SimulationConfig::default()
        };
        let samples = simulate_policy(&true_mdp, &initial, &Policy::Deterministic(vec![0, 0, 0]), &config).unwrap();

        let mut estimator = SampledMdp::new();
        estimator.add_samples(&samples).unwrap();
        let estimated = estimator.get_mdp().unwrap();

        let tr = &estimated.state(0).unwrap().action(0).unwrap().transition;
        let p1 = tr.get_reward(1).is_some().then(|| {
            tr.probabilities()[tr.indices().iter().position(|&i| i == 1).unwrap()]
        });
        assert!((p1.unwrap() as f64 - 0.3).abs() < 0.02);
    }

    #[test]
    fn initial_distribution_normalizes_over_observed_states() {
        let mut estimator = SampledMdp::new();
        let mut samples = Samples::new();
        samples.add_initial(0);
        samples.add_initial(0);
        samples.add_initial(1);
        estimator.add_samples(&samples).unwrap();
        estimator
            .add_sample(Sample {
                state_from: 0,
                action: 0,
                state_to: 1,
                reward: 0.0,
                weight: 1.0,
                step: 0,
                run: 0,
            })
            .unwrap();
        let dist = estimator.initial_distribution();
        assert!((dist[0] as f64 - 2.0 / 3.0).abs() < 1e-9);
        assert!((dist[1] as f64 - 1.0 / 3.0).abs() < 1e-9);
    }
}
