//! Actions: a [`RegularAction`] wraps one nominal [`Transition`]; an [`L1OutcomeAction`] wraps
//! a vector of outcomes (each its own [`Transition`]), a base distribution over outcomes, and
//! an L1 budget that bounds how far an adversary may perturb that distribution.
use crate::error::{Error, Result};
use crate::robust::l1;
use crate::transition::Transition;
use crate::types::{OutcomeId, Probability, Value};

use serde::{Deserialize, Serialize};

/// Selects which of the three Bellman backup kernels an [`L1OutcomeAction`] uses.
///
/// Encoded as a sum type at the backup boundary (rather than a runtime string/integer) so the
/// mode dispatch is resolved once per call, not re-checked inside the hot per-outcome loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum UncertaintyMode {
    /// No adversary: use the base distribution `q` as-is.
    #[default]
    Average,
    /// An adversary minimizes the return within the L1 ball.
    Robust,
    /// An adversary (or a friendly oracle) maximizes the return within the L1 ball.
    Optimistic,
}

impl UncertaintyMode {
    /// Parse from the case-insensitive names used by the wire/config surface.
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "average" => Ok(UncertaintyMode::Average),
            "robust" => Ok(UncertaintyMode::Robust),
            "optimistic" => Ok(UncertaintyMode::Optimistic),
            other => Err(Error::InvalidParameter {
                name: "uncertainty_mode",
                reason: format!("unknown uncertainty mode `{other}`"),
            }),
        }
    }
}

/// A nominal action: exactly one [`Transition`] giving the next-state distribution and rewards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegularAction {
    pub transition: Transition,
}

impl RegularAction {
    pub fn new() -> Self {
        Self::default()
    }

    /// `sum_i p_i * (r_i + gamma * v[next_i])`.
    pub fn expected_value(&self, v: &[Value], gamma: Value) -> Result<Value> {
        self.transition.expected_value(v, gamma)
    }
}

/// One possible outcome of a robust action: an independent [`Transition`], not itself
/// perturbed by the adversary. Only the distribution *over* outcomes is perturbed.
pub type Outcome = Transition;

/// A robust action under L1-bounded ambiguity over a set of outcomes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct L1OutcomeAction {
    outcomes: Vec<Outcome>,
    /// Base (nominal) distribution over `outcomes`, length equal to `outcomes.len()`.
    base_distribution: Vec<Probability>,
    /// L1 budget, in `[0, 2]`.
    threshold: f64,
}

impl L1OutcomeAction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    pub fn outcome(&self, id: OutcomeId) -> Result<&Outcome> {
        self.outcomes
            .get(id as usize)
            .ok_or_else(|| Error::out_of_range("outcome", id as usize, self.outcomes.len()))
    }

    pub fn outcome_mut(&mut self, id: OutcomeId) -> &mut Outcome {
        let id = id as usize;
        if id >= self.outcomes.len() {
            self.outcomes.resize_with(id + 1, Outcome::new);
            self.base_distribution.resize(id + 1, 0.0);
        }
        &mut self.outcomes[id]
    }

    pub fn num_outcomes(&self) -> usize {
        self.outcomes.len()
    }

    pub fn base_distribution(&self) -> &[Probability] {
        &self.base_distribution
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Overwrite the L1 threshold. Must lie in `[0, 2]`.
    pub fn set_threshold(&mut self, t: f64) -> Result<()> {
        if !(0.0..=2.0).contains(&t) {
            return Err(Error::InvalidParameter {
                name: "threshold",
                reason: format!("L1 threshold must be in [0, 2], got {t}"),
            });
        }
        self.threshold = t;
        Ok(())
    }

    /// Overwrite the base probability of one outcome. Auto-extends outcome storage as needed.
    pub fn set_base_probability(&mut self, id: OutcomeId, p: Probability) -> Result<()> {
        if p < 0.0 {
            return Err(Error::InvalidParameter {
                name: "base probability",
                reason: format!("probability must be non-negative, got {p}"),
            });
        }
        let id = id as usize;
        if id >= self.outcomes.len() {
            self.outcomes.resize_with(id + 1, Outcome::new);
            self.base_distribution.resize(id + 1, 0.0);
        }
        self.base_distribution[id] = p;
        Ok(())
    }

    /// Normalize the base distribution to sum to 1. No-op when it already sums to 0 (empty
    /// action, not yet populated) so that freshly auto-extended slots stay inert.
    pub fn normalize(&mut self) -> Result<()> {
        let sum: f64 = self.base_distribution.iter().map(|&x| x as f64).sum();
        if sum == 0.0 {
            return Ok(());
        }
        for p in self.base_distribution.iter_mut() {
            *p = (*p as f64 / sum) as Probability;
        }
        Ok(())
    }

    fn outcome_values(&self, v: &[Value], gamma: Value) -> Result<Vec<Value>> {
        self.outcomes
            .iter()
            .map(|o| o.expected_value(v, gamma))
            .collect()
    }

    /// Expected value and realized outcome distribution under the given uncertainty mode.
    ///
    /// For [`UncertaintyMode::Average`] the realized distribution is the base distribution.
    /// For [`UncertaintyMode::Robust`]/[`UncertaintyMode::Optimistic`] it is the worst/best
    /// case distribution within the L1 ball, per [`crate::robust::l1`].
    pub fn expected_value(
        &self,
        v: &[Value],
        gamma: Value,
        mode: UncertaintyMode,
    ) -> Result<(Value, Vec<Probability>)> {
        if self.outcomes.is_empty() {
            return Err(Error::InvalidParameter {
                name: "outcomes",
                reason: "L1 action has no outcomes".into(),
            });
        }
        let values = self.outcome_values(v, gamma)?;
        match mode {
            UncertaintyMode::Average => {
                let sum: f64 = self.base_distribution.iter().map(|&x| x as f64).sum();
                if (sum - 1.0).abs() > 1e-3 {
                    return Err(Error::InvalidDistribution { sum });
                }
                let ev: Value = values
                    .iter()
                    .zip(self.base_distribution.iter())
                    .map(|(&vi, &qi)| vi * qi as f64)
                    .sum();
                Ok((ev, self.base_distribution.clone()))
            }
            UncertaintyMode::Robust => {
                let (p, obj) = l1::worst_case(&values, &self.base_distribution, self.threshold)?;
                Ok((obj, p))
            }
            UncertaintyMode::Optimistic => {
                let (p, obj) = l1::best_case(&values, &self.base_distribution, self.threshold)?;
                Ok((obj, p))
            }
        }
    }
}
