//! Bellman backup kernels: per-state greedy action selection, shared by every solver driver.
//!
//! [`Backup`] is implemented by both [`crate::mdp::Mdp`] (ignoring the uncertainty mode) and
//! [`crate::rmdp::Rmdp`] (dispatching on it), which is what lets solver drivers in
//! [`crate::solver`] be written once and reused for both the nominal and the robust case —
//! "average reduces to nominal" (spec §8 property 8) falls out of this shared code path rather
//! than being separately implemented.
use crate::action::UncertaintyMode;
use crate::error::Result;
use crate::types::{ActionId, Probability, StateId, Value};

/// A model whose states can be Bellman-backed-up: anything with a finite set of states, each
/// with a finite set of actions, whose per-action expected value under a value function can be
/// computed.
pub trait Backup {
    fn num_states(&self) -> usize;
    fn num_actions(&self, state: StateId) -> usize;

    /// Expected value of taking `action` in `state` under value function `v`, discount `gamma`,
    /// and uncertainty `mode` (ignored by nominal models). Also returns the realized outcome
    /// distribution when the model tracks one (robust models only); used by the greedy
    /// backup (`max_a`) and by the caller of [`backup_state`] to record the robust solution's
    /// realized worst-case distribution.
    fn action_value(
        &self,
        state: StateId,
        action: ActionId,
        v: &[Value],
        gamma: Value,
        mode: UncertaintyMode,
    ) -> Result<(Value, Option<Vec<Probability>>)>;

    /// Expected value of `action` in `state` under a *fixed* outcome distribution `nature`
    /// (robust models only; ignored by nominal models), or the model's own nominal/base
    /// distribution when `nature` is `None`. Used by fixed-policy evaluation, which must not
    /// recompute the worst case every sweep once a nature policy has been chosen.
    fn fixed_action_value(
        &self,
        state: StateId,
        action: ActionId,
        nature: Option<&[Probability]>,
        v: &[Value],
        gamma: Value,
    ) -> Result<Value>;
}

/// Result of backing up a single state: its new value, the greedy action (`-1` if terminal),
/// and the realized worst/best-case distribution of that action, if any.
pub struct StateBackup {
    pub value: Value,
    pub action: i64,
    pub realized: Option<Vec<Probability>>,
}

/// Back up one state: `V'[s] = max_a Q(s,a)`, `pi[s] = argmax_a Q(s,a)`, ties broken by lowest
/// action id. Terminal states (no actions) back up to `0.0` with policy `-1`.
pub fn backup_state<M: Backup + ?Sized>(
    model: &M,
    state: StateId,
    v: &[Value],
    gamma: Value,
    mode: UncertaintyMode,
) -> Result<StateBackup> {
    let n = model.num_actions(state);
    if n == 0 {
        return Ok(StateBackup {
            value: 0.0,
            action: -1,
            realized: None,
        });
    }
    let mut best_value = Value::NEG_INFINITY;
    let mut best_action = 0usize;
    let mut best_realized = None;
    for a in 0..n {
        let (q, realized) = model.action_value(state, a as ActionId, v, gamma, mode)?;
        if q > best_value {
            best_value = q;
            best_action = a;
            best_realized = realized;
        }
    }
    Ok(StateBackup {
        value: best_value,
        action: best_action as i64,
        realized: best_realized,
    })
}

/// Evaluate a single fixed `(action, nature)` choice at a state, without a `max` — used by
/// fixed-policy evaluation. `action = -1` (terminal / no-op) yields `0.0`.
pub fn evaluate_fixed<M: Backup + ?Sized>(
    model: &M,
    state: StateId,
    action: i64,
    nature: Option<&[Probability]>,
    v: &[Value],
    gamma: Value,
) -> Result<Value> {
    if action < 0 {
        return Ok(0.0);
    }
    model.fixed_action_value(state, action as ActionId, nature, v, gamma)
}
