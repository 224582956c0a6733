//! Fixed-policy evaluation, Jacobi variant: evaluate a given decision policy (and, for robust
//! models, a given "nature" policy over realized outcome distributions) without taking a `max`.
//! Used standalone to check a policy's value, and as the inner loop of
//! [`crate::solver::mpi`].
use crate::config::SolverOptions;
use crate::error::{Error, Result};
use crate::robust::backup::{evaluate_fixed, Backup};
use crate::types::{Probability, StateId, Value};

/// Evaluate `policy` (and, for robust models, `nature`) to convergence. `nature[s]` is the
/// outcome distribution used at state `s` when the model is robust; pass `None` to evaluate
/// under the model's own nominal/base distribution at every state.
pub fn evaluate<M: Backup>(
    model: &M,
    policy: &[i64],
    nature: Option<&[Vec<Probability>]>,
    opts: &SolverOptions,
) -> Result<(Vec<Value>, Value, usize)> {
    opts.validate()?;
    let n = model.num_states();
    if policy.len() != n {
        return Err(Error::shape("policy", n, policy.len()));
    }
    if let Some(nat) = nature {
        if nat.len() != n {
            return Err(Error::shape("nature policy", n, nat.len()));
        }
    }

    let mut v = vec![0.0; n];
    let mut iterations = 0usize;
    let mut last_residual = Value::INFINITY;

    loop {
        let mut v_next = vec![0.0; n];
        for s in 0..n {
            let nat_s = nature.map(|nat| nat[s].as_slice());
            v_next[s] = evaluate_fixed(model, s as StateId, policy[s], nat_s, &v, opts.discount)?;
        }
        iterations += 1;
        last_residual = crate::solver::residual(&v, &v_next);
        v = v_next;
        if crate::solver::should_stop(last_residual, opts.residual_tolerance, iterations, opts.max_iterations) {
            break;
        }
    }

    Ok((v, last_residual, iterations))
}
