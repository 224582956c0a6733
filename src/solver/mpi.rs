//! Modified policy iteration (Jacobi): alternates a greedy policy-improvement backup with a
//! bounded number of fixed-policy evaluation sweeps, instead of evaluating each policy to
//! convergence as plain policy iteration would.
use crate::action::UncertaintyMode;
use crate::config::{ProgressCallback, SolverOptions};
use crate::error::Result;
use crate::robust::backup::{backup_state, Backup};
use crate::solver::fixed_policy;
use crate::solver::{residual, should_stop, Solution};
use crate::types::StateId;

use log::info;

/// Solve with [`UncertaintyMode::Average`] (appropriate for a nominal [`crate::mdp::Mdp`]).
pub fn solve<M: Backup>(model: &M, opts: &SolverOptions) -> Result<Solution> {
    solve_robust(model, opts, UncertaintyMode::Average, None)
}

/// Solve under the given uncertainty mode, with an optional progress callback invoked once per
/// outer iteration as `(iteration, residual)` (spec §4.5/§5: synchronous, not cooperative).
pub fn solve_robust<M: Backup>(
    model: &M,
    opts: &SolverOptions,
    mode: UncertaintyMode,
    mut progress: Option<&mut ProgressCallback>,
) -> Result<Solution> {
    opts.validate()?;
    let n = model.num_states();
    let mut v = vec![0.0; n];
    let mut policy = vec![-1i64; n];
    let mut realized: Vec<Option<Vec<crate::types::Probability>>> = vec![None; n];
    let mut outer_iterations = 0usize;
    let mut last_residual = crate::types::Value::INFINITY;

    let inner_opts = SolverOptions {
        max_iterations: opts.inner_iterations,
        residual_tolerance: opts.inner_tolerance(),
        ..opts.clone()
    };

    loop {
        // Greedy policy improvement from the current value function.
        let v_before = v.clone();
        for s in 0..n {
            let b = backup_state(model, s as StateId, &v, opts.discount, mode)?;
            policy[s] = b.action;
            realized[s] = b.realized;
        }

        // Partial policy evaluation (Jacobi), up to `inner_iterations` sweeps.
        let nature: Option<Vec<Vec<crate::types::Probability>>> = {
            let any_realized = realized.iter().any(Option::is_some);
            if any_realized {
                Some(
                    realized
                        .iter()
                        .map(|r| r.clone().unwrap_or_default())
                        .collect(),
                )
            } else {
                None
            }
        };
        let (v_new, _, _) = fixed_policy::evaluate(model, &policy, nature.as_deref(), &inner_opts)?;
        v = v_new;

        outer_iterations += 1;
        last_residual = residual(&v_before, &v);
        if opts.show_progress {
            info!("mpi outer iteration {outer_iterations}: residual = {last_residual}");
        }
        if let Some(cb) = progress.as_deref_mut() {
            cb(outer_iterations, last_residual);
        }
        if should_stop(last_residual, opts.residual_tolerance, outer_iterations, opts.max_iterations) {
            break;
        }
    }

    Ok(Solution {
        value_function: v,
        policy,
        residual: last_residual,
        iterations: outer_iterations,
        realized_distribution: realized,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mdp::Mdp;
    use crate::solver::vi_gauss_seidel;

    #[test]
    fn mpi_agrees_with_value_iteration() {
        let mut mdp = Mdp::new();
        mdp.add_transition(0, 0, 0, 1.0, 1.0).unwrap();
        mdp.add_transition(0, 1, 1, 1.0, 0.0).unwrap();
        mdp.add_transition(1, 0, 1, 1.0, 0.0).unwrap();
        mdp.add_transition(1, 1, 0, 1.0, 0.0).unwrap();

        let opts = SolverOptions {
            discount: 0.9,
            residual_tolerance: 1e-10,
            ..Default::default()
        };
        let vi = vi_gauss_seidel::solve(&mdp, &opts).unwrap();
        let mpi = solve(&mdp, &opts).unwrap();
        for (a, b) in vi.value_function.iter().zip(mpi.value_function.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
        assert_eq!(vi.policy, mpi.policy);
    }

    #[test]
    fn progress_callback_is_invoked_once_per_outer_iteration() {
        let mut mdp = Mdp::new();
        mdp.add_transition(0, 0, 1, 1.0, 1.0).unwrap();
        mdp.add_transition(1, 0, 0, 1.0, 1.0).unwrap();

        let opts = SolverOptions {
            discount: 0.5,
            max_iterations: 5,
            residual_tolerance: -1.0,
            ..Default::default()
        };
        let mut calls = Vec::new();
        let mut cb = |iter: usize, res: crate::types::Value| calls.push((iter, res));
        solve_robust(&mdp, &opts, UncertaintyMode::Average, Some(&mut cb)).unwrap();
        assert_eq!(calls.len(), 5);
        assert_eq!(calls[0].0, 1);
    }
}
