//! Value iteration, Gauss-Seidel variant: sequentially update each state in place using the
//! most recent values of every other state. Strictly sequential by definition — ascending
//! state-id order is observable, since Gauss-Seidel's convergence behavior depends on it
//! (spec §5).
use crate::action::UncertaintyMode;
use crate::config::SolverOptions;
use crate::error::Result;
use crate::robust::backup::{backup_state, Backup};
use crate::solver::{residual, should_stop, Solution};
use crate::types::{StateId, Value};

use log::info;

/// Solve with [`UncertaintyMode::Average`] (appropriate for a nominal [`crate::mdp::Mdp`]).
pub fn solve<M: Backup>(model: &M, opts: &SolverOptions) -> Result<Solution> {
    solve_robust(model, opts, UncertaintyMode::Average)
}

/// Solve under the given uncertainty mode (use with [`crate::rmdp::Rmdp`] for a robust solve).
pub fn solve_robust<M: Backup>(model: &M, opts: &SolverOptions, mode: UncertaintyMode) -> Result<Solution> {
    opts.validate()?;
    let n = model.num_states();
    let mut v = vec![0.0; n];
    let mut policy = vec![-1i64; n];
    let mut realized = vec![None; n];
    let mut iterations = 0usize;
    let mut last_residual = Value::INFINITY;

    loop {
        let v_before = v.clone();
        for s in 0..n {
            let backup = backup_state(model, s as StateId, &v, opts.discount, mode)?;
            v[s] = backup.value;
            policy[s] = backup.action;
            realized[s] = backup.realized;
        }
        iterations += 1;
        last_residual = residual(&v_before, &v);
        if opts.show_progress {
            info!("gauss-seidel sweep {iterations}: residual = {last_residual}");
        }
        if should_stop(last_residual, opts.residual_tolerance, iterations, opts.max_iterations) {
            break;
        }
    }

    Ok(Solution {
        value_function: v,
        policy,
        residual: last_residual,
        iterations,
        realized_distribution: realized,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mdp::Mdp;

    #[test]
    fn three_state_chain_converges_to_analytic_value() {
        // 0 -> 1 -> 2, rewards (1, 2, 0), gamma = 0.5.
        let mut mdp = Mdp::new();
        mdp.add_transition(0, 0, 1, 1.0, 1.0).unwrap();
        mdp.add_transition(1, 0, 2, 1.0, 2.0).unwrap();
        // state 2 is terminal: no actions.
        mdp.state_mut(2);

        let opts = SolverOptions {
            discount: 0.5,
            residual_tolerance: 1e-10,
            ..Default::default()
        };
        let sol = solve(&mdp, &opts).unwrap();
        assert!((sol.value_function[0] - 2.0).abs() < 1e-8);
        assert!((sol.value_function[1] - 2.0).abs() < 1e-8);
        assert!((sol.value_function[2] - 0.0).abs() < 1e-8);
        assert_eq!(sol.policy[2], -1);
    }

    #[test]
    fn two_state_toggle_matches_closed_form() {
        let mut mdp = Mdp::new();
        mdp.add_transition(0, 0, 0, 1.0, 1.0).unwrap(); // stay: self-loop, r=1
        mdp.add_transition(0, 1, 1, 1.0, 0.0).unwrap(); // flip: swap, r=0
        mdp.add_transition(1, 0, 1, 1.0, 0.0).unwrap(); // stay at 1: r=0
        mdp.add_transition(1, 1, 0, 1.0, 0.0).unwrap(); // flip back

        let opts = SolverOptions {
            discount: 0.9,
            residual_tolerance: 1e-10,
            ..Default::default()
        };
        let sol = solve(&mdp, &opts).unwrap();
        // Optimal: stay at 0 forever -> V[0] = 1/(1-0.9) = 10; V[1] = 0.9 * V[0] = 9.
        assert!((sol.value_function[0] - 10.0).abs() < 1e-6);
        assert!((sol.value_function[1] - 9.0).abs() < 1e-6);
        assert_eq!(sol.policy[0], 0);
    }

    #[test]
    fn gauss_seidel_progresses_at_least_as_fast_as_jacobi() {
        use crate::solver::vi_jacobi;
        let mut mdp = Mdp::new();
        mdp.add_transition(0, 0, 1, 1.0, 1.0).unwrap();
        mdp.add_transition(1, 0, 2, 1.0, 1.0).unwrap();
        mdp.add_transition(2, 0, 0, 1.0, 1.0).unwrap();

        let opts = SolverOptions {
            discount: 0.5,
            max_iterations: 3,
            residual_tolerance: -1.0,
            ..Default::default()
        };
        let gs = solve(&mdp, &opts).unwrap();
        let jac = vi_jacobi::solve(&mdp, &opts).unwrap();
        assert!(gs.residual <= jac.residual + 1e-9);
    }
}
