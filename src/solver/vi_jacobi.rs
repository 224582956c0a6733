//! Value iteration, Jacobi variant: each sweep computes `V_next` entirely from `V_prev`, so
//! sweep order is unobservable and per-state backups inside a sweep have no inter-dependency —
//! safe to partition across threads (spec §5), which this module does when
//! [`crate::config::SolverOptions::parallel`] is set and the `parallel` feature is enabled.
use crate::action::UncertaintyMode;
use crate::config::SolverOptions;
use crate::error::Result;
use crate::robust::backup::{backup_state, Backup};
use crate::solver::{residual, should_stop, Solution};
use crate::types::{StateId, Value};

use log::info;

/// Solve with [`UncertaintyMode::Average`] (appropriate for a nominal [`crate::mdp::Mdp`]).
pub fn solve<M: Backup + Sync>(model: &M, opts: &SolverOptions) -> Result<Solution> {
    solve_robust(model, opts, UncertaintyMode::Average)
}

/// Solve under the given uncertainty mode (use with [`crate::rmdp::Rmdp`] for a robust solve).
pub fn solve_robust<M: Backup + Sync>(model: &M, opts: &SolverOptions, mode: UncertaintyMode) -> Result<Solution> {
    opts.validate()?;
    let n = model.num_states();
    let mut v_prev = vec![0.0; n];
    let mut policy = vec![-1i64; n];
    let mut realized = vec![None; n];
    let mut iterations = 0usize;
    let mut last_residual = Value::INFINITY;

    loop {
        let mut v_next = vec![0.0; n];
        let mut backups: Vec<Option<(i64, Option<Vec<crate::types::Probability>>)>> = (0..n).map(|_| None).collect();

        if opts.parallel {
            sweep_parallel(model, &v_prev, opts.discount, mode, &mut v_next, &mut backups)?;
        } else {
            for s in 0..n {
                let b = backup_state(model, s as StateId, &v_prev, opts.discount, mode)?;
                v_next[s] = b.value;
                backups[s] = Some((b.action, b.realized));
            }
        }

        for (s, b) in backups.into_iter().enumerate() {
            let (action, realized_s) = b.expect("every state backed up");
            policy[s] = action;
            realized[s] = realized_s;
        }

        iterations += 1;
        last_residual = residual(&v_prev, &v_next);
        if opts.show_progress {
            info!("jacobi sweep {iterations}: residual = {last_residual}");
        }
        v_prev = v_next;
        if should_stop(last_residual, opts.residual_tolerance, iterations, opts.max_iterations) {
            break;
        }
    }

    Ok(Solution {
        value_function: v_prev,
        policy,
        residual: last_residual,
        iterations,
        realized_distribution: realized,
    })
}

#[allow(clippy::type_complexity)]
fn sweep_parallel<M: Backup + Sync>(
    model: &M,
    v_prev: &[Value],
    gamma: Value,
    mode: UncertaintyMode,
    v_next: &mut [Value],
    backups: &mut [Option<(i64, Option<Vec<crate::types::Probability>>)>],
) -> Result<()> {
    #[cfg(feature = "parallel")]
    {
        let n = v_next.len();
        let workers = std::thread::available_parallelism().map(|p| p.get()).unwrap_or(1).min(n.max(1));
        if workers <= 1 || n == 0 {
            return sweep_sequential(model, v_prev, gamma, mode, v_next, backups);
        }
        let chunk = n.div_ceil(workers);
        let v_next_chunks = v_next.chunks_mut(chunk);
        let backup_chunks = backups.chunks_mut(chunk);
        let mut first_err: Option<crate::error::Error> = None;
        std::thread::scope(|scope| {
            let handles: Vec<_> = v_next_chunks
                .zip(backup_chunks)
                .enumerate()
                .map(|(ci, (vn, bk))| {
                    let base = ci * chunk;
                    scope.spawn(move || -> Result<()> {
                        for (i, (vref, bref)) in vn.iter_mut().zip(bk.iter_mut()).enumerate() {
                            let s = base + i;
                            let b = backup_state(model, s as StateId, v_prev, gamma, mode)?;
                            *vref = b.value;
                            *bref = Some((b.action, b.realized));
                        }
                        Ok(())
                    })
                })
                .collect();
            for h in handles {
                if let Err(e) = h.join().expect("worker thread panicked") {
                    first_err.get_or_insert(e);
                }
            }
        });
        if let Some(e) = first_err {
            return Err(e);
        }
        Ok(())
    }
    #[cfg(not(feature = "parallel"))]
    {
        sweep_sequential(model, v_prev, gamma, mode, v_next, backups)
    }
}

#[allow(dead_code)]
fn sweep_sequential<M: Backup + Sync>(
    model: &M,
    v_prev: &[Value],
    gamma: Value,
    mode: UncertaintyMode,
    v_next: &mut [Value],
    backups: &mut [Option<(i64, Option<Vec<crate::types::Probability>>)>],
) -> Result<()> {
    for s in 0..v_next.len() {
        let b = backup_state(model, s as StateId, v_prev, gamma, mode)?;
        v_next[s] = b.value;
        backups[s] = Some((b.action, b.realized));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mdp::Mdp;

    #[test]
    fn contraction_property_holds_for_gamma_below_one() {
        let mut mdp = Mdp::new();
        mdp.add_transition(0, 0, 1, 1.0, 1.0).unwrap();
        mdp.add_transition(1, 0, 0, 1.0, -1.0).unwrap();

        let opts = SolverOptions {
            discount: 0.8,
            max_iterations: 1,
            residual_tolerance: -1.0,
            ..Default::default()
        };

        let mut v = vec![5.0, -3.0];
        let mut prev_residual = Value::INFINITY;
        for _ in 0..10 {
            let mut v_next = vec![0.0; 2];
            for s in 0..2 {
                let b = backup_state(&mdp, s as StateId, &v, opts.discount, UncertaintyMode::Average).unwrap();
                v_next[s] = b.value;
            }
            let r = residual(&v, &v_next);
            if prev_residual.is_finite() {
                assert!(r <= opts.discount * prev_residual + 1e-9);
            }
            prev_residual = r;
            v = v_next;
        }
    }

    #[test]
    fn parallel_flag_produces_same_result_as_sequential() {
        let mut mdp = Mdp::new();
        for s in 0..20 {
            mdp.add_transition(s, 0, (s + 1) % 20, 0.5, s as f64).unwrap();
            mdp.add_transition(s, 0, (s + 2) % 20, 0.5, -(s as f64)).unwrap();
            mdp.add_transition(s, 1, s, 1.0, 0.0).unwrap();
        }
        let opts_seq = SolverOptions {
            discount: 0.7,
            ..Default::default()
        };
        let mut opts_par = opts_seq.clone();
        opts_par.parallel = true;

        let seq = solve(&mdp, &opts_seq).unwrap();
        let par = solve(&mdp, &opts_par).unwrap();
        for (a, b) in seq.value_function.iter().zip(par.value_function.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }
}
