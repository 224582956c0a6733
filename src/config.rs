//! Ambient solver configuration, mirroring the `Config` struct conventions used elsewhere in
//! this codebase: one struct bundling the knobs a solve needs, constructed with [`Default`]
//! and overridden field-by-field rather than threaded through long positional argument lists.
use crate::action::UncertaintyMode;
use crate::error::{Error, Result};
use crate::types::Value;

/// Options shared by every solver driver in [`crate::solver`].
#[derive(Clone)]
pub struct SolverOptions {
    /// Discount factor, in `[0, 1]`.
    pub discount: Value,
    /// Maximum number of (outer, for MPI) iterations.
    pub max_iterations: usize,
    /// Residual tolerance for early stopping. `0` means "never stop early"; a negative value
    /// means "always run exactly `max_iterations` sweeps" (spec §4.5/§5).
    pub residual_tolerance: Value,
    /// Uncertainty mode used by robust solvers; ignored by nominal ones.
    pub uncertainty_mode: UncertaintyMode,
    /// Number of inner fixed-policy sweeps per outer iteration, for modified policy iteration.
    pub inner_iterations: usize,
    /// Inner residual tolerance for modified policy iteration; defaults to `residual_tolerance / 2`
    /// when left at `None`, per spec §4.5.
    pub inner_residual_tolerance: Option<Value>,
    /// Partition Jacobi-family sweeps across `std::thread` workers (feature `parallel`).
    pub parallel: bool,
    /// Emit a progress log line (via the `log` crate) after every outer/sweep iteration.
    pub show_progress: bool,
}

impl Default for SolverOptions {
    fn default() -> Self {
        SolverOptions {
            discount: 0.9,
            max_iterations: 500,
            residual_tolerance: 1e-8,
            uncertainty_mode: UncertaintyMode::Average,
            inner_iterations: 20,
            inner_residual_tolerance: None,
            parallel: false,
            show_progress: false,
        }
    }
}

impl SolverOptions {
    pub fn new(discount: Value) -> Result<Self> {
        let mut opts = Self::default();
        opts.set_discount(discount)?;
        Ok(opts)
    }

    pub fn set_discount(&mut self, discount: Value) -> Result<()> {
        if !(0.0..=1.0).contains(&discount) {
            return Err(Error::InvalidParameter {
                name: "discount",
                reason: format!("discount must be in [0, 1], got {discount}"),
            });
        }
        self.discount = discount;
        Ok(())
    }

    pub fn inner_tolerance(&self) -> Value {
        self.inner_residual_tolerance
            .unwrap_or(self.residual_tolerance / 2.0)
    }

    /// Check the invariants `set_discount` would otherwise enforce alone. Every field is `pub`
    /// (struct-update-syntax overrides are the documented way to configure a solve), so
    /// constructing a `SolverOptions` directly skips `set_discount`; solver drivers call this at
    /// entry instead of trusting construction to have validated it.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.discount) {
            return Err(Error::InvalidParameter {
                name: "discount",
                reason: format!("discount must be in [0, 1], got {}", self.discount),
            });
        }
        Ok(())
    }
}

/// Signature for the modified-policy-iteration progress callback (spec §4.5/§5: "synchronous
/// callback", invoked once per outer iteration with `(iteration, residual)`).
pub type ProgressCallback<'a> = dyn FnMut(usize, Value) + 'a;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_discount() {
        assert!(SolverOptions::new(1.5).is_err());
        assert!(SolverOptions::new(-0.1).is_err());
        assert!(SolverOptions::new(1.0).is_ok());
    }

    #[test]
    fn validate_catches_a_discount_set_via_struct_update_syntax() {
        let opts = SolverOptions {
            discount: 1.5,
            ..Default::default()
        };
        assert!(opts.validate().is_err());
    }

    #[test]
    fn inner_tolerance_defaults_to_half_outer() {
        let opts = SolverOptions {
            residual_tolerance: 0.02,
            ..Default::default()
        };
        assert!((opts.inner_tolerance() - 0.01).abs() < 1e-12);
    }
}
