//! Primitive data types shared across the crate.

/// Data type for state identifiers.
#[cfg(not(feature = "minmem"))]
pub type StateId = usize;
#[cfg(feature = "minmem")]
pub type StateId = u32;

/// Data type for action identifiers.
#[cfg(not(feature = "minmem"))]
pub type ActionId = usize;
#[cfg(feature = "minmem")]
pub type ActionId = u32;

/// Data type for outcome identifiers within a robust (L1) action.
#[cfg(not(feature = "minmem"))]
pub type OutcomeId = usize;
#[cfg(feature = "minmem")]
pub type OutcomeId = u32;

/// Data type for transition probabilities.
#[cfg(not(feature = "minmem"))]
pub type Probability = f64;
#[cfg(feature = "minmem")]
pub type Probability = f32;

/// Data type for rewards.
pub type Reward = f64;

/// Data type for the value function and discount factor.
pub type Value = f64;

/// Sentinel policy entry meaning "no action available" (terminal state).
pub const NO_ACTION: i64 = -1;
