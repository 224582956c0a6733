//! Forward simulation of MDPs under a policy, the resulting sample store, and the
//! sample-to-MDP maximum-likelihood estimator.
pub mod sampled_mdp;
pub mod samples;
pub mod simulator;

pub use sampled_mdp::SampledMdp;
pub use samples::{Sample, Samples};
pub use simulator::{simulate_policy, simulate_return, Policy, SimulationConfig};
