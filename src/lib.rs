//! # craam-rs
//!
//! A sparse, robust (L1) Markov decision process library: specify finite discrete MDPs,
//! solve them by value iteration and modified policy iteration, build them from samples,
//! simulate them under a policy, robustify them against an L1-bounded adversary over
//! per-state outcome distributions, and solve observation-constrained ("implementable")
//! policies on top of the robust solver.
//!
//! Binding layers, process-level JSON/CSV tooling beyond thin export helpers, and random
//! number source selection are explicitly out of scope; see [`io`] for the thin export
//! surface that *is* part of this crate.

pub mod action;
pub mod config;
pub mod error;
pub mod implementable;
pub mod io;
pub mod mdp;
pub mod rmdp;
pub mod robust;
pub mod simulate;
pub mod solver;
pub mod state;
pub mod transition;
pub mod types;

pub use error::{Error, Result};
