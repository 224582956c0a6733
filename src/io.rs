//! Thin export surface: JSON inspection trees for [`Mdp`]/[`Rmdp`], and the three-file CSV
//! export for implementable-policy problems (spec §6). This module is deliberately shallow —
//! JSON/CSV persistence, binding layers, and process-level experiment tooling are explicitly
//! out of scope (spec §1); what lives here is pass-through formatting of data this crate
//! already owns, not a parsing/schema subsystem.
use crate::error::{Error, Result};
use crate::implementable::ObservationMap;
use crate::mdp::Mdp;
use crate::rmdp::Rmdp;
use crate::types::Probability;

use serde::Serialize;

use std::io::Write;
use std::path::Path;

/// One sparse `(next_state, probability, reward)` entry of a JSON inspection tree.
#[derive(Debug, Serialize)]
pub struct JsonTransitionEntry {
    pub to: usize,
    pub probability: f64,
    pub reward: f64,
}

/// One action's outcomes in a robust MDP's JSON inspection tree (a nominal action has exactly
/// one outcome and no base distribution/threshold).
#[derive(Debug, Serialize)]
pub struct JsonAction {
    pub outcomes: Vec<Vec<JsonTransitionEntry>>,
    pub base_distribution: Vec<Probability>,
    pub threshold: f64,
}

/// `state -> action -> outcome -> sparse transition` inspection tree (spec §6).
#[derive(Debug, Serialize)]
pub struct JsonModel {
    pub states: Vec<Vec<JsonAction>>,
}

/// Build the JSON inspection tree for a nominal [`Mdp`]: one single-outcome, threshold-0
/// "action" per actual action, so the shape matches [`rmdp_to_tree`] uniformly.
pub fn mdp_to_tree(mdp: &Mdp) -> JsonModel {
    let states = mdp
        .states()
        .iter()
        .map(|state| {
            state
                .actions()
                .iter()
                .map(|action| {
                    let tr = &action.transition;
                    let entries = tr
                        .indices()
                        .iter()
                        .zip(tr.probabilities().iter())
                        .zip(tr.rewards().iter())
                        .map(|((&to, &p), &r)| JsonTransitionEntry {
                            to: to as usize,
                            probability: p as f64,
                            reward: r,
                        })
                        .collect();
                    JsonAction {
                        outcomes: vec![entries],
                        base_distribution: vec![1.0],
                        threshold: 0.0,
                    }
                })
                .collect()
        })
        .collect();
    JsonModel { states }
}

/// Build the JSON inspection tree for an [`Rmdp`].
pub fn rmdp_to_tree(rmdp: &Rmdp) -> JsonModel {
    let states = rmdp
        .states()
        .iter()
        .map(|state| {
            state
                .actions()
                .iter()
                .map(|action| {
                    let outcomes = action
                        .outcomes()
                        .iter()
                        .map(|tr| {
                            tr.indices()
                                .iter()
                                .zip(tr.probabilities().iter())
                                .zip(tr.rewards().iter())
                                .map(|((&to, &p), &r)| JsonTransitionEntry {
                                    to: to as usize,
                                    probability: p as f64,
                                    reward: r,
                                })
                                .collect()
                        })
                        .collect();
                    JsonAction {
                        outcomes,
                        base_distribution: action.base_distribution().to_vec(),
                        threshold: action.threshold(),
                    }
                })
                .collect()
        })
        .collect();
    JsonModel { states }
}

fn to_json_error(e: serde_json::Error) -> Error {
    Error::InvalidParameter {
        name: "json",
        reason: e.to_string(),
    }
}

/// Serialize a [`Mdp`]'s inspection tree to a pretty-printed JSON string.
pub fn mdp_to_json(mdp: &Mdp) -> Result<String> {
    serde_json::to_string_pretty(&mdp_to_tree(mdp)).map_err(to_json_error)
}

/// Serialize an [`Rmdp`]'s inspection tree to a pretty-printed JSON string.
pub fn rmdp_to_json(rmdp: &Rmdp) -> Result<String> {
    serde_json::to_string_pretty(&rmdp_to_tree(rmdp)).map_err(to_json_error)
}

fn open_for_write(path: &Path) -> std::io::Result<std::fs::File> {
    std::fs::File::options().read(false).write(true).create(true).truncate(true).open(path)
}

/// Write the three-file CSV export for an implementable-policy problem (spec §6):
/// `<prefix>.mdp.csv` (the MDP transition table), `<prefix>.observations.csv` (the
/// state-to-observation map), and `<prefix>.initial.csv` (the initial distribution).
/// `header` controls whether each file gets a column-name header row.
pub fn export_implementable_csv(
    mdp: &Mdp,
    phi: &ObservationMap,
    initial: &[Probability],
    prefix: &Path,
    header: bool,
) -> Result<()> {
    write_mdp_csv(mdp, &prefix.with_extension("mdp.csv"), header)?;
    write_observations_csv(phi, &prefix.with_extension("observations.csv"), header)?;
    write_initial_csv(initial, &prefix.with_extension("initial.csv"), header)?;
    log::info!("exported implementable MDP CSVs with prefix {}", prefix.display());
    Ok(())
}

fn io_err(e: std::io::Error) -> Error {
    Error::InvalidParameter {
        name: "csv",
        reason: e.to_string(),
    }
}

fn write_mdp_csv(mdp: &Mdp, path: &Path, header: bool) -> Result<()> {
    let mut file = open_for_write(path).map_err(io_err)?;
    if header {
        writeln!(file, "idstatefrom,idaction,idstateto,probability,reward").map_err(io_err)?;
    }
    for (s, state) in mdp.states().iter().enumerate() {
        for (a, action) in state.actions().iter().enumerate() {
            let tr = &action.transition;
            for ((&to, &p), &r) in tr.indices().iter().zip(tr.probabilities()).zip(tr.rewards()) {
                writeln!(file, "{s},{a},{to},{p},{r}").map_err(io_err)?;
            }
        }
    }
    Ok(())
}

fn write_observations_csv(phi: &ObservationMap, path: &Path, header: bool) -> Result<()> {
    let mut file = open_for_write(path).map_err(io_err)?;
    if header {
        writeln!(file, "idstate,idobservation").map_err(io_err)?;
    }
    for s in 0..phi.num_states() {
        writeln!(file, "{s},{}", phi.observation_of(s as crate::types::StateId)).map_err(io_err)?;
    }
    Ok(())
}

fn write_initial_csv(initial: &[Probability], path: &Path, header: bool) -> Result<()> {
    let mut file = open_for_write(path).map_err(io_err)?;
    if header {
        writeln!(file, "idstate,probability").map_err(io_err)?;
    }
    for (s, &p) in initial.iter().enumerate() {
        writeln!(file, "{s},{p}").map_err(io_err)?;
    }
    Ok(())
}
