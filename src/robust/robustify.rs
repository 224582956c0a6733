//! Robustification: turn a nominal [`Mdp`] into an L1-robust [`Rmdp`] by treating each possible
//! next state as its own deterministic outcome, with the nominal probability as the base
//! weight on that outcome and threshold 0 (pure nominal until the caller raises it).
use crate::error::Result;
use crate::mdp::Mdp;
use crate::rmdp::Rmdp;
use crate::types::{ActionId, OutcomeId, StateId};

use log::debug;

/// Convert `mdp` into an [`Rmdp`] with one outcome per next state.
///
/// When `allow_zeros` is `true`, every (s,a) gets one outcome *per state of the MDP* — the
/// deterministic transition `s -> k` with reward taken from the nominal transition (or `0` if
/// `k` is not in its support) and base probability equal to the nominal probability of `k` (0
/// for states outside the support). This lets the adversary shift probability mass to states
/// that had zero nominal probability, which is the correct semantics when the model wants to
/// consider those as possible worst cases. When `false`, only states in the nominal support get
/// an outcome, and the adversary may only redistribute among those.
pub fn robustify(mdp: &Mdp, allow_zeros: bool) -> Result<Rmdp> {
    let n_states = mdp.num_states();
    let mut rmdp = Rmdp::with_states(n_states);
    for s in 0..n_states {
        let state = mdp.state(s as StateId).expect("s < n_states");
        for (a, action) in state.actions().iter().enumerate() {
            let tr = &action.transition;
            if allow_zeros {
                for k in 0..n_states {
                    let p = tr.indices().iter().position(|&i| i as usize == k);
                    let (prob, reward) = match p {
                        Some(pos) => (tr.probabilities()[pos], tr.rewards()[pos]),
                        None => (0.0, 0.0),
                    };
                    rmdp.add_transition(
                        s as StateId,
                        a as ActionId,
                        k as OutcomeId,
                        k as StateId,
                        1.0,
                        reward,
                    )?;
                    rmdp.state_mut(s as StateId)
                        .action_mut(a as ActionId)
                        .set_base_probability(k as OutcomeId, prob)?;
                }
            } else {
                for (o, (&k, (&prob, &reward))) in tr
                    .indices()
                    .iter()
                    .zip(tr.probabilities().iter().zip(tr.rewards().iter()))
                    .enumerate()
                {
                    rmdp.add_transition(s as StateId, a as ActionId, o as OutcomeId, k, 1.0, reward)?;
                    rmdp.state_mut(s as StateId)
                        .action_mut(a as ActionId)
                        .set_base_probability(o as OutcomeId, prob)?;
                }
            }
            rmdp.state_mut(s as StateId)
                .action_mut(a as ActionId)
                .set_threshold(0.0)?;
        }
    }
    rmdp.normalize()?;
    debug!("robustified {n_states}-state MDP (allow_zeros={allow_zeros})");
    Ok(rmdp)
}
